// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP client builders with a consistent User-Agent header.

use reqwest::ClientBuilder;

/// SDK name used in the User-Agent.
pub const SDK_NAME: &str = "tripwire";

/// Platform string in `{os}-{arch}` format, e.g. "linux-x86_64".
pub fn platform() -> String {
	format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Creates an async HTTP client builder with the standard User-Agent header.
///
/// # Example
/// ```ignore
/// let client = tripwire_common_http::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	reqwest::Client::builder().user_agent(user_agent())
}

/// Creates a blocking HTTP client builder with the standard User-Agent header.
///
/// Used where no async runtime is available to drive a request.
pub fn blocking_builder() -> reqwest::blocking::ClientBuilder {
	reqwest::blocking::Client::builder().user_agent(user_agent())
}

/// Returns the standard User-Agent string.
///
/// Format: `tripwire/{platform}/{version}`
pub fn user_agent() -> String {
	format!("{}/{}/{}", SDK_NAME, platform(), env!("CARGO_PKG_VERSION"))
}
