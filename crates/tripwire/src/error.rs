// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the monitor SDK.

use thiserror::Error;
use tripwire_core::CoreError;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while configuring or wiring up a monitor.
///
/// Reporting itself never returns an error: delivery is fire and forget.
#[derive(Debug, Error)]
pub enum MonitorError {
	/// Neither an endpoint nor a delivery callback was configured.
	#[error("a delivery target (endpoint or callback) is required")]
	MissingDeliveryTarget,

	/// The endpoint is not an absolute URL.
	#[error("invalid endpoint: {0}")]
	InvalidEndpoint(String),

	/// An unknown error kind name was configured.
	#[error(transparent)]
	InvalidKind(#[from] CoreError),

	/// An environment variable held a value that could not be parsed.
	#[error("invalid value for {name}: {value}")]
	InvalidEnv {
		/// Variable name.
		name: String,
		/// Offending value.
		value: String,
	},

	/// A configuration file could not be parsed.
	#[error("config parse error: {0}")]
	ConfigParse(#[from] toml::de::Error),

	/// A caller-supplied record was not a valid report record.
	#[error("invalid report record: {0}")]
	Serialization(#[from] serde_json::Error),

	/// The HTTP client could not be built.
	#[error("HTTP client error: {0}")]
	RequestFailed(#[from] reqwest::Error),
}
