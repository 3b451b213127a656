// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error telemetry shim.
//!
//! Tripwire hooks the error channels of its host, normalizes whatever they
//! deliver into a [`ReportRecord`], and forwards the record to an HTTP
//! endpoint or a callback.
//!
//! # Quick Start
//!
//! ```ignore
//! use tripwire::MonitorConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::builder()
//!         .app_id("storefront")
//!         .endpoint("https://telemetry.example.com/report")
//!         .filter(|record| {
//!             record.message.as_deref() == Some("ResizeObserver loop limit exceeded")
//!         })
//!         .build()?;
//!
//!     // Chains onto the panic hook; later non-forced calls are no-ops.
//!     tripwire::setup(config)?;
//!
//!     // Feed failures the process has no channel for.
//!     tripwire::process_host().report_rejection(serde_json::json!({"message": "job failed"}));
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! Every record passes through the same steps: the report hook observes it,
//! the filter may drop it, `appId`/`time`/`url`/`userAgent` are overlaid,
//! the transform may replace it, and the result is delivered. See
//! [`pipeline`].
//!
//! # Hosts
//!
//! A [`Monitor`] is wired to a [`Host`](host::Host). [`ProcessHost`] binds the
//! runtime-error channel to the panic hook; [`InMemoryHost`](host::InMemoryHost)
//! keeps every channel in memory for tests and for embedders that dispatch
//! events themselves.

use std::sync::{Arc, OnceLock};

mod config;
mod error;
mod monitor;
mod process;

pub mod adapters;
pub mod host;
pub mod pipeline;
pub mod transport;

pub use config::{
	DeliveryCallback, DeliveryTarget, FilterHook, MonitorConfig, MonitorConfigBuilder, Overrides,
	ReportHook, TransformHook, DEFAULT_APP_ID,
};
pub use error::{MonitorError, Result};
pub use monitor::Monitor;
pub use process::{ProcessHost, PANIC_ERROR_NAME};

// Re-export core types for convenience
pub use tripwire_core::{
	after, handler, ComponentInstance, ErrorKind, ErrorObject, EventTarget, FrameworkHookArgs,
	Handler, RejectionEvent, ReportRecord, ResourceErrorEvent, RuntimeErrorArgs,
};

/// Target of the `[monitor]` diagnostic lines emitted in debug mode.
pub const LOG_TARGET: &str = "tripwire::monitor";

static PROCESS_HOST: OnceLock<Arc<ProcessHost>> = OnceLock::new();
static MONITOR: OnceLock<Monitor> = OnceLock::new();

/// The host bound to this process, shared by every caller.
pub fn process_host() -> Arc<ProcessHost> {
	Arc::clone(PROCESS_HOST.get_or_init(|| Arc::new(ProcessHost::new())))
}

fn global_monitor() -> Result<&'static Monitor> {
	if let Some(monitor) = MONITOR.get() {
		return Ok(monitor);
	}
	let monitor = Monitor::with_process_host()?;
	Ok(MONITOR.get_or_init(|| monitor))
}

/// Installs the process-wide monitor. See [`Monitor::setup`].
pub fn setup(config: MonitorConfig) -> Result<()> {
	global_monitor()?.setup(config);
	Ok(())
}

/// Runs `record` through the pipeline under `config`, using the process
/// host and HTTP delivery.
pub fn report(config: &MonitorConfig, record: ReportRecord) -> Result<()> {
	global_monitor()?.report_with(config, record);
	Ok(())
}
