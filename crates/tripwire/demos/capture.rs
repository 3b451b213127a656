// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Installs the process-wide monitor and triggers one error per channel.
//!
//! ```bash
//! RUST_LOG=tripwire=debug TRIPWIRE_DEBUG=1 cargo run -p tripwire --example capture
//! TRIPWIRE_ENDPOINT=http://localhost:8080/report cargo run -p tripwire --example capture
//! ```

use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tripwire::{ErrorKind, EventTarget, MonitorConfigBuilder, ReportRecord};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let config = MonitorConfigBuilder::new()
		.app_id("capture-demo")
		.deliver_to(|payload| info!(%payload, "Report delivered to callback"))
		.with_env()?
		.build()?;
	info!(app_id = config.app_id(), delivery = ?config.delivery(), "Loaded configuration");

	tripwire::setup(config.clone())?;

	let host = tripwire::process_host();
	let _ = std::panic::catch_unwind(|| panic!("demo panic"));
	host.report_rejection(serde_json::json!({
		"message": "Request failed with status code 500",
		"response": {"config": {"method": "post", "url": "/api/orders"}},
	}));
	host.reject_error(&std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing"));
	let image = EventTarget::new("IMG").with_src("https://cdn.example.com/missing.png");
	host.report_resource_error(image);
	tripwire::report(&config, ReportRecord::new(ErrorKind::Test).with_message("manual report"))?;

	// Give in-flight HTTP deliveries a moment before exiting.
	tokio::time::sleep(Duration::from_millis(500)).await;
	Ok(())
}
