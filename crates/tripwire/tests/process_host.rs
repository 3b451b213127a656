// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The panic hook is process-global, so this file holds a single test.

mod support;

use std::sync::{Arc, Mutex};

use serde_json::Value;
use support::RecordingTransport;
use tripwire::host::Host;
use tripwire::{ErrorKind, EventTarget, Monitor, MonitorConfig, ProcessHost, PANIC_ERROR_NAME};

#[test]
fn test_process_host_reports_panics_and_fed_events() {
	let host = Arc::new(ProcessHost::new());
	let monitor = Monitor::new(host.clone(), Arc::new(RecordingTransport::default()));
	let delivered: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&delivered);
	let overridden = Arc::new(Mutex::new(Vec::new()));
	let seen = Arc::clone(&overridden);

	monitor.setup(
		MonitorConfig::builder()
			.app_id("worker")
			.on_runtime_error(move |args| seen.lock().unwrap().push(args.message.clone()))
			.deliver_to(move |payload| sink.lock().unwrap().push(payload.clone()))
			.build()
			.unwrap(),
	);
	assert!(host.panic_hook_installed());
	assert!(monitor.hooked_kinds().contains(&ErrorKind::RuntimeError));

	let result = std::panic::catch_unwind(|| panic!("worker exploded: {}", 42));
	assert!(result.is_err());

	host.report_rejection(serde_json::json!({"message": "job 7 failed"}));
	host.report_resource_error(EventTarget::new("LINK").with_href("/theme.css"));

	assert_eq!(*overridden.lock().unwrap(), vec!["worker exploded: 42"]);

	let delivered = delivered.lock().unwrap();
	assert_eq!(delivered.len(), 3);

	let panic = &delivered[0];
	assert_eq!(panic["type"], "runtime-error");
	assert_eq!(panic["message"], "worker exploded: 42");
	assert!(panic["source"].as_str().unwrap().ends_with("process_host.rs"));
	assert!(panic["lineno"].as_u64().unwrap() > 0);
	assert_eq!(panic["error"]["name"], PANIC_ERROR_NAME);
	assert!(panic["stack"].is_string());
	assert_eq!(panic["url"], host.page_url());
	assert_eq!(panic["appId"], "worker");

	assert_eq!(delivered[1]["type"], "unhandled-rejection");
	assert_eq!(delivered[1]["message"], "job 7 failed");
	assert_eq!(delivered[2]["tagName"], "link");
	assert_eq!(delivered[2]["src"], "/theme.css");
}
