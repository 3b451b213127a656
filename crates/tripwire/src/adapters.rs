// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error-source adapters.
//!
//! Each `on_*` function is what the monitor installs on one channel. It calls
//! the caller's override with the untouched native arguments, then
//! normalizes the event and hands the record to the pipeline. The override
//! always runs, even for events that are not reported.

use tripwire_core::{
	ErrorKind, ErrorObject, FrameworkHookArgs, RejectionEvent, ReportRecord, ResourceErrorEvent,
	RuntimeErrorArgs,
};

use crate::pipeline::Reporter;

/// Tags whose load failures are reported.
pub const TRACKED_TAGS: [&str; 3] = ["img", "script", "link"];

fn error_value(error: &ErrorObject) -> Option<serde_json::Value> {
	serde_json::to_value(error).ok()
}

pub fn normalize_runtime_error(args: &RuntimeErrorArgs) -> ReportRecord {
	let mut record = ReportRecord::new(ErrorKind::RuntimeError).with_message(args.message.clone());
	record.source = args.source.clone();
	record.lineno = args.lineno;
	record.colno = args.colno;
	if let Some(error) = &args.error {
		record.stack = error.stack.clone();
		record.error = error_value(error);
	}
	record
}

/// `resConfig` is always present: the JSON text of `reason.response.config`,
/// or an empty string.
pub fn normalize_rejection(event: &RejectionEvent) -> ReportRecord {
	let mut record = ReportRecord::new(ErrorKind::UnhandledRejection)
		.with_message(event.message())
		.with_stack(event.stack())
		.with_error(event.reason.clone());
	record.reason = Some(event.reason.clone());
	record.res_config = Some(
		event
			.response_config()
			.map(|config| config.to_string())
			.unwrap_or_default(),
	);
	record
}

/// Returns `None` when the target is gone or is not an img, script or link.
pub fn normalize_resource_error(event: &ResourceErrorEvent) -> Option<ReportRecord> {
	let target = event.target.as_ref()?;
	let tag_name = target.tag_name.to_ascii_lowercase();
	if !TRACKED_TAGS.contains(&tag_name.as_str()) {
		return None;
	}

	let mut record = ReportRecord::new(ErrorKind::ResourceLoadFailure);
	record.src = target.address().map(str::to_string);
	record.tag_name = Some(tag_name);
	Some(record)
}

/// Normalizes framework warn/error callback arguments under `kind`.
pub fn normalize_framework(kind: ErrorKind, args: &FrameworkHookArgs) -> ReportRecord {
	let mut record = ReportRecord::new(kind)
		.with_message(args.error.message.clone())
		.with_info(args.info.clone());
	record.error = error_value(&args.error);
	record.stack = args.error.stack.clone();
	record.component_name = args.component_name().map(str::to_string);
	record
}

pub fn on_runtime_error(reporter: &Reporter, args: &RuntimeErrorArgs) {
	if let Some(callback) = &reporter.config().overrides().runtime_error {
		callback(args);
	}
	reporter.report(normalize_runtime_error(args));
}

pub fn on_unhandled_rejection(reporter: &Reporter, event: &RejectionEvent) {
	if let Some(callback) = &reporter.config().overrides().unhandled_rejection {
		callback(event);
	}
	reporter.report(normalize_rejection(event));
}

pub fn on_resource_error(reporter: &Reporter, event: &ResourceErrorEvent) {
	if let Some(callback) = &reporter.config().overrides().resource_load_failure {
		callback(event);
	}
	if let Some(record) = normalize_resource_error(event) {
		reporter.report(record);
	}
}

pub fn on_framework_warning(reporter: &Reporter, args: &FrameworkHookArgs) {
	if let Some(callback) = &reporter.config().overrides().framework_warning {
		callback(args);
	}
	reporter.report(normalize_framework(ErrorKind::FrameworkWarning, args));
}

pub fn on_framework_error(reporter: &Reporter, args: &FrameworkHookArgs) {
	if let Some(callback) = &reporter.config().overrides().framework_error {
		callback(args);
	}
	reporter.report(normalize_framework(ErrorKind::FrameworkError, args));
}
