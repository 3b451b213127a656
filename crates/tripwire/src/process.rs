// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host bound to the running Rust process.
//!
//! The runtime-error channel is the std panic hook. The first handler set on
//! it installs a hook that runs the previously installed hook and then
//! the handler. Rejections and resource failures have no process-level
//! source, so the embedding application feeds them in through
//! [`ProcessHost::report_rejection`], [`ProcessHost::reject_error`] and
//! [`ProcessHost::report_resource_error`].
//!
//! Handlers on the panic channel run inside the panic hook; a handler that
//! panics there aborts the process. A panic on the main thread ends the
//! process once the hook returns, so the host marks runtime errors as fatal
//! and panic reports are sent before the hook returns.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::sync::{Arc, Once};

use serde_json::Value;
use tripwire_core::{
	ErrorObject, EventTarget, Handler, RejectionEvent, ResourceErrorEvent, RuntimeErrorArgs,
};

use crate::host::{CallbackSlot, EventSource, FrameworkConfig, HandlerSlot, Host, ListenerList};

/// Error name given to panics.
pub const PANIC_ERROR_NAME: &str = "panic";

/// [`HandlerSlot`] backed by the std panic hook.
struct PanicHookSlot {
	slot: Arc<CallbackSlot<RuntimeErrorArgs>>,
	hooked: Once,
}

impl PanicHookSlot {
	fn new() -> Self {
		Self {
			slot: Arc::new(CallbackSlot::new()),
			hooked: Once::new(),
		}
	}
}

impl HandlerSlot<RuntimeErrorArgs> for PanicHookSlot {
	fn existing(&self) -> Option<Handler<RuntimeErrorArgs>> {
		self.slot.existing()
	}

	fn set(&self, handler: Handler<RuntimeErrorArgs>) {
		self.slot.set(handler);
		self.hooked
			.call_once(|| install_panic_hook(Arc::clone(&self.slot)));
	}
}

fn install_panic_hook(slot: Arc<CallbackSlot<RuntimeErrorArgs>>) {
	let previous = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		previous(info);
		slot.invoke(&panic_args(info));
	}));
}

fn panic_args(info: &PanicHookInfo<'_>) -> RuntimeErrorArgs {
	let message = payload_message(info.payload());
	let location = info.location();
	let backtrace = Backtrace::force_capture();

	RuntimeErrorArgs {
		message: message.clone(),
		source: location.map(|l| l.file().to_string()),
		lineno: location.map(|l| l.line()),
		colno: location.map(|l| l.column()),
		error: Some(
			ErrorObject::new(message)
				.with_name(PANIC_ERROR_NAME)
				.with_stack(backtrace.to_string()),
		),
	}
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}

/// The production [`Host`] for a Rust process.
pub struct ProcessHost {
	panics: PanicHookSlot,
	rejections: ListenerList<RejectionEvent>,
	resource_errors: ListenerList<ResourceErrorEvent>,
	framework_config: Option<Arc<FrameworkConfig>>,
	page_url: String,
	user_agent: String,
}

impl ProcessHost {
	pub fn new() -> Self {
		let page_url = match std::env::current_exe() {
			Ok(path) => format!("file://{}", path.display()),
			Err(_) => "file://unknown".to_string(),
		};
		Self {
			panics: PanicHookSlot::new(),
			rejections: ListenerList::new(),
			resource_errors: ListenerList::new(),
			framework_config: None,
			page_url,
			user_agent: tripwire_common_http::user_agent(),
		}
	}

	/// Exposes `config` as the ambient framework config.
	pub fn with_framework_config(mut self, config: Arc<FrameworkConfig>) -> Self {
		self.framework_config = Some(config);
		self
	}

	/// Reports a failure nobody handled, such as a detached task's error.
	pub fn report_rejection(&self, reason: impl Into<Value>) {
		self.rejections.dispatch(&RejectionEvent::new(reason));
	}

	/// Like [`report_rejection`](Self::report_rejection), with the reason
	/// built from `error` and its source chain.
	pub fn reject_error(&self, error: &(dyn std::error::Error + 'static)) {
		let object = ErrorObject::from_error(error);
		let reason = serde_json::to_value(&object).unwrap_or_else(|_| Value::String(object.message));
		self.report_rejection(reason);
	}

	/// Reports an asset that failed to load.
	pub fn report_resource_error(&self, target: EventTarget) {
		self.resource_errors.dispatch(&ResourceErrorEvent::new(target));
	}

	/// Whether a runtime-error handler has been installed.
	pub fn panic_hook_installed(&self) -> bool {
		self.panics.slot.is_set()
	}
}

impl Default for ProcessHost {
	fn default() -> Self {
		Self::new()
	}
}

impl Host for ProcessHost {
	fn runtime_errors(&self) -> Option<&dyn HandlerSlot<RuntimeErrorArgs>> {
		Some(&self.panics)
	}

	fn runtime_errors_are_fatal(&self) -> bool {
		true
	}

	fn rejections(&self) -> Option<&dyn EventSource<RejectionEvent>> {
		Some(&self.rejections)
	}

	fn resource_errors(&self) -> Option<&dyn EventSource<ResourceErrorEvent>> {
		Some(&self.resource_errors)
	}

	fn framework_config(&self) -> Option<Arc<FrameworkConfig>> {
		self.framework_config.clone()
	}

	fn page_url(&self) -> String {
		self.page_url.clone()
	}

	fn user_agent(&self) -> String {
		self.user_agent.clone()
	}
}
