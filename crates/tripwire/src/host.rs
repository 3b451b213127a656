// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host integration points.
//!
//! The monitor never touches ambient globals directly. A [`Host`] hands it
//! the error channels that exist in the current environment:
//!
//! - callback slots ([`HandlerSlot`]) that hold at most one handler and may
//!   already be occupied by other code; the monitor chains onto them
//! - listener lists ([`EventSource`]) that accept additional listeners
//!
//! [`InMemoryHost`] implements every channel in memory and is what tests and
//! embedders that dispatch events themselves use. `ProcessHost` binds the
//! runtime-error slot to the Rust panic hook.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tripwire_core::{
	after, FrameworkHookArgs, Handler, HandlerChain, RejectionEvent, ResourceErrorEvent,
	RuntimeErrorArgs,
};

/// A channel that holds a single handler.
pub trait HandlerSlot<A: 'static>: Send + Sync {
	/// The handler currently occupying the slot.
	fn existing(&self) -> Option<Handler<A>>;

	/// Replaces the slot's handler.
	fn set(&self, handler: Handler<A>);

	/// Installs `next` after whatever the slot already holds.
	fn chain(&self, next: Handler<A>) {
		self.set(after(self.existing(), next));
	}
}

/// A channel that accepts any number of listeners.
pub trait EventSource<E: 'static>: Send + Sync {
	fn add_listener(&self, listener: Handler<E>);
}

/// The error channels and page facts available in an environment.
///
/// Channels that do not exist return `None`; the monitor skips them.
pub trait Host: Send + Sync {
	/// Global runtime error slot (`onerror` / panic hook).
	fn runtime_errors(&self) -> Option<&dyn HandlerSlot<RuntimeErrorArgs>>;

	/// Whether the process may end as soon as a runtime-error handler
	/// returns. Reports from that channel are then delivered before the
	/// handler returns.
	fn runtime_errors_are_fatal(&self) -> bool {
		false
	}

	/// Unhandled rejection listeners.
	fn rejections(&self) -> Option<&dyn EventSource<RejectionEvent>>;

	/// Capture-phase resource error listeners.
	fn resource_errors(&self) -> Option<&dyn EventSource<ResourceErrorEvent>>;

	/// An ambient framework config, used when the monitor config does not
	/// supply one.
	fn framework_config(&self) -> Option<Arc<FrameworkConfig>> {
		None
	}

	/// Address of the current page or process.
	fn page_url(&self) -> String;

	/// User agent reported with every record.
	fn user_agent(&self) -> String;
}

/// In-memory [`HandlerSlot`].
pub struct CallbackSlot<A> {
	handler: RwLock<Option<Handler<A>>>,
}

impl<A: 'static> CallbackSlot<A> {
	pub fn new() -> Self {
		Self {
			handler: RwLock::new(None),
		}
	}

	/// A slot already occupied by `handler`.
	pub fn with_handler(handler: Handler<A>) -> Self {
		Self {
			handler: RwLock::new(Some(handler)),
		}
	}

	pub fn is_set(&self) -> bool {
		self
			.handler
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.is_some()
	}

	/// Calls the current handler, if any. Returns whether one ran.
	pub fn invoke(&self, args: &A) -> bool {
		// Clone out so the handler may itself touch the slot.
		let current = self
			.handler
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone();
		match current {
			Some(handler) => {
				handler(args);
				true
			}
			None => false,
		}
	}
}

impl<A: 'static> Default for CallbackSlot<A> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A: 'static> HandlerSlot<A> for CallbackSlot<A> {
	fn existing(&self) -> Option<Handler<A>> {
		self
			.handler
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	fn set(&self, handler: Handler<A>) {
		*self
			.handler
			.write()
			.unwrap_or_else(PoisonError::into_inner) = Some(handler);
	}
}

/// In-memory [`EventSource`]; dispatches in registration order.
pub struct ListenerList<E> {
	listeners: Mutex<HandlerChain<E>>,
}

impl<E: 'static> ListenerList<E> {
	pub fn new() -> Self {
		Self {
			listeners: Mutex::new(HandlerChain::new()),
		}
	}

	pub fn len(&self) -> usize {
		self
			.listeners
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Delivers `event` to every listener.
	pub fn dispatch(&self, event: &E) {
		let listeners = self
			.listeners
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.snapshot();
		for listener in listeners {
			listener(event);
		}
	}
}

impl<E: 'static> Default for ListenerList<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E: 'static> EventSource<E> for ListenerList<E> {
	fn add_listener(&self, listener: Handler<E>) {
		self
			.listeners
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(listener);
	}
}

/// A UI framework's global config object with its two mutable hook slots.
///
/// The framework calls [`warn`](Self::warn) / [`error`](Self::error) when it
/// would invoke its configured `warnHandler` / `errorHandler`.
#[derive(Default)]
pub struct FrameworkConfig {
	pub warn_handler: CallbackSlot<FrameworkHookArgs>,
	pub error_handler: CallbackSlot<FrameworkHookArgs>,
}

impl FrameworkConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn warn(&self, args: &FrameworkHookArgs) -> bool {
		self.warn_handler.invoke(args)
	}

	pub fn error(&self, args: &FrameworkHookArgs) -> bool {
		self.error_handler.invoke(args)
	}
}

/// A host whose channels all live in memory.
pub struct InMemoryHost {
	runtime_errors: Option<CallbackSlot<RuntimeErrorArgs>>,
	rejections: Option<ListenerList<RejectionEvent>>,
	resource_errors: Option<ListenerList<ResourceErrorEvent>>,
	framework_config: Option<Arc<FrameworkConfig>>,
	page_url: String,
	user_agent: String,
}

impl InMemoryHost {
	/// A host with every channel present and no ambient framework config.
	pub fn new() -> Self {
		Self {
			runtime_errors: Some(CallbackSlot::new()),
			rejections: Some(ListenerList::new()),
			resource_errors: Some(ListenerList::new()),
			framework_config: None,
			page_url: "memory://localhost/".to_string(),
			user_agent: tripwire_common_http::user_agent(),
		}
	}

	pub fn without_runtime_errors(mut self) -> Self {
		self.runtime_errors = None;
		self
	}

	pub fn without_rejections(mut self) -> Self {
		self.rejections = None;
		self
	}

	pub fn without_resource_errors(mut self) -> Self {
		self.resource_errors = None;
		self
	}

	/// Exposes `config` as the ambient framework config.
	pub fn with_framework_config(mut self, config: Arc<FrameworkConfig>) -> Self {
		self.framework_config = Some(config);
		self
	}

	pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
		self.page_url = url.into();
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();
		self
	}

	/// The runtime-error slot, for pre-registering a foreign handler.
	pub fn runtime_slot(&self) -> Option<&CallbackSlot<RuntimeErrorArgs>> {
		self.runtime_errors.as_ref()
	}

	pub fn rejection_listeners(&self) -> Option<&ListenerList<RejectionEvent>> {
		self.rejections.as_ref()
	}

	pub fn resource_listeners(&self) -> Option<&ListenerList<ResourceErrorEvent>> {
		self.resource_errors.as_ref()
	}

	/// Fires the runtime-error signal.
	pub fn raise(&self, args: &RuntimeErrorArgs) -> bool {
		self
			.runtime_errors
			.as_ref()
			.is_some_and(|slot| slot.invoke(args))
	}

	/// Fires the unhandled-rejection event.
	pub fn reject(&self, event: &RejectionEvent) {
		if let Some(listeners) = &self.rejections {
			listeners.dispatch(event);
		}
	}

	/// Fires the resource error event.
	pub fn fail_resource(&self, event: &ResourceErrorEvent) {
		if let Some(listeners) = &self.resource_errors {
			listeners.dispatch(event);
		}
	}
}

impl Default for InMemoryHost {
	fn default() -> Self {
		Self::new()
	}
}

impl Host for InMemoryHost {
	fn runtime_errors(&self) -> Option<&dyn HandlerSlot<RuntimeErrorArgs>> {
		self
			.runtime_errors
			.as_ref()
			.map(|slot| slot as &dyn HandlerSlot<RuntimeErrorArgs>)
	}

	fn rejections(&self) -> Option<&dyn EventSource<RejectionEvent>> {
		self
			.rejections
			.as_ref()
			.map(|list| list as &dyn EventSource<RejectionEvent>)
	}

	fn resource_errors(&self) -> Option<&dyn EventSource<ResourceErrorEvent>> {
		self
			.resource_errors
			.as_ref()
			.map(|list| list as &dyn EventSource<ResourceErrorEvent>)
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

#[cfg(test)]
mod tests {
	use super::*;
	use tripwire_core::{handler, ErrorObject};

	fn warn_args(message: &str) -> FrameworkHookArgs {
		FrameworkHookArgs::new(ErrorObject::new(message), None, "render")
	}

	#[test]
	fn empty_slot_invokes_nothing() {
		let slot: CallbackSlot<u32> = CallbackSlot::new();
		assert!(!slot.is_set());
		assert!(!slot.invoke(&1));
	}

	#[test]
	fn chain_keeps_existing_handler_first() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let first = Arc::clone(&log);
		let slot = CallbackSlot::with_handler(handler(move |v: &u32| {
			first.lock().unwrap().push(("existing", *v))
		}));
		let second = Arc::clone(&log);
		slot.chain(handler(move |v: &u32| second.lock().unwrap().push(("new", *v))));

		assert!(slot.invoke(&5));
		assert_eq!(*log.lock().unwrap(), vec![("existing", 5), ("new", 5)]);
	}

	#[test]
	fn listener_list_dispatches_in_order() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let list = ListenerList::new();
		for name in ["a", "b", "c"] {
			let log = Arc::clone(&log);
			list.add_listener(handler(move |_: &u32| log.lock().unwrap().push(name)));
		}

		list.dispatch(&0);
		assert_eq!(list.len(), 3);
		assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
	}

	#[test]
	fn handler_may_reenter_its_slot() {
		let slot = Arc::new(CallbackSlot::<u32>::new());
		let inner = Arc::clone(&slot);
		slot.set(handler(move |_: &u32| {
			assert!(inner.is_set());
		}));
		assert!(slot.invoke(&1));
	}

	#[test]
	fn framework_config_routes_to_slots() {
		let config = FrameworkConfig::new();
		assert!(!config.warn(&warn_args("ignored")));

		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		config.warn_handler.set(handler(move |args: &FrameworkHookArgs| {
			sink.lock().unwrap().push(args.error.message.clone())
		}));

		assert!(config.warn(&warn_args("prop type mismatch")));
		assert!(!config.error(&warn_args("nothing here")));
		assert_eq!(*seen.lock().unwrap(), vec!["prop type mismatch"]);
	}

	#[test]
	fn in_memory_host_can_drop_channels() {
		let host = InMemoryHost::new()
			.without_runtime_errors()
			.without_rejections();
		assert!(host.runtime_errors().is_none());
		assert!(host.rejections().is_none());
		assert!(host.resource_errors().is_some());
		assert!(host.framework_config().is_none());
		assert!(!host.raise(&RuntimeErrorArgs::default()));
	}
}
