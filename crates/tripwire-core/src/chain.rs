// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Composition of same-signature callbacks.
//!
//! Hosts expose two kinds of error channels: single callback slots, which
//! other code may already occupy, and listener lists. [`after`] composes a
//! new handler onto whatever a slot already holds; [`HandlerChain`] is the
//! ordered list form used behind listener-style channels. In both cases the
//! previously registered handlers run first, every handler sees the same
//! arguments, and none of them can stop the others from running.

use std::fmt;
use std::sync::Arc;

/// A shareable callback receiving a channel's native arguments.
pub type Handler<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Wraps a closure as a [`Handler`].
pub fn handler<A, F>(f: F) -> Handler<A>
where
	F: Fn(&A) + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Returns a handler that calls `existing` (when present) and then `next`,
/// both with the same arguments.
///
/// With no existing handler, `next` is returned as-is.
pub fn after<A: 'static>(existing: Option<Handler<A>>, next: Handler<A>) -> Handler<A> {
	match existing {
		None => next,
		Some(existing) => Arc::new(move |args: &A| {
			existing(args);
			next(args);
		}),
	}
}

/// An ordered list of handlers invoked in registration order.
pub struct HandlerChain<A> {
	entries: Vec<Handler<A>>,
}

impl<A> HandlerChain<A> {
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
		}
	}

	/// Appends a handler; it runs after every handler already registered.
	pub fn push(&mut self, handler: Handler<A>) {
		self.entries.push(handler);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Calls every handler in registration order.
	pub fn invoke(&self, args: &A) {
		for entry in &self.entries {
			entry(args);
		}
	}

	/// A snapshot of the registered handlers, so they can be invoked without
	/// holding whatever lock guards the chain.
	pub fn snapshot(&self) -> Vec<Handler<A>> {
		self.entries.clone()
	}
}

impl<A> Default for HandlerChain<A> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A> Clone for HandlerChain<A> {
	fn clone(&self) -> Self {
		Self {
			entries: self.entries.clone(),
		}
	}
}

impl<A> fmt::Debug for HandlerChain<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HandlerChain")
			.field("len", &self.entries.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::sync::Mutex;

	fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Handler<u32> {
		let log = Arc::clone(log);
		handler(move |value: &u32| log.lock().unwrap().push(format!("{name}:{value}")))
	}

	#[test]
	fn after_without_existing_returns_new_handler() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let composed = after(None, recorder(&log, "new"));
		composed(&7);
		assert_eq!(*log.lock().unwrap(), vec!["new:7"]);
	}

	#[test]
	fn after_runs_existing_first_with_same_args() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let composed = after(Some(recorder(&log, "old")), recorder(&log, "new"));
		composed(&42);
		assert_eq!(*log.lock().unwrap(), vec!["old:42", "new:42"]);
	}

	#[test]
	fn after_nests_in_registration_order() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let first = after(None, recorder(&log, "a"));
		let second = after(Some(first), recorder(&log, "b"));
		let third = after(Some(second), recorder(&log, "c"));
		third(&1);
		assert_eq!(*log.lock().unwrap(), vec!["a:1", "b:1", "c:1"]);
	}

	#[test]
	fn empty_chain_invokes_nothing() {
		let chain: HandlerChain<u32> = HandlerChain::new();
		assert!(chain.is_empty());
		chain.invoke(&1);
	}

	proptest! {
		#[test]
		fn chain_invokes_in_registration_order(count in 1usize..20, value in any::<u32>()) {
			let log = Arc::new(Mutex::new(Vec::new()));
			let mut chain = HandlerChain::new();
			for i in 0..count {
				let log = Arc::clone(&log);
				chain.push(handler(move |v: &u32| log.lock().unwrap().push((i, *v))));
			}

			chain.invoke(&value);

			let expected: Vec<(usize, u32)> = (0..count).map(|i| (i, value)).collect();
			prop_assert_eq!(log.lock().unwrap().clone(), expected);
		}
	}
}
