// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Native event shapes as delivered by the ambient error channels.
//!
//! These are the arguments each channel hands to its handlers before any
//! normalization happens. Overrides configured by the caller receive them
//! unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An error object as surfaced by the host (a thrown exception, a panic).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

impl ErrorObject {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			name: None,
			message: message.into(),
			stack: None,
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		self.stack = Some(stack.into());
		self
	}

	/// Builds an error object from a Rust error, folding its `source()` chain
	/// into the stack text.
	pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
		let mut causes = Vec::new();
		let mut source = error.source();
		while let Some(cause) = source {
			causes.push(format!("caused by: {cause}"));
			source = cause.source();
		}

		Self {
			name: None,
			message: error.to_string(),
			stack: (!causes.is_empty()).then(|| causes.join("\n")),
		}
	}
}

/// Arguments of the global runtime error signal:
/// `(message, source, line, col, error)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeErrorArgs {
	pub message: String,
	pub source: Option<String>,
	pub lineno: Option<u32>,
	pub colno: Option<u32>,
	pub error: Option<ErrorObject>,
}

/// An unhandled rejection; `reason` is whatever value the rejection carried.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectionEvent {
	pub reason: Value,
}

impl RejectionEvent {
	pub fn new(reason: impl Into<Value>) -> Self {
		Self {
			reason: reason.into(),
		}
	}

	/// `reason.message`, or an empty string when the reason has none.
	pub fn message(&self) -> String {
		string_field(&self.reason, "message")
	}

	/// `reason.stack`, or an empty string when the reason has none.
	pub fn stack(&self) -> String {
		string_field(&self.reason, "stack")
	}

	/// The request configuration of an HTTP-client style rejection
	/// (`reason.response.config`), when present.
	pub fn response_config(&self) -> Option<&Value> {
		self
			.reason
			.pointer("/response/config")
			.filter(|config| is_truthy(config))
	}
}

/// A capture-phase resource error event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceErrorEvent {
	pub target: Option<EventTarget>,
}

impl ResourceErrorEvent {
	pub fn new(target: EventTarget) -> Self {
		Self {
			target: Some(target),
		}
	}

	/// An event whose target is gone.
	pub fn detached() -> Self {
		Self { target: None }
	}
}

/// The element an error event was dispatched on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTarget {
	/// Tag name as reported by the host, usually upper case (`IMG`).
	pub tag_name: String,
	pub src: Option<String>,
	pub href: Option<String>,
}

impl EventTarget {
	pub fn new(tag_name: impl Into<String>) -> Self {
		Self {
			tag_name: tag_name.into(),
			src: None,
			href: None,
		}
	}

	pub fn with_src(mut self, src: impl Into<String>) -> Self {
		self.src = Some(src.into());
		self
	}

	pub fn with_href(mut self, href: impl Into<String>) -> Self {
		self.href = Some(href.into());
		self
	}

	/// The resource address: `src` when non-empty, otherwise `href`.
	pub fn address(&self) -> Option<&str> {
		self
			.src
			.as_deref()
			.filter(|src| !src.is_empty())
			.or(self.href.as_deref())
	}
}

/// A component instance handed to framework callbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentInstance {
	/// The name declared in the component's options, if any.
	pub name: Option<String>,
}

impl ComponentInstance {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
		}
	}

	pub fn anonymous() -> Self {
		Self { name: None }
	}
}

/// Arguments of the framework warn/error callbacks: `(error, instance, info)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameworkHookArgs {
	pub error: ErrorObject,
	pub instance: Option<ComponentInstance>,
	pub info: String,
}

impl FrameworkHookArgs {
	pub fn new(
		error: ErrorObject,
		instance: Option<ComponentInstance>,
		info: impl Into<String>,
	) -> Self {
		Self {
			error,
			instance,
			info: info.into(),
		}
	}

	pub fn component_name(&self) -> Option<&str> {
		self.instance.as_ref().and_then(|i| i.name.as_deref())
	}
}

fn string_field(value: &Value, key: &str) -> String {
	value
		.get(key)
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string()
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::String(s) => !s.is_empty(),
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Value::Array(_) | Value::Object(_) => true,
	}
}
