// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The normalized report record.
//!
//! Every error source produces one of these. The wire payload is this struct
//! serialized as a JSON object with camelCase keys; `None` fields are
//! omitted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kind::ErrorKind;

/// A normalized error report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub app_id: Option<String>,
	#[serde(rename = "type")]
	pub kind: ErrorKind,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub component_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub info: Option<String>,

	// runtime-error
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub lineno: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub colno: Option<u32>,

	// resource-load-failure
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tag_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub src: Option<String>,

	// unhandled-rejection
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub res_config: Option<String>,

	/// Milliseconds since the Unix epoch, set during enrichment.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub time: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
}

impl ReportRecord {
	/// An empty record of the given kind.
	pub fn new(kind: ErrorKind) -> Self {
		Self {
			app_id: None,
			kind,
			error: None,
			message: None,
			stack: None,
			component_name: None,
			info: None,
			source: None,
			lineno: None,
			colno: None,
			tag_name: None,
			src: None,
			reason: None,
			res_config: None,
			time: None,
			url: None,
			user_agent: None,
		}
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		self.stack = Some(stack.into());
		self
	}

	pub fn with_error(mut self, error: impl Into<Value>) -> Self {
		self.error = Some(error.into());
		self
	}

	pub fn with_info(mut self, info: impl Into<String>) -> Self {
		self.info = Some(info.into());
		self
	}

	/// True once `appId`, `time`, `url` and `userAgent` have all been set.
	pub fn is_enriched(&self) -> bool {
		self.app_id.is_some()
			&& self.time.is_some()
			&& self.url.is_some()
			&& self.user_agent.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn serializes_with_wire_names() {
		let mut record = ReportRecord::new(ErrorKind::ResourceLoadFailure);
		record.tag_name = Some("img".to_string());
		record.src = Some("https://cdn/a.png".to_string());
		record.app_id = Some("shop".to_string());
		record.user_agent = Some("ua".to_string());

		let value = serde_json::to_value(&record).unwrap();
		assert_eq!(
			value,
			json!({
				"appId": "shop",
				"type": "resource-load-failure",
				"tagName": "img",
				"src": "https://cdn/a.png",
				"userAgent": "ua",
			})
		);
	}

	#[test]
	fn new_record_is_not_enriched() {
		let record = ReportRecord::new(ErrorKind::Test).with_message("hello");
		assert!(!record.is_enriched());
		assert_eq!(record.message.as_deref(), Some("hello"));
	}

	#[test]
	fn deserializes_partial_record() {
		let record: ReportRecord =
			serde_json::from_value(json!({"type": "test", "resConfig": "{}"})).unwrap();
		assert_eq!(record.kind, ErrorKind::Test);
		assert_eq!(record.res_config.as_deref(), Some("{}"));
		assert!(record.app_id.is_none());
	}
}
