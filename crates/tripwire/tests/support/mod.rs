// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tripwire::host::InMemoryHost;
use tripwire::transport::Transport;
use tripwire::{Monitor, MonitorConfig, MonitorConfigBuilder};

pub const PAGE_URL: &str = "https://shop.example.com/checkout";
pub const USER_AGENT: &str = "Mozilla/5.0 (tripwire-tests)";

/// Records every POST instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
	pub posts: Mutex<Vec<(String, Value)>>,
}

impl Transport for RecordingTransport {
	fn post_json(&self, endpoint: &str, body: String) {
		let body = serde_json::from_str(&body).expect("transport body is JSON");
		self.posts.lock().unwrap().push((endpoint.to_string(), body));
	}
}

pub struct Harness {
	pub host: Arc<InMemoryHost>,
	pub transport: Arc<RecordingTransport>,
	pub monitor: Monitor,
	pub delivered: Arc<Mutex<Vec<Value>>>,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_host(InMemoryHost::new())
	}

	pub fn with_host(host: InMemoryHost) -> Self {
		let host = Arc::new(host.with_page_url(PAGE_URL).with_user_agent(USER_AGENT));
		let transport = Arc::new(RecordingTransport::default());
		let monitor = Monitor::new(host.clone(), transport.clone());
		Self {
			host,
			transport,
			monitor,
			delivered: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// A builder whose callback delivery lands in `self.delivered`.
	pub fn config(&self) -> MonitorConfigBuilder {
		let sink = Arc::clone(&self.delivered);
		MonitorConfig::builder()
			.app_id("checkout")
			.deliver_to(move |payload| sink.lock().unwrap().push(payload.clone()))
	}

	pub fn delivered(&self) -> Vec<Value> {
		self.delivered.lock().unwrap().clone()
	}

	pub fn posts(&self) -> Vec<(String, Value)> {
		self.transport.posts.lock().unwrap().clone()
	}
}
