// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The reporting pipeline: observe, filter, enrich, transform, deliver.
//!
//! Every adapter funnels into [`report`]. The steps run in a fixed order:
//!
//! 1. the configured report hook observes the raw record
//! 2. the filter hook may drop the record; nothing else happens then
//! 3. `appId`, `time`, `url` and `userAgent` are overlaid onto the record
//! 4. the transform hook, if any, replaces the record with its own payload
//! 5. the payload is POSTed to the endpoint or handed to the callback
//!
//! An endpoint post normally runs in the background. A [`Reporter`] using
//! [`Delivery::Blocking`] waits for it instead, for records raised while the
//! process is about to exit.
//!
//! Caller hooks are not guarded: a panicking hook unwinds out of `report`.
//! A record raised on a thread that is already inside the pipeline (for
//! instance a hook panicking while the panic hook is installed) is dropped.

use std::cell::Cell;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use tripwire_core::ReportRecord;

use crate::config::{DeliveryTarget, MonitorConfig};
use crate::host::Host;
use crate::transport::Transport;
use crate::LOG_TARGET;

thread_local! {
	static IN_PIPELINE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside the pipeline until dropped.
struct ReentrancyGuard;

impl ReentrancyGuard {
	fn enter() -> Option<Self> {
		IN_PIPELINE.with(|flag| {
			if flag.get() {
				None
			} else {
				flag.set(true);
				Some(ReentrancyGuard)
			}
		})
	}
}

impl Drop for ReentrancyGuard {
	fn drop(&mut self) {
		IN_PIPELINE.with(|flag| flag.set(false));
	}
}

/// How an endpoint post is handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
	#[default]
	Background,
	/// Return only once the post has finished.
	Blocking,
}

/// Runs `record` through the pipeline under `config`.
pub fn report(
	config: &MonitorConfig,
	host: &dyn Host,
	transport: &dyn Transport,
	record: ReportRecord,
) {
	run(config, host, transport, record, Delivery::Background);
}

fn run(
	config: &MonitorConfig,
	host: &dyn Host,
	transport: &dyn Transport,
	record: ReportRecord,
	delivery: Delivery,
) {
	let Some(_guard) = ReentrancyGuard::enter() else {
		if config.debug() {
			debug!(target: LOG_TARGET, kind = %record.kind, "[monitor] report dropped: pipeline re-entered");
		}
		return;
	};

	if let Some(hook) = config.report_hook() {
		hook(config, &record);
	}
	if config.debug() {
		debug!(target: LOG_TARGET, kind = %record.kind, "[monitor] report start");
	}

	if let Some(filter) = config.filter() {
		if filter(&record) {
			if config.debug() {
				debug!(target: LOG_TARGET, record = ?record, "[monitor] report filtered");
			}
			return;
		}
	}

	let record = enrich(record, config.app_id(), host);

	let payload = match config.transform() {
		Some(transform) => {
			if config.debug() {
				debug!(target: LOG_TARGET, record = ?record, "[monitor] report transform before");
			}
			let payload = transform(record);
			if config.debug() {
				debug!(target: LOG_TARGET, payload = %payload, "[monitor] report transform after");
			}
			payload
		}
		None => match serde_json::to_value(&record) {
			Ok(payload) => payload,
			Err(e) => {
				warn!(error = %e, kind = %record.kind, "Failed to serialize report record");
				return;
			}
		},
	};

	deliver(config, transport, &payload, delivery);
}

/// Overlays the enrichment fields, replacing whatever the adapter set.
pub fn enrich(mut record: ReportRecord, app_id: &str, host: &dyn Host) -> ReportRecord {
	record.app_id = Some(app_id.to_string());
	record.time = Some(Utc::now().timestamp_millis());
	record.url = Some(host.page_url());
	record.user_agent = Some(host.user_agent());
	record
}

fn deliver(config: &MonitorConfig, transport: &dyn Transport, payload: &Value, delivery: Delivery) {
	match config.delivery() {
		DeliveryTarget::Endpoint(endpoint) => {
			if config.debug() {
				debug!(
					target: LOG_TARGET,
					endpoint = %endpoint,
					payload = %payload,
					"[monitor] report api post"
				);
			}
			match delivery {
				Delivery::Background => transport.post_json(endpoint, payload.to_string()),
				Delivery::Blocking => transport.post_json_blocking(endpoint, payload.to_string()),
			}
		}
		DeliveryTarget::Callback(callback) => {
			if config.debug() {
				debug!(target: LOG_TARGET, payload = %payload, "[monitor] report api callback");
			}
			callback(payload);
		}
	}
}

/// A configuration bound to the collaborators it reports through.
#[derive(Clone)]
pub struct Reporter {
	config: Arc<MonitorConfig>,
	host: Arc<dyn Host>,
	transport: Arc<dyn Transport>,
	delivery: Delivery,
}

impl Reporter {
	pub fn new(
		config: Arc<MonitorConfig>,
		host: Arc<dyn Host>,
		transport: Arc<dyn Transport>,
	) -> Self {
		Self {
			config,
			host,
			transport,
			delivery: Delivery::Background,
		}
	}

	pub fn with_delivery(mut self, delivery: Delivery) -> Self {
		self.delivery = delivery;
		self
	}

	pub fn config(&self) -> &MonitorConfig {
		&self.config
	}

	pub fn report(&self, record: ReportRecord) {
		run(
			&self.config,
			self.host.as_ref(),
			self.transport.as_ref(),
			record,
			self.delivery,
		);
	}
}
