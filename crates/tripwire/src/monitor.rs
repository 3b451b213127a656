// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The installation orchestrator.
//!
//! A [`Monitor`] owns its installed/uninstalled state, so independent
//! monitors never interfere with each other. Without `force`, only the first
//! [`Monitor::setup`] call installs anything. With `force`, every call runs
//! installation again.
//!
//! Installed handlers read the monitor's current configuration at call time.
//! Running installation again swaps that configuration and hooks only the
//! channels this monitor has not hooked yet, so a channel never ends up with
//! more than one tripwire handler per monitor.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use serde_json::Value;
use tracing::debug;
use tripwire_core::{
	handler, ErrorKind, FrameworkHookArgs, RejectionEvent, ReportRecord, ResourceErrorEvent,
	RuntimeErrorArgs,
};

use crate::adapters;
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::host::{FrameworkConfig, HandlerSlot, Host};
use crate::pipeline::{self, Delivery, Reporter};
use crate::transport::{HttpTransport, Transport};
use crate::LOG_TARGET;

/// State shared with the installed handlers.
struct Shared {
	config: RwLock<Option<Arc<MonitorConfig>>>,
	host: Weak<dyn Host>,
	transport: Arc<dyn Transport>,
}

impl Shared {
	fn reporter(&self) -> Option<Reporter> {
		let config = self
			.config
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()?;
		let host = self.host.upgrade()?;
		Some(Reporter::new(config, host, Arc::clone(&self.transport)))
	}
}

/// What this monitor has already hooked.
#[derive(Default)]
struct Hooked {
	runtime_errors: bool,
	rejections: bool,
	resource_errors: bool,
	warn_targets: Vec<Weak<FrameworkConfig>>,
	error_targets: Vec<Weak<FrameworkConfig>>,
	kinds: BTreeSet<ErrorKind>,
}

fn contains_target(targets: &[Weak<FrameworkConfig>], target: &Arc<FrameworkConfig>) -> bool {
	let target = Arc::downgrade(target);
	targets.iter().any(|known| known.ptr_eq(&target))
}

/// Captures errors from a [`Host`] and reports them through a [`Transport`].
pub struct Monitor {
	host: Arc<dyn Host>,
	installed: AtomicBool,
	install_runs: AtomicUsize,
	shared: Arc<Shared>,
	hooked: Mutex<Hooked>,
}

impl Monitor {
	pub fn new(host: Arc<dyn Host>, transport: Arc<dyn Transport>) -> Self {
		let shared = Arc::new(Shared {
			config: RwLock::new(None),
			host: Arc::downgrade(&host),
			transport,
		});
		Self {
			host,
			installed: AtomicBool::new(false),
			install_runs: AtomicUsize::new(0),
			shared,
			hooked: Mutex::new(Hooked::default()),
		}
	}

	/// A monitor bound to the process-wide
	/// [`ProcessHost`](crate::ProcessHost) that delivers over
	/// HTTP.
	pub fn with_process_host() -> Result<Self> {
		let host: Arc<dyn Host> = crate::process_host();
		Ok(Self::new(host, Arc::new(HttpTransport::new()?)))
	}

	/// Installs adapters for every watched channel the host provides.
	///
	/// Without `force` this runs at most once per monitor; later calls are
	/// no-ops and keep the first configuration. A forced call always runs and
	/// does not mark the monitor installed.
	pub fn setup(&self, config: MonitorConfig) {
		if !config.force() && self.installed.swap(true, Ordering::SeqCst) {
			if config.debug() {
				debug!(target: LOG_TARGET, "[monitor] setup skipped: already installed");
			}
			return;
		}

		let config = Arc::new(config);
		*self
			.shared
			.config
			.write()
			.unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&config));
		self.install_runs.fetch_add(1, Ordering::SeqCst);

		let mut hooked = self.hooked.lock().unwrap_or_else(PoisonError::into_inner);
		for kind in ErrorKind::WATCHABLE {
			if !config.watch().contains(&kind) {
				continue;
			}
			if self.install(kind, &config, &mut hooked) {
				hooked.kinds.insert(kind);
			}
		}

		if config.debug() {
			debug!(
				target: LOG_TARGET,
				app_id = config.app_id(),
				force = config.force(),
				hooked = ?hooked.kinds,
				"[monitor] setup complete"
			);
		}
	}

	/// Hooks the channel for `kind`. Returns whether the channel is hooked
	/// afterwards.
	fn install(&self, kind: ErrorKind, config: &MonitorConfig, hooked: &mut Hooked) -> bool {
		match kind {
			ErrorKind::FrameworkWarning | ErrorKind::FrameworkError => {
				let Some(target) = config
					.framework_config()
					.cloned()
					.or_else(|| self.host.framework_config())
				else {
					if config.debug() {
						debug!(target: LOG_TARGET, %kind, "[monitor] no framework config, skipping");
					}
					return false;
				};
				let targets = if kind == ErrorKind::FrameworkWarning {
					&mut hooked.warn_targets
				} else {
					&mut hooked.error_targets
				};
				if contains_target(targets, &target) {
					return true;
				}

				log_hook(config, kind, "start");
				let shared = Arc::clone(&self.shared);
				if kind == ErrorKind::FrameworkWarning {
					target.warn_handler.chain(handler(move |args: &FrameworkHookArgs| {
						if let Some(reporter) = shared.reporter() {
							adapters::on_framework_warning(&reporter, args);
						}
					}));
				} else {
					target.error_handler.chain(handler(move |args: &FrameworkHookArgs| {
						if let Some(reporter) = shared.reporter() {
							adapters::on_framework_error(&reporter, args);
						}
					}));
				}
				targets.push(Arc::downgrade(&target));
				log_hook(config, kind, "end");
				true
			}
			ErrorKind::RuntimeError => {
				if hooked.runtime_errors {
					return true;
				}
				let Some(slot) = self.host.runtime_errors() else {
					return false;
				};
				log_hook(config, kind, "start");
				let shared = Arc::clone(&self.shared);
				let delivery = if self.host.runtime_errors_are_fatal() {
					Delivery::Blocking
				} else {
					Delivery::Background
				};
				slot.chain(handler(move |args: &RuntimeErrorArgs| {
					if let Some(reporter) = shared.reporter() {
						adapters::on_runtime_error(&reporter.with_delivery(delivery), args);
					}
				}));
				hooked.runtime_errors = true;
				log_hook(config, kind, "end");
				true
			}
			ErrorKind::UnhandledRejection => {
				if hooked.rejections {
					return true;
				}
				let Some(source) = self.host.rejections() else {
					return false;
				};
				log_hook(config, kind, "start");
				let shared = Arc::clone(&self.shared);
				source.add_listener(handler(move |event: &RejectionEvent| {
					if let Some(reporter) = shared.reporter() {
						adapters::on_unhandled_rejection(&reporter, event);
					}
				}));
				hooked.rejections = true;
				log_hook(config, kind, "end");
				true
			}
			ErrorKind::ResourceLoadFailure => {
				if hooked.resource_errors {
					return true;
				}
				let Some(source) = self.host.resource_errors() else {
					return false;
				};
				log_hook(config, kind, "start");
				let shared = Arc::clone(&self.shared);
				source.add_listener(handler(move |event: &ResourceErrorEvent| {
					if let Some(reporter) = shared.reporter() {
						adapters::on_resource_error(&reporter, event);
					}
				}));
				hooked.resource_errors = true;
				log_hook(config, kind, "end");
				true
			}
			ErrorKind::Test => false,
		}
	}

	/// Reports `record` under the configuration of the last setup. Dropped
	/// when the monitor was never set up.
	pub fn report(&self, record: ReportRecord) {
		match self.shared.reporter() {
			Some(reporter) => reporter.report(record),
			None => debug!(kind = %record.kind, "Report ignored: monitor is not set up"),
		}
	}

	/// Reports a partial record given as JSON, e.g.
	/// `{"type": "test", "message": "hello"}`.
	pub fn report_json(&self, record: Value) -> Result<()> {
		let record: ReportRecord = serde_json::from_value(record)?;
		self.report(record);
		Ok(())
	}

	/// Reports `record` under `config`, through this monitor's host and
	/// transport.
	pub fn report_with(&self, config: &MonitorConfig, record: ReportRecord) {
		pipeline::report(config, self.host.as_ref(), self.shared.transport.as_ref(), record);
	}

	/// Whether a non-forced setup has run.
	pub fn is_installed(&self) -> bool {
		self.installed.load(Ordering::SeqCst)
	}

	/// How many times installation has actually run.
	pub fn install_runs(&self) -> usize {
		self.install_runs.load(Ordering::SeqCst)
	}

	/// Kinds with an installed adapter.
	pub fn hooked_kinds(&self) -> BTreeSet<ErrorKind> {
		self
			.hooked
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.kinds
			.clone()
	}
}

fn log_hook(config: &MonitorConfig, kind: ErrorKind, phase: &str) {
	if config.debug() {
		debug!(target: LOG_TARGET, %kind, phase, "[monitor] hook {kind} {phase}");
	}
}
