// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monitor configuration.
//!
//! A [`MonitorConfig`] is assembled with [`MonitorConfigBuilder`]. Every
//! field has a default, and the builder validates the result once in
//! [`MonitorConfigBuilder::build`]. The serializable subset can also be
//! loaded from TOML or from `TRIPWIRE_*` environment variables; callbacks can
//! only be set in code.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tripwire_core::{
	handler, ErrorKind, FrameworkHookArgs, Handler, RejectionEvent, ReportRecord,
	ResourceErrorEvent, RuntimeErrorArgs,
};

use crate::error::{MonitorError, Result};
use crate::host::FrameworkConfig;

/// App id attached to reports when none is configured.
pub const DEFAULT_APP_ID: &str = "default";

/// Returns true when the record should be dropped.
pub type FilterHook = Arc<dyn Fn(&ReportRecord) -> bool + Send + Sync>;
/// Replaces the enriched record with an arbitrary payload.
pub type TransformHook = Arc<dyn Fn(ReportRecord) -> Value + Send + Sync>;
/// Observes every record before filtering.
pub type ReportHook = Arc<dyn Fn(&MonitorConfig, &ReportRecord) + Send + Sync>;
/// Receives the final payload.
pub type DeliveryCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Where final payloads go.
#[derive(Clone)]
pub enum DeliveryTarget {
	/// POSTed as JSON to this address.
	Endpoint(String),
	/// Handed to the callback synchronously.
	Callback(DeliveryCallback),
}

impl fmt::Debug for DeliveryTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Endpoint(url) => f.debug_tuple("Endpoint").field(url).finish(),
			Self::Callback(_) => f.write_str("Callback(..)"),
		}
	}
}

/// Per-kind callbacks, invoked with the native arguments before a channel
/// event is normalized. They run even when the event is not reportable.
#[derive(Clone, Default)]
pub struct Overrides {
	pub framework_warning: Option<Handler<FrameworkHookArgs>>,
	pub framework_error: Option<Handler<FrameworkHookArgs>>,
	pub unhandled_rejection: Option<Handler<RejectionEvent>>,
	pub runtime_error: Option<Handler<RuntimeErrorArgs>>,
	pub resource_load_failure: Option<Handler<ResourceErrorEvent>>,
}

/// Validated monitor configuration.
#[derive(Clone)]
pub struct MonitorConfig {
	force: bool,
	debug: bool,
	watch: BTreeSet<ErrorKind>,
	app_id: String,
	delivery: DeliveryTarget,
	filter: Option<FilterHook>,
	transform: Option<TransformHook>,
	report_hook: Option<ReportHook>,
	overrides: Overrides,
	framework_config: Option<Arc<FrameworkConfig>>,
}

impl MonitorConfig {
	/// Creates a new builder.
	pub fn builder() -> MonitorConfigBuilder {
		MonitorConfigBuilder::new()
	}

	/// Whether every `setup` call re-runs installation.
	pub fn force(&self) -> bool {
		self.force
	}

	/// Whether diagnostic lifecycle logging is enabled.
	pub fn debug(&self) -> bool {
		self.debug
	}

	/// The kinds whose channels get hooked.
	pub fn watch(&self) -> &BTreeSet<ErrorKind> {
		&self.watch
	}

	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	pub fn delivery(&self) -> &DeliveryTarget {
		&self.delivery
	}

	pub fn filter(&self) -> Option<&FilterHook> {
		self.filter.as_ref()
	}

	pub fn transform(&self) -> Option<&TransformHook> {
		self.transform.as_ref()
	}

	pub fn report_hook(&self) -> Option<&ReportHook> {
		self.report_hook.as_ref()
	}

	pub fn overrides(&self) -> &Overrides {
		&self.overrides
	}

	/// Framework config supplied directly by the caller; preferred over the
	/// host's ambient one.
	pub fn framework_config(&self) -> Option<&Arc<FrameworkConfig>> {
		self.framework_config.as_ref()
	}
}

impl fmt::Debug for MonitorConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MonitorConfig")
			.field("force", &self.force)
			.field("debug", &self.debug)
			.field("watch", &self.watch)
			.field("app_id", &self.app_id)
			.field("delivery", &self.delivery)
			.field("filter", &self.filter.is_some())
			.field("transform", &self.transform.is_some())
			.field("report_hook", &self.report_hook.is_some())
			.field("framework_config", &self.framework_config.is_some())
			.finish()
	}
}

/// The subset of configuration that can live in a file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
	force: bool,
	debug: bool,
	watch: Option<Vec<ErrorKind>>,
	app_id: Option<String>,
	endpoint: Option<String>,
}

/// Builder for [`MonitorConfig`].
#[derive(Default)]
pub struct MonitorConfigBuilder {
	force: bool,
	debug: bool,
	watch: Option<BTreeSet<ErrorKind>>,
	app_id: Option<String>,
	delivery: Option<DeliveryTarget>,
	filter: Option<FilterHook>,
	transform: Option<TransformHook>,
	report_hook: Option<ReportHook>,
	overrides: Overrides,
	framework_config: Option<Arc<FrameworkConfig>>,
}

impl MonitorConfigBuilder {
	/// Creates a builder with every field at its default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds a builder from a TOML document.
	///
	/// ```toml
	/// app_id = "storefront"
	/// endpoint = "https://telemetry.example.com/report"
	/// debug = true
	/// watch = ["runtime-error", "unhandled-rejection"]
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let file: FileConfig = toml::from_str(source)?;
		let mut builder = Self::new().force(file.force).debug(file.debug);
		if let Some(watch) = file.watch {
			builder = builder.watch(watch);
		}
		if let Some(app_id) = file.app_id {
			builder = builder.app_id(app_id);
		}
		if let Some(endpoint) = file.endpoint {
			builder = builder.endpoint(endpoint);
		}
		Ok(builder)
	}

	/// Overlays `TRIPWIRE_APP_ID`, `TRIPWIRE_ENDPOINT`, `TRIPWIRE_DEBUG`,
	/// `TRIPWIRE_FORCE` and `TRIPWIRE_WATCH` from the process environment.
	pub fn with_env(self) -> Result<Self> {
		self.with_env_source(|name| std::env::var(name).ok())
	}

	/// Like [`with_env`](Self::with_env), reading variables through `lookup`.
	pub fn with_env_source<F>(mut self, lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(app_id) = lookup("TRIPWIRE_APP_ID") {
			self = self.app_id(app_id);
		}
		if let Some(endpoint) = lookup("TRIPWIRE_ENDPOINT") {
			self = self.endpoint(endpoint);
		}
		if let Some(value) = lookup("TRIPWIRE_DEBUG") {
			self.debug = parse_flag("TRIPWIRE_DEBUG", &value)?;
		}
		if let Some(value) = lookup("TRIPWIRE_FORCE") {
			self.force = parse_flag("TRIPWIRE_FORCE", &value)?;
		}
		if let Some(value) = lookup("TRIPWIRE_WATCH") {
			let kinds = value
				.split(',')
				.filter(|name| !name.trim().is_empty())
				.map(|name| name.parse::<ErrorKind>())
				.collect::<std::result::Result<Vec<ErrorKind>, _>>()?;
			self = self.watch(kinds);
		}
		Ok(self)
	}

	/// Re-run installation on every `setup` call.
	pub fn force(mut self, force: bool) -> Self {
		self.force = force;
		self
	}

	/// Emit `[monitor]` diagnostic lines.
	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	/// Restricts which channels get hooked. Defaults to all of them.
	pub fn watch(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
		self.watch = Some(kinds.into_iter().collect());
		self
	}

	/// Tag attached to every report.
	pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
		self.app_id = Some(app_id.into());
		self
	}

	/// POST final payloads to this absolute URL.
	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.delivery = Some(DeliveryTarget::Endpoint(url.into()));
		self
	}

	/// Hand final payloads to a callback instead of the network.
	pub fn deliver_to<F>(mut self, callback: F) -> Self
	where
		F: Fn(&Value) + Send + Sync + 'static,
	{
		self.delivery = Some(DeliveryTarget::Callback(Arc::new(callback)));
		self
	}

	/// Drop records for which `filter` returns true.
	pub fn filter<F>(mut self, filter: F) -> Self
	where
		F: Fn(&ReportRecord) -> bool + Send + Sync + 'static,
	{
		self.filter = Some(Arc::new(filter));
		self
	}

	/// Replace enriched records with `transform`'s output before delivery.
	pub fn transform<F>(mut self, transform: F) -> Self
	where
		F: Fn(ReportRecord) -> Value + Send + Sync + 'static,
	{
		self.transform = Some(Arc::new(transform));
		self
	}

	/// Observe every record as it enters the pipeline.
	pub fn on_report<F>(mut self, hook: F) -> Self
	where
		F: Fn(&MonitorConfig, &ReportRecord) + Send + Sync + 'static,
	{
		self.report_hook = Some(Arc::new(hook));
		self
	}

	pub fn on_framework_warning<F>(mut self, f: F) -> Self
	where
		F: Fn(&FrameworkHookArgs) + Send + Sync + 'static,
	{
		self.overrides.framework_warning = Some(handler(f));
		self
	}

	pub fn on_framework_error<F>(mut self, f: F) -> Self
	where
		F: Fn(&FrameworkHookArgs) + Send + Sync + 'static,
	{
		self.overrides.framework_error = Some(handler(f));
		self
	}

	pub fn on_unhandled_rejection<F>(mut self, f: F) -> Self
	where
		F: Fn(&RejectionEvent) + Send + Sync + 'static,
	{
		self.overrides.unhandled_rejection = Some(handler(f));
		self
	}

	pub fn on_runtime_error<F>(mut self, f: F) -> Self
	where
		F: Fn(&RuntimeErrorArgs) + Send + Sync + 'static,
	{
		self.overrides.runtime_error = Some(handler(f));
		self
	}

	pub fn on_resource_error<F>(mut self, f: F) -> Self
	where
		F: Fn(&ResourceErrorEvent) + Send + Sync + 'static,
	{
		self.overrides.resource_load_failure = Some(handler(f));
		self
	}

	/// Chain framework hooks into this config object.
	pub fn framework_config(mut self, config: Arc<FrameworkConfig>) -> Self {
		self.framework_config = Some(config);
		self
	}

	/// Validates and builds the configuration.
	pub fn build(self) -> Result<MonitorConfig> {
		let delivery = self.delivery.ok_or(MonitorError::MissingDeliveryTarget)?;
		if let DeliveryTarget::Endpoint(url) = &delivery {
			reqwest::Url::parse(url).map_err(|e| MonitorError::InvalidEndpoint(format!("{url}: {e}")))?;
		}

		Ok(MonitorConfig {
			force: self.force,
			debug: self.debug,
			watch: self
				.watch
				.unwrap_or_else(|| ErrorKind::WATCHABLE.into_iter().collect()),
			app_id: self.app_id.unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
			delivery,
			filter: self.filter,
			transform: self.transform,
			report_hook: self.report_hook,
			overrides: self.overrides,
			framework_config: self.framework_config,
		})
	}
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(MonitorError::InvalidEnv {
			name: name.to_string(),
			value: value.to_string(),
		}),
	}
}
