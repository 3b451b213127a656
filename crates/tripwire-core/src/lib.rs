// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the tripwire error telemetry shim.
//!
//! This crate holds the data model shared by the SDK and by anything that
//! consumes its wire payload:
//!
//! - [`ErrorKind`]: the closed set of report categories
//! - [`ReportRecord`]: the normalized payload every error source produces
//! - Native event shapes ([`RuntimeErrorArgs`], [`RejectionEvent`],
//!   [`ResourceErrorEvent`], [`FrameworkHookArgs`]) as delivered by the
//!   ambient error channels
//! - [`Handler`], [`after`] and [`HandlerChain`]: composition of callbacks
//!   that must coexist with handlers registered by other code

pub mod chain;
pub mod error;
pub mod kind;
pub mod native;
pub mod record;

pub use chain::{after, handler, Handler, HandlerChain};
pub use error::{CoreError, Result};
pub use kind::ErrorKind;
pub use native::{
	ComponentInstance, ErrorObject, EventTarget, FrameworkHookArgs, RejectionEvent,
	ResourceErrorEvent, RuntimeErrorArgs,
};
pub use record::ReportRecord;
