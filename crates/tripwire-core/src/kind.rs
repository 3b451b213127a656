// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Report categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Category of a report record. Every record carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
	/// Framework warning callback (`warnHandler`).
	FrameworkWarning,
	/// Framework error callback (`errorHandler`).
	FrameworkError,
	/// A rejected promise / failed task nobody observed.
	UnhandledRejection,
	/// Uncaught runtime exception (page `onerror`, process panic).
	RuntimeError,
	/// `img`, `script` or `link` element failed to load.
	ResourceLoadFailure,
	/// Diagnostic kind used by tests; no channel produces it.
	Test,
}

impl ErrorKind {
	/// The kinds backed by an ambient channel, in installation order.
	pub const WATCHABLE: [ErrorKind; 5] = [
		ErrorKind::FrameworkWarning,
		ErrorKind::FrameworkError,
		ErrorKind::RuntimeError,
		ErrorKind::ResourceLoadFailure,
		ErrorKind::UnhandledRejection,
	];

	/// Wire name of the kind.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::FrameworkWarning => "framework-warning",
			Self::FrameworkError => "framework-error",
			Self::UnhandledRejection => "unhandled-rejection",
			Self::RuntimeError => "runtime-error",
			Self::ResourceLoadFailure => "resource-load-failure",
			Self::Test => "test",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ErrorKind {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"framework-warning" => Ok(Self::FrameworkWarning),
			"framework-error" => Ok(Self::FrameworkError),
			"unhandled-rejection" => Ok(Self::UnhandledRejection),
			"runtime-error" => Ok(Self::RuntimeError),
			"resource-load-failure" => Ok(Self::ResourceLoadFailure),
			"test" => Ok(Self::Test),
			other => Err(CoreError::InvalidErrorKind(other.to_string())),
		}
	}
}
