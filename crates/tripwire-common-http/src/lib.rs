// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for tripwire.
//!
//! Both the async and the blocking client carry the same User-Agent so the
//! receiving endpoint can tell SDK traffic apart.

mod client;

pub use client::{blocking_builder, builder, platform, user_agent, SDK_NAME};
