// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for Porthole session
//! diagnostics.
//!
//! This crate provides [`TraceSink`](porthole_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`recorder::RecorderSink`] — records events as owned values for
//!   programmatic inspection.
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`json::export`] — writes recorded events as a JSON array.

pub mod json;
pub mod pretty;
pub mod recorder;
