// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and state machine for streaming a declarative scene into a
//! platform Picture-in-Picture window.
//!
//! `porthole_core` owns everything about a PiP session that does not touch a
//! browser API: the session lifecycle state machine, tracked-input change
//! detection, the render-cycle pipeline with stale-result cancellation, font
//! resolution and caching, and the relay-element ratio calculator. It is
//! `no_std` compatible (with `alloc`); platform glue lives in backend crates.
//!
//! # Architecture
//!
//! A session turns input changes into repaints of a captured pixel surface:
//!
//! ```text
//!   setters ──► InputTracker ──► commit dispatch
//!                                     │
//!                  ┌──────────────────┘
//!                  ▼
//!   resolve_fonts() ──► Rasterizer::rasterize() ──► rescale_markup()
//!                                                        │
//!                  ┌─────────────────────────────────────┘
//!                  ▼
//!   MarkupDecoder::decode() ──► commit_frame() ──► FrameSink::request_frame()
//! ```
//!
//! Every awaited step is gated by a [`RenderTicket`]: a cycle that has been
//! superseded by a newer one drops its result on arrival instead of painting
//! stale content.
//!
//! **[`session`]** — Lifecycle state machine, generation counter, and
//! dirty-channel input tracking.
//!
//! **[`render`]** — The prepare/commit render pipeline.
//!
//! **[`font`]** — Font model, resolver contract, and the injectable
//! resolution cache.
//!
//! **[`markup`]** — High-DPI rescaling of rasterizer markup.
//!
//! **[`ratio`]** — Minimal integer sizing for the hidden relay element.
//!
//! **[`backend`]** — The traits platform backends implement.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! session instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).
//!
//! [`RenderTicket`]: session::RenderTicket

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod dirty;
pub mod error;
pub mod font;
pub mod markup;
pub mod ratio;
pub mod render;
pub mod session;
pub mod trace;
