// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for Porthole.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`PipSession`]: the session controller wiring a scene to a platform
//!   Picture-in-Picture window
//! - [`CanvasSurface`] / [`SvgDecoder`]: canvas-backed pixel surface and
//!   Blob-URL image decoding
//! - [`CaptureStream`]: `canvas.captureStream()` wrapper with audio-track
//!   swapping
//! - [`RelayVideo`]: the hidden `<video>` element handed to the platform
//! - [`JsRasterizer`] / [`JsFontResolver`]: adapters over plain JS functions
//!
//! # Crate features
//!
//! - `trace` (disabled by default): forwards `porthole_core/trace` so
//!   sessions emit [`TraceSink`](porthole_core::trace::TraceSink) events.

#![no_std]

extern crate alloc;

mod adapters;
mod capture;
mod relay;
mod session;
mod surface;

pub use adapters::{JsFontResolver, JsRasterizer};
pub use capture::{CaptureMode, CaptureStream};
pub use porthole_core::backend::{FrameSink, MarkupDecoder, PixelSurface, Rasterizer};
pub use relay::RelayVideo;
pub use session::{PipSession, SessionOptions};
pub use surface::{CanvasSurface, SvgDecoder};

use alloc::format;
use alloc::string::String;

use wasm_bindgen::JsValue;

use porthole_core::error::SessionError;

/// Returns whether this browser can open a Picture-in-Picture window.
///
/// Consumers should check this up front and disable the affordance when it
/// is `false`; [`PipSession::enter`] fails with
/// [`SessionError::Unsupported`] on such platforms.
#[must_use]
pub fn pip_supported() -> bool {
    web_sys::window()
        .and_then(|window| window.document())
        .is_some_and(|document| document.picture_in_picture_enabled())
}

/// Extracts a human-readable message from a thrown JS value.
///
/// DOM exceptions are not JS strings, so `as_string` alone loses them; the
/// `Debug` rendering keeps the exception name and message.
pub(crate) fn js_error_message(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// The current document, or [`SessionError::NotInitialized`] outside a
/// browsing context (workers, tests).
pub(crate) fn document() -> Result<web_sys::Document, SessionError> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or(SessionError::NotInitialized)
}
