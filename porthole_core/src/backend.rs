// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for platform integrations.
//!
//! Porthole splits platform-specific work into *backend* crates. Each
//! backend provides the following pieces:
//!
//! - **Capability probe** — a free function reporting whether the platform
//!   can show a Picture-in-Picture window at all. Computed once at session
//!   creation; never re-probed.
//!
//! - **Relay element** — the hidden video-capable element that hosts the
//!   live capture stream and negotiates PiP enter/exit with the platform.
//!   Its setup and event lifecycle differ fundamentally across platforms,
//!   so it is not abstracted by a trait.
//!
//! - **Pixel surface** — implements [`PixelSurface`] over the platform's
//!   drawable (e.g. a canvas element).
//!
//! - **Markup decoder** — implements [`MarkupDecoder`]: materializes the
//!   rasterizer's vector markup as a decoded image, releasing any temporary
//!   resource (object URL, file) on success and failure alike.
//!
//! - **Frame sink** — implements [`FrameSink`] over the capture stream so
//!   manually-driven capture modes receive an explicit frame push after
//!   each paint.
//!
//! The external rasterizer is the caller's, not the backend's: consumers
//! implement [`Rasterizer`] over whatever declarative scene type their
//! rasterizer understands, and the core treats both the scene and the
//! produced markup as opaque.
//!
//! # Render cycle pseudocode
//!
//! A backend session wires the pieces together like this:
//!
//! ```rust,ignore
//! let ticket = generations.begin();
//! tracer.render_began(&RenderBegan { generation: ticket.generation() });
//! match prepare_frame(&rasterizer, &decoder, &scene, geometry, &fonts, &cache, &ticket, tracer).await {
//!     Ok(Some(frame)) => {
//!         // Synchronous tail: no await between the staleness check and the paint.
//!         commit_frame(&mut surface, frame, &ticket, &frames, tracer)?;
//!     }
//!     Ok(None) => {}          // superseded mid-flight; result dropped
//!     Err(err) => log(err),   // cycle isolated; surface keeps its last frame
//! }
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::future::Future;

use crate::error::RenderError;
use crate::font::Font;

/// Per-cycle input handed to the external rasterizer.
///
/// Dimensions are always *logical*: high-DPI scaling happens after
/// rasterization, on the markup itself, so scene layout is DPR-independent.
#[derive(Clone, Debug)]
pub struct RasterOptions {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// Resolved fonts, in specification order.
    pub fonts: Vec<Font>,
}

/// The external declarative-scene rasterizer, used as a black box.
///
/// Implementations turn a scene tree into vector markup (typically SVG).
/// Failures are propagated unchanged, carried in
/// [`RenderError::Rasterize`] with the rasterizer's own message.
pub trait Rasterizer {
    /// Scene description this rasterizer understands. Opaque to the core.
    type Scene;

    /// Rasterizes one scene at logical dimensions.
    fn rasterize(
        &self,
        scene: &Self::Scene,
        options: &RasterOptions,
    ) -> impl Future<Output = Result<String, RenderError>>;
}

/// Materializes vector markup as a decoded image.
///
/// Implementations must fully decode before returning and must release any
/// temporary resource they allocate on both success and failure paths.
pub trait MarkupDecoder {
    /// Decoded image handle, ready to draw.
    type Image;

    /// Decodes one markup string.
    fn decode(&self, markup: &str) -> impl Future<Output = Result<Self::Image, RenderError>>;
}

/// A mutable 2-D pixel buffer the session paints into.
///
/// Owned exclusively by one session; its backing store is resized when the
/// session's geometry inputs change and destroyed at session teardown.
pub trait PixelSurface {
    /// Image type this surface can draw — matches the decoder's.
    type Image;

    /// Current backing-store dimensions in physical pixels.
    fn pixel_size(&self) -> (u32, u32);

    /// Resets the backing store to the given physical dimensions.
    ///
    /// Resizing clears the surface, so callers skip it when the dimensions
    /// already match.
    fn resize(&mut self, width: u32, height: u32);

    /// Blits a decoded image at surface-native dimensions.
    ///
    /// Fails fast when the surface cannot provide a drawing context.
    fn draw(&mut self, image: &Self::Image) -> Result<(), RenderError>;
}

/// Explicit frame push for manually-driven capture.
///
/// Live-captured streams carry whatever is currently on the surface and
/// implement this as a no-op; single-shot capture modes forward it to the
/// platform's request-frame call.
pub trait FrameSink {
    /// Pushes the surface's current content as a new frame.
    fn request_frame(&self);
}
