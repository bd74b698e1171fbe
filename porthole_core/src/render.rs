// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render pipeline: scene in, painted surface out.
//!
//! A render cycle is split in two halves so that callers never hold interior
//! mutability borrows across an await point:
//!
//! - [`prepare_frame`] does the asynchronous work (font resolution,
//!   rasterization, markup rescale, decode) against shared references only.
//! - [`commit_frame`] does the synchronous work (resize, draw, frame push)
//!   against the mutable surface.
//!
//! Both halves check the cycle's [`RenderTicket`] and drop stale work on the
//! floor: a cycle whose generation has been superseded produces no output
//! and no error. See [`crate::session::Generations`].

use core::cell::RefCell;

use kurbo::Size;

use crate::backend::{FrameSink, MarkupDecoder, PixelSurface, RasterOptions, Rasterizer};
use crate::error::RenderError;
use crate::font::{FontCache, FontResolver, FontSpec, resolve_fonts};
use crate::markup::rescale_markup;
use crate::session::RenderTicket;
use crate::trace::{FontsResolved, RenderCommitted, RenderSuperseded, Tracer};

/// Logical surface dimensions plus the device pixel ratio.
///
/// Scene layout always happens at the logical size; the scale only widens
/// the backing store and the markup's root dimensions, so a scene renders
/// identically (but sharper) on high-DPI displays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceGeometry {
    /// Logical size.
    pub size: Size,
    /// Device pixel ratio. Values at or below zero are treated as 1.
    pub scale: f64,
}

impl SurfaceGeometry {
    /// Creates a geometry at unit scale.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            scale: 1.0,
        }
    }

    /// Returns this geometry with a different device pixel ratio.
    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Returns this geometry with a different logical size.
    #[must_use]
    pub const fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    /// Backing-store dimensions in physical pixels, never zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "scaled dimensions are clamped non-negative and rounded"
    )]
    pub fn physical(&self) -> (u32, u32) {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        let width = (self.size.width.max(0.0) * scale + 0.5) as u32;
        let height = (self.size.height.max(0.0) * scale + 0.5) as u32;
        (width.max(1), height.max(1))
    }
}

impl Default for SurfaceGeometry {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

/// Output of [`prepare_frame`], ready to hand to [`commit_frame`].
#[derive(Debug)]
pub struct PreparedFrame<I> {
    /// Decoded image at physical dimensions.
    pub image: I,
    /// Physical dimensions the surface must have to receive the image.
    pub physical: (u32, u32),
    /// Generation of the cycle that produced this frame.
    pub generation: u64,
}

/// What [`commit_frame`] did with a prepared frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The frame was drawn and pushed to the stream.
    Painted,
    /// A newer cycle began first; the frame was discarded.
    Superseded,
}

/// Runs the asynchronous half of a render cycle.
///
/// Resolves fonts, rasterizes the scene at logical dimensions, rescales the
/// markup's root dimensions by the device pixel ratio, and decodes the
/// result. Returns `Ok(None)` without error when the ticket goes stale at
/// any of the three await boundaries.
///
/// Failures leave the surface untouched; the caller keeps showing the last
/// good frame.
pub async fn prepare_frame<R, D, F>(
    rasterizer: &R,
    decoder: &D,
    scene: &R::Scene,
    geometry: SurfaceGeometry,
    fonts: &FontSpec<F>,
    cache: &RefCell<FontCache>,
    ticket: &RenderTicket,
    tracer: &mut Tracer<'_>,
) -> Result<Option<PreparedFrame<D::Image>>, RenderError>
where
    R: Rasterizer,
    D: MarkupDecoder,
    F: FontResolver,
{
    let resolved = resolve_fonts(fonts, cache).await?;
    tracer.fonts_resolved(&FontsResolved {
        count: u32::try_from(resolved.fonts.len()).unwrap_or(u32::MAX),
        cache_hits: resolved.cache_hits,
    });
    if !ticket.is_current() {
        tracer.render_superseded(&RenderSuperseded {
            generation: ticket.generation(),
        });
        return Ok(None);
    }

    let options = RasterOptions {
        width: geometry.size.width,
        height: geometry.size.height,
        fonts: resolved.fonts,
    };
    let markup = rasterizer.rasterize(scene, &options).await?;
    if !ticket.is_current() {
        tracer.render_superseded(&RenderSuperseded {
            generation: ticket.generation(),
        });
        return Ok(None);
    }

    let scaled = rescale_markup(&markup, geometry.scale);
    let image = decoder.decode(&scaled).await?;
    if !ticket.is_current() {
        tracer.render_superseded(&RenderSuperseded {
            generation: ticket.generation(),
        });
        return Ok(None);
    }

    Ok(Some(PreparedFrame {
        image,
        physical: geometry.physical(),
        generation: ticket.generation(),
    }))
}

/// Runs the synchronous half of a render cycle.
///
/// Re-checks staleness (the caller may have yielded between the halves),
/// resizes the surface only when its dimensions differ (resizing clears it),
/// draws the image, and pushes a frame into the stream.
pub fn commit_frame<S: PixelSurface>(
    surface: &mut S,
    frame: PreparedFrame<S::Image>,
    ticket: &RenderTicket,
    frames: &impl FrameSink,
    tracer: &mut Tracer<'_>,
) -> Result<RenderOutcome, RenderError> {
    if !ticket.is_current() {
        tracer.render_superseded(&RenderSuperseded {
            generation: frame.generation,
        });
        return Ok(RenderOutcome::Superseded);
    }

    let (width, height) = frame.physical;
    if surface.pixel_size() != frame.physical {
        surface.resize(width, height);
    }
    surface.draw(&frame.image)?;
    frames.request_frame();
    tracer.render_committed(&RenderCommitted {
        generation: frame.generation,
        width,
        height,
    });
    Ok(RenderOutcome::Painted)
}

