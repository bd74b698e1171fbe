// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for the render pipeline and session controller.
//!
//! Every fake here implements one of the backend seams from
//! [`porthole_core::backend`] against plain strings: scenes are strings, the
//! rasterizer hands back a fixed markup string, and the decoder's "image" is
//! the markup itself. That keeps pipeline tests readable — what was painted
//! is literally the markup that reached the surface.
//!
//! [`Gate`] is a manually opened future for interleaving tests: park an
//! async stage on a gate, advance the rest of the world, then open it.

#![no_std]

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::{String, ToString as _};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use porthole_core::backend::{FrameSink, MarkupDecoder, PixelSurface, RasterOptions, Rasterizer};
use porthole_core::error::{FontResolutionError, RenderError};
use porthole_core::font::{Font, FontRequest, FontResolver, FontStyle};

/// Builds a [`Font`] with placeholder data, weight 400, normal style.
#[must_use]
pub fn test_font(name: &str) -> Font {
    Font {
        name: name.to_string(),
        data: Rc::from(&[0_u8; 4][..]),
        weight: 400,
        style: FontStyle::Normal,
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GateInner {
    open: Cell<bool>,
    wakers: RefCell<Vec<Waker>>,
}

/// A future that stays pending until [`Gate::open`] is called.
///
/// Cloning yields handles to the same gate, so one clone can be captured by
/// a fake while the test keeps the other to open it later.
#[derive(Clone, Default)]
pub struct Gate {
    inner: Rc<GateInner>,
}

impl core::fmt::Debug for Gate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gate")
            .field("open", &self.inner.open.get())
            .finish_non_exhaustive()
    }
}

impl Gate {
    /// Creates a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate, waking every parked waiter.
    pub fn open(&self) {
        self.inner.open.set(true);
        for waker in self.inner.wakers.borrow_mut().drain(..) {
            waker.wake();
        }
    }

    /// Resolves once the gate is open. Already-open gates resolve
    /// immediately.
    #[must_use]
    pub fn wait(&self) -> GateWait {
        GateWait {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Future returned by [`Gate::wait`].
#[derive(Debug)]
pub struct GateWait {
    inner: Rc<GateInner>,
}

impl core::fmt::Debug for GateInner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GateInner")
            .field("open", &self.open.get())
            .finish_non_exhaustive()
    }
}

impl Future for GateWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.inner.open.get() {
            Poll::Ready(())
        } else {
            self.inner.wakers.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}

// ---------------------------------------------------------------------------
// Rasterizer
// ---------------------------------------------------------------------------

/// One recorded [`FakeRasterizer`] invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterCall {
    /// Logical width passed to the rasterizer.
    pub width: f64,
    /// Logical height passed to the rasterizer.
    pub height: f64,
    /// Names of the fonts passed, in order.
    pub fonts: Vec<String>,
}

/// A [`Rasterizer`] over string scenes that returns a fixed markup string.
#[derive(Debug)]
pub struct FakeRasterizer {
    result: Result<String, String>,
    gate: Option<Gate>,
    calls: RefCell<Vec<RasterCall>>,
}

impl FakeRasterizer {
    /// Rasterizer that always succeeds with the given markup.
    #[must_use]
    pub fn new(markup: &str) -> Self {
        Self {
            result: Ok(markup.to_string()),
            gate: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Rasterizer that always fails with the given message.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            gate: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Rasterizer that parks on the gate before returning the markup.
    #[must_use]
    pub fn gated(markup: &str, gate: Gate) -> Self {
        Self {
            result: Ok(markup.to_string()),
            gate: Some(gate),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Invocations so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RasterCall> {
        self.calls.borrow().clone()
    }
}

impl Rasterizer for FakeRasterizer {
    type Scene = String;

    fn rasterize(
        &self,
        _scene: &Self::Scene,
        options: &RasterOptions,
    ) -> impl Future<Output = Result<String, RenderError>> {
        self.calls.borrow_mut().push(RasterCall {
            width: options.width,
            height: options.height,
            fonts: options.fonts.iter().map(|f| f.name.clone()).collect(),
        });
        let result = self
            .result
            .clone()
            .map_err(RenderError::Rasterize);
        let gate = self.gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.wait().await;
            }
            result
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A [`MarkupDecoder`] whose "image" is the markup string itself.
///
/// Models the temporary-resource contract: each decode allocates one
/// resource and must release it on success and failure alike, which
/// [`Self::outstanding_resources`] lets tests assert.
#[derive(Debug, Default)]
pub struct FakeDecoder {
    failure: Option<String>,
    outstanding: Cell<u32>,
}

impl FakeDecoder {
    /// Decoder that echoes the markup back as the image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that always fails with the given message.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            outstanding: Cell::new(0),
        }
    }

    /// Temporary resources allocated but not yet released. Zero whenever no
    /// decode is in flight, if the decoder honors its contract.
    #[must_use]
    pub fn outstanding_resources(&self) -> u32 {
        self.outstanding.get()
    }
}

impl MarkupDecoder for FakeDecoder {
    type Image = String;

    fn decode(&self, markup: &str) -> impl Future<Output = Result<String, RenderError>> {
        let markup = markup.to_string();
        self.outstanding.set(self.outstanding.get() + 1);
        async move {
            let result = match &self.failure {
                Some(message) => Err(RenderError::Decode(message.clone())),
                None => Ok(markup),
            };
            self.outstanding.set(self.outstanding.get() - 1);
            result
        }
    }
}

// ---------------------------------------------------------------------------
// Surface and frame sink
// ---------------------------------------------------------------------------

/// A [`PixelSurface`] that records resizes and painted images.
#[derive(Debug)]
pub struct FakeSurface {
    width: u32,
    height: u32,
    draw_failure: Option<String>,
    resizes: Vec<(u32, u32)>,
    painted: Vec<String>,
}

impl FakeSurface {
    /// Surface with the given starting backing-store dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            draw_failure: None,
            resizes: Vec::new(),
            painted: Vec::new(),
        }
    }

    /// Makes every subsequent draw fail with the given message.
    #[must_use]
    pub fn with_draw_failure(mut self, message: &str) -> Self {
        self.draw_failure = Some(message.to_string());
        self
    }

    /// Every resize performed, oldest first.
    #[must_use]
    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.resizes.clone()
    }

    /// Every image drawn, oldest first.
    #[must_use]
    pub fn painted(&self) -> Vec<String> {
        self.painted.clone()
    }
}

impl PixelSurface for FakeSurface {
    type Image = String;

    fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.resizes.push((width, height));
    }

    fn draw(&mut self, image: &Self::Image) -> Result<(), RenderError> {
        if let Some(message) = &self.draw_failure {
            return Err(RenderError::Draw(message.clone()));
        }
        self.painted.push(image.clone());
        Ok(())
    }
}

/// A [`FrameSink`] that counts frame requests.
#[derive(Debug, Default)]
pub struct CountingFrameSink {
    requests: Cell<u32>,
}

impl CountingFrameSink {
    /// Sink with zero requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame requests so far.
    #[must_use]
    pub fn requests(&self) -> u32 {
        self.requests.get()
    }
}

impl FrameSink for CountingFrameSink {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// A [`FontResolver`] that fabricates a [`Font`] per request.
#[derive(Debug, Default)]
pub struct FakeResolver {
    failure: Option<String>,
    calls: Cell<u32>,
}

impl FakeResolver {
    /// Resolver that succeeds for every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that always fails with the given message.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            calls: Cell::new(0),
        }
    }

    /// Resolve invocations so far. Cache hits never reach the resolver.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl FontResolver for FakeResolver {
    fn resolve(
        &self,
        request: &FontRequest,
    ) -> impl Future<Output = Result<Font, FontResolutionError>> {
        self.calls.set(self.calls.get() + 1);
        let result = match &self.failure {
            Some(message) => Err(FontResolutionError {
                name: request.name.clone(),
                message: message.clone(),
            }),
            None => Ok(Font {
                name: request.name.clone(),
                data: Rc::from(&[0_u8; 4][..]),
                weight: request.weight,
                style: FontStyle::Normal,
            }),
        };
        core::future::ready(result)
    }
}
