// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Picture-in-Picture session controller.
//!
//! [`PipSession`] owns the whole chain: canvas surface, capture stream,
//! hidden relay video, and the platform PiP hand-off, driven by the state
//! machine and render pipeline from [`porthole_core`].
//!
//! Setters only record changes; nothing touches the DOM or renders until
//! [`commit`] is called. The first commit mounts the off-screen elements and
//! derives the capture stream (exactly once); each subsequent commit drains
//! the tracked inputs and dispatches at most one render cycle.
//!
//! The session never flips itself to active: [`enter`] asks the platform and
//! the `enterpictureinpicture` event confirms, so [`is_active`] always
//! reflects what the platform reported last.
//!
//! [`commit`]: PipSession::commit
//! [`enter`]: PipSession::enter
//! [`is_active`]: PipSession::is_active

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::future::Future;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::MediaStream;

use porthole_core::backend::{PixelSurface as _, Rasterizer};
use porthole_core::error::{RenderError, SessionError};
use porthole_core::font::{FontCache, FontResolver, FontSpec};
use porthole_core::render::{SurfaceGeometry, commit_frame, prepare_frame};
use porthole_core::session::{CallbackSlot, Generations, InputTracker, SessionPhase, SessionState};
use porthole_core::trace::{
    AudioSwapped, FontsResolved, RenderBegan, RenderCommitted, RenderFailed, RenderSuperseded,
    SessionCreated, TraceSink, Tracer,
};

use crate::capture::{CaptureMode, CaptureStream};
use crate::js_error_message;
use crate::relay::RelayVideo;
use crate::surface::{CanvasSurface, SvgDecoder};

/// Initial session configuration.
///
/// Width and height are logical; `scale` is the device pixel ratio applied
/// to the backing store and the rasterized markup, never to scene layout.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
    /// Logical surface width.
    pub width: f64,
    /// Logical surface height.
    pub height: f64,
    /// Device pixel ratio.
    pub scale: f64,
    /// Show the canvas pinned to the viewport corner.
    pub debug_visible: bool,
    /// How frames get from the canvas into the capture stream.
    pub capture_mode: CaptureMode,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            scale: 1.0,
            debug_visible: false,
            capture_mode: CaptureMode::Live,
        }
    }
}

type SharedTraceSink = Rc<RefCell<Box<dyn TraceSink>>>;

/// Per-call forwarding into the shared sink; never holds the borrow across
/// an await, so concurrent render cycles can trace freely.
struct ForwardingSink {
    sink: SharedTraceSink,
}

impl TraceSink for ForwardingSink {
    fn on_session_created(&mut self, e: &SessionCreated) {
        self.sink.borrow_mut().on_session_created(e);
    }

    fn on_render_began(&mut self, e: &RenderBegan) {
        self.sink.borrow_mut().on_render_began(e);
    }

    fn on_fonts_resolved(&mut self, e: &FontsResolved) {
        self.sink.borrow_mut().on_fonts_resolved(e);
    }

    fn on_render_committed(&mut self, e: &RenderCommitted) {
        self.sink.borrow_mut().on_render_committed(e);
    }

    fn on_render_superseded(&mut self, e: &RenderSuperseded) {
        self.sink.borrow_mut().on_render_superseded(e);
    }

    fn on_render_failed(&mut self, e: &RenderFailed) {
        self.sink.borrow_mut().on_render_failed(e);
    }

    fn on_pip_entered(&mut self) {
        self.sink.borrow_mut().on_pip_entered();
    }

    fn on_pip_left(&mut self) {
        self.sink.borrow_mut().on_pip_left();
    }

    fn on_audio_swapped(&mut self, e: &AudioSwapped) {
        self.sink.borrow_mut().on_audio_swapped(e);
    }

    fn on_session_closed(&mut self) {
        self.sink.borrow_mut().on_session_closed();
    }
}

fn make_tracer(sink: &mut Option<ForwardingSink>) -> Tracer<'_> {
    match sink {
        Some(sink) => Tracer::new(sink),
        None => Tracer::none(),
    }
}

struct Inner<R: Rasterizer, F: FontResolver> {
    rasterizer: R,
    state: RefCell<SessionState>,
    generations: Generations,
    inputs: RefCell<InputTracker>,
    scene: RefCell<Option<R::Scene>>,
    fonts: RefCell<FontSpec<F>>,
    cache: Rc<RefCell<FontCache>>,
    geometry: Cell<SurfaceGeometry>,
    debug_visible: Cell<bool>,
    capture_mode: CaptureMode,
    relay: RefCell<Option<RelayVideo>>,
    surface: RefCell<Option<CanvasSurface>>,
    capture: RefCell<Option<CaptureStream>>,
    audio_source: RefCell<Option<MediaStream>>,
    on_enter: CallbackSlot,
    on_leave: CallbackSlot,
    listeners: RefCell<Vec<(&'static str, Closure<dyn FnMut(web_sys::Event)>)>>,
    trace_sink: RefCell<Option<SharedTraceSink>>,
}

impl<R: Rasterizer, F: FontResolver> Inner<R, F> {
    fn forwarding_sink(&self) -> Option<ForwardingSink> {
        self.trace_sink.borrow().as_ref().map(|sink| ForwardingSink {
            sink: Rc::clone(sink),
        })
    }
}

fn report_render_failure<R: Rasterizer, F: FontResolver>(
    inner: &Inner<R, F>,
    generation: u64,
    error: &RenderError,
) {
    let mut sink = inner.forwarding_sink();
    make_tracer(&mut sink).render_failed(&RenderFailed {
        generation,
        stage: error.stage(),
    });
    web_sys::console::warn_1(&JsValue::from_str(&format!(
        "render cycle {generation} failed: {error}"
    )));
}

/// Asks the platform to close the PiP window. The session's state flips on
/// the `leavepictureinpicture` event, not here.
async fn request_platform_exit() -> Result<(), SessionError> {
    let document = crate::document()?;
    let promise = document.exit_picture_in_picture();
    JsFuture::from(promise)
        .await
        .map_err(|e| SessionError::Platform(js_error_message(&e)))?;
    Ok(())
}

/// A streaming session targeting the browser's Picture-in-Picture window.
///
/// Dropping the session closes it; see [`close`](Self::close).
pub struct PipSession<R: Rasterizer, F: FontResolver = porthole_core::font::NoResolver> {
    inner: Rc<Inner<R, F>>,
}

impl<R: Rasterizer, F: FontResolver> core::fmt::Debug for PipSession<R, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PipSession")
            .field("phase", &self.inner.state.borrow().phase())
            .finish_non_exhaustive()
    }
}

impl<R, F> PipSession<R, F>
where
    R: Rasterizer + 'static,
    R::Scene: Clone,
    F: FontResolver + Clone + 'static,
{
    /// Creates a session with a fresh font cache.
    ///
    /// Probes platform capability once; nothing touches the DOM until the
    /// first [`commit`](Self::commit).
    #[must_use]
    pub fn new(rasterizer: R, options: &SessionOptions) -> Self {
        Self::with_font_cache(rasterizer, options, FontCache::shared())
    }

    /// Creates a session sharing an existing font cache.
    ///
    /// Sessions sharing a cache never re-resolve a font another session
    /// already fetched.
    #[must_use]
    pub fn with_font_cache(
        rasterizer: R,
        options: &SessionOptions,
        cache: Rc<RefCell<FontCache>>,
    ) -> Self {
        let supported = crate::pip_supported();
        let geometry =
            SurfaceGeometry::new(options.width, options.height).with_scale(options.scale);
        Self {
            inner: Rc::new(Inner {
                rasterizer,
                state: RefCell::new(SessionState::new(supported)),
                generations: Generations::new(),
                inputs: RefCell::new(InputTracker::new()),
                scene: RefCell::new(None),
                fonts: RefCell::new(FontSpec::PreResolved(Vec::new())),
                cache,
                geometry: Cell::new(geometry),
                debug_visible: Cell::new(options.debug_visible),
                capture_mode: options.capture_mode,
                relay: RefCell::new(None),
                surface: RefCell::new(None),
                capture: RefCell::new(None),
                audio_source: RefCell::new(None),
                on_enter: CallbackSlot::new(),
                on_leave: CallbackSlot::new(),
                listeners: RefCell::new(Vec::new()),
                trace_sink: RefCell::new(None),
            }),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase()
    }

    /// Whether the platform can open a PiP window at all.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.inner.state.borrow().is_supported()
    }

    /// Whether the PiP window is open, as last reported by the platform.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().is_active()
    }

    /// Replaces the scene. Takes effect on the next commit.
    pub fn set_scene(&self, scene: R::Scene) {
        if self.inner.state.borrow().is_closed() {
            return;
        }
        *self.inner.scene.borrow_mut() = Some(scene);
        self.inner.inputs.borrow_mut().mark_scene();
    }

    /// Replaces the font specification. Takes effect on the next commit.
    pub fn set_fonts(&self, fonts: FontSpec<F>) {
        if self.inner.state.borrow().is_closed() {
            return;
        }
        *self.inner.fonts.borrow_mut() = fonts;
        self.inner.inputs.borrow_mut().mark_fonts();
    }

    /// Changes the logical surface size. Takes effect on the next commit.
    pub fn set_size(&self, width: f64, height: f64) {
        if self.inner.state.borrow().is_closed() {
            return;
        }
        let geometry = self.inner.geometry.get();
        self.inner.geometry.set(geometry.with_size(width, height));
        self.inner.inputs.borrow_mut().mark_geometry();
    }

    /// Changes the device pixel ratio. Takes effect on the next commit.
    pub fn set_scale(&self, scale: f64) {
        if self.inner.state.borrow().is_closed() {
            return;
        }
        let geometry = self.inner.geometry.get();
        self.inner.geometry.set(geometry.with_scale(scale));
        self.inner.inputs.borrow_mut().mark_geometry();
    }

    /// Shows or hides the canvas for visual debugging. Applies immediately.
    pub fn set_debug_visible(&self, visible: bool) {
        self.inner.debug_visible.set(visible);
        if let Some(surface) = self.inner.surface.borrow().as_ref() {
            surface.set_debug_visible(visible);
        }
    }

    /// Attaches (or with `None`, detaches) an audio source. Takes effect on
    /// the next commit and never triggers a render.
    pub fn set_audio(&self, source: Option<MediaStream>) {
        if self.inner.state.borrow().is_closed() {
            return;
        }
        *self.inner.audio_source.borrow_mut() = source;
        self.inner.inputs.borrow_mut().mark_audio();
    }

    /// Called each time the platform reports the PiP window opened.
    ///
    /// The callback may freely operate on the session, including closing it.
    pub fn on_enter(&self, callback: impl Fn() + 'static) {
        self.inner.on_enter.set(callback);
    }

    /// Called each time the platform reports the PiP window closed.
    ///
    /// The callback may freely operate on the session, including closing it.
    pub fn on_leave(&self, callback: impl Fn() + 'static) {
        self.inner.on_leave.set(callback);
    }

    /// Installs a trace sink and emits the creation event into it.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) {
        *self.inner.trace_sink.borrow_mut() = Some(Rc::new(RefCell::new(sink)));
        let supported = self.inner.state.borrow().is_supported();
        let mut sink = self.inner.forwarding_sink();
        make_tracer(&mut sink).session_created(&SessionCreated { supported });
    }

    /// Applies every change recorded since the last commit.
    ///
    /// The first call mounts the off-screen elements and derives the
    /// capture stream; later calls resize, swap audio, and dispatch at most
    /// one render cycle, superseding any cycle still in flight.
    pub fn commit(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        if inner.state.borrow().is_closed() {
            return Err(SessionError::NotInitialized);
        }
        if inner.relay.borrow().is_none() {
            self.mount()?;
        }
        let changes = inner.inputs.borrow_mut().drain();
        if changes.geometry {
            let geometry = inner.geometry.get();
            let physical = geometry.physical();
            if let Some(surface) = inner.surface.borrow_mut().as_mut()
                && surface.pixel_size() != physical
            {
                surface.resize(physical.0, physical.1);
            }
            if let Some(relay) = inner.relay.borrow().as_ref() {
                relay.resize(geometry.size.width, geometry.size.height);
            }
        }
        if changes.audio {
            self.apply_audio();
        }
        if changes.needs_render() && inner.scene.borrow().is_some() {
            self.dispatch_render();
        }
        Ok(())
    }

    /// Starts playback and asks the platform for the PiP window.
    ///
    /// Must be called synchronously inside a user gesture: both platform
    /// calls happen before this returns, and only the *waiting* lives in the
    /// returned future. The session flips to active when the platform fires
    /// `enterpictureinpicture`, not when the future resolves.
    pub fn enter(
        &self,
    ) -> Result<impl Future<Output = Result<(), SessionError>> + use<R, F>, SessionError> {
        self.inner.state.borrow().ensure_can_enter()?;
        let relay = self.inner.relay.borrow();
        let relay = relay.as_ref().ok_or(SessionError::NotInitialized)?;
        let (play, window) = relay.begin_enter()?;
        Ok(async move {
            JsFuture::from(play)
                .await
                .map_err(|e| SessionError::Platform(js_error_message(&e)))?;
            JsFuture::from(window)
                .await
                .map_err(|e| SessionError::Platform(js_error_message(&e)))?;
            Ok(())
        })
    }

    /// Closes the PiP window if it is open.
    ///
    /// The relay is rewound to the start and paused even when no window was
    /// open, so the next [`enter`](Self::enter) starts from a clean playback
    /// position.
    pub async fn exit(&self) -> Result<(), SessionError> {
        let plan = self.inner.state.borrow().exit_plan();
        let result = if plan.request_platform {
            request_platform_exit().await
        } else {
            Ok(())
        };
        if plan.rewind_relay
            && let Some(relay) = self.inner.relay.borrow().as_ref()
        {
            relay.rewind();
        }
        result
    }

    /// Exits when active, enters otherwise.
    ///
    /// Gesture-safe like [`enter`](Self::enter): the platform calls happen
    /// synchronously and completion is fire-and-forget, with failures
    /// reported to the console.
    pub fn toggle(&self) -> Result<(), SessionError> {
        if self.inner.state.borrow().is_active() {
            spawn_local(async {
                if let Err(error) = request_platform_exit().await {
                    web_sys::console::warn_1(&JsValue::from_str(&format!(
                        "picture-in-picture exit failed: {error}"
                    )));
                }
            });
            return Ok(());
        }
        let pending = self.enter()?;
        spawn_local(async move {
            if let Err(error) = pending.await {
                web_sys::console::warn_1(&JsValue::from_str(&format!(
                    "picture-in-picture enter failed: {error}"
                )));
            }
        });
        Ok(())
    }

    /// Tears the session down: closes the window if open, stops the capture
    /// track, and removes the off-screen elements. Idempotent and terminal;
    /// every later operation fails or is a no-op.
    pub fn close(&self) {
        if !self.inner.state.borrow().is_closed() {
            tear_down(&self.inner);
        }
    }

    fn mount(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let geometry = inner.geometry.get();
        let physical = geometry.physical();
        let surface = CanvasSurface::new(physical.0, physical.1)?;
        surface.set_debug_visible(inner.debug_visible.get());
        let capture = CaptureStream::new(surface.canvas(), inner.capture_mode)?;
        let relay = RelayVideo::new(geometry.size.width, geometry.size.height)?;
        relay.set_stream(capture.stream());
        self.register_listeners(&relay);
        *inner.surface.borrow_mut() = Some(surface);
        *inner.capture.borrow_mut() = Some(capture);
        *inner.relay.borrow_mut() = Some(relay);
        inner.state.borrow_mut().mark_ready();
        // Freshly mounted elements reflect nothing yet; replay every input.
        inner.inputs.borrow_mut().mark_all();
        Ok(())
    }

    fn register_listeners(&self, relay: &RelayVideo) {
        let enter = {
            let inner = Rc::clone(&self.inner);
            Closure::wrap(Box::new(move |_event: web_sys::Event| {
                if inner.state.borrow_mut().platform_entered() {
                    let mut sink = inner.forwarding_sink();
                    make_tracer(&mut sink).pip_entered();
                    drop(sink);
                    // Last, and through the slot: the callback may close the
                    // session or swap itself out.
                    inner.on_enter.invoke();
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        let leave = {
            let inner = Rc::clone(&self.inner);
            Closure::wrap(Box::new(move |_event: web_sys::Event| {
                if inner.state.borrow_mut().platform_left() {
                    if let Some(relay) = inner.relay.borrow().as_ref() {
                        relay.rewind();
                    }
                    let mut sink = inner.forwarding_sink();
                    make_tracer(&mut sink).pip_left();
                    drop(sink);
                    // Last, and through the slot: the callback may close the
                    // session or swap itself out.
                    inner.on_leave.invoke();
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        let _ = relay
            .video()
            .add_event_listener_with_callback("enterpictureinpicture", enter.as_ref().unchecked_ref());
        let _ = relay
            .video()
            .add_event_listener_with_callback("leavepictureinpicture", leave.as_ref().unchecked_ref());
        self.inner
            .listeners
            .borrow_mut()
            .extend([("enterpictureinpicture", enter), ("leavepictureinpicture", leave)]);
    }

    fn apply_audio(&self) {
        let inner = &self.inner;
        let capture = inner.capture.borrow();
        let Some(capture) = capture.as_ref() else {
            return;
        };
        let attached = match inner.audio_source.borrow().as_ref() {
            Some(source) => capture.attach_audio(source),
            None => {
                capture.detach_audio();
                0
            }
        };
        if let Some(relay) = inner.relay.borrow().as_ref() {
            relay.set_muted(attached == 0);
        }
        let mut sink = inner.forwarding_sink();
        make_tracer(&mut sink).audio_swapped(&AudioSwapped {
            attached_tracks: attached,
        });
    }

    fn dispatch_render(&self) {
        let ticket = self.inner.generations.begin();
        let mut sink = self.inner.forwarding_sink();
        make_tracer(&mut sink).render_began(&RenderBegan {
            generation: ticket.generation(),
        });
        let scene = match self.inner.scene.borrow().as_ref() {
            Some(scene) => scene.clone(),
            None => return,
        };
        let fonts = self.inner.fonts.borrow().clone();
        let geometry = self.inner.geometry.get();
        let inner = Rc::clone(&self.inner);
        spawn_local(async move {
            let mut sink = inner.forwarding_sink();
            let mut tracer = make_tracer(&mut sink);
            let prepared = prepare_frame(
                &inner.rasterizer,
                &SvgDecoder,
                &scene,
                geometry,
                &fonts,
                inner.cache.as_ref(),
                &ticket,
                &mut tracer,
            )
            .await;
            match prepared {
                Ok(Some(frame)) => {
                    let mut surface = inner.surface.borrow_mut();
                    let capture = inner.capture.borrow();
                    let (Some(surface), Some(capture)) = (surface.as_mut(), capture.as_ref())
                    else {
                        // Torn down while the cycle was in flight.
                        return;
                    };
                    if let Err(error) = commit_frame(surface, frame, &ticket, capture, &mut tracer)
                    {
                        drop(tracer);
                        drop(sink);
                        report_render_failure(&inner, ticket.generation(), &error);
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    drop(tracer);
                    drop(sink);
                    report_render_failure(&inner, ticket.generation(), &error);
                }
            }
        });
    }
}

impl<R: Rasterizer, F: FontResolver> Drop for PipSession<R, F> {
    fn drop(&mut self) {
        // Last handle out closes the session; listener closures held by the
        // DOM keep their own Rc, so this is the teardown path that breaks
        // the cycle.
        if !self.inner.state.borrow().is_closed() {
            tear_down(&self.inner);
        }
    }
}

/// Teardown shared between [`PipSession::close`] and `Drop`, without the
/// `R::Scene: Clone` bound the inherent impl carries. Dropping the listener
/// closures here breaks the Rc cycle through the DOM event targets.
fn tear_down<R: Rasterizer, F: FontResolver>(inner: &Rc<Inner<R, F>>) {
    if inner.state.borrow().is_active() {
        spawn_local(async {
            let _ = request_platform_exit().await;
        });
    }
    if let Some(relay) = inner.relay.borrow_mut().take() {
        for (name, listener) in inner.listeners.borrow_mut().drain(..) {
            let _ = relay
                .video()
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        relay.remove();
    }
    if let Some(capture) = inner.capture.borrow_mut().take() {
        capture.shutdown();
    }
    if let Some(surface) = inner.surface.borrow_mut().take() {
        surface.remove();
    }
    inner.scene.borrow_mut().take();
    inner.audio_source.borrow_mut().take();
    inner.on_enter.clear();
    inner.on_leave.clear();
    inner.state.borrow_mut().close();
    let mut sink = inner.forwarding_sink();
    make_tracer(&mut sink).session_closed();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_the_documented_surface() {
        let options = SessionOptions::default();
        assert_eq!((options.width, options.height), (640.0, 480.0));
        assert_eq!(options.scale, 1.0);
        assert!(!options.debug_visible);
        assert_eq!(options.capture_mode, CaptureMode::Live);
    }
}
