// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the session lifecycle.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! session and render instrumentation call at each stage. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a session is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionCreated {
    /// Platform capability probed at creation.
    pub supported: bool,
}

/// Emitted when a render cycle begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderBegan {
    /// Generation of the new cycle.
    pub generation: u64,
}

/// Emitted after font resolution for a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontsResolved {
    /// Total fonts resolved.
    pub count: u32,
    /// How many came from the cache.
    pub cache_hits: u32,
}

/// Emitted when a cycle paints the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderCommitted {
    /// Generation of the committed cycle.
    pub generation: u64,
    /// Physical surface width painted.
    pub width: u32,
    /// Physical surface height painted.
    pub height: u32,
}

/// Emitted when a cycle's result is dropped because a newer cycle began.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSuperseded {
    /// Generation of the superseded cycle.
    pub generation: u64,
}

/// Emitted when a cycle fails. Non-fatal: the surface keeps its last frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderFailed {
    /// Generation of the failed cycle.
    pub generation: u64,
    /// Failing stage, from [`RenderError::stage`](crate::error::RenderError::stage).
    pub stage: &'static str,
}

/// Emitted when the capture stream's audio tracks are swapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioSwapped {
    /// Audio tracks attached after the swap (0 when detached).
    pub attached_tracks: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a session.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a session is created.
    fn on_session_created(&mut self, e: &SessionCreated) {
        _ = e;
    }

    /// Called when a render cycle begins.
    fn on_render_began(&mut self, e: &RenderBegan) {
        _ = e;
    }

    /// Called after a cycle's fonts resolve.
    fn on_fonts_resolved(&mut self, e: &FontsResolved) {
        _ = e;
    }

    /// Called when a cycle paints the surface.
    fn on_render_committed(&mut self, e: &RenderCommitted) {
        _ = e;
    }

    /// Called when a cycle's result is dropped as stale.
    fn on_render_superseded(&mut self, e: &RenderSuperseded) {
        _ = e;
    }

    /// Called when a cycle fails.
    fn on_render_failed(&mut self, e: &RenderFailed) {
        _ = e;
    }

    /// Called when the platform reports the PiP window opened.
    fn on_pip_entered(&mut self) {}

    /// Called when the platform reports the PiP window closed.
    fn on_pip_left(&mut self) {}

    /// Called when audio tracks are swapped on the capture stream.
    fn on_audio_swapped(&mut self, e: &AudioSwapped) {
        _ = e;
    }

    /// Called when the session is torn down.
    fn on_session_closed(&mut self) {}
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SessionCreated`].
    #[inline]
    pub fn session_created(&mut self, e: &SessionCreated) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_session_created(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderBegan`].
    #[inline]
    pub fn render_began(&mut self, e: &RenderBegan) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_began(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FontsResolved`].
    #[inline]
    pub fn fonts_resolved(&mut self, e: &FontsResolved) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_fonts_resolved(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderCommitted`].
    #[inline]
    pub fn render_committed(&mut self, e: &RenderCommitted) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_committed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderSuperseded`].
    #[inline]
    pub fn render_superseded(&mut self, e: &RenderSuperseded) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_superseded(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderFailed`].
    #[inline]
    pub fn render_failed(&mut self, e: &RenderFailed) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a PiP-entered event.
    #[inline]
    pub fn pip_entered(&mut self) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pip_entered();
        }
    }

    /// Emits a PiP-left event.
    #[inline]
    pub fn pip_left(&mut self) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pip_left();
        }
    }

    /// Emits an [`AudioSwapped`].
    #[inline]
    pub fn audio_swapped(&mut self, e: &AudioSwapped) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_audio_swapped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a session-closed event.
    #[inline]
    pub fn session_closed(&mut self) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_session_closed();
        }
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Counting {
        seen: Vec<&'static str>,
    }

    impl TraceSink for Counting {
        fn on_render_began(&mut self, _e: &RenderBegan) {
            self.seen.push("began");
        }

        fn on_render_committed(&mut self, _e: &RenderCommitted) {
            self.seen.push("committed");
        }
    }

    #[test]
    fn tracer_dispatches_to_the_sink() {
        let mut sink = Counting::default();
        let mut tracer = Tracer::new(&mut sink);
        tracer.render_began(&RenderBegan { generation: 1 });
        tracer.render_committed(&RenderCommitted {
            generation: 1,
            width: 640,
            height: 480,
        });
        // Events without overrides fall through to the no-op default.
        tracer.pip_entered();
        assert_eq!(sink.seen, ["began", "committed"]);
    }

    #[test]
    fn none_discards_everything() {
        let mut tracer = Tracer::none();
        tracer.render_began(&RenderBegan { generation: 7 });
        tracer.session_closed();
    }
}
