// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and stores every event as a
//! [`RecordedEvent`], preserving arrival order. Useful in tests to assert
//! the exact sequence a session emitted, and as the input to
//! [`json::export`](crate::json::export).

use porthole_core::trace::{
    AudioSwapped, FontsResolved, RenderBegan, RenderCommitted, RenderFailed, RenderSuperseded,
    SessionCreated, TraceSink,
};

/// One recorded trace event, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// Session created; payload is the platform capability.
    SessionCreated(SessionCreated),
    /// A render cycle began.
    RenderBegan(RenderBegan),
    /// Fonts resolved for a cycle.
    FontsResolved(FontsResolved),
    /// A cycle painted the surface.
    RenderCommitted(RenderCommitted),
    /// A cycle was dropped as stale.
    RenderSuperseded(RenderSuperseded),
    /// A cycle failed.
    RenderFailed(RenderFailed),
    /// The platform opened the PiP window.
    PipEntered,
    /// The platform closed the PiP window.
    PipLeft,
    /// Audio tracks were swapped.
    AudioSwapped(AudioSwapped),
    /// The session was torn down.
    SessionClosed,
}

/// A [`TraceSink`] that stores events as owned values.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }
}

impl TraceSink for RecorderSink {
    fn on_session_created(&mut self, e: &SessionCreated) {
        self.events.push(RecordedEvent::SessionCreated(*e));
    }

    fn on_render_began(&mut self, e: &RenderBegan) {
        self.events.push(RecordedEvent::RenderBegan(*e));
    }

    fn on_fonts_resolved(&mut self, e: &FontsResolved) {
        self.events.push(RecordedEvent::FontsResolved(*e));
    }

    fn on_render_committed(&mut self, e: &RenderCommitted) {
        self.events.push(RecordedEvent::RenderCommitted(*e));
    }

    fn on_render_superseded(&mut self, e: &RenderSuperseded) {
        self.events.push(RecordedEvent::RenderSuperseded(*e));
    }

    fn on_render_failed(&mut self, e: &RenderFailed) {
        self.events.push(RecordedEvent::RenderFailed(*e));
    }

    fn on_pip_entered(&mut self) {
        self.events.push(RecordedEvent::PipEntered);
    }

    fn on_pip_left(&mut self) {
        self.events.push(RecordedEvent::PipLeft);
    }

    fn on_audio_swapped(&mut self, e: &AudioSwapped) {
        self.events.push(RecordedEvent::AudioSwapped(*e));
    }

    fn on_session_closed(&mut self) {
        self.events.push(RecordedEvent::SessionClosed);
    }
}

#[cfg(test)]
mod tests {
    use porthole_core::trace::Tracer;

    use super::*;

    #[test]
    fn records_events_in_arrival_order() {
        let mut sink = RecorderSink::new();
        let mut tracer = Tracer::new(&mut sink);
        tracer.session_created(&SessionCreated { supported: true });
        tracer.render_began(&RenderBegan { generation: 1 });
        tracer.render_committed(&RenderCommitted {
            generation: 1,
            width: 640,
            height: 480,
        });
        tracer.pip_entered();
        tracer.session_closed();

        assert_eq!(
            sink.events(),
            [
                RecordedEvent::SessionCreated(SessionCreated { supported: true }),
                RecordedEvent::RenderBegan(RenderBegan { generation: 1 }),
                RecordedEvent::RenderCommitted(RenderCommitted {
                    generation: 1,
                    width: 640,
                    height: 480,
                }),
                RecordedEvent::PipEntered,
                RecordedEvent::SessionClosed,
            ]
        );
    }
}
