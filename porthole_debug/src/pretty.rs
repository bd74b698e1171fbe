// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! event to any [`io::Write`], for console logging during development. Write
//! failures are swallowed; diagnostics never take a session down.

use std::io::Write;

use porthole_core::trace::{
    AudioSwapped, FontsResolved, RenderBegan, RenderCommitted, RenderFailed, RenderSuperseded,
    SessionCreated, TraceSink,
};

/// A [`TraceSink`] that writes one line per event.
#[derive(Debug)]
pub struct PrettyPrintSink<W: Write> {
    writer: W,
}

impl<W: Write> PrettyPrintSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_session_created(&mut self, e: &SessionCreated) {
        let _ = writeln!(self.writer, "session created (supported: {})", e.supported);
    }

    fn on_render_began(&mut self, e: &RenderBegan) {
        let _ = writeln!(self.writer, "render #{} began", e.generation);
    }

    fn on_fonts_resolved(&mut self, e: &FontsResolved) {
        let _ = writeln!(
            self.writer,
            "fonts resolved: {} ({} from cache)",
            e.count, e.cache_hits
        );
    }

    fn on_render_committed(&mut self, e: &RenderCommitted) {
        let _ = writeln!(
            self.writer,
            "render #{} committed at {}x{}",
            e.generation, e.width, e.height
        );
    }

    fn on_render_superseded(&mut self, e: &RenderSuperseded) {
        let _ = writeln!(self.writer, "render #{} superseded", e.generation);
    }

    fn on_render_failed(&mut self, e: &RenderFailed) {
        let _ = writeln!(self.writer, "render #{} failed in {}", e.generation, e.stage);
    }

    fn on_pip_entered(&mut self) {
        let _ = writeln!(self.writer, "pip entered");
    }

    fn on_pip_left(&mut self) {
        let _ = writeln!(self.writer, "pip left");
    }

    fn on_audio_swapped(&mut self, e: &AudioSwapped) {
        let _ = writeln!(
            self.writer,
            "audio swapped ({} tracks attached)",
            e.attached_tracks
        );
    }

    fn on_session_closed(&mut self) {
        let _ = writeln!(self.writer, "session closed");
    }
}

#[cfg(test)]
mod tests {
    use porthole_core::trace::Tracer;

    use super::*;

    #[test]
    fn one_line_per_event() {
        let mut sink = PrettyPrintSink::new(Vec::new());
        let mut tracer = Tracer::new(&mut sink);
        tracer.render_began(&RenderBegan { generation: 3 });
        tracer.render_failed(&RenderFailed {
            generation: 3,
            stage: "decode",
        });

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "render #3 began\nrender #3 failed in decode\n");
    }
}
