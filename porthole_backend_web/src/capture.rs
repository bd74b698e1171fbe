// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas capture stream management.
//!
//! Wraps `canvas.captureStream()` and owns the audio-track swap: the PiP
//! window plays whatever audio tracks are attached to the capture stream, so
//! swapping audio means replacing those tracks in place without touching the
//! video track.

use wasm_bindgen::JsCast as _;
use web_sys::{CanvasCaptureMediaStreamTrack, HtmlCanvasElement, MediaStream, MediaStreamTrack};

use porthole_core::backend::FrameSink;
use porthole_core::error::SessionError;

use crate::js_error_message;

/// How frames get from the canvas into the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureMode {
    /// The stream mirrors the canvas continuously; frame requests are
    /// no-ops.
    #[default]
    Live,
    /// The stream only carries frames pushed explicitly via
    /// [`FrameSink::request_frame`] after each paint. Cuts encoder work for
    /// scenes that change rarely.
    Manual,
}

/// A `MediaStream` captured from the session's canvas.
pub struct CaptureStream {
    stream: MediaStream,
    video_track: Option<MediaStreamTrack>,
    mode: CaptureMode,
}

impl core::fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CaptureStream")
            .field("mode", &self.mode)
            .field("has_video_track", &self.video_track.is_some())
            .finish()
    }
}

impl CaptureStream {
    /// Derives a capture stream from the canvas.
    ///
    /// [`CaptureMode::Manual`] uses a frame request rate of zero, so the
    /// stream stays idle until a frame is pushed.
    pub fn new(canvas: &HtmlCanvasElement, mode: CaptureMode) -> Result<Self, SessionError> {
        let stream = match mode {
            CaptureMode::Live => canvas.capture_stream(),
            CaptureMode::Manual => canvas.capture_stream_with_frame_request_rate(0.0),
        }
        .map_err(|e| SessionError::Platform(js_error_message(&e)))?;
        let video_track = stream
            .get_video_tracks()
            .get(0)
            .dyn_into::<MediaStreamTrack>()
            .ok();
        Ok(Self {
            stream,
            video_track,
            mode,
        })
    }

    /// The stream to hand to the relay video element.
    #[must_use]
    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    /// Replaces the stream's audio tracks with `source`'s.
    ///
    /// Returns the number of tracks attached afterwards. The source stream's
    /// tracks are shared, not cloned; stopping them externally silences the
    /// PiP window too.
    pub fn attach_audio(&self, source: &MediaStream) -> u32 {
        self.detach_audio();
        let tracks = source.get_audio_tracks();
        for track in tracks.iter() {
            self.stream.add_track(&track.unchecked_into());
        }
        tracks.length()
    }

    /// Removes every audio track from the stream.
    pub fn detach_audio(&self) {
        for track in self.stream.get_audio_tracks().iter() {
            self.stream.remove_track(&track.unchecked_into());
        }
    }

    /// Stops the capture's own video track.
    ///
    /// Attached audio tracks are only removed, never stopped; they belong to
    /// the caller.
    pub(crate) fn shutdown(&self) {
        self.detach_audio();
        if let Some(track) = &self.video_track {
            track.stop();
        }
    }
}

impl FrameSink for CaptureStream {
    fn request_frame(&self) {
        if self.mode != CaptureMode::Manual {
            return;
        }
        if let Some(track) = &self.video_track
            && let Some(canvas_track) = track.dyn_ref::<CanvasCaptureMediaStreamTrack>()
        {
            canvas_track.request_frame();
        }
    }
}
