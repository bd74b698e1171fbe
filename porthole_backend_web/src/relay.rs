// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hidden relay `<video>` element.
//!
//! Browser Picture-in-Picture only accepts a video element, so the session
//! plays its capture stream through an off-screen `<video>` and hands that
//! to the platform. The element is sized to the *minimal* integer ratio of
//! the surface so the PiP window opens with the right aspect without the
//! platform ever seeing the real pixel dimensions.

use js_sys::Promise;
use wasm_bindgen::JsCast as _;
use web_sys::{HtmlVideoElement, MediaStream};

use porthole_core::error::SessionError;
use porthole_core::ratio::{StreamSize, minimal_stream_size};

use crate::js_error_message;

/// The off-screen `<video>` element handed to the platform PiP API.
pub struct RelayVideo {
    video: HtmlVideoElement,
}

impl core::fmt::Debug for RelayVideo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RelayVideo")
            .field("width", &self.video.width())
            .field("height", &self.video.height())
            .finish()
    }
}

/// Clamps a ratio component into the element attribute range.
fn attribute_dimension(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl RelayVideo {
    /// Creates the relay element for a surface of the given logical size and
    /// appends it to `<body>`.
    ///
    /// Muted with `playsinline` so `play()` succeeds without showing
    /// anything inline; audio is unmuted only once real audio tracks are
    /// attached to the stream.
    pub fn new(width: f64, height: f64) -> Result<Self, SessionError> {
        let document = crate::document()?;
        let video: HtmlVideoElement = document
            .create_element("video")
            .map_err(|e| SessionError::Platform(js_error_message(&e)))?
            .unchecked_into();
        video.set_muted(true);
        video.set_preload("auto");
        let _ = video.set_attribute("playsinline", "");
        let _ = video.set_attribute(
            "style",
            "position:absolute;left:-9999px;top:0;pointer-events:none;",
        );
        let relay = Self { video };
        relay.resize(width, height);
        let body = document.body().ok_or(SessionError::NotInitialized)?;
        body.append_child(&relay.video)
            .map_err(|e| SessionError::Platform(js_error_message(&e)))?;
        Ok(relay)
    }

    /// The underlying video element.
    #[must_use]
    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    /// Re-derives the element's width/height attributes from a new logical
    /// surface size.
    pub fn resize(&self, width: f64, height: f64) {
        let StreamSize { width, height } = minimal_stream_size(width, height);
        self.video.set_width(attribute_dimension(width));
        self.video.set_height(attribute_dimension(height));
    }

    /// Points the element at the capture stream.
    pub fn set_stream(&self, stream: &MediaStream) {
        self.video.set_src_object(Some(stream));
    }

    /// Mutes or unmutes relayed audio.
    pub fn set_muted(&self, muted: bool) {
        self.video.set_muted(muted);
    }

    /// Starts playback and requests the PiP window, both synchronously.
    ///
    /// Both platform calls must happen inside the user gesture that
    /// triggered entry; only the *awaiting* of the returned promises may be
    /// deferred. Callers await them in order: play first, then the window.
    pub(crate) fn begin_enter(
        &self,
    ) -> Result<(Promise, Promise<PictureInPictureWindow>), SessionError> {
        let play = self
            .video
            .play()
            .map_err(|e| SessionError::Platform(js_error_message(&e)))?;
        let window = self.video.request_picture_in_picture();
        Ok((play, window))
    }

    /// Pauses playback and rewinds, after the PiP window has closed.
    pub(crate) fn rewind(&self) {
        let _ = self.video.pause();
        self.video.set_current_time(0.0);
    }

    /// Detaches the stream and removes the element from the document.
    pub(crate) fn remove(&self) {
        self.video.set_src_object(None);
        self.video.remove();
    }
}
