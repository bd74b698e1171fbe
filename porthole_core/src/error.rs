// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for session lifecycle and render cycles.
//!
//! The split follows the propagation policy: [`SessionError`] values surface
//! to the caller of the specific operation (or synchronously, for capability
//! and lifecycle checks), while [`RenderError`] values are isolated per
//! render cycle — a failed cycle is reported and dropped, the surface keeps
//! its last successfully rendered content, and the session stays usable.
//! The core retries nothing; retry policy for flaky resolvers belongs to the
//! resolver itself.

use alloc::string::String;

use thiserror::Error;

/// Failure to turn a [`FontRequest`](crate::font::FontRequest) into a
/// resolved [`Font`](crate::font::Font).
///
/// Propagated from the caller-supplied resolver; aborts the render cycle
/// that needed the font, nothing else.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to resolve font {name:?}: {message}")]
pub struct FontResolutionError {
    /// Family name of the font that failed to resolve.
    pub name: String,
    /// Resolver-supplied failure message.
    pub message: String,
}

/// Lifecycle and platform-transition failures of a PiP session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The platform has no Picture-in-Picture capability. Fatal to
    /// `enter()`; consumers should check support up front and disable the
    /// affordance.
    #[error("picture-in-picture is not supported on this platform")]
    Unsupported,

    /// The relay element and pixel surface have not been constructed yet,
    /// or the session has already been torn down.
    #[error("session elements are not initialized")]
    NotInitialized,

    /// The platform refused an enter or exit request.
    #[error("platform request failed: {0}")]
    Platform(String),
}

/// A failure inside one render cycle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The external rasterizer rejected the scene. Carries the rasterizer's
    /// own message, unchanged.
    #[error("rasterizer error: {0}")]
    Rasterize(String),

    /// The markup could not be materialized as a decoded image.
    #[error("markup decode error: {0}")]
    Decode(String),

    /// The decoded image could not be drawn onto the pixel surface.
    #[error("draw error: {0}")]
    Draw(String),

    /// A font needed by this cycle could not be resolved.
    #[error(transparent)]
    Fonts(#[from] FontResolutionError),
}

impl RenderError {
    /// Short stage label used by trace events and log lines.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Rasterize(_) => "rasterize",
            Self::Decode(_) => "decode",
            Self::Draw(_) => "draw",
            Self::Fonts(_) => "fonts",
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString as _;

    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            SessionError::Unsupported.to_string(),
            "picture-in-picture is not supported on this platform"
        );
        assert!(
            RenderError::Rasterize("boom".into())
                .to_string()
                .contains("boom")
        );
    }

    #[test]
    fn font_failures_convert_into_render_errors() {
        let err = FontResolutionError {
            name: "Inter".into(),
            message: "404".into(),
        };
        let render: RenderError = err.clone().into();
        assert_eq!(render, RenderError::Fonts(err));
        assert_eq!(render.stage(), "fonts");
    }
}
