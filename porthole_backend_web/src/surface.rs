// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas pixel surface and SVG markup decoding.
//!
//! [`CanvasSurface`] implements [`PixelSurface`] over an off-screen
//! `<canvas>`; [`SvgDecoder`] implements [`MarkupDecoder`] by wrapping the
//! markup in a Blob object URL and decoding it through an
//! `HTMLImageElement`. The object URL is a temporary resource and is revoked
//! on success and failure alike.

use alloc::string::{String, ToString as _};
use core::future::Future;

use js_sys::Array;
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, Url,
};

use porthole_core::backend::{MarkupDecoder, PixelSurface};
use porthole_core::error::{RenderError, SessionError};

use crate::js_error_message;

/// MIME type for the markup Blob handed to the image decoder.
const SVG_MIME: &str = "image/svg+xml;charset=utf-8";

/// An off-screen `<canvas>` acting as the session's pixel surface.
///
/// The canvas is appended to `<body>` hidden; [`set_debug_visible`] pins it
/// to the viewport corner for visual debugging. The capture stream is
/// derived from this canvas, so everything drawn here is what the PiP
/// window shows.
///
/// [`set_debug_visible`]: Self::set_debug_visible
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl core::fmt::Debug for CanvasSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasSurface")
            .field("width", &self.canvas.width())
            .field("height", &self.canvas.height())
            .finish()
    }
}

impl CanvasSurface {
    /// Creates a hidden canvas with the given physical dimensions and
    /// appends it to `<body>`.
    pub fn new(width: u32, height: u32) -> Result<Self, SessionError> {
        let document = crate::document()?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| SessionError::Platform(js_error_message(&e)))?
            .unchecked_into();
        canvas.set_width(width);
        canvas.set_height(height);
        let surface = Self { canvas };
        surface.set_debug_visible(false);
        let body = document.body().ok_or(SessionError::NotInitialized)?;
        body.append_child(&surface.canvas)
            .map_err(|e| SessionError::Platform(js_error_message(&e)))?;
        Ok(surface)
    }

    /// The underlying canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Shows the canvas pinned to the viewport corner, or hides it.
    ///
    /// Hiding uses off-screen positioning rather than `display: none`, which
    /// would stop the canvas from producing capture frames in some engines.
    pub fn set_debug_visible(&self, visible: bool) {
        let style = if visible {
            "position:fixed;right:8px;bottom:8px;z-index:2147483647;\
             outline:1px solid red;max-width:30vw;max-height:30vh;"
        } else {
            "position:absolute;left:-9999px;top:0;pointer-events:none;"
        };
        let _ = self.canvas.set_attribute("style", style);
    }

    /// Detaches the canvas from the document.
    pub(crate) fn remove(&self) {
        self.canvas.remove();
    }
}

impl PixelSurface for CanvasSurface {
    type Image = HtmlImageElement;

    fn pixel_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn draw(&mut self, image: &Self::Image) -> Result<(), RenderError> {
        let context: CanvasRenderingContext2d = self
            .canvas
            .get_context("2d")
            .map_err(|e| RenderError::Draw(js_error_message(&e)))?
            .ok_or_else(|| RenderError::Draw("2d context unavailable".to_string()))?
            .unchecked_into();
        let (width, height) = self.pixel_size();
        context
            .draw_image_with_html_image_element_and_dw_and_dh(
                image,
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            )
            .map_err(|e| RenderError::Draw(js_error_message(&e)))
    }
}

/// Revokes the object URL when dropped, on every exit path.
struct ObjectUrl {
    url: String,
}

impl ObjectUrl {
    fn new(blob: &Blob) -> Result<Self, RenderError> {
        let url = Url::create_object_url_with_blob(blob)
            .map_err(|e| RenderError::Decode(js_error_message(&e)))?;
        Ok(Self { url })
    }

    fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let _ = Url::revoke_object_url(&self.url);
    }
}

/// Decodes SVG markup into a fully decoded `HTMLImageElement`.
///
/// `image.decode()` resolves only once the image is ready to draw, so
/// [`PixelSurface::draw`] never races an in-flight decode.
#[derive(Clone, Copy, Debug, Default)]
pub struct SvgDecoder;

impl MarkupDecoder for SvgDecoder {
    type Image = HtmlImageElement;

    fn decode(&self, markup: &str) -> impl Future<Output = Result<Self::Image, RenderError>> {
        let markup = markup.to_string();
        async move {
            let parts = Array::of1(&JsValue::from_str(&markup));
            let options = BlobPropertyBag::new();
            options.set_type(SVG_MIME);
            let blob = Blob::new_with_str_sequence_and_options(&parts, &options)
                .map_err(|e| RenderError::Decode(js_error_message(&e)))?;
            let url = ObjectUrl::new(&blob)?;
            let image = HtmlImageElement::new()
                .map_err(|e| RenderError::Decode(js_error_message(&e)))?;
            image.set_src(url.as_str());
            JsFuture::from(image.decode())
                .await
                .map_err(|e| RenderError::Decode(js_error_message(&e)))?;
            // `url` is revoked here; the image carries its own decoded data.
            Ok(image)
        }
    }
}
