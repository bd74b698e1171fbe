// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters that implement the backend seams over plain JS functions.
//!
//! Rasterization and font fetching usually already exist on the JS side of
//! an application. These adapters let such functions drive a [`PipSession`]
//! without a bespoke Rust implementation:
//!
//! - [`JsRasterizer`] calls `fn(scene, options) -> Promise<string>`, where
//!   `options` is `{ width, height, fonts: [{ name, weight, data }] }` with
//!   `data` a `Uint8Array`.
//! - [`JsFontResolver`] calls `fn(name, weight) -> Promise<ArrayBuffer |
//!   Uint8Array>`.
//!
//! [`PipSession`]: crate::PipSession

use alloc::rc::Rc;
use alloc::string::{String, ToString as _};
use core::future::Future;

use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::JsFuture;

use porthole_core::backend::{RasterOptions, Rasterizer};
use porthole_core::error::{FontResolutionError, RenderError};
use porthole_core::font::{Font, FontRequest, FontResolver, FontStyle};

use crate::js_error_message;

/// A [`Rasterizer`] backed by a JS function returning a markup promise.
#[derive(Clone)]
pub struct JsRasterizer {
    function: Function,
}

impl core::fmt::Debug for JsRasterizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JsRasterizer").finish_non_exhaustive()
    }
}

impl JsRasterizer {
    /// Wraps `fn(scene, options) -> Promise<string>`.
    #[must_use]
    pub fn new(function: Function) -> Self {
        Self { function }
    }
}

/// Builds the `options` argument handed to the JS rasterizer.
fn raster_options_object(options: &RasterOptions) -> Result<Object, RenderError> {
    let object = Object::new();
    let set = |key: &str, value: &JsValue| {
        Reflect::set(&object, &JsValue::from_str(key), value)
            .map_err(|e| RenderError::Rasterize(js_error_message(&e)))
    };
    set("width", &JsValue::from_f64(options.width))?;
    set("height", &JsValue::from_f64(options.height))?;
    let fonts = Array::new();
    for font in &options.fonts {
        let entry = Object::new();
        Reflect::set(&entry, &"name".into(), &JsValue::from_str(&font.name))
            .map_err(|e| RenderError::Rasterize(js_error_message(&e)))?;
        Reflect::set(&entry, &"weight".into(), &JsValue::from_f64(f64::from(font.weight)))
            .map_err(|e| RenderError::Rasterize(js_error_message(&e)))?;
        Reflect::set(&entry, &"data".into(), &Uint8Array::from(&font.data[..]))
            .map_err(|e| RenderError::Rasterize(js_error_message(&e)))?;
        fonts.push(&entry);
    }
    set("fonts", &fonts)?;
    Ok(object)
}

impl Rasterizer for JsRasterizer {
    type Scene = JsValue;

    fn rasterize(
        &self,
        scene: &Self::Scene,
        options: &RasterOptions,
    ) -> impl Future<Output = Result<String, RenderError>> {
        let call = raster_options_object(options).and_then(|object| {
            self.function
                .call2(&JsValue::NULL, scene, &object)
                .map_err(|e| RenderError::Rasterize(js_error_message(&e)))
        });
        async move {
            let promise: Promise = call?
                .dyn_into()
                .map_err(|_| RenderError::Rasterize("rasterizer did not return a promise".to_string()))?;
            let markup = JsFuture::from(promise)
                .await
                .map_err(|e| RenderError::Rasterize(js_error_message(&e)))?;
            markup
                .as_string()
                .ok_or_else(|| RenderError::Rasterize("rasterizer did not resolve to a string".to_string()))
        }
    }
}

/// A [`FontResolver`] backed by a JS function returning font bytes.
#[derive(Clone)]
pub struct JsFontResolver {
    function: Function,
}

impl core::fmt::Debug for JsFontResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JsFontResolver").finish_non_exhaustive()
    }
}

impl JsFontResolver {
    /// Wraps `fn(name, weight) -> Promise<ArrayBuffer | Uint8Array>`.
    #[must_use]
    pub fn new(function: Function) -> Self {
        Self { function }
    }
}

impl FontResolver for JsFontResolver {
    fn resolve(
        &self,
        request: &FontRequest,
    ) -> impl Future<Output = Result<Font, FontResolutionError>> {
        let name = request.name.clone();
        let weight = request.weight;
        let call = self.function.call2(
            &JsValue::NULL,
            &JsValue::from_str(&name),
            &JsValue::from_f64(f64::from(weight)),
        );
        async move {
            let fail = |message: String| FontResolutionError {
                name: name.clone(),
                message,
            };
            let value = call.map_err(|e| fail(js_error_message(&e)))?;
            let promise: Promise = value
                .dyn_into()
                .map_err(|_| fail("resolver did not return a promise".to_string()))?;
            let bytes = JsFuture::from(promise)
                .await
                .map_err(|e| fail(js_error_message(&e)))?;
            // Uint8Array::new views both ArrayBuffer and typed-array inputs.
            let data = Uint8Array::new(&bytes).to_vec();
            if data.is_empty() {
                return Err(fail("resolver returned no data".to_string()));
            }
            Ok(Font {
                name,
                data: Rc::from(data),
                weight,
                style: FontStyle::Normal,
            })
        }
    }
}
