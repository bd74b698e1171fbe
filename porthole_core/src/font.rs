// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font model, resolver contract, and the resolution cache.
//!
//! Rasterizers need concrete font bytes. Callers supply them either fully
//! resolved or as requests paired with a [`FontResolver`] capability; the
//! core imposes no transport — network fetch, embedded blob, and anything
//! else all fit behind the resolver.
//!
//! The [`FontCache`] is an explicit, injectable service rather than a
//! module-level global: sessions share one through an `Rc<RefCell<_>>`
//! handle, and tests instantiate isolated caches per case. There is no
//! expiry and no size bound; the caller manages the lifecycle via
//! [`remove`](FontCache::remove) and [`clear`](FontCache::clear).

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::future::Future;

use crate::error::FontResolutionError;

/// Slant of a font face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
    /// Slanted without italic glyph forms.
    Oblique,
}

/// A resolved font: family name plus binary face data.
///
/// Immutable once constructed. The data is shared read-only between the
/// cache and every render that references the font by name, so cloning a
/// `Font` is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct Font {
    /// Family name; doubles as the cache key.
    pub name: String,
    /// Raw face data (TTF/OTF/WOFF bytes — opaque to the core).
    pub data: Rc<[u8]>,
    /// Weight, in the usual 100–900 scale.
    pub weight: u16,
    /// Slant.
    pub style: FontStyle,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("data_len", &self.data.len())
            .field("weight", &self.weight)
            .field("style", &self.style)
            .finish()
    }
}

/// A font request lacking binary data.
///
/// Exists only as renderer input until resolved; never stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontRequest {
    /// Family name to resolve.
    pub name: String,
    /// Requested weight.
    pub weight: u16,
}

/// Caller-supplied capability that turns a [`FontRequest`] into a [`Font`].
///
/// The core never assumes a resolution strategy and imposes no timeout; a
/// hanging resolver stalls its render cycle indefinitely but leaves every
/// other session operation responsive.
pub trait FontResolver {
    /// Resolves one request, possibly failing.
    fn resolve(
        &self,
        request: &FontRequest,
    ) -> impl Future<Output = Result<Font, FontResolutionError>>;
}

/// Resolver for the [`FontSpec::PreResolved`] arm; always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoResolver;

impl FontResolver for NoResolver {
    fn resolve(
        &self,
        request: &FontRequest,
    ) -> impl Future<Output = Result<Font, FontResolutionError>> {
        core::future::ready(Err(FontResolutionError {
            name: request.name.clone(),
            message: String::from("no resolver supplied"),
        }))
    }
}

/// How a session's fonts are supplied.
///
/// The two arms are mutually exclusive by construction: either every font
/// already carries its data, or every font is a request resolved cache-first
/// through the supplied resolver.
#[derive(Clone, Debug)]
pub enum FontSpec<R = NoResolver> {
    /// Fonts that already carry binary data; used as-is.
    PreResolved(Vec<Font>),
    /// Requests resolved on demand: cache by name first, then the resolver,
    /// storing each result back into the cache.
    Resolvable(Vec<FontRequest>, R),
}

impl FontSpec<NoResolver> {
    /// Convenience constructor pinning the resolver type parameter for the
    /// pre-resolved arm.
    #[must_use]
    pub fn pre_resolved(fonts: Vec<Font>) -> Self {
        Self::PreResolved(fonts)
    }
}

/// Mapping from family name to a single resolved [`Font`].
///
/// At most one font per key; [`set`](Self::set) overwrites unconditionally.
#[derive(Debug, Default)]
pub struct FontCache {
    entries: BTreeMap<String, Font>,
}

impl FontCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache behind the shared handle sessions expect.
    #[must_use]
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Inserts or replaces the font stored under `name`.
    pub fn set(&mut self, name: impl Into<String>, font: Font) {
        self.entries.insert(name.into(), font);
    }

    /// Looks up a font by family name. Absent keys yield `None`, never an
    /// error.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Font> {
        self.entries.get(name)
    }

    /// Removes one entry. Removing an absent key is a no-op.
    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Empties the whole cache.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached fonts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no fonts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fonts produced by [`resolve_fonts`], with a cache-hit count for tracing.
#[derive(Clone, Debug)]
pub struct ResolvedFonts {
    /// Fonts in request order.
    pub fonts: Vec<Font>,
    /// How many came from the cache rather than the resolver.
    pub cache_hits: u32,
}

/// Resolves a font specification into concrete fonts, cache-first.
///
/// The check-then-resolve-then-store sequence is not atomic across the
/// resolver await: two concurrent resolutions of the same uncached name may
/// both invoke the resolver, and the later write overwrites the earlier one.
/// Last-write-wins is acceptable — bounded duplicate work, no corruption.
/// No cache borrow is held across the await.
pub async fn resolve_fonts<R: FontResolver>(
    spec: &FontSpec<R>,
    cache: &RefCell<FontCache>,
) -> Result<ResolvedFonts, FontResolutionError> {
    match spec {
        FontSpec::PreResolved(fonts) => Ok(ResolvedFonts {
            fonts: fonts.clone(),
            cache_hits: 0,
        }),
        FontSpec::Resolvable(requests, resolver) => {
            let mut fonts = Vec::with_capacity(requests.len());
            let mut cache_hits = 0;
            for request in requests {
                let cached = cache.borrow().get(&request.name).cloned();
                if let Some(font) = cached {
                    cache_hits += 1;
                    fonts.push(font);
                    continue;
                }
                let font = resolver.resolve(request).await?;
                cache.borrow_mut().set(request.name.clone(), font.clone());
                fonts.push(font);
            }
            Ok(ResolvedFonts { fonts, cache_hits })
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString as _;
    use alloc::vec;
    use core::cell::Cell;

    use futures::executor::block_on;

    use super::*;

    fn font(name: &str) -> Font {
        Font {
            name: name.to_string(),
            data: Rc::from(&b"beef"[..]),
            weight: 400,
            style: FontStyle::Normal,
        }
    }

    fn request(name: &str) -> FontRequest {
        FontRequest {
            name: name.to_string(),
            weight: 400,
        }
    }

    /// Resolver that counts invocations and fails for listed names.
    struct CountingResolver {
        calls: Cell<u32>,
        fail: Option<&'static str>,
    }

    impl CountingResolver {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail: None,
            }
        }
    }

    impl FontResolver for CountingResolver {
        fn resolve(
            &self,
            request: &FontRequest,
        ) -> impl Future<Output = Result<Font, FontResolutionError>> {
            self.calls.set(self.calls.get() + 1);
            let result = if self.fail == Some(request.name.as_str()) {
                Err(FontResolutionError {
                    name: request.name.clone(),
                    message: "unavailable".into(),
                })
            } else {
                Ok(font(&request.name))
            };
            core::future::ready(result)
        }
    }

    #[test]
    fn get_on_absent_key_is_none() {
        let cache = FontCache::new();
        assert!(cache.get("Inter").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn set_then_get_returns_the_same_data_by_identity() {
        let mut cache = FontCache::new();
        let inter = font("Inter");
        cache.set("Inter", inter.clone());
        let fetched = cache.get("Inter").unwrap();
        assert!(Rc::ptr_eq(&fetched.data, &inter.data));
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let mut cache = FontCache::new();
        cache.set("Inter", font("Inter"));
        let replacement = Font {
            weight: 700,
            ..font("Inter")
        };
        cache.set("Inter", replacement);
        assert_eq!(cache.get("Inter").unwrap().weight, 700);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn independent_keys_do_not_interfere() {
        let mut cache = FontCache::new();
        cache.set("Inter", font("Inter"));
        cache.set("Roboto", font("Roboto"));
        cache.remove("Inter");
        assert!(cache.get("Inter").is_none());
        assert!(cache.get("Roboto").is_some());
    }

    #[test]
    fn clearing_missing_keys_and_empty_caches_never_fails() {
        let mut cache = FontCache::new();
        cache.remove("missing");
        cache.clear();
        cache.set("Inter", font("Inter"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn pre_resolved_fonts_bypass_cache_and_resolver() {
        let cache = RefCell::new(FontCache::new());
        let spec = FontSpec::pre_resolved(vec![font("Inter")]);
        let resolved = block_on(resolve_fonts(&spec, &cache)).unwrap();
        assert_eq!(resolved.fonts.len(), 1);
        assert_eq!(resolved.cache_hits, 0);
        assert!(cache.borrow().is_empty());
    }

    #[test]
    fn resolver_runs_once_then_cache_serves_repeats() {
        let cache = RefCell::new(FontCache::new());
        let resolver = CountingResolver::new();
        let spec = FontSpec::Resolvable(vec![request("Inter")], resolver);

        let first = block_on(resolve_fonts(&spec, &cache)).unwrap();
        assert_eq!(first.cache_hits, 0);
        let second = block_on(resolve_fonts(&spec, &cache)).unwrap();
        assert_eq!(second.cache_hits, 1);

        let FontSpec::Resolvable(_, resolver) = &spec else {
            unreachable!("constructed above");
        };
        assert_eq!(resolver.calls.get(), 1, "resolver invoked exactly once");
    }

    #[test]
    fn resolver_failure_propagates_and_caches_nothing() {
        let cache = RefCell::new(FontCache::new());
        let resolver = CountingResolver {
            calls: Cell::new(0),
            fail: Some("Missing"),
        };
        let spec = FontSpec::Resolvable(vec![request("Missing")], resolver);

        let err = block_on(resolve_fonts(&spec, &cache)).unwrap_err();
        assert_eq!(err.name, "Missing");
        assert!(cache.borrow().is_empty());
    }
}
