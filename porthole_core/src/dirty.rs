// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! A session tracks its inputs through multi-channel dirty tracking (via
//! [`understory_dirty`]), one channel per input category. All channels are
//! local-only — there is a single tracked key (the session itself) and no
//! dependency edges, so marking never propagates.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Each
//! [`InputTracker::drain`](crate::session::InputTracker::drain) call drains
//! all channels and surfaces the result as
//! [`InputChanges`](crate::session::InputChanges), which the session's
//! commit dispatch consumes: [`SCENE`], [`GEOMETRY`], or [`FONTS`] schedule
//! a render cycle ([`GEOMETRY`] additionally resizes the surface and relay),
//! and [`AUDIO`] swaps the capture stream's audio tracks.

use understory_dirty::Channel;

/// Scene description changed — the surface must be repainted.
pub const SCENE: Channel = Channel::new(0);

/// Width, height, or device pixel ratio changed — the surface backing store
/// and relay sizing must be recomputed, then repainted. Debug visibility is
/// not tracked; it applies to the canvas immediately.
pub const GEOMETRY: Channel = Channel::new(1);

/// Font specification changed — fonts must be re-resolved and the surface
/// repainted.
pub const FONTS: Channel = Channel::new(2);

/// Audio source changed — capture-stream audio tracks must be swapped.
pub const AUDIO: Channel = Channel::new(3);
