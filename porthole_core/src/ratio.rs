// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal integer sizing for the relay element.
//!
//! The hidden relay `<video>` exists only so the platform has a video-backed
//! element to project into the Picture-in-Picture window. Giving it the
//! smallest integer width/height with the same aspect ratio keeps compositing
//! cost for the invisible element near zero while still satisfying the
//! aspect-ratio contract the platform expects from a video source.

use alloc::format;

/// An integer width/height pair in lowest terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StreamSize {
    /// Reduced width.
    pub width: u64,
    /// Reduced height.
    pub height: u64,
}

/// Reduces a width/height pair to the smallest integer pair with the same
/// aspect ratio.
///
/// Fractional inputs are scaled to integers first: each value's minimal
/// decimal-place count is taken from its shortest round-trip decimal form
/// (Rust's `Display` for `f64` never emits exponent notation, so this covers
/// exponential inputs too), both values are multiplied by `10^max(places)`,
/// and the pair is reduced by its greatest common divisor.
///
/// Any input that is `NaN`, infinite, zero, or negative yields `{1, 1}`.
/// Deterministic and side-effect-free.
#[must_use]
pub fn minimal_stream_size(width: f64, height: f64) -> StreamSize {
    if !is_usable(width) || !is_usable(height) {
        return StreamSize {
            width: 1,
            height: 1,
        };
    }

    let places = decimal_places(width).max(decimal_places(height));
    let mut scale = 1.0_f64;
    for _ in 0..places {
        scale *= 10.0;
    }

    let w = scale_to_integer(width, scale);
    let h = scale_to_integer(height, scale);

    let divisor = match gcd(w, h) {
        0 => 1,
        d => d,
    };

    StreamSize {
        width: (w / divisor).max(1),
        height: (h / divisor).max(1),
    }
}

fn is_usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Number of digits after the decimal point in the shortest decimal form.
fn decimal_places(value: f64) -> usize {
    let text = format!("{value}");
    match text.find('.') {
        Some(dot) => text.len() - dot - 1,
        None => 0,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "inputs are positive finite; the saturating float-to-int cast is the rounding step"
)]
fn scale_to_integer(value: f64, scale: f64) -> u64 {
    (value * scale + 0.5) as u64
}

/// Euclidean greatest common divisor.
const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let next = a % b;
        a = b;
        b = next;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(width: u64, height: u64) -> StreamSize {
        StreamSize { width, height }
    }

    #[test]
    fn reduces_common_video_dimensions() {
        assert_eq!(minimal_stream_size(640.0, 480.0), size(4, 3));
        assert_eq!(minimal_stream_size(1920.0, 1080.0), size(16, 9));
        assert_eq!(minimal_stream_size(500.0, 500.0), size(1, 1));
    }

    #[test]
    fn coprime_pair_is_unchanged() {
        assert_eq!(minimal_stream_size(7.0, 13.0), size(7, 13));
    }

    #[test]
    fn fractional_inputs_scale_before_reduction() {
        assert_eq!(minimal_stream_size(1.5, 1.0), size(3, 2));
        assert_eq!(minimal_stream_size(6.4, 4.8), size(4, 3));
    }

    #[test]
    fn degenerate_inputs_fall_back_to_unit() {
        for bad in [0.0, -640.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(minimal_stream_size(bad, 480.0), size(1, 1), "width {bad}");
            assert_eq!(minimal_stream_size(640.0, bad), size(1, 1), "height {bad}");
        }
    }

    #[test]
    fn results_are_in_lowest_terms_with_preserved_ratio() {
        let cases = [
            (640.0, 480.0),
            (1920.0, 1080.0),
            (1.5, 1.0),
            (6.4, 4.8),
            (2560.0, 1440.0),
            (0.25, 0.75),
        ];
        for (w, h) in cases {
            let reduced = minimal_stream_size(w, h);
            assert_eq!(
                gcd(reduced.width, reduced.height),
                1,
                "({w}, {h}) not in lowest terms"
            );
            #[expect(clippy::cast_precision_loss, reason = "test values are small")]
            let drift = reduced.width as f64 / reduced.height as f64 - w / h;
            assert!(drift > -1e-9 && drift < 1e-9, "({w}, {h}) ratio drifted");
        }
    }
}
