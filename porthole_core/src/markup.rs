// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! High-DPI rescaling of rasterizer markup.
//!
//! For device pixel ratios above 1 the scene is still rasterized at
//! *logical* dimensions — layout must not depend on the DPR — and the
//! resulting markup's outer `width`/`height` attributes are then multiplied
//! by the scale. The internal coordinate system (`viewBox` and everything
//! inside the root element) is left untouched, so the image decoder
//! rasterizes at the higher physical resolution while layout semantics are
//! preserved.
//!
//! This is a pure string transform. Markup whose root element lacks an
//! explicit `width`/`height` attribute pair passes through unchanged.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;

/// Multiplies the root element's `width` and `height` attributes by `scale`.
///
/// Returns the input unchanged when `scale` is 1, when no root element can
/// be located, when either attribute is missing, or when an attribute value
/// does not parse as a number. Never fails.
#[must_use]
pub fn rescale_markup(markup: &str, scale: f64) -> Cow<'_, str> {
    if scale == 1.0 {
        return Cow::Borrowed(markup);
    }

    let Some((tag_start, tag_end)) = root_element_span(markup) else {
        return Cow::Borrowed(markup);
    };
    let tag = &markup[tag_start..tag_end];

    let Some(width) = attribute_value_span(tag, "width") else {
        return Cow::Borrowed(markup);
    };
    let Some(height) = attribute_value_span(tag, "height") else {
        return Cow::Borrowed(markup);
    };

    let (Ok(width_value), Ok(height_value)) = (
        tag[width.0..width.1].parse::<f64>(),
        tag[height.0..height.1].parse::<f64>(),
    ) else {
        return Cow::Borrowed(markup);
    };

    // Splice the two value ranges, in document order, into a fresh string.
    let (first, second) = if width.0 < height.0 {
        (width, height)
    } else {
        (height, width)
    };
    let (first_value, second_value) = if width.0 < height.0 {
        (width_value * scale, height_value * scale)
    } else {
        (height_value * scale, width_value * scale)
    };

    let mut out = String::with_capacity(markup.len() + 8);
    out.push_str(&markup[..tag_start + first.0]);
    out.push_str(&format!("{first_value}"));
    out.push_str(&markup[tag_start + first.1..tag_start + second.0]);
    out.push_str(&format!("{second_value}"));
    out.push_str(&markup[tag_start + second.1..]);
    Cow::Owned(out)
}

/// Byte span of the root element's opening tag, excluding the final `>`.
///
/// Skips the XML declaration, processing instructions, comments, and
/// doctypes that may precede the root element.
fn root_element_span(markup: &str) -> Option<(usize, usize)> {
    let bytes = markup.as_bytes();
    let mut at = 0;
    while let Some(rel) = markup[at..].find('<') {
        let start = at + rel;
        match bytes.get(start + 1) {
            Some(b'?' | b'!') => {
                let close = markup[start..].find('>')?;
                at = start + close + 1;
            }
            Some(_) => {
                let close = markup[start..].find('>')?;
                return Some((start, start + close));
            }
            None => return None,
        }
    }
    None
}

/// Byte span of the quoted value of `name="..."` (or single-quoted) within
/// an opening tag, excluding the quotes.
///
/// Walks the tag attribute by attribute, skipping over each quoted value,
/// so a lookalike inside another attribute's value never matches and
/// `stroke-width` never matches `width`.
fn attribute_value_span(tag: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = tag.as_bytes();
    // Skip `<` and the element name.
    let mut at = 1;
    while at < bytes.len() && !bytes[at].is_ascii_whitespace() {
        at += 1;
    }
    while at < bytes.len() {
        while at < bytes.len() && bytes[at].is_ascii_whitespace() {
            at += 1;
        }
        let attribute_start = at;
        while at < bytes.len() && !bytes[at].is_ascii_whitespace() && bytes[at] != b'=' {
            at += 1;
        }
        if at == attribute_start {
            break;
        }
        let attribute = &tag[attribute_start..at];
        while at < bytes.len() && bytes[at].is_ascii_whitespace() {
            at += 1;
        }
        if at >= bytes.len() || bytes[at] != b'=' {
            // Bare attribute (or a trailing `/`); move to the next one.
            continue;
        }
        at += 1;
        while at < bytes.len() && bytes[at].is_ascii_whitespace() {
            at += 1;
        }
        let quote = match bytes.get(at) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return None,
        };
        let value_start = at + 1;
        let close = tag[value_start..].find(char::from(quote))?;
        if attribute == name {
            return Some((value_start, value_start + close));
        }
        at = value_start + close + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str =
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="480" viewBox="0 0 640 480"><rect width="10"/></svg>"#;

    #[test]
    fn unit_scale_is_borrowed_passthrough() {
        assert!(matches!(rescale_markup(SVG, 1.0), Cow::Borrowed(_)));
    }

    #[test]
    fn doubles_outer_dimensions_only() {
        let scaled = rescale_markup(SVG, 2.0);
        assert!(scaled.contains(r#"width="1280""#));
        assert!(scaled.contains(r#"height="960""#));
        // Internal coordinate system and inner elements are untouched.
        assert!(scaled.contains(r#"viewBox="0 0 640 480""#));
        assert!(scaled.contains(r#"<rect width="10"/>"#));
    }

    #[test]
    fn fractional_scale_and_dimensions() {
        let svg = r#"<svg width="1.5" height="1">x</svg>"#;
        let scaled = rescale_markup(svg, 2.0);
        assert!(scaled.contains(r#"width="3""#));
        assert!(scaled.contains(r#"height="2""#));
    }

    #[test]
    fn missing_attribute_pair_passes_through() {
        let bare = r#"<svg viewBox="0 0 10 10"><g/></svg>"#;
        assert_eq!(rescale_markup(bare, 2.0), bare);
        let width_only = r#"<svg width="10"><g/></svg>"#;
        assert_eq!(rescale_markup(width_only, 2.0), width_only);
    }

    #[test]
    fn skips_xml_declaration_and_comments() {
        let svg = "<?xml version=\"1.0\"?><!-- hi --><svg width=\"10\" height=\"20\"/>";
        let scaled = rescale_markup(svg, 3.0);
        assert!(scaled.contains(r#"width="30""#));
        assert!(scaled.contains(r#"height="60""#));
        assert!(scaled.starts_with("<?xml"));
    }

    #[test]
    fn single_quoted_attributes_are_recognized() {
        let svg = "<svg width='8' height='4'/>";
        let scaled = rescale_markup(svg, 2.0);
        assert!(scaled.contains("width='16'"));
        assert!(scaled.contains("height='8'"));
    }

    #[test]
    fn lookalikes_inside_other_attribute_values_do_not_match() {
        let svg = r#"<svg data-label="keep width = '5' here" width="10" height="20"/>"#;
        let scaled = rescale_markup(svg, 2.0);
        assert!(scaled.contains(r#"data-label="keep width = '5' here""#));
        assert!(scaled.contains(r#"width="20""#));
        assert!(scaled.contains(r#"height="40""#));
    }

    #[test]
    fn hyphenated_lookalikes_do_not_match() {
        let svg = r#"<svg stroke-width="2" viewBox="0 0 1 1"/>"#;
        assert_eq!(rescale_markup(svg, 2.0), svg);
    }

    #[test]
    fn unparseable_values_pass_through() {
        let svg = r#"<svg width="100%" height="480"/>"#;
        assert_eq!(rescale_markup(svg, 2.0), svg);
    }
}
