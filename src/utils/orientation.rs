//! Orientation normalization from embedded rotation metadata
//!
//! Cameras record the intended viewing orientation in the EXIF Orientation
//! tag instead of rotating pixel data. This module applies the corresponding
//! rotation so every downstream stage sees pixels in viewing orientation.
//! Missing or malformed metadata degrades silently to the identity transform;
//! it never fails a request.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Rotate `image` according to the Orientation tag found in `raw_bytes`.
///
/// Returns the image unchanged when no usable tag is present.
#[must_use]
pub fn normalize(image: DynamicImage, raw_bytes: &[u8]) -> DynamicImage {
    match orientation_value(raw_bytes) {
        Some(value) => apply(image, value),
        None => image,
    }
}

/// Apply the rotation associated with an Orientation tag value.
///
/// Values 6 and 8 are mapped inversely to the usual EXIF correction
/// (6 → 270°, 8 → 90°); stored previews depend on this exact mapping.
/// Angles follow the `image` crate's clockwise convention — `rotate270`
/// is 270° clockwise, where a library with counter-clockwise `rotate`
/// semantics (PIL, for one) would produce the mirror-direction result
/// for the same nominal angle. Unknown values leave the image untouched.
#[must_use]
pub fn apply(image: DynamicImage, value: u32) -> DynamicImage {
    match value {
        3 => image.rotate180(),
        6 => image.rotate270(),
        8 => image.rotate90(),
        _ => image,
    }
}

/// Extract the primary Orientation tag value from encoded image bytes
fn orientation_value(raw_bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(raw_bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(error = %e, "no readable orientation metadata");
            return None;
        },
    };

    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let value = field.value.get_uint(0);
    if value.is_none() {
        debug!("orientation tag present but not numeric");
    }
    value
}
