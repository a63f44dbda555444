//! Post-inference alpha smoothing
//!
//! Segmentation output tends to have hard, jagged cutout edges. Blurring the
//! alpha channel alone softens those edges without touching color data.

use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Blur the alpha channel of an RGBA image with the given Gaussian radius
/// and reassemble the frame around it.
///
/// Callers guarantee the input is genuinely 4-channel; color channels pass
/// through untouched.
#[must_use]
pub fn smooth_alpha(image: &RgbaImage, radius: f32) -> RgbaImage {
    let (width, height) = image.dimensions();

    let mut alpha = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        alpha.put_pixel(x, y, Luma([pixel[3]]));
    }

    let blurred = image::imageops::blur(&alpha, radius);

    let mut out = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let a = blurred.get_pixel(x, y)[0];
        out.put_pixel(x, y, Rgba([pixel[0], pixel[1], pixel[2], a]));
    }
    out
}
