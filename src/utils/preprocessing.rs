//! Pre-inference resizing and enhancement
//!
//! Before an image reaches a segmentation session it is bounded to a fixed
//! maximum edge length and run through contrast and sharpness enhancement
//! tuned per model. Everything in here is a pure, deterministic pixel
//! transform with no I/O.

use crate::models::ModelName;
use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};

/// Smoothing kernel used as the reference image for sharpness interpolation
const SMOOTH_KERNEL: [f32; 9] = [
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    5.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
];

/// Bound dimensions and enhance per the selected model.
///
/// The result never exceeds `max_dimension` on either edge and is never
/// larger than the input; images already inside the bound keep their exact
/// dimensions.
#[must_use]
pub fn preprocess(image: &DynamicImage, model: ModelName, max_dimension: u32) -> DynamicImage {
    let bounded = bound_dimensions(image, max_dimension);
    let (contrast, sharpness) = model.enhancement_factors();

    let rgb = bounded.to_rgb8();
    let enhanced = enhance_sharpness(&enhance_contrast(&rgb, contrast), sharpness);
    DynamicImage::ImageRgb8(enhanced)
}

/// Downscale so both edges fit within `bound`, preserving aspect ratio.
/// Never upscales.
#[must_use]
pub fn bound_dimensions(image: &DynamicImage, bound: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= bound && height <= bound {
        image.clone()
    } else {
        image.resize(bound, bound, FilterType::Lanczos3)
    }
}

/// Scale contrast by interpolating each pixel against the image's mean
/// luminance: a factor of 1.0 is the identity, larger pushes channels away
/// from the mean.
#[must_use]
pub fn enhance_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luminance(image).round();
    let mut out = RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let channels = [
            interpolate(mean, f32::from(pixel[0]), factor),
            interpolate(mean, f32::from(pixel[1]), factor),
            interpolate(mean, f32::from(pixel[2]), factor),
        ];
        out.put_pixel(x, y, Rgb(channels));
    }
    out
}

/// Scale sharpness by interpolating each pixel against a smoothed copy of
/// the image: a factor of 1.0 is the identity, larger amplifies detail.
/// The outermost pixel ring has no full 3x3 neighborhood and passes through
/// unchanged.
#[must_use]
pub fn enhance_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let smoothed = image::imageops::filter3x3(image, &SMOOTH_KERNEL);
    let (width, height) = image.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            out.put_pixel(x, y, *pixel);
            continue;
        }
        let smooth = smoothed.get_pixel(x, y);
        let channels = [
            interpolate(f32::from(smooth[0]), f32::from(pixel[0]), factor),
            interpolate(f32::from(smooth[1]), f32::from(pixel[1]), factor),
            interpolate(f32::from(smooth[2]), f32::from(pixel[2]), factor),
        ];
        out.put_pixel(x, y, Rgb(channels));
    }
    out
}

/// Linear interpolation from `base` towards (and past) `value`, clamped to u8
fn interpolate(base: f32, value: f32, factor: f32) -> u8 {
    (base + (value - base) * factor).clamp(0.0, 255.0) as u8
}

/// Mean luminance over the whole frame (ITU-R 601 weights)
fn mean_luminance(image: &RgbImage) -> f32 {
    let pixel_count = u64::from(image.width()) * u64::from(image.height());
    if pixel_count == 0 {
        return 0.0;
    }
    let sum: f64 = image
        .pixels()
        .map(|p| {
            (299.0 * f64::from(p[0]) + 587.0 * f64::from(p[1]) + 114.0 * f64::from(p[2])) / 1000.0
        })
        .sum();
    (sum / pixel_count as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_downscale_bounds_long_edge() {
        let image = gradient_image(1024, 768);
        let result = preprocess(&image, ModelName::IsnetGeneralUse, 512);

        let (w, h) = result.dimensions();
        assert!(w <= 512 && h <= 512);
        assert_eq!((w, h), (512, 384), "aspect ratio must be preserved");
    }

    #[test]
    fn test_never_upscales() {
        let image = gradient_image(100, 50);
        let result = preprocess(&image, ModelName::U2net, 512);
        assert_eq!(result.dimensions(), (100, 50));
    }

    #[test]
    fn test_bound_exact_fit_is_untouched() {
        let image = gradient_image(512, 512);
        let bounded = bound_dimensions(&image, 512);
        assert_eq!(bounded.dimensions(), (512, 512));
    }

    #[test]
    fn test_contrast_is_identity_on_uniform_image() {
        let uniform = RgbImage::from_pixel(16, 16, Rgb([120, 120, 120]));
        let enhanced = enhance_contrast(&uniform, 1.5);
        // Every pixel sits at the mean, so there is nothing to push apart.
        assert_eq!(enhanced, uniform);
    }

    #[test]
    fn test_sharpness_is_identity_on_uniform_image() {
        let uniform = RgbImage::from_pixel(16, 16, Rgb([90, 90, 90]));
        let enhanced = enhance_sharpness(&uniform, 1.5);
        assert_eq!(enhanced, uniform);
    }

    #[test]
    fn test_sharpness_leaves_border_ring_unchanged() {
        let img = RgbImage::from_fn(8, 6, |x, y| {
            Rgb([(x * 30) as u8, (y * 40) as u8, ((x + y) * 10) as u8])
        });

        let enhanced = enhance_sharpness(&img, 1.5);
        for x in 0..8 {
            assert_eq!(enhanced.get_pixel(x, 0), img.get_pixel(x, 0));
            assert_eq!(enhanced.get_pixel(x, 5), img.get_pixel(x, 5));
        }
        for y in 0..6 {
            assert_eq!(enhanced.get_pixel(0, y), img.get_pixel(0, y));
            assert_eq!(enhanced.get_pixel(7, y), img.get_pixel(7, y));
        }
    }

    #[test]
    fn test_sharpness_amplifies_interior_detail() {
        // Dark cross on a bright field; the center pixel sits below its
        // smoothed neighborhood and must move further down when sharpened.
        let mut img = RgbImage::from_pixel(5, 5, Rgb([200, 200, 200]));
        img.put_pixel(2, 2, Rgb([50, 50, 50]));

        let enhanced = enhance_sharpness(&img, 1.5);
        assert!(enhanced.get_pixel(2, 2)[0] < 50);
    }

    #[test]
    fn test_contrast_factor_spreads_values() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([100, 100, 100]));
        img.put_pixel(1, 0, Rgb([200, 200, 200]));

        let enhanced = enhance_contrast(&img, 1.5);
        let low = enhanced.get_pixel(0, 0)[0];
        let high = enhanced.get_pixel(1, 0)[0];
        assert!(low < 100, "dark pixel must move away from the mean");
        assert!(high > 200, "bright pixel must move away from the mean");
    }

    #[test]
    fn test_model_factors_produce_distinct_output() {
        let image = gradient_image(64, 64);
        let general = preprocess(&image, ModelName::IsnetGeneralUse, 512);
        let animal = preprocess(&image, ModelName::IsnetAnimal, 512);
        assert_ne!(general.to_rgb8(), animal.to_rgb8());
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let image = gradient_image(96, 64);
        let a = preprocess(&image, ModelName::IsnetAnimal, 512);
        let b = preprocess(&image, ModelName::IsnetAnimal, 512);
        assert_eq!(a.to_rgb8(), b.to_rgb8());
    }
}
