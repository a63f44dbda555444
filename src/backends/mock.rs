//! Mock segmentation backend for testing and debugging

use crate::error::{RemovalError, Result};
use crate::inference::{SegmentationSession, SessionFactory};
use crate::models::ModelName;
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashSet;
use std::sync::Arc;

/// Mock session that cuts out a centered ellipse
///
/// Pixels inside an ellipse spanning the middle of the frame keep their color
/// and stay opaque; everything outside becomes fully transparent. Useful for
/// exercising the pipeline without model files: the output always contains
/// both opaque and transparent regions for any input larger than a few pixels.
#[derive(Debug, Clone)]
pub struct MockSession {
    model: ModelName,
}

impl MockSession {
    /// Create a mock session labelled with the given model name
    #[must_use]
    pub fn new(model: ModelName) -> Self {
        Self { model }
    }
}

impl SegmentationSession for MockSession {
    fn segment(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(RemovalError::inference("empty input image"));
        }

        let cx = f64::from(width) / 2.0;
        let cy = f64::from(height) / 2.0;
        let rx = f64::from(width) / 3.0;
        let ry = f64::from(height) / 3.0;

        let mut out = RgbaImage::new(width, height);
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let dx = (f64::from(x) - cx) / rx;
            let dy = (f64::from(y) - cy) / ry;
            let alpha = if dx * dx + dy * dy <= 1.0 { 255 } else { 0 };
            out.put_pixel(x, y, Rgba([pixel[0], pixel[1], pixel[2], alpha]));
        }

        Ok(DynamicImage::ImageRgba8(out))
    }

    fn describe(&self) -> String {
        format!("mock session for {}", self.model)
    }
}

/// Session that always fails inference, for error-path testing
#[derive(Debug, Clone, Default)]
pub struct FailingSession;

impl SegmentationSession for FailingSession {
    fn segment(&self, _image: &DynamicImage) -> Result<DynamicImage> {
        Err(RemovalError::inference("mock backend configured to fail"))
    }

    fn describe(&self) -> String {
        "failing mock session".to_string()
    }
}

/// Factory producing [`MockSession`]s, with configurable per-model failures
#[derive(Debug, Clone, Default)]
pub struct MockSessionFactory {
    failing_creation: HashSet<ModelName>,
    failing_inference: HashSet<ModelName>,
}

impl MockSessionFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make session construction fail for `model`, simulating a model that
    /// could not be loaded at startup
    #[must_use]
    pub fn failing(mut self, model: ModelName) -> Self {
        self.failing_creation.insert(model);
        self
    }

    /// Make inference (not construction) fail for `model`
    #[must_use]
    pub fn failing_inference(mut self, model: ModelName) -> Self {
        self.failing_inference.insert(model);
        self
    }
}

impl SessionFactory for MockSessionFactory {
    fn create_session(&self, model: ModelName) -> Result<Arc<dyn SegmentationSession>> {
        if self.failing_creation.contains(&model) {
            return Err(RemovalError::inference(format!(
                "mock factory refused to load {model}"
            )));
        }
        if self.failing_inference.contains(&model) {
            return Ok(Arc::new(FailingSession));
        }
        Ok(Arc::new(MockSession::new(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_mock_session_adds_transparency() {
        let session = MockSession::new(ModelName::U2net);
        let input = DynamicImage::new_rgb8(64, 48);

        let output = session.segment(&input).unwrap();
        assert_eq!(output.dimensions(), (64, 48));

        let rgba = output.to_rgba8();
        // Center is inside the ellipse, corner is outside.
        assert_eq!(rgba.get_pixel(32, 24)[3], 255);
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_mock_session_rejects_empty_input() {
        let session = MockSession::new(ModelName::U2net);
        let input = DynamicImage::new_rgb8(0, 0);
        assert!(session.segment(&input).is_err());
    }

    #[test]
    fn test_failing_session() {
        let session = FailingSession;
        let input = DynamicImage::new_rgb8(8, 8);
        let err = session.segment(&input).unwrap_err();
        assert!(matches!(err, RemovalError::Inference(_)));
    }
}
