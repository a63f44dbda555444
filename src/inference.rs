//! Segmentation backend abstraction
//!
//! Inference itself is an external collaborator: the pipeline hands a
//! 3-channel image to a [`SegmentationSession`] and gets back an image whose
//! alpha channel marks background as transparent. How the session does that
//! (ONNX Runtime, a remote service, a test stub) is opaque to this crate.

use crate::error::Result;
use crate::models::ModelName;
use image::DynamicImage;
use std::sync::Arc;

/// A pre-initialized handle to a named segmentation model.
///
/// Sessions are created once at registry initialization, are immutable
/// afterwards, and are shared read-only across concurrent requests. No
/// locking is required around them.
pub trait SegmentationSession: Send + Sync {
    /// Run segmentation on a 3-channel color image.
    ///
    /// Returns an image carrying an alpha channel in which background pixels
    /// are transparent. The output need not match the input dimensions; the
    /// pipeline restores dimensions afterwards.
    ///
    /// # Errors
    /// - Model inference failures
    /// - Resource exhaustion inside the backend
    fn segment(&self, image: &DynamicImage) -> Result<DynamicImage>;

    /// Human-readable label for diagnostics
    fn describe(&self) -> String {
        "segmentation session".to_string()
    }
}

/// Factory for constructing one session per supported model name.
///
/// Construction may allocate significant memory or compute resources; the
/// registry calls it exactly once per name at process start.
pub trait SessionFactory: Send + Sync {
    /// Construct a session for the given model.
    ///
    /// # Errors
    /// - Model weights missing or corrupt
    /// - Backend initialization failures
    fn create_session(&self, model: ModelName) -> Result<Arc<dyn SegmentationSession>>;
}
