//! Configuration types for the removal pipeline and artifact storage

use crate::error::{RemovalError, Result};
use crate::models::ModelName;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest edge an image may have when it enters inference.
///
/// Uploads larger than this are downscaled (aspect ratio preserved) so the
/// preview and the processed result stay lightweight and dimension-aligned.
pub const MAX_DIMENSION: u32 = 512;

/// Gaussian blur radius applied to the alpha channel after inference
pub const ALPHA_BLUR_RADIUS: f32 = 2.0;

/// On-disk locations for the two artifact namespaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding original (upload) artifacts
    pub upload_dir: PathBuf,
    /// Directory holding processed (background-removed) artifacts
    pub processed_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("static/uploads"),
            processed_dir: PathBuf::from("static/processed"),
        }
    }
}

/// Unified configuration for the removal processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Artifact storage locations
    pub storage: StorageConfig,
    /// Model used when the request names none
    pub default_model: ModelName,
    /// Model used when the requested one has no usable session
    pub fallback_model: ModelName,
    /// Longest edge allowed into inference
    pub max_dimension: u32,
    /// Alpha smoothing blur radius
    pub alpha_blur_radius: f32,
}

impl ProcessorConfig {
    /// Create a new processor configuration builder
    #[must_use]
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::new()
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            default_model: ModelName::IsnetGeneralUse,
            fallback_model: ModelName::U2net,
            max_dimension: MAX_DIMENSION,
            alpha_blur_radius: ALPHA_BLUR_RADIUS,
        }
    }
}

/// Builder for `ProcessorConfig`
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ProcessorConfig::default(),
        }
    }

    #[must_use]
    pub fn upload_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.storage.upload_dir = dir.into();
        self
    }

    #[must_use]
    pub fn processed_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.storage.processed_dir = dir.into();
        self
    }

    #[must_use]
    pub fn default_model(mut self, model: ModelName) -> Self {
        self.config.default_model = model;
        self
    }

    #[must_use]
    pub fn fallback_model(mut self, model: ModelName) -> Self {
        self.config.fallback_model = model;
        self
    }

    #[must_use]
    pub fn max_dimension(mut self, bound: u32) -> Self {
        self.config.max_dimension = bound;
        self
    }

    #[must_use]
    pub fn alpha_blur_radius(mut self, radius: f32) -> Self {
        self.config.alpha_blur_radius = radius;
        self
    }

    /// Build the processor configuration
    ///
    /// # Errors
    ///
    /// Returns `RemovalError` for:
    /// - A zero dimension bound
    /// - A negative blur radius
    pub fn build(self) -> Result<ProcessorConfig> {
        if self.config.max_dimension == 0 {
            return Err(RemovalError::invalid_config("max dimension must be non-zero"));
        }
        if self.config.alpha_blur_radius < 0.0 {
            return Err(RemovalError::invalid_config(
                "blur radius must be non-negative",
            ));
        }
        Ok(self.config)
    }
}

impl Default for ProcessorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
