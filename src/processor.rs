//! Removal pipeline orchestration and the request-facing surface
//!
//! `RemovalProcessor` sequences the whole upload path: persist the upload,
//! decode, normalize orientation, preprocess for the selected model, run
//! inference, smooth the cutout, restore dimensions, persist the result.
//! It also owns the error-path contract: once the original artifact exists,
//! any later failure deletes it before the error propagates, so no upload
//! is ever stranded on disk silently.

use crate::{
    artifacts::{ArtifactKind, ArtifactStore, Download},
    config::ProcessorConfig,
    error::{RemovalError, Result},
    models::{ModelName, ModelRegistry},
    utils::{orientation, postprocessing, preprocessing},
};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// An uploaded file as handed over by the presentation shell
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename; only its extension is ever trusted
    pub filename: String,
    /// Raw encoded image bytes
    pub bytes: Vec<u8>,
}

/// Tokens and dimensions returned by a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    /// Token of the stored original (preview base) artifact
    pub original_token: String,
    /// Token of the stored processed artifact
    pub processed_token: String,
    /// Shared pixel width of both artifacts
    pub width: u32,
    /// Shared pixel height of both artifacts
    pub height: u32,
}

/// Orchestrates the removal pipeline over a shared model registry and an
/// artifact store.
///
/// The processor is stateless between requests; everything a later request
/// needs travels in the returned tokens. One instance is safely shared across
/// concurrent requests.
pub struct RemovalProcessor {
    config: ProcessorConfig,
    registry: Arc<ModelRegistry>,
    store: ArtifactStore,
}

impl RemovalProcessor {
    /// Create a processor over an initialized registry
    #[must_use]
    pub fn new(config: ProcessorConfig, registry: Arc<ModelRegistry>) -> Self {
        let store = ArtifactStore::new(config.storage.clone());
        Self {
            config,
            registry,
            store,
        }
    }

    /// The underlying artifact store
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The processor configuration
    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Handle an upload request end to end.
    ///
    /// Validates the file part, then runs [`Self::process`].
    ///
    /// # Errors
    /// - `NoFileProvided` when the request carried no file part
    /// - `EmptyFilename` when the file part has an empty name
    /// - everything `process` can return
    pub async fn upload(
        &self,
        file: Option<UploadedFile>,
        model_selector: Option<&str>,
    ) -> Result<UploadOutcome> {
        let file = file.ok_or(RemovalError::NoFileProvided)?;
        if file.filename.is_empty() {
            return Err(RemovalError::EmptyFilename);
        }
        self.process(&file.filename, &file.bytes, model_selector)
            .await
    }

    /// Run the full pipeline on raw image bytes.
    ///
    /// On success both artifacts exist on disk with identical pixel
    /// dimensions and their tokens are returned. On any failure after the
    /// original artifact was written, that artifact is deleted before the
    /// error propagates.
    ///
    /// # Errors
    /// - `ModelUnavailable` for an unknown selector or when neither the
    ///   selected model nor the fallback has a usable session
    /// - `Decode` when the bytes are not a supported image
    /// - `Inference` when the segmentation backend fails
    /// - `Io` / `Image` for storage and encoding failures
    #[instrument(skip(self, bytes), fields(model = model_selector.unwrap_or("default"), size = bytes.len()))]
    pub async fn process(
        &self,
        filename: &str,
        bytes: &[u8],
        model_selector: Option<&str>,
    ) -> Result<UploadOutcome> {
        // An unknown selector fails before any artifact exists; the model set
        // is closed and never silently rerouted.
        let model = match model_selector {
            None | Some("") => self.config.default_model,
            Some(name) => ModelName::parse(name)?,
        };

        self.store.ensure_dirs().await?;

        let original_token = ArtifactStore::new_token(extension_of(filename));
        self.store
            .save(ArtifactKind::Original, &original_token, bytes)
            .await?;

        match self.run_pipeline(&original_token, bytes, model).await {
            Ok((processed_token, width, height)) => {
                info!(
                    original = %original_token,
                    processed = %processed_token,
                    width,
                    height,
                    "upload processed"
                );
                Ok(UploadOutcome {
                    original_token,
                    processed_token,
                    width,
                    height,
                })
            },
            Err(e) => {
                if let Err(cleanup) = self
                    .store
                    .remove(ArtifactKind::Original, &original_token)
                    .await
                {
                    warn!(token = %original_token, error = %cleanup, "failed to clean up original artifact");
                }
                Err(e)
            },
        }
    }

    /// Stage the processed artifact for transfer and clean up the session
    ///
    /// # Errors
    /// Returns `ArtifactNotFound` for a stale or unknown processed token.
    pub async fn download(
        &self,
        processed_token: &str,
        original_token: Option<&str>,
    ) -> Result<Download> {
        self.store
            .finalize_download(processed_token, original_token)
            .await
    }

    /// Discard a previewed session without downloading
    ///
    /// # Errors
    /// Returns `RemovalError::Io` only for real filesystem failures; absent
    /// artifacts are a successful no-op.
    pub async fn cancel(&self, original_token: &str, processed_token: &str) -> Result<()> {
        self.store.cancel(original_token, processed_token).await
    }

    /// Pipeline stages between "original persisted" and "processed
    /// persisted"; the caller owns cleanup when this fails.
    async fn run_pipeline(
        &self,
        original_token: &str,
        bytes: &[u8],
        model: ModelName,
    ) -> Result<(String, u32, u32)> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| RemovalError::decode(e.to_string()))?;
        let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

        let oriented = orientation::normalize(rgb, bytes);
        let prepared = preprocessing::preprocess(&oriented, model, self.config.max_dimension);
        let (width, height) = prepared.dimensions();

        // The stored original becomes the resized, reoriented version so the
        // preview shares the processed result's coordinate space.
        let display_bytes = encode_image(&prepared, extension_of(original_token))?;
        self.store
            .save(ArtifactKind::Original, original_token, &display_bytes)
            .await?;

        let session = self
            .registry
            .resolve(model, self.config.fallback_model)
            .ok_or_else(|| RemovalError::model_unavailable(model.as_str()))?;
        debug!(session = %session.describe(), "running segmentation");

        let segmented = session.segment(&prepared)?;
        let rgba = segmented.to_rgba8();

        let smoothed = postprocessing::smooth_alpha(&rgba, self.config.alpha_blur_radius);

        // Inference may change dimensions; pin the result back to the
        // preview's exact size.
        let restored =
            DynamicImage::ImageRgba8(smoothed).resize_exact(width, height, FilterType::Lanczos3);

        let processed_token = ArtifactStore::new_token("png");
        let processed_bytes = encode_image(&restored, "png")?;
        self.store
            .save(ArtifactKind::Processed, &processed_token, &processed_bytes)
            .await?;

        Ok((processed_token, width, height))
    }
}

impl std::fmt::Debug for RemovalProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalProcessor")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Encode an image to the format implied by a file extension, defaulting to
/// PNG for unknown or missing extensions
fn encode_image(image: &DynamicImage, extension: &str) -> Result<Vec<u8>> {
    let format = ImageFormat::from_extension(extension).unwrap_or(ImageFormat::Png);
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// Extension of a client-supplied filename or token, without the dot
fn extension_of(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}
