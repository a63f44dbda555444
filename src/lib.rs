#![allow(clippy::uninlined_format_args)]

//! # bgcut
//!
//! Core library for a background-removal service: a client submits an image,
//! the crate runs it through a segmentation model, and returns a
//! transparent-background result for preview and download.
//!
//! The segmentation model itself is a pluggable collaborator behind the
//! [`SegmentationSession`] trait. What this crate owns is everything around
//! it:
//!
//! - **Transform pipeline**: orientation normalization from EXIF metadata,
//!   bounded resizing with per-model contrast/sharpness enhancement, alpha
//!   smoothing of the cutout, and restoration of the preview dimensions.
//! - **Artifact lifecycle**: each upload leaves two files on disk (original
//!   and processed), identified only by opaque filename tokens that the
//!   client carries between stateless requests. Download and cancel are the
//!   terminal transitions; every exit path, including mid-pipeline failure,
//!   cleans up the files it is responsible for.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bgcut::{
//!     backends::MockSessionFactory, ModelName, ModelRegistry, ProcessorConfig,
//!     RemovalProcessor, UploadedFile,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> bgcut::Result<()> {
//! // Load one session per supported model, once, at startup.
//! let factory = MockSessionFactory::new();
//! let registry = Arc::new(ModelRegistry::initialize(&factory, &ModelName::ALL));
//!
//! let config = ProcessorConfig::builder()
//!     .upload_dir("static/uploads")
//!     .processed_dir("static/processed")
//!     .build()?;
//! let processor = RemovalProcessor::new(config, registry);
//!
//! // Upload: produces a preview pair addressed by opaque tokens.
//! let file = UploadedFile {
//!     filename: "photo.jpg".to_string(),
//!     bytes: std::fs::read("photo.jpg")?,
//! };
//! let outcome = processor.upload(Some(file), Some("isnet-general-use")).await?;
//!
//! // Later, a download (or cancel) finishes the session and cleans up.
//! let download = processor
//!     .download(&outcome.processed_token, Some(&outcome.original_token))
//!     .await?;
//! std::fs::write(&download.file_name, &download.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Statelessness
//!
//! There is no session store. The filename tokens returned by
//! [`RemovalProcessor::upload`] are the only handle a client ever holds, and
//! each is redeemable exactly once per lifecycle transition. A token
//! presented after its session ended resolves to
//! [`RemovalError::ArtifactNotFound`], never to a crash.

pub mod artifacts;
pub mod backends;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod processor;
pub mod utils;

// Public API exports
pub use artifacts::{ArtifactKind, ArtifactStore, Download};
pub use config::{ProcessorConfig, ProcessorConfigBuilder, StorageConfig};
pub use error::{RemovalError, Result};
pub use inference::{SegmentationSession, SessionFactory};
pub use models::{ModelName, ModelRegistry};
pub use processor::{RemovalProcessor, UploadOutcome, UploadedFile};
