//! Error types for background removal operations

use thiserror::Error;

/// Result type alias for background removal operations
pub type Result<T> = std::result::Result<T, RemovalError>;

/// Error conditions surfaced by the upload/preview/download lifecycle
#[derive(Error, Debug)]
pub enum RemovalError {
    /// The upload request carried no file part at all
    #[error("no file uploaded")]
    NoFileProvided,

    /// The upload request carried a file part with an empty filename
    #[error("no file selected")]
    EmptyFilename,

    /// The requested model (and any fallback) has no usable session
    #[error("model {0} not available")]
    ModelUnavailable(String),

    /// The uploaded bytes could not be decoded as a supported image format
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The segmentation backend failed while processing the image
    #[error("inference failed: {0}")]
    Inference(String),

    /// Invalid configuration or parameters
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A download or cancel token did not resolve to a stored artifact
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding or processing errors
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl RemovalError {
    /// Create a new model-unavailable error
    pub fn model_unavailable<S: Into<String>>(name: S) -> Self {
        Self::ModelUnavailable(name.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new artifact-not-found error
    pub fn artifact_not_found<S: Into<String>>(token: S) -> Self {
        Self::ArtifactNotFound(token.into())
    }

    /// Create a file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {operation} '{path_display}': {error}"),
        ))
    }

    /// Whether this error denotes a missing artifact rather than a failure
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ArtifactNotFound(_))
    }
}
