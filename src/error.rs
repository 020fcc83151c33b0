//! Error taxonomy shared by the asset store, the GitHub client and the
//! compositing engine.

/// Convenience result type used across the crate.
pub type FrameResult<T> = Result<T, FrameError>;

/// Everything that can go wrong between reading a request and encoding the
/// framed image.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// A request parameter was missing, malformed or out of range.
    #[error("invalid `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The requested theme has no `frame.png` in the asset store.
    #[error("Theme '{0}' not found.")]
    ThemeNotFound(String),

    /// The remote source answered 404 for the identifier.
    #[error("user `{0}` not found")]
    UserNotFound(String),

    /// Connection reset, refused or timed out. Worth retrying.
    #[error("upstream temporarily unavailable: {0}")]
    Transient(String),

    /// The remote source answered with an unexpected status.
    #[error("upstream returned status {status} for {url}")]
    Upstream { status: u16, url: String },

    /// The bundled fallback image is gone; there is nothing left to serve.
    #[error("fallback image not found at {0}")]
    FallbackMissing(String),

    /// The `frames/` directory itself is missing from the asset root.
    #[error("frames directory not found at {0}")]
    FramesDirMissing(String),

    /// Decoding or encoding a raster image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Parsing or rendering an SVG document failed.
    #[error("svg error: {0}")]
    Svg(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Build a [`FrameError::Validation`] value.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Build a [`FrameError::Svg`] value.
    pub fn svg(message: impl Into<String>) -> Self {
        Self::Svg(message.into())
    }

    /// Returns true for failures a client may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
