//! Engine error types

use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug)]
pub enum GalleryError {
    // ===== Recoverable Errors (slide-local, session continues) =====
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Embedded document failed to load: {0}")]
    Embedded(String),

    #[error("Inline reference not found: {0}")]
    MissingInline(String),

    // ===== Fatal Errors (session cannot continue) =====
    #[error("Content provider unavailable: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty item collection")]
    EmptyCollection,
}

impl GalleryError {
    /// Is this error recoverable (slide-local)?
    ///
    /// Recoverable failures mark a single slide as errored; the session and
    /// its sibling slides are unaffected.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GalleryError::Io(_)
                | GalleryError::ImageDecode(_)
                | GalleryError::Fetch(_)
                | GalleryError::Embedded(_)
                | GalleryError::MissingInline(_)
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            GalleryError::ImageDecode(msg) => format!("Cannot load image: {}", msg),
            GalleryError::Fetch(msg) => format!("Cannot fetch content: {}", msg),
            GalleryError::MissingInline(reference) => {
                format!("Content not found: {}", reference)
            }
            _ => self.to_string(),
        }
    }
}

impl From<image::ImageError> for GalleryError {
    fn from(e: image::ImageError) -> Self {
        GalleryError::ImageDecode(e.to_string())
    }
}
