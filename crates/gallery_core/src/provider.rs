//! Content provider interface and the filesystem-backed implementation
//!
//! The provider performs the actual IO (image probing, fragment fetching,
//! embedded-document readiness) on the loader's worker thread. Rendering is
//! not a provider concern; the engine only needs dimensions and payloads.

use crate::error::GalleryError;
use image::ImageReader;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token for in-flight loads.
///
/// Resetting a slide cancels its token; a cancelled load is an abort, never
/// an error.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of probing an image source
#[derive(Debug, Clone, Copy)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Blocking IO surface executed on the loader worker thread
pub trait ContentProvider: Send + Sync + 'static {
    /// Decode enough of an image to learn its dimensions
    fn load_image(&self, url: &str, cancel: &CancelToken) -> Result<ImageInfo, GalleryError>;

    /// GET-style fetch of a remote fragment. `settings` carries the
    /// configured request options plus the gallery marker field.
    fn fetch_fragment(
        &self,
        url: &str,
        settings: &serde_json::Value,
        cancel: &CancelToken,
    ) -> Result<String, GalleryError>;

    /// Wait for an embedded document's load-or-error signal and measure its
    /// content box. `Ok(None)` means loaded but unmeasurable (cross-origin).
    fn probe_embedded(&self, src: &str) -> Result<Option<(u32, u32)>, GalleryError>;

    /// Resolve an inline reference to its markup, if present in the document
    fn resolve_inline(&self, reference: &str) -> Option<String>;
}

/// Provider reading local files; used by the demo binary and tests
#[derive(Default)]
pub struct FsContentProvider {
    inline: HashMap<String, String>,
}

impl FsContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register markup resolvable by inline reference
    pub fn register_inline(&mut self, reference: impl Into<String>, markup: impl Into<String>) {
        self.inline.insert(reference.into(), markup.into());
    }
}

impl ContentProvider for FsContentProvider {
    fn load_image(&self, url: &str, cancel: &CancelToken) -> Result<ImageInfo, GalleryError> {
        if cancel.is_cancelled() {
            return Err(GalleryError::Fetch("cancelled".into()));
        }

        tracing::debug!("Probing image: {}", url);

        let reader = ImageReader::open(Path::new(url))
            .map_err(|e| GalleryError::ImageDecode(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| GalleryError::ImageDecode(e.to_string()))?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| GalleryError::ImageDecode(e.to_string()))?;

        Ok(ImageInfo { width, height })
    }

    fn fetch_fragment(
        &self,
        url: &str,
        _settings: &serde_json::Value,
        cancel: &CancelToken,
    ) -> Result<String, GalleryError> {
        if cancel.is_cancelled() {
            return Err(GalleryError::Fetch("cancelled".into()));
        }

        // Request settings are for remote backends; local reads ignore them
        tracing::debug!("Fetching fragment: {}", url);
        std::fs::read_to_string(url).map_err(|e| GalleryError::Fetch(e.to_string()))
    }

    fn probe_embedded(&self, src: &str) -> Result<Option<(u32, u32)>, GalleryError> {
        // Local files have no load signal to wait for; report loaded but
        // unmeasured so the declared/default size is kept.
        if Path::new(src).exists() {
            Ok(None)
        } else {
            Err(GalleryError::Embedded(format!("not found: {}", src)))
        }
    }

    fn resolve_inline(&self, reference: &str) -> Option<String> {
        self.inline.get(reference).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_inline_resolution() {
        let mut provider = FsContentProvider::new();
        provider.register_inline("#about", "<p>hello</p>");

        assert_eq!(provider.resolve_inline("#about").as_deref(), Some("<p>hello</p>"));
        assert!(provider.resolve_inline("#missing").is_none());
    }

    #[test]
    fn test_missing_image_is_decode_error() {
        let provider = FsContentProvider::new();
        let err = provider
            .load_image("/nonexistent/zzz.png", &CancelToken::new())
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}
