//! Shared test fixtures

use crate::error::GalleryError;
use crate::events::{EventSink, GalleryEvent};
use crate::provider::{CancelToken, ContentProvider, ImageInfo};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scriptable provider: sources registered up front, optional per-source
/// latency, everything unknown fails.
pub(crate) struct MockProvider {
    pub images: Mutex<HashMap<String, (u32, u32)>>,
    pub fragments: Mutex<HashMap<String, String>>,
    pub inline: Mutex<HashMap<String, String>>,
    pub delay: Mutex<HashMap<String, Duration>>,
    /// Settings seen by each fragment fetch, in call order
    pub fragment_settings: Mutex<Vec<serde_json::Value>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            images: Mutex::new(HashMap::new()),
            fragments: Mutex::new(HashMap::new()),
            inline: Mutex::new(HashMap::new()),
            delay: Mutex::new(HashMap::new()),
            fragment_settings: Mutex::new(Vec::new()),
        }
    }

    pub fn with_image(self, url: &str, width: u32, height: u32) -> Self {
        self.images.lock().unwrap().insert(url.into(), (width, height));
        self
    }

    pub fn with_fragment(self, url: &str, body: &str) -> Self {
        self.fragments.lock().unwrap().insert(url.into(), body.into());
        self
    }

    pub fn with_inline(self, reference: &str, markup: &str) -> Self {
        self.inline.lock().unwrap().insert(reference.into(), markup.into());
        self
    }

    pub fn with_delay(self, key: &str, delay: Duration) -> Self {
        self.delay.lock().unwrap().insert(key.into(), delay);
        self
    }

    fn stall(&self, key: &str) {
        let delay = self.delay.lock().unwrap().get(key).copied();
        if let Some(d) = delay {
            std::thread::sleep(d);
        }
    }
}

impl ContentProvider for MockProvider {
    fn load_image(&self, url: &str, _cancel: &CancelToken) -> Result<ImageInfo, GalleryError> {
        self.stall(url);
        self.images
            .lock()
            .unwrap()
            .get(url)
            .map(|&(width, height)| ImageInfo { width, height })
            .ok_or_else(|| GalleryError::ImageDecode(format!("no such image: {}", url)))
    }

    fn fetch_fragment(
        &self,
        url: &str,
        settings: &serde_json::Value,
        _cancel: &CancelToken,
    ) -> Result<String, GalleryError> {
        self.fragment_settings.lock().unwrap().push(settings.clone());
        self.stall(url);
        self.fragments
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| GalleryError::Fetch(format!("404: {}", url)))
    }

    fn probe_embedded(&self, src: &str) -> Result<Option<(u32, u32)>, GalleryError> {
        self.stall(src);
        Ok(None)
    }

    fn resolve_inline(&self, reference: &str) -> Option<String> {
        self.inline.lock().unwrap().get(reference).cloned()
    }
}

/// Sink recording every event for later assertions
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    pub events: Arc<Mutex<Vec<GalleryEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<GalleryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, wanted: &GalleryEvent) -> bool {
        self.events.lock().unwrap().iter().any(|e| e == wanted)
    }
}

impl EventSink for RecordingSink {
    fn on_event(&mut self, event: &GalleryEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
