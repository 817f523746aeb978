//! Per-position slide runtime records

use crate::geometry::Transform;
use crate::item::Item;
use crate::provider::CancelToken;
use std::sync::Arc;
use std::time::Duration;

/// Loading state machine of one slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Errored,
}

/// Content currently attached to a slide's surface.
///
/// Data only; the host renders from this. An `Inline` variant means the
/// referenced node is on loan to the slide (a placeholder marks its original
/// location) and reverts on reset.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SlideContent {
    #[default]
    Empty,
    /// Thumbnail standing in while the full image decodes
    Ghost { url: String },
    Image { url: String },
    Embedded { src: String, scrolling: String },
    Markup { html: String, filter: Option<String> },
    Inline { reference: String },
    Video { src: String },
    ErrorTemplate,
}

/// Mutable runtime record keyed by integer position
#[derive(Debug)]
pub struct Slide {
    pub position: i64,
    pub item: Arc<Item>,
    pub state: ContentState,
    pub is_revealed: bool,
    pub is_complete: bool,
    /// Resolved content width once known
    pub width: Option<f32>,
    /// Resolved content height once known
    pub height: Option<f32>,
    pub content: SlideContent,
    /// Current visual transform (host reads, engine writes)
    pub transform: Transform,
    /// Single-use duration override for the next transition only
    pub forced_duration: Option<Duration>,
    /// Eligible for zoom/pan; cleared when the slide errors
    pub zoomable: bool,
    pub protected: bool,
    pub dismiss_attached: bool,
    pub media_playing: bool,
    pub scroll_offset: (f32, f32),
    /// Delay before the ghost thumbnail is hidden after the full image lands
    pub ghost_hide_delay: Option<Duration>,
    /// Sub-fragment selector awaiting an in-flight fetch
    pub(crate) pending_selector: Option<String>,
    /// Occupancy epoch; late loader callbacks with a stale epoch are ignored
    pub(crate) epoch: u64,
    pub(crate) cancel: CancelToken,
}

impl Slide {
    pub(crate) fn new(position: i64, item: Arc<Item>, epoch: u64) -> Self {
        let declared = item.declared_size;
        Self {
            position,
            item,
            state: ContentState::Unloaded,
            is_revealed: false,
            is_complete: false,
            width: declared.map(|(w, _)| w),
            height: declared.map(|(_, h)| h),
            content: SlideContent::Empty,
            transform: Transform::default(),
            forced_duration: None,
            zoomable: true,
            protected: false,
            dismiss_attached: false,
            media_playing: false,
            scroll_offset: (0.0, 0.0),
            ghost_hide_delay: None,
            pending_selector: None,
            epoch,
            cancel: CancelToken::new(),
        }
    }

    /// Loaded for lifecycle purposes: `Errored` counts, `Loading` does not
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ContentState::Loaded | ContentState::Errored)
    }

    pub fn has_error(&self) -> bool {
        self.state == ContentState::Errored
    }

    pub(crate) fn take_forced_duration(&mut self) -> Option<Duration> {
        self.forced_duration.take()
    }

    /// Revert the slide to an empty surface.
    ///
    /// Aborts any outstanding fetch (abort is not an error), bumps the epoch
    /// so late loader callbacks are ignored, and returns loaned inline
    /// content to its placeholder.
    pub(crate) fn reset(&mut self, next_epoch: u64) {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.epoch = next_epoch;
        self.state = ContentState::Unloaded;
        self.content = SlideContent::Empty;
        self.is_revealed = false;
        self.is_complete = false;
        self.media_playing = false;
        self.dismiss_attached = false;
        self.ghost_hide_delay = None;
        self.pending_selector = None;
        self.scroll_offset = (0.0, 0.0);
        self.zoomable = true;
        // Declared dimensions survive a reset; resolved ones do not
        let declared = self.item.declared_size;
        self.width = declared.map(|(w, _)| w);
        self.height = declared.map(|(_, h)| h);
    }

    /// Stop playable media without clearing the surface
    pub(crate) fn halt_media(&mut self) {
        self.media_playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;

    fn slide() -> Slide {
        let item = Arc::new(Item::new(ItemKind::Image, "a.jpg").with_declared_size(640.0, 480.0));
        Slide::new(0, item, 1)
    }

    #[test]
    fn test_new_slide_is_unloaded() {
        let s = slide();
        assert_eq!(s.state, ContentState::Unloaded);
        assert!(!s.is_loaded());
        assert!(!s.is_complete);
        assert_eq!(s.width, Some(640.0));
    }

    #[test]
    fn test_errored_counts_as_loaded() {
        let mut s = slide();
        s.state = ContentState::Errored;
        assert!(s.is_loaded());
        assert!(s.has_error());
    }

    #[test]
    fn test_reset_aborts_and_bumps_epoch() {
        let mut s = slide();
        s.state = ContentState::Loading;
        s.content = SlideContent::Image { url: "a.jpg".into() };
        s.media_playing = true;
        let old_cancel = s.cancel.clone();

        s.reset(7);

        assert!(old_cancel.is_cancelled());
        assert!(!s.cancel.is_cancelled());
        assert_eq!(s.epoch, 7);
        assert_eq!(s.state, ContentState::Unloaded);
        assert_eq!(s.content, SlideContent::Empty);
        assert!(!s.media_playing);
        // Declared size survives
        assert_eq!(s.height, Some(480.0));
    }

    #[test]
    fn test_forced_duration_is_single_use() {
        let mut s = slide();
        s.forced_duration = Some(Duration::from_millis(100));
        assert_eq!(s.take_forced_duration(), Some(Duration::from_millis(100)));
        assert_eq!(s.take_forced_duration(), None);
    }
}
