//! Stage host interface
//!
//! The stage (overlay container, viewport metrics, thumbnail geometry) is
//! owned by the embedder. The engine consumes it through this narrow
//! read-only interface.

use crate::geometry::{Bounds, Viewport};
use crate::item::Item;
use std::collections::HashMap;

/// Read-only view of the overlay stage supplied by the embedder
pub trait StageHost: Send {
    /// Bounds of the stage area slides are fitted into
    fn stage_bounds(&self) -> Bounds;

    /// Viewport metrics for responsive source selection
    fn viewport(&self) -> Viewport;

    /// Bounding box of the item's thumbnail, if one is currently visible
    /// in the viewport (drives the zoom reveal)
    fn thumbnail_box(&self, item: &Item) -> Option<Bounds>;

    /// Declared stage padding
    fn padding(&self) -> f32 {
        0.0
    }
}

/// Fixed-geometry stage for headless embedding and tests
pub struct StaticStage {
    pub bounds: Bounds,
    pub viewport: Viewport,
    pub padding: f32,
    thumbs: HashMap<String, Bounds>,
}

impl StaticStage {
    pub fn new(bounds: Bounds, viewport: Viewport) -> Self {
        Self {
            bounds,
            viewport,
            padding: 0.0,
            thumbs: HashMap::new(),
        }
    }

    /// Declare a visible thumbnail box for a source locator
    pub fn set_thumbnail_box(&mut self, source: impl Into<String>, bounds: Bounds) {
        self.thumbs.insert(source.into(), bounds);
    }
}

impl StageHost for StaticStage {
    fn stage_bounds(&self) -> Bounds {
        self.bounds
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn thumbnail_box(&self, item: &Item) -> Option<Bounds> {
        item.thumbnail
            .as_deref()
            .and_then(|t| self.thumbs.get(t))
            .or_else(|| self.thumbs.get(&item.source))
            .copied()
    }

    fn padding(&self) -> f32 {
        self.padding
    }
}
