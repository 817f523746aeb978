//! Content items and the per-session collection

use crate::config::GalleryOptions;
use crate::srcset::SourceSet;
use std::sync::Arc;

/// Content type of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Image,
    Iframe,
    Html,
    Video,
    Inline,
    Ajax,
}

impl ItemKind {
    /// Does this kind carry playable media (autostart, stale-playback reset)?
    pub fn is_playable(self) -> bool {
        matches!(self, ItemKind::Video)
    }
}

/// Immutable descriptor of one piece of content.
///
/// The options snapshot is frozen when the item joins a collection: the
/// collection's options are the global layer; an explicit per-item override
/// replaces the snapshot wholesale.
#[derive(Debug, Clone)]
pub struct Item {
    pub kind: ItemKind,
    /// Source locator, or embedded markup for `Html` items
    pub source: String,
    pub collection_index: usize,
    pub options: Arc<GalleryOptions>,
    pub thumbnail: Option<String>,
    pub caption: Option<String>,
    /// Declared width/height, when known ahead of load
    pub declared_size: Option<(f32, f32)>,
    pub source_set: Option<SourceSet>,
    /// Declared layout slot width for responsive selection (`sizes` descriptor)
    pub sizes: Option<String>,
    /// Declarative filter narrowing markup content to a sub-element
    pub filter: Option<String>,
    has_custom_options: bool,
}

impl Item {
    pub fn new(kind: ItemKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            collection_index: 0,
            options: Arc::new(GalleryOptions::default()),
            thumbnail: None,
            caption: None,
            declared_size: None,
            source_set: None,
            sizes: None,
            filter: None,
            has_custom_options: false,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_declared_size(mut self, width: f32, height: f32) -> Self {
        self.declared_size = Some((width, height));
        self
    }

    /// Attach a responsive source descriptor (`url 400w, url 800w, ...`)
    pub fn with_srcset(mut self, descriptor: &str) -> Self {
        self.source_set = SourceSet::parse(descriptor);
        self
    }

    /// Declare the layout slot width (`sizes` descriptor) used for
    /// responsive selection
    pub fn with_sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Override the options snapshot for this item only
    pub fn with_options(mut self, options: GalleryOptions) -> Self {
        self.options = Arc::new(options);
        self.has_custom_options = true;
        self
    }
}

/// Ordered, append-only collection of items for one session
#[derive(Debug, Clone)]
pub struct ItemCollection {
    items: Vec<Arc<Item>>,
    options: Arc<GalleryOptions>,
}

impl ItemCollection {
    pub fn new(options: GalleryOptions) -> Self {
        Self {
            items: Vec::new(),
            options: Arc::new(options),
        }
    }

    /// Session-wide options (the global layer of each item snapshot)
    pub fn options(&self) -> &Arc<GalleryOptions> {
        &self.options
    }

    /// Append an item, freezing its options snapshot. Returns its index.
    pub fn push(&mut self, mut item: Item) -> usize {
        let index = self.items.len();
        item.collection_index = index;
        if !item.has_custom_options {
            item.options = self.options.clone();
        }
        self.items.push(Arc::new(item));
        index
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Item>> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_freezes_collection_options() {
        let mut opts = GalleryOptions::default();
        opts.gutter = 12.0;
        let mut collection = ItemCollection::new(opts);

        let idx = collection.push(Item::new(ItemKind::Image, "a.jpg"));
        assert_eq!(idx, 0);
        assert_eq!(collection.get(0).unwrap().options.gutter, 12.0);
    }

    #[test]
    fn test_per_item_override_survives_push() {
        let mut collection = ItemCollection::new(GalleryOptions::default());
        let mut custom = GalleryOptions::default();
        custom.gutter = 99.0;

        collection.push(Item::new(ItemKind::Image, "a.jpg").with_options(custom));
        assert_eq!(collection.get(0).unwrap().options.gutter, 99.0);
    }

    #[test]
    fn test_indices_are_stable() {
        let mut collection = ItemCollection::new(GalleryOptions::default());
        collection.push(Item::new(ItemKind::Image, "a.jpg"));
        collection.push(Item::new(ItemKind::Video, "b.mp4"));
        assert_eq!(collection.get(1).unwrap().collection_index, 1);
        assert_eq!(collection.get(1).unwrap().kind, ItemKind::Video);
    }
}
