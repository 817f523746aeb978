//! Sparse position index mapping unbounded positions to slides

use crate::item::ItemCollection;
use crate::slide::Slide;
use std::collections::BTreeMap;

/// Normalize an unbounded position onto a collection index.
///
/// Stable across sign and wrap count: for length 3, positions -1, 2 and 5
/// all resolve to index 2.
pub fn normalize(position: i64, len: usize) -> usize {
    debug_assert!(len > 0);
    let len = len as i64;
    (((position % len) + len) % len) as usize
}

/// Arena of live slides keyed by signed position.
///
/// At most one slide exists per position; insertion and eviction are
/// explicit, nothing relies on iteration order of a hash table.
#[derive(Debug, Default)]
pub struct PositionIndex {
    slides: BTreeMap<i64, Slide>,
}

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize the slide for a position, or return the existing one.
    ///
    /// Yields `None` when the collection is empty, or when looping is
    /// disabled and the position falls outside `[0, len)`.
    pub fn ensure_slide(
        &mut self,
        position: i64,
        collection: &ItemCollection,
        loop_mode: bool,
        epoch: u64,
    ) -> Option<&mut Slide> {
        if collection.is_empty() {
            return None;
        }
        if !loop_mode && (position < 0 || position >= collection.len() as i64) {
            return None;
        }

        if !self.slides.contains_key(&position) {
            let index = normalize(position, collection.len());
            let item = collection.get(index)?.clone();
            tracing::debug!(position, index, "Materializing slide");
            self.slides.insert(position, Slide::new(position, item, epoch));
        }

        self.slides.get_mut(&position)
    }

    pub fn get(&self, position: i64) -> Option<&Slide> {
        self.slides.get(&position)
    }

    pub fn get_mut(&mut self, position: i64) -> Option<&mut Slide> {
        self.slides.get_mut(&position)
    }

    pub fn contains(&self, position: i64) -> bool {
        self.slides.contains_key(&position)
    }

    /// Live positions in ascending order
    pub fn positions(&self) -> Vec<i64> {
        self.slides.keys().copied().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&i64, &mut Slide)> {
        self.slides.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Detach and release one slide
    pub fn evict(&mut self, position: i64) -> Option<Slide> {
        let slide = self.slides.remove(&position);
        if slide.is_some() {
            tracing::debug!(position, "Evicting slide");
        }
        slide
    }

    /// Evict every slide not in the retained set
    pub fn prune(&mut self, retained: &[i64]) -> Vec<Slide> {
        let doomed: Vec<i64> = self
            .slides
            .keys()
            .copied()
            .filter(|p| !retained.contains(p))
            .collect();

        doomed
            .into_iter()
            .filter_map(|p| self.evict(p))
            .collect()
    }

    /// Evict everything
    pub fn clear(&mut self) -> Vec<Slide> {
        let all = std::mem::take(&mut self.slides);
        all.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryOptions;
    use crate::item::{Item, ItemKind};

    fn collection(n: usize) -> ItemCollection {
        let mut c = ItemCollection::new(GalleryOptions::default());
        for i in 0..n {
            c.push(Item::new(ItemKind::Image, format!("{}.jpg", i)));
        }
        c
    }

    #[test]
    fn test_normalize_is_stable_across_wraps() {
        assert_eq!(normalize(-1, 3), 2);
        assert_eq!(normalize(2, 3), 2);
        assert_eq!(normalize(5, 3), 2);
        assert_eq!(normalize(-4, 3), 2);
        assert_eq!(normalize(0, 3), 0);
        assert_eq!(normalize(-3, 3), 0);
    }

    #[test]
    fn test_ensure_slide_is_idempotent() {
        let c = collection(3);
        let mut index = PositionIndex::new();

        let epoch = {
            let slide = index.ensure_slide(1, &c, true, 10).unwrap();
            slide.epoch
        };
        // A second call returns the same record, not a fresh one
        let again = index.ensure_slide(1, &c, true, 99).unwrap();
        assert_eq!(again.epoch, epoch);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_wrapped_positions_share_items_not_slides() {
        let c = collection(3);
        let mut index = PositionIndex::new();

        index.ensure_slide(-1, &c, true, 1).unwrap();
        index.ensure_slide(2, &c, true, 2).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(-1).unwrap().item.collection_index, 2);
        assert_eq!(index.get(2).unwrap().item.collection_index, 2);
    }

    #[test]
    fn test_bounds_refused_without_looping() {
        let c = collection(3);
        let mut index = PositionIndex::new();

        assert!(index.ensure_slide(-1, &c, false, 1).is_none());
        assert!(index.ensure_slide(3, &c, false, 1).is_none());
        assert!(index.ensure_slide(0, &c, false, 1).is_some());
        assert!(index.ensure_slide(2, &c, false, 1).is_some());
    }

    #[test]
    fn test_empty_collection_yields_nothing() {
        let c = collection(0);
        let mut index = PositionIndex::new();
        assert!(index.ensure_slide(0, &c, true, 1).is_none());
    }

    #[test]
    fn test_prune_keeps_retained_window() {
        let c = collection(5);
        let mut index = PositionIndex::new();
        for p in 0..5 {
            index.ensure_slide(p, &c, true, 1).unwrap();
        }

        let evicted = index.prune(&[1, 2, 3]);
        assert_eq!(evicted.len(), 2);
        assert_eq!(index.positions(), vec![1, 2, 3]);
    }
}
