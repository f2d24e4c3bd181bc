use std::collections::HashSet;

use crate::model::Photo;

/// Maximum number of records held in memory at once
pub const CAP: usize = 2000;

/// Bounded, ordered window over the backing dataset.
///
/// Appends evict from the head once the capacity is exceeded, so under
/// continuous forward pagination the cache always holds the most recently
/// fetched records. There is no re-fetch path for evicted pages: scrolling
/// back past the window boundary shows missing items until the caller resets
/// with a fresh first page.
///
/// `id` is unique within the cache, but the cache is a sliding window and
/// never guarantees coverage of the full backing dataset.
#[derive(Debug, Default)]
pub struct LibraryCache {
    photos: Vec<Photo>,
}

impl LibraryCache {
    pub fn new() -> Self {
        Self { photos: Vec::new() }
    }

    /// Concatenate a fetched batch onto the tail, dropping the oldest records
    /// once the window exceeds `CAP`.
    pub fn append(&mut self, batch: Vec<Photo>) {
        self.photos.extend(batch);
        self.evict_overflow();
    }

    /// Clear and repopulate the window (reload, album view, tag view). The
    /// same capacity rule applies to an oversized replacement batch.
    pub fn replace_all(&mut self, batch: Vec<Photo>) {
        self.photos = batch;
        self.evict_overflow();
    }

    /// In-place update of one record. No-op if the id is not currently in the
    /// window; returns whether a record was touched.
    pub fn mutate(&mut self, id: i64, updater: impl FnOnce(&mut Photo)) -> bool {
        match self.photos.iter_mut().find(|p| p.id == id) {
            Some(photo) => {
                updater(photo);
                true
            }
            None => false,
        }
    }

    /// Drop every record whose id is in `ids`
    pub fn remove_where(&mut self, ids: &HashSet<i64>) {
        self.photos.retain(|p| !ids.contains(&p.id));
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.photos.iter().any(|p| p.id == id)
    }

    fn evict_overflow(&mut self) {
        if self.photos.len() > CAP {
            let overflow = self.photos.len() - CAP;
            self.photos.drain(..overflow);
            tracing::debug!(evicted = overflow, "cache window overflowed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::photo;

    fn batch(range: std::ops::Range<i64>) -> Vec<Photo> {
        range.map(photo).collect()
    }

    #[test]
    fn test_append_concatenates_in_order() {
        let mut cache = LibraryCache::new();
        cache.append(batch(0..3));
        cache.append(batch(3..5));
        let ids: Vec<i64> = cache.photos().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_eviction_keeps_last_cap_records() {
        let mut cache = LibraryCache::new();
        // 2500 records appended one page (100) at a time
        for start in (0..2500).step_by(100) {
            cache.append(batch(start..start + 100));
        }
        assert_eq!(cache.len(), CAP);
        // fetch-index 500 through 2499 survive, the earliest pages are gone
        assert_eq!(cache.photos().first().unwrap().id, 500);
        assert_eq!(cache.photos().last().unwrap().id, 2499);
        assert!(!cache.contains(499));
    }

    #[test]
    fn test_single_oversized_append_is_truncated_from_head() {
        let mut cache = LibraryCache::new();
        cache.append(batch(0..2300));
        assert_eq!(cache.len(), CAP);
        assert_eq!(cache.photos().first().unwrap().id, 300);
    }

    #[test]
    fn test_replace_all_clears_previous_window() {
        let mut cache = LibraryCache::new();
        cache.append(batch(0..50));
        cache.replace_all(batch(100..110));
        assert_eq!(cache.len(), 10);
        assert!(!cache.contains(0));
        assert!(cache.contains(105));
    }

    #[test]
    fn test_replace_all_applies_capacity_rule() {
        let mut cache = LibraryCache::new();
        cache.replace_all(batch(0..2100));
        assert_eq!(cache.len(), CAP);
        assert_eq!(cache.photos().first().unwrap().id, 100);
    }

    #[test]
    fn test_mutate_updates_in_place() {
        let mut cache = LibraryCache::new();
        cache.append(batch(0..3));
        let touched = cache.mutate(1, |p| p.is_favorite = true);
        assert!(touched);
        assert!(cache.photos()[1].is_favorite);
        // order and neighbors untouched
        assert!(!cache.photos()[0].is_favorite);
    }

    #[test]
    fn test_mutate_missing_id_is_noop() {
        let mut cache = LibraryCache::new();
        cache.append(batch(0..3));
        assert!(!cache.mutate(99, |p| p.is_favorite = true));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_remove_where_filters_matching_ids() {
        let mut cache = LibraryCache::new();
        cache.append(batch(0..5));
        let ids: HashSet<i64> = [1, 3, 42].into_iter().collect();
        cache.remove_where(&ids);
        let remaining: Vec<i64> = cache.photos().iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![0, 2, 4]);
    }
}
