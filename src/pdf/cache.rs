//! Bitmaps already drawn for the open document
//!
//! Zooming back to a previous scale, or scrolling back to a page, is served
//! from here instead of asking the engine again.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::types::RenderedPage;

/// Page plus scale rounded to a thousandth; scales closer than that share
/// an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub page: usize,
    pub scale_milli: u32,
}

impl CacheKey {
    #[must_use]
    pub fn new(page: usize, scale: f32) -> Self {
        Self {
            page,
            scale_milli: (scale.max(0.0) * 1000.0).round() as u32,
        }
    }
}

/// Hit and miss counts since the cache was created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct BitmapCache {
    entries: LruCache<CacheKey, Arc<RenderedPage>>,
    stats: CacheStats,
}

impl BitmapCache {
    /// A capacity of zero still keeps the most recent bitmap
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            stats: CacheStats::default(),
        }
    }

    /// Look up a bitmap, marking it most recently used
    pub fn lookup(&mut self, page: usize, scale: f32) -> Option<Arc<RenderedPage>> {
        let found = self.entries.get(&CacheKey::new(page, scale)).cloned();
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    pub fn store(&mut self, rendered: RenderedPage) -> Arc<RenderedPage> {
        let key = CacheKey::new(rendered.page, rendered.scale);
        let shared = Arc::new(rendered);
        self.entries.put(key, Arc::clone(&shared));
        shared
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::Bitmap;
    use super::*;

    fn rendered(page: usize, scale: f32) -> RenderedPage {
        RenderedPage {
            page,
            scale,
            bitmap: Bitmap::filled(2, 2, (255, 255, 255)),
        }
    }

    #[test]
    fn stored_bitmap_is_found_at_same_scale_only() {
        let mut cache = BitmapCache::new(8);
        cache.store(rendered(1, 1.25));

        assert_eq!(cache.lookup(1, 1.25).unwrap().page, 1);
        assert!(cache.lookup(1, 1.3).is_none());
        assert!(cache.lookup(2, 1.25).is_none());
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 2 });
    }

    #[test]
    fn nearly_equal_scales_share_an_entry() {
        let mut cache = BitmapCache::new(8);
        cache.store(rendered(3, 560.0 / 612.0));
        assert!(cache.lookup(3, 0.915_03).is_some());
    }

    #[test]
    fn least_recently_used_page_is_evicted() {
        let mut cache = BitmapCache::new(2);
        cache.store(rendered(1, 1.0));
        cache.store(rendered(2, 1.0));
        cache.lookup(1, 1.0);
        cache.store(rendered(3, 1.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.lookup(1, 1.0).is_some());
        assert!(cache.lookup(2, 1.0).is_none());
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut cache = BitmapCache::new(0);
        cache.store(rendered(1, 1.0));
        cache.store(rendered(2, 1.0));
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(2, 1.0).is_some());
        assert!(!cache.is_empty());
    }
}
