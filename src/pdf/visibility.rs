//! Current-page detection
//!
//! Two sources feed the current page: per-page intersection ratios
//! reported by a visibility observer, and a scroll spy that compares the
//! scroll position against page offsets.

/// Distance below the scroll top at which a page counts as current
pub const SCROLL_SPY_BUFFER: f32 = 200.0;

/// Tracks the last visibility ratio of every page
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    ratios: Vec<f32>,
    current: usize,
    suspended: bool,
}

impl VisibilityTracker {
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        let mut tracker = Self::default();
        tracker.reset(page_count);
        tracker
    }

    /// Forget all ratios and start over at page 1
    pub fn reset(&mut self, page_count: usize) {
        self.ratios = vec![0.0; page_count];
        self.current = 1;
        self.suspended = false;
    }

    /// Suspend or resume tracking, e.g. while a pinch gesture is running
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Record a ratio for a page (1-based).
    ///
    /// Returns the new current page when it changed. Updates for unknown
    /// pages, and all updates while suspended, are dropped.
    pub fn update(&mut self, page: usize, ratio: f32) -> Option<usize> {
        if self.suspended {
            return None;
        }
        let slot = page.checked_sub(1).and_then(|idx| self.ratios.get_mut(idx))?;
        *slot = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let best = self.most_visible()?;
        if best != self.current {
            self.current = best;
            Some(best)
        } else {
            None
        }
    }

    /// Page with the highest ratio, lowest page number on ties.
    ///
    /// `None` when nothing is visible.
    #[must_use]
    pub fn most_visible(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &ratio) in self.ratios.iter().enumerate() {
            if ratio <= 0.0 {
                continue;
            }
            if best.is_none_or(|(_, r)| ratio > r) {
                best = Some((idx + 1, ratio));
            }
        }
        best.map(|(page, _)| page)
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current
    }

    /// Force the current page, e.g. after explicit navigation
    pub fn set_current_page(&mut self, page: usize) {
        self.current = page;
    }

    #[must_use]
    pub fn ratio(&self, page: usize) -> Option<f32> {
        page.checked_sub(1)
            .and_then(|idx| self.ratios.get(idx))
            .copied()
    }
}

/// Scroll spy: the last page whose top lies above `scroll_top + buffer`.
///
/// `offsets` holds the top offset of each page in document order. Falls
/// back to page 1 when no page qualifies.
#[must_use]
pub fn page_at_scroll(offsets: &[f32], scroll_top: f32, buffer: f32) -> usize {
    offsets
        .iter()
        .rposition(|&top| top < scroll_top + buffer)
        .map_or(1, |idx| idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_most_visible_page() {
        let mut tracker = VisibilityTracker::new(3);
        tracker.update(1, 0.2);
        tracker.update(2, 0.9);
        tracker.update(3, 0.1);
        assert_eq!(tracker.current_page(), 2);
    }

    #[test]
    fn ties_go_to_lowest_page() {
        let mut tracker = VisibilityTracker::new(4);
        tracker.update(3, 0.5);
        tracker.update(2, 0.5);
        assert_eq!(tracker.most_visible(), Some(2));
        assert_eq!(tracker.current_page(), 2);
    }

    #[test]
    fn update_reports_only_changes() {
        let mut tracker = VisibilityTracker::new(3);
        assert_eq!(tracker.update(1, 0.6), None);
        assert_eq!(tracker.update(2, 0.7), Some(2));
        assert_eq!(tracker.update(2, 0.8), None);
    }

    #[test]
    fn events_arrive_in_any_order() {
        let mut a = VisibilityTracker::new(3);
        let mut b = VisibilityTracker::new(3);
        let events = [(1, 0.2), (2, 0.9), (3, 0.1)];
        for (page, ratio) in events {
            a.update(page, ratio);
        }
        for (page, ratio) in events.iter().rev() {
            b.update(*page, *ratio);
        }
        assert_eq!(a.current_page(), b.current_page());
    }

    #[test]
    fn suspended_tracker_ignores_updates() {
        let mut tracker = VisibilityTracker::new(3);
        tracker.set_suspended(true);
        assert_eq!(tracker.update(3, 1.0), None);
        assert_eq!(tracker.ratio(3), Some(0.0));

        tracker.set_suspended(false);
        assert_eq!(tracker.update(3, 1.0), Some(3));
    }

    #[test]
    fn all_hidden_keeps_current() {
        let mut tracker = VisibilityTracker::new(3);
        tracker.update(2, 1.0);
        assert_eq!(tracker.update(2, 0.0), None);
        assert_eq!(tracker.current_page(), 2);
    }

    #[test]
    fn unknown_pages_are_dropped() {
        let mut tracker = VisibilityTracker::new(2);
        assert_eq!(tracker.update(0, 1.0), None);
        assert_eq!(tracker.update(9, 1.0), None);
        assert_eq!(tracker.current_page(), 1);
    }

    #[test]
    fn scroll_spy_uses_buffer() {
        let offsets = [0.0, 1000.0, 2000.0];
        assert_eq!(page_at_scroll(&offsets, 0.0, SCROLL_SPY_BUFFER), 1);
        assert_eq!(page_at_scroll(&offsets, 799.0, SCROLL_SPY_BUFFER), 1);
        assert_eq!(page_at_scroll(&offsets, 801.0, SCROLL_SPY_BUFFER), 2);
        assert_eq!(page_at_scroll(&offsets, 5000.0, SCROLL_SPY_BUFFER), 3);
        assert_eq!(page_at_scroll(&[], 100.0, SCROLL_SPY_BUFFER), 1);
    }
}
