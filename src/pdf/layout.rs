//! Vertical page layout for continuous scrolling
//!
//! Pages are stacked top to bottom with a fixed gap. Pages whose size is
//! not known yet occupy a placeholder height until they load.

use super::page::Page;

/// Padding above the first page
pub const DOCUMENT_PADDING: f32 = 16.0;
/// Space between consecutive pages
pub const PAGE_GAP: f32 = 32.0;
/// Height reserved for a page that has not loaded yet
pub const PLACEHOLDER_HEIGHT: f32 = 1200.0;
/// Space left above a page after navigating to it
pub const NAVIGATION_MARGIN: f32 = 20.0;

/// Page offsets at a given scale
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageLayout {
    offsets: Vec<f32>,
    heights: Vec<f32>,
    total_height: f32,
}

impl PageLayout {
    #[must_use]
    pub fn compute(pages: &[Page], scale: f32) -> Self {
        let mut offsets = Vec::with_capacity(pages.len());
        let mut heights = Vec::with_capacity(pages.len());
        let mut top = DOCUMENT_PADDING;

        for page in pages {
            let height = page
                .size
                .map_or(PLACEHOLDER_HEIGHT, |size| size.scaled(scale).height);
            offsets.push(top);
            heights.push(height);
            top += height + PAGE_GAP;
        }

        Self {
            offsets,
            heights,
            total_height: top,
        }
    }

    /// Top offset of every page in document order
    #[must_use]
    pub fn offsets(&self) -> &[f32] {
        &self.offsets
    }

    /// Top offset of a page (1-based)
    #[must_use]
    pub fn offset(&self, page: usize) -> Option<f32> {
        page.checked_sub(1)
            .and_then(|idx| self.offsets.get(idx))
            .copied()
    }

    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.total_height
    }

    /// Scroll position that brings a page into view
    #[must_use]
    pub fn scroll_target(&self, page: usize) -> Option<f32> {
        self.offset(page)
            .map(|top| (top - NAVIGATION_MARGIN).max(0.0))
    }

    /// Visible share of every page for a viewport window
    #[must_use]
    pub fn visibility_ratios(&self, scroll_top: f32, viewport_height: f32) -> Vec<f32> {
        let window_end = scroll_top + viewport_height;
        self.offsets
            .iter()
            .zip(&self.heights)
            .map(|(&top, &height)| {
                if height <= 0.0 {
                    return 0.0;
                }
                let visible = (window_end.min(top + height) - scroll_top.max(top)).max(0.0);
                (visible / height).min(1.0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::page::PageStatus;
    use super::super::types::PageSize;
    use super::*;

    fn loaded(width: f32, height: f32) -> Page {
        Page {
            status: PageStatus::Loaded,
            size: Some(PageSize::new(width, height)),
            ..Page::default()
        }
    }

    #[test]
    fn offsets_stack_pages_with_gap() {
        let pages = vec![loaded(600.0, 800.0), loaded(600.0, 800.0)];
        let layout = PageLayout::compute(&pages, 0.5);
        assert_eq!(layout.offsets(), &[16.0, 16.0 + 400.0 + 32.0]);
        assert_eq!(layout.total_height(), 16.0 + 2.0 * (400.0 + 32.0));
    }

    #[test]
    fn unloaded_pages_use_placeholder() {
        let pages = vec![Page::default(), loaded(100.0, 100.0)];
        let layout = PageLayout::compute(&pages, 1.0);
        assert_eq!(layout.offset(2), Some(16.0 + 1200.0 + 32.0));
    }

    #[test]
    fn scroll_target_leaves_margin() {
        let pages = vec![loaded(100.0, 1000.0), loaded(100.0, 1000.0)];
        let layout = PageLayout::compute(&pages, 1.0);
        assert_eq!(layout.scroll_target(1), Some(0.0));
        assert_eq!(layout.scroll_target(2), Some(16.0 + 1032.0 - 20.0));
        assert_eq!(layout.scroll_target(3), None);
    }

    #[test]
    fn ratios_reflect_viewport_window() {
        let pages = vec![loaded(100.0, 1000.0), loaded(100.0, 1000.0)];
        let layout = PageLayout::compute(&pages, 1.0);
        // Window 516..1516: page 1 spans 16..1016, page 2 spans 1048..2048
        let ratios = layout.visibility_ratios(516.0, 1000.0);
        assert!((ratios[0] - 0.5).abs() < 1e-4);
        assert!((ratios[1] - 0.468).abs() < 1e-4);
    }
}
