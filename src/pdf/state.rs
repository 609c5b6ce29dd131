//! View state management

use super::types::ViewportSize;
use super::zoom::{ScaleRange, ViewMode};

/// Scale a freshly loaded document starts at
pub const INITIAL_SCALE: f32 = 1.0;

/// Current view state of the viewer
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Current page (1-based)
    pub current_page: usize,

    /// Total page count
    pub page_count: usize,

    /// Current scale factor
    pub scale: f32,

    /// Policy used when the scale is recomputed
    pub view_mode: ViewMode,

    pub fullscreen: bool,

    /// Size of the document container
    pub viewport: ViewportSize,

    /// True until a document finished opening (or failed to)
    pub loading: bool,

    /// Allowed scale bounds
    pub scale_range: ScaleRange,
}

impl ViewState {
    #[must_use]
    pub fn new(scale_range: ScaleRange) -> Self {
        Self {
            current_page: 1,
            page_count: 0,
            scale: scale_range.clamp(INITIAL_SCALE),
            view_mode: ViewMode::Default,
            fullscreen: false,
            viewport: ViewportSize::default(),
            loading: true,
            scale_range,
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::BeginLoad => {
                self.current_page = 1;
                self.page_count = 0;
                self.scale = self.scale_range.clamp(INITIAL_SCALE);
                self.view_mode = ViewMode::Default;
                self.loading = true;
                vec![Effect::InvalidatePages]
            }

            Command::DocumentReady(count) => {
                self.page_count = count;
                self.loading = false;
                self.current_page = self.current_page.clamp(1, count.max(1));
                vec![Effect::PrefetchAroundCurrent]
            }

            Command::LoadFailed => {
                self.page_count = 0;
                self.current_page = 1;
                self.loading = false;
                vec![Effect::InvalidatePages]
            }

            Command::GoToPage(page) => {
                if self.page_count == 0 {
                    return vec![];
                }
                let clamped = page.clamp(1, self.page_count);
                let mut effects = vec![Effect::ScrollToPage(clamped)];
                if self.current_page != clamped {
                    self.current_page = clamped;
                    effects.push(Effect::NotifyPageChanged);
                    effects.push(Effect::PrefetchAroundCurrent);
                }
                effects
            }

            Command::SyncCurrentPage(page) => {
                if self.page_count == 0 {
                    return vec![];
                }
                let clamped = page.clamp(1, self.page_count);
                if self.current_page != clamped {
                    self.current_page = clamped;
                    vec![Effect::NotifyPageChanged, Effect::PrefetchAroundCurrent]
                } else {
                    vec![]
                }
            }

            Command::SetScale(scale) => {
                self.view_mode = ViewMode::Default;
                self.update_scale(scale)
            }

            Command::ApplyFitScale(scale) => self.update_scale(scale),

            Command::SetViewMode(mode) => {
                self.view_mode = mode;
                vec![Effect::RecomputeFit]
            }

            Command::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                vec![Effect::RecomputeFit]
            }

            Command::SetViewport(viewport) => {
                if self.viewport != viewport {
                    self.viewport = viewport;
                    vec![Effect::ScheduleFit]
                } else {
                    vec![]
                }
            }
        }
    }

    fn update_scale(&mut self, scale: f32) -> Vec<Effect> {
        let clamped = self.scale_range.clamp(scale);
        if (self.scale - clamped).abs() > f32::EPSILON {
            self.scale = clamped;
            vec![Effect::RerenderPages]
        } else {
            vec![]
        }
    }
}

/// Commands that modify view state
#[derive(Clone, Debug)]
pub enum Command {
    /// A new document started loading
    BeginLoad,
    /// The document opened with this many pages
    DocumentReady(usize),
    /// The document could not be opened
    LoadFailed,
    /// Navigate to a page (scrolls)
    GoToPage(usize),
    /// Adopt the page detected from scrolling (does not scroll)
    SyncCurrentPage(usize),
    /// User-chosen scale, switches back to the default view mode
    SetScale(f32),
    /// Scale computed from the current view mode
    ApplyFitScale(f32),
    SetViewMode(ViewMode),
    ToggleFullscreen,
    SetViewport(ViewportSize),
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Drop all page records
    InvalidatePages,
    /// Redraw every loaded page at the new scale
    RerenderPages,
    /// Recompute the scale from the view mode right away
    RecomputeFit,
    /// Recompute the scale once resizing settles
    ScheduleFit,
    /// Scroll the container to a page
    ScrollToPage(usize),
    /// Tell the host the current page changed
    NotifyPageChanged,
    /// Load and draw pages around the current page
    PrefetchAroundCurrent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_state(pages: usize) -> ViewState {
        let mut state = ViewState::new(ScaleRange::DESKTOP);
        let _ = state.apply(Command::DocumentReady(pages));
        state
    }

    #[test]
    fn begin_load_resets_defaults() {
        let mut state = ready_state(10);
        state.current_page = 7;
        state.scale = 2.0;
        state.view_mode = ViewMode::FitToHeight;

        let effects = state.apply(Command::BeginLoad);
        assert_eq!(effects, vec![Effect::InvalidatePages]);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_count, 0);
        assert_eq!(state.scale, 1.0);
        assert_eq!(state.view_mode, ViewMode::Default);
        assert!(state.loading);
    }

    #[test]
    fn go_to_page_clamps_to_range() {
        let mut state = ready_state(10);

        let effects = state.apply(Command::GoToPage(999));
        assert_eq!(state.current_page, 10);
        assert_eq!(
            effects,
            vec![
                Effect::ScrollToPage(10),
                Effect::NotifyPageChanged,
                Effect::PrefetchAroundCurrent
            ]
        );

        let _ = state.apply(Command::GoToPage(0));
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn go_to_same_page_only_scrolls() {
        let mut state = ready_state(3);
        let effects = state.apply(Command::GoToPage(1));
        assert_eq!(effects, vec![Effect::ScrollToPage(1)]);
    }

    #[test]
    fn navigation_without_document_is_ignored() {
        let mut state = ViewState::new(ScaleRange::DESKTOP);
        assert!(state.apply(Command::GoToPage(3)).is_empty());
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn set_scale_clamps_and_resets_mode() {
        let mut state = ready_state(1);
        let _ = state.apply(Command::SetViewMode(ViewMode::FitToWidth));

        let effects = state.apply(Command::SetScale(9.0));
        assert_eq!(state.scale, 2.5);
        assert_eq!(state.view_mode, ViewMode::Default);
        assert_eq!(effects, vec![Effect::RerenderPages]);
    }

    #[test]
    fn unchanged_scale_has_no_effect() {
        let mut state = ready_state(1);
        assert!(state.apply(Command::SetScale(1.0)).is_empty());
    }

    #[test]
    fn fit_scale_keeps_view_mode() {
        let mut state = ready_state(1);
        let _ = state.apply(Command::SetViewMode(ViewMode::FitToHeight));
        let effects = state.apply(Command::ApplyFitScale(1.3));
        assert_eq!(state.view_mode, ViewMode::FitToHeight);
        assert_eq!(effects, vec![Effect::RerenderPages]);
    }

    #[test]
    fn fullscreen_toggles_and_refits() {
        let mut state = ready_state(1);
        assert_eq!(
            state.apply(Command::ToggleFullscreen),
            vec![Effect::RecomputeFit]
        );
        assert!(state.fullscreen);
        let _ = state.apply(Command::ToggleFullscreen);
        assert!(!state.fullscreen);
    }

    #[test]
    fn viewport_change_schedules_fit() {
        let mut state = ready_state(1);
        let size = ViewportSize::new(800.0, 600.0);
        assert_eq!(
            state.apply(Command::SetViewport(size)),
            vec![Effect::ScheduleFit]
        );
        assert!(state.apply(Command::SetViewport(size)).is_empty());
    }

    #[test]
    fn sync_does_not_scroll() {
        let mut state = ready_state(5);
        let effects = state.apply(Command::SyncCurrentPage(4));
        assert_eq!(
            effects,
            vec![Effect::NotifyPageChanged, Effect::PrefetchAroundCurrent]
        );
        assert_eq!(state.current_page, 4);
    }
}
