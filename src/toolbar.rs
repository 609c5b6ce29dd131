//! Toolbar model
//!
//! The toolbar is described as data: which controls are enabled, what
//! they read, and which action each one triggers. Drawing it is up to the
//! host.

use serde::{Deserialize, Serialize};

use crate::pdf::{ScaleRange, ViewMode, ViewState};

/// Which flavour of toolbar the viewer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolbarVariant {
    /// Mouse-driven toolbar with zoom buttons and page input
    #[default]
    Desktop,
    /// Compact toolbar, zoom through pinch gestures
    Touch,
}

impl ToolbarVariant {
    #[must_use]
    pub fn scale_range(self) -> ScaleRange {
        match self {
            ToolbarVariant::Desktop => ScaleRange::DESKTOP,
            ToolbarVariant::Touch => ScaleRange::TOUCH,
        }
    }
}

/// Localizable toolbar strings.
///
/// `pages_of` is a template where `{current}` and `{total}` are replaced
/// with the current page and the page count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarLabels {
    pub exit_fullscreen: String,
    pub enter_fullscreen: String,
    pub view_mode_fit_to_height: String,
    pub view_mode_fit_to_width: String,
    pub view_mode_default: String,
    pub next_page: String,
    pub prev_page: String,
    pub zoom_in: String,
    pub zoom_out: String,
    pub pages_of: String,
    pub page: String,
}

impl Default for ToolbarLabels {
    fn default() -> Self {
        Self::for_variant(ToolbarVariant::Desktop)
    }
}

impl ToolbarLabels {
    #[must_use]
    pub fn for_variant(variant: ToolbarVariant) -> Self {
        let (pages_of, view_mode_default) = match variant {
            ToolbarVariant::Desktop => ("Page {current} of {total}", "Page"),
            ToolbarVariant::Touch => ("{current} / {total}", "Custom View"),
        };
        Self {
            exit_fullscreen: "Exit Fullscreen".to_string(),
            enter_fullscreen: "Enter Fullscreen".to_string(),
            view_mode_fit_to_height: "Fit to Height".to_string(),
            view_mode_fit_to_width: "Fit to Width".to_string(),
            view_mode_default: view_mode_default.to_string(),
            next_page: "Next".to_string(),
            prev_page: "Previous".to_string(),
            zoom_in: "Zoom In".to_string(),
            zoom_out: "Zoom Out".to_string(),
            pages_of: pages_of.to_string(),
            page: "Page".to_string(),
        }
    }

    /// Apply user-provided replacements
    #[must_use]
    pub fn with_overrides(mut self, overrides: &LabelOverrides) -> Self {
        let pairs = [
            (&mut self.exit_fullscreen, &overrides.exit_fullscreen),
            (&mut self.enter_fullscreen, &overrides.enter_fullscreen),
            (
                &mut self.view_mode_fit_to_height,
                &overrides.view_mode_fit_to_height,
            ),
            (
                &mut self.view_mode_fit_to_width,
                &overrides.view_mode_fit_to_width,
            ),
            (&mut self.view_mode_default, &overrides.view_mode_default),
            (&mut self.next_page, &overrides.next_page),
            (&mut self.prev_page, &overrides.prev_page),
            (&mut self.zoom_in, &overrides.zoom_in),
            (&mut self.zoom_out, &overrides.zoom_out),
            (&mut self.pages_of, &overrides.pages_of),
            (&mut self.page, &overrides.page),
        ];
        for (label, replacement) in pairs {
            if let Some(text) = replacement {
                label.clone_from(text);
            }
        }
        self
    }

    #[must_use]
    pub fn pages_of(&self, current: usize, total: usize) -> String {
        self.pages_of
            .replace("{current}", &current.to_string())
            .replace("{total}", &total.to_string())
    }

    #[must_use]
    pub fn view_mode(&self, mode: ViewMode) -> &str {
        match mode {
            ViewMode::Default => &self.view_mode_default,
            ViewMode::FitToWidth => &self.view_mode_fit_to_width,
            ViewMode::FitToHeight => &self.view_mode_fit_to_height,
        }
    }
}

/// Partial label set read from settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelOverrides {
    pub exit_fullscreen: Option<String>,
    pub enter_fullscreen: Option<String>,
    pub view_mode_fit_to_height: Option<String>,
    pub view_mode_fit_to_width: Option<String>,
    pub view_mode_default: Option<String>,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    pub zoom_in: Option<String>,
    pub zoom_out: Option<String>,
    pub pages_of: Option<String>,
    pub page: Option<String>,
}

/// User interaction with a toolbar control
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    PrevPage,
    NextPage,
    /// Raw text typed into the page field
    PageInput(String),
    ZoomIn,
    ZoomOut,
    SetViewMode(ViewMode),
    ToggleFullscreen,
}

/// Parse the page field. Empty or non-numeric input yields `None`.
#[must_use]
pub fn parse_page_input(input: &str) -> Option<usize> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<usize>().ok()
}

/// What the toolbar shows for a given view state
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarSnapshot {
    pub pages_label: String,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub zoom_in_enabled: bool,
    pub zoom_out_enabled: bool,
    /// Zoom level as a rounded percentage, e.g. "120%"
    pub zoom_label: String,
    pub view_mode: ViewMode,
    pub view_mode_label: String,
    pub fullscreen: bool,
    pub fullscreen_label: String,
    /// Zoom buttons are only part of the desktop toolbar
    pub shows_zoom_buttons: bool,
}

impl ToolbarSnapshot {
    #[must_use]
    pub fn from_state(state: &ViewState, labels: &ToolbarLabels, variant: ToolbarVariant) -> Self {
        let range = state.scale_range;
        Self {
            pages_label: labels.pages_of(state.current_page, state.page_count),
            prev_enabled: state.current_page > 1,
            next_enabled: state.current_page < state.page_count,
            zoom_in_enabled: state.scale < range.max,
            zoom_out_enabled: state.scale > range.min,
            zoom_label: format!("{}%", (state.scale * 100.0).round() as i32),
            view_mode: state.view_mode,
            view_mode_label: labels.view_mode(state.view_mode).to_string(),
            fullscreen: state.fullscreen,
            fullscreen_label: if state.fullscreen {
                labels.exit_fullscreen.clone()
            } else {
                labels.enter_fullscreen.clone()
            },
            shows_zoom_buttons: variant == ToolbarVariant::Desktop,
        }
    }
}
