//! Scale clamping, zoom steps and view-mode fitting
//!
//! The scale is the factor pages are drawn at relative to their natural
//! size. It is always kept inside a [`ScaleRange`]; view modes derive it
//! from the page and viewport dimensions.

use serde::{Deserialize, Serialize};

use super::types::{PageSize, ViewportSize};

/// Policy for auto-computing the scale
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Heuristic width based on page orientation
    #[default]
    Default,
    FitToWidth,
    FitToHeight,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Default => "Default",
            ViewMode::FitToWidth => "FitToWidth",
            ViewMode::FitToHeight => "FitToHeight",
        }
    }
}

/// Inclusive bounds for the scale factor
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f32,
    pub max: f32,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::DESKTOP
    }
}

impl ScaleRange {
    /// Mouse-driven toolbar variant
    pub const DESKTOP: Self = Self { min: 0.5, max: 2.5 };
    /// Touch variant, allows zooming further out with a pinch
    pub const TOUCH: Self = Self { min: 0.2, max: 2.5 };

    /// Build a range, swapping the bounds if given in the wrong order
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Clamp a scale into range, handling NaN/Inf
    #[must_use]
    pub fn clamp(&self, scale: f32) -> f32 {
        let scale = if scale.is_finite() { scale } else { 1.0 };
        scale.max(self.min).min(self.max)
    }

    #[must_use]
    pub fn contains(&self, scale: f32) -> bool {
        (self.min..=self.max).contains(&scale)
    }
}

/// Zoom step in toolbar increments
pub const ZOOM_STEP: f32 = 0.1;

/// Tolerance when deciding whether a scale already sits on a step
const STEP_EPSILON: f32 = 1e-3;

/// Next scale when zooming in: snaps up to the next 0.1 increment
#[must_use]
pub fn step_in(scale: f32) -> f32 {
    let steps = (scale / ZOOM_STEP + STEP_EPSILON).floor();
    (steps + 1.0) * ZOOM_STEP
}

/// Next scale when zooming out: snaps down to the previous 0.1 increment
#[must_use]
pub fn step_out(scale: f32) -> f32 {
    let steps = (scale / ZOOM_STEP - STEP_EPSILON).ceil();
    (steps - 1.0) * ZOOM_STEP
}

/// Share of the viewport width used for landscape pages in default mode
const DEFAULT_LANDSCAPE_WIDTH: f32 = 0.9;
/// Share of the viewport width used for portrait pages in default mode
const DEFAULT_PORTRAIT_WIDTH: f32 = 0.7;
/// Share of the viewport used by the fit modes
const FIT_SHARE: f32 = 0.95;

/// Scale that makes `page` fill the viewport according to `mode`.
///
/// Returns `None` when either size is degenerate. The result is not
/// clamped.
#[must_use]
pub fn fit_scale(mode: ViewMode, page: PageSize, viewport: ViewportSize) -> Option<f32> {
    if page.width <= 0.0 || page.height <= 0.0 || viewport.is_empty() {
        return None;
    }

    let scale = match mode {
        ViewMode::Default => {
            let share = if page.is_landscape() {
                DEFAULT_LANDSCAPE_WIDTH
            } else {
                DEFAULT_PORTRAIT_WIDTH
            };
            (viewport.width * share).round() / page.width
        }
        ViewMode::FitToWidth => (viewport.width * FIT_SHARE).round() / page.width,
        ViewMode::FitToHeight => (viewport.height * FIT_SHARE).round() / page.height,
    };

    Some(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn clamp_stays_in_range_and_is_idempotent() {
        for range in [ScaleRange::DESKTOP, ScaleRange::TOUCH] {
            for s in [-3.0, 0.0, 0.1, 0.2, 0.5, 1.0, 2.5, 3.0, 100.0, f32::INFINITY] {
                let once = range.clamp(s);
                assert!(range.contains(once), "{s} -> {once}");
                assert_eq!(range.clamp(once), once);
            }
        }
    }

    #[test]
    fn clamp_handles_nan() {
        assert_eq!(ScaleRange::DESKTOP.clamp(f32::NAN), 1.0);
        assert_eq!(ScaleRange::new(1.5, 2.0).clamp(f32::NAN), 1.5);
    }

    #[test]
    fn new_orders_bounds() {
        let range = ScaleRange::new(2.0, 0.5);
        assert_eq!(range, ScaleRange { min: 0.5, max: 2.0 });
    }

    #[test]
    fn steps_snap_to_tenths() {
        assert!(approx(step_in(1.0), 1.1));
        assert!(approx(step_in(1.03), 1.1));
        assert!(approx(step_out(1.0), 0.9));
        assert!(approx(step_out(1.07), 1.0));
    }

    #[test]
    fn default_mode_uses_orientation() {
        let viewport = ViewportSize::new(1000.0, 800.0);
        let portrait = fit_scale(ViewMode::Default, PageSize::new(500.0, 700.0), viewport);
        let landscape = fit_scale(ViewMode::Default, PageSize::new(500.0, 300.0), viewport);
        assert!(approx(portrait.unwrap(), 1.4));
        assert!(approx(landscape.unwrap(), 1.8));
    }

    #[test]
    fn fit_modes_use_ninety_five_percent() {
        let viewport = ViewportSize::new(1000.0, 800.0);
        let page = PageSize::new(500.0, 400.0);
        assert!(approx(
            fit_scale(ViewMode::FitToWidth, page, viewport).unwrap(),
            1.9
        ));
        assert!(approx(
            fit_scale(ViewMode::FitToHeight, page, viewport).unwrap(),
            1.9
        ));
    }

    #[test]
    fn degenerate_sizes_yield_nothing() {
        let page = PageSize::new(500.0, 400.0);
        assert!(fit_scale(ViewMode::FitToWidth, page, ViewportSize::default()).is_none());
        assert!(
            fit_scale(
                ViewMode::FitToWidth,
                PageSize::new(0.0, 10.0),
                ViewportSize::new(10.0, 10.0)
            )
            .is_none()
        );
    }
}
