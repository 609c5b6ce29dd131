//! Two-finger pinch-to-zoom
//!
//! Gesture state lives in an explicit [`PinchTracker`] owned by the viewer
//! and threaded through the touch handlers. During the move phase only a
//! relative scale is produced for visual feedback; the scale is committed
//! when the gesture ends.

use super::zoom::ScaleRange;

/// A touch position in container coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Scroll offsets of the document container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollPosition {
    pub left: f32,
    pub top: f32,
}

impl ScrollPosition {
    #[must_use]
    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

#[derive(Clone, Copy, Debug)]
struct Gesture {
    start_distance: f32,
    pivot: TouchPoint,
    base_scale: f32,
    start_scroll: ScrollPosition,
    relative: f32,
}

/// Result of a finished pinch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchOutcome {
    /// Clamped scale to commit
    pub scale: f32,
    /// Scroll position that keeps the pivot under the fingers
    pub scroll: ScrollPosition,
}

/// Tracks at most one pinch gesture
#[derive(Debug, Default)]
pub struct PinchTracker {
    gesture: Option<Gesture>,
}

impl PinchTracker {
    /// Shortest finger distance that still starts a gesture
    const MIN_DISTANCE: f32 = 1.0;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Begin a gesture. Returns `false` if the fingers are too close to
    /// measure a distance.
    pub fn start(
        &mut self,
        a: TouchPoint,
        b: TouchPoint,
        base_scale: f32,
        scroll: ScrollPosition,
    ) -> bool {
        let start_distance = a.distance(b);
        if start_distance < Self::MIN_DISTANCE {
            self.gesture = None;
            return false;
        }
        self.gesture = Some(Gesture {
            start_distance,
            pivot: a.midpoint(b),
            base_scale,
            start_scroll: scroll,
            relative: 1.0,
        });
        true
    }

    /// Update finger positions; returns the live relative scale
    pub fn update(&mut self, a: TouchPoint, b: TouchPoint) -> Option<f32> {
        let gesture = self.gesture.as_mut()?;
        gesture.relative = a.distance(b) / gesture.start_distance;
        Some(gesture.relative)
    }

    /// Finish the gesture, producing the scale to commit and the adjusted scroll
    pub fn finish(&mut self, range: ScaleRange) -> Option<PinchOutcome> {
        let gesture = self.gesture.take()?;
        let scale = range.clamp(gesture.base_scale * gesture.relative);

        // The zoom actually applied after clamping
        let effective = if gesture.base_scale > 0.0 {
            scale / gesture.base_scale
        } else {
            1.0
        };
        let pivot = gesture.pivot;
        let scroll = ScrollPosition::new(
            ((gesture.start_scroll.left + pivot.x) * effective - pivot.x).max(0.0),
            ((gesture.start_scroll.top + pivot.y) * effective - pivot.y).max(0.0),
        );

        Some(PinchOutcome { scale, scroll })
    }

    /// Abandon the gesture without committing anything
    pub fn cancel(&mut self) {
        self.gesture = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn spreading_fingers_commits_relative_scale() {
        let mut pinch = PinchTracker::new();
        assert!(pinch.start(
            TouchPoint::new(100.0, 200.0),
            TouchPoint::new(200.0, 200.0),
            1.0,
            ScrollPosition::default(),
        ));

        let live = pinch
            .update(TouchPoint::new(75.0, 200.0), TouchPoint::new(225.0, 200.0))
            .unwrap();
        assert!(approx(live, 1.5));

        let outcome = pinch.finish(ScaleRange::TOUCH).unwrap();
        assert!(approx(outcome.scale, 1.5));
        assert!(!pinch.is_active());
    }

    #[test]
    fn committed_scale_is_clamped() {
        let mut pinch = PinchTracker::new();
        pinch.start(
            TouchPoint::new(0.0, 0.0),
            TouchPoint::new(100.0, 0.0),
            2.0,
            ScrollPosition::default(),
        );
        pinch.update(TouchPoint::new(0.0, 0.0), TouchPoint::new(300.0, 0.0));
        let outcome = pinch.finish(ScaleRange::TOUCH).unwrap();
        assert!(approx(outcome.scale, 2.5));
    }

    #[test]
    fn scroll_keeps_pivot_fixed() {
        let mut pinch = PinchTracker::new();
        pinch.start(
            TouchPoint::new(50.0, 100.0),
            TouchPoint::new(150.0, 100.0),
            1.0,
            ScrollPosition::new(0.0, 400.0),
        );
        pinch.update(TouchPoint::new(0.0, 100.0), TouchPoint::new(200.0, 100.0));
        let outcome = pinch.finish(ScaleRange::TOUCH).unwrap();

        // Pivot (100, 100) sat at content (100, 500); after 2x it is at (200, 1000)
        assert!(approx(outcome.scale, 2.0));
        assert!(approx(outcome.scroll.left, 100.0));
        assert!(approx(outcome.scroll.top, 900.0));
    }

    #[test]
    fn pinching_in_never_scrolls_negative() {
        let mut pinch = PinchTracker::new();
        pinch.start(
            TouchPoint::new(0.0, 0.0),
            TouchPoint::new(200.0, 0.0),
            1.0,
            ScrollPosition::default(),
        );
        pinch.update(TouchPoint::new(0.0, 0.0), TouchPoint::new(100.0, 0.0));
        let outcome = pinch.finish(ScaleRange::TOUCH).unwrap();
        assert!(approx(outcome.scale, 0.5));
        assert_eq!(outcome.scroll, ScrollPosition::default());
    }

    #[test]
    fn coincident_fingers_do_not_start() {
        let mut pinch = PinchTracker::new();
        let p = TouchPoint::new(10.0, 10.0);
        assert!(!pinch.start(p, p, 1.0, ScrollPosition::default()));
        assert!(pinch.update(p, p).is_none());
        assert!(pinch.finish(ScaleRange::TOUCH).is_none());
    }
}
