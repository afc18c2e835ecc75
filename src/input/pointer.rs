//! Swipe-to-undo gesture recognition
//!
//! A pointer-down/pointer-up pair on the board surface counts as an undo
//! request when all of these hold:
//!
//! - horizontal travel dominates: `|dx| > dominance_ratio * |dy|`
//! - it moves right to left: `dx < -min_horizontal`
//! - it is quick: elapsed time under `max_duration_ms`
//! - it travels far enough: `sqrt(dx² + dy²) > min_distance`
//!
//! With the default [`SwipeThresholds`] a 120 unit leftward flick in 200 ms
//! qualifies, the same flick over 500 ms does not.
//!
//! Recognition is independent of tap selection. The caller decides whether
//! the gesture is enabled at all.

use crate::core::SwipeThresholds;
use std::time::Duration;
use tracing::{debug, trace};
use web_time::Instant;

/// A pointer position in display units, stamped with the event time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub at: Instant,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, at: Instant) -> Self {
        Self { x, y, at }
    }
}

/// Decide whether a displacement and duration form an undo swipe
pub fn is_undo_swipe(dx: f32, dy: f32, elapsed: Duration, thresholds: &SwipeThresholds) -> bool {
    let horizontal_dominant = dx.abs() > thresholds.dominance_ratio * dy.abs();
    let leftward = dx < -thresholds.min_horizontal;
    let quick = elapsed < thresholds.max_duration();
    let far_enough = dx.hypot(dy) > thresholds.min_distance;

    horizontal_dominant && leftward && quick && far_enough
}

/// Tracks the pending pointer-down between events
#[derive(Debug, Clone, Default)]
pub struct SwipeDetector {
    thresholds: SwipeThresholds,
    down: Option<PointerSample>,
}

impl SwipeDetector {
    pub fn new(thresholds: SwipeThresholds) -> Self {
        Self {
            thresholds,
            down: None,
        }
    }

    pub fn thresholds(&self) -> &SwipeThresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: SwipeThresholds) {
        self.thresholds = thresholds;
    }

    /// Remember where the gesture started, replacing any unfinished one
    pub fn pointer_down(&mut self, sample: PointerSample) {
        trace!("[GESTURE] Pointer down at ({:.0}, {:.0})", sample.x, sample.y);
        self.down = Some(sample);
    }

    /// Finish the gesture; true if it was an undo swipe
    ///
    /// A pointer-up without a matching pointer-down is ignored.
    pub fn pointer_up(&mut self, sample: PointerSample) -> bool {
        let Some(down) = self.down.take() else {
            return false;
        };

        let dx = sample.x - down.x;
        let dy = sample.y - down.y;
        let elapsed = sample.at.saturating_duration_since(down.at);
        let swipe = is_undo_swipe(dx, dy, elapsed, &self.thresholds);

        if swipe {
            debug!(
                "[GESTURE] Undo swipe: dx={:.0} dy={:.0} in {:?}",
                dx, dy, elapsed
            );
        }
        swipe
    }

    /// Drop an unfinished gesture (pointer left the board)
    pub fn cancel(&mut self) {
        self.down = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.down.is_some()
    }
}
