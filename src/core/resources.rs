//! Session-wide settings
//!
//! `CoreSettings` gathers every tunable the interaction core reads: whether
//! best-move suggestions run, how long the search waits for the position to
//! settle, the swipe-to-undo gesture thresholds and the evaluation bar
//! orientation. It is serialized as JSON by [`super::settings_persistence`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings read by the controller, the search coordinator and the evaluation bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    /// Run the best-move search after every position change
    pub suggestions_enabled: bool,

    /// Quiet period before a search pass starts, in milliseconds
    ///
    /// Any position change inside the window restarts it.
    pub settle_delay_ms: u64,

    /// Interpret a fast right-to-left swipe on the board as undo
    pub swipe_undo_enabled: bool,

    /// Gesture recognition thresholds
    pub swipe: SwipeThresholds,

    /// Board drawn from Black's side; flips the evaluation bar
    pub board_flipped: bool,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            suggestions_enabled: true,
            settle_delay_ms: 500,
            swipe_undo_enabled: false,
            swipe: SwipeThresholds::default(),
            board_flipped: false,
        }
    }
}

impl CoreSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Swipe-to-undo thresholds, in display units and milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeThresholds {
    /// Leftward travel required (the gesture needs `dx < -min_horizontal`)
    pub min_horizontal: f32,
    /// Horizontal travel must exceed this multiple of vertical travel
    pub dominance_ratio: f32,
    /// Gestures slower than this are ignored
    pub max_duration_ms: u64,
    /// Minimum straight-line travel
    pub min_distance: f32,
}

impl Default for SwipeThresholds {
    fn default() -> Self {
        Self {
            min_horizontal: 80.0,
            dominance_ratio: 1.5,
            max_duration_ms: 350,
            min_distance: 90.0,
        }
    }
}

impl SwipeThresholds {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        //! Defaults match the documented behavior
        let settings = CoreSettings::default();
        assert!(settings.suggestions_enabled);
        assert!(!settings.swipe_undo_enabled);
        assert_eq!(settings.settle_delay(), Duration::from_millis(500));
        assert_eq!(settings.swipe.max_duration(), Duration::from_millis(350));
        assert_eq!(settings.swipe.min_horizontal, 80.0);
        assert_eq!(settings.swipe.min_distance, 90.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        //! Missing fields fall back to their defaults
        let settings: CoreSettings =
            serde_json::from_str(r#"{"swipe_undo_enabled": true, "swipe": {"max_duration_ms": 400}}"#)
                .unwrap();
        assert!(settings.swipe_undo_enabled);
        assert!(settings.suggestions_enabled);
        assert_eq!(settings.swipe.max_duration_ms, 400);
        assert_eq!(settings.swipe.dominance_ratio, 1.5);
    }
}
