//! Evaluation bar scaling
//!
//! Maps a centipawn evaluation (White's perspective) to the fraction of the
//! advantage bar filled in White's favor.
//!
//! # Transform
//!
//! 1. Clamp to `[-1000, 1000]` centipawns
//! 2. Normalize to `[-1, 1]`
//! 3. Sign-preserving square root, `sign(x) * sqrt(|x|)`, which widens the
//!    region near equality and compresses large advantages
//! 4. Map to `[0, 1]` with `0.5 + 0.5 * compressed`
//!
//! Axis ticks are placed with the same transform so the fill edge and the
//! tick for the same evaluation always coincide.

use serde::{Deserialize, Serialize};

/// Evaluations beyond this many centipawns pin the bar
pub const EVAL_CLAMP: i32 = 1000;

/// More than one pawn
pub const SIGNIFICANT_THRESHOLD: i32 = 100;

/// More than three pawns
pub const DECISIVE_THRESHOLD: i32 = 300;

/// How lopsided an evaluation is, regardless of which side it favors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Magnitude {
    Quiet,
    Significant,
    Decisive,
}

/// Display fraction in `[0, 1]` for a White-perspective evaluation
pub fn scale(evaluation: i32) -> f64 {
    let clamped = evaluation.clamp(-EVAL_CLAMP, EVAL_CLAMP);
    let normalized = f64::from(clamped) / f64::from(EVAL_CLAMP);
    let compressed = normalized.signum() * normalized.abs().sqrt();
    0.5 + 0.5 * compressed
}

pub fn classify_magnitude(evaluation: i32) -> Magnitude {
    let magnitude = evaluation.unsigned_abs();
    if magnitude > DECISIVE_THRESHOLD as u32 {
        Magnitude::Decisive
    } else if magnitude > SIGNIFICANT_THRESHOLD as u32 {
        Magnitude::Significant
    } else {
        Magnitude::Quiet
    }
}

/// Oriented view over the scaling transform
///
/// Flipping changes only what is displayed; the evaluation passed in is never
/// altered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalBar {
    pub flipped: bool,
}

impl EvalBar {
    pub fn new(flipped: bool) -> Self {
        Self { flipped }
    }

    /// Filled fraction measured from the bottom of the bar
    pub fn fill_fraction(&self, evaluation: i32) -> f64 {
        self.orient(scale(evaluation))
    }

    /// Position of the axis tick labelled `level` centipawns
    pub fn tick_position(&self, level: i32) -> f64 {
        self.orient(scale(level))
    }

    /// Pawn-unit label, e.g. `+1.50` or `-0.30`
    pub fn display_text(&self, evaluation: i32) -> String {
        let shown = if self.flipped {
            evaluation.saturating_neg()
        } else {
            evaluation
        };
        format!("{:+.2}", f64::from(shown) / 100.0)
    }

    pub fn magnitude(&self, evaluation: i32) -> Magnitude {
        classify_magnitude(evaluation)
    }

    fn orient(&self, fraction: f64) -> f64 {
        if self.flipped {
            1.0 - fraction
        } else {
            fraction
        }
    }
}
