//! Evaluation history and move quality classification
//!
//! Every applied move reports the engine's evaluation of the resulting
//! position (centipawns, White's perspective). [`EvaluationHistory`] folds
//! that stream into one [`EvaluationPoint`] per move, tagging each with a
//! [`MoveQuality`].
//!
//! # Perspective
//!
//! The tag measures the change in the *mover's* favor. For a White move that
//! is `after - previous`; for a Black move both operands are negated first, so
//! a White-perspective rise of 150 is a 150 centipawn loss for Black.
//!
//! # Thresholds
//!
//! Checked most severe first:
//!
//! | Delta        | Quality      |
//! |--------------|--------------|
//! | `<= -200`    | Blunder      |
//! | `<= -100`    | Mistake      |
//! | `<= -50`     | Inaccuracy   |
//! | `>= 300`     | Brilliant    |
//! | `>= 100`     | Good         |
//! | otherwise    | Normal       |
//!
//! The first move of a game has nothing to compare against and is always
//! Normal. The fold is deterministic: replaying the same inputs yields the
//! same tags.
//!
//! # Undo
//!
//! Points are append-only; an undone move keeps its point. The baseline for
//! the next delta is moved with [`EvaluationHistory::rebase`] to the
//! evaluation of the position the undo returned to, or cleared when that
//! evaluation is unknown.

use crate::engine::Color;
use serde::{Deserialize, Serialize};

const BLUNDER_THRESHOLD: i32 = -200;
const MISTAKE_THRESHOLD: i32 = -100;
const INACCURACY_THRESHOLD: i32 = -50;
const BRILLIANT_THRESHOLD: i32 = 300;
const GOOD_THRESHOLD: i32 = 100;

/// Quality annotation for a single move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Brilliant,
    Good,
    Normal,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveQuality {
    pub const ALL: [MoveQuality; 6] = [
        MoveQuality::Brilliant,
        MoveQuality::Good,
        MoveQuality::Normal,
        MoveQuality::Inaccuracy,
        MoveQuality::Mistake,
        MoveQuality::Blunder,
    ];

    /// Classify a change in the mover's own favor
    pub fn from_delta(delta: i32) -> MoveQuality {
        if delta <= BLUNDER_THRESHOLD {
            MoveQuality::Blunder
        } else if delta <= MISTAKE_THRESHOLD {
            MoveQuality::Mistake
        } else if delta <= INACCURACY_THRESHOLD {
            MoveQuality::Inaccuracy
        } else if delta >= BRILLIANT_THRESHOLD {
            MoveQuality::Brilliant
        } else if delta >= GOOD_THRESHOLD {
            MoveQuality::Good
        } else {
            MoveQuality::Normal
        }
    }

    /// Annotation symbol, `None` for normal moves
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            MoveQuality::Brilliant => Some("!!"),
            MoveQuality::Good => Some("!"),
            MoveQuality::Normal => None,
            MoveQuality::Inaccuracy => Some("?!"),
            MoveQuality::Mistake => Some("?"),
            MoveQuality::Blunder => Some("??"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "brilliant",
            MoveQuality::Good => "good",
            MoveQuality::Normal => "normal",
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Mistake => "mistake",
            MoveQuality::Blunder => "blunder",
        }
    }
}

/// One recorded move
///
/// Appended once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPoint {
    pub move_number: u32,
    /// Evaluation after the move, White's perspective
    pub evaluation: i32,
    pub quality: MoveQuality,
    pub mover: Color,
    /// Move text, e.g. `e2e4`
    pub label: Option<String>,
}

/// Per-side tag counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualitySummary {
    pub brilliant: usize,
    pub good: usize,
    pub normal: usize,
    pub inaccuracies: usize,
    pub mistakes: usize,
    pub blunders: usize,
}

impl QualitySummary {
    fn add(&mut self, quality: MoveQuality) {
        match quality {
            MoveQuality::Brilliant => self.brilliant += 1,
            MoveQuality::Good => self.good += 1,
            MoveQuality::Normal => self.normal += 1,
            MoveQuality::Inaccuracy => self.inaccuracies += 1,
            MoveQuality::Mistake => self.mistakes += 1,
            MoveQuality::Blunder => self.blunders += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.brilliant + self.good + self.normal + self.inaccuracies + self.mistakes + self.blunders
    }
}

/// Running classifier state
#[derive(Debug, Clone, Default)]
pub struct EvaluationHistory {
    previous_evaluation: Option<i32>,
    points: Vec<EvaluationPoint>,
}

impl EvaluationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the evaluation that followed a move and return its tag
    pub fn record_move(
        &mut self,
        eval_after: i32,
        move_number: u32,
        was_white_move: bool,
        label: Option<String>,
    ) -> MoveQuality {
        let quality = match self.previous_evaluation {
            None => MoveQuality::Normal,
            Some(previous) => {
                let delta = if was_white_move {
                    eval_after.saturating_sub(previous)
                } else {
                    eval_after.saturating_neg().saturating_sub(previous.saturating_neg())
                };
                MoveQuality::from_delta(delta)
            }
        };

        let mover = if was_white_move {
            Color::White
        } else {
            Color::Black
        };

        self.points.push(EvaluationPoint {
            move_number,
            evaluation: eval_after,
            quality,
            mover,
            label,
        });
        self.previous_evaluation = Some(eval_after);
        quality
    }

    /// Measure the next move against `evaluation` instead of the last point
    pub fn rebase(&mut self, evaluation: Option<i32>) {
        self.previous_evaluation = evaluation;
    }

    /// Forget everything (new game)
    pub fn reset(&mut self) {
        self.points.clear();
        self.previous_evaluation = None;
    }

    pub fn points(&self) -> &[EvaluationPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&EvaluationPoint> {
        self.points.last()
    }

    pub fn previous_evaluation(&self) -> Option<i32> {
        self.previous_evaluation
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn by_quality(&self, quality: MoveQuality) -> impl Iterator<Item = &EvaluationPoint> {
        self.points.iter().filter(move |p| p.quality == quality)
    }

    pub fn by_mover(&self, mover: Color) -> impl Iterator<Item = &EvaluationPoint> {
        self.points.iter().filter(move |p| p.mover == mover)
    }

    pub fn blunders(&self) -> impl Iterator<Item = &EvaluationPoint> {
        self.by_quality(MoveQuality::Blunder)
    }

    pub fn summary(&self, mover: Color) -> QualitySummary {
        let mut summary = QualitySummary::default();
        for point in self.by_mover(mover) {
            summary.add(point.quality);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_move_is_normal() {
        //! Nothing to compare against on the first move
        let mut history = EvaluationHistory::new();
        assert_eq!(history.record_move(-900, 1, true, None), MoveQuality::Normal);
        assert_eq!(history.previous_evaluation(), Some(-900));
    }

    #[test]
    fn test_white_perspective_delta() {
        //! A 150 centipawn rise is good for White
        let mut history = EvaluationHistory::new();
        history.record_move(0, 1, false, None);
        assert_eq!(history.record_move(150, 2, true, None), MoveQuality::Good);
    }

    #[test]
    fn test_black_perspective_delta() {
        //! The same rise is a 150 centipawn loss when Black moved
        let mut history = EvaluationHistory::new();
        history.record_move(0, 1, true, None);
        assert_eq!(history.record_move(150, 1, false, None), MoveQuality::Mistake);
    }

    #[test]
    fn test_threshold_boundaries() {
        //! Boundaries are inclusive, severe tags checked first
        assert_eq!(MoveQuality::from_delta(-200), MoveQuality::Blunder);
        assert_eq!(MoveQuality::from_delta(-199), MoveQuality::Mistake);
        assert_eq!(MoveQuality::from_delta(-100), MoveQuality::Mistake);
        assert_eq!(MoveQuality::from_delta(-99), MoveQuality::Inaccuracy);
        assert_eq!(MoveQuality::from_delta(-50), MoveQuality::Inaccuracy);
        assert_eq!(MoveQuality::from_delta(-49), MoveQuality::Normal);
        assert_eq!(MoveQuality::from_delta(99), MoveQuality::Normal);
        assert_eq!(MoveQuality::from_delta(100), MoveQuality::Good);
        assert_eq!(MoveQuality::from_delta(299), MoveQuality::Good);
        assert_eq!(MoveQuality::from_delta(300), MoveQuality::Brilliant);
    }

    #[test]
    fn test_replay_is_deterministic() {
        //! Same inputs, same tags
        let inputs = [
            (20, 1, true),
            (-40, 1, false),
            (-300, 2, true),
            (50, 2, false),
            (400, 3, true),
            (390, 3, false),
        ];
        let replay = || {
            let mut history = EvaluationHistory::new();
            inputs
                .iter()
                .map(|&(eval, number, white)| history.record_move(eval, number, white, None))
                .collect::<Vec<_>>()
        };
        let first = replay();
        assert_eq!(first, replay());
        assert_eq!(
            first,
            vec![
                MoveQuality::Normal,
                MoveQuality::Normal,
                MoveQuality::Blunder,
                MoveQuality::Blunder,
                MoveQuality::Brilliant,
                MoveQuality::Normal,
            ]
        );
    }

    #[test]
    fn test_reset_clears_memory() {
        //! After reset the next move is a first move again
        let mut history = EvaluationHistory::new();
        history.record_move(0, 1, true, None);
        history.record_move(500, 1, false, None);
        history.reset();
        assert!(history.is_empty());
        assert_eq!(history.previous_evaluation(), None);
        assert_eq!(history.record_move(-500, 1, true, None), MoveQuality::Normal);
    }

    #[test]
    fn test_rebase_after_undo() {
        //! A blunder that was taken back does not inflate the next move
        let mut history = EvaluationHistory::new();
        history.record_move(20, 1, true, None);
        history.record_move(-480, 2, true, None);

        history.rebase(Some(20));
        assert_eq!(history.record_move(30, 2, true, None), MoveQuality::Normal);
        assert_eq!(history.len(), 3);

        history.rebase(None);
        assert_eq!(history.record_move(-900, 3, true, None), MoveQuality::Normal);
    }

    #[test]
    fn test_queries_and_summary() {
        //! Filters and per-side counts read from the recorded points
        let mut history = EvaluationHistory::new();
        history.record_move(30, 1, true, Some("e2e4".to_string()));
        history.record_move(280, 1, false, Some("f7f6".to_string()));
        history.record_move(200, 2, true, Some("d1h5".to_string()));

        let blunders: Vec<_> = history.blunders().collect();
        assert_eq!(blunders.len(), 1);
        assert_eq!(blunders[0].label.as_deref(), Some("f7f6"));
        assert_eq!(blunders[0].mover, Color::Black);

        assert_eq!(history.by_mover(Color::White).count(), 2);
        let white = history.summary(Color::White);
        assert_eq!(white.normal, 1);
        assert_eq!(white.inaccuracies, 1);
        assert_eq!(white.total(), 2);
        assert_eq!(history.summary(Color::Black).blunders, 1);
    }

    #[test]
    fn test_symbols() {
        //! Normal moves carry no symbol
        let symbols: Vec<_> = MoveQuality::ALL.iter().map(|q| q.symbol()).collect();
        assert_eq!(
            symbols,
            vec![Some("!!"), Some("!"), None, Some("?!"), Some("?"), Some("??")]
        );
    }
}
