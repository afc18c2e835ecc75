//! Watch channels connecting the board controller to the search coordinator
//!
//! - [`PositionFeed`] carries the controller's latest position snapshot,
//!   stamped with a generation number that increases on every publish
//! - [`SuggestionSwitch`] carries the "suggestions enabled" flag
//! - [`Suggestion`] is what the coordinator publishes back
//!
//! The controller publishes while it still holds the engine lease, so a probe
//! that acquires the lease afterwards always sees the new generation.

use super::search::EvaluatedMove;
use crate::engine::Position;
use serde::Serialize;
use tokio::sync::watch;

/// Position as last refreshed by the controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionSnapshot {
    /// 0 until the first publish
    pub generation: u64,
    pub position: Option<Position>,
}

pub type PositionReceiver = watch::Receiver<PositionSnapshot>;

/// Publishing side of the position channel
#[derive(Debug)]
pub struct PositionFeed {
    tx: watch::Sender<PositionSnapshot>,
}

impl Default for PositionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PositionSnapshot::default());
        Self { tx }
    }

    /// Publish a new snapshot and return its generation
    ///
    /// Publishing works with or without subscribers.
    pub fn publish(&self, position: Position) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.position = Some(position);
            generation = snapshot.generation;
        });
        generation
    }

    /// Announce that the engine position changed but is not known
    ///
    /// Bumps the generation with no position, which cancels any pass in
    /// flight and clears the suggestion until the next [`publish`](Self::publish).
    pub fn invalidate(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.position = None;
            generation = snapshot.generation;
        });
        generation
    }

    pub fn subscribe(&self) -> PositionReceiver {
        self.tx.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.tx.borrow().generation
    }
}

/// Publishing side of the enabled flag
#[derive(Debug)]
pub struct SuggestionSwitch {
    tx: watch::Sender<bool>,
}

impl SuggestionSwitch {
    pub fn new(enabled: bool) -> Self {
        let (tx, _rx) = watch::channel(enabled);
        Self { tx }
    }

    /// Change the flag; subscribers are only woken by an actual change
    pub fn set(&self, enabled: bool) {
        self.tx.send_if_modified(|current| {
            if *current == enabled {
                false
            } else {
                *current = enabled;
                true
            }
        });
    }

    pub fn is_enabled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Best-move suggestion for the current position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// `None` while calculating, when disabled, on failure, or in a terminal position
    pub best: Option<EvaluatedMove>,
    /// True only while a search pass is probing moves
    pub is_calculating: bool,
    /// Message from the engine failure that aborted the last pass
    pub error: Option<String>,
}

impl Suggestion {
    pub fn calculating() -> Self {
        Self {
            is_calculating: true,
            ..Self::default()
        }
    }

    pub fn finished(best: Option<EvaluatedMove>) -> Self {
        Self {
            best,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}
