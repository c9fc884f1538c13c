use serde::{Deserialize, Serialize};

use super::ledger::StatsLedger;
use super::scoreboard::{BatterSlot, Phase};
use crate::error::ScoringError;
use crate::models::Delivery;

/// Pre-delivery state needed to invert exactly one delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoSnapshot {
    /// The delivery about to be recorded
    pub delivery: Delivery,

    /// Batsman who faced it
    pub batsman: String,

    pub bowler: String,

    /// Slot on strike before the delivery, which the batsman occupied
    pub facing: BatterSlot,

    pub phase: Phase,
    pub ledger: StatsLedger,
}

/// Single-level undo: a new delivery replaces the held snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoEngine {
    snapshot: Option<UndoSnapshot>,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the state captured immediately before a delivery is applied
    pub fn record(&mut self, snapshot: UndoSnapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Hand over the held snapshot, leaving nothing to undo
    pub fn take(&mut self) -> Result<UndoSnapshot, ScoringError> {
        self.snapshot.take().ok_or(ScoringError::NothingToUndo)
    }

    pub fn is_available(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}
