use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::models::Delivery;

/// Legal deliveries in a complete over
pub const BALLS_PER_OVER: usize = 6;

/// Result of removing the most recent delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoneDelivery {
    pub delivery: Delivery,

    /// The delivery belonged to an already closed over, which was reopened
    pub crossed_over_boundary: bool,

    /// Reverting this delivery also reverts the end-of-over strike change.
    ///
    /// Only set when crossing a boundary: if the over's last legal ball had an odd
    /// rotation, its own rotation and the end-of-over rotation cancelled out.
    pub reverts_boundary_rotation: bool,
}

/// Accumulates deliveries into overs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverSequencer {
    current: Vec<Delivery>,
    completed: Vec<Vec<Delivery>>,
}

impl OverSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries of the over in progress
    pub fn current(&self) -> &[Delivery] {
        &self.current
    }

    /// Closed overs, oldest first
    pub fn completed(&self) -> &[Vec<Delivery>] {
        &self.completed
    }

    /// Legal deliveries in the over in progress
    pub fn legal_count(&self) -> usize {
        self.current.iter().filter(|d| d.is_legal()).count()
    }

    pub fn is_over_complete(&self) -> bool {
        self.legal_count() >= BALLS_PER_OVER
    }

    /// True at the first ball of any over after the first
    pub fn at_new_over(&self) -> bool {
        self.current.is_empty() && !self.completed.is_empty()
    }

    /// Append a delivery to the over in progress
    pub fn append(&mut self, delivery: Delivery) -> Result<(), ScoringError> {
        if self.is_over_complete() {
            return Err(ScoringError::OverFull);
        }
        self.current.push(delivery);
        Ok(())
    }

    /// Freeze the current over once it holds six legal deliveries.
    ///
    /// Returns true when an over was closed; the caller owes the end-of-over strike change.
    pub fn try_close_over(&mut self) -> bool {
        if !self.is_over_complete() {
            return false;
        }
        let over = std::mem::take(&mut self.current);
        self.completed.push(over);
        true
    }

    /// Remove the most recent delivery, reopening the previous over if needed
    pub fn undo_last(&mut self) -> Option<UndoneDelivery> {
        if let Some(delivery) = self.current.pop() {
            return Some(UndoneDelivery {
                delivery,
                crossed_over_boundary: false,
                reverts_boundary_rotation: false,
            });
        }

        let mut over = self.completed.pop()?;
        let reverts_boundary_rotation = over
            .iter()
            .rev()
            .find(|d| d.is_legal())
            .map(|d| d.rotation_runs % 2 == 0)
            .unwrap_or(false);

        let delivery = over.pop()?;
        if !over.is_empty() {
            self.current = over;
        }

        Some(UndoneDelivery {
            delivery,
            crossed_over_boundary: true,
            reverts_boundary_rotation,
        })
    }

    /// Every delivery of the innings in order
    pub fn deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.completed.iter().flatten().chain(self.current.iter())
    }

    /// Team runs scored in a closed over
    pub fn over_runs(over: &[Delivery]) -> u32 {
        over.iter().map(|d| d.team_runs).sum()
    }

    /// Display form of each closed over, e.g. `Over 1: 1 4 W 1WD 0 0 2 (8 runs)`
    pub fn over_summaries(&self) -> Vec<String> {
        self.completed
            .iter()
            .enumerate()
            .map(|(i, over)| {
                let balls: Vec<String> = over.iter().map(|d| d.to_string()).collect();
                format!(
                    "Over {}: {} ({} runs)",
                    i + 1,
                    balls.join(" "),
                    Self::over_runs(over)
                )
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.completed.clear();
    }
}
