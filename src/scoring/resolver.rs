use crate::error::ScoringError;
use crate::models::{
    BallInput, Delivery, DeliveryKind, EXTRA_PENALTY, MAX_BAT_RUNS, MAX_EXTRA_PENALTY, WALL_BONUS,
};

/// Normalized effect of one ball on score, ledgers and strike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub team_runs: u32,
    pub batsman_runs: u32,
    pub rotation_runs: u32,
    pub is_legal: bool,
    pub is_four: bool,
    pub is_six: bool,
}

impl Resolution {
    pub fn into_delivery(self, kind: DeliveryKind, fielder: Option<String>) -> Delivery {
        Delivery {
            kind,
            team_runs: self.team_runs,
            batsman_runs: self.batsman_runs,
            rotation_runs: self.rotation_runs,
            fielder,
        }
    }
}

/// Classify a scoring input into team runs, batsman credit, rotation runs and legality.
///
/// When `batsman_runs` is supplied the input is a split delivery (a wall ball, or a
/// wide/no-ball the batsmen ran on) and scoring and rotation may diverge. Boundary
/// flags come from a plain run kind only; a split delivery is never a boundary.
///
/// The declared total must agree with the split, and extras are bounded by
/// `MAX_EXTRA_PENALTY` and `MAX_BAT_RUNS`.
pub fn resolve(input: &BallInput) -> Result<Resolution, ScoringError> {
    let kind = input.kind;
    let is_legal = kind.is_legal();
    let invalid = || ScoringError::InvalidRuns {
        kind: kind.as_str(),
        runs: input.declared_runs,
    };

    let resolution = match (kind, input.batsman_runs) {
        (DeliveryKind::Wicket, _) => Resolution {
            team_runs: 0,
            batsman_runs: 0,
            rotation_runs: 0,
            is_legal,
            is_four: false,
            is_six: false,
        },

        (DeliveryKind::Runs(value), _) if value > 6 => {
            return Err(ScoringError::InvalidRuns {
                kind: kind.as_str(),
                runs: value as u32,
            });
        }

        (DeliveryKind::Runs(value), None) => {
            if input.declared_runs != value as u32 {
                return Err(invalid());
            }
            Resolution {
                team_runs: input.declared_runs,
                batsman_runs: input.declared_runs,
                rotation_runs: input.declared_runs,
                is_legal,
                is_four: value == 4,
                is_six: value == 6,
            }
        }

        // Wall: the bonus goes to the batsman's tally, but only the ground covered rotates
        (DeliveryKind::Runs(value), Some(ran)) => {
            if ran != value as u32 || input.declared_runs != ran + WALL_BONUS {
                return Err(invalid());
            }
            Resolution {
                team_runs: input.declared_runs,
                batsman_runs: input.declared_runs,
                rotation_runs: ran,
                is_legal,
                is_four: false,
                is_six: false,
            }
        }

        // Bulk penalty: nothing to the batsman and no rotation
        (DeliveryKind::Wide | DeliveryKind::NoBall, None) => {
            if !(EXTRA_PENALTY..=MAX_EXTRA_PENALTY).contains(&input.declared_runs) {
                return Err(invalid());
            }
            Resolution {
                team_runs: input.declared_runs,
                batsman_runs: 0,
                rotation_runs: 0,
                is_legal,
                is_four: false,
                is_six: false,
            }
        }

        (DeliveryKind::Wide | DeliveryKind::NoBall, Some(ran)) => {
            if ran > MAX_BAT_RUNS || input.declared_runs != ran + EXTRA_PENALTY {
                return Err(invalid());
            }
            Resolution {
                team_runs: input.declared_runs,
                batsman_runs: ran,
                rotation_runs: ran,
                is_legal,
                is_four: false,
                is_six: false,
            }
        }
    };

    Ok(resolution)
}
