use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a single recorded ball
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    /// Legal ball with a run value 0-6 (0 is a dot ball)
    Runs(u8),
    /// Wide: penalty extra, not part of the over
    Wide,
    /// No-ball: penalty extra, not part of the over
    NoBall,
    /// Wicket: legal ball, no runs
    Wicket,
}

impl DeliveryKind {
    /// Wides and no-balls do not take an over slot
    pub fn is_legal(&self) -> bool {
        !matches!(self, DeliveryKind::Wide | DeliveryKind::NoBall)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryKind::Runs(_) => "runs",
            DeliveryKind::Wide => "wide",
            DeliveryKind::NoBall => "no_ball",
            DeliveryKind::Wicket => "wicket",
        }
    }
}

/// A scoring action as entered by the scorer, before resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallInput {
    pub kind: DeliveryKind,

    /// Runs declared for the ball (for extras this includes the penalty)
    pub declared_runs: u32,

    /// Runs actually run by the batsman when scored separately from the total
    pub batsman_runs: Option<u32>,
}

/// Penalty run for a wide or a no-ball
pub const EXTRA_PENALTY: u32 = 1;

/// Bonus run awarded to the batting side for hitting the wall
pub const WALL_BONUS: u32 = 1;

/// Largest bulk penalty for one wide or no-ball (a no-ball hit for six)
pub const MAX_EXTRA_PENALTY: u32 = 7;

/// Most runs the batsmen can be credited off a single ball
pub const MAX_BAT_RUNS: u32 = 6;

impl BallInput {
    /// Plain legal ball worth `runs`
    pub fn runs(runs: u8) -> Self {
        Self {
            kind: DeliveryKind::Runs(runs),
            declared_runs: runs as u32,
            batsman_runs: None,
        }
    }

    pub fn dot() -> Self {
        Self::runs(0)
    }

    /// Wide with a bulk penalty (1, or 5 for a wide that ran to the boundary)
    pub fn wide(penalty: u32) -> Self {
        Self {
            kind: DeliveryKind::Wide,
            declared_runs: penalty,
            batsman_runs: None,
        }
    }

    /// No-ball with a bulk penalty
    pub fn no_ball(penalty: u32) -> Self {
        Self {
            kind: DeliveryKind::NoBall,
            declared_runs: penalty,
            batsman_runs: None,
        }
    }

    /// Ball off the wall: the batsman ran `runs` and the side gets the wall bonus on top
    pub fn wall(runs: u8) -> Self {
        Self {
            kind: DeliveryKind::Runs(runs),
            declared_runs: runs as u32 + WALL_BONUS,
            batsman_runs: Some(runs as u32),
        }
    }

    /// Wide on which the batsmen also ran `runs`
    pub fn wide_with_runs(runs: u8) -> Self {
        Self {
            kind: DeliveryKind::Wide,
            declared_runs: runs as u32 + EXTRA_PENALTY,
            batsman_runs: Some(runs as u32),
        }
    }

    /// No-ball on which the batsmen also ran `runs`
    pub fn no_ball_with_runs(runs: u8) -> Self {
        Self {
            kind: DeliveryKind::NoBall,
            declared_runs: runs as u32 + EXTRA_PENALTY,
            batsman_runs: Some(runs as u32),
        }
    }
}

/// One recorded ball
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub kind: DeliveryKind,

    /// Runs added to the team total, penalties and bonuses included
    pub team_runs: u32,

    /// Runs credited to the batsman's ledger
    pub batsman_runs: u32,

    /// Runs that govern strike rotation (ground actually covered)
    pub rotation_runs: u32,

    /// Fielder credited with the catch, wickets only
    pub fielder: Option<String>,
}

impl Delivery {
    pub fn is_legal(&self) -> bool {
        self.kind.is_legal()
    }

    pub fn is_wicket(&self) -> bool {
        self.kind == DeliveryKind::Wicket
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeliveryKind::Wicket => write!(f, "W"),
            DeliveryKind::Wide => write!(f, "{}WD", self.team_runs),
            DeliveryKind::NoBall => write!(f, "{}NB", self.team_runs),
            DeliveryKind::Runs(_) => write!(f, "{}", self.team_runs),
        }
    }
}
