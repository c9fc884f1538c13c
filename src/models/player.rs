use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two innings of a match
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Innings {
    First,
    Second,
}

impl Innings {
    pub fn number(&self) -> u8 {
        match self {
            Innings::First => 1,
            Innings::Second => 2,
        }
    }

    /// Index of the team batting in this innings (team 1 bats first)
    pub fn batting_team(&self) -> usize {
        match self {
            Innings::First => 0,
            Innings::Second => 1,
        }
    }

    pub fn bowling_team(&self) -> usize {
        1 - self.batting_team()
    }
}

impl fmt::Display for Innings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Innings::First => write!(f, "1st Innings"),
            Innings::Second => write!(f, "2nd Innings"),
        }
    }
}

/// Ledger key: statistics are tracked separately per innings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerKey {
    pub name: String,
    pub innings: Innings,
}

impl PlayerKey {
    pub fn new(name: &str, innings: Innings) -> Self {
        Self {
            name: name.to_string(),
            innings,
        }
    }
}

/// Batting figures for one player in one innings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingRecord {
    pub name: String,
    pub innings: Innings,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
}

impl BattingRecord {
    /// Runs per hundred balls, 0 before the first ball
    pub fn strike_rate(&self) -> f64 {
        if self.balls == 0 {
            return 0.0;
        }
        self.runs as f64 / self.balls as f64 * 100.0
    }
}

/// Bowling figures for one player in one innings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlingRecord {
    pub name: String,
    pub innings: Innings,
    pub runs_conceded: u32,
    pub wickets: u32,
    /// Legal balls bowled
    pub balls: u32,
    pub wides: u32,
    pub no_balls: u32,
}

impl BowlingRecord {
    /// Overs in cricket notation: 1.3 means one over and three balls, not 1.5 overs
    pub fn overs(&self) -> f64 {
        (self.balls / 6) as f64 + (self.balls % 6) as f64 / 10.0
    }

    pub fn overs_display(&self) -> String {
        format!("{}.{}", self.balls / 6, self.balls % 6)
    }

    /// Runs conceded per over in cricket notation (10 off 1.3 is 7.69), 0 before the first legal ball
    pub fn economy(&self) -> f64 {
        if self.balls == 0 {
            return 0.0;
        }
        self.runs_conceded as f64 / self.overs()
    }
}

/// Catches held by one fielder in one innings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FielderRecord {
    pub name: String,
    pub innings: Innings,
    pub catches: u32,
}
