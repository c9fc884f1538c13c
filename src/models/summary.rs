use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::player::{BattingRecord, BowlingRecord, FielderRecord, Innings};

/// Extras conceded in an innings, in runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    pub wides: u32,
    pub no_balls: u32,
}

impl Extras {
    pub fn total(&self) -> u32 {
        self.wides + self.no_balls
    }
}

/// Frozen state of a finished innings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningsSummary {
    pub innings: Innings,

    /// Name of the team that batted
    pub batting_team: String,

    pub runs: u32,
    pub wickets: u32,

    /// Legal balls bowled
    pub balls: u32,

    /// Overs in `x.y` notation
    pub overs: String,

    pub extras: Extras,
    pub batting: Vec<BattingRecord>,
    pub bowling: Vec<BowlingRecord>,
    pub fielding: Vec<FielderRecord>,
}

/// How the result was achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Margin {
    /// Chasing side reached the target with this many wickets in hand
    Wickets(u32),
    /// Defending side held the chase this many runs short of a tie
    Runs(u32),
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Margin::Wickets(1) => write!(f, "1 wicket"),
            Margin::Wickets(n) => write!(f, "{} wickets", n),
            Margin::Runs(1) => write!(f, "1 run"),
            Margin::Runs(n) => write!(f, "{} runs", n),
        }
    }
}

/// Final result of a completed match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Index of the winning team (0 = team 1, batted first)
    pub winner: usize,
    pub winner_name: String,
    pub margin: Margin,
}

impl MatchResult {
    /// Innings in which the winning team batted
    pub fn winning_innings(&self) -> Innings {
        if self.winner == 0 {
            Innings::First
        } else {
            Innings::Second
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} won by {}", self.winner_name, self.margin)
    }
}

/// Best performer of the match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub name: String,
    pub reason: String,
    pub points: i64,
}

/// Everything the summary export needs from a finished match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub team1: String,
    pub team2: String,
    pub first_innings: InningsSummary,
    pub second_innings: InningsSummary,
    pub result: MatchResult,
    pub award: Option<Award>,
    pub generated_at: DateTime<Utc>,
}
