pub mod award;
pub mod ledger;
pub mod resolver;
pub mod scoreboard;
pub mod sequencer;
pub mod undo;

pub use award::best_performer;
pub use ledger::StatsLedger;
pub use resolver::{resolve, Resolution};
pub use scoreboard::{
    BallOutcome, BatterSlot, Chase, InningsEnd, Match, MatchConfig, Phase, ScoreView, Settlement,
};
pub use sequencer::OverSequencer;
pub use undo::UndoEngine;
