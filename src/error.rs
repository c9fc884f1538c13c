use thiserror::Error;

/// Reasons a scoring operation is rejected.
///
/// Every variant leaves the match untouched: validation runs before any
/// snapshot is taken or any counter is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("please set the striker batsman name before scoring")]
    MissingStriker,

    #[error("please set the non-striker batsman name before scoring")]
    MissingNonStriker,

    #[error("please set the bowler name before scoring")]
    MissingBowler,

    #[error("the current over already has 6 legal deliveries; settle it first")]
    OverFull,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("fielder name cannot be empty")]
    EmptyFielderName,

    #[error("player name cannot be empty")]
    EmptyPlayerName,

    #[error("{0} bowled the previous over; confirm or change the bowler before the new over")]
    BowlerNotConfirmed(String),

    #[error("the innings is over; start the second innings to continue")]
    InningsOver,

    #[error("the match is over")]
    MatchOver,

    #[error("the second innings has already started")]
    AlreadySecondInnings,

    #[error("invalid runs for {kind}: {runs}")]
    InvalidRuns { kind: &'static str, runs: u32 },

    #[error("overs per innings must be a positive number")]
    InvalidOvers,
}
