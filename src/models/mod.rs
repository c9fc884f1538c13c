pub mod delivery;
pub mod player;
pub mod summary;

pub use delivery::{
    BallInput, Delivery, DeliveryKind, EXTRA_PENALTY, MAX_BAT_RUNS, MAX_EXTRA_PENALTY, WALL_BONUS,
};
pub use player::{BattingRecord, BowlingRecord, FielderRecord, Innings, PlayerKey};
pub use summary::{Award, Extras, InningsSummary, Margin, MatchResult, MatchSummary};
