pub mod scorer;

pub use scorer::{ScorerCommand, ScorerHandle, ScorerWorker};
