pub mod team_sheet;

pub use team_sheet::{Roster, TeamSheet};

use crate::models::Innings;

/// Ordered player lists for the two teams (team 0 bats first)
pub trait RosterProvider {
    fn team_name(&self, team: usize) -> &str;

    fn players(&self, team: usize) -> &[String];

    fn batting_roster(&self, innings: Innings) -> &[String] {
        self.players(innings.batting_team())
    }

    fn bowling_roster(&self, innings: Innings) -> &[String] {
        self.players(innings.bowling_team())
    }
}
