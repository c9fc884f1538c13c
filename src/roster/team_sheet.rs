use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::RosterProvider;
use crate::models::Innings;

/// Most players a team sheet may list
pub const MAX_SQUAD: usize = 11;

/// One team as written in the roster file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSheet {
    pub name: String,
    /// Batting order
    #[serde(default)]
    pub players: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    teams: Vec<TeamSheet>,
}

/// Both team sheets of a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    teams: [TeamSheet; 2],
}

impl Roster {
    /// Two named teams without player lists
    pub fn named(team1: &str, team2: &str) -> Self {
        Self {
            teams: [
                TeamSheet {
                    name: team1.to_string(),
                    players: Vec::new(),
                },
                TeamSheet {
                    name: team2.to_string(),
                    players: Vec::new(),
                },
            ],
        }
    }

    pub fn new(team1: TeamSheet, team2: TeamSheet) -> Result<Self> {
        let teams = [normalize_sheet(team1)?, normalize_sheet(team2)?];
        Ok(Self { teams })
    }

    /// Load a roster from a JSON file of the form `{"teams": [{"name": .., "players": [..]}, ..]}`
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster file {}", path.display()))?;

        let file: RosterFile =
            serde_json::from_str(&content).context("Failed to parse roster JSON")?;

        let [team1, team2]: [TeamSheet; 2] = match file.teams.try_into() {
            Ok(teams) => teams,
            Err(teams) => bail!("Roster must list exactly 2 teams, found {}", teams.len()),
        };

        let roster = Self::new(team1, team2)?;
        info!(
            "Loaded roster: {} ({} players) vs {} ({} players)",
            roster.teams[0].name,
            roster.teams[0].players.len(),
            roster.teams[1].name,
            roster.teams[1].players.len()
        );
        Ok(roster)
    }

    /// Whether `name` is on the sheet of the team batting in `innings`, ignoring case
    pub fn is_batting(&self, innings: Innings, name: &str) -> bool {
        contains(self.batting_roster(innings), name)
    }

    /// Whether `name` is on the sheet of the team bowling in `innings`, ignoring case
    pub fn is_bowling(&self, innings: Innings, name: &str) -> bool {
        contains(self.bowling_roster(innings), name)
    }

    pub fn has_players(&self) -> bool {
        self.teams.iter().any(|t| !t.players.is_empty())
    }
}

impl RosterProvider for Roster {
    fn team_name(&self, team: usize) -> &str {
        &self.teams[team].name
    }

    fn players(&self, team: usize) -> &[String] {
        &self.teams[team].players
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn contains(players: &[String], name: &str) -> bool {
    let wanted = normalize(name);
    players.iter().any(|p| normalize(p) == wanted)
}

fn normalize_sheet(sheet: TeamSheet) -> Result<TeamSheet> {
    let name = sheet.name.trim().to_string();
    if name.is_empty() {
        bail!("Team name cannot be empty");
    }
    if sheet.players.len() > MAX_SQUAD {
        bail!(
            "{} lists {} players, at most {} allowed",
            name,
            sheet.players.len(),
            MAX_SQUAD
        );
    }

    let mut seen = HashSet::new();
    let mut players = Vec::with_capacity(sheet.players.len());
    for player in sheet.players {
        let player = player.trim().to_string();
        if player.is_empty() {
            bail!("{} has a player with an empty name", name);
        }
        if !seen.insert(normalize(&player)) {
            bail!("{} lists {} twice", name, player);
        }
        players.push(player);
    }

    debug!("Team sheet {}: {:?}", name, players);
    Ok(TeamSheet { name, players })
}
