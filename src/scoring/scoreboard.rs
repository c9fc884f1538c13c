use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::award::best_performer;
use super::ledger::StatsLedger;
use super::resolver::resolve;
use super::sequencer::OverSequencer;
use super::undo::{UndoEngine, UndoSnapshot};
use crate::error::ScoringError;
use crate::models::{
    BallInput, Delivery, DeliveryKind, Extras, Innings, InningsSummary, Margin, MatchResult,
    MatchSummary,
};
use crate::roster::RosterProvider;

/// Wickets available to a side when no roster says otherwise
pub const DEFAULT_WICKET_CAPACITY: u32 = 10;

/// Match length, fixed before the first ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    overs_per_innings: u32,
}

impl MatchConfig {
    pub fn new(overs_per_innings: u32) -> Result<Self, ScoringError> {
        if overs_per_innings == 0 {
            return Err(ScoringError::InvalidOvers);
        }
        Ok(Self { overs_per_innings })
    }

    pub fn overs_per_innings(&self) -> u32 {
        self.overs_per_innings
    }

    pub fn configured_balls(&self) -> u32 {
        self.overs_per_innings * 6
    }
}

/// One of the two batting positions at the crease
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatterSlot {
    #[default]
    First,
    Second,
}

impl BatterSlot {
    pub fn other(&self) -> Self {
        match self {
            BatterSlot::First => BatterSlot::Second,
            BatterSlot::Second => BatterSlot::First,
        }
    }

    fn index(&self) -> usize {
        match self {
            BatterSlot::First => 0,
            BatterSlot::Second => 1,
        }
    }
}

/// The two batsmen in and which of them is on strike
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crease {
    batters: [Option<String>; 2],
    facing: BatterSlot,
}

impl Crease {
    pub fn facing(&self) -> BatterSlot {
        self.facing
    }

    pub fn name(&self, slot: BatterSlot) -> Option<&str> {
        self.batters[slot.index()].as_deref()
    }

    pub fn striker(&self) -> Option<&str> {
        self.name(self.facing)
    }

    pub fn non_striker(&self) -> Option<&str> {
        self.name(self.facing.other())
    }

    /// First empty slot, the one on strike first
    pub fn vacant_slot(&self) -> Option<BatterSlot> {
        [self.facing, self.facing.other()]
            .into_iter()
            .find(|slot| self.batters[slot.index()].is_none())
    }

    fn swap(&mut self) {
        self.facing = self.facing.other();
    }

    fn set(&mut self, slot: BatterSlot, name: String) {
        self.batters[slot.index()] = Some(name);
    }

    fn vacate(&mut self, slot: BatterSlot) {
        self.batters[slot.index()] = None;
    }
}

/// Why the first innings ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsEnd {
    OversExhausted,
    AllOut,
}

/// Match lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    FirstInnings,
    /// Waiting for the second innings to be started
    FirstInningsComplete(InningsEnd),
    SecondInnings,
    Complete(MatchResult),
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::FirstInnings => "first_innings",
            Phase::FirstInningsComplete(_) => "first_innings_complete",
            Phase::SecondInnings => "second_innings",
            Phase::Complete(_) => "complete",
        }
    }
}

/// Chase parameters of the second innings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chase {
    /// First-innings runs + 1
    pub target: u32,
    /// Legal balls available to reach the target
    pub max_balls: u32,
}

/// Deferred half of a delivery: over roll-over and the result announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PendingSettlement {
    close_over: bool,
    announce: bool,
}

/// What `settle` did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    pub over_closed: bool,
    pub result: Option<MatchResult>,
}

/// Immediate effect of an accepted delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallOutcome {
    pub delivery: Delivery,
    /// `settle` must run before the next delivery
    pub settle_pending: bool,
    pub innings_complete: bool,
    pub result: Option<MatchResult>,
}

/// Everything a scoreboard display shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreView {
    pub innings: Innings,
    pub phase: &'static str,
    pub batting_team: String,
    pub bowling_team: String,
    pub runs: u32,
    pub wickets: u32,
    pub overs: String,
    pub run_rate: String,
    pub target: Option<u32>,
    pub runs_needed: u32,
    pub balls_remaining: u32,
    pub required_run_rate: String,
    pub extras: Extras,
    pub striker: Option<String>,
    pub non_striker: Option<String>,
    pub bowler: Option<String>,
    pub current_over: Vec<String>,
    pub can_undo: bool,
}

/// Two-innings limited-overs match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    config: MatchConfig,
    teams: [String; 2],
    wicket_capacity: [u32; 2],
    innings: Innings,
    phase: Phase,
    runs: u32,
    wickets: u32,
    balls: u32,
    extras: Extras,
    sequencer: OverSequencer,
    ledger: StatsLedger,
    crease: Crease,
    bowler: Option<String>,
    chase: Option<Chase>,
    first_innings: Option<InningsSummary>,
    second_innings: Option<InningsSummary>,
    undo: UndoEngine,
    pending: Option<PendingSettlement>,
}

/// All-out threshold for a squad: everyone but the last batsman standing
pub fn wicket_capacity(squad_size: usize) -> u32 {
    if squad_size < 2 {
        DEFAULT_WICKET_CAPACITY
    } else {
        (squad_size as u32 - 1).min(DEFAULT_WICKET_CAPACITY)
    }
}

impl Match {
    /// Create a match between two named teams; team 1 bats first
    pub fn new(config: MatchConfig, team1: &str, team2: &str) -> Self {
        Self {
            config,
            teams: [team1.to_string(), team2.to_string()],
            wicket_capacity: [DEFAULT_WICKET_CAPACITY; 2],
            innings: Innings::First,
            phase: Phase::FirstInnings,
            runs: 0,
            wickets: 0,
            balls: 0,
            extras: Extras::default(),
            sequencer: OverSequencer::new(),
            ledger: StatsLedger::new(),
            crease: Crease::default(),
            bowler: None,
            chase: None,
            first_innings: None,
            second_innings: None,
            undo: UndoEngine::new(),
            pending: None,
        }
    }

    /// Create a match whose team names and all-out thresholds come from a roster
    pub fn with_roster(config: MatchConfig, roster: &dyn RosterProvider) -> Self {
        let mut m = Self::new(config, roster.team_name(0), roster.team_name(1));
        m.wicket_capacity = [
            wicket_capacity(roster.players(0).len()),
            wicket_capacity(roster.players(1).len()),
        ];
        m
    }

    pub fn config(&self) -> MatchConfig {
        self.config
    }

    pub fn team_name(&self, team: usize) -> &str {
        &self.teams[team]
    }

    pub fn innings(&self) -> Innings {
        self.innings
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn wickets(&self) -> u32 {
        self.wickets
    }

    /// Legal balls bowled this innings
    pub fn balls(&self) -> u32 {
        self.balls
    }

    pub fn extras(&self) -> Extras {
        self.extras
    }

    pub fn sequencer(&self) -> &OverSequencer {
        &self.sequencer
    }

    pub fn ledger(&self) -> &StatsLedger {
        &self.ledger
    }

    pub fn crease(&self) -> &Crease {
        &self.crease
    }

    pub fn bowler(&self) -> Option<&str> {
        self.bowler.as_deref()
    }

    pub fn chase(&self) -> Option<Chase> {
        self.chase
    }

    pub fn first_innings(&self) -> Option<&InningsSummary> {
        self.first_innings.as_ref()
    }

    pub fn second_innings(&self) -> Option<&InningsSummary> {
        self.second_innings.as_ref()
    }

    pub fn result(&self) -> Option<&MatchResult> {
        match &self.phase {
            Phase::Complete(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete(_))
    }

    pub fn can_undo(&self) -> bool {
        self.undo.is_available()
    }

    pub fn settlement_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Overs bowled this innings in `x.y` notation
    pub fn overs_display(&self) -> String {
        format!("{}.{}", self.balls / 6, self.balls % 6)
    }

    /// Runs per six legal balls this innings, 0 before the first legal ball
    pub fn current_run_rate(&self) -> f64 {
        if self.balls == 0 {
            return 0.0;
        }
        self.runs as f64 / self.balls as f64 * 6.0
    }

    /// Runs still needed to reach the target, 0 outside a chase
    pub fn runs_needed(&self) -> u32 {
        self.chase
            .map(|c| c.target.saturating_sub(self.runs))
            .unwrap_or(0)
    }

    pub fn balls_remaining(&self) -> u32 {
        self.chase
            .map(|c| c.max_balls.saturating_sub(self.balls))
            .unwrap_or(0)
    }

    /// Runs needed per six balls, 0 outside a chase or with no balls left
    pub fn required_run_rate(&self) -> f64 {
        let remaining = self.balls_remaining();
        if self.chase.is_none() || remaining == 0 {
            return 0.0;
        }
        self.runs_needed() as f64 / remaining as f64 * 6.0
    }

    pub fn set_batter(&mut self, slot: BatterSlot, name: &str) -> Result<(), ScoringError> {
        let name = non_empty(name, ScoringError::EmptyPlayerName)?;
        self.crease.set(slot, name);
        Ok(())
    }

    /// Send a new batsman to the slot vacated by the last wicket (the striker's end if none is vacant)
    pub fn bring_in_batter(&mut self, name: &str) -> Result<BatterSlot, ScoringError> {
        let slot = self.crease.vacant_slot().unwrap_or(self.crease.facing);
        self.set_batter(slot, name)?;
        Ok(slot)
    }

    pub fn set_bowler(&mut self, name: &str) -> Result<(), ScoringError> {
        self.bowler = Some(non_empty(name, ScoringError::EmptyPlayerName)?);
        Ok(())
    }

    /// Manual strike change, outside of undo
    pub fn swap_strike(&mut self) {
        self.crease.swap();
    }

    /// True when the bowler about to start a new over also has the most recent bowling record.
    ///
    /// Only the last-created record is compared, not the bowler of the previous over.
    pub fn needs_bowler_confirmation(&self) -> bool {
        match (&self.bowler, self.ledger.last_bowler()) {
            (Some(current), Some(last)) => self.sequencer.at_new_over() && current == last,
            _ => false,
        }
    }

    /// Record a run, dot, wide or no-ball.
    ///
    /// `continue_same_bowler` answers the new-over confirmation; declining rejects the ball.
    pub fn record_ball(
        &mut self,
        input: BallInput,
        continue_same_bowler: bool,
    ) -> Result<BallOutcome, ScoringError> {
        if input.kind == DeliveryKind::Wicket {
            return self.record_wicket(None, continue_same_bowler);
        }

        self.check_ready(continue_same_bowler)?;
        let resolution = resolve(&input)?;
        let delivery = resolution.into_delivery(input.kind, None);

        self.snapshot(&delivery);
        self.sequencer.append(delivery.clone())?;
        let (batsman, bowler) = self.players_on_field();

        self.runs += delivery.team_runs;
        if self.chase_reached() {
            let capacity = self.wicket_capacity[self.innings.batting_team()];
            self.complete(1, Margin::Wickets(capacity.saturating_sub(self.wickets)));
        }

        match delivery.kind {
            DeliveryKind::Wide => self.extras.wides += delivery.team_runs,
            DeliveryKind::NoBall => self.extras.no_balls += delivery.team_runs,
            _ => {}
        }

        if resolution.is_legal || delivery.batsman_runs > 0 {
            self.ledger.credit_batsman(
                &batsman,
                self.innings,
                delivery.batsman_runs,
                resolution.is_four,
                resolution.is_six,
            );
        }
        if delivery.rotation_runs % 2 == 1 {
            self.crease.swap();
        }
        self.ledger.credit_bowler(
            &bowler,
            self.innings,
            delivery.team_runs,
            false,
            resolution.is_legal,
            delivery.kind,
        );

        if resolution.is_legal {
            self.balls += 1;
            self.check_ball_limits();
        }

        debug!(
            "Ball {} | {} to {} | {}/{} ({})",
            delivery,
            bowler,
            batsman,
            self.runs,
            self.wickets,
            self.overs_display()
        );

        Ok(self.finish_delivery(delivery))
    }

    /// Record a wicket, optionally crediting a fielder with the catch
    pub fn record_wicket(
        &mut self,
        fielder: Option<&str>,
        continue_same_bowler: bool,
    ) -> Result<BallOutcome, ScoringError> {
        self.check_ready(continue_same_bowler)?;
        let fielder = fielder
            .map(|name| non_empty(name, ScoringError::EmptyFielderName))
            .transpose()?;

        let delivery = resolve(&BallInput {
            kind: DeliveryKind::Wicket,
            declared_runs: 0,
            batsman_runs: None,
        })?
        .into_delivery(DeliveryKind::Wicket, fielder);

        self.snapshot(&delivery);
        self.sequencer.append(delivery.clone())?;
        let (batsman, bowler) = self.players_on_field();

        self.wickets += 1;
        self.ledger
            .credit_batsman(&batsman, self.innings, 0, false, false);
        self.ledger.credit_bowler(
            &bowler,
            self.innings,
            0,
            true,
            true,
            DeliveryKind::Wicket,
        );
        if let Some(name) = &delivery.fielder {
            self.ledger.credit_fielder(name, self.innings);
        }

        // The incoming batsman takes the dismissed batsman's slot and strike
        self.crease.vacate(self.crease.facing);
        self.balls += 1;

        let capacity = self.wicket_capacity[self.innings.batting_team()];
        if self.wickets >= capacity {
            match self.innings {
                Innings::First => {
                    self.phase = Phase::FirstInningsComplete(InningsEnd::AllOut);
                    info!("{} all out for {}", self.teams[0], self.runs);
                }
                Innings::Second => self.complete(0, self.defended_margin()),
            }
        }
        self.check_ball_limits();

        debug!(
            "Wicket | {} b {} | {}/{} ({})",
            batsman,
            bowler,
            self.runs,
            self.wickets,
            self.overs_display()
        );

        Ok(self.finish_delivery(delivery))
    }

    /// Second phase of a delivery: roll the over and announce a finished match
    pub fn settle(&mut self) -> Settlement {
        let Some(pending) = self.pending.take() else {
            return Settlement::default();
        };

        let over_closed = pending.close_over && self.sequencer.try_close_over();
        if over_closed {
            self.crease.swap();
            debug!("Over {} complete", self.sequencer.completed().len());
        }

        let result = if pending.announce {
            self.result().cloned()
        } else {
            None
        };
        if let Some(result) = &result {
            info!("{}", result);
        }

        Settlement {
            over_closed,
            result,
        }
    }

    /// Invert the last delivery exactly
    pub fn undo(&mut self) -> Result<Delivery, ScoringError> {
        let snapshot = self.undo.take()?;
        let undone = self
            .sequencer
            .undo_last()
            .ok_or(ScoringError::NothingToUndo)?;
        let delivery = undone.delivery;

        self.runs = self.runs.saturating_sub(delivery.team_runs);
        match delivery.kind {
            DeliveryKind::Wicket => self.wickets = self.wickets.saturating_sub(1),
            DeliveryKind::Wide => {
                self.extras.wides = self.extras.wides.saturating_sub(delivery.team_runs)
            }
            DeliveryKind::NoBall => {
                self.extras.no_balls = self.extras.no_balls.saturating_sub(delivery.team_runs)
            }
            DeliveryKind::Runs(_) => {}
        }
        if delivery.is_legal() {
            self.balls = self.balls.saturating_sub(1);
        }

        // Strike comes from the snapshot; the over parity only cross-checks it
        let strike_flips = self.crease.facing != snapshot.facing;
        if undone.crossed_over_boundary && strike_flips != undone.reverts_boundary_rotation {
            debug!("Strike was changed by hand after the over closed");
        }

        self.ledger = snapshot.ledger;
        self.crease.facing = snapshot.facing;
        if delivery.is_wicket() {
            self.crease.set(snapshot.facing, snapshot.batsman);
        }

        self.phase = snapshot.phase;
        if !self.is_complete() {
            self.second_innings = None;
        }
        self.pending = None;

        debug!(
            "Undid {} (reopened over: {}, end-of-over rotation reverted: {})",
            delivery, undone.crossed_over_boundary, undone.reverts_boundary_rotation
        );
        Ok(delivery)
    }

    /// Close the first innings and set up the chase
    pub fn start_second_innings(&mut self) -> Result<Chase, ScoringError> {
        if !matches!(
            self.phase,
            Phase::FirstInnings | Phase::FirstInningsComplete(_)
        ) {
            return Err(ScoringError::AlreadySecondInnings);
        }
        self.settle();

        let chase = Chase {
            target: self.runs + 1,
            max_balls: self.config.configured_balls().min(self.balls),
        };
        self.first_innings = Some(self.innings_summary());

        self.innings = Innings::Second;
        self.phase = Phase::SecondInnings;
        self.chase = Some(chase);
        self.reset_innings_state();

        info!(
            "2nd innings: {} need {} off {} balls",
            self.teams[1], chase.target, chase.max_balls
        );
        Ok(chase)
    }

    /// Back to the first ball of the first innings, keeping teams and configuration
    pub fn restart(&mut self) {
        self.innings = Innings::First;
        self.phase = Phase::FirstInnings;
        self.chase = None;
        self.first_innings = None;
        self.second_innings = None;
        self.ledger.clear();
        self.reset_innings_state();
        info!("Match restarted");
    }

    /// Frozen figures of the innings in progress
    pub fn innings_summary(&self) -> InningsSummary {
        InningsSummary {
            innings: self.innings,
            batting_team: self.teams[self.innings.batting_team()].clone(),
            runs: self.runs,
            wickets: self.wickets,
            balls: self.balls,
            overs: self.overs_display(),
            extras: self.extras,
            batting: self.ledger.batting_for(self.innings),
            bowling: self.ledger.bowling_for(self.innings),
            fielding: self.ledger.fielding_for(self.innings),
        }
    }

    /// Final summary with the best-performer award, once the match is complete
    pub fn summary(&self) -> Option<MatchSummary> {
        let result = self.result()?.clone();
        let first_innings = self.first_innings.clone()?;
        let second_innings = self.second_innings.clone()?;
        let award = best_performer(&first_innings, &second_innings, &result);

        Some(MatchSummary {
            team1: self.teams[0].clone(),
            team2: self.teams[1].clone(),
            first_innings,
            second_innings,
            result,
            award,
            generated_at: Utc::now(),
        })
    }

    pub fn view(&self) -> ScoreView {
        ScoreView {
            innings: self.innings,
            phase: self.phase.as_str(),
            batting_team: self.teams[self.innings.batting_team()].clone(),
            bowling_team: self.teams[self.innings.bowling_team()].clone(),
            runs: self.runs,
            wickets: self.wickets,
            overs: self.overs_display(),
            run_rate: format!("{:.2}", self.current_run_rate()),
            target: self.chase.map(|c| c.target),
            runs_needed: self.runs_needed(),
            balls_remaining: self.balls_remaining(),
            required_run_rate: format!("{:.2}", self.required_run_rate()),
            extras: self.extras,
            striker: self.crease.striker().map(str::to_string),
            non_striker: self.crease.non_striker().map(str::to_string),
            bowler: self.bowler.clone(),
            current_over: self
                .sequencer
                .current()
                .iter()
                .map(|d| d.to_string())
                .collect(),
            can_undo: self.can_undo(),
        }
    }

    /// Entry guard shared by every delivery
    fn check_ready(&self, continue_same_bowler: bool) -> Result<(), ScoringError> {
        match self.phase {
            Phase::Complete(_) => return Err(ScoringError::MatchOver),
            Phase::FirstInningsComplete(_) => return Err(ScoringError::InningsOver),
            Phase::FirstInnings | Phase::SecondInnings => {}
        }
        if self.crease.striker().is_none() {
            return Err(ScoringError::MissingStriker);
        }
        if self.crease.non_striker().is_none() {
            return Err(ScoringError::MissingNonStriker);
        }
        let Some(bowler) = &self.bowler else {
            return Err(ScoringError::MissingBowler);
        };
        if self.sequencer.is_over_complete() {
            return Err(ScoringError::OverFull);
        }
        if self.needs_bowler_confirmation() && !continue_same_bowler {
            return Err(ScoringError::BowlerNotConfirmed(bowler.clone()));
        }
        Ok(())
    }

    fn players_on_field(&self) -> (String, String) {
        (
            self.crease.striker().unwrap_or_default().to_string(),
            self.bowler.clone().unwrap_or_default(),
        )
    }

    fn snapshot(&mut self, delivery: &Delivery) {
        let (batsman, bowler) = self.players_on_field();
        self.undo.record(UndoSnapshot {
            delivery: delivery.clone(),
            batsman,
            bowler,
            facing: self.crease.facing,
            phase: self.phase.clone(),
            ledger: self.ledger.clone(),
        });
    }

    fn chase_reached(&self) -> bool {
        match self.chase {
            Some(chase) => self.phase == Phase::SecondInnings && self.runs >= chase.target,
            None => false,
        }
    }

    fn defended_margin(&self) -> Margin {
        let target = self.chase.map(|c| c.target).unwrap_or(0);
        Margin::Runs(target.saturating_sub(self.runs + 1))
    }

    /// Overs-exhausted checks, after the ball counter moved
    fn check_ball_limits(&mut self) {
        match self.phase {
            Phase::FirstInnings if self.balls >= self.config.configured_balls() => {
                self.phase = Phase::FirstInningsComplete(InningsEnd::OversExhausted);
                info!(
                    "1st innings complete: {} {}/{} ({} overs)",
                    self.teams[0],
                    self.runs,
                    self.wickets,
                    self.overs_display()
                );
            }
            Phase::SecondInnings => {
                if let Some(chase) = self.chase {
                    if self.balls >= chase.max_balls && self.runs < chase.target {
                        self.complete(0, self.defended_margin());
                    }
                }
            }
            _ => {}
        }
    }

    fn complete(&mut self, winner: usize, margin: Margin) {
        self.phase = Phase::Complete(MatchResult {
            winner,
            winner_name: self.teams[winner].clone(),
            margin,
        });
    }

    fn finish_delivery(&mut self, delivery: Delivery) -> BallOutcome {
        let just_completed = self.is_complete() && self.second_innings.is_none();
        if just_completed {
            self.second_innings = Some(self.innings_summary());
        }

        let close_over = self.sequencer.is_over_complete();
        if close_over || just_completed {
            self.pending = Some(PendingSettlement {
                close_over,
                announce: just_completed,
            });
        }

        BallOutcome {
            delivery,
            settle_pending: self.pending.is_some(),
            innings_complete: !matches!(self.phase, Phase::FirstInnings | Phase::SecondInnings),
            result: self.result().cloned(),
        }
    }

    fn reset_innings_state(&mut self) {
        self.runs = 0;
        self.wickets = 0;
        self.balls = 0;
        self.extras = Extras::default();
        self.sequencer.clear();
        self.crease = Crease::default();
        self.bowler = None;
        self.undo.clear();
        self.pending = None;
    }
}

fn non_empty(name: &str, err: ScoringError) -> Result<String, ScoringError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ready_match(overs: u32) -> Match {
        let mut m = Match::new(MatchConfig::new(overs).unwrap(), "Lions", "Tigers");
        m.set_batter(BatterSlot::First, "Alpha").unwrap();
        m.set_batter(BatterSlot::Second, "Bravo").unwrap();
        m.set_bowler("Charlie").unwrap();
        m
    }

    fn ball(m: &mut Match, input: BallInput) -> BallOutcome {
        let outcome = m.record_ball(input, true).unwrap();
        m.settle();
        outcome
    }

    fn dots(m: &mut Match, n: usize) {
        for _ in 0..n {
            ball(m, BallInput::dot());
        }
    }

    /// Match state minus the undo slot, for before/after comparisons
    fn comparable(m: &Match) -> serde_json::Value {
        let mut value = serde_json::to_value(m).unwrap();
        value["undo"] = serde_json::Value::Null;
        value
    }

    #[test]
    fn test_config_rejects_zero_overs() {
        assert_eq!(MatchConfig::new(0), Err(ScoringError::InvalidOvers));
        assert_eq!(MatchConfig::new(5).unwrap().configured_balls(), 30);
    }

    #[test]
    fn test_entry_guard() {
        let mut m = Match::new(MatchConfig::new(2).unwrap(), "A", "B");
        assert_eq!(
            m.record_ball(BallInput::dot(), true),
            Err(ScoringError::MissingStriker)
        );
        m.set_batter(BatterSlot::First, "Alpha").unwrap();
        assert_eq!(
            m.record_ball(BallInput::dot(), true),
            Err(ScoringError::MissingNonStriker)
        );
        m.set_batter(BatterSlot::Second, "Bravo").unwrap();
        assert_eq!(
            m.record_ball(BallInput::dot(), true),
            Err(ScoringError::MissingBowler)
        );
        assert_eq!(m.set_bowler("   "), Err(ScoringError::EmptyPlayerName));
        assert!(!m.can_undo());
        assert_eq!(m.runs(), 0);
    }

    #[test]
    fn test_sixth_ball_waits_for_settle() {
        let mut m = ready_match(2);
        for _ in 0..5 {
            ball(&mut m, BallInput::dot());
        }
        let outcome = m.record_ball(BallInput::runs(2), true).unwrap();
        assert!(outcome.settle_pending);
        assert_eq!(m.sequencer().current().len(), 6);
        assert_eq!(
            m.record_ball(BallInput::dot(), true),
            Err(ScoringError::OverFull)
        );

        let settlement = m.settle();
        assert!(settlement.over_closed);
        assert!(m.sequencer().current().is_empty());
        assert_eq!(m.sequencer().completed().len(), 1);
        // Even runs on the last ball: only the end-of-over change applies
        assert_eq!(m.crease().striker(), Some("Bravo"));
    }

    #[test]
    fn test_odd_runs_rotate_strike() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(1));
        assert_eq!(m.crease().striker(), Some("Bravo"));
        ball(&mut m, BallInput::runs(3));
        assert_eq!(m.crease().striker(), Some("Alpha"));
        ball(&mut m, BallInput::runs(5));
        assert_eq!(m.crease().striker(), Some("Bravo"));
        ball(&mut m, BallInput::runs(4));
        assert_eq!(m.crease().striker(), Some("Bravo"));
    }

    #[test]
    fn test_extras_are_not_legal_balls() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::wide(1));
        ball(&mut m, BallInput::no_ball(5));
        assert_eq!(m.runs(), 6);
        assert_eq!(m.balls(), 0);
        assert_eq!(m.extras().wides, 1);
        assert_eq!(m.extras().no_balls, 5);
        // Bulk penalty never reaches the batsman's record
        assert!(m.ledger().batting.get("Alpha", Innings::First).is_none());
        let bowler = m.ledger().bowling.get("Charlie", Innings::First).unwrap();
        assert_eq!((bowler.runs_conceded, bowler.balls), (6, 0));
        assert_eq!((bowler.wides, bowler.no_balls), (1, 1));
    }

    #[test]
    fn test_no_ball_with_runs_credits_batsman() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::no_ball_with_runs(1));
        assert_eq!(m.runs(), 2);
        assert_eq!(m.extras().no_balls, 2);
        assert_eq!(m.balls(), 0);
        let alpha = m.ledger().batting.get("Alpha", Innings::First).unwrap();
        assert_eq!(alpha.runs, 1);
        // Balls faced still moves for an extra the batsman scored off
        assert_eq!(alpha.balls, 1);
        assert_eq!(m.crease().striker(), Some("Bravo"));
    }

    #[test]
    fn test_oversized_extra_is_rejected() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::wide(1));
        for _ in 0..2 {
            assert!(matches!(
                m.record_ball(BallInput::wide(4_000_000_000), true),
                Err(ScoringError::InvalidRuns { kind: "wide", .. })
            ));
        }
        assert_eq!(m.runs(), 1);
        assert_eq!(m.extras().wides, 1);
        assert_eq!(m.sequencer().current().len(), 1);
        // The rejected balls left the earlier snapshot in place
        assert_eq!(m.undo().unwrap().team_runs, 1);
    }

    #[test]
    fn test_wall_scores_without_rotating() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::wall(2));
        assert_eq!(m.runs(), 3);
        let alpha = m.ledger().batting.get("Alpha", Innings::First).unwrap();
        assert_eq!((alpha.runs, alpha.balls, alpha.fours), (3, 1, 0));
        // 3 credited but 2 run: strike stays
        assert_eq!(m.crease().striker(), Some("Alpha"));
    }

    #[test]
    fn test_wicket_vacates_striker_slot() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(1));
        let outcome = m.record_wicket(Some("Delta"), true).unwrap();
        assert_eq!(outcome.delivery.fielder.as_deref(), Some("Delta"));

        assert_eq!(m.wickets(), 1);
        assert_eq!(m.balls(), 2);
        assert_eq!(m.crease().striker(), None);
        assert_eq!(m.crease().non_striker(), Some("Alpha"));
        assert_eq!(
            m.record_ball(BallInput::dot(), true),
            Err(ScoringError::MissingStriker)
        );

        assert_eq!(m.bring_in_batter("Echo").unwrap(), BatterSlot::Second);
        assert_eq!(m.crease().striker(), Some("Echo"));

        let bravo = m.ledger().batting.get("Bravo", Innings::First).unwrap();
        assert_eq!((bravo.runs, bravo.balls), (0, 1));
        let charlie = m.ledger().bowling.get("Charlie", Innings::First).unwrap();
        assert_eq!(charlie.wickets, 1);
        assert_eq!(
            m.ledger().fielding.get("Delta", Innings::First).unwrap().catches,
            1
        );
    }

    #[test]
    fn test_empty_fielder_rejected_without_mutation() {
        let mut m = ready_match(2);
        let before = comparable(&m);
        assert_eq!(
            m.record_wicket(Some(" "), true),
            Err(ScoringError::EmptyFielderName)
        );
        assert_eq!(comparable(&m), before);
        assert!(!m.can_undo());
    }

    #[test]
    fn test_same_bowler_confirmation() {
        let mut m = ready_match(2);
        dots(&mut m, 6);
        assert!(m.needs_bowler_confirmation());
        assert_eq!(
            m.record_ball(BallInput::dot(), false),
            Err(ScoringError::BowlerNotConfirmed("Charlie".to_string()))
        );
        assert_eq!(m.balls(), 6);

        m.set_bowler("Foxtrot").unwrap();
        assert!(!m.needs_bowler_confirmation());
        assert!(m.record_ball(BallInput::dot(), false).is_ok());
    }

    #[test]
    fn test_undo_without_snapshot() {
        let mut m = ready_match(2);
        assert_eq!(m.undo(), Err(ScoringError::NothingToUndo));
        ball(&mut m, BallInput::runs(2));
        m.undo().unwrap();
        assert_eq!(m.undo(), Err(ScoringError::NothingToUndo));
    }

    #[test]
    fn test_undo_first_ball_leaves_no_ghost_record() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(4));
        m.undo().unwrap();
        assert!(m.ledger().batting.is_empty());
        assert!(m.ledger().bowling.is_empty());
        assert_eq!(m.runs(), 0);
        assert_eq!(m.balls(), 0);
    }

    #[test]
    fn test_undo_wicket_restores_batsman() {
        let mut m = ready_match(2);
        let before = comparable(&m);
        m.record_wicket(Some("Delta"), true).unwrap();
        m.bring_in_batter("Echo").unwrap();
        m.undo().unwrap();

        assert_eq!(m.crease().striker(), Some("Alpha"));
        assert_eq!(m.wickets(), 0);
        assert_eq!(comparable(&m), before);
    }

    #[test]
    fn test_undo_last_ball_wicket_restores_non_first_slot() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(1));
        dots(&mut m, 4);
        assert_eq!(m.crease().striker(), Some("Bravo"));
        let before = comparable(&m);

        m.record_wicket(None, true).unwrap();
        m.settle();
        assert_eq!(m.sequencer().completed().len(), 1);
        assert_eq!(m.bring_in_batter("Echo").unwrap(), BatterSlot::Second);

        m.undo().unwrap();
        assert_eq!(m.crease().striker(), Some("Bravo"));
        assert_eq!(m.crease().non_striker(), Some("Alpha"));
        assert_eq!(comparable(&m), before);
    }

    #[test]
    fn test_undo_across_over_boundary() {
        let mut m = ready_match(2);
        dots(&mut m, 5);
        let before = comparable(&m);
        ball(&mut m, BallInput::runs(1));
        assert_eq!(m.sequencer().completed().len(), 1);
        // Odd last ball and end of over cancel out
        assert_eq!(m.crease().striker(), Some("Alpha"));

        m.undo().unwrap();
        assert!(m.sequencer().completed().is_empty());
        assert_eq!(m.sequencer().legal_count(), 5);
        assert_eq!(comparable(&m), before);
    }

    #[test]
    fn test_run_rates() {
        let mut m = ready_match(2);
        assert_eq!(m.current_run_rate(), 0.0);
        assert_eq!(m.required_run_rate(), 0.0);
        ball(&mut m, BallInput::runs(4));
        ball(&mut m, BallInput::runs(2));
        assert_eq!(format!("{:.2}", m.current_run_rate()), "18.00");
    }

    #[test]
    fn test_first_innings_ends_on_overs() {
        let mut m = ready_match(1);
        dots(&mut m, 5);
        let outcome = m.record_ball(BallInput::runs(6), true).unwrap();
        assert!(outcome.innings_complete);
        assert_eq!(
            m.phase(),
            &Phase::FirstInningsComplete(InningsEnd::OversExhausted)
        );
        m.settle();
        assert_eq!(
            m.record_ball(BallInput::dot(), true),
            Err(ScoringError::InningsOver)
        );
    }

    #[test]
    fn test_first_innings_all_out_with_small_squad() {
        let mut m = ready_match(5);
        m.wicket_capacity = [wicket_capacity(3), wicket_capacity(3)];
        m.record_wicket(None, true).unwrap();
        m.bring_in_batter("Golf").unwrap();
        m.record_wicket(None, true).unwrap();
        assert_eq!(m.phase(), &Phase::FirstInningsComplete(InningsEnd::AllOut));
    }

    #[test]
    fn test_second_innings_setup() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(4));
        ball(&mut m, BallInput::runs(2));
        let chase = m.start_second_innings().unwrap();

        // Declared after two balls: the chase is limited to what was bowled
        assert_eq!(chase, Chase { target: 7, max_balls: 2 });
        assert_eq!(m.innings(), Innings::Second);
        assert_eq!((m.runs(), m.wickets(), m.balls()), (0, 0, 0));
        assert!(m.sequencer().current().is_empty());
        assert_eq!(m.crease().striker(), None);
        assert_eq!(m.bowler(), None);
        assert!(!m.can_undo());
        assert_eq!(m.first_innings().unwrap().runs, 6);
        assert_eq!(m.start_second_innings(), Err(ScoringError::AlreadySecondInnings));
    }

    #[test]
    fn test_two_over_match_chased_down() {
        let mut m = ready_match(2);
        dots(&mut m, 6);
        m.set_bowler("Foxtrot").unwrap();
        ball(&mut m, BallInput::runs(6));
        dots(&mut m, 5);
        assert_eq!(m.runs(), 6);
        assert_eq!(m.balls(), 12);

        let chase = m.start_second_innings().unwrap();
        assert_eq!(chase, Chase { target: 7, max_balls: 12 });

        m.set_batter(BatterSlot::First, "Hotel").unwrap();
        m.set_batter(BatterSlot::Second, "India").unwrap();
        m.set_bowler("Juliet").unwrap();
        assert_eq!(m.runs_needed(), 7);
        assert_eq!(m.balls_remaining(), 12);
        assert_eq!(format!("{:.2}", m.required_run_rate()), "3.50");

        ball(&mut m, BallInput::runs(4));
        let outcome = m.record_ball(BallInput::runs(4), true).unwrap();
        let result = outcome.result.unwrap();
        assert_eq!(result.winner, 1);
        assert_eq!(result.margin, Margin::Wickets(10));
        assert!(outcome.settle_pending);

        let settlement = m.settle();
        assert_eq!(settlement.result.unwrap().winner_name, "Tigers");
        assert_eq!(
            m.record_ball(BallInput::runs(6), true),
            Err(ScoringError::MatchOver)
        );

        let second = m.second_innings().unwrap();
        assert_eq!((second.runs, second.wickets, second.overs.as_str()), (8, 0, "0.2"));
        assert!(m.summary().is_some());
    }

    #[test]
    fn test_chase_fails_on_balls() {
        let mut m = ready_match(1);
        ball(&mut m, BallInput::runs(6));
        ball(&mut m, BallInput::runs(4));
        m.start_second_innings().unwrap();
        m.set_batter(BatterSlot::First, "Hotel").unwrap();
        m.set_batter(BatterSlot::Second, "India").unwrap();
        m.set_bowler("Juliet").unwrap();

        ball(&mut m, BallInput::runs(2));
        // Wides do not use up the chase
        ball(&mut m, BallInput::wide(1));
        assert!(!m.is_complete());
        let outcome = m.record_ball(BallInput::runs(2), true).unwrap();

        let result = outcome.result.unwrap();
        assert_eq!(result.winner, 0);
        // target 11, scored 5
        assert_eq!(result.margin, Margin::Runs(5));
    }

    #[test]
    fn test_chase_fails_all_out() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(3));
        m.start_second_innings().unwrap();
        m.wicket_capacity[1] = wicket_capacity(2);
        m.set_batter(BatterSlot::First, "Hotel").unwrap();
        m.set_batter(BatterSlot::Second, "India").unwrap();
        m.set_bowler("Juliet").unwrap();

        let outcome = m.record_wicket(None, true).unwrap();
        assert_eq!(
            outcome.result,
            Some(MatchResult {
                winner: 0,
                winner_name: "Lions".to_string(),
                margin: Margin::Runs(3),
            })
        );
    }

    #[test]
    fn test_undo_reopens_completed_match() {
        let mut m = ready_match(1);
        ball(&mut m, BallInput::runs(1));
        m.start_second_innings().unwrap();
        m.set_batter(BatterSlot::First, "Hotel").unwrap();
        m.set_batter(BatterSlot::Second, "India").unwrap();
        m.set_bowler("Juliet").unwrap();

        let before = comparable(&m);
        m.record_ball(BallInput::runs(2), true).unwrap();
        assert!(m.is_complete());
        m.undo().unwrap();
        assert!(!m.is_complete());
        assert!(m.second_innings().is_none());
        assert_eq!(comparable(&m), before);
    }

    #[test]
    fn test_restart() {
        let mut m = ready_match(1);
        ball(&mut m, BallInput::runs(4));
        m.start_second_innings().unwrap();
        m.restart();
        assert_eq!(m.innings(), Innings::First);
        assert_eq!(m.phase(), &Phase::FirstInnings);
        assert!(m.ledger().batting.is_empty());
        assert!(m.chase().is_none());
        assert_eq!(m.team_name(1), "Tigers");
    }

    #[test]
    fn test_view() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(1));
        ball(&mut m, BallInput::wide(1));
        let view = m.view();
        assert_eq!(view.runs, 2);
        assert_eq!(view.overs, "0.1");
        assert_eq!(view.current_over, vec!["1", "1WD"]);
        assert_eq!(view.striker.as_deref(), Some("Bravo"));
        assert_eq!(view.target, None);
        assert_eq!(view.required_run_rate, "0.00");
        assert!(view.can_undo);
    }

    #[test]
    fn test_serde_round_trip_preserves_play() {
        let mut m = ready_match(2);
        ball(&mut m, BallInput::runs(3));
        let json = serde_json::to_string(&m).unwrap();
        let mut restored: Match = serde_json::from_str(&json).unwrap();
        restored.record_ball(BallInput::runs(1), true).unwrap();
        assert_eq!(restored.runs(), 4);
        assert_eq!(
            restored.ledger().batting.get("Bravo", Innings::First).unwrap().runs,
            1
        );
    }

    fn any_input() -> impl Strategy<Value = BallInput> {
        prop_oneof![
            (0u8..=6).prop_map(BallInput::runs),
            (0u8..=6).prop_map(BallInput::wall),
            (1u32..=7).prop_map(BallInput::wide),
            (1u32..=7).prop_map(BallInput::no_ball),
            (0u8..=4).prop_map(BallInput::wide_with_runs),
            (0u8..=4).prop_map(BallInput::no_ball_with_runs),
        ]
    }

    #[derive(Debug, Clone)]
    enum Step {
        Ball(BallInput),
        Wicket,
    }

    fn any_step() -> impl Strategy<Value = Step> {
        prop_oneof![
            8 => any_input().prop_map(Step::Ball),
            1 => Just(Step::Wicket),
        ]
    }

    fn apply(m: &mut Match, step: &Step) -> Result<BallOutcome, ScoringError> {
        let outcome = match step {
            Step::Ball(input) => m.record_ball(*input, true),
            Step::Wicket => m.record_wicket(Some("Kilo"), true),
        };
        if m.crease().vacant_slot().is_some() {
            m.bring_in_batter("Lima").ok();
        }
        outcome
    }

    proptest! {
        #[test]
        fn prop_team_runs_sum_to_total(inputs in prop::collection::vec(any_input(), 0..40)) {
            let mut m = ready_match(50);
            for input in &inputs {
                m.record_ball(*input, true).unwrap();
                m.settle();
            }
            let sum: u32 = m.sequencer().deliveries().map(|d| d.team_runs).sum();
            prop_assert_eq!(sum, m.runs());
        }

        #[test]
        fn prop_undo_is_exact_inverse(
            history in prop::collection::vec(any_step(), 0..20),
            last in any_step(),
            settle_first in any::<bool>(),
        ) {
            let mut m = ready_match(50);
            for step in &history {
                if apply(&mut m, step).is_ok() {
                    m.settle();
                }
            }
            prop_assume!(!m.is_complete());
            if m.phase() != &Phase::FirstInnings {
                m.start_second_innings().unwrap();
                m.set_batter(BatterSlot::First, "Mike").unwrap();
                m.set_batter(BatterSlot::Second, "November").unwrap();
                m.set_bowler("Oscar").unwrap();
            }

            let before = comparable(&m);
            let outcome = match &last {
                Step::Ball(input) => m.record_ball(*input, true),
                Step::Wicket => m.record_wicket(Some("Kilo"), true),
            };
            prop_assert!(outcome.is_ok());
            if settle_first {
                m.settle();
            }
            m.undo().unwrap();
            prop_assert_eq!(comparable(&m), before);
        }

        #[test]
        fn prop_strike_parity_over_one_over(runs in prop::collection::vec(0u8..=6, 6)) {
            let mut m = ready_match(5);
            for r in &runs {
                m.record_ball(BallInput::runs(*r), true).unwrap();
            }
            prop_assert!(m.settle().over_closed);

            let odd = runs.iter().filter(|r| *r % 2 == 1).count();
            let expected = if (odd + 1) % 2 == 0 { "Alpha" } else { "Bravo" };
            prop_assert_eq!(m.crease().striker(), Some(expected));
        }
    }
}
