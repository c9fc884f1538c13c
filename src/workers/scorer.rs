use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::db::{keys, SessionStore};
use crate::error::ScoringError;
use crate::models::{BallInput, Delivery, MatchSummary};
use crate::roster::Roster;
use crate::scoring::{BallOutcome, BatterSlot, Chase, Match, MatchConfig, ScoreView};

type Reply<T> = oneshot::Sender<Result<T, ScoringError>>;

/// Requests served by the scorer, one at a time
#[derive(Debug)]
pub enum ScorerCommand {
    Ball {
        input: BallInput,
        continue_same_bowler: bool,
        reply: Reply<BallOutcome>,
    },
    Wicket {
        fielder: Option<String>,
        continue_same_bowler: bool,
        reply: Reply<BallOutcome>,
    },
    Undo {
        reply: Reply<Delivery>,
    },
    SetBatter {
        slot: BatterSlot,
        name: String,
        reply: Reply<()>,
    },
    BringInBatter {
        name: String,
        reply: Reply<BatterSlot>,
    },
    SetBowler {
        name: String,
        reply: Reply<()>,
    },
    SwapStrike {
        reply: oneshot::Sender<ScoreView>,
    },
    StartSecondInnings {
        reply: Reply<Chase>,
    },
    Restart {
        reply: oneshot::Sender<ScoreView>,
    },
    ResetAll {
        reply: oneshot::Sender<ScoreView>,
    },
    NeedsBowlerConfirmation {
        reply: oneshot::Sender<bool>,
    },
    View {
        reply: oneshot::Sender<ScoreView>,
    },
    Summary {
        reply: oneshot::Sender<Option<MatchSummary>>,
    },
}

/// Cloneable client of a running `ScorerWorker`
#[derive(Clone)]
pub struct ScorerHandle {
    command_tx: mpsc::Sender<ScorerCommand>,
}

impl ScorerHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> ScorerCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| anyhow!("Scorer is not running"))?;
        response.await.context("Scorer dropped the request")
    }

    pub async fn ball(&self, input: BallInput, continue_same_bowler: bool) -> Result<BallOutcome> {
        Ok(self
            .request(|reply| ScorerCommand::Ball {
                input,
                continue_same_bowler,
                reply,
            })
            .await??)
    }

    pub async fn wicket(
        &self,
        fielder: Option<String>,
        continue_same_bowler: bool,
    ) -> Result<BallOutcome> {
        Ok(self
            .request(|reply| ScorerCommand::Wicket {
                fielder,
                continue_same_bowler,
                reply,
            })
            .await??)
    }

    pub async fn undo(&self) -> Result<Delivery> {
        Ok(self.request(|reply| ScorerCommand::Undo { reply }).await??)
    }

    pub async fn set_batter(&self, slot: BatterSlot, name: &str) -> Result<()> {
        let name = name.to_string();
        Ok(self
            .request(|reply| ScorerCommand::SetBatter { slot, name, reply })
            .await??)
    }

    pub async fn bring_in_batter(&self, name: &str) -> Result<BatterSlot> {
        let name = name.to_string();
        Ok(self
            .request(|reply| ScorerCommand::BringInBatter { name, reply })
            .await??)
    }

    pub async fn set_bowler(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        Ok(self
            .request(|reply| ScorerCommand::SetBowler { name, reply })
            .await??)
    }

    pub async fn swap_strike(&self) -> Result<ScoreView> {
        self.request(|reply| ScorerCommand::SwapStrike { reply }).await
    }

    pub async fn start_second_innings(&self) -> Result<Chase> {
        Ok(self
            .request(|reply| ScorerCommand::StartSecondInnings { reply })
            .await??)
    }

    pub async fn restart(&self) -> Result<ScoreView> {
        self.request(|reply| ScorerCommand::Restart { reply }).await
    }

    pub async fn reset_all(&self) -> Result<ScoreView> {
        self.request(|reply| ScorerCommand::ResetAll { reply }).await
    }

    pub async fn needs_bowler_confirmation(&self) -> Result<bool> {
        self.request(|reply| ScorerCommand::NeedsBowlerConfirmation { reply })
            .await
    }

    pub async fn view(&self) -> Result<ScoreView> {
        self.request(|reply| ScorerCommand::View { reply }).await
    }

    pub async fn summary(&self) -> Result<Option<MatchSummary>> {
        self.request(|reply| ScorerCommand::Summary { reply }).await
    }
}

/// Worker that owns the match and serialises every operation on it
pub struct ScorerWorker {
    game: Match,
    match_config: MatchConfig,
    roster: Roster,
    store: SessionStore,
    settle_delay: Duration,
    command_rx: mpsc::Receiver<ScorerCommand>,
}

impl ScorerWorker {
    /// Create a worker and the handle that talks to it
    pub fn new(
        game: Match,
        roster: Roster,
        store: SessionStore,
        settle_delay: Duration,
    ) -> (Self, ScorerHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let worker = Self {
            match_config: game.config(),
            game,
            roster,
            store,
            settle_delay,
            command_rx,
        };
        (worker, ScorerHandle { command_tx })
    }

    /// Resume the session's saved match, or start a new one
    pub async fn load_match(
        store: &SessionStore,
        match_config: MatchConfig,
        roster: &Roster,
    ) -> Result<Match> {
        match store.get::<Match>(keys::MATCH).await? {
            Some(game) => {
                info!(
                    "Resumed {} vs {}: {}/{} ({} overs)",
                    game.team_name(0),
                    game.team_name(1),
                    game.runs(),
                    game.wickets(),
                    game.overs_display()
                );
                Ok(game)
            }
            None => Ok(Match::with_roster(match_config, roster)),
        }
    }

    /// Run the worker loop
    pub async fn run(mut self) {
        info!(
            "Scorer started: {} vs {}, {} overs",
            self.game.team_name(0),
            self.game.team_name(1),
            self.match_config.overs_per_innings()
        );

        // A delivery saved right before shutdown may still be unsettled
        if self.game.settlement_pending() {
            self.settle().await;
        }

        while let Some(command) = self.command_rx.recv().await {
            self.handle(command).await;
        }

        warn!("Scorer channel closed");
    }

    async fn handle(&mut self, command: ScorerCommand) {
        match command {
            ScorerCommand::Ball {
                input,
                continue_same_bowler,
                reply,
            } => {
                let result = self.game.record_ball(input, continue_same_bowler);
                self.after_delivery(result, reply).await;
            }
            ScorerCommand::Wicket {
                fielder,
                continue_same_bowler,
                reply,
            } => {
                let result = self
                    .game
                    .record_wicket(fielder.as_deref(), continue_same_bowler);
                self.after_delivery(result, reply).await;
            }
            ScorerCommand::Undo { reply } => {
                let result = self.game.undo();
                self.respond("undo", result, reply, true).await;
            }
            ScorerCommand::SetBatter { slot, name, reply } => {
                self.check_batting(&name);
                let result = self.game.set_batter(slot, &name);
                self.respond("set batter", result, reply, false).await;
            }
            ScorerCommand::BringInBatter { name, reply } => {
                self.check_batting(&name);
                let result = self.game.bring_in_batter(&name);
                self.respond("bring in batter", result, reply, false).await;
            }
            ScorerCommand::SetBowler { name, reply } => {
                if self.roster.has_players() && !self.roster.is_bowling(self.game.innings(), &name) {
                    warn!("{} is not on the bowling team sheet", name.trim());
                }
                let result = self.game.set_bowler(&name);
                self.respond("set bowler", result, reply, false).await;
            }
            ScorerCommand::SwapStrike { reply } => {
                self.game.swap_strike();
                self.save(false).await;
                let _ = reply.send(self.game.view());
            }
            ScorerCommand::StartSecondInnings { reply } => {
                let result = self.game.start_second_innings();
                self.respond("start second innings", result, reply, true).await;
            }
            ScorerCommand::Restart { reply } => {
                self.game.restart();
                for key in [keys::BATTING_STATS, keys::BOWLING_STATS] {
                    if let Err(e) = self.store.delete(key).await {
                        error!("Failed to delete {}: {}", key, e);
                    }
                }
                self.save(false).await;
                let _ = reply.send(self.game.view());
            }
            ScorerCommand::ResetAll { reply } => {
                self.game = Match::with_roster(self.match_config, &self.roster);
                if let Err(e) = self.store.clear().await {
                    error!("Failed to clear session: {}", e);
                }
                info!("Session reset");
                let _ = reply.send(self.game.view());
            }
            ScorerCommand::NeedsBowlerConfirmation { reply } => {
                let _ = reply.send(self.game.needs_bowler_confirmation());
            }
            ScorerCommand::View { reply } => {
                let _ = reply.send(self.game.view());
            }
            ScorerCommand::Summary { reply } => {
                let _ = reply.send(self.game.summary());
            }
        }
    }

    /// Reply, then settle after the delay and persist
    async fn after_delivery(
        &mut self,
        result: Result<BallOutcome, ScoringError>,
        reply: Reply<BallOutcome>,
    ) {
        let settle_pending = matches!(&result, Ok(outcome) if outcome.settle_pending);
        let accepted = result.is_ok();
        if let Err(e) = &result {
            warn!("Delivery rejected: {}", e);
        }
        let _ = reply.send(result);

        if settle_pending {
            self.settle().await;
        }
        if accepted {
            self.save(true).await;
        }
    }

    async fn settle(&mut self) {
        tokio::time::sleep(self.settle_delay).await;
        let settlement = self.game.settle();
        debug!(
            "Settled: over closed {}, result {:?}",
            settlement.over_closed, settlement.result
        );
    }

    async fn respond<T>(
        &mut self,
        action: &str,
        result: Result<T, ScoringError>,
        reply: Reply<T>,
        with_ledgers: bool,
    ) {
        match &result {
            Ok(_) => self.save(with_ledgers).await,
            Err(e) => warn!("Rejected {}: {}", action, e),
        }
        let _ = reply.send(result);
    }

    fn check_batting(&self, name: &str) {
        if self.roster.has_players() && !self.roster.is_batting(self.game.innings(), name) {
            warn!("{} is not on the batting team sheet", name.trim());
        }
    }

    /// Persist the match and, after scoring changes, both ledgers
    async fn save(&self, with_ledgers: bool) {
        if let Err(e) = self.try_save(with_ledgers).await {
            error!("Failed to save session: {}", e);
        }
    }

    async fn try_save(&self, with_ledgers: bool) -> Result<()> {
        self.store.set(keys::MATCH, &self.game).await?;
        self.store.set(keys::TEAM1_NAME, &self.game.team_name(0)).await?;
        self.store.set(keys::TEAM2_NAME, &self.game.team_name(1)).await?;
        if with_ledgers {
            let ledger = self.game.ledger();
            self.store
                .set(keys::BATTING_STATS, &ledger.batting)
                .await?;
            self.store
                .set(keys::BOWLING_STATS, &ledger.bowling)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BattingRecord;

    async fn start(overs: u32, delay_ms: u64) -> (ScorerHandle, SessionStore) {
        let store = SessionStore::new("sqlite::memory:", "worker-test")
            .await
            .unwrap();
        let roster = Roster::named("Lions", "Tigers");
        let game = ScorerWorker::load_match(&store, MatchConfig::new(overs).unwrap(), &roster)
            .await
            .unwrap();
        let (worker, handle) =
            ScorerWorker::new(game, roster, store.clone(), Duration::from_millis(delay_ms));
        tokio::spawn(worker.run());

        handle.set_batter(BatterSlot::First, "Alpha").await.unwrap();
        handle.set_batter(BatterSlot::Second, "Bravo").await.unwrap();
        handle.set_bowler("Charlie").await.unwrap();
        (handle, store)
    }

    #[tokio::test]
    async fn test_ball_is_persisted() {
        let (handle, store) = start(2, 0).await;
        handle.ball(BallInput::runs(4), false).await.unwrap();
        // Commands are serialised, so the save finished before this reply
        handle.view().await.unwrap();

        let saved: Match = store.get(keys::MATCH).await.unwrap().unwrap();
        assert_eq!(saved.runs(), 4);
        let batting: Vec<BattingRecord> = store.get(keys::BATTING_STATS).await.unwrap().unwrap();
        assert_eq!(batting[0].runs, 4);
        let team: Option<String> = store.get(keys::TEAM2_NAME).await.unwrap();
        assert_eq!(team.as_deref(), Some("Tigers"));
    }

    #[tokio::test]
    async fn test_over_settles_before_next_command() {
        let (handle, _store) = start(2, 20).await;
        for _ in 0..5 {
            handle.ball(BallInput::dot(), false).await.unwrap();
        }
        let outcome = handle.ball(BallInput::runs(2), false).await.unwrap();
        assert!(outcome.settle_pending);

        let view = handle.view().await.unwrap();
        assert!(view.current_over.is_empty());
        assert_eq!(view.striker.as_deref(), Some("Bravo"));
        assert!(handle.needs_bowler_confirmation().await.unwrap());
    }

    #[tokio::test]
    async fn test_rejection_is_a_scoring_error() {
        let (handle, _store) = start(2, 0).await;
        let err = handle.undo().await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScoringError>(),
            Some(&ScoringError::NothingToUndo)
        );

        let err = handle.wicket(Some(String::new()), false).await.unwrap_err();
        assert_eq!(err.to_string(), ScoringError::EmptyFielderName.to_string());
    }

    #[tokio::test]
    async fn test_restart_drops_ledger_keys() {
        let (handle, store) = start(2, 0).await;
        handle.ball(BallInput::runs(1), false).await.unwrap();
        let view = handle.restart().await.unwrap();
        assert_eq!(view.runs, 0);

        let saved = store.keys().await.unwrap();
        assert!(saved.contains(&keys::MATCH.to_string()));
        assert!(!saved.contains(&keys::BATTING_STATS.to_string()));
    }

    #[tokio::test]
    async fn test_reset_all_clears_session() {
        let (handle, store) = start(2, 0).await;
        handle.ball(BallInput::runs(1), false).await.unwrap();
        let view = handle.reset_all().await.unwrap();
        assert_eq!(view.striker, None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resume_from_store() {
        let (handle, store) = start(2, 0).await;
        handle.ball(BallInput::runs(6), false).await.unwrap();
        handle.view().await.unwrap();

        let roster = Roster::named("Lions", "Tigers");
        let resumed = ScorerWorker::load_match(&store, MatchConfig::new(2).unwrap(), &roster)
            .await
            .unwrap();
        assert_eq!(resumed.runs(), 6);
        assert_eq!(resumed.crease().striker(), Some("Alpha"));
    }

    #[tokio::test]
    async fn test_full_match_summary() {
        let (handle, _store) = start(1, 0).await;
        handle.ball(BallInput::runs(4), false).await.unwrap();
        assert!(handle.summary().await.unwrap().is_none());

        let chase = handle.start_second_innings().await.unwrap();
        assert_eq!(chase.target, 5);
        handle.set_batter(BatterSlot::First, "Hotel").await.unwrap();
        handle.set_batter(BatterSlot::Second, "India").await.unwrap();
        handle.set_bowler("Juliet").await.unwrap();

        let outcome = handle.ball(BallInput::runs(6), false).await.unwrap();
        assert_eq!(outcome.result.unwrap().winner, 1);

        let summary = handle.summary().await.unwrap().unwrap();
        assert_eq!(summary.first_innings.runs, 4);
        assert_eq!(summary.second_innings.runs, 6);
        assert_eq!(summary.award.unwrap().name, "Hotel");
    }
}
