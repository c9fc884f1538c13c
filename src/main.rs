use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_scoreboard::commands::{Command, HELP};
use cricket_scoreboard::config::Config;
use cricket_scoreboard::db::SessionStore;
use cricket_scoreboard::export::export_summary;
use cricket_scoreboard::models::MatchSummary;
use cricket_scoreboard::roster::Roster;
use cricket_scoreboard::scoring::{BallOutcome, ScoreView};
use cricket_scoreboard::workers::{ScorerHandle, ScorerWorker};
use cricket_scoreboard::ScoringError;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cricket_scoreboard=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cricket-scoreboard");

    // Load configuration
    let config = Config::from_env()?;
    let match_config = config.match_config()?;
    info!("Configuration loaded");

    // Initialize database
    let store = SessionStore::new(&config.database_url, &config.session_id).await?;

    let roster = load_roster(&config)?;
    let game = ScorerWorker::load_match(&store, match_config, &roster).await?;

    let (scorer, handle) = ScorerWorker::new(game, roster, store, config.settle_delay);
    let scorer_handle = tokio::spawn(scorer.run());

    println!("{}", HELP);
    print_view(&handle.view().await?);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = prompt_loop(&handle) => {
            if let Err(e) = result {
                error!("Scorer session failed: {:#}", e);
            }
        }
        result = scorer_handle => {
            error!("Scorer exited unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down cricket-scoreboard");
    Ok(())
}

/// Load the roster from JSON file or fall back to the configured team names
fn load_roster(config: &Config) -> Result<Roster> {
    if config.roster_path.exists() {
        Roster::load_from_file(&config.roster_path)
    } else {
        info!("No roster file found, using team names from configuration");
        Ok(Roster::named(&config.team1_name, &config.team2_name))
    }
}

/// Read commands until stdin closes or the user quits
async fn prompt_loop(handle: &ScorerHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Delivery waiting on the same-bowler prompt
    let mut awaiting_confirmation: Option<Command> = None;

    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("✗ {}", e);
                continue;
            }
        };

        let (command, confirmed) = match (command, awaiting_confirmation.take()) {
            (Command::Confirm(true), Some(held)) => (held, true),
            (Command::Confirm(false), Some(_)) => {
                println!("Change the bowler with: bowl NAME");
                continue;
            }
            (Command::Confirm(_), None) => {
                println!("Nothing to confirm");
                continue;
            }
            (command, _) => (command, false),
        };

        if command == Command::Quit {
            break;
        }
        if let Some(held) = execute(handle, command, confirmed).await? {
            awaiting_confirmation = Some(held);
        }
    }

    Ok(())
}

/// Run one command; returns the delivery if it waits on the same-bowler prompt
async fn execute(handle: &ScorerHandle, command: Command, confirmed: bool) -> Result<Option<Command>> {
    let result = match &command {
        Command::Ball(input) => handle
            .ball(*input, confirmed)
            .await
            .map(|outcome| report_delivery(&outcome)),
        Command::Wicket { fielder } => handle
            .wicket(fielder.clone(), confirmed)
            .await
            .map(|outcome| report_delivery(&outcome)),
        Command::Undo => handle
            .undo()
            .await
            .map(|delivery| println!("Undid {}", delivery)),
        Command::SwapStrike => handle.swap_strike().await.map(|_| ()),
        Command::Batter(slot, name) => handle.set_batter(*slot, name).await,
        Command::NewBatter(name) => handle.bring_in_batter(name).await.map(|_| ()),
        Command::Bowler(name) => handle.set_bowler(name).await,
        Command::SecondInnings => handle.start_second_innings().await.map(|chase| {
            println!(
                "Target {} from {} balls. Set the batsmen and bowler.",
                chase.target, chase.max_balls
            )
        }),
        Command::Restart => handle.restart().await.map(|_| ()),
        Command::Reset => handle.reset_all().await.map(|_| ()),
        Command::Score => Ok(()),
        Command::Summary => handle.summary().await.map(|summary| match summary {
            Some(summary) => print_summary(&summary),
            None => println!("The match is not finished yet"),
        }),
        Command::Export(dir) => match handle.summary().await? {
            Some(summary) => {
                let dir = dir.clone().unwrap_or_else(|| PathBuf::from("."));
                export(&summary, &dir);
                Ok(())
            }
            None => {
                println!("The match is not finished yet");
                Ok(())
            }
        },
        Command::Help => {
            println!("{}", HELP);
            return Ok(None);
        }
        Command::Confirm(_) | Command::Quit => return Ok(None),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ScoringError>() {
            Some(ScoringError::BowlerNotConfirmed(name)) => {
                println!("{} bowled the last over. Continue with the same bowler? (y/n)", name);
                return Ok(Some(command));
            }
            Some(rejected) => println!("✗ {}", rejected),
            None => return Err(e),
        }
    }

    print_view(&handle.view().await?);
    Ok(None)
}

fn export(summary: &MatchSummary, dir: &Path) {
    match export_summary(summary, dir) {
        Ok(files) => println!(
            "Saved {} and {}",
            files.document.display(),
            files.table.display()
        ),
        Err(e) => error!("Export failed: {:#}", e),
    }
}

fn report_delivery(outcome: &BallOutcome) {
    if let Some(result) = &outcome.result {
        println!("🏆 {}", result);
    } else if outcome.innings_complete {
        println!("Innings complete. Type next to start the 2nd innings.");
    }
}

fn print_summary(summary: &MatchSummary) {
    println!("{}", summary.result);
    for innings in [&summary.first_innings, &summary.second_innings] {
        println!(
            "  {}: {}/{} ({} overs)",
            innings.batting_team, innings.runs, innings.wickets, innings.overs
        );
    }
    if let Some(award) = &summary.award {
        println!("Man of the Match: {} ({})", award.name, award.reason);
    }
}

fn print_view(view: &ScoreView) {
    println!();
    println!(
        "{} {}/{} ({} ov)  CRR {}  | {}",
        view.batting_team, view.runs, view.wickets, view.overs, view.run_rate, view.innings
    );
    if let Some(target) = view.target {
        println!(
            "Target {}: need {} from {} balls, RRR {}",
            target, view.runs_needed, view.balls_remaining, view.required_run_rate
        );
    }
    println!(
        "Extras {} (WD {}, NB {})",
        view.extras.total(),
        view.extras.wides,
        view.extras.no_balls
    );
    println!(
        "* {}  |  {}  |  bowler {}",
        view.striker.as_deref().unwrap_or("-"),
        view.non_striker.as_deref().unwrap_or("-"),
        view.bowler.as_deref().unwrap_or("-")
    );
    if !view.current_over.is_empty() {
        println!("This over: {}", view.current_over.join(" "));
    }
}
