use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_scoreboard::db::{keys, SessionStore};
use cricket_scoreboard::export::export_summary;
use cricket_scoreboard::Match;

const DEFAULT_OUT_DIR: &str = "exports";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "export_summary=info,cricket_scoreboard=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse arguments
    let args: Vec<String> = env::args().collect();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:data/scoreboard.db".to_string());

    let store = SessionStore::new(&database_url, "").await?;
    let sessions = store.sessions().await?;

    if has_flag(&args, "--list") {
        for session in &sessions {
            println!("{}", session);
        }
        return Ok(());
    }

    // Most recently updated session unless one is named
    let session_id = match arg_value(&args, "--session").or_else(|| env::var("SESSION_ID").ok()) {
        Some(id) => id,
        None => match sessions.first() {
            Some(id) => id.clone(),
            None => bail!("No saved sessions in {}", database_url),
        },
    };
    let out_dir = PathBuf::from(
        arg_value(&args, "--out").unwrap_or_else(|| DEFAULT_OUT_DIR.to_string()),
    );

    let store = store.for_session(&session_id);
    let game: Match = match store.get(keys::MATCH).await? {
        Some(game) => game,
        None => bail!("Session {} has no saved match", session_id),
    };

    let Some(summary) = game.summary() else {
        warn!(
            "Session {} is not finished: {} {}/{} ({} overs), {}",
            session_id,
            game.team_name(game.innings().batting_team()),
            game.runs(),
            game.wickets(),
            game.overs_display(),
            game.innings()
        );
        bail!("Only completed matches can be exported");
    };

    info!("Exporting session {}: {}", session_id, summary.result);
    let files = export_summary(&summary, &out_dir)?;
    println!("{}", files.document.display());
    println!("{}", files.table.display());

    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Value following `flag`, if any
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
