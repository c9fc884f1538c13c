use std::io;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{InningsSummary, MatchSummary};

/// One CSV line; columns that do not apply to the section stay empty
#[derive(Debug, Default, Serialize)]
struct Row<'a> {
    section: &'a str,
    innings: u8,
    team: &'a str,
    player: &'a str,
    runs: Option<u32>,
    balls: Option<u32>,
    fours: Option<u32>,
    sixes: Option<u32>,
    strike_rate: Option<String>,
    overs: Option<String>,
    wickets: Option<u32>,
    economy: Option<String>,
    wides: Option<u32>,
    no_balls: Option<u32>,
    catches: Option<u32>,
}

fn innings_rows<'a>(summary: &'a InningsSummary, bowling_team: &'a str) -> Vec<Row<'a>> {
    let innings = summary.innings.number();
    let mut rows = vec![Row {
        section: "total",
        innings,
        team: &summary.batting_team,
        runs: Some(summary.runs),
        balls: Some(summary.balls),
        overs: Some(summary.overs.clone()),
        wickets: Some(summary.wickets),
        wides: Some(summary.extras.wides),
        no_balls: Some(summary.extras.no_balls),
        ..Default::default()
    }];

    rows.extend(summary.batting.iter().map(|b| Row {
        section: "batting",
        innings,
        team: &summary.batting_team,
        player: &b.name,
        runs: Some(b.runs),
        balls: Some(b.balls),
        fours: Some(b.fours),
        sixes: Some(b.sixes),
        strike_rate: Some(format!("{:.1}", b.strike_rate())),
        ..Default::default()
    }));

    rows.extend(summary.bowling.iter().map(|b| Row {
        section: "bowling",
        innings,
        team: bowling_team,
        player: &b.name,
        runs: Some(b.runs_conceded),
        balls: Some(b.balls),
        overs: Some(b.overs_display()),
        wickets: Some(b.wickets),
        economy: Some(format!("{:.2}", b.economy())),
        wides: Some(b.wides),
        no_balls: Some(b.no_balls),
        ..Default::default()
    }));

    rows.extend(summary.fielding.iter().map(|f| Row {
        section: "fielding",
        innings,
        team: bowling_team,
        player: &f.name,
        catches: Some(f.catches),
        ..Default::default()
    }));

    rows
}

/// Write both innings as one CSV table
pub fn write_csv<W: io::Write>(summary: &MatchSummary, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let rows = innings_rows(&summary.first_innings, &summary.team2)
        .into_iter()
        .chain(innings_rows(&summary.second_innings, &summary.team1));
    for row in rows {
        csv.serialize(row).context("Failed to write CSV row")?;
    }

    csv.flush().context("Failed to flush CSV")?;
    Ok(())
}
