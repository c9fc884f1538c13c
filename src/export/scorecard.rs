use std::fmt::Write;

use crate::models::{InningsSummary, MatchSummary};

const NAME_WIDTH: usize = 20;

/// Truncate to the name column, counting characters not bytes
fn column_name(name: &str) -> String {
    name.chars().take(NAME_WIDTH).collect()
}

fn innings_block(out: &mut String, summary: &InningsSummary) {
    let _ = writeln!(
        out,
        "{} Innings - {} Batting",
        ordinal(summary.innings.number()),
        summary.batting_team
    );
    let _ = writeln!(
        out,
        "{}/{} ({} overs)  Extras: {} (WD {}, NB {})",
        summary.runs,
        summary.wickets,
        summary.overs,
        summary.extras.total(),
        summary.extras.wides,
        summary.extras.no_balls
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<20} {:>4} {:>4} {:>4} {:>4} {:>7}",
        "Batsman", "R", "B", "4s", "6s", "SR"
    );
    for b in &summary.batting {
        let _ = writeln!(
            out,
            "{:<20} {:>4} {:>4} {:>4} {:>4} {:>7.1}",
            column_name(&b.name),
            b.runs,
            b.balls,
            b.fours,
            b.sixes,
            b.strike_rate()
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<20} {:>5} {:>4} {:>4} {:>6}",
        "Bowler", "O", "R", "W", "Econ"
    );
    for b in &summary.bowling {
        let _ = writeln!(
            out,
            "{:<20} {:>5} {:>4} {:>4} {:>6.2}",
            column_name(&b.name),
            b.overs_display(),
            b.runs_conceded,
            b.wickets,
            b.economy()
        );
    }

    if !summary.fielding.is_empty() {
        let catches: Vec<String> = summary
            .fielding
            .iter()
            .map(|f| format!("{} ({})", f.name, f.catches))
            .collect();
        let _ = writeln!(out);
        let _ = writeln!(out, "Catches: {}", catches.join(", "));
    }
}

fn ordinal(n: u8) -> &'static str {
    match n {
        1 => "1st",
        _ => "2nd",
    }
}

/// Plain-text scorecard of a finished match
pub fn render(summary: &MatchSummary) -> String {
    let mut out = String::new();
    let first = &summary.first_innings;
    let second = &summary.second_innings;

    let _ = writeln!(out, "Match Summary");
    let _ = writeln!(out, "{} vs {}", summary.team1, summary.team2);
    let _ = writeln!(out);
    let _ = writeln!(out, "{} Won!", summary.result.winner_name);
    let _ = writeln!(out, "Won by {}", summary.result.margin);
    let _ = writeln!(out);

    let _ = writeln!(out, "Scorecard");
    for innings in [first, second] {
        let _ = writeln!(
            out,
            "{}: {}/{} ({} overs)",
            innings.batting_team, innings.runs, innings.wickets, innings.overs
        );
    }
    let _ = writeln!(out);

    if let Some(award) = &summary.award {
        let _ = writeln!(out, "Man of the Match");
        let _ = writeln!(out, "{} - {}", award.name, award.reason);
        let _ = writeln!(out);
    }

    innings_block(&mut out, first);
    let _ = writeln!(out);
    innings_block(&mut out, second);
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Generated {}",
        summary.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    out
}
