use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::models::{BallInput, EXTRA_PENALTY, MAX_EXTRA_PENALTY};
use crate::scoring::BatterSlot;

pub const HELP: &str = "\
Deliveries:
  0-6 | .          runs off the bat (. is a dot ball)
  wd [n] | nb [n]   wide / no-ball worth n penalty runs (1-7, default 1)
  wd+r | nb+r       wide / no-ball the batsmen ran r on
  wall r            r runs plus the wall bonus
  w [fielder]       wicket, optionally caught by fielder
Players:
  bat1 NAME | bat2 NAME | in NAME | bowl NAME | swap
Match:
  undo | next (start 2nd innings) | restart | reset
  y | n             answer the same-bowler prompt
  score | summary | export [dir] | help | quit";

/// One line typed at the scorer prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ball(BallInput),
    Wicket { fielder: Option<String> },
    Undo,
    SwapStrike,
    Batter(BatterSlot, String),
    NewBatter(String),
    Bowler(String),
    Confirm(bool),
    SecondInnings,
    Restart,
    Reset,
    Score,
    Summary,
    Export(Option<PathBuf>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', type help")]
    Unknown(String),

    #[error("{0} needs a name")]
    MissingName(&'static str),

    #[error("'{0}' is not a valid run count")]
    InvalidNumber(String),
}

/// Bulk penalty for a wide or no-ball, 1 to 7
fn penalty(text: &str) -> Result<u32, ParseError> {
    match text.parse::<u32>() {
        Ok(runs) if (EXTRA_PENALTY..=MAX_EXTRA_PENALTY).contains(&runs) => Ok(runs),
        _ => Err(ParseError::InvalidNumber(text.to_string())),
    }
}

fn bat_runs(text: &str) -> Result<u8, ParseError> {
    match text.parse::<u8>() {
        Ok(runs) if runs <= 6 => Ok(runs),
        _ => Err(ParseError::InvalidNumber(text.to_string())),
    }
}

fn name(rest: &str, command: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingName(command));
    }
    Ok(rest.to_string())
}

/// `wd`, `wd 3` and `wd+2` forms shared by wides and no-balls
fn extra(
    head: &str,
    prefix: &str,
    rest: &str,
    bulk: fn(u32) -> BallInput,
    with_runs: fn(u8) -> BallInput,
) -> Result<BallInput, ParseError> {
    match head.strip_prefix(prefix) {
        Some("") if rest.is_empty() => Ok(bulk(1)),
        Some("") => Ok(bulk(penalty(rest)?)),
        Some(ran) => match ran.strip_prefix('+') {
            Some(ran) => Ok(with_runs(bat_runs(ran)?)),
            None => Err(ParseError::Unknown(head.to_string())),
        },
        None => Err(ParseError::Unknown(head.to_string())),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let head_lower = head.to_lowercase();

        let command = match head_lower.as_str() {
            "" => return Err(ParseError::Empty),
            "." => Command::Ball(BallInput::dot()),
            h if h.len() == 1 && h.chars().all(|c| c.is_ascii_digit()) => {
                Command::Ball(BallInput::runs(bat_runs(h)?))
            }
            h if h.starts_with("wd") => {
                Command::Ball(extra(h, "wd", rest, BallInput::wide, BallInput::wide_with_runs)?)
            }
            h if h.starts_with("nb") => Command::Ball(extra(
                h,
                "nb",
                rest,
                BallInput::no_ball,
                BallInput::no_ball_with_runs,
            )?),
            "wall" => Command::Ball(BallInput::wall(bat_runs(rest)?)),
            "w" | "wicket" | "out" => Command::Wicket {
                fielder: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "undo" | "u" => Command::Undo,
            "swap" => Command::SwapStrike,
            "bat1" => Command::Batter(BatterSlot::First, name(rest, "bat1")?),
            "bat2" => Command::Batter(BatterSlot::Second, name(rest, "bat2")?),
            "in" => Command::NewBatter(name(rest, "in")?),
            "bowl" => Command::Bowler(name(rest, "bowl")?),
            "y" | "yes" => Command::Confirm(true),
            "n" | "no" => Command::Confirm(false),
            "next" | "innings" => Command::SecondInnings,
            "restart" => Command::Restart,
            "reset" => Command::Reset,
            "score" | "s" => Command::Score,
            "summary" => Command::Summary,
            "export" => Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return Err(ParseError::Unknown(head.to_string())),
        };
        Ok(command)
    }
}
