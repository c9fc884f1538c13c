use crate::models::{
    Award, BattingRecord, BowlingRecord, Innings, InningsSummary, MatchResult,
};

fn batting_points(record: &BattingRecord, winning: Innings) -> i64 {
    let runs = record.runs as i64;
    let strike_rate = record.strike_rate();

    let milestone = if record.runs >= 50 {
        20
    } else if record.runs >= 30 {
        10
    } else {
        0
    };
    let tempo = if strike_rate > 150.0 {
        15
    } else if strike_rate > 120.0 {
        10
    } else {
        0
    };
    let winner = if record.innings == winning { 15 } else { 0 };

    runs + milestone + tempo + record.fours as i64 * 2 + record.sixes as i64 * 4 + winner
}

fn bowling_points(record: &BowlingRecord, winning: Innings) -> i64 {
    let wickets = record.wickets as i64;
    let economy = record.economy();

    let haul = if record.wickets >= 3 {
        25
    } else if record.wickets >= 2 {
        10
    } else {
        0
    };
    let control = if economy < 4.0 {
        20
    } else if economy < 6.0 {
        10
    } else {
        0
    };
    let expensive = if economy > 10.0 { 10 } else { 0 };
    // Keyed on the innings the record belongs to, same as batting
    let winner = if record.innings == winning { 15 } else { 0 };

    wickets * 20 + haul + control - expensive + winner
}

/// Highest-scoring record; the first one found keeps a tie
fn top<'a, R>(records: impl Iterator<Item = &'a R>, points: impl Fn(&R) -> i64) -> Option<(&'a R, i64)>
where
    R: 'a,
{
    records.fold(None, |best, record| {
        let p = points(record);
        match best {
            Some((_, best_points)) if best_points >= p => best,
            _ => Some((record, p)),
        }
    })
}

/// Pick the best performer across both innings.
///
/// The top bowler takes the award over the top batsman on more points, or on equal
/// points with at least one wicket.
pub fn best_performer(
    first: &InningsSummary,
    second: &InningsSummary,
    result: &MatchResult,
) -> Option<Award> {
    let winning = result.winning_innings();

    let batsman = top(first.batting.iter().chain(&second.batting), |r| {
        batting_points(r, winning)
    });
    let bowler = top(first.bowling.iter().chain(&second.bowling), |r| {
        bowling_points(r, winning)
    });

    let batting_award = |(r, points): (&BattingRecord, i64)| Award {
        name: r.name.clone(),
        reason: format!("{} runs off {} balls", r.runs, r.balls),
        points,
    };
    let bowling_award = |(r, points): (&BowlingRecord, i64)| Award {
        name: r.name.clone(),
        reason: format!("{} wickets for {} runs", r.wickets, r.runs_conceded),
        points,
    };

    match (batsman, bowler) {
        (Some(bat), Some(bowl)) => {
            let bowler_wins = bowl.1 > bat.1 || (bowl.1 == bat.1 && bowl.0.wickets >= 1);
            if bowler_wins {
                Some(bowling_award(bowl))
            } else {
                Some(batting_award(bat))
            }
        }
        (Some(bat), None) => Some(batting_award(bat)),
        (None, Some(bowl)) => Some(bowling_award(bowl)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Extras, Margin};

    fn bat(name: &str, innings: Innings, runs: u32, balls: u32, fours: u32, sixes: u32) -> BattingRecord {
        BattingRecord {
            name: name.to_string(),
            innings,
            runs,
            balls,
            fours,
            sixes,
        }
    }

    fn bowl(name: &str, innings: Innings, runs_conceded: u32, wickets: u32, balls: u32) -> BowlingRecord {
        BowlingRecord {
            name: name.to_string(),
            innings,
            runs_conceded,
            wickets,
            balls,
            wides: 0,
            no_balls: 0,
        }
    }

    fn innings(innings: Innings, batting: Vec<BattingRecord>, bowling: Vec<BowlingRecord>) -> InningsSummary {
        InningsSummary {
            innings,
            batting_team: "Side".to_string(),
            runs: 0,
            wickets: 0,
            balls: 0,
            overs: "0.0".to_string(),
            extras: Extras::default(),
            batting,
            bowling,
            fielding: Vec::new(),
        }
    }

    fn chasers_won() -> MatchResult {
        MatchResult {
            winner: 1,
            winner_name: "Chasers".to_string(),
            margin: Margin::Wickets(5),
        }
    }

    #[test]
    fn test_batting_points() {
        // 52 off 30: 52 + 20 + 15 (SR 173) + 3*2 + 2*4 + 15
        let r = bat("Gill", Innings::Second, 52, 30, 3, 2);
        assert_eq!(batting_points(&r, Innings::Second), 116);
        assert_eq!(batting_points(&r, Innings::First), 101);

        // 30 off 25: SR 120 is not above 120
        let r = bat("Pant", Innings::First, 30, 25, 0, 0);
        assert_eq!(batting_points(&r, Innings::Second), 40);
    }

    #[test]
    fn test_bowling_points() {
        // 3 for 12 off 24 balls: 60 + 25 + 20 (econ 3.0)
        let r = bowl("Bumrah", Innings::First, 12, 3, 24);
        assert_eq!(bowling_points(&r, Innings::Second), 105);

        // 0 for 33 off 18 balls: econ 11 costs 10
        let r = bowl("Expensive", Innings::First, 33, 0, 18);
        assert_eq!(bowling_points(&r, Innings::Second), -10);
    }

    #[test]
    fn test_bowler_wins_on_points() {
        let first = innings(
            Innings::First,
            vec![bat("Root", Innings::First, 20, 20, 2, 0)],
            vec![],
        );
        let second = innings(
            Innings::Second,
            vec![],
            vec![bowl("Anderson", Innings::Second, 12, 3, 24)],
        );
        let award = best_performer(&first, &second, &chasers_won()).unwrap();
        assert_eq!(award.name, "Anderson");
        assert_eq!(award.reason, "3 wickets for 12 runs");
    }

    #[test]
    fn test_tie_needs_a_wicket() {
        // Economy of exactly 6.0 earns nothing; both sides end on 15
        let first = innings(
            Innings::First,
            vec![bat("Root", Innings::First, 15, 15, 0, 0)],
            vec![],
        );
        let second = innings(
            Innings::Second,
            vec![],
            vec![bowl("Wood", Innings::Second, 6, 0, 6)],
        );
        let award = best_performer(&first, &second, &chasers_won()).unwrap();
        // 15 points each, no wicket: the batsman keeps it
        assert_eq!(award.name, "Root");
        assert_eq!(award.reason, "15 runs off 15 balls");
    }

    #[test]
    fn test_first_found_keeps_tie() {
        let first = innings(
            Innings::First,
            vec![
                bat("Early", Innings::First, 10, 10, 0, 0),
                bat("Late", Innings::First, 10, 10, 0, 0),
            ],
            vec![],
        );
        let second = innings(Innings::Second, vec![], vec![]);
        let award = best_performer(&first, &second, &chasers_won()).unwrap();
        assert_eq!(award.name, "Early");
    }

    #[test]
    fn test_no_records() {
        let first = innings(Innings::First, vec![], vec![]);
        let second = innings(Innings::Second, vec![], vec![]);
        assert!(best_performer(&first, &second, &chasers_won()).is_none());
    }
}
