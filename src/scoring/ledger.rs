use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{BattingRecord, BowlingRecord, DeliveryKind, FielderRecord, Innings, PlayerKey};

/// A per-player statistics record keyed by (name, innings)
pub trait LedgerRecord {
    fn blank(name: &str, innings: Innings) -> Self;
    fn key(&self) -> PlayerKey;
    fn innings(&self) -> Innings;
}

impl LedgerRecord for BattingRecord {
    fn blank(name: &str, innings: Innings) -> Self {
        Self {
            name: name.to_string(),
            innings,
            runs: 0,
            balls: 0,
            fours: 0,
            sixes: 0,
        }
    }

    fn key(&self) -> PlayerKey {
        PlayerKey::new(&self.name, self.innings)
    }

    fn innings(&self) -> Innings {
        self.innings
    }
}

impl LedgerRecord for BowlingRecord {
    fn blank(name: &str, innings: Innings) -> Self {
        Self {
            name: name.to_string(),
            innings,
            runs_conceded: 0,
            wickets: 0,
            balls: 0,
            wides: 0,
            no_balls: 0,
        }
    }

    fn key(&self) -> PlayerKey {
        PlayerKey::new(&self.name, self.innings)
    }

    fn innings(&self) -> Innings {
        self.innings
    }
}

impl LedgerRecord for FielderRecord {
    fn blank(name: &str, innings: Innings) -> Self {
        Self {
            name: name.to_string(),
            innings,
            catches: 0,
        }
    }

    fn key(&self) -> PlayerKey {
        PlayerKey::new(&self.name, self.innings)
    }

    fn innings(&self) -> Innings {
        self.innings
    }
}

/// Records in first-seen order with keyed lookup
#[derive(Debug, Clone)]
pub struct Table<R> {
    records: Vec<R>,
    index: HashMap<PlayerKey, usize>,
}

impl<R: LedgerRecord> Table<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn from_records(records: Vec<R>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key(), i))
            .collect();
        Self { records, index }
    }

    pub fn get(&self, name: &str, innings: Innings) -> Option<&R> {
        self.index
            .get(&PlayerKey::new(name, innings))
            .map(|&i| &self.records[i])
    }

    fn find_or_create(&mut self, name: &str, innings: Innings) -> &mut R {
        let key = PlayerKey::new(name, innings);
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.records.push(R::blank(name, innings));
                let i = self.records.len() - 1;
                self.index.insert(key, i);
                i
            }
        };
        &mut self.records[i]
    }

    /// All records, in the order players first appeared
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn for_innings(&self, innings: Innings) -> impl Iterator<Item = &R> {
        self.records.iter().filter(move |r| r.innings() == innings)
    }

    pub fn last(&self) -> Option<&R> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: LedgerRecord> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PartialEq> PartialEq for Table<R> {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl<R: Serialize> Serialize for Table<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de, R: Deserialize<'de> + LedgerRecord> Deserialize<'de> for Table<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<R>::deserialize(deserializer)?;
        Ok(Self::from_records(records))
    }
}

/// Batting, bowling and fielding statistics for both innings.
///
/// Undo restores a cloned copy of the whole ledger rather than replaying negative
/// deltas, so a player's first ball never leaves an empty record behind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsLedger {
    pub batting: Table<BattingRecord>,
    pub bowling: Table<BowlingRecord>,
    pub fielding: Table<FielderRecord>,
}

impl StatsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit one ball faced to a batsman
    pub fn credit_batsman(
        &mut self,
        name: &str,
        innings: Innings,
        runs: u32,
        is_four: bool,
        is_six: bool,
    ) {
        let record = self.batting.find_or_create(name, innings);
        record.runs += runs;
        record.balls += 1;
        if is_four {
            record.fours += 1;
        }
        if is_six {
            record.sixes += 1;
        }
    }

    /// Charge a delivery to a bowler
    pub fn credit_bowler(
        &mut self,
        name: &str,
        innings: Innings,
        runs_conceded: u32,
        is_wicket: bool,
        is_legal: bool,
        kind: DeliveryKind,
    ) {
        let record = self.bowling.find_or_create(name, innings);
        record.runs_conceded += runs_conceded;
        if is_wicket {
            record.wickets += 1;
        }
        if is_legal {
            record.balls += 1;
        }
        match kind {
            DeliveryKind::Wide => record.wides += 1,
            DeliveryKind::NoBall => record.no_balls += 1,
            _ => {}
        }
    }

    pub fn credit_fielder(&mut self, name: &str, innings: Innings) {
        self.fielding.find_or_create(name, innings).catches += 1;
    }

    /// Name on the most recently created bowling record
    pub fn last_bowler(&self) -> Option<&str> {
        self.bowling.last().map(|r| r.name.as_str())
    }

    pub fn batting_for(&self, innings: Innings) -> Vec<BattingRecord> {
        self.batting.for_innings(innings).cloned().collect()
    }

    pub fn bowling_for(&self, innings: Innings) -> Vec<BowlingRecord> {
        self.bowling.for_innings(innings).cloned().collect()
    }

    pub fn fielding_for(&self, innings: Innings) -> Vec<FielderRecord> {
        self.fielding.for_innings(innings).cloned().collect()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
