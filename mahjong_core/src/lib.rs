use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeldType {
    Chow,
    Pung,
    Kong,
    ConcealedKong,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Meld {
    #[serde(rename = "type")]
    pub meld_type: MeldType,
    pub tiles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub round_wind: Wind,
    #[serde(default)]
    pub seat_wind: Wind,
    #[serde(default)]
    pub win_type: WinType,

    pub hand_tiles: Vec<String>,
    #[serde(default)]
    pub win_tile: Option<String>,

    #[serde(default)]
    pub melds: Vec<Meld>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    ValidMahjong,
    BelowThreshold,
    NoArrangement,
}

#[derive(Debug, Serialize)]
pub struct ScoreReport {
    pub outcome: OutcomeKind,
    pub score: u32,
    pub min_value_mahjong: u32,
    pub patterns: Vec<IdentifiedPattern>,
    pub groups: Vec<Group>,
    pub arrangements: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
pub struct PatternInfo {
    pub name: &'static str,
    pub value: u32,
    pub exclusive_claims: bool,
    pub excludes: Vec<&'static str>,
}

mod arrange;
mod cache;
mod catalog;
mod config;
mod engine;
mod error;
mod exclusivity;
mod pattern;
mod score;
mod situation;
mod tile;

pub use arrange::{create_sets_from_situation, extend_family, Arrangements, PlayerSet};
pub use cache::ArrangementCache;
pub use catalog::{reference_catalog, REFERENCE_CATALOG};
pub use config::{GroupSearch, GroupingRules, ScoringPolicy, ThresholdCheck, TieBreak};
pub use engine::{Outcome, ScoredHand, ScoringSystem};
pub use error::{ScoringError, ScoringResult};
pub use exclusivity::{
    best_compatible_group, patterns_conflict, rank, split_incompatible_patterns, ConflictGraph,
    MAX_INSTANCES,
};
pub use pattern::{
    CatalogBuilder, Claim, IdentifiablePattern, IdentifiedPattern, MatchFn, PatternCatalog,
    PatternId, MAX_PATTERNS,
};
pub use score::{compute_score, keep_better, Candidate};
pub use situation::{Group, GroupKind, PlayerSituation, SituationContext, WinType, Wind};
pub use tile::{Honor, Suit, Tile, TileCounts, TILE_KINDS};

impl Meld {
    fn to_group(&self) -> ScoringResult<Group> {
        let mut tiles = self
            .tiles
            .iter()
            .map(|c| Tile::from_code(c))
            .collect::<ScoringResult<Vec<_>>>()?;
        tiles.sort();

        let malformed = || {
            ScoringError::precondition(format!(
                "malformed {:?} meld: {}",
                self.meld_type,
                self.tiles.join(" ")
            ))
        };
        let Some(&first) = tiles.first() else {
            return Err(malformed());
        };

        let group = match self.meld_type {
            MeldType::Chow => Group::chow(first).map(Group::exposed),
            MeldType::Pung => Some(Group::pung(first).exposed()),
            MeldType::Kong => Some(Group::kong(first).exposed()),
            MeldType::ConcealedKong => Some(Group::kong(first)),
        };
        match group {
            Some(g) if g.tiles() == tiles => Ok(g),
            _ => Err(malformed()),
        }
    }
}

impl ScoreRequest {
    /// Hand tiles plus the winning tile form the concealed part; melds are fixed groups.
    pub fn to_situation(&self) -> ScoringResult<PlayerSituation> {
        let mut concealed = self
            .hand_tiles
            .iter()
            .map(|c| Tile::from_code(c))
            .collect::<ScoringResult<Vec<_>>>()?;

        let winning_tile = self.win_tile.as_deref().map(Tile::from_code).transpose()?;
        concealed.extend(winning_tile);

        let melds = self
            .melds
            .iter()
            .map(Meld::to_group)
            .collect::<ScoringResult<Vec<_>>>()?;

        Ok(PlayerSituation::new(
            concealed,
            melds,
            SituationContext {
                winning_tile,
                win_type: self.win_type,
                seat_wind: self.seat_wind,
                round_wind: self.round_wind,
            },
        ))
    }
}

impl ScoreReport {
    pub fn new(outcome: &Outcome, min_value_mahjong: u32) -> Self {
        let kind = match outcome {
            Outcome::Mahjong(_) => OutcomeKind::ValidMahjong,
            Outcome::BelowThreshold(_) => OutcomeKind::BelowThreshold,
            Outcome::NoArrangement { .. } => OutcomeKind::NoArrangement,
        };

        match outcome.hand() {
            Some(h) => ScoreReport {
                outcome: kind,
                score: h.score,
                min_value_mahjong,
                patterns: h.patterns.clone(),
                groups: h.arrangement.groups().to_vec(),
                arrangements: h.arrangements,
                truncated: h.truncated,
            },
            None => ScoreReport {
                outcome: kind,
                score: 0,
                min_value_mahjong,
                patterns: vec![],
                groups: vec![],
                arrangements: 0,
                truncated: matches!(outcome, Outcome::NoArrangement { truncated: true }),
            },
        }
    }
}

pub fn describe_catalog(catalog: &PatternCatalog) -> Vec<PatternInfo> {
    catalog
        .patterns()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let id = PatternId(i as u8);
            PatternInfo {
                name: p.name,
                value: p.value,
                exclusive_claims: p.exclusive_claims,
                excludes: catalog
                    .patterns()
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| catalog.excludes(id, PatternId(j as u8)))
                    .map(|(_, q)| q.name)
                    .collect(),
            }
        })
        .collect()
}

/// Converts, validates and scores one request.
pub fn score(system: &ScoringSystem, req: &ScoreRequest) -> ScoringResult<ScoreReport> {
    let situation = req.to_situation()?;
    let outcome = system.score(&situation)?;
    Ok(ScoreReport::new(&outcome, system.min_value_mahjong()))
}
