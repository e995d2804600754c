use crate::config::GroupingRules;
use crate::error::{ScoringError, ScoringResult};
use crate::tile::{Honor, Tile, TileCounts};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Wind {
    #[default]
    E,
    S,
    W,
    N,
}

impl Wind {
    pub fn honor(self) -> Honor {
        match self {
            Wind::E => Honor::East,
            Wind::S => Honor::South,
            Wind::W => Honor::West,
            Wind::N => Honor::North,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum WinType {
    #[default]
    Drawn,
    Claimed,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupKind {
    Chow,
    Pung,
    Kong,
    Pair,
}

/// One scoring group. `first` is the lowest tile (the only tile for pungs,
/// kongs and pairs). Field order is the canonical sort order of arrangements.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Group {
    pub first: Tile,
    pub kind: GroupKind,
    pub concealed: bool,
}

impl Group {
    pub fn chow(first: Tile) -> Option<Self> {
        first.next2()?;
        Some(Group {
            first,
            kind: GroupKind::Chow,
            concealed: true,
        })
    }

    pub fn pung(tile: Tile) -> Self {
        Group {
            first: tile,
            kind: GroupKind::Pung,
            concealed: true,
        }
    }

    pub fn kong(tile: Tile) -> Self {
        Group {
            first: tile,
            kind: GroupKind::Kong,
            concealed: true,
        }
    }

    pub fn pair(tile: Tile) -> Self {
        Group {
            first: tile,
            kind: GroupKind::Pair,
            concealed: true,
        }
    }

    pub fn exposed(mut self) -> Self {
        self.concealed = false;
        self
    }

    pub fn tiles(&self) -> Vec<Tile> {
        match self.kind {
            GroupKind::Chow => {
                let mut v = vec![self.first];
                v.extend(self.first.next());
                v.extend(self.first.next2());
                v
            }
            GroupKind::Pung => vec![self.first; 3],
            GroupKind::Kong => vec![self.first; 4],
            GroupKind::Pair => vec![self.first; 2],
        }
    }

    pub fn contains(&self, t: Tile) -> bool {
        match self.kind {
            GroupKind::Chow => self.tiles().contains(&t),
            _ => self.first == t,
        }
    }

    pub fn is_triplet(&self) -> bool {
        matches!(self.kind, GroupKind::Pung | GroupKind::Kong)
    }

    pub fn is_chow(&self) -> bool {
        self.kind == GroupKind::Chow
    }

    pub fn is_pair(&self) -> bool {
        self.kind == GroupKind::Pair
    }

    /// Every tile is a terminal or honor for pungs/pairs; chows must start or end on a terminal.
    pub fn has_terminal_or_honor(&self) -> bool {
        match self.kind {
            GroupKind::Chow => self.first.num == 1 || self.first.num == 7,
            _ => self.first.is_terminal_or_honor(),
        }
    }
}

/// Situational context shared by every arrangement of one situation.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
pub struct SituationContext {
    pub winning_tile: Option<Tile>,
    pub win_type: WinType,
    pub seat_wind: Wind,
    pub round_wind: Wind,
}

/// Everything a player holds when calling mahjong: concealed tiles still to be
/// arranged plus melds that are already fixed (exposed, or declared concealed kongs).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct PlayerSituation {
    pub concealed: Vec<Tile>,
    #[serde(default)]
    pub melds: Vec<Group>,
    #[serde(default)]
    pub context: SituationContext,
}

impl PlayerSituation {
    pub fn new(concealed: Vec<Tile>, melds: Vec<Group>, context: SituationContext) -> Self {
        Self {
            concealed,
            melds,
            context,
        }
    }

    /// Concealed tiles only, as given by a tile-code list.
    pub fn from_codes(codes: &str) -> ScoringResult<Self> {
        Ok(Self {
            concealed: Tile::parse_list(codes)?,
            ..Default::default()
        })
    }

    pub fn with_melds(mut self, melds: Vec<Group>) -> Self {
        self.melds = melds;
        self
    }

    pub fn with_context(mut self, context: SituationContext) -> Self {
        self.context = context;
        self
    }

    pub fn concealed_counts(&self) -> TileCounts {
        TileCounts::from_tiles(&self.concealed)
    }

    pub fn all_tiles(&self) -> TileCounts {
        let mut counts = self.concealed_counts();
        for m in &self.melds {
            for t in m.tiles() {
                counts.add(t, 1);
            }
        }
        counts
    }

    /// Boundary check run before the core: the core assumes a well-formed situation.
    pub fn validate(&self, rules: &GroupingRules) -> ScoringResult<()> {
        for m in &self.melds {
            match m.kind {
                GroupKind::Pair => {
                    return Err(ScoringError::precondition(format!(
                        "a pair cannot be declared as a meld ({})",
                        m.first
                    )))
                }
                GroupKind::Chow if m.first.next2().is_none() => {
                    return Err(ScoringError::precondition(format!(
                        "chow cannot start at {}",
                        m.first
                    )))
                }
                _ => {}
            }
        }

        let all = self.all_tiles();
        if let Some((t, c)) = all.iter().find(|&(_, c)| c > 4) {
            return Err(ScoringError::precondition(format!(
                "{} copies of {} (at most 4 exist)",
                c, t
            )));
        }

        let n = self.concealed.len();
        if n == 1 || (n != 0 && n % 3 != 2 && !rules.allow_concealed_kongs) {
            return Err(ScoringError::precondition(format!(
                "{} concealed tiles cannot form groups plus one pair",
                n
            )));
        }

        if let Some(w) = self.context.winning_tile {
            if all.get(w) == 0 {
                return Err(ScoringError::precondition(format!(
                    "winning tile {} is not part of the hand",
                    w
                )));
            }
        }

        Ok(())
    }
}
