use crate::error::{ScoringError, ScoringResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct tile kinds (3 suits x 9 + 4 winds + 3 dragons).
pub const TILE_KINDS: usize = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Honor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Honor {
    East,
    South,
    West,
    North,
    White,
    Green,
    Red,
}

impl Honor {
    const ALL: [Honor; 7] = [
        Honor::East,
        Honor::South,
        Honor::West,
        Honor::North,
        Honor::White,
        Honor::Green,
        Honor::Red,
    ];

    pub fn is_dragon(self) -> bool {
        matches!(self, Honor::White | Honor::Green | Honor::Red)
    }

    pub fn is_wind(self) -> bool {
        !self.is_dragon()
    }
}

/// A single tile. Field order gives the canonical ordering used everywhere:
/// man < pin < sou < honors, then by number, honors by wind/dragon order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tile {
    pub suit: Suit,
    pub num: u8,
    pub honor: Option<Honor>,
}

impl Tile {
    /// Parses the compact code: `1m`..`9m`, `1p`..`9p`, `1s`..`9s`, `E S W N` winds,
    /// `P F C` white/green/red dragons.
    pub fn from_code(code: &str) -> ScoringResult<Self> {
        match code {
            "E" => return Ok(Self::honor(Honor::East)),
            "S" => return Ok(Self::honor(Honor::South)),
            "W" => return Ok(Self::honor(Honor::West)),
            "N" => return Ok(Self::honor(Honor::North)),
            "P" => return Ok(Self::honor(Honor::White)),
            "F" => return Ok(Self::honor(Honor::Green)),
            "C" => return Ok(Self::honor(Honor::Red)),
            _ => {}
        }

        let bytes = code.as_bytes();
        if bytes.len() != 2 {
            return Err(ScoringError::parse(code, "expected a number followed by m/p/s"));
        }

        let n = (bytes[0] as char)
            .to_digit(10)
            .ok_or_else(|| ScoringError::parse(code, "invalid number"))? as u8;
        let suit = match bytes[1] as char {
            'm' => Suit::Man,
            'p' => Suit::Pin,
            's' => Suit::Sou,
            _ => return Err(ScoringError::parse(code, "invalid suit")),
        };

        Tile::suited(suit, n).ok_or_else(|| ScoringError::parse(code, "number must be 1-9"))
    }

    pub fn parse_list(codes: &str) -> ScoringResult<Vec<Tile>> {
        codes
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(Tile::from_code)
            .collect()
    }

    pub fn suited(suit: Suit, num: u8) -> Option<Self> {
        if suit == Suit::Honor || !(1..=9).contains(&num) {
            return None;
        }
        Some(Tile {
            suit,
            num,
            honor: None,
        })
    }

    pub fn honor(h: Honor) -> Self {
        Tile {
            suit: Suit::Honor,
            num: 0,
            honor: Some(h),
        }
    }

    pub fn is_honor(&self) -> bool {
        self.suit == Suit::Honor
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_honor() && (self.num == 1 || self.num == 9)
    }

    pub fn is_terminal_or_honor(&self) -> bool {
        self.is_honor() || self.is_terminal()
    }

    pub fn is_simple(&self) -> bool {
        !self.is_terminal_or_honor()
    }

    pub fn is_dragon(&self) -> bool {
        self.honor.map(Honor::is_dragon).unwrap_or(false)
    }

    pub fn is_wind(&self) -> bool {
        self.honor.map(Honor::is_wind).unwrap_or(false)
    }

    pub fn next(&self) -> Option<Self> {
        if self.is_honor() {
            return None;
        }
        Tile::suited(self.suit, self.num + 1)
    }

    pub fn next2(&self) -> Option<Self> {
        self.next().and_then(|t| t.next())
    }

    pub fn index(&self) -> usize {
        match (self.suit, self.honor) {
            (Suit::Man, _) => (self.num - 1) as usize,
            (Suit::Pin, _) => 9 + (self.num - 1) as usize,
            (Suit::Sou, _) => 18 + (self.num - 1) as usize,
            (Suit::Honor, h) => 27 + h.map_or(0, |h| h as usize),
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0..=8 => Tile::suited(Suit::Man, idx as u8 + 1),
            9..=17 => Tile::suited(Suit::Pin, idx as u8 - 8),
            18..=26 => Tile::suited(Suit::Sou, idx as u8 - 17),
            27..=33 => Some(Tile::honor(Honor::ALL[idx - 27])),
            _ => None,
        }
    }

    pub fn code(&self) -> String {
        match self.honor {
            Some(Honor::East) => "E".into(),
            Some(Honor::South) => "S".into(),
            Some(Honor::West) => "W".into(),
            Some(Honor::North) => "N".into(),
            Some(Honor::White) => "P".into(),
            Some(Honor::Green) => "F".into(),
            Some(Honor::Red) => "C".into(),
            None => {
                let s = match self.suit {
                    Suit::Man => 'm',
                    Suit::Pin => 'p',
                    _ => 's',
                };
                format!("{}{}", self.num, s)
            }
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl TryFrom<String> for Tile {
    type Error = ScoringError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Tile::from_code(&code)
    }
}

impl From<Tile> for String {
    fn from(t: Tile) -> Self {
        t.code()
    }
}

/// Tile multiset as a count per tile kind. Doubles as the canonical signature
/// of a remaining-tiles state during decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCounts([u8; TILE_KINDS]);

impl Default for TileCounts {
    fn default() -> Self {
        TileCounts([0; TILE_KINDS])
    }
}

impl TileCounts {
    pub fn from_tiles<'a>(tiles: impl IntoIterator<Item = &'a Tile>) -> Self {
        let mut counts = TileCounts::default();
        for t in tiles {
            counts.0[t.index()] += 1;
        }
        counts
    }

    pub fn get(&self, t: Tile) -> u8 {
        self.0[t.index()]
    }

    pub fn add(&mut self, t: Tile, n: u8) {
        self.0[t.index()] += n;
    }

    /// Removes `n` copies, returns false (and leaves counts untouched) if not enough remain.
    pub fn take(&mut self, t: Tile, n: u8) -> bool {
        let slot = &mut self.0[t.index()];
        if *slot < n {
            return false;
        }
        *slot -= n;
        true
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    pub fn min_tile(&self) -> Option<Tile> {
        self.0
            .iter()
            .position(|&c| c > 0)
            .and_then(Tile::from_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tile, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .filter_map(|(i, &c)| Tile::from_index(i).map(|t| (t, c)))
    }

    pub fn is_subset_of(&self, other: &TileCounts) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }
}
