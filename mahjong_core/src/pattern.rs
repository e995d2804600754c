use crate::arrange::PlayerSet;
use crate::error::{ScoringError, ScoringResult};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// Patterns per catalog, bounded by the exclusivity bitmask width.
pub const MAX_PATTERNS: usize = 64;

/// Matching predicate: every way the pattern is satisfied by the arrangement.
pub type MatchFn = fn(&PlayerSet) -> Vec<Claim>;

/// The groups of one arrangement a match relies on, as a bitmask over group indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Claim(u64);

impl Claim {
    /// Claims nothing (situational patterns such as self-drawn).
    pub fn none() -> Self {
        Claim(0)
    }

    pub fn group(idx: usize) -> Self {
        // indices past the mask width can never be valid and fail `fits`
        Claim(1u64.checked_shl(idx as u32).unwrap_or(u64::MAX))
    }

    pub fn groups(indices: impl IntoIterator<Item = usize>) -> Self {
        indices
            .into_iter()
            .fold(Claim::none(), |acc, i| acc.union(Claim::group(i)))
    }

    pub fn all(set: &PlayerSet) -> Self {
        Claim::groups(0..set.len())
    }

    pub fn union(self, other: Claim) -> Self {
        Claim(self.0 | other.0)
    }

    pub fn overlaps(&self, other: &Claim) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn fits(&self, len: usize) -> bool {
        len >= 64 || self.0 >> len == 0
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..64).filter(move |i| self.0 & (1u64 << i) != 0)
    }
}

impl Serialize for Claim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.indices())
    }
}

/// Position of a pattern in its catalog; also its exclusivity bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PatternId(pub u8);

/// A named scoring rule: descriptor plus matching predicate.
#[derive(Debug, Clone)]
pub struct IdentifiablePattern {
    pub name: &'static str,
    pub value: u32,
    /// Claimed groups may not be shared with another exclusive-claim match.
    pub exclusive_claims: bool,
    /// Distinct patterns sharing a tag are mutually exclusive.
    pub tags: &'static [&'static str],
    matcher: MatchFn,
}

impl IdentifiablePattern {
    pub fn new(name: &'static str, value: u32, matcher: MatchFn) -> Self {
        Self {
            name,
            value,
            exclusive_claims: false,
            tags: &[],
            matcher,
        }
    }

    pub fn exclusive_claims(mut self) -> Self {
        self.exclusive_claims = true;
        self
    }

    pub fn tagged(mut self, tags: &'static [&'static str]) -> Self {
        self.tags = tags;
        self
    }

    pub fn identify(&self, set: &PlayerSet) -> Vec<Claim> {
        (self.matcher)(set)
    }
}

/// One successful match inside one arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentifiedPattern {
    pub pattern: PatternId,
    pub name: &'static str,
    pub value: u32,
    pub claim: Claim,
}

/// The ordered pattern table of one ruleset plus its exclusivity relation.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    name: String,
    patterns: Vec<IdentifiablePattern>,
    excludes: Vec<u64>,
}

impl PatternCatalog {
    pub fn builder(name: impl Into<String>) -> CatalogBuilder {
        CatalogBuilder {
            name: name.into(),
            patterns: vec![],
            exclusions: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[IdentifiablePattern] {
        &self.patterns
    }

    pub fn get(&self, id: PatternId) -> Option<&IdentifiablePattern> {
        self.patterns.get(id.0 as usize)
    }

    pub fn id_of(&self, name: &str) -> Option<PatternId> {
        self.patterns
            .iter()
            .position(|p| p.name == name)
            .map(|i| PatternId(i as u8))
    }

    pub fn excludes(&self, a: PatternId, b: PatternId) -> bool {
        self.excludes
            .get(a.0 as usize)
            .map(|mask| mask & (1u64 << b.0) != 0)
            .unwrap_or(false)
    }

    /// Runs every pattern against `set` in catalog order and collects every match.
    /// Conflicting matches are all returned.
    pub fn identify_patterns(&self, set: &PlayerSet) -> ScoringResult<Vec<IdentifiedPattern>> {
        let mut result = vec![];

        for (i, pattern) in self.patterns.iter().enumerate() {
            for claim in pattern.identify(set) {
                if !claim.fits(set.len()) {
                    return Err(ScoringError::catalog(format!(
                        "pattern '{}' claimed groups outside a {}-group arrangement",
                        pattern.name,
                        set.len()
                    )));
                }
                result.push(IdentifiedPattern {
                    pattern: PatternId(i as u8),
                    name: pattern.name,
                    value: pattern.value,
                    claim,
                });
            }
        }

        debug!(catalog = %self.name, identified = result.len(), "identified patterns");
        Ok(result)
    }
}

pub struct CatalogBuilder {
    name: String,
    patterns: Vec<IdentifiablePattern>,
    exclusions: Vec<(&'static str, &'static str)>,
}

impl CatalogBuilder {
    pub fn pattern(mut self, pattern: IdentifiablePattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn exclusive(mut self, a: &'static str, b: &'static str) -> Self {
        self.exclusions.push((a, b));
        self
    }

    pub fn build(self) -> ScoringResult<PatternCatalog> {
        if self.patterns.len() > MAX_PATTERNS {
            return Err(ScoringError::catalog(format!(
                "catalog '{}' has {} patterns, at most {} supported",
                self.name,
                self.patterns.len(),
                MAX_PATTERNS
            )));
        }

        let mut index: HashMap<&'static str, usize> = HashMap::new();
        for (i, p) in self.patterns.iter().enumerate() {
            if index.insert(p.name, i).is_some() {
                return Err(ScoringError::catalog(format!(
                    "duplicate pattern name '{}'",
                    p.name
                )));
            }
        }

        let mut excludes = vec![0u64; self.patterns.len()];
        for &(a, b) in &self.exclusions {
            let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) else {
                return Err(ScoringError::catalog(format!(
                    "exclusivity between unknown patterns '{}' and '{}'",
                    a, b
                )));
            };
            if ia == ib {
                return Err(ScoringError::catalog(format!(
                    "pattern '{}' declared exclusive with itself",
                    a
                )));
            }
            excludes[ia] |= 1 << ib;
            excludes[ib] |= 1 << ia;
        }

        for i in 0..self.patterns.len() {
            for j in (i + 1)..self.patterns.len() {
                let shared = self.patterns[i]
                    .tags
                    .iter()
                    .any(|t| self.patterns[j].tags.contains(t));
                if shared {
                    excludes[i] |= 1 << j;
                    excludes[j] |= 1 << i;
                }
            }
        }

        Ok(PatternCatalog {
            name: self.name,
            patterns: self.patterns,
            excludes,
        })
    }
}
