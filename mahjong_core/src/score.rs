use crate::config::TieBreak;
use crate::pattern::IdentifiedPattern;
use std::cmp::Ordering;

/// Sum of the point values of one conflict-free group. Empty = 0.
pub fn compute_score(patterns: &[IdentifiedPattern]) -> u32 {
    patterns.iter().map(|p| p.value).sum()
}

/// Best conflict-free group of one arrangement, with its position for tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub arrangement: usize,
    pub group: usize,
    pub patterns: Vec<IdentifiedPattern>,
    pub score: u32,
}

impl Candidate {
    pub fn new(arrangement: usize, group: usize, patterns: Vec<IdentifiedPattern>) -> Self {
        let score = compute_score(&patterns);
        Self {
            arrangement,
            group,
            patterns,
            score,
        }
    }

    /// `Less` when `self` should be selected over `other`.
    pub fn compare(&self, other: &Candidate, tie_break: TieBreak) -> Ordering {
        let by_position = || (self.arrangement, self.group).cmp(&(other.arrangement, other.group));
        other.score.cmp(&self.score).then_with(|| match tie_break {
            TieBreak::FirstFound => by_position(),
            TieBreak::MorePatterns => other
                .patterns
                .len()
                .cmp(&self.patterns.len())
                .then_with(by_position),
        })
    }
}

/// Commutative "keep the better one" merge used to reduce per-arrangement results.
pub fn keep_better(
    a: Option<Candidate>,
    b: Option<Candidate>,
    tie_break: TieBreak,
) -> Option<Candidate> {
    match (a, b) {
        (None, x) | (x, None) => x,
        (Some(a), Some(b)) => Some(if b.compare(&a, tie_break) == Ordering::Less {
            b
        } else {
            a
        }),
    }
}
