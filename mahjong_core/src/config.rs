use serde::{Deserialize, Serialize};

/// How concealed tiles may be grouped, and how much searching is allowed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GroupingRules {
    /// Off by default, so decomposition never builds a kong from concealed
    /// tiles. A concealed kong must then be declared as a meld
    /// (`Group::kong` without `exposed`, or `CONCEALED_KONG` in a request).
    pub allow_concealed_kongs: bool,
    /// Upper bound on decomposition branches expanded per situation.
    pub max_branches: usize,
}

impl Default for GroupingRules {
    fn default() -> Self {
        Self {
            allow_concealed_kongs: false,
            max_branches: 100_000,
        }
    }
}

/// When the minimum-mahjong threshold is applied relative to max selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdCheck {
    /// Select the global best first, then compare it against the threshold.
    #[default]
    AfterSelection,
    /// Only candidates meeting the threshold compete; the best score seen is
    /// still reported when none qualifies.
    BeforeSelection,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earliest arrangement in canonical order, then earliest group.
    #[default]
    FirstFound,
    /// Group claiming more patterns, then earliest.
    MorePatterns,
}

/// How the conflict-free groups of one arrangement are searched.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupSearch {
    /// Enumerate every maximal conflict-free group and score each.
    #[default]
    Exhaustive,
    /// Only look for the top-ranked group, pruning by remaining value.
    BranchAndBound,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoringPolicy {
    pub min_value_mahjong: u32,
    pub threshold_check: ThresholdCheck,
    pub tie_break: TieBreak,
    pub group_search: GroupSearch,
    pub grouping: GroupingRules,
    pub parallel: bool,
    /// Dedicated pool size. None = rayon's global pool.
    pub threads: Option<usize>,
    /// Maximum number of cached arrangement results. 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            min_value_mahjong: 1,
            threshold_check: ThresholdCheck::default(),
            tie_break: TieBreak::default(),
            group_search: GroupSearch::default(),
            grouping: GroupingRules::default(),
            parallel: true,
            threads: None,
            cache_capacity: 0,
        }
    }
}

impl ScoringPolicy {
    pub fn with_min_value(mut self, min_value_mahjong: u32) -> Self {
        self.min_value_mahjong = min_value_mahjong;
        self
    }

    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }
}
