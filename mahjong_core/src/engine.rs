use crate::arrange::{create_sets_from_situation, Arrangements, PlayerSet};
use crate::cache::ArrangementCache;
use crate::config::{GroupSearch, ScoringPolicy, ThresholdCheck};
use crate::error::{ScoringError, ScoringResult};
use crate::exclusivity::{best_compatible_group, split_incompatible_patterns};
use crate::pattern::{IdentifiedPattern, PatternCatalog};
use crate::score::{compute_score, keep_better, Candidate};
use crate::situation::PlayerSituation;
use rayon::prelude::*;
use tracing::debug;

/// The winning (or best non-qualifying) arrangement with its pattern group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredHand {
    pub arrangement: PlayerSet,
    pub patterns: Vec<IdentifiedPattern>,
    pub score: u32,
    /// Position of the arrangement in canonical order.
    pub arrangement_index: usize,
    /// Position of the group in its arrangement's ranked partition.
    pub group_index: usize,
    pub arrangements: usize,
    /// The arrangement search hit its branch budget.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Mahjong(ScoredHand),
    /// Structurally complete, but the best score is below the minimum.
    BelowThreshold(ScoredHand),
    /// The tiles cannot be arranged into groups.
    NoArrangement { truncated: bool },
}

impl Outcome {
    pub fn is_mahjong(&self) -> bool {
        matches!(self, Outcome::Mahjong(_))
    }

    pub fn hand(&self) -> Option<&ScoredHand> {
        match self {
            Outcome::Mahjong(h) | Outcome::BelowThreshold(h) => Some(h),
            Outcome::NoArrangement { .. } => None,
        }
    }

    pub fn score(&self) -> Option<u32> {
        self.hand().map(|h| h.score)
    }
}

/// Best candidates of one arrangement. `qualified` is only tracked when the
/// threshold is applied before selection.
#[derive(Debug, Clone, Default)]
struct LocalBest {
    seen: Option<Candidate>,
    qualified: Option<Candidate>,
}

impl LocalBest {
    fn at(mut self, arrangement: usize) -> Self {
        for c in [&mut self.seen, &mut self.qualified].into_iter().flatten() {
            c.arrangement = arrangement;
        }
        self
    }
}

/// A ruleset's scoring pipeline: catalog + policy.
#[derive(Debug)]
pub struct ScoringSystem {
    catalog: PatternCatalog,
    policy: ScoringPolicy,
    pool: Option<rayon::ThreadPool>,
    cache: Option<ArrangementCache<ScoringResult<LocalBest>>>,
}

impl ScoringSystem {
    pub fn new(catalog: PatternCatalog, policy: ScoringPolicy) -> ScoringResult<Self> {
        let pool = match policy.threads {
            Some(n) if policy.parallel => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ScoringError::Config {
                        message: format!("failed to build thread pool: {}", e),
                    })?,
            ),
            _ => None,
        };
        let cache = (policy.cache_capacity > 0).then(|| ArrangementCache::new(policy.cache_capacity));

        Ok(Self {
            catalog,
            policy,
            pool,
            cache,
        })
    }

    pub fn pattern_list(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn min_value_mahjong(&self) -> u32 {
        self.policy.min_value_mahjong
    }

    /// Arrangements whose results are cached (0 without a cache).
    pub fn cached_arrangements(&self) -> usize {
        self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    pub fn create_sets_from_situation(&self, situation: &PlayerSituation) -> Arrangements {
        create_sets_from_situation(situation, &self.policy.grouping)
    }

    pub fn identify_patterns(&self, set: &PlayerSet) -> ScoringResult<Vec<IdentifiedPattern>> {
        self.catalog.identify_patterns(set)
    }

    pub fn split_incompatible_patterns(
        &self,
        patterns: &[IdentifiedPattern],
    ) -> ScoringResult<Vec<Vec<IdentifiedPattern>>> {
        split_incompatible_patterns(&self.catalog, patterns)
    }

    pub fn compute_score(&self, patterns: &[IdentifiedPattern]) -> u32 {
        compute_score(patterns)
    }

    pub fn score(&self, situation: &PlayerSituation) -> ScoringResult<Outcome> {
        situation.validate(&self.policy.grouping)?;

        let arranged = self.create_sets_from_situation(situation);
        if arranged.sets.is_empty() {
            debug!(truncated = arranged.truncated, "no arrangement");
            return Ok(Outcome::NoArrangement {
                truncated: arranged.truncated,
            });
        }

        let locals = self.evaluate_all(&arranged.sets)?;

        let tie_break = self.policy.tie_break;
        let (seen, qualified) = locals.into_iter().fold((None, None), |(seen, qualified), l| {
            (
                keep_better(seen, l.seen, tie_break),
                keep_better(qualified, l.qualified, tie_break),
            )
        });

        let min = self.policy.min_value_mahjong;
        let (winner, valid) = match self.policy.threshold_check {
            ThresholdCheck::AfterSelection => {
                let valid = seen.as_ref().map(|c| c.score >= min).unwrap_or(false);
                (seen, valid)
            }
            ThresholdCheck::BeforeSelection => match qualified {
                Some(q) => (Some(q), true),
                None => (seen, false),
            },
        };

        // every arrangement has at least the empty group, so a winner exists
        let Some(winner) = winner else {
            return Ok(Outcome::NoArrangement {
                truncated: arranged.truncated,
            });
        };

        debug!(
            score = winner.score,
            min,
            arrangement = winner.arrangement,
            group = winner.group,
            "scored situation"
        );

        let hand = ScoredHand {
            arrangement: arranged.sets[winner.arrangement].clone(),
            score: winner.score,
            arrangement_index: winner.arrangement,
            group_index: winner.group,
            patterns: winner.patterns,
            arrangements: arranged.sets.len(),
            truncated: arranged.truncated,
        };
        Ok(if valid {
            Outcome::Mahjong(hand)
        } else {
            Outcome::BelowThreshold(hand)
        })
    }

    fn evaluate_all(&self, sets: &[PlayerSet]) -> ScoringResult<Vec<LocalBest>> {
        if !self.policy.parallel {
            return sets
                .iter()
                .enumerate()
                .map(|(i, s)| self.evaluate_cached(i, s))
                .collect();
        }

        let run = || {
            sets.par_iter()
                .enumerate()
                .map(|(i, s)| self.evaluate_cached(i, s))
                .collect::<ScoringResult<Vec<_>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn evaluate_cached(&self, index: usize, set: &PlayerSet) -> ScoringResult<LocalBest> {
        let local = match &self.cache {
            Some(cache) => cache.get_or_compute(set, || self.evaluate(set))?,
            None => self.evaluate(set)?,
        };
        Ok(local.at(index))
    }

    fn evaluate(&self, set: &PlayerSet) -> ScoringResult<LocalBest> {
        let patterns = self.identify_patterns(set)?;
        let groups = match self.policy.group_search {
            GroupSearch::Exhaustive => self.split_incompatible_patterns(&patterns)?,
            GroupSearch::BranchAndBound => vec![best_compatible_group(&self.catalog, &patterns)?],
        };

        let tie_break = self.policy.tie_break;
        let min = self.policy.min_value_mahjong;
        let track_qualified = self.policy.threshold_check == ThresholdCheck::BeforeSelection;

        let mut local = LocalBest::default();
        for (gi, group) in groups.into_iter().enumerate() {
            let candidate = Candidate::new(0, gi, group);
            if track_qualified && candidate.score >= min {
                local.qualified = keep_better(local.qualified, Some(candidate.clone()), tie_break);
            }
            local.seen = keep_better(local.seen, Some(candidate), tie_break);
        }
        Ok(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TieBreak;
    use crate::pattern::{Claim, IdentifiablePattern};

    fn any_hand(s: &PlayerSet) -> Vec<Claim> {
        if s.is_empty() {
            vec![]
        } else {
            vec![Claim::none()]
        }
    }

    fn every_chow(s: &PlayerSet) -> Vec<Claim> {
        s.sets()
            .filter(|(_, g)| g.is_chow())
            .map(|(i, _)| Claim::group(i))
            .collect()
    }

    fn every_pung(s: &PlayerSet) -> Vec<Claim> {
        s.sets()
            .filter(|(_, g)| g.is_triplet())
            .map(|(i, _)| Claim::group(i))
            .collect()
    }

    fn catalog() -> PatternCatalog {
        PatternCatalog::builder("test")
            .pattern(IdentifiablePattern::new("mahjong", 1, any_hand))
            .pattern(IdentifiablePattern::new("chow", 1, every_chow))
            .pattern(IdentifiablePattern::new("pung", 2, every_pung))
            .build()
            .unwrap()
    }

    fn system(policy: ScoringPolicy) -> ScoringSystem {
        ScoringSystem::new(catalog(), policy).unwrap()
    }

    fn hand(codes: &str) -> PlayerSituation {
        PlayerSituation::from_codes(codes).unwrap()
    }

    #[test]
    fn picks_the_higher_scoring_arrangement() {
        let sys = system(ScoringPolicy::sequential());
        let out = sys
            .score(&hand("1s 1s 1s 2s 2s 2s 3s 3s 3s 5m 6m 7m 9p 9p"))
            .unwrap();
        let h = out.hand().unwrap();
        assert!(out.is_mahjong());
        assert_eq!(h.arrangements, 2);
        // three pungs (6) + one chow (1) + mahjong (1) beats four chows (5)
        assert_eq!(h.score, 8);
        assert_eq!(
            h.arrangement.groups().iter().filter(|g| g.is_triplet()).count(),
            3
        );
    }

    #[test]
    fn incomplete_hand_is_no_arrangement() {
        let sys = system(ScoringPolicy::sequential());
        let out = sys.score(&hand("1m 2m 4m 7p 7p")).unwrap();
        assert_eq!(out, Outcome::NoArrangement { truncated: false });
        assert_eq!(out.score(), None);
    }

    #[test]
    fn threshold_failure_keeps_provenance() {
        let sys = system(ScoringPolicy::sequential().with_min_value(50));
        let out = sys.score(&hand("1m 2m 3m 5p 5p")).unwrap();
        match out {
            Outcome::BelowThreshold(h) => {
                assert_eq!(h.score, 2);
                assert_eq!(h.patterns.len(), 2);
            }
            other => panic!("expected BelowThreshold, got {:?}", other),
        }
    }

    #[test]
    fn zero_tiles_score_zero() {
        let sys = system(ScoringPolicy::sequential().with_min_value(0));
        let out = sys.score(&PlayerSituation::default()).unwrap();
        assert!(out.is_mahjong());
        assert_eq!(out.score(), Some(0));

        let strict = system(ScoringPolicy::sequential());
        let out = strict.score(&PlayerSituation::default()).unwrap();
        assert!(matches!(out, Outcome::BelowThreshold(ref h) if h.score == 0));
    }

    #[test]
    fn malformed_situation_is_rejected_before_scoring() {
        let sys = system(ScoringPolicy::sequential());
        let err = sys.score(&hand("1m 2m 3m 4m")).unwrap_err();
        assert!(matches!(err, ScoringError::Precondition { .. }));
    }

    #[test]
    fn threshold_policies_agree() {
        let situation = hand("1s 1s 1s 2s 2s 2s 3s 3s 3s 5m 6m 7m 9p 9p");
        for min in [0, 5, 8, 9, 100] {
            let after = system(ScoringPolicy::sequential().with_min_value(min));
            let before = system(ScoringPolicy {
                threshold_check: ThresholdCheck::BeforeSelection,
                ..ScoringPolicy::sequential().with_min_value(min)
            });
            assert_eq!(
                after.score(&situation).unwrap(),
                before.score(&situation).unwrap(),
                "min = {}",
                min
            );
        }
    }

    #[test]
    fn parallel_cached_and_branch_and_bound_match_sequential() {
        let situation = hand("2p 2p 3p 3p 4p 4p 4p 5p 5p 6p 6p 7p 7p 7p");
        let expected = system(ScoringPolicy::sequential()).score(&situation).unwrap();

        let variants = [
            ScoringPolicy::default(),
            ScoringPolicy {
                threads: Some(2),
                cache_capacity: 16,
                ..Default::default()
            },
            ScoringPolicy {
                group_search: GroupSearch::BranchAndBound,
                ..ScoringPolicy::sequential()
            },
        ];
        for policy in variants {
            let sys = system(policy);
            assert_eq!(sys.score(&situation).unwrap(), expected);
            assert_eq!(sys.score(&situation).unwrap(), expected);
        }
    }

    #[test]
    fn cache_holds_one_entry_per_arrangement() {
        let sys = system(ScoringPolicy {
            cache_capacity: 16,
            ..ScoringPolicy::sequential()
        });
        let situation = hand("1s 1s 1s 2s 2s 2s 3s 3s 3s 5m 6m 7m 9p 9p");
        let first = sys.score(&situation).unwrap();
        let second = sys.score(&situation).unwrap();
        assert_eq!(first, second);
        assert_eq!(sys.cached_arrangements(), 2);
    }

    #[test]
    fn tie_break_policy_selects_between_equal_scores() {
        fn flat(_: &PlayerSet) -> Vec<Claim> {
            vec![Claim::none()]
        }
        fn two_small(s: &PlayerSet) -> Vec<Claim> {
            if s.groups().iter().any(|g| g.is_triplet()) {
                vec![Claim::none(), Claim::none()]
            } else {
                vec![]
            }
        }
        fn big(s: &PlayerSet) -> Vec<Claim> {
            if s.groups().iter().any(|g| g.is_chow()) {
                vec![Claim::none()]
            } else {
                vec![]
            }
        }
        let catalog = || {
            PatternCatalog::builder("ties")
                .pattern(IdentifiablePattern::new("flat", 0, flat))
                .pattern(IdentifiablePattern::new("small", 1, two_small))
                .pattern(IdentifiablePattern::new("big", 2, big))
                .build()
                .unwrap()
        };
        // {111 222 333 99} scores 1+1, {123 123 123 99} scores 2: both 2
        let situation = hand("1s 1s 1s 2s 2s 2s 3s 3s 3s 9p 9p");

        let first = ScoringSystem::new(catalog(), ScoringPolicy::sequential()).unwrap();
        let first = first.score(&situation).unwrap();
        assert_eq!(first.hand().unwrap().arrangement_index, 0);

        let more = ScoringSystem::new(
            catalog(),
            ScoringPolicy {
                tie_break: TieBreak::MorePatterns,
                ..ScoringPolicy::sequential()
            },
        )
        .unwrap();
        let more = more.score(&situation).unwrap();
        let h = more.hand().unwrap();
        assert_eq!(h.score, 2);
        assert_eq!(h.patterns.len(), 3);
        assert!(h.arrangement.groups().iter().any(|g| g.is_triplet()));
    }
}
