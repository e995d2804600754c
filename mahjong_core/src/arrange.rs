use crate::config::GroupingRules;
use crate::situation::{Group, PlayerSituation, SituationContext};
use crate::tile::{Tile, TileCounts};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::{debug, warn};

/// One complete decomposition of a situation into groups.
///
/// Groups are kept sorted, so two decompositions listing the same groups in a
/// different order compare (and hash) equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlayerSet {
    groups: Vec<Group>,
    context: SituationContext,
}

impl PlayerSet {
    pub fn new(mut groups: Vec<Group>, context: SituationContext) -> Self {
        groups.sort();
        Self { groups, context }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn context(&self) -> &SituationContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn pair(&self) -> Option<&Group> {
        self.groups.iter().find(|g| g.is_pair())
    }

    /// All groups except the pair.
    pub fn sets(&self) -> impl Iterator<Item = (usize, &Group)> {
        self.groups.iter().enumerate().filter(|(_, g)| !g.is_pair())
    }

    pub fn tiles(&self) -> Vec<Tile> {
        self.groups.iter().flat_map(|g| g.tiles()).collect()
    }

    pub fn tile_counts(&self) -> TileCounts {
        TileCounts::from_tiles(&self.tiles())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Arrangements {
    pub sets: Vec<PlayerSet>,
    /// The branch budget ran out; `sets` holds what was completed before that.
    pub truncated: bool,
    /// Branches expanded (memo misses).
    pub branches: usize,
}

/// Adds `item` to every member of `family`.
///
/// The empty family is treated as the start of a build-up and yields `{[item]}`.
/// Members stay sorted, so the result is deduplicated structurally.
pub fn extend_family<T: Ord + Clone>(family: &BTreeSet<Vec<T>>, item: T) -> BTreeSet<Vec<T>> {
    if family.is_empty() {
        return BTreeSet::from([vec![item]]);
    }

    family
        .iter()
        .map(|member| {
            let mut next = member.clone();
            let pos = next.binary_search(&item).unwrap_or_else(|p| p);
            next.insert(pos, item.clone());
            next
        })
        .collect()
}

/// Every distinct way to arrange the situation's concealed tiles into groups,
/// each completed with the situation's fixed melds.
pub fn create_sets_from_situation(
    situation: &PlayerSituation,
    rules: &GroupingRules,
) -> Arrangements {
    let counts = situation.concealed_counts();
    let mut d = Decomposer {
        memo: HashMap::new(),
        branches: 0,
        limit: rules.max_branches,
        allow_kongs: rules.allow_concealed_kongs,
        truncated: false,
    };

    // every hand needs exactly one pair; only a hand with no tiles at all needs none
    let family = d.solve(counts, !situation.all_tiles().is_empty());

    let sets: Vec<PlayerSet> = family
        .iter()
        .map(|groups| {
            let mut all = groups.clone();
            all.extend(situation.melds.iter().copied());
            PlayerSet::new(all, situation.context)
        })
        .collect();

    if d.truncated {
        warn!(
            branches = d.branches,
            found = sets.len(),
            "arrangement search budget exhausted, returning partial result"
        );
    }
    debug!(arrangements = sets.len(), branches = d.branches, "arranged situation");

    Arrangements {
        sets,
        truncated: d.truncated,
        branches: d.branches,
    }
}

type Family = BTreeSet<Vec<Group>>;

struct Decomposer {
    memo: HashMap<(TileCounts, bool), Rc<Family>>,
    branches: usize,
    limit: usize,
    allow_kongs: bool,
    truncated: bool,
}

impl Decomposer {
    /// Decompositions of `counts`; `pair_open` = the pair is still to be placed.
    fn solve(&mut self, counts: TileCounts, pair_open: bool) -> Rc<Family> {
        // Always group the lowest remaining tile: any decomposition has exactly one
        // group holding it, and a chow holding it must start on it.
        let Some(key) = counts.min_tile() else {
            let mut done = Family::new();
            if !pair_open {
                done.insert(vec![]);
            }
            return Rc::new(done);
        };

        if let Some(hit) = self.memo.get(&(counts, pair_open)) {
            return Rc::clone(hit);
        }
        if self.branches >= self.limit {
            self.truncated = true;
            return Rc::new(Family::new());
        }
        self.branches += 1;

        let mut family = Family::new();
        for (group, rest, pair_after) in self.candidates(key, counts, pair_open) {
            let sub = self.solve(rest, pair_after);
            // an empty sub-family means the branch failed; extending it would
            // fabricate a one-group arrangement
            if sub.is_empty() {
                continue;
            }
            family.extend(extend_family(&sub, group));
        }

        let family = Rc::new(family);
        self.memo.insert((counts, pair_open), Rc::clone(&family));
        family
    }

    fn candidates(
        &self,
        key: Tile,
        counts: TileCounts,
        pair_open: bool,
    ) -> Vec<(Group, TileCounts, bool)> {
        let mut out = vec![];
        let have = counts.get(key);

        if self.allow_kongs && have >= 4 {
            let mut rest = counts;
            rest.take(key, 4);
            out.push((Group::kong(key), rest, pair_open));
        }

        if have >= 3 {
            let mut rest = counts;
            rest.take(key, 3);
            out.push((Group::pung(key), rest, pair_open));
        }

        if pair_open && have >= 2 {
            let mut rest = counts;
            rest.take(key, 2);
            out.push((Group::pair(key), rest, false));
        }

        if let (Some(k2), Some(k3)) = (key.next(), key.next2()) {
            let mut rest = counts;
            if rest.take(key, 1) && rest.take(k2, 1) && rest.take(k3, 1) {
                if let Some(chow) = Group::chow(key) {
                    out.push((chow, rest, pair_open));
                }
            }
        }

        out
    }
}
