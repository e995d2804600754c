use crate::error::{ScoringError, ScoringResult};
use crate::pattern::{IdentifiedPattern, PatternCatalog};
use std::cmp::Ordering;
use tracing::debug;

/// Identified patterns per arrangement, bounded by the bitmask width.
pub const MAX_INSTANCES: usize = 64;

/// Symmetric conflict relation over at most 64 vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGraph {
    adj: Vec<u64>,
}

impl ConflictGraph {
    pub fn with_size(n: usize) -> ScoringResult<Self> {
        if n > MAX_INSTANCES {
            return Err(ScoringError::catalog(format!(
                "{} identified patterns in one arrangement, at most {} supported",
                n, MAX_INSTANCES
            )));
        }
        Ok(Self { adj: vec![0; n] })
    }

    pub fn from_patterns(
        catalog: &PatternCatalog,
        patterns: &[IdentifiedPattern],
    ) -> ScoringResult<Self> {
        let mut graph = Self::with_size(patterns.len())?;

        for p in patterns {
            if catalog.get(p.pattern).is_none() {
                return Err(ScoringError::catalog(format!(
                    "identified pattern '{}' is not part of catalog '{}'",
                    p.name,
                    catalog.name()
                )));
            }
        }

        for i in 0..patterns.len() {
            for j in (i + 1)..patterns.len() {
                if patterns_conflict(catalog, &patterns[i], &patterns[j]) {
                    graph.add_conflict(i, j);
                }
            }
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    pub fn add_conflict(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.adj[i] |= 1 << j;
        self.adj[j] |= 1 << i;
    }

    pub fn conflicts(&self, i: usize, j: usize) -> bool {
        self.adj[i] & (1 << j) != 0
    }

    fn all(&self) -> u64 {
        match self.adj.len() {
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        }
    }

    fn compatible(&self, v: usize) -> u64 {
        self.all() & !self.adj[v] & !(1 << v)
    }

    /// Every maximal independent set, as bitmasks, in discovery order.
    /// The empty graph has exactly one: the empty set.
    pub fn maximal_independent_sets(&self) -> Vec<u64> {
        let mut out = vec![];
        self.bron_kerbosch(0, self.all(), 0, &mut out);
        out
    }

    fn bron_kerbosch(&self, r: u64, mut p: u64, mut x: u64, out: &mut Vec<u64>) {
        if p == 0 {
            if x == 0 {
                out.push(r);
            }
            return;
        }

        let pivot = bits(p | x)
            .max_by_key(|&u| (p & self.compatible(u)).count_ones())
            .unwrap_or(0);

        for v in bits(p & !self.compatible(pivot)) {
            let nv = self.compatible(v);
            self.bron_kerbosch(r | (1 << v), p & nv, x & nv, out);
            p &= !(1 << v);
            x |= 1 << v;
        }
    }

    /// Maximal independent sets sorted best first (see [`rank`]).
    pub fn ranked_sets(&self, values: &[u32]) -> Vec<u64> {
        let mut sets = self.maximal_independent_sets();
        sets.sort_by(|a, b| rank(*a, *b, values));
        sets
    }

    /// Top-ranked independent set, found by branch and bound on the remaining value.
    /// Agrees with the first element of [`ConflictGraph::ranked_sets`].
    pub fn best_set(&self, values: &[u32]) -> u64 {
        self.search(values).best.unwrap_or(0)
    }

    fn search<'a>(&'a self, values: &'a [u32]) -> BranchAndBound<'a> {
        let mut search = BranchAndBound {
            graph: self,
            values,
            best: None,
            nodes: 0,
        };
        search.explore(0, 0, 0, self.len());
        search
    }
}

struct BranchAndBound<'a> {
    graph: &'a ConflictGraph,
    values: &'a [u32],
    best: Option<u64>,
    nodes: usize,
}

impl BranchAndBound<'_> {
    fn explore(&mut self, i: usize, chosen: u64, value: u64, n: usize) {
        self.nodes += 1;
        if i == n {
            let better = match self.best {
                None => true,
                Some(b) => rank(chosen, b, self.values) == Ordering::Less,
            };
            if better {
                self.best = Some(chosen);
            }
            return;
        }

        if let Some(b) = self.best {
            let (open, open_count) = (i..n)
                .filter(|&k| !self.blocked(chosen, k))
                .fold((0u64, 0u32), |(v, c), k| (v + self.values[k] as u64, c + 1));
            let reach = value + open;
            let best_value = mask_value(b, self.values);
            // leaves are visited in positional order, so a later leaf must beat
            // the best on value or size
            if reach < best_value
                || (reach == best_value && chosen.count_ones() + open_count <= b.count_ones())
            {
                return;
            }
        }

        if !self.blocked(chosen, i) {
            self.explore(i + 1, chosen | (1 << i), value + self.values[i] as u64, n);
        }
        self.explore(i + 1, chosen, value, n);
    }

    fn blocked(&self, chosen: u64, k: usize) -> bool {
        self.graph.adj[k] & chosen != 0
    }
}

fn bits(mask: u64) -> impl Iterator<Item = usize> {
    (0..64).filter(move |i| mask & (1u64 << i) != 0)
}

fn mask_value(mask: u64, values: &[u32]) -> u64 {
    bits(mask).map(|i| values[i] as u64).sum()
}

/// Ordering of candidate groups, `Less` = better: higher summed value, then
/// more members, then the lexicographically smaller member positions.
pub fn rank(a: u64, b: u64, values: &[u32]) -> Ordering {
    mask_value(b, values)
        .cmp(&mask_value(a, values))
        .then_with(|| b.count_ones().cmp(&a.count_ones()))
        .then_with(|| {
            let diff = a ^ b;
            if diff == 0 {
                Ordering::Equal
            } else if a & diff & diff.wrapping_neg() != 0 {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        })
}

/// Whether two identified patterns may not be scored together: declared
/// exclusivity between different patterns, or overlapping exclusive claims.
pub fn patterns_conflict(
    catalog: &PatternCatalog,
    a: &IdentifiedPattern,
    b: &IdentifiedPattern,
) -> bool {
    if a.pattern != b.pattern && catalog.excludes(a.pattern, b.pattern) {
        return true;
    }
    let exclusive = |p: &IdentifiedPattern| {
        catalog
            .get(p.pattern)
            .map(|d| d.exclusive_claims)
            .unwrap_or(false)
    };
    exclusive(a) && exclusive(b) && a.claim.overlaps(&b.claim)
}

fn collect(mask: u64, patterns: &[IdentifiedPattern]) -> Vec<IdentifiedPattern> {
    bits(mask).map(|i| patterns[i]).collect()
}

pub fn split_incompatible_patterns(
    catalog: &PatternCatalog,
    patterns: &[IdentifiedPattern],
) -> ScoringResult<Vec<Vec<IdentifiedPattern>>> {
    let graph = ConflictGraph::from_patterns(catalog, patterns)?;
    let values: Vec<u32> = patterns.iter().map(|p| p.value).collect();
    let groups: Vec<Vec<IdentifiedPattern>> = graph
        .ranked_sets(&values)
        .into_iter()
        .map(|mask| collect(mask, patterns))
        .collect();

    debug!(patterns = patterns.len(), groups = groups.len(), "partitioned patterns");
    Ok(groups)
}

pub fn best_compatible_group(
    catalog: &PatternCatalog,
    patterns: &[IdentifiedPattern],
) -> ScoringResult<Vec<IdentifiedPattern>> {
    let graph = ConflictGraph::from_patterns(catalog, patterns)?;
    let values: Vec<u32> = patterns.iter().map(|p| p.value).collect();
    Ok(collect(graph.best_set(&values), patterns))
}
