use crate::arrange::PlayerSet;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Per-arrangement results keyed by the arrangement's canonical form.
///
/// Each key owns a `OnceLock`: concurrent callers for the same arrangement wait
/// for a single computation and then share its value. Once `capacity` keys are
/// held, unseen arrangements are computed without being stored.
#[derive(Debug)]
pub struct ArrangementCache<V> {
    capacity: usize,
    entries: Mutex<HashMap<PlayerSet, Arc<OnceLock<V>>>>,
    computed: AtomicUsize,
}

impl<V: Clone> ArrangementCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::new()),
            computed: AtomicUsize::new(0),
        }
    }

    pub fn get_or_compute(&self, key: &PlayerSet, compute: impl FnOnce() -> V) -> V {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(cell) => Some(Arc::clone(cell)),
                None if entries.len() < self.capacity => {
                    let cell = Arc::new(OnceLock::new());
                    entries.insert(key.clone(), Arc::clone(&cell));
                    Some(cell)
                }
                None => None,
            }
        };

        match cell {
            Some(cell) => cell
                .get_or_init(|| {
                    self.computed.fetch_add(1, Ordering::Relaxed);
                    compute()
                })
                .clone(),
            None => compute(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computations whose result went into the cache.
    pub fn computed(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::situation::{Group, SituationContext};
    use crate::tile::Tile;

    fn key(code: &str) -> PlayerSet {
        PlayerSet::new(
            vec![Group::pair(Tile::from_code(code).unwrap())],
            SituationContext::default(),
        )
    }

    #[test]
    fn repeated_keys_compute_once() {
        let cache = ArrangementCache::new(8);
        assert_eq!(cache.get_or_compute(&key("1m"), || 1), 1);
        assert_eq!(cache.get_or_compute(&key("1m"), || 2), 1);
        assert_eq!(cache.get_or_compute(&key("2m"), || 3), 3);
        assert_eq!(cache.computed(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn full_cache_computes_without_storing() {
        let cache = ArrangementCache::new(1);
        cache.get_or_compute(&key("1m"), || 1);
        assert_eq!(cache.get_or_compute(&key("2m"), || 2), 2);
        assert_eq!(cache.get_or_compute(&key("2m"), || 5), 5);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.computed(), 1);
    }

    #[test]
    fn concurrent_callers_share_one_computation() {
        let cache = ArrangementCache::new(8);
        let runs = AtomicUsize::new(0);
        let k = key("E");

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let v = cache.get_or_compute(&k, || {
                        runs.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(10));
                        42
                    });
                    assert_eq!(v, 42);
                });
            }
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cache.computed(), 1);
    }
}
