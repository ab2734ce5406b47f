//! Server Selection
//!
//! Uniform random pick of one config server per group fetch.

use crate::router::ServerList;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Picks a server from the pool
#[derive(Debug)]
pub struct ServerSelector {
    rng: Mutex<StdRng>,
}

impl ServerSelector {
    /// Selector seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Selector with a reproducible sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick one server, `None` when the pool is empty
    pub fn pick<'a>(&self, list: &'a ServerList) -> Option<&'a str> {
        let mut rng = self.rng.lock();
        list.servers().choose(&mut *rng).map(String::as_str)
    }
}

impl Default for ServerSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool() -> ServerList {
        ServerList::new(vec![
            "10.0.0.1".to_string(),
            "10.0.0.2".to_string(),
            "10.0.0.3".to_string(),
        ])
    }

    #[test]
    fn test_empty_pool_has_no_pick() {
        let selector = ServerSelector::new();
        assert!(selector.pick(&ServerList::default()).is_none());
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let list = pool();
        let a = ServerSelector::seeded(7);
        let b = ServerSelector::seeded(7);

        let picks_a: Vec<_> = (0..20).map(|_| a.pick(&list).unwrap()).collect();
        let picks_b: Vec<_> = (0..20).map(|_| b.pick(&list).unwrap()).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_selection_covers_pool() {
        let list = pool();
        let selector = ServerSelector::seeded(1);

        let seen: HashSet<_> = (0..200).map(|_| selector.pick(&list).unwrap()).collect();
        assert_eq!(seen.len(), 3);
    }
}
