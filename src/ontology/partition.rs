//! Dictionary/query partition of a concept's synonym group

use rand::seq::SliceRandom;

use crate::rng;

/// Splits `len` items into a dictionary part of exactly `take` items and a
/// query part holding the rest. Returned index lists are ascending, so both
/// parts keep the original synonym order.
pub trait SynonymPartitioner {
    fn partition(&self, len: usize, take: usize) -> (Vec<usize>, Vec<usize>);
}

/// Reseeds for every group, so a concept's split depends only on the size of
/// its own synonym group and not on what was parsed before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededPartitioner {
    pub seed: u64,
}

impl SeededPartitioner {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl SynonymPartitioner for SeededPartitioner {
    fn partition(&self, len: usize, take: usize) -> (Vec<usize>, Vec<usize>) {
        let take = take.min(len);
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut rng::seeded(self.seed));

        let mut dictionary = order[..take].to_vec();
        let mut query = order[take..].to_vec();
        dictionary.sort_unstable();
        query.sort_unstable();
        (dictionary, query)
    }
}

/// Number of synonyms that migrate to the dictionary: `floor(len * rate)`
pub fn migration_count(len: usize, rate: f64) -> usize {
    ((len as f64) * rate).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_count() {
        assert_eq!(migration_count(1, 0.5), 0);
        assert_eq!(migration_count(3, 0.5), 1);
        assert_eq!(migration_count(4, 0.5), 2);
        assert_eq!(migration_count(7, 1.0), 7);
        assert_eq!(migration_count(7, 0.0), 0);
        assert_eq!(migration_count(0, 0.9), 0);
    }

    #[test]
    fn test_partition_covers_all_indices() {
        let p = SeededPartitioner::new(0);
        let (dict, query) = p.partition(10, 4);
        assert_eq!(dict.len(), 4);
        assert_eq!(query.len(), 6);

        let mut all: Vec<usize> = dict.iter().chain(query.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert!(dict.windows(2).all(|w| w[0] < w[1]));
        assert!(query.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_partition_is_reproducible() {
        let p = SeededPartitioner::new(42);
        assert_eq!(p.partition(25, 12), p.partition(25, 12));
    }

    #[test]
    fn test_partition_edges() {
        let p = SeededPartitioner::default();
        assert_eq!(p.partition(0, 0), (vec![], vec![]));
        assert_eq!(p.partition(3, 3).1, Vec::<usize>::new());
        assert_eq!(p.partition(3, 0).0, Vec::<usize>::new());
    }
}
