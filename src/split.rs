//! Train/test fold splitting of query mentions
//!
//! Two policies:
//! - `Seen`: each fold is an independent uniform row split
//! - `Unseen`: whole concept groups are moved into test until the test side
//!   holds at least `test_fraction` of the rows, so no concept id appears on
//!   both sides
//!
//! One generator is seeded per call and shared by all folds in order, so the
//! same inputs and seed always give the same folds.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

use crate::config::SplitConfig;
use crate::error::Result;
use crate::ontology::dataset::write_json;
use crate::ontology::{ConceptId, MentionPair};
use crate::rng::{self, DatasetRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Row-level split; concepts may appear in both train and test
    Seen,
    /// Concept-level split; train and test ids are disjoint
    Unseen,
}

impl SplitMode {
    pub fn from_unseen(unseen: bool) -> Self {
        if unseen {
            SplitMode::Unseen
        } else {
            SplitMode::Seen
        }
    }
}

/// One train/test pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub train: Vec<MentionPair>,
    pub test: Vec<MentionPair>,
}

impl Fold {
    pub fn train_ids(&self) -> BTreeSet<ConceptId> {
        self.train.iter().map(|(_, id)| *id).collect()
    }

    pub fn test_ids(&self) -> BTreeSet<ConceptId> {
        self.test.iter().map(|(_, id)| *id).collect()
    }

    /// Realized share of rows in test
    pub fn test_share(&self) -> f64 {
        let total = self.train.len() + self.test.len();
        if total == 0 {
            0.0
        } else {
            self.test.len() as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct FoldSplitter {
    mode: SplitMode,
    test_fraction: f64,
    folds: usize,
    seed: u64,
}

impl FoldSplitter {
    pub fn new(mode: SplitMode, test_fraction: f64, folds: usize, seed: u64) -> Result<Self> {
        SplitConfig {
            unseen: mode == SplitMode::Unseen,
            test_fraction,
            folds,
            seed,
        }
        .validate()?;
        Ok(Self {
            mode,
            test_fraction,
            folds,
            seed,
        })
    }

    pub fn from_config(config: &SplitConfig) -> Result<Self> {
        Self::new(
            SplitMode::from_unseen(config.unseen),
            config.test_fraction,
            config.folds,
            config.seed,
        )
    }

    /// Produce `folds` train/test pairs. Empty input gives empty folds.
    pub fn split(&self, queries: &[MentionPair]) -> Vec<Fold> {
        if queries.is_empty() {
            return vec![Fold::default(); self.folds];
        }

        let mut rng = rng::seeded(self.seed);
        let folds: Vec<Fold> = (0..self.folds)
            .map(|_| match self.mode {
                SplitMode::Seen => self.seen_fold(queries, &mut rng),
                SplitMode::Unseen => self.unseen_fold(queries, &mut rng),
            })
            .collect();

        for (k, fold) in folds.iter().enumerate() {
            info!(
                fold = k,
                mode = ?self.mode,
                train = fold.train.len(),
                test = fold.test.len(),
                test_share = fold.test_share(),
                "Split fold"
            );
        }

        folds
    }

    /// Uniform row split with `ceil(n * test_fraction)` test rows
    fn seen_fold(&self, queries: &[MentionPair], rng: &mut DatasetRng) -> Fold {
        let n_test = ((queries.len() as f64) * self.test_fraction).ceil() as usize;
        let n_test = n_test.min(queries.len());

        let mut order: Vec<usize> = (0..queries.len()).collect();
        order.shuffle(rng);

        let test_rows: BTreeSet<usize> = order[..n_test].iter().copied().collect();
        partition_rows(queries, |row, _| test_rows.contains(&row))
    }

    /// Move random whole concept groups into test until the target is reached
    fn unseen_fold(&self, queries: &[MentionPair], rng: &mut DatasetRng) -> Fold {
        let mut group_sizes: BTreeMap<ConceptId, usize> = BTreeMap::new();
        for (_, id) in queries {
            *group_sizes.entry(*id).or_default() += 1;
        }

        let target = (queries.len() as f64) * self.test_fraction;
        let mut remaining: Vec<ConceptId> = group_sizes.keys().copied().collect();
        let mut test_ids: BTreeSet<ConceptId> = BTreeSet::new();
        let mut test_rows = 0usize;

        while (test_rows as f64) < target && !remaining.is_empty() {
            let id = remaining.remove(rng::sample_index(rng, remaining.len()));
            test_rows += group_sizes[&id];
            test_ids.insert(id);
        }

        partition_rows(queries, |_, id| test_ids.contains(&id))
    }
}

/// Split rows into (train, test) preserving input order
fn partition_rows<F>(queries: &[MentionPair], is_test: F) -> Fold
where
    F: Fn(usize, ConceptId) -> bool,
{
    let mut fold = Fold::default();
    for (row, pair) in queries.iter().enumerate() {
        if is_test(row, pair.1) {
            fold.test.push(pair.clone());
        } else {
            fold.train.push(pair.clone());
        }
    }
    fold
}

/// Split `queries` into `folds` train/test pairs
pub fn data_split(
    queries: &[MentionPair],
    unseen: bool,
    test_fraction: f64,
    folds: usize,
    seed: u64,
) -> Result<Vec<Fold>> {
    let splitter = FoldSplitter::new(SplitMode::from_unseen(unseen), test_fraction, folds, seed)?;
    Ok(splitter.split(queries))
}

/// Write folds as `fold_{k}/train.json` and `fold_{k}/test.json`
pub fn write_folds(dir: &Path, folds: &[Fold]) -> Result<()> {
    for (k, fold) in folds.iter().enumerate() {
        let fold_dir = dir.join(format!("fold_{k}"));
        write_json(&fold_dir.join("train.json"), &fold.train)?;
        write_json(&fold_dir.join("test.json"), &fold.test)?;
    }
    info!(dir = %dir.display(), folds = folds.len(), "Wrote folds");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries() -> Vec<MentionPair> {
        let mut pairs = Vec::new();
        for id in 0..10 {
            for k in 0..=(id % 3) {
                pairs.push((format!("m{id}_{k}"), id));
            }
        }
        pairs
    }

    #[test]
    fn test_unseen_disjoint_and_not_undershooting() {
        let qs = queries();
        let folds = data_split(&qs, true, 0.33, 5, 0).unwrap();
        assert_eq!(folds.len(), 5);
        for fold in &folds {
            assert!(fold.train_ids().is_disjoint(&fold.test_ids()));
            assert_eq!(fold.train.len() + fold.test.len(), qs.len());
            assert!(fold.test.len() as f64 >= qs.len() as f64 * 0.33);
        }
    }

    #[test]
    fn test_unseen_keeps_groups_whole() {
        let qs = queries();
        let fold = &data_split(&qs, true, 0.5, 1, 3).unwrap()[0];
        for id in fold.test_ids() {
            let total = qs.iter().filter(|(_, i)| *i == id).count();
            let in_test = fold.test.iter().filter(|(_, i)| *i == id).count();
            assert_eq!(total, in_test);
        }
    }

    #[test]
    fn test_seen_sizes() {
        let qs = queries();
        let folds = data_split(&qs, false, 0.25, 3, 1).unwrap();
        let expected_test = (qs.len() as f64 * 0.25).ceil() as usize;
        for fold in &folds {
            assert_eq!(fold.test.len(), expected_test);
            assert_eq!(fold.train.len(), qs.len() - expected_test);
        }
    }

    #[test]
    fn test_folds_differ_but_calls_repeat() {
        let qs = queries();
        let a = data_split(&qs, false, 0.3, 3, 9).unwrap();
        let b = data_split(&qs, false, 0.3, 3, 9).unwrap();
        assert_eq!(a, b);
        assert!(a.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_empty_queries() {
        for unseen in [true, false] {
            let folds = data_split(&[], unseen, 0.33, 3, 0).unwrap();
            assert_eq!(folds, vec![Fold::default(); 3]);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(data_split(&queries(), true, 0.0, 1, 0).is_err());
        assert!(data_split(&queries(), true, 1.0, 1, 0).is_err());
        assert!(data_split(&queries(), true, 0.5, 0, 0).is_err());
    }

    #[test]
    fn test_write_folds() {
        let dir = tempfile::tempdir().unwrap();
        let folds = data_split(&queries(), true, 0.33, 2, 0).unwrap();
        write_folds(dir.path(), &folds).unwrap();
        assert!(dir.path().join("fold_1/test.json").exists());
        let train = crate::ontology::dataset::read_pairs(&dir.path().join("fold_0/train.json"))
            .unwrap();
        assert_eq!(train, folds[0].train);
    }
}
