//! Negative (mention, concept) pair synthesis for contrastive training
//!
//! For every positive pair, `per_positive` concepts are drawn uniformly from
//! the candidate list, rejecting any concept already paired with the same
//! mention either positively or by an earlier negative. The candidate pool is
//! checked up front so rejection sampling always terminates.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

use crate::config::NegativeConfig;
use crate::error::{DatasetError, Result};
use crate::ontology::dataset::write_json;
use crate::ontology::{ConceptId, MentionPair};
use crate::rng;

/// Positive pairs alongside their synthesized negatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingPairs {
    pub positive: Vec<MentionPair>,
    pub negative: Vec<MentionPair>,
}

impl TrainingPairs {
    /// Write `positive.json` and `negative.json` under `dir`
    pub fn write_json_dir(&self, dir: &Path) -> Result<()> {
        write_json(&dir.join("positive.json"), &self.positive)?;
        write_json(&dir.join("negative.json"), &self.negative)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NegativeSampler {
    per_positive: usize,
    seed: u64,
}

impl NegativeSampler {
    pub fn new(per_positive: usize, seed: u64) -> Result<Self> {
        NegativeConfig { per_positive, seed }.validate()?;
        Ok(Self { per_positive, seed })
    }

    pub fn from_config(config: &NegativeConfig) -> Result<Self> {
        Self::new(config.per_positive, config.seed)
    }

    /// Draw `per_positive` negatives for each positive pair, in input order.
    ///
    /// Fails with [`DatasetError::InsufficientConcepts`] when some mention has
    /// fewer distinct unpaired candidates than negatives requested for it.
    pub fn sample(&self, concepts: &[ConceptId], positives: &[MentionPair]) -> Result<TrainingPairs> {
        let mut paired: HashMap<&str, HashSet<ConceptId>> = HashMap::new();
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for (mention, id) in positives {
            paired.entry(mention.as_str()).or_default().insert(*id);
            *occurrences.entry(mention.as_str()).or_default() += 1;
        }

        self.check_candidates(concepts, positives, &paired, &occurrences)?;

        let mut rng = rng::seeded(self.seed);
        let mut negative = Vec::with_capacity(positives.len() * self.per_positive);
        for (mention, _) in positives {
            let taken = paired.entry(mention.as_str()).or_default();
            for _ in 0..self.per_positive {
                let concept = loop {
                    let candidate = concepts[rng::sample_index(&mut rng, concepts.len())];
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                };
                taken.insert(concept);
                negative.push((mention.clone(), concept));
            }
        }

        info!(
            positive = positives.len(),
            negative = negative.len(),
            per_positive = self.per_positive,
            "Sampled negative pairs"
        );

        Ok(TrainingPairs {
            positive: positives.to_vec(),
            negative,
        })
    }

    fn check_candidates(
        &self,
        concepts: &[ConceptId],
        positives: &[MentionPair],
        paired: &HashMap<&str, HashSet<ConceptId>>,
        occurrences: &HashMap<&str, usize>,
    ) -> Result<()> {
        let distinct: HashSet<ConceptId> = concepts.iter().copied().collect();
        // Report the first offending mention in input order
        for (mention, _) in positives {
            let mention = mention.as_str();
            let excluded = paired
                .get(mention)
                .map(|ids| ids.iter().filter(|id| distinct.contains(*id)).count())
                .unwrap_or(0);
            let available = distinct.len() - excluded;
            let requested = occurrences.get(mention).copied().unwrap_or(0) * self.per_positive;
            if available < requested {
                return Err(DatasetError::InsufficientConcepts {
                    mention: mention.to_string(),
                    available,
                    requested,
                });
            }
        }
        Ok(())
    }
}

/// Sample negatives with the given seed
pub fn construct_pairs(
    concepts: &[ConceptId],
    positives: &[MentionPair],
    per_positive: usize,
    seed: u64,
) -> Result<TrainingPairs> {
    NegativeSampler::new(per_positive, seed)?.sample(concepts, positives)
}
