//! OntologyParser - build an [`OntologyDataset`] from OBO text.
//!
//! ## Build Process
//!
//! 1. Scan `[Term]` blocks and normalize each declared name
//! 2. Count names, sort the distinct ones; a concept id is the rank of its name
//! 3. Walk the blocks again, pairing each with its resolved name by position:
//!    - `is_a` parents found verbatim in the vocabulary become `(parent, child)` edges
//!    - synonyms of unambiguous names are registered first-writer-wins
//!    - each concept's synonym group is partitioned into dictionary/query
//! 4. Sort dictionary and query pairs by concept id (stable)
//!
//! ## Usage
//!
//! ```rust
//! use obo_dataset::ontology::OntologyParser;
//!
//! let text = "[Term]\nname: A\nsynonym: \"a-syn\" EXACT []\n\n[Term]\nname: B\n\n";
//! let dataset = OntologyParser::new(0.5).unwrap().without_normalizer().parse(text);
//! assert_eq!(dataset.vocabulary, vec!["A", "B"]);
//! assert_eq!(dataset.query, vec![("a-syn".to_string(), 0)]);
//! ```

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

use super::dataset::{ConceptId, DatasetStats, MentionPair, OntologyDataset, SNAPSHOT_VERSION};
use super::partition::{migration_count, SeededPartitioner, SynonymPartitioner};
use super::stanza::{scan_terms, TermBlock};
use crate::config::{validate_migration_rate, DatasetConfig};
use crate::error::Result;
use crate::normalize::{IdentityNormalizer, TextNormalizer, TextPreprocessor};

pub struct OntologyParser {
    normalizer: Box<dyn TextNormalizer>,
    partitioner: Box<dyn SynonymPartitioner>,
    migration_rate: f64,
}

impl OntologyParser {
    /// Parser with the default text preprocessor and partition seed 0
    pub fn new(migration_rate: f64) -> Result<Self> {
        validate_migration_rate(migration_rate)?;
        Ok(Self {
            normalizer: Box::new(TextPreprocessor::default()),
            partitioner: Box::new(SeededPartitioner::new(0)),
            migration_rate,
        })
    }

    /// Parser configured from a [`DatasetConfig`], loading any typo dictionary
    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        let parser = Self::new(config.migration_rate)?
            .with_partitioner(SeededPartitioner::new(config.partition_seed));
        if config.use_normalizer {
            Ok(parser.with_normalizer(TextPreprocessor::new(&config.normalizer)?))
        } else {
            Ok(parser.without_normalizer())
        }
    }

    pub fn with_normalizer(mut self, normalizer: impl TextNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Keep names and synonyms exactly as written
    pub fn without_normalizer(self) -> Self {
        self.with_normalizer(IdentityNormalizer)
    }

    pub fn with_partitioner(mut self, partitioner: impl SynonymPartitioner + 'static) -> Self {
        self.partitioner = Box::new(partitioner);
        self
    }

    /// Read and parse an ontology file
    pub fn parse_file(&self, path: &Path) -> Result<OntologyDataset> {
        info!(path = %path.display(), "Parsing ontology");
        let text = std::fs::read_to_string(path)?;
        Ok(self.parse(&text))
    }

    /// Parse ontology text. Never fails: malformed lines are dropped.
    pub fn parse(&self, text: &str) -> OntologyDataset {
        let blocks = scan_terms(text);
        let mut stats = DatasetStats {
            term_blocks: blocks.len(),
            malformed_lines: blocks
                .iter()
                .map(|b| b.malformed_synonyms + b.malformed_parents)
                .sum(),
            ..Default::default()
        };

        // Pass 1: one resolved name per block, consumed by index in pass 2
        let names: Vec<Option<String>> = blocks
            .iter()
            .map(|block| block.name.map(|name| self.normalizer.normalize(name)))
            .collect();

        let mut name_count: HashMap<&str, usize> = HashMap::new();
        for name in names.iter().flatten() {
            *name_count.entry(name.as_str()).or_default() += 1;
        }

        let mut vocabulary: Vec<String> = name_count.keys().map(|n| n.to_string()).collect();
        vocabulary.sort();

        stats.named_terms = names.iter().flatten().count();
        stats.concepts = vocabulary.len();
        stats.ambiguous_names = name_count.values().filter(|&&c| c > 1).count();

        let mut mention_to_id: BTreeMap<String, ConceptId> = vocabulary
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        let mut dictionary: Vec<MentionPair> = vocabulary
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        let mut query: Vec<MentionPair> = Vec::new();
        let mut id_to_mentions: BTreeMap<ConceptId, Vec<String>> = BTreeMap::new();
        let mut edges = Vec::new();

        // Pass 2: structure and synonyms
        for (block, name) in blocks.iter().zip(&names) {
            let Some(name) = name else {
                continue;
            };
            let Ok(id) = vocabulary.binary_search(name) else {
                continue;
            };

            // Parent names are looked up exactly as written in the file
            for parent in &block.parents {
                match vocabulary.binary_search_by(|v| v.as_str().cmp(*parent)) {
                    Ok(parent_id) => edges.push((parent_id, id)),
                    Err(_) => {
                        debug!(line = block.line, parent = %parent, "Dropping edge to unknown parent");
                        stats.edges_dropped += 1;
                    }
                }
            }

            let synonym_group = if name_count.get(name.as_str()) == Some(&1) {
                self.collect_synonyms(block, name, id, &mut mention_to_id, &mut stats)
            } else {
                stats.synonyms_suppressed += block.synonyms.len();
                Vec::new()
            };

            let mut group = Vec::with_capacity(synonym_group.len() + 1);
            group.push(name.clone());
            group.extend(synonym_group.iter().cloned());
            id_to_mentions.insert(id, group);

            let take = migration_count(synonym_group.len(), self.migration_rate);
            let (to_dictionary, to_query) = self.partitioner.partition(synonym_group.len(), take);
            dictionary.extend(to_dictionary.into_iter().map(|i| (synonym_group[i].clone(), id)));
            query.extend(to_query.into_iter().map(|i| (synonym_group[i].clone(), id)));
        }

        // Stable: names stay ahead of their migrated synonyms
        dictionary.sort_by_key(|(_, id)| *id);
        query.sort_by_key(|(_, id)| *id);

        stats.mentions = mention_to_id.len();
        stats.dictionary = dictionary.len();
        stats.query = query.len();
        stats.edges = edges.len();

        info!(
            blocks = stats.term_blocks,
            concepts = stats.concepts,
            mentions = stats.mentions,
            edges = stats.edges,
            edges_dropped = stats.edges_dropped,
            dictionary = stats.dictionary,
            query = stats.query,
            "Parsed ontology"
        );

        OntologyDataset {
            version: SNAPSHOT_VERSION,
            source_hash: format!("{:x}", Sha256::digest(text.as_bytes())),
            vocabulary,
            mention_to_id,
            id_to_mentions,
            dictionary,
            query,
            edges,
            stats,
        }
    }

    /// Register a block's synonyms, returning the ones this concept claimed
    fn collect_synonyms(
        &self,
        block: &TermBlock<'_>,
        name: &str,
        id: ConceptId,
        mention_to_id: &mut BTreeMap<String, ConceptId>,
        stats: &mut DatasetStats,
    ) -> Vec<String> {
        let mut group = Vec::new();
        for raw in &block.synonyms {
            let synonym = self.normalizer.normalize(raw);
            if synonym == name {
                stats.synonyms_self += 1;
                continue;
            }
            if mention_to_id.contains_key(&synonym) {
                stats.synonyms_taken += 1;
                continue;
            }
            mention_to_id.insert(synonym.clone(), id);
            stats.synonyms_registered += 1;
            group.push(synonym);
        }
        group
    }
}

/// Parse with the default preprocessor (or none) and partition seed 0
pub fn load_data(text: &str, migration_rate: f64, use_normalizer: bool) -> Result<OntologyDataset> {
    let parser = OntologyParser::new(migration_rate)?;
    let parser = if use_normalizer {
        parser
    } else {
        parser.without_normalizer()
    };
    Ok(parser.parse(text))
}
