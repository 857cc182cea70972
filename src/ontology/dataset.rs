//! OntologyDataset - everything derived from one ontology file.
//!
//! Built once by the parser and immutable afterwards. Maps use `BTreeMap` so
//! both the bincode snapshot and the JSON export are byte-stable for the same
//! input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::{DatasetError, Result};

/// Dense concept identifier: rank of the canonical name in the sorted vocabulary
pub type ConceptId = usize;

/// A `(mention, concept)` pair
pub type MentionPair = (String, ConceptId);

/// `is_a` edge as `(parent, child)`
pub type Edge = (ConceptId, ConceptId);

/// Snapshot format version - increment when struct layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyDataset {
    /// Format version for bincode compatibility
    pub version: u32,

    /// SHA-256 of the source text
    pub source_hash: String,

    /// Distinct canonical names, sorted; the index is the concept id
    pub vocabulary: Vec<String>,

    /// Every name and registered synonym → concept id
    pub mention_to_id: BTreeMap<String, ConceptId>,

    /// Concept id → `[name, synonyms...]`
    pub id_to_mentions: BTreeMap<ConceptId, Vec<String>>,

    /// Retrieval targets: all names plus migrated synonyms, by concept id
    pub dictionary: Vec<MentionPair>,

    /// Held-out synonyms, by concept id
    pub query: Vec<MentionPair>,

    pub edges: Vec<Edge>,

    pub stats: DatasetStats,
}

/// Counters collected while parsing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub term_blocks: usize,
    pub named_terms: usize,
    pub concepts: usize,
    /// Distinct names declared by more than one block
    pub ambiguous_names: usize,
    pub mentions: usize,
    pub synonyms_registered: usize,
    /// Synonyms equal to their own concept's name
    pub synonyms_self: usize,
    /// Synonyms already claimed by an earlier mention
    pub synonyms_taken: usize,
    /// Synonyms discarded because their concept's name is ambiguous
    pub synonyms_suppressed: usize,
    pub dictionary: usize,
    pub query: usize,
    pub edges: usize,
    /// `is_a` references to names outside the vocabulary
    pub edges_dropped: usize,
    /// Lines dropped for missing quotes or a missing `!`
    pub malformed_lines: usize,
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ontology Dataset Statistics:")?;
        writeln!(f, "  Term blocks: {}", self.term_blocks)?;
        writeln!(f, "  Named terms: {}", self.named_terms)?;
        writeln!(f, "  Concepts: {}", self.concepts)?;
        writeln!(f, "  Ambiguous names: {}", self.ambiguous_names)?;
        writeln!(f, "  Mentions: {}", self.mentions)?;
        writeln!(
            f,
            "  Synonyms: {} registered, {} self, {} taken, {} suppressed",
            self.synonyms_registered,
            self.synonyms_self,
            self.synonyms_taken,
            self.synonyms_suppressed
        )?;
        writeln!(f, "  Dictionary pairs: {}", self.dictionary)?;
        writeln!(f, "  Query pairs: {}", self.query)?;
        writeln!(
            f,
            "  Edges: {} ({} dropped)",
            self.edges, self.edges_dropped
        )?;
        writeln!(f, "  Malformed lines: {}", self.malformed_lines)?;
        Ok(())
    }
}

impl OntologyDataset {
    /// Concept id of a mention
    pub fn concept_of(&self, mention: &str) -> Option<ConceptId> {
        self.mention_to_id.get(mention).copied()
    }

    /// Canonical name of a concept
    pub fn name_of(&self, id: ConceptId) -> Option<&str> {
        self.vocabulary.get(id).map(String::as_str)
    }

    /// All concept ids, ascending
    pub fn concept_ids(&self) -> Vec<ConceptId> {
        (0..self.vocabulary.len()).collect()
    }

    /// Parents of a concept
    pub fn parents_of(&self, id: ConceptId) -> Vec<ConceptId> {
        self.edges
            .iter()
            .filter(|(_, child)| *child == id)
            .map(|(parent, _)| *parent)
            .collect()
    }

    /// Children of a concept
    pub fn children_of(&self, id: ConceptId) -> Vec<ConceptId> {
        self.edges
            .iter()
            .filter(|(parent, _)| *parent == id)
            .map(|(_, child)| *child)
            .collect()
    }

    /// Load snapshot from binary file (bincode format)
    pub fn load_binary(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let dataset: Self = bincode::deserialize(&bytes)?;

        if dataset.version != SNAPSHOT_VERSION {
            return Err(DatasetError::SnapshotVersion {
                expected: SNAPSHOT_VERSION,
                found: dataset.version,
            });
        }

        Ok(dataset)
    }

    /// Save snapshot to binary file (bincode format)
    pub fn save_binary(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bincode::serialize(self)?)?;
        info!(path = %path.display(), concepts = self.vocabulary.len(), "Saved dataset snapshot");
        Ok(())
    }

    /// Write each collection as its own JSON file under `dir`
    pub fn write_json_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        write_json(&dir.join("vocabulary.json"), &self.vocabulary)?;
        write_json(&dir.join("mention2id.json"), &self.mention_to_id)?;
        write_json(&dir.join("id2mentions.json"), &self.id_to_mentions)?;
        write_json(&dir.join("dictionary.json"), &self.dictionary)?;
        write_json(&dir.join("query.json"), &self.query)?;
        write_json(&dir.join("edges.json"), &self.edges)?;
        write_json(&dir.join("stats.json"), &self.stats)?;
        info!(dir = %dir.display(), "Wrote dataset JSON files");
        Ok(())
    }
}

/// Pretty-print a value as JSON, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read `(mention, id)` pairs written by [`write_json`]
pub fn read_pairs(path: &Path) -> Result<Vec<MentionPair>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> OntologyDataset {
        let vocabulary = vec!["cell".to_string(), "neuron".to_string()];
        let mention_to_id: BTreeMap<_, _> = [("cell".to_string(), 0), ("neuron".to_string(), 1)]
            .into_iter()
            .collect();
        OntologyDataset {
            version: SNAPSHOT_VERSION,
            source_hash: "test".to_string(),
            vocabulary,
            mention_to_id,
            id_to_mentions: BTreeMap::new(),
            dictionary: vec![("cell".to_string(), 0), ("neuron".to_string(), 1)],
            query: vec![],
            edges: vec![(0, 1)],
            stats: DatasetStats::default(),
        }
    }

    #[test]
    fn test_lookups() {
        let ds = tiny();
        assert_eq!(ds.concept_of("neuron"), Some(1));
        assert_eq!(ds.name_of(0), Some("cell"));
        assert_eq!(ds.name_of(2), None);
        assert_eq!(ds.parents_of(1), vec![0]);
        assert_eq!(ds.children_of(0), vec![1]);
        assert_eq!(ds.concept_ids(), vec![0, 1]);
    }

    #[test]
    fn test_binary_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/ds.bin");
        let ds = tiny();
        ds.save_binary(&path).unwrap();
        assert_eq!(OntologyDataset::load_binary(&path).unwrap(), ds);
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ds.bin");
        let mut ds = tiny();
        ds.version = 99;
        std::fs::write(&path, bincode::serialize(&ds).unwrap()).unwrap();
        let err = OntologyDataset::load_binary(&path).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::SnapshotVersion {
                expected: SNAPSHOT_VERSION,
                found: 99
            }
        ));
    }

    #[test]
    fn test_json_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ds = tiny();
        ds.write_json_dir(dir.path()).unwrap();
        for file in [
            "vocabulary.json",
            "mention2id.json",
            "id2mentions.json",
            "dictionary.json",
            "query.json",
            "edges.json",
            "stats.json",
        ] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
        let dictionary = read_pairs(&dir.path().join("dictionary.json")).unwrap();
        assert_eq!(dictionary, ds.dictionary);
    }
}
