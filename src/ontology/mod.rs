//! Ontology parsing and dataset construction
//!
//! Turns an OBO file into a deduplicated vocabulary, a mention index, the
//! `is_a` hierarchy and disjoint dictionary/query mention sets.

pub mod dataset;
pub mod parser;
pub mod partition;
pub mod stanza;

pub use dataset::{ConceptId, DatasetStats, Edge, MentionPair, OntologyDataset, SNAPSHOT_VERSION};
pub use parser::{load_data, OntologyParser};
pub use partition::{migration_count, SeededPartitioner, SynonymPartitioner};
