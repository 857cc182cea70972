//! obo-dataset - entity-normalization datasets from OBO ontologies
//!
//! Parses an ontology once into a vocabulary of concepts, a mention index,
//! the `is_a` hierarchy and disjoint dictionary/query mention sets, then
//! derives train/test folds and negative training pairs from them. Every
//! stage is deterministic for a given input and seed.
//!
//! ## Quick Start
//!
//! ```rust
//! use obo_dataset::ontology::load_data;
//! use obo_dataset::split::data_split;
//!
//! let text = "[Term]\nname: heart\nsynonym: \"cor\" EXACT []\n\n";
//! let dataset = load_data(text, 0.0, true).unwrap();
//! let folds = data_split(&dataset.query, true, 0.33, 1, 0).unwrap();
//! assert_eq!(folds[0].test, vec![("cor".to_string(), 0)]);
//! ```

// Core error handling
pub mod error;

// YAML/env configuration
pub mod config;

// Mention text normalization
pub mod normalize;

// Seeded random sources
pub mod rng;

// Ontology parsing and the derived dataset
pub mod ontology;

// Train/test folds
pub mod split;

// Negative pair sampling
pub mod negative;

// Registry download
pub mod catalog;

pub use config::DatasetConfig;
pub use error::{DatasetError, Result};
pub use negative::{construct_pairs, NegativeSampler, TrainingPairs};
pub use normalize::{IdentityNormalizer, TextNormalizer, TextPreprocessor};
pub use ontology::{load_data, ConceptId, MentionPair, OntologyDataset, OntologyParser};
pub use split::{data_split, Fold, FoldSplitter, SplitMode};
