//! Dataset configuration
//!
//! All knobs for parsing, splitting, negative sampling and catalog fetching
//! live here. Every field has a default so a partial YAML file is enough:
//!
//! ```yaml
//! migration_rate: 0.5
//! normalizer:
//!   lowercase: true
//!   ignored_punctuation: "-"
//! split:
//!   unseen: true
//!   folds: 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{DatasetError, Result};

/// Environment variable naming a YAML config file
pub const CONFIG_ENV_VAR: &str = "OBO_DATASET_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Fraction of each concept's synonyms moved into the dictionary set
    pub migration_rate: f64,
    /// Run names and synonyms through the text normalizer
    pub use_normalizer: bool,
    /// Seed for the per-concept dictionary/query partition
    pub partition_seed: u64,
    pub normalizer: NormalizerConfig,
    pub split: SplitConfig,
    pub negatives: NegativeConfig,
    pub fetch: FetchConfig,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            migration_rate: 0.5,
            use_normalizer: true,
            partition_seed: 0,
            normalizer: NormalizerConfig::default(),
            split: SplitConfig::default(),
            negatives: NegativeConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

/// Text normalizer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub lowercase: bool,
    pub remove_punctuation: bool,
    /// Punctuation characters that survive punctuation removal
    pub ignored_punctuation: String,
    /// Optional `typo||correction` dictionary
    pub typo_path: Option<PathBuf>,
    /// Apply Unicode NFKC folding before anything else
    pub unicode_fold: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_punctuation: true,
            ignored_punctuation: String::new(),
            typo_path: None,
            unicode_fold: false,
        }
    }
}

/// Train/test fold options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Keep concept ids disjoint between train and test
    pub unseen: bool,
    pub test_fraction: f64,
    pub folds: usize,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            unseen: true,
            test_fraction: 0.33,
            folds: 1,
            seed: 0,
        }
    }
}

/// Negative pair sampling options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativeConfig {
    pub per_positive: usize,
    pub seed: u64,
}

impl Default for NegativeConfig {
    fn default() -> Self {
        Self {
            per_positive: 1,
            seed: 0,
        }
    }
}

/// Ontology catalog download options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub manifest: PathBuf,
    pub output_dir: PathBuf,
    /// Catalog ids known not to download cleanly
    pub skip_ids: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("data/ontologies.jsonld"),
            output_dir: PathBuf::from("data/datasets"),
            skip_ids: ["rs", "fix", "eo", "envo"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 60,
        }
    }
}

impl DatasetConfig {
    /// Load and validate a YAML config file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading dataset configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: DatasetConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `OBO_DATASET_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        validate_migration_rate(self.migration_rate)?;
        self.split.validate()?;
        self.negatives.validate()?;
        Ok(())
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(DatasetError::invalid(
                "test_fraction",
                format!("must be in (0, 1), got {}", self.test_fraction),
            ));
        }
        if self.folds == 0 {
            return Err(DatasetError::invalid("folds", "must be at least 1"));
        }
        Ok(())
    }
}

impl NegativeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.per_positive == 0 {
            return Err(DatasetError::invalid("per_positive", "must be at least 1"));
        }
        Ok(())
    }
}

pub(crate) fn validate_migration_rate(rate: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(DatasetError::invalid(
            "migration_rate",
            format!("must be in [0, 1], got {}", rate),
        ));
    }
    Ok(())
}
