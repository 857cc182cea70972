//! Text normalization for ontology mentions
//!
//! Names and synonyms are normalized before they enter the vocabulary so that
//! trivially different spellings collapse onto the same mention:
//! - Optional Unicode NFKC fold
//! - Lowercase conversion
//! - Typo correction from a `typo||correction` dictionary
//! - ASCII punctuation stripping (runs of punctuation/whitespace become one space)

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerConfig;
use crate::error::Result;

/// ASCII punctuation set stripped by default
pub const ASCII_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Maps a raw string to its normalized form.
///
/// Implementations must be idempotent on already-normalized input.
pub trait TextNormalizer {
    fn normalize(&self, text: &str) -> String;
}

/// Pass-through normalizer used when normalization is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityNormalizer;

impl TextNormalizer for IdentityNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Configurable normalizer: lowercase, typo correction, punctuation removal
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    lowercase: bool,
    unicode_fold: bool,
    /// `None` when punctuation removal is disabled
    separator: Option<Regex>,
    typo_to_correction: HashMap<String, String>,
}

impl TextPreprocessor {
    /// Build from config, loading the typo dictionary if one is named
    pub fn new(config: &NormalizerConfig) -> Result<Self> {
        let typo_to_correction = match &config.typo_path {
            Some(path) => load_typo_dictionary(path)?,
            None => HashMap::new(),
        };
        Self::with_typos(config, typo_to_correction)
    }

    /// Build from config with an in-memory typo dictionary
    pub fn with_typos(
        config: &NormalizerConfig,
        typo_to_correction: HashMap<String, String>,
    ) -> Result<Self> {
        let separator = if config.remove_punctuation {
            let kept: String = ASCII_PUNCTUATION
                .chars()
                .filter(|c| !config.ignored_punctuation.contains(*c))
                .collect();
            Some(Regex::new(&format!(r"[\s{}]+", regex::escape(&kept)))?)
        } else {
            None
        };

        Ok(Self {
            lowercase: config.lowercase,
            unicode_fold: config.unicode_fold,
            separator,
            typo_to_correction,
        })
    }

    fn correct_spelling(&self, phrase: &str) -> String {
        phrase
            .split_whitespace()
            .map(|token| {
                self.typo_to_correction
                    .get(token)
                    .map(String::as_str)
                    .unwrap_or(token)
            })
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    fn remove_punctuation(separator: &Regex, phrase: &str) -> String {
        separator
            .split(phrase)
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        // The default punctuation class is a fixed, escaped literal set
        Self::with_typos(&NormalizerConfig::default(), HashMap::new())
            .expect("default punctuation pattern compiles")
    }
}

impl TextNormalizer for TextPreprocessor {
    fn normalize(&self, text: &str) -> String {
        let mut text = if self.unicode_fold {
            text.nfkc().collect::<String>()
        } else {
            text.to_string()
        };

        if self.lowercase {
            text = text.to_lowercase();
        }

        if !self.typo_to_correction.is_empty() {
            text = self.correct_spelling(&text);
        }

        if let Some(separator) = &self.separator {
            text = Self::remove_punctuation(separator, &text);
        }

        text.trim().to_string()
    }
}

/// Load a typo dictionary: one `typo||correction` entry per line.
///
/// A line without `||` maps its token to the empty string.
pub fn load_typo_dictionary(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_typo_dictionary(&content))
}

pub(crate) fn parse_typo_dictionary(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut tokens = line.split("||");
            let typo = tokens.next().unwrap_or_default().to_string();
            let correction = tokens.next().unwrap_or_default().to_string();
            (typo, correction)
        })
        .collect()
}
