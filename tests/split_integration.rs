//! Integration tests for fold splitting and negative sampling
//!
//! Tests verify:
//! 1. Unseen folds never share a concept id between train and test
//! 2. The unseen test side never undershoots its target size
//! 3. Folds and negatives are reproducible for a fixed seed
//! 4. Negative pairs never collide with positives or with each other

use obo_dataset::ontology::{ConceptId, MentionPair, OntologyParser};
use obo_dataset::split::{write_folds, FoldSplitter, SplitMode};
use obo_dataset::{construct_pairs, data_split, DatasetError};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Ontology with `n` concepts, concept `k` carrying `k % 4 + 1` synonyms
fn synthetic_ontology(n: usize) -> String {
    let mut text = String::new();
    for k in 0..n {
        text.push_str(&format!("[Term]\nid: T:{k:04}\nname: concept {k:04}\n"));
        for s in 0..(k % 4 + 1) {
            text.push_str(&format!("synonym: \"alias {k:04} {s}\" EXACT []\n"));
        }
        if k > 0 {
            text.push_str(&format!("is_a: T:{:04} ! concept {:04}\n", k / 2, k / 2));
        }
        text.push('\n');
    }
    text
}

fn arb_queries() -> impl Strategy<Value = Vec<MentionPair>> {
    prop::collection::vec(1usize..5, 1..30).prop_map(|sizes| {
        sizes
            .iter()
            .enumerate()
            .flat_map(|(id, &size)| (0..size).map(move |k| (format!("m{id}-{k}"), id)))
            .collect::<Vec<MentionPair>>()
    })
}

// ============================================================================
// PIPELINE TESTS
// ============================================================================

#[test]
fn test_pipeline_parse_split_negatives() {
    let ds = OntologyParser::new(0.5)
        .unwrap()
        .parse(&synthetic_ontology(40));
    assert_eq!(ds.vocabulary.len(), 40);
    assert_eq!(ds.edges.len(), 39);
    assert!(!ds.query.is_empty());

    let folds = data_split(&ds.query, true, 0.33, 3, 0).unwrap();
    assert_eq!(folds.len(), 3);
    for fold in &folds {
        assert!(fold.train_ids().is_disjoint(&fold.test_ids()));
        assert_eq!(fold.train.len() + fold.test.len(), ds.query.len());
    }

    let pairs = construct_pairs(&ds.concept_ids(), &ds.dictionary, 2, 0).unwrap();
    assert_eq!(pairs.negative.len(), ds.dictionary.len() * 2);
}

#[test]
fn test_seen_mode_covers_rows() {
    let ds = OntologyParser::new(0.0)
        .unwrap()
        .parse(&synthetic_ontology(20));
    let splitter = FoldSplitter::new(SplitMode::Seen, 0.2, 2, 4).unwrap();
    for fold in splitter.split(&ds.query) {
        let mut rows: Vec<MentionPair> = fold.train.iter().chain(&fold.test).cloned().collect();
        rows.sort();
        let mut expected = ds.query.clone();
        expected.sort();
        assert_eq!(rows, expected);
    }
}

#[test]
fn test_folds_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ds = OntologyParser::new(0.5)
        .unwrap()
        .parse(&synthetic_ontology(12));
    let folds = data_split(&ds.query, true, 0.33, 2, 1).unwrap();
    write_folds(dir.path(), &folds).unwrap();

    let test: Vec<MentionPair> = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("fold_1/test.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(test, folds[1].test);
}

#[test]
fn test_tiny_vocabulary_fails_fast() {
    let ds = OntologyParser::new(0.5)
        .unwrap()
        .parse(&synthetic_ontology(2));
    let err = construct_pairs(&ds.concept_ids(), &ds.dictionary, 2, 0).unwrap_err();
    assert!(matches!(err, DatasetError::InsufficientConcepts { .. }));
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #[test]
    fn prop_unseen_disjoint(queries in arb_queries(), fraction in 0.05f64..0.95, seed in any::<u64>()) {
        let folds = data_split(&queries, true, fraction, 2, seed).unwrap();
        for fold in &folds {
            prop_assert!(fold.train_ids().is_disjoint(&fold.test_ids()));
            prop_assert!(fold.test.len() as f64 >= queries.len() as f64 * fraction);
            prop_assert_eq!(fold.train.len() + fold.test.len(), queries.len());
        }
    }

    #[test]
    fn prop_split_reproducible(queries in arb_queries(), unseen in any::<bool>(), seed in any::<u64>()) {
        let a = data_split(&queries, unseen, 0.3, 3, seed).unwrap();
        let b = data_split(&queries, unseen, 0.3, 3, seed).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_negatives_disjoint(queries in arb_queries(), per_positive in 1usize..4, seed in any::<u64>()) {
        // Enough candidates for any mention: every mention has one positive id
        let concepts: Vec<ConceptId> = (0..(per_positive + 2)).collect();
        let pairs = construct_pairs(&concepts, &queries, per_positive, seed).unwrap();

        let positive: HashSet<&MentionPair> = pairs.positive.iter().collect();
        let mut seen = HashSet::new();
        for pair in &pairs.negative {
            prop_assert!(!positive.contains(pair));
            prop_assert!(seen.insert(pair.clone()));
        }
        prop_assert_eq!(pairs.negative.len(), queries.len() * per_positive);
    }
}
