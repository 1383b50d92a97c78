//! Tests for the embedding index.

use super::*;
use crate::embedding::HashingEmbedder;
use crate::errors::Error;
use crate::fragment::{DistanceMetric, DuplicatePolicy, Metadata, UpsertOutcome};
use crate::index::store::DB_FILE_NAME;
use std::path::PathBuf;
use tempfile::TempDir;

fn open_index(dir: &TempDir, options: IndexOptions) -> EmbeddingIndex {
    EmbeddingIndex::open(dir.path(), Box::new(HashingEmbedder::default()), options).unwrap()
}

fn meta(source: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), source.to_string());
    metadata
}

#[test]
fn test_open_creates_store_directory() {
    let dir = TempDir::new().unwrap();
    let store_dir = dir.path().join("nested").join("store");

    let index = EmbeddingIndex::open(
        &store_dir,
        Box::new(HashingEmbedder::default()),
        IndexOptions::default(),
    )
    .unwrap();

    assert!(store_dir.join(DB_FILE_NAME).exists());
    assert_eq!(index.collection().name, "knowledge");
    assert_eq!(index.collection().dimensions, 384);
}

#[test]
fn test_open_rejects_path_traversal() {
    let result = EmbeddingIndex::open(
        &PathBuf::from("../../../etc/store"),
        Box::new(HashingEmbedder::default()),
        IndexOptions::default(),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_open_rejects_empty_collection_name() {
    let dir = TempDir::new().unwrap();
    let result = EmbeddingIndex::open(
        dir.path(),
        Box::new(HashingEmbedder::default()),
        IndexOptions {
            collection: "  ".to_string(),
            ..IndexOptions::default()
        },
    );
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_reopen_with_different_dimensions_fails() {
    let dir = TempDir::new().unwrap();
    open_index(&dir, IndexOptions::default()).close().unwrap();

    let result = EmbeddingIndex::open(
        dir.path(),
        Box::new(HashingEmbedder::new(128)),
        IndexOptions::default(),
    );
    assert!(matches!(
        result,
        Err(Error::Storage(crate::sqlite::Error::CollectionMismatch { .. }))
    ));
}

#[test]
fn test_reopen_with_different_metric_fails() {
    let dir = TempDir::new().unwrap();
    open_index(&dir, IndexOptions::default()).close().unwrap();

    let result = EmbeddingIndex::open(
        dir.path(),
        Box::new(HashingEmbedder::default()),
        IndexOptions {
            distance_metric: DistanceMetric::L2,
            ..IndexOptions::default()
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_upsert_then_get() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    let outcome = index
        .upsert("frag-1", "S3 is object storage", &meta("test"))
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let fragment = index.get("frag-1").unwrap().unwrap();
    assert_eq!(fragment.text, "S3 is object storage");
    assert_eq!(fragment.metadata["source"], "test");
}

#[test]
fn test_upsert_overwrites_by_default() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    index.upsert("frag-1", "first text", &meta("A")).unwrap();
    let outcome = index.upsert("frag-1", "second text", &meta("B")).unwrap();

    assert_eq!(outcome, UpsertOutcome::Replaced);
    assert_eq!(index.count().unwrap(), 1);
    let fragment = index.get("frag-1").unwrap().unwrap();
    assert_eq!(fragment.text, "second text");
    assert_eq!(fragment.metadata["source"], "B");
}

#[test]
fn test_upsert_reject_policy_surfaces_collision() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(
        &dir,
        IndexOptions {
            duplicate_policy: DuplicatePolicy::Reject,
            ..IndexOptions::default()
        },
    );

    index.upsert("frag-1", "first text", &meta("A")).unwrap();
    let result = index.upsert("frag-1", "second text", &meta("B"));

    assert!(matches!(result, Err(Error::IdentifierCollision(ref id)) if id == "frag-1"));
    assert_eq!(index.get("frag-1").unwrap().unwrap().text, "first text");
}

#[test]
fn test_upsert_empty_text_is_embedding_error() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    let result = index.upsert("frag-1", "   ", &meta("A"));
    assert!(matches!(result, Err(Error::Embedding(_))));
    assert_eq!(index.count().unwrap(), 0);
}

#[test]
fn test_upsert_empty_id_rejected() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    let result = index.upsert("", "text", &meta("A"));
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_upsert_long_text_is_stored_whole() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    let long_text = "lambda scales out ".repeat(6_000);
    assert!(long_text.len() > 100_000);
    index.upsert("frag-1", &long_text, &meta("A")).unwrap();

    let fragment = index.get("frag-1").unwrap().unwrap();
    assert_eq!(fragment.text.len(), long_text.len());
}

#[test]
fn test_query_empty_index_returns_nothing() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    for top_k in 1..=5 {
        assert!(index.query("anything at all", top_k).unwrap().is_empty());
    }
}

#[test]
fn test_query_empty_index_accepts_any_k_and_query() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    let long_query = "a".repeat(100_001);
    assert!(index.query(&long_query, 2).unwrap().is_empty());
    assert!(index.query("q", MAX_SEARCH_LIMIT + 1).unwrap().is_empty());
    assert!(index.query("q", usize::MAX).unwrap().is_empty());
}

#[test]
fn test_query_k_beyond_list_cap_returns_every_fragment() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());
    index.upsert("a", "lambda functions run code", &meta("t")).unwrap();

    let results = index.query("lambda", 20_000).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "a");
}

#[test]
fn test_query_zero_top_k_rejected() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());

    assert!(matches!(index.query("q", 0), Err(Error::InvalidInput(_))));
}

#[test]
fn test_query_returns_min_of_k_and_n() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());
    index.upsert("a", "lambda functions run code", &meta("t")).unwrap();
    index.upsert("b", "dynamodb stores items", &meta("t")).unwrap();
    index.upsert("c", "cloudfront caches content", &meta("t")).unwrap();

    assert_eq!(index.query("code", 1).unwrap().len(), 1);
    assert_eq!(index.query("code", 3).unwrap().len(), 3);
    assert_eq!(index.query("code", 10).unwrap().len(), 3);
}

#[test]
fn test_query_ranks_matching_fragment_first() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());
    index
        .upsert("vpc", "a VPC is an isolated virtual network", &meta("t"))
        .unwrap();
    index
        .upsert("kms", "KMS manages encryption keys", &meta("t"))
        .unwrap();

    let results = index.query("encryption keys", 2).unwrap();
    assert_eq!(results[0].id, "kms");
    assert!(results[0].distance <= results[1].distance);
}

#[test]
fn test_query_with_l2_metric() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(
        &dir,
        IndexOptions {
            distance_metric: DistanceMetric::L2,
            ..IndexOptions::default()
        },
    );
    index
        .upsert("kms", "KMS manages encryption keys", &meta("t"))
        .unwrap();
    index
        .upsert("vpc", "a VPC is an isolated virtual network", &meta("t"))
        .unwrap();

    let results = index.query("KMS manages encryption keys", 2).unwrap();
    assert_eq!(results[0].id, "kms");
    assert!(results[0].distance < 1e-9);
}

#[test]
fn test_delete_and_list() {
    let dir = TempDir::new().unwrap();
    let mut index = open_index(&dir, IndexOptions::default());
    index.upsert("a", "first fragment", &meta("t")).unwrap();
    index.upsert("b", "second fragment", &meta("t")).unwrap();

    assert_eq!(index.list(10).unwrap().len(), 2);
    assert!(index.delete("a").unwrap());
    assert!(!index.delete("a").unwrap());
    assert_eq!(index.list(10).unwrap().len(), 1);
    assert!(index.list(0).is_err());
}

#[test]
fn test_collections_are_isolated() {
    let dir = TempDir::new().unwrap();
    let mut knowledge = open_index(&dir, IndexOptions::default());
    knowledge.upsert("a", "knowledge fragment", &meta("t")).unwrap();
    knowledge.close().unwrap();

    let mut scratch = open_index(
        &dir,
        IndexOptions {
            collection: "scratch".to_string(),
            ..IndexOptions::default()
        },
    );
    assert_eq!(scratch.count().unwrap(), 0);
    assert!(scratch.query("knowledge fragment", 3).unwrap().is_empty());
}

#[test]
fn test_fragments_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut index = open_index(&dir, IndexOptions::default());
        index
            .upsert("frag-1", "S3 is object storage", &meta("test"))
            .unwrap();
    }

    let mut index = open_index(&dir, IndexOptions::default());
    let results = index.query("object storage", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "frag-1");
}
