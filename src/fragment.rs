//! Fragment and retrieval data types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Fragment metadata. Keys are ordered so the serialized form is stable.
pub type Metadata = BTreeMap<String, String>;

/// Metadata key holding the origin tag of a fragment.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the question that produced a fragment.
pub const QUERY_KEY: &str = "query";

/// A stored unit of knowledge, as read back from the index.
///
/// The embedding is not part of this struct: it only ever leaves the
/// database as a distance.
#[derive(Debug, Clone, Serialize)]
pub struct Fragment {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub created_at: String,
    pub updated_at: String,
}

/// One nearest-neighbor hit. Produced fresh on every query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    /// Non-negative; smaller means more similar.
    pub distance: f64,
}

impl RetrievalResult {
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    pub fn query(&self) -> Option<&str> {
        self.metadata.get(QUERY_KEY).map(String::as_str)
    }
}

/// What an upsert did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No fragment had this id; a new one was written.
    Inserted,
    /// A fragment with this id existed and was overwritten.
    Replaced,
}

/// Distance metric used for nearest-neighbor ranking.
///
/// Fixed per collection when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity`, clamped at 0. Range `[0, 2]`.
    #[default]
    Cosine,
    /// Squared Euclidean distance.
    L2,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2 => "l2",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "l2" | "euclidean" => Ok(DistanceMetric::L2),
            other => Err(Error::Config(format!(
                "Unknown distance metric '{other}' (expected 'cosine' or 'l2')"
            ))),
        }
    }
}

/// What to do when an upsert targets an id that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace text, embedding and metadata; keep the creation timestamp.
    #[default]
    Overwrite,
    /// Fail with [`Error::IdentifierCollision`].
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(Error::Config(format!(
                "Unknown duplicate policy '{other}' (expected 'overwrite' or 'reject')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_metric_parse() {
        assert_eq!(
            "cosine".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Cosine
        );
        assert_eq!(" L2 ".parse::<DistanceMetric>().unwrap(), DistanceMetric::L2);
        assert_eq!(
            "euclidean".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::L2
        );
        assert!(matches!(
            "manhattan".parse::<DistanceMetric>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_policy_parse() {
        assert_eq!(
            "Reject".parse::<DuplicatePolicy>().unwrap(),
            DuplicatePolicy::Reject
        );
        assert!("ignore".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn test_retrieval_result_accessors() {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), "test".to_string());
        metadata.insert(QUERY_KEY.to_string(), "what is S3?".to_string());
        let result = RetrievalResult {
            id: "abc".to_string(),
            text: "S3 is object storage".to_string(),
            metadata,
            distance: 0.25,
        };
        assert_eq!(result.source(), Some("test"));
        assert_eq!(result.query(), Some("what is S3?"));
    }

    #[test]
    fn test_serialize_outcome_lowercase() {
        let json = serde_json::to_string(&UpsertOutcome::Replaced).unwrap();
        assert_eq!(json, "\"replaced\"");
    }
}
