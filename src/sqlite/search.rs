//! Nearest-neighbor search over stored embeddings.

use std::cmp::Ordering;

use rusqlite::params;

use super::{Database, Error, decode_metadata, embedding};
use crate::fragment::{DistanceMetric, RetrievalResult};

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum allowed limit for search and list operations.
pub const MAX_SEARCH_LIMIT: usize = 10_000;

/// Validate a list limit is within acceptable bounds.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidLimit(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

/// Distance between two embeddings under `metric`.
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> Result<f64> {
    match metric {
        DistanceMetric::Cosine => embedding::cosine_distance(a, b),
        DistanceMetric::L2 => embedding::squared_l2_distance(a, b),
    }
}

/// Ascending by distance; equal distances fall back to id so the order is total.
fn by_distance(a: &RetrievalResult, b: &RetrievalResult) -> Ordering {
    a.distance
        .partial_cmp(&b.distance)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

impl Database {
    /// Find the `limit` fragments nearest to `query_embedding`.
    ///
    /// Scans every fragment of the collection, computes its distance to the
    /// query, sorts ascending and truncates. Returns an empty vector for an
    /// empty collection. A limit above the collection size returns every
    /// fragment.
    ///
    /// # Errors
    ///
    /// Returns error if the limit is 0, a stored embedding cannot be
    /// decoded, the query embedding has the wrong dimensionality, or the
    /// database query fails.
    pub fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        dimensions: usize,
        metric: DistanceMetric,
        limit: usize,
    ) -> Result<Vec<RetrievalResult>> {
        if limit == 0 {
            return Err(Error::InvalidLimit(
                "Limit must be greater than 0".to_string(),
            ));
        }

        if query_embedding.len() != dimensions {
            return Err(Error::MismatchedDimensions {
                expected: dimensions,
                actual: query_embedding.len(),
            });
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, text, metadata, embedding
            FROM fragments
            WHERE collection = ?1
            "#,
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut results: Vec<RetrievalResult> = Vec::new();
        for row_result in rows {
            let (id, text, metadata, blob) = row_result?;
            let stored_embedding = embedding::blob_to_vec(&blob, dimensions)?;
            let distance = distance(metric, query_embedding, &stored_embedding)?;

            results.push(RetrievalResult {
                id,
                text,
                metadata: decode_metadata(&metadata)?,
                distance,
            });
        }

        results.sort_by(by_distance);
        results.truncate(limit);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{DuplicatePolicy, Metadata};
    use tempfile::TempDir;

    const DIMS: usize = 3;

    fn create_test_db(metric: DistanceMetric) -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        db.ensure_collection("knowledge", "test/model", DIMS, metric)
            .unwrap();
        (dir, db)
    }

    fn put(db: &mut Database, id: &str, embedding: [f32; DIMS]) {
        db.upsert(
            "knowledge",
            id,
            id,
            &embedding,
            DIMS,
            &Metadata::new(),
            DuplicatePolicy::Overwrite,
        )
        .unwrap();
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(MAX_SEARCH_LIMIT + 1).is_err());
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(MAX_SEARCH_LIMIT).is_ok());
    }

    #[test]
    fn test_search_empty_collection() {
        let (_dir, db) = create_test_db(DistanceMetric::Cosine);
        let results = db
            .search("knowledge", &[1.0, 0.0, 0.0], DIMS, DistanceMetric::Cosine, 5)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_orders_by_cosine_distance() {
        let (_dir, mut db) = create_test_db(DistanceMetric::Cosine);
        put(&mut db, "far", [0.0, 0.0, 1.0]);
        put(&mut db, "near", [1.0, 0.1, 0.0]);
        put(&mut db, "mid", [1.0, 1.0, 0.0]);

        let results = db
            .search("knowledge", &[1.0, 0.0, 0.0], DIMS, DistanceMetric::Cosine, 10)
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(results.iter().all(|r| r.distance >= 0.0));
    }

    #[test]
    fn test_search_orders_by_l2_distance() {
        let (_dir, mut db) = create_test_db(DistanceMetric::L2);
        put(&mut db, "a", [5.0, 0.0, 0.0]);
        put(&mut db, "b", [1.0, 0.0, 0.0]);

        let results = db
            .search("knowledge", &[0.0, 0.0, 0.0], DIMS, DistanceMetric::L2, 10)
            .unwrap();
        assert_eq!(results[0].id, "b");
        assert!((results[0].distance - 1.0).abs() < 1e-9);
        assert!((results[1].distance - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_limit() {
        let (_dir, mut db) = create_test_db(DistanceMetric::Cosine);
        for i in 0..5 {
            put(&mut db, &format!("id-{i}"), [1.0, i as f32, 0.0]);
        }

        let results = db
            .search("knowledge", &[1.0, 0.0, 0.0], DIMS, DistanceMetric::Cosine, 2)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "id-0");
    }

    #[test]
    fn test_search_limit_beyond_list_cap_returns_all() {
        let (_dir, mut db) = create_test_db(DistanceMetric::Cosine);
        put(&mut db, "a", [1.0, 0.0, 0.0]);
        put(&mut db, "b", [0.0, 1.0, 0.0]);

        let results = db
            .search(
                "knowledge",
                &[1.0, 0.0, 0.0],
                DIMS,
                DistanceMetric::Cosine,
                MAX_SEARCH_LIMIT * 2,
            )
            .unwrap();
        assert_eq!(results.len(), 2);

        let zero = db.search("knowledge", &[1.0, 0.0, 0.0], DIMS, DistanceMetric::Cosine, 0);
        assert!(matches!(zero, Err(Error::InvalidLimit(_))));
    }

    #[test]
    fn test_search_ties_break_by_id() {
        let (_dir, mut db) = create_test_db(DistanceMetric::Cosine);
        put(&mut db, "b", [1.0, 0.0, 0.0]);
        put(&mut db, "a", [1.0, 0.0, 0.0]);

        let results = db
            .search("knowledge", &[1.0, 0.0, 0.0], DIMS, DistanceMetric::Cosine, 2)
            .unwrap();
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "b");
    }

    #[test]
    fn test_search_wrong_query_dimensions() {
        let (_dir, db) = create_test_db(DistanceMetric::Cosine);
        let result = db.search("knowledge", &[1.0, 0.0], DIMS, DistanceMetric::Cosine, 2);
        assert!(matches!(result, Err(Error::MismatchedDimensions { .. })));
    }
}
