//! SQLite backend for the embedding index.
//!
//! This module provides:
//! - `Database`: SQLite connection, schema and fragment persistence
//! - `CollectionInfo`: per-collection embedding parameters
//! - `embedding`: BLOB conversion and vector distances
//! - `search`: brute-force nearest-neighbor search

pub mod embedding;
pub mod search;

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::fragment::{DistanceMetric, DuplicatePolicy, Fragment, Metadata, UpsertOutcome};

use self::embedding::vec_to_blob;

/// Embedding parameters a collection was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub distance_metric: DistanceMetric,
    pub created_at: String,
}

/// Error types for SQLite operations, re-exported as `agent_kdb::StorageError`.
#[derive(Debug)]
pub enum Error {
    Sqlite(String),
    InvalidBlobSize {
        expected: usize,
        actual: usize,
    },
    MismatchedDimensions {
        expected: usize,
        actual: usize,
    },
    EmptyVector,
    InvalidEmbedding(String),
    InvalidLimit(String),
    InvalidMetadata(String),
    CollectionMismatch {
        collection: String,
        field: &'static str,
        stored: String,
        requested: String,
    },
    DuplicateId(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sqlite(msg) => write!(f, "Database error: {}", msg),
            Error::InvalidBlobSize { expected, actual } => {
                write!(
                    f,
                    "Invalid BLOB size: expected {} bytes, got {} bytes",
                    expected, actual
                )
            }
            Error::MismatchedDimensions { expected, actual } => {
                write!(
                    f,
                    "Mismatched dimensions: expected {} dimensions, got {} dimensions",
                    expected, actual
                )
            }
            Error::EmptyVector => write!(f, "Cannot compute distance with empty vector"),
            Error::InvalidEmbedding(msg) => write!(f, "Invalid embedding: {}", msg),
            Error::InvalidLimit(msg) => write!(f, "Invalid limit: {}", msg),
            Error::InvalidMetadata(msg) => write!(f, "Invalid metadata: {}", msg),
            Error::CollectionMismatch {
                collection,
                field,
                stored,
                requested,
            } => write!(
                f,
                "Collection '{}' was created with {} '{}', cannot open it with '{}'",
                collection, field, stored, requested
            ),
            Error::DuplicateId(id) => write!(f, "Fragment {} already exists", id),
        }
    }
}

impl std::error::Error for Error {}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// SQLite database backend.
pub struct Database {
    conn: Connection,
}

/// Initialize database schema.
///
/// `synchronous = FULL` makes every committed upsert durable before it returns.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = FULL;

        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            embedding_model TEXT NOT NULL,
            dimensions INTEGER NOT NULL,
            distance_metric TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fragments (
            collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
            id TEXT NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_fragments_created ON fragments(collection, created_at);
        "#,
    )?;
    Ok(())
}

fn encode_metadata(metadata: &Metadata) -> Result<String> {
    serde_json::to_string(metadata).map_err(|e| Error::InvalidMetadata(e.to_string()))
}

pub(crate) fn decode_metadata(json: &str) -> Result<Metadata> {
    serde_json::from_str(json).map_err(|e| Error::InvalidMetadata(e.to_string()))
}

/// Raw fragment row before metadata decoding.
type FragmentRow = (String, String, String, String, String);

fn fragment_from_row(
    (id, text, metadata, created_at, updated_at): FragmentRow,
) -> Result<Fragment> {
    Ok(Fragment {
        id,
        text,
        metadata: decode_metadata(&metadata)?,
        created_at,
        updated_at,
    })
}

impl Database {
    /// Open or create a SQLite database at the given path.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or schema initialization fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Close the connection, surfacing any error SQLite reports while doing so.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::from(e))
    }

    /// Look up a collection's parameters.
    pub fn collection(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT name, embedding_model, dimensions, distance_metric, created_at
                FROM collections
                WHERE name = ?1
                "#,
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((name, embedding_model, dimensions, metric, created_at)) => {
                let distance_metric = metric.parse::<DistanceMetric>().map_err(|_| {
                    Error::Sqlite(format!(
                        "Collection '{}' has unknown distance metric '{}'",
                        name, metric
                    ))
                })?;
                Ok(Some(CollectionInfo {
                    name,
                    embedding_model,
                    dimensions: dimensions as usize,
                    distance_metric,
                    created_at,
                }))
            }
        }
    }

    /// Create a collection, or verify an existing one matches the requested
    /// embedding parameters.
    ///
    /// # Errors
    ///
    /// Returns `Error::CollectionMismatch` if the collection exists with a
    /// different model, dimensionality or distance metric.
    pub fn ensure_collection(
        &self,
        name: &str,
        embedding_model: &str,
        dimensions: usize,
        distance_metric: DistanceMetric,
    ) -> Result<CollectionInfo> {
        if let Some(existing) = self.collection(name)? {
            let mismatch = |field: &'static str, stored: String, requested: String| {
                Error::CollectionMismatch {
                    collection: name.to_string(),
                    field,
                    stored,
                    requested,
                }
            };
            if existing.embedding_model != embedding_model {
                return Err(mismatch(
                    "embedding model",
                    existing.embedding_model,
                    embedding_model.to_string(),
                ));
            }
            if existing.dimensions != dimensions {
                return Err(mismatch(
                    "dimensions",
                    existing.dimensions.to_string(),
                    dimensions.to_string(),
                ));
            }
            if existing.distance_metric != distance_metric {
                return Err(mismatch(
                    "distance metric",
                    existing.distance_metric.to_string(),
                    distance_metric.to_string(),
                ));
            }
            return Ok(existing);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO collections (name, embedding_model, dimensions, distance_metric, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                name,
                embedding_model,
                dimensions as i64,
                distance_metric.as_str(),
                &now
            ],
        )?;

        Ok(CollectionInfo {
            name: name.to_string(),
            embedding_model: embedding_model.to_string(),
            dimensions,
            distance_metric,
            created_at: now,
        })
    }

    /// Insert or overwrite a fragment in one transaction.
    ///
    /// An overwrite replaces text, embedding and metadata and keeps `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateId` if the id exists and `policy` is `Reject`,
    /// `Error::MismatchedDimensions` if the embedding has the wrong length,
    /// or a database error if the write fails.
    #[allow(clippy::too_many_arguments)]
    pub fn upsert(
        &mut self,
        collection: &str,
        id: &str,
        text: &str,
        embedding: &[f32],
        dimensions: usize,
        metadata: &Metadata,
        policy: DuplicatePolicy,
    ) -> Result<UpsertOutcome> {
        let blob = vec_to_blob(embedding, dimensions)?;
        let metadata_json = encode_metadata(metadata)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM fragments WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let outcome = if exists {
            if policy == DuplicatePolicy::Reject {
                return Err(Error::DuplicateId(id.to_string()));
            }
            tx.execute(
                r#"
                UPDATE fragments
                SET text = ?1, embedding = ?2, metadata = ?3, updated_at = ?4
                WHERE collection = ?5 AND id = ?6
                "#,
                params![text, &blob, &metadata_json, &now, collection, id],
            )?;
            UpsertOutcome::Replaced
        } else {
            tx.execute(
                r#"
                INSERT INTO fragments (collection, id, text, embedding, metadata, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![collection, id, text, &blob, &metadata_json, &now, &now],
            )?;
            UpsertOutcome::Inserted
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Insert a fragment with explicit timestamps (for testing).
    #[cfg(test)]
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_with_time(
        &self,
        collection: &str,
        id: &str,
        text: &str,
        embedding: &[f32],
        dimensions: usize,
        metadata: &Metadata,
        created_at: &str,
    ) -> Result<()> {
        let blob = vec_to_blob(embedding, dimensions)?;
        let metadata_json = encode_metadata(metadata)?;

        self.conn.execute(
            r#"
            INSERT INTO fragments (collection, id, text, embedding, metadata, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![collection, id, text, &blob, &metadata_json, created_at],
        )?;

        Ok(())
    }

    /// Retrieve a single fragment by id.
    ///
    /// Returns None if the fragment does not exist.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Fragment>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, text, metadata, created_at, updated_at
                FROM fragments
                WHERE collection = ?1 AND id = ?2
                "#,
                params![collection, id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;

        row.map(fragment_from_row).transpose()
    }

    /// List fragments of a collection, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the limit is invalid or the query fails.
    pub fn list(&self, collection: &str, limit: usize) -> Result<Vec<Fragment>> {
        search::validate_limit(limit)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, text, metadata, created_at, updated_at
            FROM fragments
            WHERE collection = ?1
            ORDER BY created_at DESC, id ASC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![collection, limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?;

        let mut fragments = Vec::new();
        for row in rows {
            fragments.push(fragment_from_row(row?)?);
        }
        Ok(fragments)
    }

    /// Number of fragments in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM fragments WHERE collection = ?1",
            [collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete a fragment by id.
    ///
    /// Returns true if a fragment was deleted, false if it didn't exist.
    pub fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM fragments WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(rows > 0)
    }
}
