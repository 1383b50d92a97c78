//! agent-kdb - a retrieval-augmented knowledge store for tool-using LLM agents.
//!
//! Past answers are embedded and kept in a local SQLite-backed index. Before
//! each new question, the nearest past answers are retrieved and folded into
//! the prompt; after the agent replies, the exchange is recorded so the next
//! session can reuse it. All operations are synchronous (no async/await
//! required).
//!
//! # Example
//!
//! ```no_run
//! use agent_kdb::{Config, RetrievalMemory, augment_prompt};
//!
//! let config = Config::load().expect("Failed to load config");
//! let embedder = config.build_embedder().expect("Failed to load embedder");
//! let mut memory = RetrievalMemory::open(&config.store_path, embedder, config.index_options())
//!     .expect("Failed to open store");
//!
//! // Remember an exchange
//! let id = memory
//!     .record("what is S3?", "S3 is object storage", "docs")
//!     .expect("Failed to record");
//! println!("Recorded {id}");
//!
//! // Reuse it for a related question
//! let context = memory.retrieve("cheap object storage?", 2).unwrap();
//! println!("{}", augment_prompt("cheap object storage?", &context));
//! ```
//!
//! # Mutability Requirements
//!
//! Methods that generate embeddings (`upsert`, `query`, `record`, `retrieve`)
//! require `&mut self` because the embedding engine internally mutates state
//! for ONNX tensor allocations.

pub mod config;
pub mod embedding;
pub mod errors;
pub mod fragment;
pub mod index;
pub mod memory;
pub mod session;
mod sqlite;

// Re-export public API
pub use config::{Config, EmbedderKind};
pub use embedding::{EMBEDDING_DIMS, Embedder, HashingEmbedder, OnnxEmbedder};
pub use errors::{Error, ErrorKind};
pub use fragment::{
    DistanceMetric, DuplicatePolicy, Fragment, Metadata, QUERY_KEY, RetrievalResult, SOURCE_KEY,
    UpsertOutcome,
};
pub use index::{EmbeddingIndex, IndexOptions, MAX_SEARCH_LIMIT};
pub use memory::{DEFAULT_TOP_K, RetrievalMemory, augment_prompt, fragment_id};
pub use session::{
    Agent, AgentReply, ProcessAgent, TurnOptions, TurnOutcome, is_exit_command, run_turn,
};
pub use sqlite::{CollectionInfo, Error as StorageError};
