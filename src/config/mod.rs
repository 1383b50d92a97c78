//! Configuration system for agent-kdb.

mod env_parser;
mod loader;
mod overrides;
mod paths;
mod validation;

#[cfg(test)]
mod tests_utils;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::embedding::{Embedder, HashingEmbedder, OnnxEmbedder};
use crate::errors::Error;
use crate::fragment::{DistanceMetric, DuplicatePolicy};
use crate::index::{DEFAULT_COLLECTION, IndexOptions};
use crate::session::{DEFAULT_SOURCE, DEFAULT_TURN_TOP_K, TurnOptions};

pub use loader::ConfigFile;

/// Default HuggingFace model for the ONNX embedder.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Which embedding function backs the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedderKind {
    /// Sentence-transformer model run through ONNX Runtime.
    #[default]
    Onnx,
    /// Local feature-hashing embedder; no model download.
    Hashing,
}

impl fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedderKind::Onnx => f.write_str("onnx"),
            EmbedderKind::Hashing => f.write_str("hashing"),
        }
    }
}

impl FromStr for EmbedderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(EmbedderKind::Onnx),
            "hashing" => Ok(EmbedderKind::Hashing),
            other => Err(Error::Config(format!(
                "Unknown embedder '{other}' (expected 'onnx' or 'hashing')"
            ))),
        }
    }
}

/// Configuration values with priority: defaults < config file < env vars.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the index database.
    pub store_path: PathBuf,

    /// Collection opened by default.
    pub collection: String,

    pub embedder: EmbedderKind,

    /// HuggingFace embedding model identifier (ONNX embedder only).
    pub embedding_model: String,

    /// Directory for caching ONNX models.
    pub model_cache: PathBuf,

    /// Fragments folded into each chat turn.
    pub top_k: usize,

    /// Source tag written with recorded exchanges.
    pub source: String,

    /// Metric for newly created collections.
    pub distance_metric: DistanceMetric,

    pub duplicate_policy: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        // Use home directory with sensible fallback for systems without HOME
        let home = dirs::home_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        let base_dir = home.join(".agent-kdb");

        Self {
            store_path: base_dir.join("store"),
            collection: DEFAULT_COLLECTION.to_string(),
            embedder: EmbedderKind::default(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            model_cache: base_dir.join("models"),
            top_k: DEFAULT_TURN_TOP_K,
            source: DEFAULT_SOURCE.to_string(),
            distance_metric: DistanceMetric::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration with defaults, file values, and environment overrides.
    pub fn load() -> Result<Self, Error> {
        Self::resolve(loader::load_from_file()?)
    }

    /// Layer an already-parsed config file and the environment over defaults.
    pub fn resolve(file: Option<ConfigFile>) -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(file) = file {
            config.merge_from_file(file)?;
        }

        overrides::apply_env_overrides(&mut config)?;

        config.validate()?;

        Ok(config)
    }

    /// Merge configuration from a file into this config.
    fn merge_from_file(&mut self, file: ConfigFile) -> Result<(), Error> {
        if let Some(mut store_path) = file.store_path {
            paths::expand_tilde(&mut store_path);
            self.store_path = store_path;
        }
        if let Some(collection) = file.collection {
            self.collection = collection;
        }
        if let Some(embedder) = file.embedder {
            self.embedder = embedder.parse()?;
        }
        if let Some(embedding_model) = file.embedding_model {
            self.embedding_model = embedding_model;
        }
        if let Some(mut model_cache) = file.model_cache {
            paths::expand_tilde(&mut model_cache);
            self.model_cache = model_cache;
        }
        if let Some(top_k) = file.top_k {
            self.top_k = top_k;
        }
        if let Some(source) = file.source {
            self.source = source;
        }
        if let Some(metric) = file.distance_metric {
            self.distance_metric = metric.parse()?;
        }
        if let Some(policy) = file.duplicate_policy {
            self.duplicate_policy = policy.parse()?;
        }
        Ok(())
    }

    /// Validate configuration values. [`load`](Self::load) already does
    /// this; call it again after changing fields by hand.
    pub fn validate(&self) -> Result<(), Error> {
        let validator = validation::ConfigValidator {
            store_path: &self.store_path,
            collection: &self.collection,
            embedding_model: &self.embedding_model,
            top_k: self.top_k,
        };

        validator.validate()
    }

    /// Ensure the store directory and model cache exist.
    pub fn ensure_directories(&self) -> Result<(), Error> {
        std::fs::create_dir_all(&self.store_path).map_err(|e| {
            Error::Config(format!(
                "Failed to create store directory {}: {e}",
                self.store_path.display()
            ))
        })?;

        if self.embedder == EmbedderKind::Onnx && !self.model_cache.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.model_cache).map_err(|e| {
                Error::Config(format!(
                    "Failed to create model cache directory {}: {e}",
                    self.model_cache.display()
                ))
            })?;
        }

        Ok(())
    }

    /// Index options derived from this configuration.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            collection: self.collection.clone(),
            distance_metric: self.distance_metric,
            duplicate_policy: self.duplicate_policy,
        }
    }

    pub fn turn_options(&self) -> TurnOptions {
        TurnOptions {
            top_k: self.top_k,
            source: self.source.clone(),
        }
    }

    /// Construct the configured embedder. The ONNX embedder may download
    /// its model on first use.
    pub fn build_embedder(&self) -> Result<Box<dyn Embedder>, Error> {
        match self.embedder {
            EmbedderKind::Onnx => Ok(Box::new(OnnxEmbedder::new(
                &self.embedding_model,
                &self.model_cache,
            )?)),
            EmbedderKind::Hashing => Ok(Box::new(HashingEmbedder::default())),
        }
    }
}
