//! Environment variable overrides for configuration.

use crate::errors::Error;

use super::Config;
use super::env_parser::{
    env_value, parse_env_enum, parse_env_path, parse_env_string, parse_env_usize,
};

pub const ENV_STORE_PATH: &str = "AGENT_KDB_STORE_PATH";
pub const ENV_COLLECTION: &str = "AGENT_KDB_COLLECTION";
pub const ENV_EMBEDDER: &str = "AGENT_KDB_EMBEDDER";
pub const ENV_EMBEDDING_MODEL: &str = "AGENT_KDB_EMBEDDING_MODEL";
pub const ENV_MODEL_CACHE: &str = "AGENT_KDB_MODEL_CACHE";
pub const ENV_TOP_K: &str = "AGENT_KDB_TOP_K";
pub const ENV_SOURCE: &str = "AGENT_KDB_SOURCE";
pub const ENV_DISTANCE_METRIC: &str = "AGENT_KDB_DISTANCE_METRIC";
pub const ENV_DUPLICATE_POLICY: &str = "AGENT_KDB_DUPLICATE_POLICY";

/// Every variable read by [`apply_env_overrides`].
#[cfg(test)]
pub const ALL_ENV_VARS: [&str; 9] = [
    ENV_STORE_PATH,
    ENV_COLLECTION,
    ENV_EMBEDDER,
    ENV_EMBEDDING_MODEL,
    ENV_MODEL_CACHE,
    ENV_TOP_K,
    ENV_SOURCE,
    ENV_DISTANCE_METRIC,
    ENV_DUPLICATE_POLICY,
];

/// Apply environment variable overrides to configuration.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), Error> {
    if let Some(val) = env_value(ENV_STORE_PATH) {
        config.store_path = parse_env_path(ENV_STORE_PATH, &val)?;
    }
    if let Some(val) = env_value(ENV_COLLECTION) {
        config.collection = parse_env_string(ENV_COLLECTION, &val)?;
    }
    if let Some(val) = env_value(ENV_EMBEDDER) {
        config.embedder = parse_env_enum(ENV_EMBEDDER, &val)?;
    }
    if let Some(val) = env_value(ENV_EMBEDDING_MODEL) {
        config.embedding_model = parse_env_string(ENV_EMBEDDING_MODEL, &val)?;
    }
    if let Some(val) = env_value(ENV_MODEL_CACHE) {
        config.model_cache = parse_env_path(ENV_MODEL_CACHE, &val)?;
    }
    if let Some(val) = env_value(ENV_TOP_K) {
        config.top_k = parse_env_usize(ENV_TOP_K, &val)?;
    }
    if let Some(val) = env_value(ENV_SOURCE) {
        config.source = parse_env_string(ENV_SOURCE, &val)?;
    }
    if let Some(val) = env_value(ENV_DISTANCE_METRIC) {
        config.distance_metric = parse_env_enum(ENV_DISTANCE_METRIC, &val)?;
    }
    if let Some(val) = env_value(ENV_DUPLICATE_POLICY) {
        config.duplicate_policy = parse_env_enum(ENV_DUPLICATE_POLICY, &val)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedderKind;
    use crate::config::tests_utils::{ENV_MUTEX, cleanup_env_vars, set_env};
    use crate::fragment::{DistanceMetric, DuplicatePolicy};
    use std::path::PathBuf;

    #[test]
    fn test_env_var_overrides_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env(ENV_STORE_PATH, "/custom/store");
        set_env(ENV_EMBEDDING_MODEL, "env/model");
        set_env(ENV_MODEL_CACHE, "/custom/cache");
        set_env(ENV_EMBEDDER, "hashing");
        set_env(ENV_TOP_K, "5");
        set_env(ENV_SOURCE, "nightly-import");
        set_env(ENV_DISTANCE_METRIC, "l2");
        set_env(ENV_DUPLICATE_POLICY, "reject");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.store_path, PathBuf::from("/custom/store"));
        assert_eq!(config.embedding_model, "env/model");
        assert_eq!(config.model_cache, PathBuf::from("/custom/cache"));
        assert_eq!(config.embedder, EmbedderKind::Hashing);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.source, "nightly-import");
        assert_eq!(config.distance_metric, DistanceMetric::L2);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);

        cleanup_env_vars();
    }

    #[test]
    fn test_unset_vars_leave_config_alone() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.collection, "knowledge");
        assert_eq!(config.top_k, 2);
    }

    #[test]
    fn test_invalid_top_k() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env(ENV_TOP_K, "many");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);

        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_empty_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env(ENV_STORE_PATH, "");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);

        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_whitespace_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env(ENV_EMBEDDING_MODEL, "   ");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);

        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_unknown_duplicate_policy() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env(ENV_DUPLICATE_POLICY, "merge");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);

        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }
}
