//! Shared test utilities for config module tests.

use std::sync::Mutex;

use super::overrides::ALL_ENV_VARS;

/// Mutex to serialize environment variable tests and prevent race conditions.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Set a variable. Callers must hold [`ENV_MUTEX`].
pub fn set_env(name: &str, value: &str) {
    // SAFETY: config tests that touch the environment serialize on ENV_MUTEX
    unsafe { std::env::set_var(name, value) };
}

/// Clear every variable the config layer reads. Callers must hold [`ENV_MUTEX`].
pub fn cleanup_env_vars() {
    for var in ALL_ENV_VARS {
        // SAFETY: see set_env
        unsafe { std::env::remove_var(var) };
    }
}
