//! Environment variable parsing utilities for configuration.

use crate::errors::Error;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;

/// Read an environment variable. Unset and non-Unicode both count as absent.
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parse environment variable value or return error if empty/whitespace.
pub fn parse_env_string(name: &str, value: &str) -> Result<String, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(value.to_string())
}

/// Parse environment variable as a path, expanding tilde.
pub fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    let value = parse_env_string(name, value)?;
    Ok(paths::expand_tilde_path(&PathBuf::from(value)))
}

/// Parse environment variable as an unsigned integer. Range checks happen
/// in validation.
pub fn parse_env_usize(name: &str, value: &str) -> Result<usize, Error> {
    let value = parse_env_string(name, value)?;
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {name} value: {e}")))
}

/// Parse environment variable into one of the config enums. The enum's own
/// `Config` message is kept, prefixed with the variable name.
pub fn parse_env_enum<T>(name: &str, value: &str) -> Result<T, Error>
where
    T: FromStr<Err = Error>,
{
    let value = parse_env_string(name, value)?;
    value.parse().map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{name}: {msg}")),
        other => other,
    })
}
