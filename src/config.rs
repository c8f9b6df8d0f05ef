//! Runtime configuration.
//!
//! Values come from an optional `KEY = value` file and from environment
//! variables of the same names, with the environment taking precedence. The
//! resulting [`Config`] is passed explicitly to the client and pipeline.

use crate::error::{Result, SnapArtError};
use crate::generation::{API_KEY_ENV, DEFAULT_CONTROL_STRENGTH, DEFAULT_ENDPOINT};
use crate::image::ConstraintProfile;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Endpoint override.
pub const ENDPOINT_KEY: &str = "SNAPART_ENDPOINT";
/// Pixel budget override.
pub const MAX_PIXELS_KEY: &str = "SNAPART_MAX_PIXELS";
/// Byte budget override.
pub const MAX_BYTES_KEY: &str = "SNAPART_MAX_BYTES";
/// Quality step override.
pub const QUALITY_STEP_KEY: &str = "SNAPART_QUALITY_STEP";
/// Default control strength override.
pub const CONTROL_STRENGTH_KEY: &str = "SNAPART_CONTROL_STRENGTH";
/// Request timeout in seconds.
pub const TIMEOUT_KEY: &str = "SNAPART_TIMEOUT_SECS";

const KNOWN_KEYS: [&str; 7] = [
    API_KEY_ENV,
    ENDPOINT_KEY,
    MAX_PIXELS_KEY,
    MAX_BYTES_KEY,
    QUALITY_STEP_KEY,
    CONTROL_STRENGTH_KEY,
    TIMEOUT_KEY,
];

/// Resolved configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stability API key. `None` defers to the client builder's env lookup.
    pub api_key: Option<String>,
    /// Structure-control endpoint.
    pub endpoint: String,
    /// Size budget for uploads.
    pub profile: ConstraintProfile,
    /// Control strength used when the caller gives none.
    pub control_strength: f32,
    /// Whole-request timeout.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            profile: ConstraintProfile::default(),
            control_strength: DEFAULT_CONTROL_STRENGTH,
            timeout: None,
        }
    }
}

impl Config {
    /// Loads configuration from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    SnapArtError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                tracing::debug!(path = %path.display(), "read config file");
                parse_entries(&contents)
            }
            None => HashMap::new(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Loads configuration from the environment only.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    fn resolve(
        mut entries: HashMap<String, String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        for key in KNOWN_KEYS {
            if let Some(value) = env(key) {
                entries.insert(key.to_string(), value);
            }
        }

        let mut config = Self::default();
        if let Some(key) = entries.remove(API_KEY_ENV).filter(|k| !k.is_empty()) {
            tracing::debug!(key_len = key.len(), "resolved API key");
            config.api_key = Some(key);
        }
        if let Some(endpoint) = entries.remove(ENDPOINT_KEY) {
            config.endpoint = endpoint;
        }
        if let Some(max) = parse_value(&entries, MAX_PIXELS_KEY)? {
            config.profile.max_pixel_count = max;
        }
        if let Some(max) = parse_value(&entries, MAX_BYTES_KEY)? {
            config.profile.max_byte_size = max;
        }
        if let Some(step) = parse_value(&entries, QUALITY_STEP_KEY)? {
            config.profile.quality_step = step;
        }
        if let Some(strength) = parse_value(&entries, CONTROL_STRENGTH_KEY)? {
            config.control_strength = strength;
        }
        if let Some(secs) = parse_value::<u64>(&entries, TIMEOUT_KEY)? {
            config.timeout = Some(Duration::from_secs(secs));
        }

        config
            .profile
            .validate()
            .map_err(|e| SnapArtError::Config(e.to_string()))?;
        Ok(config)
    }
}

/// Parses `KEY = value` lines. Blank lines and `#` or `//` comments are skipped.
fn parse_entries(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn parse_value<T: FromStr>(entries: &HashMap<String, String>, key: &str) -> Result<Option<T>> {
    entries
        .get(key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| SnapArtError::Config(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}
