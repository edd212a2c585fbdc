//! Application-wide configuration settings.
//!
//! Settings come from the environment; command-line flags override them in
//! `main`. Missing values fall back to defaults (logged at `info`), unusable
//! ones are logged at `warn` and replaced by the default.

use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

pub const API_URL_VAR: &str = "BALLOTBOX_API_URL";
pub const DATA_DIR_VAR: &str = "BALLOTBOX_DATA_DIR";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1/";

const APP_NAME: &str = "ballotbox";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_url: load_api_url(lookup(API_URL_VAR)),
            data_dir: load_data_dir(lookup(DATA_DIR_VAR)),
        }
    }
}

fn load_api_url(raw: Option<String>) -> String {
    let Some(raw) = raw.map(|raw| raw.trim().to_string()) else {
        info!("{API_URL_VAR} not set, using default: {DEFAULT_API_URL}");
        return DEFAULT_API_URL.to_string();
    };
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw
    } else {
        warn!("Invalid {API_URL_VAR} value: {raw:?}, using default: {DEFAULT_API_URL}");
        DEFAULT_API_URL.to_string()
    }
}

fn load_data_dir(raw: Option<String>) -> PathBuf {
    match raw.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => PathBuf::from(raw),
        None => {
            let dir = default_data_dir();
            info!("{DATA_DIR_VAR} not set, using default: {}", dir.display());
            dir
        }
    }
}

/// `<platform data dir>/ballotbox`, or `./data` where the platform has none.
///
/// - Linux: `~/.local/share/ballotbox/`
/// - macOS: `~/Library/Application Support/ballotbox/`
/// - Windows: `C:\Users\<user>\AppData\Roaming\ballotbox\`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .unwrap_or_else(|| {
            warn!("No platform data directory, using ./data");
            PathBuf::from("data")
        })
}
