//! Configuration loading and resolution
//!
//! Values are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the database file path
pub const DB_PATH_ENV: &str = "GENDERIFY_DB_PATH";

/// Environment variable carrying the catalog bearer token
pub const SPOTIFY_TOKEN_ENV: &str = "GENDERIFY_SPOTIFY_TOKEN";

const APP_DIR: &str = "genderify";
const DB_FILE_NAME: &str = "genderify.db";

/// Contents of `config.toml`
///
/// Every key is optional; a missing file is equivalent to an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// SQLite file holding resolved artists and offset checkpoints
    pub database_path: Option<PathBuf>,
    /// Catalog (Spotify) OAuth bearer token
    pub spotify_token: Option<String>,
    /// Artists fetched per catalog page
    pub batch_limit: Option<u32>,
    /// Minimum delay between page fetches, in milliseconds
    pub request_interval_ms: Option<u64>,
    /// User agent sent with page fetches
    pub user_agent: Option<String>,
}

/// Default location of the config file: `<config_dir>/genderify/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Load the TOML config
///
/// An explicitly given path must exist. The default path is optional and
/// silently yields an empty config when absent.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the database file path (CLI → ENV → TOML → OS default)
pub fn resolve_database_path(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.database_path {
        return path.clone();
    }

    default_database_path()
}

/// Resolve the catalog bearer token (CLI → ENV → TOML)
///
/// There is no compiled default: batch modes cannot run without one.
pub fn resolve_spotify_token(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_token = std::env::var(SPOTIFY_TOKEN_ENV).ok();

    let candidates = [
        ("command line", cli_arg.map(str::to_string)),
        ("environment", env_token),
        ("TOML", toml_config.spotify_token.clone()),
    ];

    let valid: Vec<(&str, String)> = candidates
        .into_iter()
        .filter_map(|(source, key)| key.filter(|k| is_valid_key(k)).map(|k| (source, k)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(s, _)| *s).collect();
        warn!(
            "Spotify token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match valid.into_iter().next() {
        Some((source, key)) => {
            info!("Spotify token loaded from {}", source);
            Ok(key)
        }
        None => Err(Error::Config(format!(
            "Spotify token not configured. Please configure using one of:\n\
             1. Command line: --spotify-token <token>\n\
             2. Environment: {}=<token>\n\
             3. TOML config: spotify_token = \"<token>\"",
            SPOTIFY_TOKEN_ENV
        ))),
    }
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// OS-dependent default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(".genderify.db"))
}
