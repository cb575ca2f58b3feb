// Configuration loading and parsing (draft.toml, app.toml).

use gridiron_core::{SlotName, DEFAULT_ROUNDS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
    /// Default tracing filter. `RUST_LOG` overrides it.
    pub log_filter: String,
}

// ---------------------------------------------------------------------------
// draft.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[draft]` table in draft.toml.
#[derive(Debug, Clone, Deserialize)]
struct DraftFile {
    draft: DraftConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DraftConfig {
    /// Rounds per draft. One per roster slot unless a league plays short.
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Fixed seed for draft-order shuffles. Omit for a fresh random order
    /// every draft.
    #[serde(default)]
    pub order_seed: Option<u64>,
}

impl Default for DraftConfig {
    fn default() -> Self {
        DraftConfig {
            rounds: DEFAULT_ROUNDS,
            order_seed: None,
        }
    }
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

// ---------------------------------------------------------------------------
// app.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire app.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    database: DatabaseSection,
    data_paths: DataPaths,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingSection {
    #[serde(default = "default_log_filter")]
    filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "gridiron_app=info,gridiron_core=info,warn".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// Player catalog CSV, imported when the database has no players.
    pub players: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/draft.toml` and
/// `config/app.toml`, both relative to the given `base_dir`.
///
/// This does not copy defaults; `load_config()` does.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- draft.toml (required) ---
    let draft_path = config_dir.join("draft.toml");
    let draft_text = read_file(&draft_path)?;
    let draft_file: DraftFile =
        toml::from_str(&draft_text).map_err(|e| ConfigError::ParseError {
            path: draft_path.clone(),
            source: e,
        })?;

    // --- app.toml (required) ---
    let app_path = config_dir.join("app.toml");
    let app_text = read_file(&app_path)?;
    let app_file: AppFile = toml::from_str(&app_text).map_err(|e| ConfigError::ParseError {
        path: app_path.clone(),
        source: e,
    })?;

    let config = Config {
        draft: draft_file.draft,
        db_path: app_file.database.path,
        data_paths: app_file.data_paths,
        log_filter: app_file.logging.filter,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the crate root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        // create_new so a user's edited file is never overwritten.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let max_rounds = SlotName::ALL.len() as u32;
    let rounds = config.draft.rounds;
    if rounds == 0 || rounds > max_rounds {
        return Err(ConfigError::ValidationError {
            field: "draft.rounds".into(),
            message: format!("must be between 1 and {max_rounds}, got {rounds}"),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.data_paths.players.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.players".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
