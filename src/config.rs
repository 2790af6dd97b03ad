//! Type-safe configuration loader using the `config` crate,
//! with manual environment-variable overrides for core settings.

use std::{env, path::PathBuf};

use config::{Config, ConfigError, File, Source};
use serde::Deserialize;

use crate::render::OutputFormat;

/// Base name of the optional settings file in the working directory
/// (`Inspector.toml`, `Inspector.json`, ...).
pub const CONFIG_BASENAME: &str = "Inspector";

pub const DEFAULT_DATABASE_PATH: &str = "data.db";

/// Lists every schema object, which works against any valid database.
pub const DEFAULT_QUERY: &str = "SELECT type, name, tbl_name FROM sqlite_master ORDER BY type, name";

/// Settings for one inspection run, loaded from defaults, then
/// `Inspector.toml`, then environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// The single read statement to run (no parameters)
    pub query: String,

    /// How the result set is printed
    #[serde(default)]
    pub format: OutputFormat,
}

impl Settings {
    /// Load settings from `Inspector.toml` (if present),
    /// then apply any overrides from these environment variables:
    ///
    /// - `INSPECTOR__DATABASE_PATH`
    /// - `INSPECTOR__QUERY`
    /// - `INSPECTOR__FORMAT`
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(File::with_name(CONFIG_BASENAME).required(false), |key| {
            env::var(key).ok()
        })
    }

    /// Build settings from an arbitrary file source and an override lookup.
    pub fn load<S, F>(source: S, lookup: F) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
        F: Fn(&str) -> Option<String>,
    {
        let cfg = Config::builder()
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("query", DEFAULT_QUERY)?
            .add_source(source)
            .build()?;

        let mut settings: Settings = cfg.try_deserialize()?;

        if let Some(val) = lookup("INSPECTOR__DATABASE_PATH") {
            settings.database_path = PathBuf::from(val);
        }
        if let Some(val) = lookup("INSPECTOR__QUERY") {
            settings.query = val;
        }
        if let Some(val) = lookup("INSPECTOR__FORMAT") {
            settings.format = val
                .parse()
                .map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::Message("query must not be empty".into()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Message("database_path must not be empty".into()));
        }
        Ok(())
    }
}
