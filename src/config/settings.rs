//! TOML-based configuration for lookgen.
//!
//! Example configuration:
//! ```toml
//! [generation]
//! mode = "lenient"        # or "strict"
//! max_join_hops = 3
//! view_prefix = ""
//! explore_prefix = ""
//! schema = "${DBT_SCHEMA}"
//! explores = ["searches", "rentals"]
//!
//! [output]
//! directory = "lookml"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::generate::GenerationMode;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub generation: GenerationSettings,
    pub output: OutputSettings,
}

/// How models and metrics are turned into LookML.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub mode: GenerationMode,

    /// Upper bound on join depth. Unbounded when unset.
    pub max_join_hops: Option<usize>,

    pub view_prefix: String,

    pub explore_prefix: String,

    /// Schema prepended to every `sql_table_name` (supports `${ENV_VAR}`).
    pub schema: Option<String>,

    /// Restrict explores to these base models. All models with a primary
    /// entity get an explore when unset.
    pub explores: Option<Vec<String>>,
}

/// Where generated files go.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output directory (supports `${ENV_VAR}`).
    pub directory: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: "lookml".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the first config found:
    /// `$LOOKGEN_CONFIG`, `./lookgen.toml`, `<config_dir>/lookgen/config.toml`.
    /// Falls back to defaults when none exists.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("LOOKGEN_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("lookgen.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lookgen").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Schema with environment variables expanded.
    pub fn resolved_schema(&self) -> Result<Option<String>, SettingsError> {
        self.generation
            .schema
            .as_deref()
            .map(expand_env_vars)
            .transpose()
    }

    /// Output directory with environment variables expanded.
    pub fn resolved_output_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.output.directory).map(PathBuf::from)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.generation.max_join_hops == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "generation.max_join_hops must be at least 1".to_string(),
            ));
        }
        if self.output.directory.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "output.directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand `${VAR}` references from the environment.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut missing = None;
    let expanded = ENV_VAR.replace_all(s, |caps: &Captures| match env::var(&caps[1]) {
        Ok(value) => value,
        Err(_) => {
            missing.get_or_insert_with(|| caps[1].to_string());
            String::new()
        }
    });

    match missing {
        Some(var) => Err(SettingsError::MissingEnvVar(var)),
        None => Ok(expanded.into_owned()),
    }
}
