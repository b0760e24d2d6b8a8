//! Configuration schema (schemafold.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Migration folding behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Apply each migration all-or-nothing instead of stopping part-way
    #[serde(default)]
    pub atomic: bool,
}

/// DDL rendering options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// First header line of the generated file, rendered as `-- <title>`
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "SQLite Schema".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

/// Input and output locations, relative to the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding migration JSON files
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// Generated DDL file
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_output() -> PathBuf {
    PathBuf::from("schema.sql")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            output: default_output(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Pluralize physical table names (`user` -> `users`)
    #[serde(default)]
    pub use_plural: bool,

    #[serde(default)]
    pub processor: ProcessorConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_plural: false,
            processor: ProcessorConfig::default(),
            generator: GeneratorConfig::default(),
            paths: PathsConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a possibly relative path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.resolve(&self.paths.migrations_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.paths.output)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
