//! # Configuration
//!
//! Layered settings, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `openbook.toml` in the working directory (optional)
//! 3. a `.env` file, loaded into the process environment
//! 4. `OPENBOOK__SECTION__KEY` environment variables
//!
//! e.g. `OPENBOOK__LIMITS__COMMENT_MAX_LENGTH=800`.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;
use services::PostLimits;
use tracing::debug;

const ENV_PREFIX: &str = "OPENBOOK";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_FILE: &str = "openbook";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub limits: PostLimits,
    pub media: MediaConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory uploads are written to.
    pub root_path: PathBuf,
    pub url_prefix: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self { root_path: PathBuf::from("./data/media"), url_prefix: "/media".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".into(), json: false }
    }
}

impl AppConfig {
    /// Loads `.env`, then `openbook.toml`, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(ConfigError::Invalid(format!(".env: {err}"))),
        }
        Self::from_sources(Some(DEFAULT_FILE), None)
    }

    /// `file` is a path without extension; `env` replaces the process
    /// environment when given.
    pub fn from_sources(file: Option<&str>, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env);

        let config: AppConfig = builder.add_source(environment).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.post_max_length == 0 || limits.comment_max_length == 0 {
            return Err(ConfigError::Invalid("text limits must be positive".into()));
        }
        if limits.comments_max_count == 0 {
            return Err(ConfigError::Invalid("comments_max_count must be positive".into()));
        }
        if limits.comments_default_count > limits.comments_max_count {
            return Err(ConfigError::Invalid(format!(
                "comments_default_count ({}) exceeds comments_max_count ({})",
                limits.comments_default_count, limits.comments_max_count
            )));
        }
        Ok(())
    }
}
