pub mod model;
pub mod resolve;

use std::path::Path;

use thiserror::Error;

pub use model::ZenoConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("no zeno.yml or .zeno.yml found in the current directory -- run `zeno init` to create one")]
    Missing,

    #[error("failed to read config file {path}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Invalid {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid exclude_regex pattern `{pattern}`")]
    BadRegex {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Load and parse a zeno config file.
pub fn load_config(path: &Path) -> Result<ZenoConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid {
        path: path.display().to_string(),
        source: e,
    })
}
