//! Error definitions for the replay harness

use crate::config::ConfigError;
use crate::detector::GestureError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read replay script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse replay script: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize replay report: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gesture error in frame {frame}: {source}")]
    Gesture {
        frame: usize,
        #[source]
        source: GestureError,
    },

    #[error("Replay script contains no events")]
    EmptyScript,
}
