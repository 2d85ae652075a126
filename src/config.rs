//! Detector configuration and its on-disk layering.
//!
//! Values are resolved from, in increasing priority: built-in defaults, the user file at
//! `~/.config/freeform-gesture/detector.toml`, an explicitly supplied file, and finally
//! whatever a caller overlays on top (the replay script's `[detector]` table).

use crate::detector::error::GestureError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Default movement allowance in pixels before a gesture is recognized
pub const DEFAULT_TOUCH_SLOP: f64 = 8.0;
/// Upper bound for `max_pointers`; the fitter has no solver beyond four correspondences
pub const MAX_SUPPORTED_POINTERS: usize = 4;

const CONFIG_DIR: &str = ".config/freeform-gesture";
const DETECTOR_CONFIG_FILE: &str = "detector.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] GestureError),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Distance a contact must travel from its start before transforms are emitted
    pub touch_slop: f64,
    /// Caps the correspondences used per fit, and with it the degrees of freedom (0 to 4)
    pub max_pointers: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            touch_slop: DEFAULT_TOUCH_SLOP,
            max_pointers: MAX_SUPPORTED_POINTERS,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        validate_max_pointers(self.max_pointers)?;
        validate_touch_slop(self.touch_slop)
    }

    /// Resolves the layered configuration. A missing user file is skipped; a missing
    /// explicit file is an error.
    pub fn load_layered(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let user = default_config_path().filter(|p| p.exists());
        if user.is_none() {
            debug!("No user detector config found, using defaults");
        }
        Self::load_from(user.as_deref(), explicit)
    }

    /// Defaults, then the `user` file, then the `explicit` file. Both layers must exist when
    /// given.
    pub fn load_from(user: Option<&Path>, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in user.into_iter().chain(explicit) {
            info!("Loading detector config from {}", path.display());
            config = ConfigOverrides::read(path)?.apply(config);
        }

        config.validate()?;
        debug!("Resolved detector config: {:?}", config);
        Ok(config)
    }
}

/// Partial configuration; unset fields keep the value of the layer below.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ConfigOverrides {
    pub touch_slop: Option<f64>,
    pub max_pointers: Option<usize>,
}

impl ConfigOverrides {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn apply(&self, base: DetectorConfig) -> DetectorConfig {
        DetectorConfig {
            touch_slop: self.touch_slop.unwrap_or(base.touch_slop),
            max_pointers: self.max_pointers.unwrap_or(base.max_pointers),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(DETECTOR_CONFIG_FILE))
}

pub(crate) fn validate_max_pointers(max_pointers: usize) -> Result<(), GestureError> {
    if max_pointers > MAX_SUPPORTED_POINTERS {
        return Err(GestureError::InvalidConfiguration(format!(
            "max_pointers must be in the range 0 to {}, got {}",
            MAX_SUPPORTED_POINTERS, max_pointers
        )));
    }
    Ok(())
}

pub(crate) fn validate_touch_slop(touch_slop: f64) -> Result<(), GestureError> {
    if !touch_slop.is_finite() || touch_slop < 0.0 {
        return Err(GestureError::InvalidConfiguration(format!(
            "touch_slop must be a non-negative distance, got {}",
            touch_slop
        )));
    }
    Ok(())
}
