use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs::config_dir;

const CURRENT_CONFIG_VERSION: u16 = 1;
const FILE_NAME: &str = "core.toml";

/// Handle to the core configuration
pub type Cfg = Arc<RwLock<CoreConfig>>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to access the configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse the configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize the configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The core configuration, serialized to TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    version: u16,
    /// Identity used when none is given on the command line
    default_identity: Option<String>,
    /// Database file name, relative to the state directory
    database_file: PathBuf,
    /// Where this configuration was loaded from
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            default_identity: None,
            database_file: PathBuf::from("data.db"),
            path: None,
        }
    }
}

impl CoreConfig {
    /// Load the configuration from the config directory, writing the defaults out if the file
    /// doesn't exist yet.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(&config_dir()?.join(FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };

        cfg.path = Some(path.to_path_buf());

        if !path.exists() {
            cfg.save()?;
        }

        Ok(cfg)
    }

    /// Write the configuration back to the file it was loaded from. Does nothing for a
    /// configuration that wasn't loaded from a file.
    pub fn save(&self) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml::to_string_pretty(self)?)?;

        Ok(())
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn default_identity(&self) -> Option<&str> {
        self.default_identity.as_deref()
    }

    pub fn set_default_identity(&mut self, identity: Option<String>) {
        self.default_identity = identity;
    }

    pub fn database_file(&self) -> &Path {
        &self.database_file
    }

    #[cfg(test)]
    pub(crate) fn mock() -> Self {
        Self::default()
    }
}
