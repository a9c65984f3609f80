use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::{DEFAULT_COLOR, DEFAULT_LANGUAGE};
use crate::error::Result;
use crate::runtime::DOUBLE_CLICK_WINDOW_MS;

pub const CONFIG_FILE: &str = "config.yaml";

/// Board settings, read from `.permanote/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Slot holding the serialized note collection
    pub storage_key: String,
    /// Maximum gap between the two clicks of a double-click
    pub double_click_window_ms: u64,
    /// Delay between entering edit mode and focusing the editor
    pub focus_delay_ms: u64,
    /// Color given to new notes
    pub default_color: String,
    /// Language hint assigned when a note switches to code
    pub default_language: String,
    /// `tracing_subscriber::EnvFilter` directive, overridden by `PERMANOTE_LOG`
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: "permanote-notes".to_string(),
            double_click_window_ms: DOUBLE_CLICK_WINDOW_MS,
            focus_delay_ms: 50,
            default_color: DEFAULT_COLOR.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load the config from a `.permanote/` directory. A missing file yields
    /// the defaults; a malformed one is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }
}
