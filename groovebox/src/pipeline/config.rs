// Loaded on startup and saved on quit. Only the knobs are persisted; patterns
// live for the session.
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::shared::{DEFAULT_TEMPO, DEFAULT_VOLUME, Instrument};

const GROOVEBOX_DIR: &str = ".groovebox";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "groovebox.log";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrooveConfig {
    pub tempo: u32,
    pub volume: f32,
    pub instrument: Instrument,
    /// false runs the engine headless (no device is ever opened)
    pub audio: bool,
    /// preset name loaded at startup, if any
    pub preset: Option<String>,
}

impl Default for GrooveConfig {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            volume: DEFAULT_VOLUME,
            instrument: Instrument::Synth,
            audio: true,
            preset: None,
        }
    }
}

// <project_dir>/.groovebox/config.json
pub fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(GROOVEBOX_DIR).join(CONFIG_FILE)
}

// <project_dir>/.groovebox/groovebox.log
pub fn log_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(GROOVEBOX_DIR).join(LOG_FILE)
}

/// A missing file gives the defaults; a file that is there but unreadable is an error.
pub fn load_config(project_dir: &Path) -> anyhow::Result<GrooveConfig> {
    let path = config_file_path(project_dir);
    if !path.exists() {
        return Ok(GrooveConfig::default());
    }
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("malformed config {}", path.display()))
}

pub fn save_config(project_dir: &Path, config: &GrooveConfig) -> anyhow::Result<()> {
    let path = config_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .groovebox/ if needed
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
