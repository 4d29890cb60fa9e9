//! Application settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::paths::default_config_path;

/// Settings file name inside the nonoto config directory
pub const CONFIG_FILE: &str = "config.yaml";

/// MIDI output name that disables MIDI
pub const NO_MIDI_OUTPUT: &str = "No Output";

/// Which editor the window hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Sheet,
    Spectrogram,
}

/// Extra overlays attached to timestamp boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Fermata,
    ChordSelector,
}

/// Tempo control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BpmSettings {
    pub range: (f64, f64),
    pub initial: f64,
}

impl Default for BpmSettings {
    fn default() -> Self {
        Self {
            range: (30.0, 300.0),
            initial: 100.0,
        }
    }
}

/// Spectrogram grid dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramSettings {
    pub rows: usize,
    pub columns: usize,
    /// Number of top-level columns visible at once
    pub columns_top: usize,
    /// Number of top-level timesteps in the full spectrogram
    pub timesteps_top: usize,
}

impl Default for SpectrogramSettings {
    fn default() -> Self {
        Self {
            rows: 8,
            columns: 16,
            columns_top: 4,
            timesteps_top: 4,
        }
    }
}

/// Top-level settings, stored as `config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the generation server
    pub server_url: String,
    pub mode: EditorMode,
    /// Timestamp-box granularities offered to the user, in quarter notes
    pub granularities_quarters: Vec<u32>,
    pub bpm: BpmSettings,
    pub annotation_types: Vec<AnnotationType>,
    pub allow_only_one_fermata: bool,
    /// Preferred MIDI output device name ("No Output" disables MIDI)
    pub midi_output: String,
    /// Substring of the MIDI keyboard port feeding the samplers
    pub midi_input: Option<String>,
    /// Shorter scheduling lookahead, at the cost of scheduling jitter
    pub low_latency: bool,
    pub spectrogram: SpectrogramSettings,
    /// Override for the static resources directory
    pub static_dir: Option<PathBuf>,
    pub resize_debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            mode: EditorMode::Sheet,
            granularities_quarters: vec![1, 2, 4],
            bpm: BpmSettings::default(),
            annotation_types: Vec::new(),
            allow_only_one_fermata: false,
            midi_output: NO_MIDI_OUTPUT.to_string(),
            midi_input: None,
            low_latency: false,
            spectrogram: SpectrogramSettings::default(),
            static_dir: None,
            resize_debounce_ms: 50,
        }
    }
}

impl AppConfig {
    /// Load settings from the standard location
    pub fn load_default() -> Self {
        Self::load(&default_config_path(CONFIG_FILE))
    }

    /// Load settings from `path`
    ///
    /// A missing file yields the defaults. An unreadable or malformed file is
    /// logged and also yields the defaults, so a broken settings file never
    /// keeps the editor from starting.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Settings: {:?} not found, using defaults", path);
                return Self::default();
            }
            Err(e) => {
                log::warn!("Settings: failed to read {:?}: {}, using defaults", path, e);
                return Self::default();
            }
        };

        match serde_yaml::from_str::<Self>(&contents) {
            Ok(config) => {
                log::info!("Settings: loaded from {:?}", path);
                config.normalized()
            }
            Err(e) => {
                log::warn!("Settings: failed to parse {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Write settings to `path`, creating the config directory if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create nonoto config directory {:?}", parent))?;
        }
        let yaml = serde_yaml::to_string(self).context("Failed to serialize nonoto settings")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write nonoto settings to {:?}", path))?;
        log::info!("Settings: saved to {:?}", path);
        Ok(())
    }

    /// Repair values a hand-edited file may get wrong
    ///
    /// Granularities are sorted, deduplicated and stripped of zeros. The
    /// server URL loses its trailing slash so endpoint paths join cleanly.
    /// Empty strings fall back to their defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();

        self.granularities_quarters.retain(|&g| g > 0);
        self.granularities_quarters.sort_unstable();
        self.granularities_quarters.dedup();
        if self.granularities_quarters.is_empty() {
            self.granularities_quarters = defaults.granularities_quarters;
        }

        let trimmed = self.server_url.trim().trim_end_matches('/');
        self.server_url = if trimmed.is_empty() {
            defaults.server_url
        } else {
            trimmed.to_string()
        };

        if self.midi_output.trim().is_empty() {
            self.midi_output = defaults.midi_output;
        }
        if self.midi_input.as_deref().is_some_and(|name| name.trim().is_empty()) {
            self.midi_input = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "server_url: http://gpu-box:8080\nmode: spectrogram\nannotation_types: [chord_selector]\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server_url, "http://gpu-box:8080");
        assert_eq!(config.mode, EditorMode::Spectrogram);
        assert_eq!(config.annotation_types, vec![AnnotationType::ChordSelector]);
        assert_eq!(config.bpm, BpmSettings::default());
        assert_eq!(config.granularities_quarters, vec![1, 2, 4]);
    }

    #[test]
    fn test_normalized_repairs_hand_edits() {
        let yaml = "server_url: 'http://gpu-box:8080/'\ngranularities_quarters: [4, 0, 1, 4]\nmidi_output: ''\nmidi_input: ' '\n";
        let config = serde_yaml::from_str::<AppConfig>(yaml).unwrap().normalized();

        assert_eq!(config.server_url, "http://gpu-box:8080");
        assert_eq!(config.granularities_quarters, vec![1, 4]);
        assert_eq!(config.midi_output, NO_MIDI_OUTPUT);
        assert_eq!(config.midi_input, None);
    }

    #[test]
    fn test_normalized_restores_empty_granularities() {
        let config = AppConfig {
            granularities_quarters: vec![0],
            server_url: "  ".to_string(),
            ..AppConfig::default()
        }
        .normalized();

        assert_eq!(config.granularities_quarters, vec![1, 2, 4]);
        assert_eq!(config.server_url, "http://localhost:5000");
    }

    #[test]
    fn test_load_normalizes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "granularities_quarters: [2, 1, 2]\n").unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.granularities_quarters, vec![1, 2]);
    }

    #[test]
    fn test_save_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = AppConfig::default()
            .save(&blocker.join(CONFIG_FILE))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("nonoto config directory"));
    }
}
