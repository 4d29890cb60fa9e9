//! Configuration for nonoto
//!
//! - Application settings ([`AppConfig`]) with YAML load/save
//! - Standard config and storage locations
//!
//! # Usage
//!
//! ```ignore
//! use nonoto_core::config::AppConfig;
//!
//! let config = AppConfig::load_default();
//! ```

mod app;
mod paths;

pub use app::{
    AnnotationType, AppConfig, BpmSettings, EditorMode, SpectrogramSettings, CONFIG_FILE,
    NO_MIDI_OUTPUT,
};
pub use paths::{default_config_dir, default_config_path};
