//! nonoto core - toolkit-independent logic for the score/spectrogram editor
//!
//! Everything here can be exercised without a window:
//!
//! - **Controls**: cycle-select, number and BPM controls, pitch/octave pickers
//! - **Locators**: timestamp-box geometry over a rendered score, toggle grid
//!   over a spectrogram
//! - **Transport**: the shared tempo/position authority
//! - **Playback**: A/B double-buffered event sets and crossfaded audio players
//! - **Generation**: HTTP client for the external inference server
//! - **Shell**: storage paths and file writing for generated content

pub mod config;
pub mod controls;
pub mod generation;
pub mod locator;
pub mod playback;
pub mod resources;
pub mod shell;
pub mod transport;
pub mod types;

pub use types::*;
