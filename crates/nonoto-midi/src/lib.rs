//! MIDI and tempo-sync bridges for nonoto
//!
//! This crate provides:
//! - Output device selection and clock-aligned note scheduling via midir
//! - MIDI keyboard input for the spectrogram samplers
//! - A tempo-sync (Link-style) session bridge with downbeat reporting
//!
//! # Architecture
//!
//! ```text
//! playback scheduler → NoteSink → MidiOutputSelector queue → flush on tick → device
//! MIDI keyboard → midir callback → flume channel → app tick → samplers
//! ```

mod connection;
mod input;
mod link;
mod output;

pub use connection::{MidiConnectionError, MidiPorts};
pub use input::{KeyEvent, MidiKeyboardInput};
pub use link::{DownbeatFlash, LinkClient, LinkEvent, LinkSession, LocalSession, DOWNBEAT_FLASH, LINK_QUANTUM};
pub use output::{MidiOutputSelector, MidiSender, ScheduledMessage, NO_OUTPUT};

/// Error type for MIDI operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI connection error: {0}")]
    ConnectionError(#[from] MidiConnectionError),

    #[error("MIDI output error: {0}")]
    OutputError(String),
}
