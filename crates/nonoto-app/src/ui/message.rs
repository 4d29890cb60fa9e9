//! Application messages for nonoto

use std::path::PathBuf;

use iced::window;
use nonoto_core::generation::InpaintResult;
use nonoto_widgets::{GridPointer, SheetEvent};

/// Messages that can be sent to the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Periodic tick driving transport, scheduling and timers
    Tick,
    Transport(TransportMessage),
    Controls(ControlMessage),
    /// Pointer activity on the score overlay
    Sheet(SheetEvent),
    /// Pointer activity on the spectrogram grid
    Grid(GridPointer),
    Generation(GenerationMessage),
    Shell(ShellMessage),
    WindowResized(iced::Size),
    CloseRequested(window::Id),
}

#[derive(Debug, Clone)]
pub enum TransportMessage {
    Play,
    Stop,
    /// Enable or disable the tempo-sync session
    ToggleLink(bool),
}

#[derive(Debug, Clone)]
pub enum ControlMessage {
    NextGranularity,
    NextInstrument,
    NextPitch,
    /// Vertical drag on the BPM readout, in pixels
    BpmDrag(f64),
    SetOctave(f64),
    SelectMidiOutput(String),
    RefreshMidiOutputs,
    ZoomIn,
    ZoomOut,
    SetGain(f64),
    ToggleFadeIn(bool),
    /// Highlight random cells to invite interaction
    CallToAction,
}

#[derive(Debug, Clone)]
pub enum GenerationMessage {
    /// Score file read from disk
    ScoreLoaded(Result<String, String>),
    /// MusicXML returned by a time-range regeneration
    Regenerated(Option<String>),
    /// MIDI rendering of the current score
    MidiReady(Option<Vec<u8>>),
    Inpainted(Option<InpaintResult>),
}

#[derive(Debug, Clone)]
pub enum ShellMessage {
    /// Write the latest generation to the documents directory
    SaveGeneration,
    Saved(Result<PathBuf, String>),
    /// Drag the latest generation out of the window
    DragOut,
    /// Temporary file for a drag written
    DragReady(Result<PathBuf, String>),
}
