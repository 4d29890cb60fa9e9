//! Playback scheduling
//!
//! Generated material is swapped in without interrupting playback by keeping
//! two buffers: the one currently heard and the one being filled. For sheets
//! these are two sets of looping MIDI parts (`SheetPlaybackManager`); for
//! spectrograms, two audio players crossfaded into each other
//! (`SpectrogramPlaybackManager`).
//!
//! Event times are musical (quarter notes). Conversion to audio-clock seconds
//! happens only when events are dispatched to a [`NoteSink`], so tempo changes
//! never require rescheduling.

mod crossfade;
mod midi_file;
mod part;
mod sheet;
mod spectrogram;

pub use crossfade::CrossFade;
pub use midi_file::{MidiFile, MidiFileError, MidiTrack, DEFAULT_MIDI_BPM};
pub use part::{EventSet, Part, TimedEvent};
pub use sheet::{SheetPlaybackManager, CHORD_VELOCITY, LOOKAHEAD, LOW_LATENCY_LOOKAHEAD};
pub use spectrogram::{
    AudioClip, AudioClipError, ChannelSelection, MultiChannelSpectrogramPlaybackManager, Player, Sampler,
    SpectrogramPlaybackManager, CROSSFADE_DURATION, CROSSFADE_LOOKAHEAD, FADE_IN_DURATION, MAX_GAIN, NUM_VOICES,
};

/// A note in musical time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Onset in quarters
    pub time: f64,
    pub note: u8,
    /// Normalised velocity (0 to 1)
    pub velocity: f32,
    /// Length in quarters
    pub duration: f64,
}

/// Sustain pedal (CC 64) change in musical time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedalEvent {
    pub time: f64,
    pub value: u8,
}

impl PedalEvent {
    pub fn is_down(&self) -> bool {
        self.value >= 64
    }
}

impl TimedEvent for NoteEvent {
    fn time(&self) -> f64 {
        self.time
    }
}

impl TimedEvent for PedalEvent {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Receiver of scheduled events, timed on the audio clock (seconds)
pub trait NoteSink {
    fn note(&mut self, channel: u8, note: u8, velocity: f32, at: f64, duration: f64);

    fn pedal(&mut self, channel: u8, down: bool, at: f64);

    /// Instrument change on a channel
    fn program_change(&mut self, _channel: u8, _program: u8) {}
}

/// Sink that records everything, handy for previews and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    pub notes: Vec<(u8, u8, f32, f64, f64)>,
    pub pedals: Vec<(u8, bool, f64)>,
}

impl NoteSink for RecordingSink {
    fn note(&mut self, channel: u8, note: u8, velocity: f32, at: f64, duration: f64) {
        self.notes.push((channel, note, velocity, at, duration));
    }

    fn pedal(&mut self, channel: u8, down: bool, at: f64) {
        self.pedals.push((channel, down, at));
    }
}
