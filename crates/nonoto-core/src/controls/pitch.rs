//! Pitch root and octave picker for chord and sampler input

use std::fmt;

use super::{ControlError, NumberControl, NumberStyle};

pub const OCTAVE_RANGE: (f64, f64) = (2.0, 7.0);
pub const DEFAULT_OCTAVE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    EFlat,
    E,
    F,
    FSharp,
    G,
    AFlat,
    A,
    BFlat,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::EFlat,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::AFlat,
        PitchClass::A,
        PitchClass::BFlat,
        PitchClass::B,
    ];

    /// Semitones above C
    pub fn semitone(&self) -> u8 {
        *self as u8
    }

    pub fn from_semitone(semitone: u8) -> Self {
        Self::ALL[(semitone % 12) as usize]
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::C => "C",
            Self::CSharp => "C♯",
            Self::D => "D",
            Self::EFlat => "E♭",
            Self::E => "E",
            Self::F => "F",
            Self::FSharp => "F♯",
            Self::G => "G",
            Self::AFlat => "A♭",
            Self::A => "A",
            Self::BFlat => "B♭",
            Self::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Root pitch class plus octave
#[derive(Debug, Clone)]
pub struct PitchRootAndOctave {
    pitch: PitchClass,
    lock_to_c: bool,
    octave: NumberControl,
}

impl PitchRootAndOctave {
    pub fn new(lock_to_c: bool) -> Result<Self, ControlError> {
        Ok(Self {
            pitch: PitchClass::C,
            lock_to_c,
            octave: NumberControl::new("octave-control", OCTAVE_RANGE, DEFAULT_OCTAVE, NumberStyle::Readout)?,
        })
    }

    /// Pitch classes offered by the select
    pub fn options(&self) -> &'static [PitchClass] {
        if self.lock_to_c {
            &PitchClass::ALL[..1]
        } else {
            &PitchClass::ALL
        }
    }

    pub fn pitch(&self) -> PitchClass {
        self.pitch
    }

    /// Returns false when locked to C and another class was requested
    pub fn set_pitch(&mut self, pitch: PitchClass) -> bool {
        if self.lock_to_c && pitch != PitchClass::C {
            return false;
        }
        self.pitch = pitch;
        true
    }

    pub fn octave(&self) -> u8 {
        self.octave.value() as u8
    }

    pub fn octave_control(&self) -> &NumberControl {
        &self.octave
    }

    pub fn set_octave(&mut self, octave: f64) -> Option<f64> {
        self.octave.set_value(octave.round())
    }

    /// MIDI note number of the root (C4 = 60)
    pub fn midi_note(&self) -> u8 {
        12 * (self.octave() + 1) + self.pitch.semitone()
    }
}
