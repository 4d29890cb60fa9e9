//! Per-box annotations: fermatas on quarter notes, chords on half notes

use serde::{Deserialize, Serialize};

use crate::controls::PitchClass;

/// Octave used when voicing chords (C4 = 60)
pub const CHORD_OCTAVE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    #[default]
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 7] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Dominant7,
        ChordQuality::Major7,
        ChordQuality::Minor7,
    ];

    /// Semitone offsets above the root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Dominant7 => "7",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: ChordQuality,
}

impl Default for Chord {
    fn default() -> Self {
        Self {
            root: PitchClass::C,
            quality: ChordQuality::Major,
        }
    }
}

impl Chord {
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Self { root, quality }
    }

    /// MIDI notes of the chord voiced from `octave`
    pub fn notes(&self, octave: u8) -> Vec<u8> {
        let base = 12 * (octave as u16 + 1) + self.root.semitone() as u16;
        self.quality
            .intervals()
            .iter()
            .map(|&i| (base + i as u16).min(127) as u8)
            .collect()
    }

    pub fn name(&self) -> String {
        format!("{}{}", self.root, self.quality.suffix())
    }
}

/// Fermata toggle attached to a quarter-note box
#[derive(Debug, Clone, PartialEq)]
pub struct FermataBox {
    pub box_id: String,
    pub quarter: u32,
    pub active: bool,
}

/// Chord picker attached to a half-note box
#[derive(Debug, Clone, PartialEq)]
pub struct ChordSelector {
    pub box_id: String,
    pub start_quarter: u32,
    pub chord: Chord,
}

impl ChordSelector {
    pub fn new(box_id: &str, start_quarter: u32) -> Self {
        Self {
            box_id: box_id.to_string(),
            start_quarter,
            chord: Chord::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chord_is_c_major() {
        let chord = Chord::default();
        assert_eq!(chord.notes(CHORD_OCTAVE), vec![60, 64, 67]);
        assert_eq!(chord.name(), "C");
    }

    #[test]
    fn test_chord_voicing() {
        let chord = Chord::new(PitchClass::BFlat, ChordQuality::Minor7);
        assert_eq!(chord.notes(3), vec![58, 61, 65, 68]);
        assert_eq!(chord.name(), "B♭m7");
    }
}
