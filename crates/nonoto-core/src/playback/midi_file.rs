//! Standard MIDI file decoding for generated scores

use std::collections::HashMap;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;

use super::{NoteEvent, PedalEvent};

/// Tempo assumed when the file carries none
pub const DEFAULT_MIDI_BPM: f64 = 120.0;

const PEDAL_CONTROLLER: u8 = 64;

#[derive(Debug, Error)]
pub enum MidiFileError {
    #[error("Failed to parse MIDI data: {0}")]
    Parse(String),

    #[error("Timecode-based MIDI timing is not supported")]
    UnsupportedTiming,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MidiTrack {
    pub name: Option<String>,
    pub notes: Vec<NoteEvent>,
    pub pedal: Vec<PedalEvent>,
}

impl MidiTrack {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.pedal.is_empty()
    }
}

/// Decoded MIDI file with event times in quarters
#[derive(Debug, Clone, PartialEq)]
pub struct MidiFile {
    /// Tracks with at least one note or pedal event, in file order
    pub tracks: Vec<MidiTrack>,
    pub bpm: f64,
    pub time_signature: Option<(u8, u8)>,
}

impl MidiFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, MidiFileError> {
        let smf = Smf::parse(bytes).map_err(|e| MidiFileError::Parse(e.to_string()))?;
        let ticks_per_quarter = match smf.header.timing {
            Timing::Metrical(tpq) => tpq.as_int().max(1) as f64,
            Timing::Timecode(..) => return Err(MidiFileError::UnsupportedTiming),
        };

        let mut bpm: Option<f64> = None;
        let mut time_signature = None;
        let mut tracks = Vec::new();

        for track in &smf.tracks {
            let mut ticks: u64 = 0;
            let mut decoded = MidiTrack::default();
            // (channel, key) -> onsets still sounding
            let mut pending: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

            for event in track {
                ticks += event.delta.as_int() as u64;
                let quarters = ticks as f64 / ticks_per_quarter;

                match event.kind {
                    TrackEventKind::Midi { channel, message } => {
                        let channel = channel.as_int();
                        match message {
                            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                                pending
                                    .entry((channel, key.as_int()))
                                    .or_default()
                                    .push((ticks, vel.as_int()));
                            }
                            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                                let onsets = pending.entry((channel, key.as_int())).or_default();
                                if !onsets.is_empty() {
                                    let (start, velocity) = onsets.remove(0);
                                    decoded.notes.push(NoteEvent {
                                        time: start as f64 / ticks_per_quarter,
                                        note: key.as_int(),
                                        velocity: velocity as f32 / 127.0,
                                        duration: (ticks - start) as f64 / ticks_per_quarter,
                                    });
                                }
                            }
                            MidiMessage::Controller { controller, value }
                                if controller.as_int() == PEDAL_CONTROLLER =>
                            {
                                decoded.pedal.push(PedalEvent {
                                    time: quarters,
                                    value: value.as_int(),
                                });
                            }
                            _ => {}
                        }
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                        if bpm.is_none() && tempo.as_int() > 0 {
                            bpm = Some(60_000_000.0 / tempo.as_int() as f64);
                        }
                    }
                    TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_pow2, ..)) => {
                        if time_signature.is_none() {
                            time_signature = Some((numerator, 1u8.checked_shl(denominator_pow2 as u32).unwrap_or(4)));
                        }
                    }
                    TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                        decoded.name = Some(String::from_utf8_lossy(name).into_owned());
                    }
                    _ => {}
                }
            }

            if !pending.values().all(Vec::is_empty) {
                log::warn!("MidiFile: dropping notes without a note-off");
            }
            decoded
                .notes
                .sort_by(|a, b| a.time.total_cmp(&b.time).then(a.note.cmp(&b.note)));
            if !decoded.is_empty() {
                tracks.push(decoded);
            }
        }

        log::debug!(
            "MidiFile: {} tracks, {} notes",
            tracks.len(),
            tracks.iter().map(|t| t.notes.len()).sum::<usize>()
        );
        Ok(Self {
            tracks,
            bpm: bpm.unwrap_or(DEFAULT_MIDI_BPM),
            time_signature,
        })
    }

    /// End of the last note, in quarters
    pub fn duration_quarters(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|t| t.notes.iter())
            .map(|n| n.time + n.duration)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, TrackEvent};

    fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind,
        }
    }

    fn midi(channel: u8, message: MidiMessage) -> TrackEventKind<'static> {
        TrackEventKind::Midi {
            channel: u4::new(channel),
            message,
        }
    }

    fn two_track_file() -> Vec<u8> {
        let conductor = vec![
            event(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000 / 2)))),
            event(0, TrackEventKind::Meta(MetaMessage::TimeSignature(3, 2, 24, 8))),
            event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
        ];
        let melody = vec![
            event(0, TrackEventKind::Meta(MetaMessage::TrackName(b"Soprano"))),
            event(0, midi(0, MidiMessage::NoteOn { key: u7::new(72), vel: u7::new(127) })),
            event(0, midi(0, MidiMessage::Controller { controller: u7::new(64), value: u7::new(127) })),
            event(480, midi(0, MidiMessage::NoteOn { key: u7::new(72), vel: u7::new(0) })),
            event(0, midi(0, MidiMessage::NoteOn { key: u7::new(74), vel: u7::new(64) })),
            event(960, midi(0, MidiMessage::NoteOff { key: u7::new(74), vel: u7::new(0) })),
            event(0, midi(0, MidiMessage::Controller { controller: u7::new(64), value: u7::new(0) })),
            event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
        ];
        let smf = Smf {
            header: Header {
                format: Format::Parallel,
                timing: Timing::Metrical(u15::new(480)),
            },
            tracks: vec![conductor, melody],
        };
        let mut bytes = Vec::new();
        smf.write(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_parse_notes_in_quarters() {
        let file = MidiFile::parse(&two_track_file()).unwrap();
        assert_eq!(file.tracks.len(), 1);
        assert_eq!(file.bpm, 240.0);
        assert_eq!(file.time_signature, Some((3, 4)));

        let track = &file.tracks[0];
        assert_eq!(track.name.as_deref(), Some("Soprano"));
        assert_eq!(track.notes.len(), 2);
        assert_eq!(track.notes[0].note, 72);
        assert_eq!(track.notes[0].duration, 1.0);
        assert_eq!(track.notes[1].time, 1.0);
        assert_eq!(track.notes[1].duration, 2.0);
        assert!((track.notes[1].velocity - 64.0 / 127.0).abs() < 1e-6);
        assert_eq!(track.pedal.len(), 2);
        assert!(track.pedal[0].is_down());
        assert!(!track.pedal[1].is_down());
        assert_eq!(file.duration_quarters(), 3.0);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(MidiFile::parse(b"not a midi file"), Err(MidiFileError::Parse(_))));
    }
}
