//! Double-buffered MIDI playback for the sheet editor

use super::{EventSet, MidiFile, MidiTrack, NoteSink, Part};
use crate::locator::sheet::{Chord, CHORD_OCTAVE};
use crate::transport::{Transport, TransportSpan};

/// Scheduling lookahead in seconds
pub const LOOKAHEAD: f64 = 0.1;
pub const LOW_LATENCY_LOOKAHEAD: f64 = 0.025;

/// Velocity of the accompaniment chords
pub const CHORD_VELOCITY: f32 = 0.5;

/// Chords last a half note
const CHORD_DURATION_QUARTERS: f64 = 2.0;

const SPAN_SNAP_EPSILON: f64 = 1e-6;

/// Two sets of looping parts: one audible, one being prepared
///
/// The audible set is the one whose parts are not all muted. Newly generated
/// tracks always go to the other set, which is then swapped in by
/// [`SheetPlaybackManager::switch_tracks`] so that playback never stops.
#[derive(Debug, Clone)]
pub struct SheetPlaybackManager {
    sets: [EventSet; 2],
    chord_channel: Option<u8>,
    scheduled_until: Option<f64>,
    /// Musical end of the last dispatched span
    scheduled_end: Option<f64>,
    lookahead: f64,
}

impl Default for SheetPlaybackManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetPlaybackManager {
    pub fn new() -> Self {
        Self {
            sets: [EventSet::default(), EventSet::default()],
            chord_channel: None,
            scheduled_until: None,
            scheduled_end: None,
            lookahead: LOOKAHEAD,
        }
    }

    pub fn set_low_latency(&mut self, low_latency: bool) {
        self.lookahead = if low_latency { LOW_LATENCY_LOOKAHEAD } else { LOOKAHEAD };
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    pub fn a_is_muted(&self) -> bool {
        self.sets[0].is_muted()
    }

    pub fn playing_index(&self) -> usize {
        if self.a_is_muted() {
            1
        } else {
            0
        }
    }

    pub fn next_index(&self) -> usize {
        1 - self.playing_index()
    }

    pub fn set(&self, index: usize) -> &EventSet {
        &self.sets[index]
    }

    pub fn playing(&self) -> &EventSet {
        &self.sets[self.playing_index()]
    }

    pub fn next(&self) -> &EventSet {
        &self.sets[self.next_index()]
    }

    /// Write a track into the next set, muted, looping over `duration` quarters
    pub fn schedule_track(&mut self, duration: f64, track: &MidiTrack, channel: u8) {
        let next = self.next_index();
        let set = &mut self.sets[next];

        match set.notes.get_mut(&channel) {
            Some(part) => {
                part.set_mute(true);
                part.clear();
                track.notes.iter().for_each(|&n| part.add(n));
                part.set_loop_end(duration);
            }
            None => {
                log::debug!("Playback: creating part for channel {}", channel);
                let mut part = Part::new(track.notes.clone(), duration);
                part.set_mute(true);
                set.notes.insert(channel, part);
            }
        }

        if track.pedal.is_empty() {
            return;
        }
        match set.pedals.get_mut(&channel) {
            Some(part) => {
                part.set_mute(true);
                part.clear();
                track.pedal.iter().for_each(|&p| part.add(p));
                part.set_loop_end(duration);
            }
            None => {
                let mut part = Part::new(track.pedal.clone(), duration);
                part.set_mute(true);
                set.pedals.insert(channel, part);
            }
        }
    }

    /// Install a generated MIDI file as the new loop and switch to it
    pub fn load_midi(&mut self, transport: &mut Transport, midi: &MidiFile, duration: f64) {
        if !transport.is_looping() {
            transport.set_loop(true);
            transport.set_loop_points(0.0, duration);
        }
        transport.set_loop_end(duration);
        if let Some((numerator, denominator)) = midi.time_signature {
            transport.set_time_signature(numerator, denominator);
        }

        for (index, track) in midi.tracks.iter().enumerate() {
            // MIDI channels are 1-based
            self.schedule_track(duration, track, index as u8 + 1);
        }
        self.switch_tracks();
        log::info!(
            "Playback: loaded {} tracks, loop of {} quarters",
            midi.tracks.len(),
            duration
        );
    }

    /// Mute the audible set and unmute the prepared one
    pub fn switch_tracks(&mut self) {
        let playing = self.playing_index();
        let next = self.next_index();
        if playing != next {
            self.sets[playing].set_muted(true);
        }
        self.sets[next].set_muted(false);
    }

    pub fn enable_chords(&mut self, channel: u8) {
        self.chord_channel = Some(channel);
    }

    pub fn disable_chords(&mut self) {
        self.chord_channel = None;
    }

    /// Dispatch everything due within the lookahead window
    ///
    /// `chords` are the chord selections of the score, one per half note.
    pub fn schedule<S: NoteSink>(&mut self, transport: &Transport, chords: &[Chord], sink: &mut S) {
        let now = transport.now();
        if !transport.is_started() {
            self.scheduled_until = None;
            self.scheduled_end = None;
            return;
        }
        let from = self.scheduled_until.map_or(now, |t| t.max(now));
        let until = now + self.lookahead;
        if until <= from {
            return;
        }

        let mut spans = transport.spans_between(from, until);
        // Successive windows must tile exactly, or rounding loses or doubles
        // events sitting on a boundary
        if let (Some(first), Some(end)) = (spans.first_mut(), self.scheduled_end) {
            let (loop_start, loop_end) = transport.loop_points();
            if (first.start - end).abs() < SPAN_SNAP_EPSILON {
                first.start = end;
            } else if transport.is_looping()
                && (end - loop_end).abs() < SPAN_SNAP_EPSILON
                && (first.start - loop_start).abs() < SPAN_SNAP_EPSILON
            {
                first.start = loop_start;
            }
        }
        for span in &spans {
            self.dispatch_span(transport, span, chords, sink);
        }
        self.scheduled_until = Some(until);
        self.scheduled_end = spans.last().map(|s| s.end);
    }

    fn dispatch_span<S: NoteSink>(
        &self,
        transport: &Transport,
        span: &TransportSpan,
        chords: &[Chord],
        sink: &mut S,
    ) {
        for set in &self.sets {
            for (&channel, part) in &set.notes {
                if part.is_muted() {
                    continue;
                }
                for (position, note) in part.events_in(span.start, span.end) {
                    log::trace!("Playback: note {} on channel {} @ {:.3}", note.note, channel, position);
                    sink.note(
                        channel,
                        note.note,
                        note.velocity,
                        span.clock_at(position),
                        transport.to_seconds(note.duration),
                    );
                }
            }
            for (&channel, part) in &set.pedals {
                if part.is_muted() {
                    continue;
                }
                for (position, pedal) in part.events_in(span.start, span.end) {
                    sink.pedal(channel, pedal.is_down(), span.clock_at(position));
                }
            }
        }

        let Some(channel) = self.chord_channel else {
            return;
        };
        let mut quarter = span.start.ceil();
        while quarter < span.end {
            let step = quarter as usize;
            if step % 2 == 0 {
                if let Some(chord) = chords.get(step / 2) {
                    let at = span.clock_at(quarter);
                    let duration = transport.to_seconds(CHORD_DURATION_QUARTERS);
                    for note in chord.notes(CHORD_OCTAVE) {
                        sink.note(channel, note, CHORD_VELOCITY, at, duration);
                    }
                }
            }
            quarter += 1.0;
        }
    }

    pub fn dispose(&mut self) {
        self.sets.iter_mut().for_each(EventSet::clear);
        self.scheduled_until = None;
        self.scheduled_end = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{NoteEvent, RecordingSink};

    fn track(notes: &[(f64, u8)]) -> MidiTrack {
        MidiTrack {
            name: None,
            notes: notes
                .iter()
                .map(|&(time, note)| NoteEvent {
                    time,
                    note,
                    velocity: 1.0,
                    duration: 1.0,
                })
                .collect(),
            pedal: Vec::new(),
        }
    }

    fn file(tracks: Vec<MidiTrack>) -> MidiFile {
        MidiFile {
            tracks,
            bpm: 120.0,
            time_signature: Some((4, 4)),
        }
    }

    #[test]
    fn test_initial_state_plays_b() {
        let manager = SheetPlaybackManager::new();
        assert!(manager.a_is_muted());
        assert_eq!(manager.playing_index(), 1);
        assert_eq!(manager.next_index(), 0);
    }

    #[test]
    fn test_load_alternates_sets() {
        let mut manager = SheetPlaybackManager::new();
        let mut transport = Transport::new(120.0);

        manager.load_midi(&mut transport, &file(vec![track(&[(0.0, 60)])]), 8.0);
        assert!(transport.is_looping());
        assert_eq!(transport.loop_points(), (0.0, 8.0));
        assert_eq!(manager.playing_index(), 0);
        assert!(!manager.set(0).notes[&1].is_muted());

        manager.load_midi(&mut transport, &file(vec![track(&[(0.0, 62)])]), 8.0);
        assert_eq!(manager.playing_index(), 1);
        assert!(manager.set(0).notes[&1].is_muted());
        assert_eq!(manager.playing().notes[&1].events()[0].note, 62);
    }

    #[test]
    fn test_scheduling_targets_next_set_only() {
        let mut manager = SheetPlaybackManager::new();
        let mut transport = Transport::new(120.0);
        manager.load_midi(&mut transport, &file(vec![track(&[(0.0, 60)])]), 4.0);

        manager.schedule_track(4.0, &track(&[(1.0, 64)]), 1);
        assert_eq!(manager.playing().notes[&1].events()[0].note, 60);
        assert!(manager.next().notes[&1].is_muted());
    }

    #[test]
    fn test_schedule_dispatches_unmuted_with_clock_times() {
        let mut manager = SheetPlaybackManager::new();
        let mut transport = Transport::new(120.0);
        manager.load_midi(&mut transport, &file(vec![track(&[(0.0, 60), (1.0, 62)])]), 4.0);
        // prepared but not switched in: must stay silent
        manager.schedule_track(4.0, &track(&[(0.0, 70)]), 1);
        transport.start();

        let mut sink = RecordingSink::default();
        for _ in 0..6 {
            manager.schedule(&transport, &[], &mut sink);
            transport.advance(0.1);
        }
        let notes: Vec<(u8, f64)> = sink.notes.iter().map(|n| (n.1, n.3)).collect();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], (60, 0.0));
        assert_eq!(notes[1].0, 62);
        assert!((notes[1].1 - 0.5).abs() < 1e-9);
        assert!((sink.notes[0].4 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_chord_loop_on_even_quarters() {
        let mut manager = SheetPlaybackManager::new();
        let mut transport = Transport::new(60.0);
        transport.set_loop(true);
        transport.set_loop_points(0.0, 8.0);
        manager.enable_chords(16);
        transport.start();

        let chords = [Chord::default(), Chord::default()];
        let mut sink = RecordingSink::default();
        for _ in 0..50 {
            manager.schedule(&transport, &chords, &mut sink);
            transport.advance(0.1);
        }
        // five seconds at 60 bpm: quarters 0..5, chords at 0 and 2 only, 4 has no selector
        let onsets: Vec<f64> = sink.notes.iter().map(|n| n.3).collect();
        assert_eq!(onsets.len(), 6);
        assert!(onsets[..3].iter().all(|&t| t.abs() < 1e-9));
        assert!(onsets[3..].iter().all(|&t| (t - 2.0).abs() < 1e-9));
        assert!(sink.notes.iter().all(|n| n.0 == 16 && n.2 == CHORD_VELOCITY && n.4 == 2.0));
    }

    #[test]
    fn test_dispose_clears_sets() {
        let mut manager = SheetPlaybackManager::new();
        let mut transport = Transport::new(120.0);
        manager.load_midi(&mut transport, &file(vec![track(&[(0.0, 60)])]), 4.0);
        manager.dispose();
        assert!(manager.set(0).is_empty() && manager.set(1).is_empty());
    }
}
