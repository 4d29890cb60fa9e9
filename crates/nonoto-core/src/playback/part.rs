use std::collections::BTreeMap;

use super::{NoteEvent, PedalEvent};

pub trait TimedEvent {
    /// Position in quarters
    fn time(&self) -> f64;
}

/// A looping sequence of events sorted by time
#[derive(Debug, Clone)]
pub struct Part<E> {
    events: Vec<E>,
    mute: bool,
    loop_end: f64,
}

impl<E: TimedEvent> Part<E> {
    pub fn new(events: Vec<E>, loop_end: f64) -> Self {
        let mut part = Self {
            events: Vec::with_capacity(events.len()),
            mute: false,
            loop_end,
        };
        for event in events {
            part.add(event);
        }
        part
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
    }

    pub fn loop_end(&self) -> f64 {
        self.loop_end
    }

    pub fn set_loop_end(&mut self, loop_end: f64) {
        self.loop_end = loop_end;
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn add(&mut self, event: E) {
        let index = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(index, event);
    }

    /// Events sounding in `[start, end)` with their absolute position
    ///
    /// The part repeats every `loop_end` quarters; events at or past the
    /// loop end never play.
    pub fn events_in(&self, start: f64, end: f64) -> Vec<(f64, &E)> {
        let mut found = Vec::new();
        if end <= start || self.loop_end <= 0.0 {
            return found;
        }
        let mut offset = (start / self.loop_end).floor() * self.loop_end;
        while offset < end {
            for event in &self.events {
                let time = event.time();
                if time < 0.0 || time >= self.loop_end {
                    continue;
                }
                let position = offset + time;
                if position >= start && position < end {
                    found.push((position, event));
                }
            }
            offset += self.loop_end;
        }
        found
    }
}

/// Parts of one playback buffer, keyed by MIDI channel
#[derive(Debug, Clone, Default)]
pub struct EventSet {
    pub notes: BTreeMap<u8, Part<NoteEvent>>,
    pub pedals: BTreeMap<u8, Part<PedalEvent>>,
}

impl EventSet {
    /// True when every note part is muted (vacuously for an empty set)
    pub fn is_muted(&self) -> bool {
        self.notes.values().all(Part::is_muted)
    }

    pub fn set_muted(&mut self, mute: bool) {
        self.notes.values_mut().for_each(|p| p.set_mute(mute));
        self.pedals.values_mut().for_each(|p| p.set_mute(mute));
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.pedals.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.pedals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(time: f64, note: u8) -> NoteEvent {
        NoteEvent {
            time,
            note,
            velocity: 0.8,
            duration: 1.0,
        }
    }

    #[test]
    fn test_add_keeps_order() {
        let mut part = Part::new(vec![note(2.0, 62), note(0.0, 60)], 4.0);
        part.add(note(1.0, 61));
        let notes: Vec<u8> = part.events().iter().map(|e| e.note).collect();
        assert_eq!(notes, vec![60, 61, 62]);
    }

    #[test]
    fn test_events_in_loops() {
        let part = Part::new(vec![note(0.0, 60), note(3.0, 63), note(5.0, 65)], 4.0);
        let found: Vec<(f64, u8)> = part.events_in(3.0, 8.5).iter().map(|(t, e)| (*t, e.note)).collect();
        assert_eq!(found, vec![(3.0, 63), (4.0, 60), (7.0, 63), (8.0, 60)]);
        assert!(part.events_in(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_empty_set_is_muted() {
        let mut set = EventSet::default();
        assert!(set.is_muted());
        set.notes.insert(1, Part::new(vec![note(0.0, 60)], 4.0));
        assert!(!set.is_muted());
        set.set_muted(true);
        assert!(set.is_muted());
    }
}
