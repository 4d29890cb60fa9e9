//! MIDI output device selection and scheduled sending
//!
//! Playback schedules events slightly ahead of time on the audio clock. The
//! selector converts those times to its own millisecond clock through a
//! timing offset and keeps them queued until they are due, which is checked
//! on every UI tick.

use std::time::Instant;

use midir::MidiOutputConnection;
use nonoto_core::playback::NoteSink;

use crate::{MidiError, MidiPorts};

/// Device list entry that disables MIDI output
pub const NO_OUTPUT: &str = "No Output";

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;
const CC_SUSTAIN: u8 = 64;
const CC_ALL_NOTES_OFF: u8 = 123;

/// Anything raw MIDI bytes can be written to
pub trait MidiSender: Send {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError>;
}

impl MidiSender for MidiOutputConnection {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        MidiOutputConnection::send(self, message).map_err(|e| MidiError::OutputError(e.to_string()))
    }
}

/// A message waiting for its send time on the MIDI clock
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledMessage {
    pub at_ms: f64,
    pub bytes: [u8; 3],
}

/// Selects the output device and sends playback events to it
pub struct MidiOutputSelector {
    devices: Vec<String>,
    current: String,
    sender: Option<Box<dyn MidiSender>>,
    /// Pending messages, sorted by send time
    queue: Vec<ScheduledMessage>,
    /// MIDI clock minus audio clock, in milliseconds
    timing_offset_ms: f64,
    epoch: Instant,
}

impl MidiOutputSelector {
    /// Create a selector over the system's output ports, initially disabled
    pub fn new() -> Self {
        let mut selector = Self::with_devices(Vec::new());
        selector.refresh_devices();
        selector
    }

    /// Create a selector over a fixed list of port names
    pub fn with_devices(ports: Vec<String>) -> Self {
        let mut devices = vec![NO_OUTPUT.to_string()];
        devices.extend(ports);
        Self {
            devices,
            current: NO_OUTPUT.to_string(),
            sender: None,
            queue: Vec::new(),
            timing_offset_ms: 0.0,
            epoch: Instant::now(),
        }
    }

    /// Re-read the system's output ports
    pub fn refresh_devices(&mut self) {
        let ports = MidiPorts::list_output_ports().unwrap_or_else(|e| {
            log::warn!("MIDI: Failed to list output ports: {}", e);
            Vec::new()
        });
        self.devices = std::iter::once(NO_OUTPUT.to_string()).chain(ports).collect();
    }

    /// `"No Output"` followed by the available port names
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Switch output device
    ///
    /// Notes still sounding on the previous device are turned off first.
    /// `"No Output"` or a name that cannot be connected selects the no-op
    /// device.
    pub fn select(&mut self, name: &str) -> Result<(), MidiError> {
        self.all_notes_off();
        self.sender = None;
        self.current = NO_OUTPUT.to_string();

        if name == NO_OUTPUT {
            log::info!("MIDI: Selected output: {}", NO_OUTPUT);
            return Ok(());
        }
        if !self.devices.iter().any(|d| d == name) {
            log::warn!("MIDI: Unknown output {:?}, output disabled", name);
            return Ok(());
        }

        let connection = MidiPorts::connect_output(name)?;
        self.attach(name, Box::new(connection));
        Ok(())
    }

    /// Use `sender` as the output named `name`
    pub fn attach(&mut self, name: &str, sender: Box<dyn MidiSender>) {
        self.sender = Some(sender);
        self.current = name.to_string();
        log::info!("MIDI: Selected output: {}", name);
    }

    /// Milliseconds elapsed on the MIDI clock
    pub fn midi_clock_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    pub fn timing_offset_ms(&self) -> f64 {
        self.timing_offset_ms
    }

    /// Align the clocks: `timing_offset = midi_clock_ms − audio_clock_ms`
    pub fn sync_clocks(&mut self, midi_clock_ms: f64, audio_clock_s: f64) {
        self.timing_offset_ms = midi_clock_ms - audio_clock_s * 1000.0;
    }

    pub fn pending(&self) -> &[ScheduledMessage] {
        &self.queue
    }

    /// Queue `bytes` for audio-clock time `at` (seconds)
    fn schedule(&mut self, at: f64, bytes: [u8; 3]) {
        if self.sender.is_none() {
            return;
        }
        let at_ms = at * 1000.0 + self.timing_offset_ms;
        let index = self.queue.partition_point(|m| m.at_ms <= at_ms);
        self.queue.insert(index, ScheduledMessage { at_ms, bytes });
    }

    /// Send every queued message due at `midi_clock_ms`. Returns the count sent.
    pub fn flush(&mut self, midi_clock_ms: f64) -> usize {
        let due = self.queue.partition_point(|m| m.at_ms <= midi_clock_ms);
        if due == 0 {
            return 0;
        }
        let messages: Vec<_> = self.queue.drain(..due).collect();
        if let Some(sender) = self.sender.as_mut() {
            for message in &messages {
                if let Err(e) = sender.send(&message.bytes) {
                    log::warn!("MIDI: Failed to send message: {}", e);
                }
            }
        }
        due
    }

    /// Drop pending messages and silence every channel
    pub fn all_notes_off(&mut self) {
        self.queue.clear();
        let Some(sender) = self.sender.as_mut() else {
            return;
        };
        log::debug!("MIDI: All notes off on {}", self.current);
        for channel in 0..16u8 {
            for cc in [CC_SUSTAIN, CC_ALL_NOTES_OFF] {
                if let Err(e) = sender.send(&[CONTROL_CHANGE | channel, cc, 0]) {
                    log::warn!("MIDI: Failed to send all notes off: {}", e);
                    return;
                }
            }
        }
    }
}

impl Default for MidiOutputSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// 1-based channel to status-byte nibble
fn channel_nibble(channel: u8) -> u8 {
    channel.saturating_sub(1).min(15)
}

fn velocity_byte(velocity: f32) -> u8 {
    (velocity.clamp(0.0, 1.0) * 127.0).round() as u8
}

impl NoteSink for MidiOutputSelector {
    fn note(&mut self, channel: u8, note: u8, velocity: f32, at: f64, duration: f64) {
        let nibble = channel_nibble(channel);
        let note = note.min(127);
        // velocity 0 would read as a note off
        let velocity = velocity_byte(velocity).max(1);
        log::trace!("MIDI: note {} ch={} @ {:.3}s for {:.3}s", note, channel, at, duration);
        self.schedule(at, [NOTE_ON | nibble, note, velocity]);
        self.schedule(at + duration.max(0.0), [NOTE_OFF | nibble, note, 0]);
    }

    fn pedal(&mut self, channel: u8, down: bool, at: f64) {
        let value = if down { 127 } else { 0 };
        self.schedule(at, [CONTROL_CHANGE | channel_nibble(channel), CC_SUSTAIN, value]);
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        let Some(sender) = self.sender.as_mut() else {
            return;
        };
        let message = [PROGRAM_CHANGE | channel_nibble(channel), program.min(127)];
        if let Err(e) = sender.send(&message) {
            log::warn!("MIDI: Failed to send program change: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Vec<u8>>>>);

    impl MidiSender for Recorder {
        fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
            self.0.lock().unwrap().push(message.to_vec());
            Ok(())
        }
    }

    fn selector() -> (MidiOutputSelector, Recorder) {
        let _ = env_logger::builder().is_test(true).try_init();
        let recorder = Recorder::default();
        let mut selector = MidiOutputSelector::with_devices(vec!["Synth".to_string()]);
        selector.attach("Synth", Box::new(recorder.clone()));
        (selector, recorder)
    }

    #[test]
    fn test_device_list_starts_with_no_output() {
        let selector = MidiOutputSelector::with_devices(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(selector.devices(), &["No Output", "A", "B"]);
        assert_eq!(selector.current(), NO_OUTPUT);
        assert!(!selector.is_enabled());
    }

    #[test]
    fn test_notes_are_sent_when_due() {
        let (mut selector, recorder) = selector();
        // MIDI clock at 5000 ms when the audio clock reads 2 s
        selector.sync_clocks(5000.0, 2.0);
        assert_eq!(selector.timing_offset_ms(), 3000.0);

        selector.note(2, 60, 0.5, 2.1, 0.25);
        assert_eq!(selector.pending().len(), 2);
        assert_eq!(selector.pending()[0].at_ms, 5100.0);

        assert_eq!(selector.flush(5099.0), 0);
        assert_eq!(selector.flush(5100.0), 1);
        assert_eq!(recorder.0.lock().unwrap()[0], vec![0x91, 60, 64]);
        assert_eq!(selector.flush(6000.0), 1);
        assert_eq!(recorder.0.lock().unwrap()[1], vec![0x81, 60, 0]);
    }

    #[test]
    fn test_queue_stays_sorted() {
        let (mut selector, _recorder) = selector();
        selector.pedal(1, true, 1.0);
        selector.pedal(1, false, 0.5);
        selector.note(1, 64, 1.0, 0.75, 0.125);
        let times: Vec<f64> = selector.pending().iter().map(|m| m.at_ms).collect();
        assert_eq!(times, vec![500.0, 750.0, 875.0, 1000.0]);
    }

    #[test]
    fn test_switching_device_silences_previous() {
        let (mut selector, recorder) = selector();
        selector.note(1, 60, 1.0, 10.0, 1.0);
        selector.select(NO_OUTPUT).unwrap();

        assert!(selector.pending().is_empty());
        assert!(!selector.is_enabled());
        let sent = recorder.0.lock().unwrap();
        assert_eq!(sent.len(), 32);
        assert!(sent.contains(&vec![0xBF, CC_ALL_NOTES_OFF, 0]));
    }

    #[test]
    fn test_unknown_device_disables_output() {
        let (mut selector, _recorder) = selector();
        selector.select("Not a device").unwrap();
        assert_eq!(selector.current(), NO_OUTPUT);
        assert!(!selector.is_enabled());
    }

    #[test]
    fn test_disabled_output_queues_nothing() {
        let mut selector = MidiOutputSelector::with_devices(Vec::new());
        selector.note(1, 60, 1.0, 0.0, 1.0);
        assert!(selector.pending().is_empty());
    }
}
