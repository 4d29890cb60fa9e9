//! MIDI keyboard input
//!
//! Receives raw MIDI bytes from the midir callback, parses them with midly
//! and forwards note events to the app via a flume channel.

use flume::Sender;
use midir::MidiInputConnection;
use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::{MidiConnectionError, MidiPorts};

/// Note event from a MIDI keyboard, channels 1-based
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyEvent {
    NoteOn { channel: u8, note: u8, velocity: f32 },
    NoteOff { channel: u8, note: u8 },
}

impl KeyEvent {
    /// Parse raw MIDI bytes; anything but a note message yields `None`
    ///
    /// Note On with velocity 0 is treated as Note Off.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let LiveEvent::Midi { channel, message } = LiveEvent::parse(data).ok()? else {
            return None;
        };
        let channel = channel.as_int() + 1;
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => Some(Self::NoteOn {
                channel,
                note: key.as_int(),
                velocity: vel.as_int() as f32 / 127.0,
            }),
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => Some(Self::NoteOff {
                channel,
                note: key.as_int(),
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. } | Self::NoteOff { channel, .. } => *channel,
        }
    }
}

/// Owns the midir connection for as long as the keyboard is in use
pub struct MidiKeyboardInput {
    _connection: MidiInputConnection<Sender<KeyEvent>>,
    port_name: String,
}

impl MidiKeyboardInput {
    /// Connect to the first input port whose name contains `port_match`
    pub fn connect(port_match: &str, events: Sender<KeyEvent>) -> Result<Self, MidiConnectionError> {
        let (midi_in, port) = MidiPorts::find_input_port(port_match)?;
        let port_name = midi_in
            .port_name(&port)
            .map_err(|e| MidiConnectionError::PortInfoError(e.to_string()))?;

        let connection = midi_in
            .connect(&port, "nonoto-keyboard-input", Self::midi_callback, events)
            .map_err(|e| MidiConnectionError::ConnectionError(e.to_string()))?;

        log::info!("MIDI: Keyboard input connected: {}", port_name);
        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Called from the MIDI driver thread. Must not block.
    fn midi_callback(_timestamp: u64, data: &[u8], events: &mut Sender<KeyEvent>) {
        let Some(event) = KeyEvent::parse(data) else {
            return;
        };
        if events.try_send(event).is_err() {
            log::warn!("MIDI: Key event channel full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        let event = KeyEvent::parse(&[0x90, 0x3C, 0x7F]).unwrap();
        assert_eq!(
            event,
            KeyEvent::NoteOn {
                channel: 1,
                note: 60,
                velocity: 1.0
            }
        );
    }

    #[test]
    fn test_parse_note_on_zero_velocity() {
        let event = KeyEvent::parse(&[0x93, 0x3C, 0x00]).unwrap();
        assert_eq!(event, KeyEvent::NoteOff { channel: 4, note: 60 });
        assert_eq!(event.channel(), 4);
    }

    #[test]
    fn test_parse_note_off() {
        let event = KeyEvent::parse(&[0x8F, 0x40, 0x40]).unwrap();
        assert_eq!(event, KeyEvent::NoteOff { channel: 16, note: 64 });
    }

    #[test]
    fn test_ignores_other_messages() {
        assert!(KeyEvent::parse(&[0xB0, 0x07, 0x64]).is_none());
        assert!(KeyEvent::parse(&[]).is_none());
        assert!(KeyEvent::parse(&[0x90]).is_none());
    }

    #[test]
    fn test_callback_forwards_events() {
        let (tx, rx) = flume::bounded(4);
        let mut sender = tx;
        MidiKeyboardInput::midi_callback(0, &[0x90, 60, 100], &mut sender);
        MidiKeyboardInput::midi_callback(0, &[0xE0, 0, 64], &mut sender);
        assert_eq!(rx.try_iter().count(), 1);
    }
}
