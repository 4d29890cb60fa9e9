//! MIDI port discovery and connection
//!
//! Uses midir for cross-platform MIDI I/O (ALSA on Linux, CoreMIDI on macOS, WinMM on Windows).

use midir::{MidiInput, MidiInputPort, MidiOutput, MidiOutputConnection};

/// Error type for MIDI connection operations
#[derive(Debug, thiserror::Error)]
pub enum MidiConnectionError {
    #[error("Failed to initialize MIDI input: {0}")]
    InputInitError(String),

    #[error("Failed to initialize MIDI output: {0}")]
    OutputInitError(String),

    #[error("No MIDI input ports available")]
    NoInputPorts,

    #[error("No MIDI port found matching: {0}")]
    PortNotFound(String),

    #[error("Failed to connect to MIDI port: {0}")]
    ConnectionError(String),

    #[error("Failed to get port info: {0}")]
    PortInfoError(String),
}

/// Port lookup helpers
pub struct MidiPorts;

impl MidiPorts {
    /// Connect to the output port with exactly this name
    pub fn connect_output(name: &str) -> Result<MidiOutputConnection, MidiConnectionError> {
        let midi_out =
            MidiOutput::new("nonoto-midi-out").map_err(|e| MidiConnectionError::OutputInitError(e.to_string()))?;

        let port = midi_out
            .ports()
            .into_iter()
            .find(|port| midi_out.port_name(port).map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| MidiConnectionError::PortNotFound(name.to_string()))?;

        let connection = midi_out
            .connect(&port, "nonoto-midi-output")
            .map_err(|e| MidiConnectionError::ConnectionError(e.to_string()))?;
        log::info!("MIDI: Connected to output port: {}", name);
        Ok(connection)
    }

    /// Find an input port whose name contains `port_match` (case-insensitive)
    pub fn find_input_port(port_match: &str) -> Result<(MidiInput, MidiInputPort), MidiConnectionError> {
        let pattern = port_match.to_lowercase();

        let midi_in =
            MidiInput::new("nonoto-midi-in").map_err(|e| MidiConnectionError::InputInitError(e.to_string()))?;

        let in_ports = midi_in.ports();
        if in_ports.is_empty() {
            return Err(MidiConnectionError::NoInputPorts);
        }

        let input_port = in_ports
            .into_iter()
            .find(|port| {
                midi_in
                    .port_name(port)
                    .map(|name| name.to_lowercase().contains(&pattern))
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiConnectionError::PortNotFound(port_match.to_string()))?;

        let port_name = midi_in
            .port_name(&input_port)
            .map_err(|e| MidiConnectionError::PortInfoError(e.to_string()))?;
        log::info!("MIDI: Found input port: {}", port_name);

        Ok((midi_in, input_port))
    }

    /// List all available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<String>, MidiConnectionError> {
        let midi_in =
            MidiInput::new("nonoto-midi-list").map_err(|e| MidiConnectionError::InputInitError(e.to_string()))?;

        Ok(midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect())
    }

    /// List all available MIDI output ports
    pub fn list_output_ports() -> Result<Vec<String>, MidiConnectionError> {
        let midi_out =
            MidiOutput::new("nonoto-midi-list").map_err(|e| MidiConnectionError::OutputInitError(e.to_string()))?;

        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // Only checks that enumeration does not crash; availability depends on the system
        let _input_ports = MidiPorts::list_input_ports();
        let _output_ports = MidiPorts::list_output_ports();
    }

    #[test]
    fn test_unknown_output_port() {
        assert!(MidiPorts::connect_output("nonoto-test-port-that-does-not-exist").is_err());
    }
}
