//! Per-channel instrument picker mapped to General MIDI programs

use super::{ControlError, CycleSelect};
use crate::resources::ResourceLocation;

/// Instrument families offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Piano,
    ElectricPiano,
    Organ,
    Strings,
    Choir,
    SynthLead,
}

impl Instrument {
    pub const ALL: [Instrument; 6] = [
        Instrument::Piano,
        Instrument::ElectricPiano,
        Instrument::Organ,
        Instrument::Strings,
        Instrument::Choir,
        Instrument::SynthLead,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Piano => "piano",
            Self::ElectricPiano => "electric-piano",
            Self::Organ => "organ",
            Self::Strings => "strings",
            Self::Choir => "choir",
            Self::SynthLead => "synth-lead",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.name() == name)
    }

    /// General MIDI program number (0-based)
    pub fn program(&self) -> u8 {
        match self {
            Self::Piano => 0,
            Self::ElectricPiano => 4,
            Self::Organ => 16,
            Self::Strings => 48,
            Self::Choir => 52,
            Self::SynthLead => 80,
        }
    }

    fn icon(&self) -> String {
        format!("{}.svg", self.name())
    }
}

/// Instrument selector bound to a MIDI channel
#[derive(Debug)]
pub struct InstrumentSelect {
    channel: u8,
    select: CycleSelect,
}

impl InstrumentSelect {
    pub fn new(channel: u8, icons_base: ResourceLocation) -> Result<Self, ControlError> {
        let options = Instrument::ALL
            .iter()
            .map(|i| (i.name().to_string(), i.icon()))
            .collect();
        let container = format!("instrument-select-container-{}", channel);
        let select = CycleSelect::new(&container, "instrument-select", options, icons_base)?;
        Ok(Self { channel, select })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn instrument(&self) -> Instrument {
        Instrument::from_name(self.select.value()).unwrap_or(Instrument::Piano)
    }

    /// Cycle to the next instrument, returning it
    pub fn select_next(&mut self) -> Instrument {
        self.select.select_next();
        self.instrument()
    }

    pub fn set_instrument(&mut self, instrument: Instrument) -> Result<(), ControlError> {
        self.select.set_value(instrument.name())
    }

    pub fn select(&self) -> &CycleSelect {
        &self.select
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cycles_through_programs() {
        let mut select = InstrumentSelect::new(1, ResourceLocation::Path(PathBuf::from("icons"))).unwrap();
        assert_eq!(select.instrument(), Instrument::Piano);
        assert_eq!(select.select_next().program(), 4);

        select.set_instrument(Instrument::SynthLead).unwrap();
        assert_eq!(select.select_next(), Instrument::Piano);
    }
}
