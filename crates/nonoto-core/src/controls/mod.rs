//! User controls: option cycling, numeric inputs and musical pickers
//!
//! These hold the control logic only. Rendering lives in `nonoto-widgets`.

mod cycle_select;
mod granularity;
mod instrument;
mod number;
mod pitch;

pub use cycle_select::{ChangeCallback, CycleSelect};
pub use granularity::{granularity_icons, GranularitySelect, DEFAULT_GRANULARITY_ICON};
pub use instrument::{Instrument, InstrumentSelect};
pub use number::{BpmControl, NumberControl, NumberStyle, DEFAULT_BPM, DEFAULT_BPM_RANGE};
pub use pitch::{PitchClass, PitchRootAndOctave, OCTAVE_RANGE, DEFAULT_OCTAVE};

use thiserror::Error;

/// Construction-time and assignment validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("Must provide a non-empty list of options")]
    EmptyOptions,

    #[error("Must set an id for the provided container element")]
    MissingContainerId,

    #[error("Unauthorized value {0} for cycle select")]
    UnknownOption(String),

    #[error("Initial value {value} should be in the accepted range [{min}, {max}]")]
    ValueOutOfRange { value: f64, min: f64, max: f64 },

    #[error("BPM range [{min}, {max}] should be at least one tempo octave wide (max >= 2 * min)")]
    BpmRangeTooNarrow { min: f64, max: f64 },
}
