//! Numeric controls: generic bounded value and the tempo control

use super::ControlError;
use crate::transport::Transport;

pub const DEFAULT_BPM_RANGE: (f64, f64) = (30.0, 300.0);
pub const DEFAULT_BPM: f64 = 100.0;

/// Pixels of vertical drag that sweep the whole range of a readout
const READOUT_DRAG_SPAN_PX: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberStyle {
    /// Numeric readout adjusted by vertical dragging
    Readout,
    /// Horizontal slider with ten steps across the range
    Slider,
}

/// A bounded numeric value
#[derive(Debug, Clone)]
pub struct NumberControl {
    id: String,
    range: (f64, f64),
    value: f64,
    style: NumberStyle,
}

impl NumberControl {
    /// Fails unless `range.0 <= initial <= range.1`
    pub fn new(id: &str, range: (f64, f64), initial: f64, style: NumberStyle) -> Result<Self, ControlError> {
        let (min, max) = range;
        if !(min <= initial && initial <= max) {
            return Err(ControlError::ValueOutOfRange { value: initial, min, max });
        }
        Ok(Self {
            id: id.to_string(),
            range,
            value: initial,
            style,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label_id(&self) -> String {
        format!("{}-label", self.id)
    }

    pub fn interaction_id(&self) -> String {
        format!("{}-interaction", self.id)
    }

    pub fn style(&self) -> NumberStyle {
        self.style
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Slider increment, `None` for readouts
    pub fn step(&self) -> Option<f64> {
        match self.style {
            NumberStyle::Slider => Some((self.range.1 - self.range.0) / 10.0),
            NumberStyle::Readout => None,
        }
    }

    /// Clamp into range and store; `Some(new)` if the value changed
    pub fn set_value(&mut self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let clamped = value.clamp(self.range.0, self.range.1);
        if clamped == self.value {
            return None;
        }
        self.value = clamped;
        Some(clamped)
    }

    /// Readout drag by `delta_y` pixels (upwards is negative)
    ///
    /// The rate is uniform across the range and does not depend on where
    /// the drag started.
    pub fn drag(&mut self, delta_y: f64) -> Option<f64> {
        let rate = (self.range.1 - self.range.0) / READOUT_DRAG_SPAN_PX;
        self.set_value(self.value - delta_y * rate)
    }
}

/// Tempo control bound to the transport
#[derive(Debug, Clone)]
pub struct BpmControl {
    control: NumberControl,
}

impl BpmControl {
    pub const ID: &'static str = "bpm-control";

    /// Fails unless the range spans at least a tempo octave
    pub fn new(range: (f64, f64), initial: f64) -> Result<Self, ControlError> {
        let (min, max) = range;
        if max < 2.0 * min {
            return Err(ControlError::BpmRangeTooNarrow { min, max });
        }
        let control = NumberControl::new(Self::ID, range, initial, NumberStyle::Readout)?;
        Ok(Self { control })
    }

    pub fn value(&self) -> f64 {
        self.control.value()
    }

    pub fn control(&self) -> &NumberControl {
        &self.control
    }

    /// Fold `bpm` into range by octaves
    pub fn fold(&self, bpm: f64) -> f64 {
        let (min, max) = self.control.range();
        let mut folded = bpm;
        while folded > max {
            folded /= 2.0;
        }
        while folded < min {
            folded *= 2.0;
        }
        folded
    }

    /// Fold and apply `bpm`, writing the transport only if its tempo differs
    ///
    /// Returns `Some(bpm)` when the control value changed, so that the caller
    /// can forward it to the tempo-sync session.
    pub fn set_value(&mut self, bpm: f64, transport: &mut Transport) -> Option<f64> {
        if !(bpm.is_finite() && bpm > 0.0) {
            log::warn!("BpmControl: ignoring invalid tempo {}", bpm);
            return None;
        }
        let folded = self.fold(bpm);
        let changed = self.control.set_value(folded);
        if transport.bpm() != folded {
            transport.set_bpm(folded);
        }
        changed
    }

    /// Readout drag, applied to the transport like [`BpmControl::set_value`]
    pub fn drag(&mut self, delta_y: f64, transport: &mut Transport) -> Option<f64> {
        let changed = self.control.drag(delta_y)?;
        if transport.bpm() != changed {
            transport.set_bpm(changed);
        }
        Some(changed)
    }
}

impl Default for BpmControl {
    fn default() -> Self {
        Self {
            control: NumberControl {
                id: Self::ID.to_string(),
                range: DEFAULT_BPM_RANGE,
                value: DEFAULT_BPM,
                style: NumberStyle::Readout,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_control_validates_initial() {
        let err = NumberControl::new("gain", (0.0, 1.0), 2.0, NumberStyle::Slider).unwrap_err();
        assert_eq!(err, ControlError::ValueOutOfRange { value: 2.0, min: 0.0, max: 1.0 });
    }

    #[test]
    fn test_number_control_ids_and_step() {
        let control = NumberControl::new("gain", (0.0, 1.2), 1.0, NumberStyle::Slider).unwrap();
        assert_eq!(control.label_id(), "gain-label");
        assert_eq!(control.interaction_id(), "gain-interaction");
        assert!((control.step().unwrap() - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_set_value_clamps_and_reports() {
        let mut control = NumberControl::new("x", (0.0, 10.0), 5.0, NumberStyle::Readout).unwrap();
        assert_eq!(control.set_value(12.0), Some(10.0));
        assert_eq!(control.set_value(15.0), None);
        assert_eq!(control.drag(-100.0), None);
        assert_eq!(control.drag(100.0), Some(5.0));
    }

    #[test]
    fn test_bpm_range_must_span_an_octave() {
        assert_eq!(
            BpmControl::new((100.0, 150.0), 120.0).unwrap_err(),
            ControlError::BpmRangeTooNarrow { min: 100.0, max: 150.0 }
        );
    }

    #[test]
    fn test_bpm_folding() {
        let mut control = BpmControl::default();
        let mut transport = Transport::new(DEFAULT_BPM);

        assert_eq!(control.set_value(600.0, &mut transport), Some(75.0));
        assert_eq!(transport.bpm(), 75.0);

        assert_eq!(control.set_value(10.0, &mut transport), Some(80.0));
        assert_eq!(transport.bpm(), 80.0);
    }

    #[test]
    fn test_bpm_does_not_rewrite_equal_transport_tempo() {
        let mut control = BpmControl::default();
        let mut transport = Transport::new(DEFAULT_BPM);
        assert_eq!(control.set_value(DEFAULT_BPM, &mut transport), None);
        assert_eq!(control.set_value(200.0, &mut transport), Some(200.0));
        assert_eq!(control.set_value(400.0, &mut transport), None);
        assert_eq!(transport.bpm(), 200.0);
    }
}
