//! Score layout engines
//!
//! Layout coordinates are in notation units: at zoom 1 one unit is 10 px.
//! Conversion to pixels happens in the locator.

use super::super::LocatorError;
use super::score::ScoreDescription;
use crate::types::Fraction;

/// Placement of one rendered measure
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureLayout {
    pub start: Fraction,
    pub duration: Fraction,
    /// Width taken by clef/key/time symbols at the start of the measure
    pub begin_instructions_width: f32,
    pub abs_x: f32,
    pub width: f32,
    /// Absolute y of the first staff's top line
    pub staff_top: f32,
    /// Absolute y of the last staff's top line
    pub staff_bottom: f32,
}

impl MeasureLayout {
    pub fn end(&self) -> Fraction {
        self.start + self.duration
    }
}

/// A notation engine that has laid out a score on a single system
pub trait ScoreLayout {
    fn render(&mut self) -> Result<(), LocatorError>;

    fn measures(&self) -> &[MeasureLayout];

    /// Horizontal position of a timestamp (whole notes)
    fn x_for_timestamp(&self, timestamp: Fraction) -> f32;

    fn zoom(&self) -> f32;

    fn set_zoom(&mut self, zoom: f32);

    /// Absolute x of the music system
    fn system_x(&self) -> f32;

    /// Right border of the music system, relative to `system_x`
    fn border_right(&self) -> f32;

    fn piece_duration(&self) -> Fraction {
        self.measures()
            .iter()
            .fold(Fraction::ZERO, |acc, m| acc + m.duration)
    }
}

const SYSTEM_X: f32 = 5.0;
const STAFF_TOP: f32 = 10.0;
const STAFF_HEIGHT: f32 = 4.0;
const STAFF_GAP: f32 = 7.0;
const UNITS_PER_QUARTER: f32 = 4.0;
const MEASURE_PADDING: f32 = 1.0;
const CLEF_WIDTH: f32 = 3.0;
const KEY_WIDTH: f32 = 2.5;
const TIME_WIDTH: f32 = 2.0;

/// Built-in engine: one system, horizontal space proportional to time
#[derive(Debug, Clone)]
pub struct ProportionalLayout {
    score: ScoreDescription,
    zoom: f32,
    measures: Vec<MeasureLayout>,
}

impl ProportionalLayout {
    pub fn new(score: ScoreDescription) -> Self {
        Self {
            score,
            zoom: 1.0,
            measures: Vec::new(),
        }
    }

    pub fn from_musicxml(musicxml: &str) -> Result<Self, LocatorError> {
        Ok(Self::new(ScoreDescription::parse(musicxml)?))
    }

    pub fn score(&self) -> &ScoreDescription {
        &self.score
    }

    /// Height of the whole system in layout units
    pub fn height(&self) -> f32 {
        self.staff_bottom() + STAFF_HEIGHT + STAFF_TOP
    }

    fn staff_bottom(&self) -> f32 {
        STAFF_TOP + (self.score.parts.saturating_sub(1)) as f32 * (STAFF_HEIGHT + STAFF_GAP)
    }
}

impl ScoreLayout for ProportionalLayout {
    fn render(&mut self) -> Result<(), LocatorError> {
        if self.score.measures.is_empty() {
            return Err(LocatorError::EmptyScore);
        }
        let staff_bottom = self.staff_bottom();
        let mut x = SYSTEM_X;
        let mut start = Fraction::ZERO;

        self.measures = self
            .score
            .measures
            .iter()
            .map(|m| {
                let begin_instructions_width = if m.clef { CLEF_WIDTH } else { 0.0 }
                    + if m.key { KEY_WIDTH } else { 0.0 }
                    + if m.time_change { TIME_WIDTH } else { 0.0 };
                let width = begin_instructions_width
                    + m.duration.quarters() as f32 * UNITS_PER_QUARTER
                    + MEASURE_PADDING;
                let layout = MeasureLayout {
                    start,
                    duration: m.duration,
                    begin_instructions_width,
                    abs_x: x,
                    width,
                    staff_top: STAFF_TOP,
                    staff_bottom,
                };
                x += width;
                start += m.duration;
                layout
            })
            .collect();
        Ok(())
    }

    fn measures(&self) -> &[MeasureLayout] {
        &self.measures
    }

    fn x_for_timestamp(&self, timestamp: Fraction) -> f32 {
        let Some(last) = self.measures.last() else {
            return SYSTEM_X;
        };
        if timestamp >= last.end() {
            return last.abs_x + last.width;
        }
        let measure = self
            .measures
            .iter()
            .find(|m| timestamp < m.end())
            .unwrap_or(last);
        let offset = (timestamp - measure.start).quarters().max(0.0) as f32;
        measure.abs_x + measure.begin_instructions_width + offset * UNITS_PER_QUARTER
    }

    fn zoom(&self) -> f32 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    fn system_x(&self) -> f32 {
        SYSTEM_X
    }

    fn border_right(&self) -> f32 {
        self.measures.iter().map(|m| m.width).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_four(measures: usize) -> ProportionalLayout {
        let mut layout = ProportionalLayout::new(ScoreDescription::from_durations(
            1,
            &vec![Fraction::new(1, 1); measures],
        ));
        layout.render().unwrap();
        layout
    }

    #[test]
    fn test_measures_are_contiguous() {
        let layout = four_four(3);
        let measures = layout.measures();
        assert_eq!(measures.len(), 3);
        assert_eq!(measures[0].begin_instructions_width, 7.5);
        assert_eq!(measures[1].begin_instructions_width, 0.0);
        assert_eq!(measures[1].abs_x, measures[0].abs_x + measures[0].width);
        assert_eq!(measures[2].start, Fraction::new(2, 1));
        assert_eq!(layout.piece_duration(), Fraction::new(3, 1));
    }

    #[test]
    fn test_x_for_timestamp() {
        let layout = four_four(2);
        let first = &layout.measures()[0];
        assert_eq!(layout.x_for_timestamp(Fraction::ZERO), first.abs_x + 7.5);
        assert_eq!(layout.x_for_timestamp(Fraction::new(1, 4)), first.abs_x + 7.5 + 4.0);
        let second = &layout.measures()[1];
        assert_eq!(layout.x_for_timestamp(Fraction::new(1, 1)), second.abs_x);
        assert_eq!(layout.x_for_timestamp(Fraction::new(2, 1)), second.abs_x + second.width);
    }

    #[test]
    fn test_staff_extent_grows_with_parts() {
        let mut layout = ProportionalLayout::new(ScoreDescription::from_durations(3, &[Fraction::new(1, 1)]));
        layout.render().unwrap();
        let m = &layout.measures()[0];
        assert_eq!(m.staff_top, 10.0);
        assert_eq!(m.staff_bottom, 32.0);
    }
}
