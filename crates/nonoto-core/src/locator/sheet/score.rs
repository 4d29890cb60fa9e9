//! Measure structure extracted from MusicXML
//!
//! Only what the overlay needs is read: the number of parts, and for each
//! measure of the first part its duration and which opening symbols (clef,
//! key signature, time signature) it starts with.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::super::LocatorError;
use crate::types::Fraction;

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureDescription {
    pub duration: Fraction,
    pub clef: bool,
    pub key: bool,
    pub time_change: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDescription {
    pub parts: usize,
    pub measures: Vec<MeasureDescription>,
}

/// Elements whose text content we care about
#[derive(Debug, Clone, Copy, PartialEq)]
enum TextField {
    Beats,
    BeatType,
}

impl ScoreDescription {
    /// Plain measures with the given durations, clef/key/time at the start
    pub fn from_durations(parts: usize, durations: &[Fraction]) -> Self {
        let measures = durations
            .iter()
            .enumerate()
            .map(|(i, &duration)| MeasureDescription {
                duration,
                clef: i == 0,
                key: i == 0,
                time_change: i == 0,
            })
            .collect();
        Self { parts: parts.max(1), measures }
    }

    pub fn parse(musicxml: &str) -> Result<Self, LocatorError> {
        let mut reader = Reader::from_str(musicxml);
        reader.trim_text(true);

        let mut parts = 0usize;
        let mut part_depth = 0usize;
        let mut first_part_done = false;
        let mut measures = Vec::new();
        let mut current: Option<MeasureDescription> = None;
        let mut time_signature = Fraction::new(4, 4);
        let mut beats: Option<i64> = None;
        let mut field: Option<TextField> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| LocatorError::MusicXml(e.to_string()))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    match e.name().as_ref() {
                        b"score-part" => parts += 1,
                        b"part" if !is_empty => part_depth += 1,
                        b"measure" if part_depth == 1 && !first_part_done => {
                            current = Some(MeasureDescription {
                                duration: time_signature,
                                clef: false,
                                key: false,
                                time_change: false,
                            });
                            if is_empty {
                                close_measure(&mut current, &mut measures);
                            }
                        }
                        _ => {}
                    }
                    if let Some(measure) = current.as_mut() {
                        field = measure_child(e, measure);
                    }
                }
                Event::Text(ref t) => {
                    if let (Some(field), Some(measure)) = (field, current.as_mut()) {
                        let text = t
                            .unescape()
                            .map_err(|e| LocatorError::MusicXml(e.to_string()))?;
                        let value: i64 = text.trim().parse().map_err(|_| {
                            LocatorError::MusicXml(format!("invalid time signature value {:?}", text))
                        })?;
                        match field {
                            TextField::Beats => beats = Some(value),
                            TextField::BeatType => {
                                let numerator = beats.take().unwrap_or(4);
                                time_signature = Fraction::new(numerator, value);
                                measure.duration = time_signature;
                            }
                        }
                    }
                }
                Event::End(ref e) => {
                    field = None;
                    match e.name().as_ref() {
                        b"measure" if current.is_some() => close_measure(&mut current, &mut measures),
                        b"part" => {
                            part_depth = part_depth.saturating_sub(1);
                            first_part_done = true;
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if measures.is_empty() {
            return Err(LocatorError::EmptyScore);
        }
        log::debug!(
            "ScoreDescription: {} parts, {} measures",
            parts.max(1),
            measures.len()
        );
        Ok(Self {
            parts: parts.max(1),
            measures,
        })
    }

    pub fn duration(&self) -> Fraction {
        self.measures
            .iter()
            .fold(Fraction::ZERO, |acc, m| acc + m.duration)
    }
}

fn measure_child(e: &BytesStart<'_>, measure: &mut MeasureDescription) -> Option<TextField> {
    match e.name().as_ref() {
        b"clef" => measure.clef = true,
        b"key" => measure.key = true,
        b"time" => measure.time_change = true,
        b"beats" => return Some(TextField::Beats),
        b"beat-type" => return Some(TextField::BeatType),
        _ => {}
    }
    None
}

fn close_measure(current: &mut Option<MeasureDescription>, measures: &mut Vec<MeasureDescription>) {
    if let Some(measure) = current.take() {
        measures.push(measure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PARTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Soprano</part-name></score-part>
    <score-part id="P2"><part-name>Bass</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>1</divisions>
        <key><fifths>0</fifths></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <note><pitch><step>C</step><octave>5</octave></pitch><duration>4</duration></note>
    </measure>
    <measure number="2">
      <attributes>
        <time><beats>3</beats><beat-type>4</beat-type></time>
      </attributes>
      <note><rest/><duration>3</duration></note>
    </measure>
    <measure number="3">
      <note><rest/><duration>3</duration></note>
    </measure>
  </part>
  <part id="P2">
    <measure number="1"><note><rest/><duration>4</duration></note></measure>
    <measure number="2"><note><rest/><duration>3</duration></note></measure>
    <measure number="3"><note><rest/><duration>3</duration></note></measure>
  </part>
</score-partwise>"#;

    #[test]
    fn test_parse_measures_and_parts() {
        let score = ScoreDescription::parse(TWO_PARTS).unwrap();
        assert_eq!(score.parts, 2);
        assert_eq!(score.measures.len(), 3);

        assert_eq!(score.measures[0].duration, Fraction::new(1, 1));
        assert!(score.measures[0].clef && score.measures[0].key && score.measures[0].time_change);

        assert_eq!(score.measures[1].duration, Fraction::new(3, 4));
        assert!(score.measures[1].time_change);
        assert!(!score.measures[1].clef);

        assert_eq!(score.measures[2].duration, Fraction::new(3, 4));
        assert_eq!(score.duration(), Fraction::new(5, 2));
    }

    #[test]
    fn test_empty_score_rejected() {
        let xml = r#"<score-partwise><part-list/><part id="P1"></part></score-partwise>"#;
        assert!(matches!(ScoreDescription::parse(xml), Err(LocatorError::EmptyScore)));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        let xml = r#"<score-partwise><part id="P1"><measure></part></score-partwise>"#;
        assert!(ScoreDescription::parse(xml).is_err());
    }
}
