//! Sheet-music locator
//!
//! Tiles a laid-out score with timestamp boxes, one set per configured
//! granularity. Boxes are keyed by `"{granularity}-{measure}-{index}-timeContainer"`
//! and persist across renders, so their annotations survive a regeneration
//! of the score; boxes that a new layout no longer produces are dropped.

mod annotations;
mod layout;
mod score;

pub use annotations::{Chord, ChordQuality, ChordSelector, FermataBox, CHORD_OCTAVE};
pub use layout::{MeasureLayout, ProportionalLayout, ScoreLayout};
pub use score::{MeasureDescription, ScoreDescription};

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::time::Duration;

use super::{Locator, LocatorBase, LocatorError};
use crate::config::{AnnotationType, AppConfig};
use crate::types::{Fraction, Rect, Size};

/// Temporary container width used while the engine lays out the score
pub const SUPER_LARGE_WIDTH_PX: f32 = 10_000_000.0;

/// Multiplier applied by one zoom step
pub const ZOOM_STEP: f32 = 1.2;

pub const SHEET_RESIZE_DEBOUNCE: Duration = Duration::from_millis(50);

/// Convert layout units to pixels at `zoom`
pub fn position_zoom(value: f32, shift: f32, zoom: f32) -> f32 {
    (value - shift) * 10.0 * zoom
}

/// Unique id of a timestamp box
pub fn box_id(granularity_quarters: u32, measure: usize, index: usize) -> String {
    format!("{}-{}-{}-timeContainer", granularity_quarters, measure, index)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Pixel geometry of the scrollable score container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerGeometry {
    pub width: f32,
    pub graphic_width: f32,
    /// Set by the first layout pass
    pub view_box: Option<ViewBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimestampBox {
    pub id: String,
    pub granularity: u32,
    pub measure: usize,
    pub index: usize,
    pub start: Fraction,
    pub end: Fraction,
    pub contained_quarters: Range<u32>,
    pub rect: Rect,
    pub available: bool,
    pub active: bool,
    pub playing: bool,
    pub dragover: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct SheetOptions {
    pub granularities_quarters: Vec<u32>,
    pub annotation_types: Vec<AnnotationType>,
    pub allow_only_one_fermata: bool,
    pub resize_debounce: Duration,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            granularities_quarters: vec![1, 2, 4],
            annotation_types: Vec::new(),
            allow_only_one_fermata: false,
            resize_debounce: SHEET_RESIZE_DEBOUNCE,
        }
    }
}

impl SheetOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            granularities_quarters: config.granularities_quarters.clone(),
            annotation_types: config.annotation_types.clone(),
            allow_only_one_fermata: config.allow_only_one_fermata,
            resize_debounce: Duration::from_millis(config.resize_debounce_ms),
        }
    }
}

pub struct SheetLocator<L: ScoreLayout = ProportionalLayout> {
    base: LocatorBase,
    layout: Option<L>,
    granularities: Vec<u32>,
    current_granularity: u32,
    annotation_types: Vec<AnnotationType>,
    allow_only_one_fermata: bool,
    boxes: Vec<TimestampBox>,
    box_index: HashMap<String, usize>,
    fermatas: Vec<FermataBox>,
    chord_selectors: Vec<ChordSelector>,
    geometry: ContainerGeometry,
    zoom: f32,
}

impl<L: ScoreLayout> SheetLocator<L> {
    pub fn new(options: SheetOptions, viewport: Size) -> Self {
        let mut granularities: Vec<u32> = options
            .granularities_quarters
            .into_iter()
            .filter(|&g| g > 0)
            .collect();
        granularities.sort_unstable();
        granularities.dedup();
        let current_granularity = granularities.iter().copied().min().unwrap_or(1);

        Self {
            base: LocatorBase::new(viewport, options.resize_debounce),
            layout: None,
            granularities,
            current_granularity,
            annotation_types: options.annotation_types,
            allow_only_one_fermata: options.allow_only_one_fermata,
            boxes: Vec::new(),
            box_index: HashMap::new(),
            fermatas: Vec::new(),
            chord_selectors: Vec::new(),
            geometry: ContainerGeometry {
                width: viewport.width,
                graphic_width: viewport.width,
                view_box: None,
            },
            zoom: 1.0,
        }
    }

    /// Load a new score layout; takes effect on the next render
    pub fn load(&mut self, layout: L) {
        let zoom = self.layout.as_ref().map(|l| l.zoom());
        self.layout = Some(layout);
        if let (Some(zoom), Some(layout)) = (zoom, self.layout.as_mut()) {
            layout.set_zoom(zoom);
        }
    }

    pub fn layout(&self) -> Option<&L> {
        self.layout.as_ref()
    }

    pub fn granularities(&self) -> &[u32] {
        &self.granularities
    }

    pub fn current_granularity(&self) -> u32 {
        self.current_granularity
    }

    /// Make boxes of `granularity` the active interactive cells
    pub fn set_granularity(&mut self, granularity: u32) {
        self.current_granularity = granularity;
        for timestamp_box in &mut self.boxes {
            timestamp_box.active = timestamp_box.granularity == granularity;
        }
    }

    pub fn compute_position_zoom(&self, value: f32, shift: f32) -> f32 {
        position_zoom(value, shift, self.zoom)
    }

    pub fn piece_duration(&self) -> Fraction {
        self.layout
            .as_ref()
            .map(|l| l.piece_duration())
            .unwrap_or(Fraction::ZERO)
    }

    pub fn sequence_duration_quarters(&self) -> f64 {
        self.piece_duration().quarters()
    }

    pub fn geometry(&self) -> &ContainerGeometry {
        &self.geometry
    }

    pub fn boxes(&self) -> &[TimestampBox] {
        &self.boxes
    }

    pub fn timestamp_box(&self, id: &str) -> Option<&TimestampBox> {
        self.box_index.get(id).map(|&i| &self.boxes[i])
    }

    pub fn active_boxes(&self) -> impl Iterator<Item = &TimestampBox> {
        self.boxes.iter().filter(|b| b.active)
    }

    pub fn fermatas(&self) -> &[FermataBox] {
        &self.fermatas
    }

    pub fn chord_selectors(&self) -> &[ChordSelector] {
        &self.chord_selectors
    }

    /// Quarters carrying an active fermata
    pub fn fermata_quarters(&self) -> Vec<u32> {
        self.fermatas
            .iter()
            .filter(|f| f.active)
            .map(|f| f.quarter)
            .collect()
    }

    /// Set the fermata of a quarter-note box. Returns false if there is none.
    pub fn set_fermata(&mut self, box_id: &str, active: bool) -> bool {
        let Some(position) = self.fermatas.iter().position(|f| f.box_id == box_id) else {
            return false;
        };
        if active && self.allow_only_one_fermata {
            for fermata in &mut self.fermatas {
                fermata.active = false;
            }
        }
        self.fermatas[position].active = active;
        true
    }

    pub fn set_chord(&mut self, index: usize, chord: Chord) -> bool {
        match self.chord_selectors.get_mut(index) {
            Some(selector) => {
                selector.chord = chord;
                true
            }
            None => false,
        }
    }

    /// Active box under a pixel position
    pub fn box_at(&self, x: f32, y: f32) -> Option<&TimestampBox> {
        self.active_boxes().find(|b| b.rect.contains(x, y))
    }

    /// Time range selected by a click at a pixel position
    pub fn selection_at(&self, x: f32, y: f32) -> Option<(Fraction, Fraction)> {
        self.box_at(x, y).map(|b| (b.start, b.end))
    }

    /// Start dragging a box; the payload is its id
    pub fn drag_start(&self, box_id: &str) -> Option<String> {
        self.box_index.contains_key(box_id).then(|| box_id.to_string())
    }

    pub fn drag_enter(&mut self, box_id: &str) {
        self.set_dragover(box_id, true);
    }

    pub fn drag_leave(&mut self, box_id: &str) {
        self.set_dragover(box_id, false);
    }

    /// Drop `payload` on `target_id`
    ///
    /// Accepted only when the payload names an active timestamp box. `copy`
    /// receives `(source, target)`.
    pub fn drop_on<F>(&mut self, payload: &str, target_id: &str, mut copy: F) -> DropOutcome
    where
        F: FnMut(&TimestampBox, &TimestampBox),
    {
        let (Some(&source), Some(&target)) = (self.box_index.get(payload), self.box_index.get(target_id)) else {
            log::debug!("SheetLocator: rejected drop of {:?} on {}", payload, target_id);
            return DropOutcome::Rejected;
        };
        if !self.boxes[source].active {
            return DropOutcome::Rejected;
        }
        copy(&self.boxes[source], &self.boxes[target]);
        self.boxes[target].dragover = false;
        DropOutcome::Accepted
    }

    /// Copy chords (and fermatas, unless only one is allowed) from the
    /// region of one box onto the region of another
    pub fn copy_annotations(&mut self, source_id: &str, target_id: &str) {
        let (Some(source), Some(target)) = (self.timestamp_box(source_id), self.timestamp_box(target_id)) else {
            return;
        };
        let source_range = source.contained_quarters.clone();
        let target_start = target.contained_quarters.start;
        let target_end = target.contained_quarters.end;
        let shifted = |quarter: u32| target_start + (quarter - source_range.start);

        let chords: Vec<(u32, Chord)> = self
            .chord_selectors
            .iter()
            .filter(|s| source_range.contains(&s.start_quarter))
            .map(|s| (shifted(s.start_quarter), s.chord))
            .collect();
        for (quarter, chord) in chords {
            if quarter >= target_end {
                continue;
            }
            if let Some(selector) = self.chord_selectors.iter_mut().find(|s| s.start_quarter == quarter) {
                selector.chord = chord;
            }
        }

        if self.allow_only_one_fermata {
            return;
        }
        let fermatas: Vec<(u32, bool)> = self
            .fermatas
            .iter()
            .filter(|f| source_range.contains(&f.quarter))
            .map(|f| (shifted(f.quarter), f.active))
            .collect();
        for (quarter, active) in fermatas {
            if let Some(fermata) = self.fermatas.iter_mut().find(|f| f.quarter == quarter && quarter < target_end) {
                fermata.active = active;
            }
        }
    }

    pub fn zoom_in(&mut self) -> Result<(), LocatorError> {
        self.apply_zoom(ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> Result<(), LocatorError> {
        self.apply_zoom(1.0 / ZOOM_STEP)
    }

    fn apply_zoom(&mut self, factor: f32) -> Result<(), LocatorError> {
        let layout = self.layout.as_mut().ok_or(LocatorError::NoScore)?;
        let zoom = layout.zoom() * factor;
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(LocatorError::InvalidZoom(zoom));
        }
        layout.set_zoom(zoom);
        log::info!("SheetLocator: zoom level now {}", zoom);
        self.render(())
    }

    /// Resize the container to the super-large width or back to the content
    ///
    /// No-op before the first layout pass.
    pub fn update_container_width(&mut self, to_content_width: bool) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        if self.geometry.view_box.is_none() {
            return;
        }
        let new_width = if to_content_width {
            let system_x = position_zoom(layout.system_x(), 0.0, self.zoom);
            let border_right = position_zoom(layout.border_right(), 0.0, self.zoom);
            system_x + border_right + system_x
        } else {
            SUPER_LARGE_WIDTH_PX
        };

        let previous = self.geometry.graphic_width;
        self.geometry.width = new_width;
        self.geometry.graphic_width = new_width;
        if let Some(view_box) = self.geometry.view_box.as_mut() {
            if previous > 0.0 {
                view_box.width *= new_width / previous;
            }
        }
    }

    /// Create or resize every timestamp box from the current layout
    pub fn draw_timestamp_boxes(&mut self) -> Result<(), LocatorError> {
        let layout = self.layout.as_ref().ok_or(LocatorError::NoScore)?;
        let measures = layout.measures();
        let piece_duration = layout.piece_duration();
        let zoom = self.zoom;
        let mut seen = HashSet::new();

        for (measure_index, measure) in measures.iter().enumerate() {
            let measure_end = measure.end();
            let y = measure.staff_top;
            let height = measure.staff_bottom + 4.0 - y;

            for &granularity in &self.granularities {
                let duration = Fraction::from_quarters(granularity);
                let whole = duration.whole_value();
                if whole > 1 && measure_index as i64 % whole != 0 {
                    continue;
                }

                let mut begin = measure.start;
                let mut end = begin + duration;
                let mut index = 0;
                while begin < measure_end && end <= piece_duration {
                    let mut x_begin = layout.x_for_timestamp(begin);
                    let mut x_end = if end < measure_end {
                        layout.x_for_timestamp(end)
                    } else {
                        let last_index = measure_index as i64 + whole - if duration.is_whole() { 1 } else { 0 };
                        let last = usize::try_from(last_index)
                            .ok()
                            .and_then(|i| measures.get(i))
                            .unwrap_or(measure);
                        last.abs_x + last.width + 1.0
                    };

                    if measure.begin_instructions_width > 1.0 {
                        let shift = if measure.begin_instructions_width > 5.0 { 1.0 } else { 2.0 };
                        x_begin -= shift;
                        x_end -= shift;
                    }

                    let rect = Rect {
                        x: position_zoom(x_begin, 1.0, zoom),
                        y: position_zoom(y, 0.0, zoom),
                        width: position_zoom(x_end - x_begin, 1.0, zoom),
                        height: position_zoom(height, 0.0, zoom),
                    };
                    let id = box_id(granularity, measure_index, index);

                    let existing = self.box_index.get(&id).copied();
                    match existing {
                        Some(existing) => {
                            let timestamp_box = &mut self.boxes[existing];
                            timestamp_box.rect = rect;
                            timestamp_box.start = begin;
                            timestamp_box.end = end;
                        }
                        None => {
                            let quarters = quarter_floor(begin)..quarter_floor(end);
                            if granularity == 1 && self.annotation_types.contains(&AnnotationType::Fermata) {
                                self.fermatas.push(FermataBox {
                                    box_id: id.clone(),
                                    quarter: quarters.start,
                                    active: false,
                                });
                            }
                            if granularity == 2 && self.annotation_types.contains(&AnnotationType::ChordSelector) {
                                self.chord_selectors.push(ChordSelector::new(&id, quarters.start));
                            }
                            self.box_index.insert(id.clone(), self.boxes.len());
                            self.boxes.push(TimestampBox {
                                id: id.clone(),
                                granularity,
                                measure: measure_index,
                                index,
                                start: begin,
                                end,
                                contained_quarters: quarters,
                                rect,
                                available: true,
                                active: granularity == self.current_granularity,
                                playing: false,
                                dragover: false,
                            });
                        }
                    }
                    seen.insert(id);

                    begin += duration;
                    end += duration;
                    index += 1;
                }
            }
        }

        if seen.len() != self.boxes.len() {
            self.boxes.retain(|b| seen.contains(&b.id));
            self.fermatas.retain(|f| seen.contains(&f.box_id));
            self.chord_selectors.retain(|s| seen.contains(&s.box_id));
            self.box_index = self
                .boxes
                .iter()
                .enumerate()
                .map(|(i, b)| (b.id.clone(), i))
                .collect();
        }
        self.chord_selectors.sort_by_key(|s| s.start_quarter);
        log::debug!("SheetLocator: {} timestamp boxes", self.boxes.len());
        Ok(())
    }

    fn set_dragover(&mut self, box_id: &str, dragover: bool) {
        if let Some(&i) = self.box_index.get(box_id) {
            self.boxes[i].dragover = dragover;
        }
    }

    fn init_view_box(&mut self) {
        if self.geometry.view_box.is_some() {
            return;
        }
        let Some(first) = self.layout.as_ref().and_then(|l| l.measures().first()) else {
            return;
        };
        let height = position_zoom(first.staff_bottom + 4.0 + first.staff_top, 0.0, self.zoom);
        self.geometry.view_box = Some(ViewBox {
            x: 0.0,
            y: 0.0,
            width: self.geometry.graphic_width,
            height,
        });
    }
}

fn quarter_floor(t: Fraction) -> u32 {
    (t.real_value() * 4.0).floor().max(0.0) as u32
}

impl<L: ScoreLayout> Locator for SheetLocator<L> {
    type RenderParams = ();

    fn base(&self) -> &LocatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LocatorBase {
        &mut self.base
    }

    fn render(&mut self, _params: ()) -> Result<(), LocatorError> {
        self.zoom = self.layout.as_ref().ok_or(LocatorError::NoScore)?.zoom();
        self.update_container_width(false);
        if let Some(layout) = self.layout.as_mut() {
            layout.render()?;
        }
        self.init_view_box();
        self.draw_timestamp_boxes()?;
        self.update_container_width(true);
        self.base.mark_rendered();
        Ok(())
    }

    /// The score keeps its own width, nothing to recompute
    fn refresh_layout(&mut self) {}

    fn interactive_element(&self, index: usize) -> Option<Rect> {
        self.active_boxes().nth(index).map(|b| b.rect)
    }

    fn num_interactive_elements(&self) -> usize {
        self.active_boxes().count()
    }

    fn set_currently_playing_position(&mut self, progress: f64) {
        let position = (progress * self.sequence_duration_quarters()).round();
        for timestamp_box in &mut self.boxes {
            timestamp_box.playing =
                position >= 0.0 && timestamp_box.contained_quarters.contains(&(position as u32));
        }
    }
}
