//! Canvas overlay for the sheet locator
//!
//! Draws the score's staves, the active timestamp boxes, fermata markers and
//! chord labels, and turns pointer gestures into [`SheetEvent`]s: a click
//! selects a box, a press-drag-release between two boxes is a drop, and the
//! wheel over a box steps the granularity.

use iced::alignment::{Horizontal, Vertical};
use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Program, Stroke, Text};
use iced::widget::Canvas;
use iced::{mouse, Element, Length, Point, Rectangle, Size, Theme};
use nonoto_core::locator::sheet::{MeasureLayout, ScoreLayout, SheetLocator, TimestampBox};
use nonoto_core::locator::Locator;

use crate::theme;

/// Layout units between two staff lines
const LINE_GAP_UNITS: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SheetEvent {
    /// Click on a box
    Select(String),
    /// Box `source` dropped on box `target`
    Drop { source: String, target: String },
    DragEnter(String),
    DragLeave(String),
    /// Wheel over a box: step the granularity up or down
    Scroll { increase: bool },
}

/// Pointer state kept by the canvas between events
#[derive(Debug, Clone, Default)]
pub struct SheetInteraction {
    pressed: Option<String>,
    hovered: Option<String>,
}

pub struct SheetOverlayCanvas<'a, Message, F>
where
    F: Fn(SheetEvent) -> Message,
{
    pub locator: &'a SheetLocator,
    /// Interactive-element indexes highlighted by the call-to-action
    pub highlighted: &'a [usize],
    pub on_event: F,
}

impl<Message, F> SheetOverlayCanvas<'_, Message, F>
where
    F: Fn(SheetEvent) -> Message,
{
    fn box_at(&self, position: Point) -> Option<&TimestampBox> {
        self.locator.box_at(position.x, position.y)
    }
}

impl<Message, F> Program<Message> for SheetOverlayCanvas<'_, Message, F>
where
    Message: Clone,
    F: Fn(SheetEvent) -> Message,
{
    type State = SheetInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let Some(position) = cursor.position_in(bounds) else {
            if matches!(event, Event::Mouse(mouse::Event::ButtonReleased(_))) {
                interaction.pressed = None;
            }
            return None;
        };
        let under = self.box_at(position).map(|b| b.id.clone());

        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                interaction.pressed = under;
            }
            Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if under == interaction.hovered {
                    return None;
                }
                let left = std::mem::replace(&mut interaction.hovered, under.clone());
                // drag feedback only while carrying a box
                if interaction.pressed.is_some() {
                    if let Some(target) = under.filter(|t| Some(t) != interaction.pressed.as_ref()) {
                        return Some(canvas::Action::publish((self.on_event)(SheetEvent::DragEnter(target))));
                    }
                    if let Some(left) = left {
                        return Some(canvas::Action::publish((self.on_event)(SheetEvent::DragLeave(left))));
                    }
                }
                return Some(canvas::Action::request_redraw());
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let source = interaction.pressed.take()?;
                let target = under?;
                let event = if source == target {
                    SheetEvent::Select(target)
                } else {
                    SheetEvent::Drop { source, target }
                };
                return Some(canvas::Action::publish((self.on_event)(event)));
            }
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                under?;
                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. } => *y,
                };
                if y != 0.0 {
                    return Some(
                        canvas::Action::publish((self.on_event)(SheetEvent::Scroll { increase: y > 0.0 }))
                            .and_capture(),
                    );
                }
            }
            _ => {}
        }
        None
    }

    fn mouse_interaction(
        &self,
        interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        match cursor.position_in(bounds) {
            Some(_) if interaction.pressed.is_some() => mouse::Interaction::Grabbing,
            Some(position) if self.box_at(position).is_some() => mouse::Interaction::Pointer,
            _ => mouse::Interaction::default(),
        }
    }

    fn draw(
        &self,
        interaction: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), theme::BACKGROUND);

        let Some(layout) = self.locator.layout() else {
            return vec![frame.into_geometry()];
        };
        draw_staves(&mut frame, self.locator, layout.measures());

        for (index, timestamp_box) in self.locator.active_boxes().enumerate() {
            let fill = if timestamp_box.dragover {
                theme::BOX_DRAGOVER
            } else if self.highlighted.contains(&index) {
                theme::BOX_HIGHLIGHT
            } else if timestamp_box.playing {
                theme::BOX_PLAYING
            } else if interaction.hovered.as_deref() == Some(timestamp_box.id.as_str()) {
                theme::BOX_HOVER
            } else {
                theme::BOX_IDLE
            };
            let rect = timestamp_box.rect;
            let top_left = Point::new(rect.x, rect.y);
            let size = Size::new(rect.width, rect.height);
            frame.fill_rectangle(top_left, size, fill);
            frame.stroke(
                &Path::rectangle(top_left, size),
                Stroke::default().with_color(theme::BOX_BORDER).with_width(1.0),
            );
        }

        for fermata in self.locator.fermatas().iter().filter(|f| f.active) {
            if let Some(timestamp_box) = self.locator.timestamp_box(&fermata.box_id) {
                let rect = timestamp_box.rect;
                let center = Point::new(rect.x + rect.width / 2.0, rect.y - 6.0);
                frame.stroke(
                    &Path::new(|p| p.arc(canvas::path::Arc {
                        center,
                        radius: 5.0,
                        start_angle: iced::Radians(std::f32::consts::PI),
                        end_angle: iced::Radians(2.0 * std::f32::consts::PI),
                    })),
                    Stroke::default().with_color(theme::FERMATA).with_width(2.0),
                );
                frame.fill(&Path::circle(center, 1.5), theme::FERMATA);
            }
        }

        for selector in self.locator.chord_selectors() {
            if let Some(timestamp_box) = self.locator.timestamp_box(&selector.box_id) {
                let rect = timestamp_box.rect;
                frame.fill_text(Text {
                    content: selector.chord.name(),
                    position: Point::new(rect.x + rect.width / 2.0, rect.y + rect.height + 8.0),
                    size: 12.0.into(),
                    color: theme::CHORD_TEXT,
                    align_x: Horizontal::Center.into(),
                    align_y: Vertical::Center.into(),
                    ..Text::default()
                });
            }
        }

        vec![frame.into_geometry()]
    }
}

/// Five-line staves for the first and last part across every measure
fn draw_staves(frame: &mut Frame, locator: &SheetLocator, measures: &[MeasureLayout]) {
    let stroke = Stroke::default().with_color(theme::STAFF_LINE).with_width(1.0);
    for measure in measures {
        let x0 = locator.compute_position_zoom(measure.abs_x, 0.0);
        let x1 = locator.compute_position_zoom(measure.abs_x + measure.width, 0.0);
        let mut tops = vec![measure.staff_top];
        if measure.staff_bottom > measure.staff_top {
            tops.push(measure.staff_bottom);
        }
        for top in tops {
            for line in 0..5 {
                let y = locator.compute_position_zoom(top + line as f32 * LINE_GAP_UNITS, 0.0);
                frame.stroke(&Path::line(Point::new(x0, y), Point::new(x1, y)), stroke.clone());
            }
            let y0 = locator.compute_position_zoom(top, 0.0);
            let y1 = locator.compute_position_zoom(top + 4.0 * LINE_GAP_UNITS, 0.0);
            frame.stroke(&Path::line(Point::new(x1, y0), Point::new(x1, y1)), stroke.clone());
        }
    }
}

/// Score overlay sized to the locator's graphic
pub fn sheet_overlay<'a, Message>(
    locator: &'a SheetLocator,
    highlighted: &'a [usize],
    on_event: impl Fn(SheetEvent) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let height = locator
        .layout()
        .map(|l| locator.compute_position_zoom(l.height(), 0.0))
        .unwrap_or_else(|| locator.base().container().height);
    Canvas::new(SheetOverlayCanvas {
        locator,
        highlighted,
        on_event,
    })
    .width(Length::Fixed(locator.geometry().graphic_width.max(1.0)))
    .height(Length::Fixed(height.max(1.0)))
    .into()
}
