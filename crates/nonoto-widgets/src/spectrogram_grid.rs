//! Canvas for the spectrogram locator's toggle grid
//!
//! Pointer positions are forwarded as grid coordinates; the locator decides
//! what a press, drag or release does to the mask.

use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Program, Stroke};
use iced::widget::Canvas;
use iced::{mouse, Element, Length, Point, Rectangle, Size, Theme};
use nonoto_core::locator::spectrogram::{GridWidget, SpectrogramLocator};

use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridPointer {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GridInteraction {
    is_painting: bool,
}

pub struct SpectrogramGridCanvas<'a, Message, F>
where
    F: Fn(GridPointer) -> Message,
{
    pub locator: &'a SpectrogramLocator,
    pub highlighted: &'a [usize],
    pub on_pointer: F,
}

impl<Message, F> Program<Message> for SpectrogramGridCanvas<'_, Message, F>
where
    Message: Clone,
    F: Fn(GridPointer) -> Message,
{
    type State = GridInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        // releases count anywhere, the locator's gate decides
        if let Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) = event {
            if std::mem::take(&mut interaction.is_painting) {
                return Some(canvas::Action::publish((self.on_pointer)(GridPointer::Up)));
            }
            return None;
        }

        let position = cursor.position_in(bounds)?;
        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                interaction.is_painting = true;
                Some(
                    canvas::Action::publish((self.on_pointer)(GridPointer::Down {
                        x: position.x,
                        y: position.y,
                    }))
                    .and_capture(),
                )
            }
            Event::Mouse(mouse::Event::CursorMoved { .. }) if interaction.is_painting => {
                Some(canvas::Action::publish((self.on_pointer)(GridPointer::Move {
                    x: position.x,
                    y: position.y,
                })))
            }
            _ => None,
        }
    }

    fn mouse_interaction(
        &self,
        _interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }

    fn draw(
        &self,
        _interaction: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let Some(grid) = self.locator.grid() else {
            return vec![frame.into_geometry()];
        };

        let (rows, columns) = (grid.rows(), grid.columns());
        let height = bounds.height;

        if let Some(rect) = self.locator.playing_column().and_then(|c| grid.cell_rect(0, c)) {
            frame.fill_rectangle(Point::new(rect.x, 0.0), Size::new(rect.width, height), theme::COLUMN_PLAYING);
        }

        let pattern = grid.pattern();
        for row in 0..rows {
            for column in 0..columns {
                let Some(rect) = grid.cell_rect(row, column) else {
                    continue;
                };
                let top_left = Point::new(rect.x, rect.y);
                let size = Size::new(rect.width, rect.height);
                let index = row * columns + column;
                if pattern.get(row, column) {
                    frame.fill_rectangle(top_left, size, theme::CELL_ON);
                } else if self.highlighted.contains(&index) {
                    frame.fill_rectangle(top_left, size, theme::BOX_HIGHLIGHT);
                }
                frame.stroke(
                    &Path::rectangle(top_left, size),
                    Stroke::default().with_color(theme::CELL_GRID).with_width(1.0),
                );
            }
        }

        let geometry = self.locator.geometry();
        if !geometry.no_scroll {
            let step = geometry.timestep_width;
            for marker in 0..geometry.scroll_steps {
                let x = marker as f32 * step;
                frame.fill_rectangle(Point::new(x, height - 4.0), Size::new(step.min(6.0), 4.0), theme::SNAP_MARKER);
            }
        }

        vec![frame.into_geometry()]
    }
}

/// Grid canvas sized to the locator's container
pub fn spectrogram_grid<'a, Message>(
    locator: &'a SpectrogramLocator,
    highlighted: &'a [usize],
    on_pointer: impl Fn(GridPointer) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let size = locator.grid().map(|g| g.size()).unwrap_or_default();
    Canvas::new(SpectrogramGridCanvas {
        locator,
        highlighted,
        on_pointer,
    })
    .width(Length::Fixed(size.width.max(1.0)))
    .height(Length::Fixed(size.height.max(1.0)))
    .into()
}
