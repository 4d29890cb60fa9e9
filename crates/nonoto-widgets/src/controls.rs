//! Control widgets: cycle select, number readout and slider, downbeat light

use iced::alignment::{Horizontal, Vertical};
use iced::widget::canvas::{self, Event, Frame, Geometry, Program, Text};
use iced::widget::{button, column, container, slider, text, Canvas};
use iced::{mouse, Background, Border, Center, Element, Length, Point, Rectangle, Theme};
use nonoto_core::controls::{CycleSelect, NumberControl, NumberStyle};

use crate::theme;

/// Button showing the current option; a click selects the next one
pub fn cycle_select<'a, Message>(select: &CycleSelect, label: &'a str, on_next: Message) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let value = select.value().to_string();
    column![
        button(text(value).size(14))
            .on_press(on_next)
            .width(Length::Fixed(90.0))
            .style(|_theme, status| theme::press_release_style(status, theme::DEFAULT_BG)),
        text(label).size(9).color(iced::Color::from_rgb(0.6, 0.6, 0.6)),
    ]
    .spacing(2)
    .align_x(Center)
    .into()
}

/// Drag state of a readout
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadoutInteraction {
    last_y: Option<f32>,
}

struct NumberReadout<F> {
    value: f64,
    on_drag: F,
}

impl<Message, F> Program<Message> for NumberReadout<F>
where
    Message: Clone,
    F: Fn(f64) -> Message,
{
    type State = ReadoutInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                interaction.last_y = Some(position.y);
                Some(canvas::Action::capture())
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                interaction.last_y = None;
                None
            }
            // keep tracking outside the bounds while dragging
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                let last = interaction.last_y?;
                let delta = position.y - bounds.y - last;
                if delta == 0.0 {
                    return None;
                }
                interaction.last_y = Some(position.y - bounds.y);
                Some(canvas::Action::publish((self.on_drag)(delta as f64)))
            }
            _ => None,
        }
    }

    fn mouse_interaction(
        &self,
        interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if interaction.last_y.is_some() || cursor.is_over(bounds) {
            mouse::Interaction::ResizingVertically
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
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), theme::DEFAULT_BG);
        frame.fill_text(Text {
            content: format!("{:.0}", self.value),
            position: Point::new(bounds.width / 2.0, bounds.height / 2.0),
            size: 20.0.into(),
            color: iced::Color::WHITE,
            align_x: Horizontal::Center.into(),
            align_y: Vertical::Center.into(),
            ..Text::default()
        });
        vec![frame.into_geometry()]
    }
}

/// Vertical-drag numeric readout; `on_drag` receives the pixel delta (down is positive)
pub fn number_readout<'a, Message>(
    control: &NumberControl,
    label: &'a str,
    on_drag: impl Fn(f64) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    column![
        Canvas::new(NumberReadout {
            value: control.value(),
            on_drag,
        })
        .width(Length::Fixed(90.0))
        .height(Length::Fixed(36.0)),
        text(label).size(9).color(iced::Color::from_rgb(0.6, 0.6, 0.6)),
    ]
    .spacing(2)
    .align_x(Center)
    .into()
}

/// Slider over the control's range, stepping by a tenth of it
pub fn number_slider<'a, Message>(
    control: &NumberControl,
    label: &'a str,
    on_change: impl Fn(f64) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let (min, max) = control.range();
    let mut input = slider(min..=max, control.value(), on_change).width(Length::Fixed(120.0));
    if control.style() == NumberStyle::Slider {
        if let Some(step) = control.step() {
            input = input.step(step);
        }
    }
    column![input, text(label).size(9).color(iced::Color::from_rgb(0.6, 0.6, 0.6))]
        .spacing(2)
        .align_x(Center)
        .into()
}

/// Round light flashed on each downbeat of the tempo session
pub fn downbeat_indicator<'a, Message: 'a>(lit: bool) -> Element<'a, Message> {
    let color = if lit { theme::DOWNBEAT_ON } else { theme::DOWNBEAT_OFF };
    container(text(""))
        .width(Length::Fixed(24.0))
        .height(Length::Fixed(24.0))
        .style(move |_theme| container::Style {
            background: Some(Background::Color(color)),
            border: Border {
                color: iced::Color::from_rgb(0.1, 0.1, 0.1),
                width: 1.0,
                radius: 12.0.into(),
            },
            ..Default::default()
        })
        .into()
}
