//! Colors and button styles shared by the nonoto widgets

use iced::widget::button::{Status, Style};
use iced::{Background, Border, Color, Shadow, Vector};

pub const BACKGROUND: Color = Color::from_rgb(0.1, 0.1, 0.12);
pub const STAFF_LINE: Color = Color::from_rgb(0.75, 0.75, 0.78);

/// Timestamp box fill, by state
pub const BOX_IDLE: Color = Color::from_rgba(0.3, 0.6, 0.9, 0.08);
pub const BOX_HOVER: Color = Color::from_rgba(0.3, 0.6, 0.9, 0.25);
pub const BOX_PLAYING: Color = Color::from_rgba(1.0, 0.6, 0.0, 0.3);
pub const BOX_DRAGOVER: Color = Color::from_rgba(0.3, 1.0, 0.3, 0.35);
pub const BOX_HIGHLIGHT: Color = Color::from_rgba(1.0, 1.0, 0.3, 0.45);
pub const BOX_BORDER: Color = Color::from_rgba(0.3, 0.6, 0.9, 0.6);

pub const FERMATA: Color = Color::from_rgb(1.0, 0.3, 0.3);
pub const CHORD_TEXT: Color = Color::from_rgb(0.8, 0.8, 0.9);

/// Spectrogram grid cells
pub const CELL_ON: Color = Color::from_rgba(0.9, 0.3, 0.5, 0.6);
pub const CELL_GRID: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.15);
pub const COLUMN_PLAYING: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.2);
pub const SNAP_MARKER: Color = Color::from_rgba(1.0, 0.6, 0.0, 0.7);

pub const DOWNBEAT_ON: Color = Color::from_rgb(1.0, 0.3, 0.3);
pub const DOWNBEAT_OFF: Color = Color::from_rgb(0.25, 0.25, 0.25);

/// Default button background color
pub const DEFAULT_BG: Color = Color::from_rgb(0.25, 0.25, 0.25);

/// Active/enabled button color
pub const ACTIVE_BG: Color = Color::from_rgb(0.3, 0.6, 0.9);

fn lighten(color: Color, factor: f32) -> Color {
    Color::from_rgb(
        (color.r + factor).min(1.0),
        (color.g + factor).min(1.0),
        (color.b + factor).min(1.0),
    )
}

fn darken(color: Color, factor: f32) -> Color {
    Color::from_rgb(
        (color.r * (1.0 - factor)).max(0.0),
        (color.g * (1.0 - factor)).max(0.0),
        (color.b * (1.0 - factor)).max(0.0),
    )
}

fn raised_style(base_color: Color) -> Style {
    Style {
        background: Some(Background::Color(base_color)),
        text_color: Color::WHITE,
        border: Border {
            color: lighten(base_color, 0.1),
            width: 1.0,
            radius: 4.0.into(),
        },
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.4),
            offset: Vector::new(2.0, 2.0),
            blur_radius: 3.0,
        },
        snap: false,
    }
}

fn pressed_style(base_color: Color) -> Style {
    Style {
        background: Some(Background::Color(darken(base_color, 0.15))),
        text_color: Color::WHITE,
        border: Border {
            color: darken(base_color, 0.2),
            width: 1.0,
            radius: 4.0.into(),
        },
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.2),
            offset: Vector::new(0.5, 0.5),
            blur_radius: 1.0,
        },
        snap: false,
    }
}

fn disabled_style() -> Style {
    Style {
        background: Some(Background::Color(Color::from_rgb(0.2, 0.2, 0.2))),
        text_color: Color::from_rgb(0.5, 0.5, 0.5),
        border: Border {
            color: Color::TRANSPARENT,
            width: 0.0,
            radius: 4.0.into(),
        },
        shadow: Shadow::default(),
        snap: false,
    }
}

/// Momentary buttons: raised, pressed in while held
///
/// Use with `.style(|_theme, status| press_release_style(status, DEFAULT_BG))`
pub fn press_release_style(status: Status, base_color: Color) -> Style {
    match status {
        Status::Active => raised_style(base_color),
        Status::Hovered => raised_style(lighten(base_color, 0.08)),
        Status::Pressed => pressed_style(base_color),
        Status::Disabled => disabled_style(),
    }
}

/// Toggle buttons (play, Link, fade-in): pressed in while active
pub fn toggle_style(status: Status, is_active: bool) -> Style {
    let base = if is_active { ACTIVE_BG } else { DEFAULT_BG };
    match (status, is_active) {
        (Status::Disabled, _) => disabled_style(),
        (Status::Active, true) => pressed_style(base),
        (Status::Hovered, true) => pressed_style(lighten(base, 0.08)),
        (Status::Pressed, true) => pressed_style(darken(base, 0.1)),
        (Status::Active, false) => raised_style(base),
        (Status::Hovered, false) => raised_style(lighten(base, 0.08)),
        (Status::Pressed, false) => pressed_style(base),
    }
}
