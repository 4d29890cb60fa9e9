//! iced widgets for the nonoto editors
//!
//! Same split as everywhere in the UI:
//!
//! - **State** lives in `nonoto-core` (locators, controls)
//! - **View functions** take that state plus callback closures and return
//!   `Element<Message>`
//! - **Canvas Programs** do the custom drawing and turn pointer events into
//!   callbacks
//!
//! ## View Functions
//!
//! - `sheet_overlay`: timestamp boxes, fermatas and chord labels over a score
//! - `spectrogram_grid`: paintable toggle grid over a spectrogram image
//! - `cycle_select`, `number_readout`, `number_slider`: control widgets
//! - `downbeat_indicator`: tempo-sync downbeat flash

pub mod controls;
pub mod sheet_overlay;
pub mod spectrogram_grid;
pub mod theme;

pub use controls::{cycle_select, downbeat_indicator, number_readout, number_slider, ReadoutInteraction};
pub use sheet_overlay::{sheet_overlay, SheetEvent, SheetInteraction};
pub use spectrogram_grid::{spectrogram_grid, GridPointer, GridInteraction};
