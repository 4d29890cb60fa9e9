//! Locators: interactive overlays over a rendered score or spectrogram
//!
//! A locator maps musical time onto on-screen cells. The sheet locator tiles
//! the rendered score with timestamp boxes at several granularities; the
//! spectrogram locator lays a toggle grid over the spectrogram image.
//!
//! Both share the lifecycle in [`Locator`]: render once, refresh on
//! (debounced) container resizes, report interactive cells by index and
//! highlight the currently playing position.

mod call_to_action;
mod resize;
pub mod sheet;
pub mod spectrogram;

pub use call_to_action::{CallToAction, CALL_TO_ACTION_CELLS, CALL_TO_ACTION_INTERVAL};
pub use resize::ResizeDebouncer;

use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;

use crate::types::{Rect, Size};

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("No score loaded")]
    NoScore,

    #[error("Invalid MusicXML: {0}")]
    MusicXml(String),

    #[error("Score has no measures")]
    EmptyScore,

    #[error("Invalid grid dimensions {rows}x{columns}")]
    InvalidGrid { rows: usize, columns: usize },

    #[error("Invalid zoom level {0}")]
    InvalidZoom(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorState {
    Uninitialized,
    Rendered,
    Refreshing,
}

/// Lifecycle and resize bookkeeping shared by all locators
#[derive(Debug, Clone)]
pub struct LocatorBase {
    state: LocatorState,
    container: Size,
    debouncer: ResizeDebouncer,
}

impl LocatorBase {
    pub fn new(container: Size, resize_delay: Duration) -> Self {
        Self {
            state: LocatorState::Uninitialized,
            container,
            debouncer: ResizeDebouncer::new(resize_delay),
        }
    }

    pub fn state(&self) -> LocatorState {
        self.state
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn set_container(&mut self, size: Size) {
        self.container = size;
    }

    pub fn mark_rendered(&mut self) {
        self.state = LocatorState::Rendered;
    }
}

pub trait Locator {
    type RenderParams;

    fn base(&self) -> &LocatorBase;
    fn base_mut(&mut self) -> &mut LocatorBase;

    /// Build the interface. The only way out of `Uninitialized`.
    fn render(&mut self, params: Self::RenderParams) -> Result<(), LocatorError>;

    /// Recompute geometry from the current container size
    fn refresh_layout(&mut self);

    fn interactive_element(&self, index: usize) -> Option<Rect>;

    fn num_interactive_elements(&self) -> usize;

    /// Highlight the cells at `progress` (0 to 1) through the sequence
    fn set_currently_playing_position(&mut self, progress: f64);

    fn state(&self) -> LocatorState {
        self.base().state()
    }

    /// Re-render with the current parameters. No-op before the first render.
    fn refresh(&mut self) {
        if self.base().state() == LocatorState::Uninitialized {
            return;
        }
        self.base_mut().state = LocatorState::Refreshing;
        self.refresh_layout();
        self.base_mut().state = LocatorState::Rendered;
    }

    /// Container resize notification, debounced
    fn container_resized(&mut self, size: Size, now: Instant) {
        self.base_mut().set_container(size);
        if self.base_mut().debouncer.trigger(now) {
            self.refresh();
        }
    }

    /// Fire a pending debounced refresh. Returns true if it ran.
    fn poll_resize(&mut self, now: Instant) -> bool {
        if self.base_mut().debouncer.poll(now) {
            self.refresh();
            return true;
        }
        false
    }

    /// Eye-catching animation over `count` random interactive cells
    fn call_to_action<R: Rng + ?Sized>(&self, rng: &mut R, count: usize, now: Instant) -> CallToAction
    where
        Self: Sized,
    {
        let available = self.num_interactive_elements();
        let indexes = if available == 0 {
            Vec::new()
        } else {
            (0..count).map(|_| rng.gen_range(0..available)).collect()
        };
        CallToAction::new(indexes, now)
    }
}
