//! Spectrogram locator
//!
//! A toggle grid laid over the spectrogram image. The user paints a mask of
//! cells to regenerate; releasing the pointer fires the registered callback
//! if at least one cell is selected.

mod grid;
mod mask;

pub use grid::{GridEvent, GridWidget, StepGrid, ToggleGrid};
pub use mask::Mask;

use std::time::Duration;

use super::{Locator, LocatorBase, LocatorError};
use crate::types::{Rect, Size};

/// Default number of top-level timesteps in the spectrogram
pub const DEFAULT_TIMESTEPS_TOP: usize = 4;

/// Called with the mask when a pointer is released over a non-empty mask
pub type ReleaseCallback = Box<dyn FnMut(&Mask) + Send>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramRenderParams {
    pub rows: usize,
    pub columns: usize,
    pub columns_top: usize,
    pub viewport: Size,
}

/// Pixel geometry derived from the container size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectrogramGeometry {
    pub timestep_width: f32,
    pub image_width: f32,
    pub snap_width: f32,
    /// Also the number of snap markers
    pub scroll_steps: usize,
    pub grid_height: f32,
    pub image_height: f32,
    pub no_scroll: bool,
}

pub struct SpectrogramLocator {
    base: LocatorBase,
    grid: Option<ToggleGrid<StepGrid>>,
    columns_top: usize,
    timesteps_top: usize,
    geometry: SpectrogramGeometry,
    playing_column: Option<usize>,
    release_armed: bool,
    paint_state: Option<bool>,
    on_release: Option<ReleaseCallback>,
    image: Option<Vec<u8>>,
}

impl std::fmt::Debug for SpectrogramLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramLocator")
            .field("grid", &self.grid)
            .field("columns_top", &self.columns_top)
            .field("timesteps_top", &self.timesteps_top)
            .field("geometry", &self.geometry)
            .finish()
    }
}

impl SpectrogramLocator {
    pub fn new(viewport: Size) -> Self {
        Self {
            base: LocatorBase::new(viewport, Duration::ZERO),
            grid: None,
            columns_top: 1,
            timesteps_top: DEFAULT_TIMESTEPS_TOP,
            geometry: SpectrogramGeometry::default(),
            playing_column: None,
            release_armed: false,
            paint_state: None,
            on_release: None,
            image: None,
        }
    }

    pub fn register_callback(&mut self, callback: impl FnMut(&Mask) + Send + 'static) {
        self.on_release = Some(Box::new(callback));
    }

    pub fn grid(&self) -> Option<&ToggleGrid<StepGrid>> {
        self.grid.as_ref()
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.grid.as_ref().map(|g| g.pattern())
    }

    pub fn is_empty(&self) -> bool {
        self.mask().map(Mask::is_empty).unwrap_or(true)
    }

    pub fn clear(&mut self) {
        if let Some(grid) = self.grid.as_mut() {
            grid.clear();
        }
    }

    pub fn geometry(&self) -> &SpectrogramGeometry {
        &self.geometry
    }

    pub fn timesteps_top(&self) -> usize {
        self.timesteps_top
    }

    pub fn set_timesteps_top(&mut self, timesteps_top: usize) {
        self.timesteps_top = timesteps_top;
        self.recompute_geometry();
    }

    pub fn columns_top(&self) -> usize {
        self.columns_top
    }

    pub fn num_scroll_steps(&self) -> usize {
        (self.timesteps_top + 1).saturating_sub(self.columns_top).max(1)
    }

    pub fn playing_column(&self) -> Option<usize> {
        self.playing_column
    }

    /// Spectrogram image bytes (PNG), as received from the server
    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    pub fn load_spectrogram(&mut self, image: Vec<u8>) {
        log::debug!("SpectrogramLocator: new image ({} bytes)", image.len());
        self.image = Some(image);
    }

    /// Move the grid stepper
    pub fn set_position(&mut self, step: usize) -> Vec<GridEvent> {
        match self.grid.as_mut() {
            Some(grid) => grid.set_stepper(step),
            None => Vec::new(),
        }
    }

    pub fn highlight_column(&mut self, column: usize) {
        let columns = self.grid.as_ref().map(|g| g.columns()).unwrap_or(0);
        self.playing_column = (column < columns).then_some(column);
    }

    /// Pointer pressed at grid coordinates: arm the release gate and start
    /// painting with the inverse of the cell's state
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Vec<GridEvent> {
        self.release_armed = true;
        let Some(grid) = self.grid.as_mut() else {
            return Vec::new();
        };
        let Some((row, column)) = grid.cell_at(x, y) else {
            return Vec::new();
        };
        let state = !grid.pattern().get(row, column);
        self.paint_state = Some(state);
        let events = grid.key_change(row, column, state);
        log_toggles(&events);
        events
    }

    /// Pointer moved while pressed: paint the cell under it
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Vec<GridEvent> {
        let (Some(state), Some(grid)) = (self.paint_state, self.grid.as_mut()) else {
            return Vec::new();
        };
        let Some((row, column)) = grid.cell_at(x, y) else {
            return Vec::new();
        };
        let events = grid.key_change(row, column, state);
        log_toggles(&events);
        events
    }

    /// Pointer released anywhere. Returns true if the callback fired.
    pub fn pointer_up(&mut self) -> bool {
        self.paint_state = None;
        if !std::mem::take(&mut self.release_armed) || self.is_empty() {
            return false;
        }
        let Some(mask) = self.grid.as_ref().map(|g| g.pattern().clone()) else {
            return false;
        };
        if let Some(callback) = self.on_release.as_mut() {
            callback(&mask);
        }
        true
    }

    /// Recompute grid size, image scaling and snap markers
    pub fn resize(&mut self) {
        let size = self.base.container();
        if let Some(grid) = self.grid.as_mut() {
            grid.resize(size);
        }
        self.recompute_geometry();
    }

    fn recompute_geometry(&mut self) {
        let size = self.base.container();
        let timestep_width = size.width / self.columns_top.max(1) as f32;
        let scroll_steps = self.num_scroll_steps();
        self.geometry = SpectrogramGeometry {
            timestep_width,
            image_width: (timestep_width * self.timesteps_top as f32).floor(),
            snap_width: (timestep_width * scroll_steps as f32).round(),
            scroll_steps,
            grid_height: size.height,
            image_height: size.height,
            no_scroll: scroll_steps == 1,
        };
    }
}

fn log_toggles(events: &[GridEvent]) {
    for event in events {
        if let GridEvent::Toggle { row, column, state } = event {
            log::trace!("SpectrogramLocator: toggle ({}, {}) -> {}", row, column, state);
        }
    }
}

impl Locator for SpectrogramLocator {
    type RenderParams = SpectrogramRenderParams;

    fn base(&self) -> &LocatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LocatorBase {
        &mut self.base
    }

    fn render(&mut self, params: SpectrogramRenderParams) -> Result<(), LocatorError> {
        if params.rows == 0 || params.columns == 0 || params.columns_top == 0 {
            return Err(LocatorError::InvalidGrid {
                rows: params.rows,
                columns: params.columns,
            });
        }
        if self.grid.take().is_some() {
            log::debug!("SpectrogramLocator: destroying previous grid");
        }
        self.base.set_container(params.viewport);
        self.grid = Some(ToggleGrid::new(StepGrid::new(
            params.rows,
            params.columns,
            params.viewport,
        )));
        self.columns_top = params.columns_top;
        self.playing_column = None;
        self.release_armed = false;
        self.paint_state = None;
        self.recompute_geometry();
        self.base.mark_rendered();
        Ok(())
    }

    fn refresh_layout(&mut self) {
        self.resize();
    }

    fn interactive_element(&self, index: usize) -> Option<Rect> {
        let grid = self.grid.as_ref()?;
        let columns = grid.columns().max(1);
        grid.cell_rect(index / columns, index % columns)
    }

    fn num_interactive_elements(&self) -> usize {
        self.grid
            .as_ref()
            .map(|g| g.rows() * g.columns())
            .unwrap_or(0)
    }

    fn set_currently_playing_position(&mut self, progress: f64) {
        let columns = self.grid.as_ref().map(|g| g.columns()).unwrap_or(0);
        let column = (progress * columns as f64).round().max(0.0) as usize;
        self.highlight_column(column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn params(columns_top: usize) -> SpectrogramRenderParams {
        SpectrogramRenderParams {
            rows: 4,
            columns: 16,
            columns_top,
            viewport: Size { width: 1000.0, height: 400.0 },
        }
    }

    #[test]
    fn test_geometry() {
        let mut locator = SpectrogramLocator::new(Size::default());
        locator.render(params(3)).unwrap();
        let geometry = *locator.geometry();
        assert!((geometry.timestep_width - 333.333).abs() < 1e-2);
        assert_eq!(geometry.image_width, 1333.0);
        assert_eq!(geometry.scroll_steps, 2);
        assert_eq!(geometry.snap_width, 667.0);
        assert_eq!(geometry.image_height, 400.0);
        assert!(!geometry.no_scroll);

        locator.set_timesteps_top(3);
        assert!(locator.geometry().no_scroll);
    }

    #[test]
    fn test_release_fires_only_with_selection() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut locator = SpectrogramLocator::new(Size::default());
        locator.render(params(4)).unwrap();
        let counter = fired.clone();
        locator.register_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // release without press
        assert!(!locator.pointer_up());

        // press outside the grid: gate armed but mask empty
        locator.pointer_down(-10.0, -10.0);
        assert!(!locator.pointer_up());

        locator.pointer_down(10.0, 10.0);
        locator.pointer_down(100.0, 10.0);
        assert!(locator.pointer_up());
        assert!(!locator.pointer_up());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drag_paints_with_first_state() {
        let mut locator = SpectrogramLocator::new(Size::default());
        locator.render(params(4)).unwrap();
        locator.pointer_down(10.0, 10.0);
        let events = locator.pointer_move(80.0, 10.0);
        assert_eq!(events, vec![
            GridEvent::Toggle { row: 0, column: 1, state: true },
            GridEvent::Change { row: 0, column: 1, state: true },
        ]);
        // repainting the same cell only reports a change
        assert_eq!(locator.pointer_move(80.0, 10.0).len(), 1);
        locator.pointer_up();
        assert_eq!(locator.mask().unwrap().active_cells(), vec![(0, 0), (0, 1)]);
        assert!(locator.pointer_move(150.0, 10.0).is_empty());
    }

    #[test]
    fn test_rerender_replaces_grid() {
        let mut locator = SpectrogramLocator::new(Size::default());
        locator.render(params(4)).unwrap();
        locator.pointer_down(10.0, 10.0);
        locator.render(params(4)).unwrap();
        assert!(locator.is_empty());
        assert_eq!(locator.num_interactive_elements(), 64);
        assert!(locator.render(SpectrogramRenderParams { rows: 0, ..params(4) }).is_err());
    }

    #[test]
    fn test_playing_column_and_resize() {
        let mut locator = SpectrogramLocator::new(Size::default());
        locator.render(params(4)).unwrap();
        locator.set_currently_playing_position(0.5);
        assert_eq!(locator.playing_column(), Some(8));
        locator.set_currently_playing_position(1.0);
        assert_eq!(locator.playing_column(), None);

        locator.container_resized(Size { width: 2000.0, height: 200.0 }, Instant::now());
        assert_eq!(locator.geometry().timestep_width, 500.0);
        assert_eq!(locator.grid().unwrap().size().height, 200.0);
        assert_eq!(locator.interactive_element(17).unwrap().x, 125.0);
    }
}
