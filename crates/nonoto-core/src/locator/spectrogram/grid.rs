//! Toggle-grid widget models
//!
//! [`StepGrid`] is the plain sequencer grid: a pattern plus a stepper
//! position, emitting `Change` for every key change even if the cell already
//! had that state. [`ToggleGrid`] wraps any [`GridWidget`] and additionally
//! reports `Toggle` only for actual state changes.

use super::Mask;
use crate::types::{Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    Change { row: usize, column: usize, state: bool },
    Toggle { row: usize, column: usize, state: bool },
    Step(usize),
}

pub trait GridWidget {
    fn rows(&self) -> usize;
    fn columns(&self) -> usize;
    fn pattern(&self) -> &Mask;
    fn size(&self) -> Size;
    fn resize(&mut self, size: Size);
    fn stepper(&self) -> usize;
    fn set_stepper(&mut self, step: usize) -> Vec<GridEvent>;
    fn key_change(&mut self, row: usize, column: usize, on: bool) -> Vec<GridEvent>;
    fn clear(&mut self);

    fn cell_size(&self) -> Size {
        let size = self.size();
        Size {
            width: size.width / self.columns().max(1) as f32,
            height: size.height / self.rows().max(1) as f32,
        }
    }

    fn cell_rect(&self, row: usize, column: usize) -> Option<Rect> {
        if row >= self.rows() || column >= self.columns() {
            return None;
        }
        let cell = self.cell_size();
        Some(Rect {
            x: column as f32 * cell.width,
            y: row as f32 * cell.height,
            width: cell.width,
            height: cell.height,
        })
    }

    /// Cell under a point in grid coordinates
    fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let cell = self.cell_size();
        if x < 0.0 || y < 0.0 || cell.width <= 0.0 || cell.height <= 0.0 {
            return None;
        }
        let (row, column) = ((y / cell.height) as usize, (x / cell.width) as usize);
        (row < self.rows() && column < self.columns()).then_some((row, column))
    }
}

#[derive(Debug, Clone)]
pub struct StepGrid {
    pattern: Mask,
    size: Size,
    stepper: usize,
}

impl StepGrid {
    pub fn new(rows: usize, columns: usize, size: Size) -> Self {
        Self {
            pattern: Mask::new(rows, columns),
            size,
            stepper: 0,
        }
    }
}

impl GridWidget for StepGrid {
    fn rows(&self) -> usize {
        self.pattern.rows()
    }

    fn columns(&self) -> usize {
        self.pattern.columns()
    }

    fn pattern(&self) -> &Mask {
        &self.pattern
    }

    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn stepper(&self) -> usize {
        self.stepper
    }

    fn set_stepper(&mut self, step: usize) -> Vec<GridEvent> {
        self.stepper = step;
        vec![GridEvent::Step(step)]
    }

    fn key_change(&mut self, row: usize, column: usize, on: bool) -> Vec<GridEvent> {
        self.pattern.set(row, column, on);
        vec![GridEvent::Change { row, column, state: on }]
    }

    fn clear(&mut self) {
        self.pattern.clear();
    }
}

/// Decorator emitting `Toggle` events on actual pattern changes
#[derive(Debug, Clone)]
pub struct ToggleGrid<G: GridWidget> {
    inner: G,
}

impl<G: GridWidget> ToggleGrid<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: GridWidget> GridWidget for ToggleGrid<G> {
    fn rows(&self) -> usize {
        self.inner.rows()
    }

    fn columns(&self) -> usize {
        self.inner.columns()
    }

    fn pattern(&self) -> &Mask {
        self.inner.pattern()
    }

    fn size(&self) -> Size {
        self.inner.size()
    }

    fn resize(&mut self, size: Size) {
        self.inner.resize(size)
    }

    fn stepper(&self) -> usize {
        self.inner.stepper()
    }

    fn set_stepper(&mut self, step: usize) -> Vec<GridEvent> {
        self.inner.set_stepper(step)
    }

    fn key_change(&mut self, row: usize, column: usize, on: bool) -> Vec<GridEvent> {
        let mut events = Vec::new();
        if self.inner.pattern().get(row, column) != on {
            events.push(GridEvent::Toggle { row, column, state: on });
        }
        events.extend(self.inner.key_change(row, column, on));
        events
    }

    fn clear(&mut self) {
        self.inner.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ToggleGrid<StepGrid> {
        ToggleGrid::new(StepGrid::new(4, 8, Size { width: 800.0, height: 400.0 }))
    }

    #[test]
    fn test_toggle_only_on_actual_change() {
        let mut grid = grid();
        let events = grid.key_change(1, 2, true);
        assert_eq!(
            events,
            vec![
                GridEvent::Toggle { row: 1, column: 2, state: true },
                GridEvent::Change { row: 1, column: 2, state: true },
            ]
        );
        let events = grid.key_change(1, 2, true);
        assert_eq!(events, vec![GridEvent::Change { row: 1, column: 2, state: true }]);
    }

    #[test]
    fn test_cell_geometry() {
        let grid = grid();
        assert_eq!(grid.cell_at(150.0, 120.0), Some((1, 1)));
        assert_eq!(grid.cell_at(801.0, 10.0), None);
        let rect = grid.cell_rect(3, 7).unwrap();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (700.0, 300.0, 100.0, 100.0));
    }
}
