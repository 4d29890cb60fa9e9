/// Boolean rows x columns matrix of cells selected for regeneration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    rows: usize,
    columns: usize,
    cells: Vec<bool>,
}

impl Mask {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![false; rows * columns],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> bool {
        self.offset(row, column).map(|i| self.cells[i]).unwrap_or(false)
    }

    /// Set a cell, returning its previous state
    pub fn set(&mut self, row: usize, column: usize, state: bool) -> bool {
        match self.offset(row, column) {
            Some(i) => std::mem::replace(&mut self.cells[i], state),
            None => false,
        }
    }

    /// Flip a cell, returning its new state
    pub fn toggle(&mut self, row: usize, column: usize) -> bool {
        let state = !self.get(row, column);
        self.set(row, column, state);
        state
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    /// `(row, column)` of every selected cell, row-major
    pub fn active_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c)
            .map(|(i, _)| (i / self.columns, i % self.columns))
            .collect()
    }

    /// 0/1 rows, as sent to the generation server
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        if self.columns == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells
            .chunks(self.columns)
            .map(|row| row.iter().map(|&c| c as u8).collect())
            .collect()
    }

    fn offset(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.rows && column < self.columns).then(|| row * self.columns + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_operations() {
        let mut mask = Mask::new(2, 3);
        assert!(mask.is_empty());
        assert!(!mask.set(0, 2, true));
        assert!(mask.toggle(1, 0));
        assert!(!mask.toggle(0, 2));
        assert_eq!(mask.active_cells(), vec![(1, 0)]);
        assert_eq!(mask.to_rows(), vec![vec![0, 0, 0], vec![1, 0, 0]]);
        mask.clear();
        assert!(mask.is_empty());
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut mask = Mask::new(1, 1);
        assert!(!mask.set(3, 3, true));
        assert!(!mask.get(3, 3));
        assert!(mask.is_empty());
    }
}
