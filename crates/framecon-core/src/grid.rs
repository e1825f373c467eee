#![forbid(unsafe_code)]

//! Console grid: 2D cell matrix.
//!
//! Cells are stored in row-major order in a flat `Vec<Cell>` and addressed by
//! `(col, row)` to match the `(x, y)` convention of change notifications.

use crate::cell::{Attribute, Cell};

#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    cols: u16,
    rows: u16,
}

impl Grid {
    /// Create a new grid filled with default (blank) cells.
    pub fn new(cols: u16, rows: u16) -> Self {
        let len = (cols as usize) * (rows as usize);
        Self {
            cells: vec![Cell::default(); len],
            cols,
            rows,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Cell at `(col, row)`, or `None` if out of bounds.
    pub fn cell(&self, col: u16, row: u16) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            Some(&self.cells[self.index(col, row)])
        } else {
            None
        }
    }

    pub fn cell_mut(&mut self, col: u16, row: u16) -> Option<&mut Cell> {
        if row < self.rows && col < self.cols {
            let idx = self.index(col, row);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Cells of one row, or `None` if `row` is out of bounds.
    #[cfg(test)]
    fn row_cells(&self, row: u16) -> Option<&[Cell]> {
        if row < self.rows {
            let start = (row as usize) * (self.cols as usize);
            Some(&self.cells[start..start + self.cols as usize])
        } else {
            None
        }
    }

    /// Blank every cell with `attr`.
    pub fn erase_all(&mut self, attr: Attribute) {
        for cell in &mut self.cells {
            cell.erase(attr);
        }
    }

    /// Blank one row with `attr`.
    pub fn erase_row(&mut self, row: u16, attr: Attribute) {
        if row >= self.rows {
            return;
        }
        let start = (row as usize) * (self.cols as usize);
        for cell in &mut self.cells[start..start + self.cols as usize] {
            cell.erase(attr);
        }
    }

    /// Scroll rows `[top, bottom)` up by `count`, blanking the vacated rows
    /// at the bottom with `attr`.
    pub fn scroll_up(&mut self, top: u16, bottom: u16, count: u16, attr: Attribute) {
        let top = top.min(self.rows);
        let bottom = bottom.min(self.rows);
        if top >= bottom || count == 0 {
            return;
        }
        let count = count.min(bottom - top);
        let cols = self.cols as usize;

        let src_start = (top + count) as usize * cols;
        let dst_start = top as usize * cols;
        let move_len = (bottom - top - count) as usize * cols;
        self.cells
            .copy_within(src_start..src_start + move_len, dst_start);

        for row in (bottom - count)..bottom {
            self.erase_row(row, attr);
        }
    }

    #[inline]
    fn index(&self, col: u16, row: u16) -> usize {
        (row as usize) * (self.cols as usize) + (col as usize)
    }
}
