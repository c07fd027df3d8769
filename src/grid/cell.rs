//! Grid cell geometry
//!
//! A `Cell` is an axis-aligned rectangle measured in grid units, not pixels.
//! It occupies the half-open range `[col, right)` x `[row, bottom)`.

use serde::{Deserialize, Serialize};

/// Rectangle in grid units (column, row, width, height)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
    pub w: i32,
    pub h: i32,
}

impl Default for Cell {
    fn default() -> Self {
        Self::unit(0, 0)
    }
}

impl Cell {
    /// Create a cell spanning `w` x `h` grid units
    pub const fn new(col: i32, row: i32, w: i32, h: i32) -> Self {
        Self { col, row, w, h }
    }

    /// Create a 1x1 cell
    pub const fn unit(col: i32, row: i32) -> Self {
        Self::new(col, row, 1, 1)
    }

    /// The all-zero sentinel used for "no selection"
    pub const fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn left(&self) -> i32 {
        self.col
    }

    /// Saturates at `i32::MAX` for cells read from a corrupt file
    pub fn right(&self) -> i32 {
        self.col.saturating_add(self.w)
    }

    pub fn top(&self) -> i32 {
        self.row
    }

    pub fn bottom(&self) -> i32 {
        self.row.saturating_add(self.h)
    }

    /// Number of unit cells covered
    pub fn area(&self) -> i32 {
        self.w.max(0).saturating_mul(self.h.max(0))
    }

    /// True if both rectangles share a region of nonzero area.
    ///
    /// Symmetric: containment in either direction counts, shared edges don't.
    pub fn overlaps(&self, other: &Cell) -> bool {
        if self.area() == 0 || other.area() == 0 {
            return false;
        }
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// True if the point (in grid units) lies inside the cell
    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.left() && col < self.right() && row >= self.top() && row < self.bottom()
    }

    /// True if `self` lies completely inside a `cols` x `rows` grid
    pub fn fits_in(&self, cols: i32, rows: i32) -> bool {
        if self.col < 0 || self.row < 0 || self.w <= 0 || self.h <= 0 {
            return false;
        }
        match (self.col.checked_add(self.w), self.row.checked_add(self.h)) {
            (Some(right), Some(bottom)) => right <= cols && bottom <= rows,
            _ => false,
        }
    }

    /// Smallest rectangle covering both corner cells.
    ///
    /// Used for drag selections, so the result has positive extent no matter
    /// which direction the drag went.
    pub fn span(start: &Cell, end: &Cell) -> Cell {
        let col = start.left().min(end.left());
        let row = start.top().min(end.top());
        let w = start.right().max(end.right()).saturating_sub(col);
        let h = start.bottom().max(end.bottom()).saturating_sub(row);
        Cell::new(col, row, w.saturating_abs(), h.saturating_abs())
    }

    /// Iterate the unit cells covered by this rectangle, row by row
    pub fn unit_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (col, w) = (self.col, self.w.max(0));
        (self.row..self.row.saturating_add(self.h.max(0)))
            .flat_map(move |row| (col..col.saturating_add(w)).map(move |c| Cell::unit(c, row)))
    }

    pub fn clear(&mut self) {
        *self = Self::zero();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::zero()
    }
}
