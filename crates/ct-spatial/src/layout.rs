//! Initial placement of a population inside the arena.
//!
//! A [`GridLayout`] fills cells row-major: agent `i` sits in row
//! `i / cols`, column `i % cols`.  Cell centres are `spacing` apart and the
//! first centre is at `origin`.

use ct_core::{Arena, Point, SimRng};

use crate::{SpatialError, SpatialResult};

// ── GridLayout ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridLayout {
    pub rows:    usize,
    pub cols:    usize,
    /// Distance between neighboring cell centres.
    pub spacing: f64,
    /// Centre of cell (0, 0).
    pub origin:  Point,
}

impl GridLayout {
    pub fn new(rows: usize, cols: usize, spacing: f64, origin: Point) -> Self {
        Self { rows, cols, spacing, origin }
    }

    /// The most square grid holding `count` agents that covers `arena`, with
    /// every cell centred inside it.
    pub fn square_for(count: usize, arena: Arena) -> Self {
        let count = count.max(1);
        let cols = (count as f64).sqrt().ceil() as usize;
        let rows = count.div_ceil(cols);
        let spacing = (arena.width / cols as f64).min(arena.height / rows as f64);
        let half = spacing / 2.0;
        Self { rows, cols, spacing, origin: Point::new(half, half) }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Centre of the cell at (`row`, `col`).
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> Point {
        Point::new(
            self.origin.x + col as f64 * self.spacing,
            self.origin.y + row as f64 * self.spacing,
        )
    }

    /// Cell centres for the first `count` cells, row-major.
    pub fn positions(&self, count: usize) -> SpatialResult<Vec<Point>> {
        if count > self.capacity() {
            return Err(SpatialError::LayoutTooSmall { count, capacity: self.capacity() });
        }
        Ok((0..count)
            .map(|i| self.cell_center(i / self.cols, i % self.cols))
            .collect())
    }

    /// Like [`positions`](Self::positions), with each agent moved uniformly
    /// at random within its own cell.
    pub fn jittered_positions(&self, count: usize, rng: &mut SimRng) -> SpatialResult<Vec<Point>> {
        let mut positions = self.positions(count)?;
        for p in &mut positions {
            p.x += (rng.random::<f64>() - 0.5) * self.spacing;
            p.y += (rng.random::<f64>() - 0.5) * self.spacing;
        }
        Ok(positions)
    }

    /// Whether every cell centre lies inside `arena`.
    pub fn fits(&self, arena: Arena) -> bool {
        if self.capacity() == 0 {
            return true;
        }
        let first = self.origin;
        let last = self.cell_center(self.rows - 1, self.cols - 1);
        arena.contains(first) && arena.contains(last)
    }
}

/// `count` positions drawn uniformly over the whole arena.
pub fn random_positions(count: usize, arena: Arena, rng: &mut SimRng) -> Vec<Point> {
    (0..count)
        .map(|_| Point::new(rng.random::<f64>() * arena.width, rng.random::<f64>() * arena.height))
        .collect()
}
