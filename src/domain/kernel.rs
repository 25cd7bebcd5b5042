//! The Conway rule kernel.
//!
//! Every output cell depends only on the current buffer, so one pass can
//! be split across threads freely. Output always goes to a separate buffer.

use super::{CellRecord, Grid};
use rayon::prelude::*;

/// Next packed word for (x, y), read from `current` only
#[inline]
pub fn next_cell(current: &Grid, x: usize, y: usize) -> u32 {
    let here = current.get(x, y).unwrap_or(CellRecord::DEAD);
    here.evolve(current.neighborhood(x, y)).pack()
}

/// One generation, cell by cell on the calling thread
pub fn evolve_into(current: &Grid, next: &mut Grid) {
    debug_assert_eq!(current.dimensions(), next.dimensions());
    let (width, _) = current.dimensions();
    if width == 0 {
        return;
    }

    next.raw_mut()
        .chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| fill_row(current, y, row));
}

/// One generation with rows fanned out over the rayon pool
pub fn evolve_into_parallel(current: &Grid, next: &mut Grid) {
    debug_assert_eq!(current.dimensions(), next.dimensions());
    let (width, _) = current.dimensions();
    if width == 0 {
        return;
    }

    next.raw_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| fill_row(current, y, row));
}

fn fill_row(current: &Grid, y: usize, row: &mut [u32]) {
    row.iter_mut()
        .enumerate()
        .for_each(|(x, out)| *out = next_cell(current, x, y));
}
