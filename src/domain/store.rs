use super::{Grid, kernel};
use crate::error::{EngineError, EngineResult};

/// GridStore owns the two ping-pong buffers.
///
/// Exactly one buffer is current (readable, displayable); the other is the
/// write target of the next kernel pass. Swapping is an index flip, so no
/// buffer is ever read and written in the same pass.
#[derive(Clone, Debug)]
pub struct GridStore {
    buffers: [Grid; 2],
    current: usize,
}

impl GridStore {
    /// Two zeroed buffers of `width * height` cells
    pub fn allocate(width: usize, height: usize) -> EngineResult<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        Ok(Self {
            buffers: [Grid::new(width, height), Grid::new(width, height)],
            current: 0,
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.buffers[0].dimensions()
    }

    /// Copy a prepared grid into both buffers, so either side can become
    /// current without diverging.
    pub fn load(&mut self, grid: &Grid) -> EngineResult<()> {
        if grid.dimensions() != self.dimensions() {
            let (width, height) = grid.dimensions();
            return Err(EngineError::InvalidDimensions { width, height });
        }
        self.buffers
            .iter_mut()
            .for_each(|buffer| buffer.raw_mut().copy_from_slice(grid.raw()));
        Ok(())
    }

    /// Zero both buffers and make buffer 0 current
    pub fn clear(&mut self) {
        self.buffers.iter_mut().for_each(Grid::clear);
        self.current = 0;
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Grid {
        &self.buffers[self.current]
    }

    /// Read view of current and write view of next, never aliased
    fn split(&mut self) -> (&Grid, &mut Grid) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Run one kernel pass into the next buffer, then swap
    pub fn tick(&mut self, parallel: bool) {
        let (current, next) = self.split();
        if parallel {
            kernel::evolve_into_parallel(current, next);
        } else {
            kernel::evolve_into(current, next);
        }
        self.swap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellRecord;

    fn blinker() -> Grid {
        let mut alive = vec![false; 25];
        for x in 1..4 {
            alive[2 * 5 + x] = true;
        }
        Grid::from_alive(5, 5, &alive)
    }

    #[test]
    fn test_allocate_rejects_empty() {
        assert!(matches!(
            GridStore::allocate(0, 4),
            Err(EngineError::InvalidDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_load_fills_both_buffers() {
        let mut store = GridStore::allocate(5, 5).unwrap();
        store.load(&blinker()).unwrap();
        assert_eq!(store.current(), &blinker());
        store.swap();
        assert_eq!(store.current(), &blinker());
    }

    #[test]
    fn test_load_rejects_mismatched_grid() {
        let mut store = GridStore::allocate(4, 4).unwrap();
        assert!(store.load(&blinker()).is_err());
    }

    #[test]
    fn test_tick_swaps_and_reads_previous_output() {
        let mut store = GridStore::allocate(5, 5).unwrap();
        store.load(&blinker()).unwrap();

        store.tick(false);
        assert_eq!(store.current_index(), 1);
        assert!(store.current().get(2, 1).is_some_and(CellRecord::is_alive));
        assert!(!store.current().get(1, 2).is_some_and(CellRecord::is_alive));

        store.tick(true);
        assert_eq!(store.current_index(), 0);
        let alive: Vec<_> = store
            .current()
            .iter_cells()
            .filter(|(_, _, c)| c.is_alive())
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(alive, vec![(1, 2), (2, 2), (3, 2)]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = GridStore::allocate(5, 5).unwrap();
        store.load(&blinker()).unwrap();
        store.tick(true);

        store.clear();
        let first = store.clone();
        store.clear();

        assert_eq!(store.current_index(), 0);
        assert_eq!(store.current(), first.current());
        assert_eq!(store.current().population(), 0);
        store.swap();
        assert_eq!(store.current().population(), 0);
    }
}
