use super::CellRecord;
use super::cell::ALIVE_BIT;

/// Offsets of the 8 Moore neighbors, in neighborhood-mask bit order.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Grid is a toroidal lattice of packed cell records.
/// Coordinates wrap unconditionally: (x mod width, y mod height).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl Grid {
    /// Create a new grid with all cells initially dead
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Build a grid from plain alive flags, deriving each live cell's
    /// neighborhood mask from the same flags.
    pub fn from_alive(width: usize, height: usize, alive: &[bool]) -> Self {
        debug_assert_eq!(alive.len(), width * height);
        let flags = Self {
            width,
            height,
            cells: alive.iter().map(|&a| a as u32).collect(),
        };

        let cells = flags
            .positions()
            .map(|(x, y)| {
                if flags.is_alive(x, y) {
                    CellRecord::alive(flags.neighborhood(x, y)).pack()
                } else {
                    0
                }
            })
            .collect();

        Self {
            width,
            height,
            cells,
        }
    }

    /// Get grid dimensions
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert 2D coordinates to 1D index
    const fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Index of a possibly out-of-range coordinate after toroidal wrapping
    pub fn wrapped_index(&self, x: isize, y: isize) -> usize {
        let wx = x.rem_euclid(self.width as isize) as usize;
        let wy = y.rem_euclid(self.height as isize) as usize;
        self.index(wx, wy)
    }

    /// Get cell at position (with bounds checking)
    pub fn get(&self, x: usize, y: usize) -> Option<CellRecord> {
        (x < self.width && y < self.height).then(|| CellRecord::unpack(self.cells[self.index(x, y)]))
    }

    /// Overwrite one packed word. Out-of-range writes are ignored.
    pub fn set_raw(&mut self, x: usize, y: usize, raw: u32) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = raw;
        }
    }

    /// False outside the grid
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[self.index(x, y)] & ALIVE_BIT != 0
    }

    /// Alive mask of the 8 wrapped neighbors of (x, y).
    /// Only bit 0 of each neighbor is read; cached masks are irrelevant.
    pub fn neighborhood(&self, x: usize, y: usize) -> u8 {
        NEIGHBOR_OFFSETS
            .iter()
            .enumerate()
            .fold(0u8, |mask, (bit, &(dx, dy))| {
                let idx = self.wrapped_index(x as isize + dx, y as isize + dy);
                mask | (((self.cells[idx] & ALIVE_BIT) as u8) << bit)
            })
    }

    /// Packed words in row-major order
    pub fn raw(&self) -> &[u32] {
        &self.cells
    }

    pub fn raw_mut(&mut self) -> &mut [u32] {
        &mut self.cells
    }

    /// Number of live cells
    pub fn population(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&raw| raw & ALIVE_BIT != 0)
            .count()
    }

    /// Clear all cells to dead state
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|raw| *raw = 0);
    }

    /// Row-major coordinates of every cell
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    /// Iterate over all cells with their positions
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, CellRecord)> + '_ {
        self.positions()
            .map(|(x, y)| (x, y, CellRecord::unpack(self.cells[self.index(x, y)])))
    }
}
