/// Bit 0 of a packed record: the cell's life state.
pub const ALIVE_BIT: u32 = 1;

/// Neighborhood bits start right above the life bit.
pub const NEIGHBORHOOD_SHIFT: u32 = 1;

/// CellRecord is the unit stored in every grid buffer.
///
/// A live cell remembers which of its 8 neighbors were alive when it was
/// produced; the renderer uses that as a color key. Dead cells carry nothing,
/// so their packed form is always exactly 0.
///
/// Neighbor bit order (bit 0 of the mask first): top-left, top, top-right,
/// left, right, bottom-left, bottom, bottom-right.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct CellRecord {
    alive: bool,
    neighborhood: u8,
}

impl CellRecord {
    pub const DEAD: Self = Self {
        alive: false,
        neighborhood: 0,
    };

    /// A live cell with the given cached neighborhood mask
    pub const fn alive(neighborhood: u8) -> Self {
        Self {
            alive: true,
            neighborhood,
        }
    }

    pub const fn is_alive(self) -> bool {
        self.alive
    }

    /// Cached neighborhood mask (always 0 for dead cells)
    pub const fn neighborhood(self) -> u8 {
        self.neighborhood
    }

    /// Pack into the transport format used by the grid buffers and the GPU
    pub const fn pack(self) -> u32 {
        if self.alive {
            ALIVE_BIT | ((self.neighborhood as u32) << NEIGHBORHOOD_SHIFT)
        } else {
            0
        }
    }

    /// Unpack a buffer word. Any word with bit 0 clear decodes as dead.
    pub const fn unpack(raw: u32) -> Self {
        if raw & ALIVE_BIT == 0 {
            Self::DEAD
        } else {
            Self::alive(((raw >> NEIGHBORHOOD_SHIFT) & 0xFF) as u8)
        }
    }

    /// Conway B3/S23 transition.
    ///
    /// `neighbors` is the alive mask of the 8 surrounding cells; only its
    /// population matters for the rule, but a surviving or newborn cell keeps
    /// the mask as its color key.
    pub const fn evolve(self, neighbors: u8) -> Self {
        match (self.alive, neighbors.count_ones()) {
            (true, 2 | 3) | (false, 3) => Self::alive(neighbors),
            _ => Self::DEAD,
        }
    }
}
