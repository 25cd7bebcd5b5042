use std::fmt;
use std::str::FromStr;

use super::Grid;
use rand::Rng;

/// Fixed motifs the seed library can place on an empty grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Motif {
    Glider,
    Pulsar,
    GosperGun,
    Pentadecathlon,
    LightweightSpaceship,
    RPentomino,
}

impl Motif {
    pub const ALL: [Motif; 6] = [
        Motif::Glider,
        Motif::Pulsar,
        Motif::GosperGun,
        Motif::Pentadecathlon,
        Motif::LightweightSpaceship,
        Motif::RPentomino,
    ];

    /// Display name for UI
    pub fn name(self) -> &'static str {
        match self {
            Motif::Glider => "Glider",
            Motif::Pulsar => "Pulsar",
            Motif::GosperGun => "Gosper Gun",
            Motif::Pentadecathlon => "Pentadecathlon",
            Motif::LightweightSpaceship => "Spaceship",
            Motif::RPentomino => "R-pentomino",
        }
    }

    /// Short key used on the command line
    pub fn key(self) -> &'static str {
        match self {
            Motif::Glider => "glider",
            Motif::Pulsar => "pulsar",
            Motif::GosperGun => "gosper",
            Motif::Pentadecathlon => "pentadecathlon",
            Motif::LightweightSpaceship => "spaceship",
            Motif::RPentomino => "rpentomino",
        }
    }

    /// Live cells as (dx, dy) offsets from the grid center
    pub fn offsets(self) -> Vec<(i32, i32)> {
        let (ax, ay) = self.anchor();
        self.cells().iter().map(|&(x, y)| (x - ax, y - ay)).collect()
    }

    /// Where the motif's own coordinate origin sits relative to the center
    fn anchor(self) -> (i32, i32) {
        match self {
            // Drawn from its bounding-box corner; centered horizontally and
            // placed five rows above the middle.
            Motif::GosperGun => (18, 5),
            _ => (0, 0),
        }
    }

    fn cells(self) -> &'static [(i32, i32)] {
        match self {
            Motif::Glider => &[(1, -1), (-1, 0), (0, 0), (1, 0), (0, 1), (1, 1)],
            Motif::Pulsar => &[
                // Top
                (-6, -4), (-6, -3), (-6, -2), (-1, -4), (-1, -3), (-1, -2),
                (1, -4), (1, -3), (1, -2), (6, -4), (6, -3), (6, -2),
                // Upper middle
                (-4, -6), (-3, -6), (-2, -6), (-4, -1), (-3, -1), (-2, -1),
                (2, -6), (3, -6), (4, -6), (2, -1), (3, -1), (4, -1),
                // Lower middle
                (-4, 1), (-3, 1), (-2, 1), (-4, 6), (-3, 6), (-2, 6),
                (2, 1), (3, 1), (4, 1), (2, 6), (3, 6), (4, 6),
                // Bottom
                (-6, 2), (-6, 3), (-6, 4), (-1, 2), (-1, 3), (-1, 4),
                (1, 2), (1, 3), (1, 4), (6, 2), (6, 3), (6, 4),
            ],
            Motif::GosperGun => &[
                // Left square
                (0, 4), (0, 5), (1, 4), (1, 5),
                // Left circle
                (10, 4), (10, 5), (10, 6), (11, 3), (11, 7), (12, 2), (12, 8),
                (13, 2), (13, 8), (14, 5), (15, 3), (15, 7), (16, 4), (16, 5),
                (16, 6), (17, 5),
                // Middle pieces
                (20, 2), (20, 3), (20, 4), (21, 2), (21, 3), (21, 4),
                (22, 1), (22, 5), (24, 0), (24, 1), (24, 5), (24, 6),
                // Right square
                (34, 2), (34, 3), (35, 2), (35, 3),
            ],
            Motif::Pentadecathlon => &[
                (-1, -4), (0, -4), (1, -4),
                (-1, -3), (1, -3),
                (-1, -2), (0, -2), (1, -2),
                (-1, -1), (0, -1), (1, -1),
                (-1, 0), (0, 0), (1, 0),
                (-1, 1), (0, 1), (1, 1),
                (-1, 2), (1, 2),
                (-1, 3), (0, 3), (1, 3),
            ],
            Motif::LightweightSpaceship => &[
                (0, -1), (1, -1), (2, -1), (3, -1),
                (-1, 0), (3, 0),
                (3, 1),
                (-1, 2), (2, 2),
            ],
            Motif::RPentomino => &[(0, -1), (1, -1), (-1, 0), (0, 0), (0, 1)],
        }
    }
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Motif {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Motif::ALL
            .into_iter()
            .find(|motif| motif.key() == key)
            .ok_or_else(|| format!("unknown motif '{s}'"))
    }
}

/// A named initial-condition generator
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Seed {
    /// Each cell alive independently with probability `density / 100`
    Random { density: f64 },
    /// A motif centered on the grid
    Motif(Motif),
}

impl Seed {
    pub fn name(&self) -> String {
        match self {
            Seed::Random { density } => format!("Random {density:.0}%"),
            Seed::Motif(motif) => motif.name().to_owned(),
        }
    }

    /// Alive flags for a `width * height` grid, row-major
    pub fn alive_cells<R: Rng + ?Sized>(&self, width: usize, height: usize, rng: &mut R) -> Vec<bool> {
        match *self {
            Seed::Random { density } => random_fill(width, height, density, rng),
            Seed::Motif(motif) => place_centered(&motif.offsets(), width, height).0,
        }
    }

    /// Full seeded grid with neighborhood masks precomputed
    pub fn generate<R: Rng + ?Sized>(&self, width: usize, height: usize, rng: &mut R) -> Grid {
        Grid::from_alive(width, height, &self.alive_cells(width, height, rng))
    }
}

/// Independent per-cell fill. The probability is taken as given: values
/// at or below 0 leave the grid empty, values at or above 100 fill it.
pub fn random_fill<R: Rng + ?Sized>(width: usize, height: usize, density: f64, rng: &mut R) -> Vec<bool> {
    let p = density / 100.0;
    (0..width * height).map(|_| rng.random::<f64>() < p).collect()
}

/// Place offsets around (width / 2, height / 2). Cells landing outside the
/// grid are dropped, not wrapped. Returns the flags and the dropped count.
pub fn place_centered(offsets: &[(i32, i32)], width: usize, height: usize) -> (Vec<bool>, usize) {
    let mut alive = vec![false; width * height];
    let (cx, cy) = ((width / 2) as i64, (height / 2) as i64);
    let mut dropped = 0;

    for &(dx, dy) in offsets {
        let (x, y) = (cx + dx as i64, cy + dy as i64);
        if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
            alive[y as usize * width + x as usize] = true;
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        log::debug!("dropped {dropped} motif cells outside {width}x{height} grid");
    }
    (alive, dropped)
}
