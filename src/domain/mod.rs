mod cell;
pub mod grid;
pub mod kernel;
mod patterns;
mod store;

pub use cell::{ALIVE_BIT, CellRecord, NEIGHBORHOOD_SHIFT};
pub use grid::Grid;
pub use patterns::{Motif, Seed, place_centered, random_fill};
pub use store::GridStore;
