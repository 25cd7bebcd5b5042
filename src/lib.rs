// Domain layer - packed cells, toroidal grid, rule kernel, seeds
pub mod domain;

// Application layer - camera, clock and the view orchestrator
pub mod application;

// Compute backends - CPU (rayon) and GPU (wgpu)
pub mod backend;
pub mod gpu;

// Infrastructure layer - UI, rendering, input
pub mod ui;
pub mod rendering;
pub mod input;

pub mod config;
pub mod error;

// Re-exports for convenience
pub use application::{Camera, Command, LifeView, ParamChange, Viewport};
pub use backend::{ComputeBackend, CpuBackend};
pub use config::{BackendKind, Config};
pub use domain::{CellRecord, Grid, Motif, Seed};
pub use error::{EngineError, EngineResult};
pub use gpu::{Capability, GpuBackend};
