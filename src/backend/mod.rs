//! Where the rule kernel runs.
//!
//! `LifeView` drives a `ComputeBackend` without knowing whether the two
//! buffers live on the GPU or in host memory.

use crate::domain::{Grid, GridStore};
use crate::error::{EngineError, EngineResult};

/// Owner of the two ping-pong grid buffers and the kernel that advances them
pub trait ComputeBackend {
    /// Short label for the stats panel and logs
    fn name(&self) -> &'static str;

    /// (Re)create both buffers, zero-filled, at the given size
    fn allocate(&mut self, width: usize, height: usize) -> EngineResult<()>;

    /// Write the same seeded grid into both buffers
    fn upload(&mut self, grid: &Grid) -> EngineResult<()>;

    /// One kernel pass from current into next, then swap
    fn dispatch(&mut self) -> EngineResult<()>;

    /// Zero both buffers and make buffer 0 current
    fn clear(&mut self) -> EngineResult<()>;

    /// Drive pending asynchronous work. Never blocks.
    fn poll(&mut self) -> EngineResult<()> {
        Ok(())
    }

    /// Host-visible copy of the current buffer, if allocated. May lag the
    /// device by a tick while a readback is in flight.
    fn current(&self) -> Option<&Grid>;
}

/// Kernel on the CPU, rows fanned out over rayon when `parallel` is set
#[derive(Debug, Default)]
pub struct CpuBackend {
    store: Option<GridStore>,
    parallel: bool,
}

impl CpuBackend {
    pub fn new(parallel: bool) -> Self {
        Self {
            store: None,
            parallel,
        }
    }

    fn store_mut(&mut self) -> EngineResult<&mut GridStore> {
        self.store.as_mut().ok_or(EngineError::NotMounted)
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        if self.parallel { "CPU (rayon)" } else { "CPU" }
    }

    fn allocate(&mut self, width: usize, height: usize) -> EngineResult<()> {
        self.store = Some(GridStore::allocate(width, height)?);
        log::debug!("cpu buffers allocated: {width}x{height}");
        Ok(())
    }

    fn upload(&mut self, grid: &Grid) -> EngineResult<()> {
        self.store_mut()?.load(grid)
    }

    fn dispatch(&mut self) -> EngineResult<()> {
        let parallel = self.parallel;
        self.store_mut()?.tick(parallel);
        Ok(())
    }

    fn clear(&mut self) -> EngineResult<()> {
        self.store_mut()?.clear();
        Ok(())
    }

    fn current(&self) -> Option<&Grid> {
        self.store.as_ref().map(GridStore::current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unallocated_backend_reports_not_mounted() {
        let mut backend = CpuBackend::new(true);
        assert!(backend.current().is_none());
        assert!(matches!(backend.dispatch(), Err(EngineError::NotMounted)));
        assert!(matches!(backend.clear(), Err(EngineError::NotMounted)));
    }

    #[test]
    fn test_dispatch_advances_blinker() {
        let mut backend = CpuBackend::new(false);
        backend.allocate(5, 5).unwrap();
        let mut alive = vec![false; 25];
        for y in 1..4 {
            alive[y * 5 + 2] = true;
        }
        backend.upload(&Grid::from_alive(5, 5, &alive)).unwrap();

        backend.dispatch().unwrap();
        backend.poll().unwrap();
        let current = backend.current().unwrap();
        assert!(current.is_alive(1, 2) && current.is_alive(2, 2) && current.is_alive(3, 2));
        assert_eq!(current.population(), 3);
    }

    #[test]
    fn test_allocate_rejects_zero_size() {
        let mut backend = CpuBackend::new(true);
        assert!(backend.allocate(0, 0).is_err());
    }
}
