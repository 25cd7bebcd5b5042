use rand::SeedableRng;
use rand::rngs::StdRng;

use super::camera::{Camera, Viewport};
use super::clock::{FrameDecision, Scheduler, SchedulerParams, clamp_tick_rate};
use crate::backend::ComputeBackend;
use crate::config::{Config, clamp_density};
use crate::domain::{Grid, Motif, Seed};
use crate::error::{EngineError, EngineResult};
use crate::rendering::{ColorMode, Projector};

/// User commands from buttons and keys
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Play,
    Pause,
    TogglePlay,
    /// One tick; ignored while playing
    Step,
    /// Zero the grid, pause, generation back to 0
    Clear,
    /// Reseed with a motif, or randomly at the current density
    Reseed(Option<Motif>),
}

/// Parameter changes applied without a reset
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamChange {
    TickRate(f64),
    ColorMode(ColorMode),
    /// Only affects future random reseeds
    Density(f64),
}

/// What one display frame did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub ticked: bool,
    pub generation: u64,
}

/// LifeView orchestrates one mounted simulation.
///
/// It owns the backend (and through it both grid buffers), the scheduler
/// and the camera. Input only reaches grid data through `Command::Clear`
/// and `Command::Reseed`.
pub struct LifeView {
    backend: Option<Box<dyn ComputeBackend>>,
    scheduler: Scheduler,
    camera: Camera,
    viewport: Viewport,
    dimensions: (usize, usize),
    base_cell_size: f32,
    color_mode: ColorMode,
    density: f64,
    seed: Seed,
    rng: StdRng,
    device_failures: u64,
}

impl LifeView {
    /// Allocate buffers for `viewport`, upload the initial seed and register
    /// the frame loop.
    pub fn mount(
        mut backend: Box<dyn ComputeBackend>,
        viewport: Viewport,
        config: &Config,
    ) -> EngineResult<Self> {
        let base_cell_size = config.base_cell_size.max(1.0);
        let (width, height) = viewport.grid_dimensions(base_cell_size);
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let seed = config.initial_seed();

        backend.allocate(width, height)?;
        backend.upload(&seed.generate(width, height, &mut rng))?;

        let mut scheduler = Scheduler::new(SchedulerParams {
            tick_rate: config.tick_rate,
        });
        scheduler.start();

        log::info!(
            "mounted {width}x{height} grid on {} seeded with {}",
            backend.name(),
            seed.name()
        );

        Ok(Self {
            backend: Some(backend),
            scheduler,
            camera: Camera::new(width, height, viewport.device_pixel_ratio, base_cell_size),
            viewport,
            dimensions: (width, height),
            base_cell_size,
            color_mode: config.color_mode,
            density: config.density,
            seed,
            rng,
            device_failures: 0,
        })
    }

    /// Release the backend and its buffers and unregister the frame loop
    pub fn unmount(&mut self) {
        self.scheduler.stop();
        if let Some(backend) = self.backend.take() {
            log::info!("unmounted {} backend", backend.name());
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.backend.is_some()
    }

    fn backend_mut(&mut self) -> EngineResult<&mut Box<dyn ComputeBackend>> {
        self.backend.as_mut().ok_or(EngineError::NotMounted)
    }

    /// Per-frame entry point. Runs at most one tick; device failures are
    /// logged and counted, never returned.
    pub fn frame(&mut self, now_ms: f64) -> EngineResult<FrameReport> {
        if self.backend.is_none() {
            return Err(EngineError::NotMounted);
        }

        let ticked = match self.scheduler.on_frame(now_ms) {
            FrameDecision::Unregistered => return Err(EngineError::NotMounted),
            FrameDecision::RenderOnly => false,
            FrameDecision::Tick => self.run_tick()?,
        };

        let polled = self.backend_mut()?.poll();
        self.absorb(polled);

        Ok(FrameReport {
            ticked,
            generation: self.scheduler.generation(),
        })
    }

    /// One kernel pass. Generation only advances when the dispatch went out.
    fn run_tick(&mut self) -> EngineResult<bool> {
        let dispatched = self.backend_mut()?.dispatch();
        let ok = dispatched.is_ok();
        self.absorb(dispatched);
        if ok {
            self.scheduler.complete_tick();
        }
        Ok(ok)
    }

    /// Swallow a per-frame device failure
    fn absorb(&mut self, result: EngineResult<()>) {
        if let Err(e) = result {
            self.device_failures += 1;
            log::warn!("frame {}: {e}", self.scheduler.generation());
        }
    }

    pub fn command(&mut self, command: Command) -> EngineResult<()> {
        match command {
            Command::Play => self.scheduler.play(),
            Command::Pause => self.scheduler.pause(),
            Command::TogglePlay => self.scheduler.toggle(),
            Command::Step => {
                if self.scheduler.can_step() {
                    self.run_tick()?;
                } else {
                    log::debug!("step ignored while playing");
                }
            }
            Command::Clear => {
                self.backend_mut()?.clear()?;
                self.scheduler.pause();
                self.scheduler.reset();
                log::info!("grid cleared");
            }
            Command::Reseed(motif) => {
                self.seed = match motif {
                    Some(motif) => Seed::Motif(motif),
                    None => Seed::Random {
                        density: self.density,
                    },
                };
                self.reseed()?;
            }
        }
        Ok(())
    }

    /// Upload a fresh fill of the current seed; generation back to 0
    fn reseed(&mut self) -> EngineResult<()> {
        let (width, height) = self.dimensions;
        let grid = self.seed.generate(width, height, &mut self.rng);
        self.backend_mut()?.upload(&grid)?;
        self.scheduler.reset();
        log::info!("reseeded {width}x{height} with {}", self.seed.name());
        Ok(())
    }

    pub fn set_param(&mut self, change: ParamChange) {
        match change {
            ParamChange::TickRate(rate) => {
                self.scheduler.reconfigure(SchedulerParams {
                    tick_rate: clamp_tick_rate(rate),
                });
            }
            ParamChange::ColorMode(mode) => {
                if mode != self.color_mode {
                    log::info!("color mode: {}", mode.name());
                }
                self.color_mode = mode;
            }
            ParamChange::Density(density) => self.density = clamp_density(density),
        }
    }

    /// Reallocate for a new viewport and reseed. Camera recenters.
    ///
    /// A size the backend rejects leaves the old grid in place and running.
    /// The viewport is still recorded, so the same size isn't retried every
    /// frame.
    pub fn resize(&mut self, viewport: Viewport) -> EngineResult<()> {
        if viewport == self.viewport {
            return Ok(());
        }
        self.viewport = viewport;
        self.camera.set_device_pixel_ratio(viewport.device_pixel_ratio);

        let dimensions = viewport.grid_dimensions(self.base_cell_size);
        let result = if dimensions != self.dimensions {
            self.reallocate(dimensions)
        } else {
            Ok(())
        };

        let (width, height) = self.dimensions;
        self.camera.resize(width, height);
        result
    }

    fn reallocate(&mut self, (width, height): (usize, usize)) -> EngineResult<()> {
        self.backend_mut()?.allocate(width, height)?;
        self.dimensions = (width, height);
        log::info!("resized grid to {width}x{height}");
        self.reseed()
    }

    /// Drag by a screen-pixel delta
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.camera.pan(dx, dy);
    }

    /// One wheel event, positive delta zooms in
    pub fn wheel(&mut self, delta_y: f32) {
        self.camera.zoom_wheel(delta_y);
    }

    /// Back to the grid center at fit zoom
    pub fn recenter(&mut self) {
        let (width, height) = self.dimensions;
        self.camera.resize(width, height);
    }

    pub fn generation(&self) -> u64 {
        self.scheduler.generation()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    pub fn zoom(&self) -> f32 {
        self.camera.zoom
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn tick_rate(&self) -> f64 {
        self.scheduler.tick_rate()
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn device_failures(&self) -> u64 {
        self.device_failures
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or("none", |backend| backend.name())
    }

    /// Host-visible current buffer
    pub fn current(&self) -> Option<&Grid> {
        self.backend.as_ref().and_then(|backend| backend.current())
    }

    pub fn population(&self) -> usize {
        self.current().map_or(0, Grid::population)
    }

    pub fn projector(&self) -> Projector {
        Projector::new(self.viewport, self.color_mode)
    }
}

impl Drop for LifeView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use std::cell::Cell;
    use std::rc::Rc;

    /// CPU backend whose dispatch and poll fail while `failing` is set
    struct FlakyBackend {
        inner: CpuBackend,
        failing: Rc<Cell<bool>>,
        /// Widest grid `allocate` accepts
        max_width: usize,
    }

    impl FlakyBackend {
        fn fault(&self) -> EngineResult<()> {
            if self.failing.get() {
                Err(EngineError::DeviceOperation("device lost".to_owned()))
            } else {
                Ok(())
            }
        }
    }

    impl ComputeBackend for FlakyBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn allocate(&mut self, width: usize, height: usize) -> EngineResult<()> {
            if width > self.max_width {
                return Err(EngineError::DeviceOperation(format!("{width} columns over the limit")));
            }
            self.inner.allocate(width, height)
        }

        fn upload(&mut self, grid: &Grid) -> EngineResult<()> {
            self.inner.upload(grid)
        }

        fn dispatch(&mut self) -> EngineResult<()> {
            self.fault()?;
            self.inner.dispatch()
        }

        fn clear(&mut self) -> EngineResult<()> {
            self.inner.clear()
        }

        fn poll(&mut self) -> EngineResult<()> {
            self.fault()
        }

        fn current(&self) -> Option<&Grid> {
            self.inner.current()
        }
    }

    fn config() -> Config {
        Config {
            rng_seed: Some(11),
            tick_rate: 1.0,
            ..Config::default()
        }
    }

    fn mount(width: f32, height: f32) -> LifeView {
        LifeView::mount(
            Box::new(CpuBackend::new(true)),
            Viewport::new(width, height, 1.0),
            &config(),
        )
        .unwrap()
    }

    #[test]
    fn test_mount_sizes_grid_from_viewport() {
        let view = mount(64.0, 48.0);
        assert_eq!(view.dimensions(), (64, 48));
        assert_eq!(view.generation(), 0);
        assert!(view.population() > 0);
        assert!(!view.is_playing());
    }

    #[test]
    fn test_generation_counts_ticks_and_resets_on_reseed() {
        let mut view = mount(32.0, 32.0);
        view.command(Command::Play).unwrap();

        let mut expected = 0;
        for second in 1..=5 {
            let report = view.frame(second as f64 * 1000.0).unwrap();
            assert!(report.ticked);
            expected += 1;
            assert_eq!(report.generation, expected);
            // Half an interval later nothing happens
            let report = view.frame(second as f64 * 1000.0 + 500.0).unwrap();
            assert!(!report.ticked);
            assert_eq!(report.generation, expected);
        }

        view.command(Command::Reseed(Some(Motif::Glider))).unwrap();
        assert_eq!(view.generation(), 0);
        assert_eq!(view.population(), 6);
        assert!(view.is_playing());
    }

    #[test]
    fn test_step_only_while_paused() {
        let mut view = mount(16.0, 16.0);
        view.command(Command::Step).unwrap();
        assert_eq!(view.generation(), 1);

        view.command(Command::Play).unwrap();
        view.command(Command::Step).unwrap();
        assert_eq!(view.generation(), 1);
    }

    #[test]
    fn test_clear_twice_is_identical() {
        let mut view = mount(20.0, 20.0);
        view.command(Command::Play).unwrap();
        view.frame(1000.0).unwrap();

        view.command(Command::Clear).unwrap();
        let first = view.current().cloned();
        assert_eq!(view.generation(), 0);
        assert!(!view.is_playing());

        view.command(Command::Clear).unwrap();
        assert_eq!(view.current().cloned(), first);
        assert_eq!(view.generation(), 0);
        assert_eq!(view.population(), 0);
    }

    #[test]
    fn test_color_toggle_leaves_grid_untouched() {
        let mut view = mount(24.0, 24.0);
        view.command(Command::Step).unwrap();
        let before = view.current().cloned();

        let mode = view.color_mode();
        view.set_param(ParamChange::ColorMode(mode.toggled()));
        view.set_param(ParamChange::ColorMode(mode));

        assert_eq!(view.current().cloned(), before);
        assert_eq!(view.color_mode(), mode);
        assert_eq!(view.generation(), 1);
    }

    #[test]
    fn test_density_only_affects_next_random_reseed() {
        let mut view = mount(50.0, 50.0);
        let before = view.current().cloned();
        view.set_param(ParamChange::Density(200.0));
        assert_eq!(view.density(), 80.0);
        assert_eq!(view.current().cloned(), before);

        view.command(Command::Reseed(None)).unwrap();
        assert_eq!(view.seed(), Seed::Random { density: 80.0 });
    }

    #[test]
    fn test_tick_rate_reconfigures_loop() {
        let mut view = mount(8.0, 8.0);
        view.set_param(ParamChange::TickRate(500.0));
        assert_eq!(view.tick_rate(), 120.0);
        assert!(view.frame(0.0).is_ok());
    }

    #[test]
    fn test_resize_reallocates_and_reseeds_last_seed() {
        let mut view = mount(30.0, 30.0);
        view.command(Command::Reseed(Some(Motif::RPentomino))).unwrap();
        view.command(Command::Step).unwrap();

        view.resize(Viewport::new(40.0, 20.0, 1.0)).unwrap();
        assert_eq!(view.dimensions(), (40, 20));
        assert_eq!(view.generation(), 0);
        assert_eq!(view.population(), 5);
        assert_eq!((view.camera().x, view.camera().y), (20.0, 10.0));
    }

    #[test]
    fn test_camera_input_never_touches_grid() {
        let mut view = mount(40.0, 40.0);
        let before = view.current().cloned();
        view.pan(13.0, -7.0);
        for _ in 0..30 {
            view.wheel(80.0);
        }
        assert_eq!(view.current().cloned(), before);
        view.recenter();
        assert_eq!(view.zoom(), 1.0);
    }

    #[test]
    fn test_device_failures_are_counted_and_swallowed() {
        let failing = Rc::new(Cell::new(true));
        let backend = FlakyBackend {
            inner: CpuBackend::new(false),
            failing: Rc::clone(&failing),
            max_width: usize::MAX,
        };
        let mut view =
            LifeView::mount(Box::new(backend), Viewport::new(16.0, 16.0, 1.0), &config()).unwrap();
        view.command(Command::Play).unwrap();
        let before = view.current().cloned();

        // Failed dispatch and failed poll: frame still succeeds, nothing advances
        let report = view.frame(1000.0).unwrap();
        assert!(!report.ticked);
        assert_eq!(report.generation, 0);
        assert_eq!(view.device_failures(), 2);
        assert_eq!(view.current().cloned(), before);

        let report = view.frame(2000.0).unwrap();
        assert!(!report.ticked);
        assert_eq!(view.device_failures(), 4);

        // Step while paused fails the same way
        view.command(Command::Pause).unwrap();
        view.command(Command::Step).unwrap();
        assert_eq!(view.generation(), 0);
        assert_eq!(view.device_failures(), 5);

        // Device recovers: the loop picks up on the next interval
        failing.set(false);
        view.command(Command::Play).unwrap();
        let report = view.frame(3000.0).unwrap();
        assert!(report.ticked);
        assert_eq!(report.generation, 1);
        assert_eq!(view.device_failures(), 5);
    }

    #[test]
    fn test_rejected_resize_keeps_running_old_grid() {
        let backend = FlakyBackend {
            inner: CpuBackend::new(false),
            failing: Rc::new(Cell::new(false)),
            max_width: 32,
        };
        let mut view =
            LifeView::mount(Box::new(backend), Viewport::new(16.0, 16.0, 1.0), &config()).unwrap();
        view.command(Command::Reseed(Some(Motif::Glider))).unwrap();

        let wide = Viewport::new(64.0, 16.0, 1.0);
        assert!(matches!(view.resize(wide), Err(EngineError::DeviceOperation(_))));
        assert_eq!(view.dimensions(), (16, 16));
        assert_eq!(view.population(), 6);
        assert_eq!((view.camera().x, view.camera().y), (8.0, 8.0));

        // Not retried for the same viewport, and the loop still ticks
        assert!(view.resize(wide).is_ok());
        view.command(Command::Play).unwrap();
        assert!(view.frame(1000.0).unwrap().ticked);
        assert_eq!(view.generation(), 1);

        view.resize(Viewport::new(24.0, 24.0, 1.0)).unwrap();
        assert_eq!(view.dimensions(), (24, 24));
        assert_eq!(view.generation(), 0);
    }

    #[test]
    fn test_unmounted_view_refuses_frames() {
        let mut view = mount(10.0, 10.0);
        view.unmount();
        assert!(!view.is_mounted());
        assert!(matches!(view.frame(1000.0), Err(EngineError::NotMounted)));
        assert!(matches!(view.command(Command::Clear), Err(EngineError::NotMounted)));
        assert_eq!(view.backend_name(), "none");
    }
}
