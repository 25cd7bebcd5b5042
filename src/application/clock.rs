//! Simulation clock and the frame-driven scheduler.
//!
//! The display calls `on_frame` once per refresh. The scheduler decides
//! whether that frame also runs a kernel pass; rendering happens either way.

pub const MIN_TICK_RATE: f64 = 1.0;
pub const MAX_TICK_RATE: f64 = 120.0;

/// Wall time between tick-rate diagnostics
const DIAGNOSTIC_WINDOW_MS: f64 = 2000.0;

/// Clamp a requested rate into the supported 1..=120 ticks/s
pub fn clamp_tick_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return MIN_TICK_RATE;
    }
    rate.clamp(MIN_TICK_RATE, MAX_TICK_RATE)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationClock {
    pub generation: u64,
    pub target_rate: f64,
    pub last_tick_ms: f64,
}

impl SimulationClock {
    pub fn new(target_rate: f64) -> Self {
        Self {
            generation: 0,
            target_rate: clamp_tick_rate(target_rate),
            last_tick_ms: 0.0,
        }
    }

    /// Milliseconds between ticks at the target rate
    pub fn interval_ms(&self) -> f64 {
        1000.0 / self.target_rate
    }
}

/// Parameters the running loop depends on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerParams {
    pub tick_rate: f64,
}

/// Handle for the active frame-callback registration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopRegistration {
    id: u64,
}

impl LoopRegistration {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// What the current display frame should do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDecision {
    /// No loop is registered; neither tick nor render
    Unregistered,
    RenderOnly,
    /// Run one kernel pass, then render
    Tick,
}

#[derive(Clone, Debug, Default)]
struct TickDiagnostics {
    window_start_ms: f64,
    ticks: u32,
}

impl TickDiagnostics {
    fn record(&mut self, now_ms: f64, ticked: bool, target_rate: f64) {
        if ticked {
            self.ticks += 1;
        }
        if self.window_start_ms == 0.0 {
            self.window_start_ms = now_ms;
            return;
        }
        let elapsed = now_ms - self.window_start_ms;
        if elapsed >= DIAGNOSTIC_WINDOW_MS {
            let seconds = elapsed / 1000.0;
            log::debug!(
                "actual tick rate: {:.1} ticks/sec (target: {} ticks/sec), {} ticks in {:.1}s",
                self.ticks as f64 / seconds,
                target_rate,
                self.ticks,
                seconds
            );
            self.window_start_ms = now_ms;
            self.ticks = 0;
        }
    }
}

/// Scheduler gates kernel passes on play state and elapsed wall time.
///
/// `reconfigure` tears down the current registration and creates a new one,
/// so at most one frame loop is ever live.
#[derive(Clone, Debug)]
pub struct Scheduler {
    clock: SimulationClock,
    playing: bool,
    registration: Option<LoopRegistration>,
    next_registration: u64,
    diagnostics: TickDiagnostics,
}

impl Scheduler {
    pub fn new(params: SchedulerParams) -> Self {
        Self {
            clock: SimulationClock::new(params.tick_rate),
            playing: false,
            registration: None,
            next_registration: 1,
            diagnostics: TickDiagnostics::default(),
        }
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn generation(&self) -> u64 {
        self.clock.generation
    }

    pub fn tick_rate(&self) -> f64 {
        self.clock.target_rate
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn registration(&self) -> Option<LoopRegistration> {
        self.registration
    }

    /// Register the frame loop. Any previous registration is replaced.
    pub fn start(&mut self) -> LoopRegistration {
        self.stop();
        let registration = LoopRegistration { id: self.next_registration };
        self.next_registration += 1;
        self.registration = Some(registration);
        log::debug!("frame loop registered (#{})", registration.id);
        registration
    }

    /// Drop the frame loop registration. Later frames are ignored.
    pub fn stop(&mut self) {
        if let Some(old) = self.registration.take() {
            log::debug!("frame loop unregistered (#{})", old.id);
        }
    }

    /// Apply new loop parameters and restart the registration
    pub fn reconfigure(&mut self, params: SchedulerParams) -> LoopRegistration {
        let rate = clamp_tick_rate(params.tick_rate);
        if rate != self.clock.target_rate {
            log::info!("tick rate changed: {} -> {} ticks/sec", self.clock.target_rate, rate);
        }
        self.clock.target_rate = rate;
        self.start()
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    /// Manual stepping is only allowed while paused
    pub fn can_step(&self) -> bool {
        !self.playing
    }

    /// Decide what this display frame does. Advances `last_tick_ms` with
    /// the remainder kept, so ticks don't drift against wall time.
    pub fn on_frame(&mut self, now_ms: f64) -> FrameDecision {
        if self.registration.is_none() {
            return FrameDecision::Unregistered;
        }

        let mut decision = FrameDecision::RenderOnly;
        if self.playing {
            let elapsed = now_ms - self.clock.last_tick_ms;
            let interval = self.clock.interval_ms();
            if elapsed >= interval {
                self.clock.last_tick_ms = now_ms - elapsed % interval;
                decision = FrameDecision::Tick;
            }
        }

        self.diagnostics
            .record(now_ms, decision == FrameDecision::Tick, self.clock.target_rate);
        decision
    }

    /// Count one executed kernel pass
    pub fn complete_tick(&mut self) {
        self.clock.generation += 1;
    }

    /// Generation back to 0 (clear or reseed)
    pub fn reset(&mut self) {
        self.clock.generation = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(rate: f64) -> Scheduler {
        let mut scheduler = Scheduler::new(SchedulerParams { tick_rate: rate });
        scheduler.start();
        scheduler.play();
        scheduler
    }

    #[test]
    fn test_rate_is_clamped() {
        assert_eq!(SimulationClock::new(0.0).target_rate, 1.0);
        assert_eq!(SimulationClock::new(500.0).target_rate, 120.0);
        assert_eq!(clamp_tick_rate(f64::NAN), 1.0);
    }

    #[test]
    fn test_half_interval_does_not_tick() {
        let mut scheduler = running(1.0);
        assert_eq!(scheduler.on_frame(1000.0), FrameDecision::Tick);
        assert_eq!(scheduler.on_frame(1500.0), FrameDecision::RenderOnly);
        assert_eq!(scheduler.on_frame(2000.0), FrameDecision::Tick);
        assert_eq!(scheduler.on_frame(2999.0), FrameDecision::RenderOnly);
    }

    #[test]
    fn test_long_gap_ticks_once() {
        let mut scheduler = running(1.0);
        scheduler.on_frame(1000.0);
        // 3.5 intervals pass in one frame: still exactly one tick
        assert_eq!(scheduler.on_frame(4500.0), FrameDecision::Tick);
        assert_eq!(scheduler.on_frame(4600.0), FrameDecision::RenderOnly);
    }

    #[test]
    fn test_tick_phase_is_preserved() {
        let mut scheduler = running(10.0);
        scheduler.on_frame(1000.0);
        assert_eq!(scheduler.clock().last_tick_ms, 1000.0);
        // 130ms elapsed at a 100ms interval keeps the 30ms remainder
        assert_eq!(scheduler.on_frame(1130.0), FrameDecision::Tick);
        assert!((scheduler.clock().last_tick_ms - 1100.0).abs() < 1e-9);
        assert_eq!(scheduler.on_frame(1200.0), FrameDecision::Tick);
    }

    #[test]
    fn test_paused_only_renders() {
        let mut scheduler = running(60.0);
        scheduler.pause();
        for t in 1..50 {
            assert_eq!(scheduler.on_frame(t as f64 * 1000.0), FrameDecision::RenderOnly);
        }
        assert_eq!(scheduler.generation(), 0);
    }

    #[test]
    fn test_unregistered_does_nothing() {
        let mut scheduler = running(60.0);
        scheduler.stop();
        assert_eq!(scheduler.on_frame(10_000.0), FrameDecision::Unregistered);
    }

    #[test]
    fn test_reconfigure_replaces_registration() {
        let mut scheduler = running(30.0);
        let first = scheduler.registration().unwrap();
        let second = scheduler.reconfigure(SchedulerParams { tick_rate: 200.0 });
        assert_ne!(first, second);
        assert_eq!(scheduler.registration(), Some(second));
        assert_eq!(scheduler.tick_rate(), 120.0);
        assert!(scheduler.is_playing());
    }

    #[test]
    fn test_step_gate_and_generation() {
        let mut scheduler = running(30.0);
        assert!(!scheduler.can_step());
        scheduler.toggle();
        assert!(scheduler.can_step());

        scheduler.complete_tick();
        scheduler.complete_tick();
        assert_eq!(scheduler.generation(), 2);
        scheduler.reset();
        assert_eq!(scheduler.generation(), 0);
    }
}
