mod camera;
mod clock;
mod life_view;

pub use camera::{Camera, Viewport};
pub use clock::{
    FrameDecision, LoopRegistration, MAX_TICK_RATE, MIN_TICK_RATE, Scheduler, SchedulerParams,
    SimulationClock, clamp_tick_rate,
};
pub use life_view::{Command, FrameReport, LifeView, ParamChange};
