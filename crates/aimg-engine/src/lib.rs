/// Frame conversion engine and the video scheduling loop for ascii-image.
///
/// `init` publishes the process-wide resources (glyph ramp, font atlas);
/// `ConversionEngine` runs sampler → mapper → renderer for one frame;
/// `VideoScheduler` re-runs it at the configured frame rate.
pub mod engine;
pub mod scheduler;

pub use engine::{
    Conversion, ConversionEngine, EngineOptions, EngineResources, init, resources, teardown,
};
pub use scheduler::{
    Phase, ScheduleState, SchedulerStats, TickContext, TickOutcome, TickReport, TimerToken,
    VideoScheduler,
};
