use std::time::{Duration, Instant};

use aimg_core::error::{CaptureError, ConvertError};
use aimg_core::traits::{RenderTarget, VideoSource};

use crate::engine::{Conversion, ConversionEngine};

/// Phase du timer auto-replanifié.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Créé, jamais lancé.
    Idle,
    /// Un tick est armé.
    Scheduled,
    /// Arrêté définitivement.
    Stopped,
}

/// État observable du scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleState {
    /// `1 / frame_rate`.
    pub target_interval: Duration,
    /// True while a tick is armed.
    pub running: bool,
    /// Last conversion error, cleared by the next successful conversion.
    pub last_error: Option<String>,
}

/// Jeton d'un tick armé. Périmé dès que le scheduler est arrêté.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken {
    generation: u64,
    due: Instant,
}

impl TimerToken {
    /// When the tick should fire.
    #[must_use]
    pub fn due(&self) -> Instant {
        self.due
    }

    /// Time left until `due`, zero if already due.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }
}

/// Everything one tick needs, borrowed for its duration.
pub struct TickContext<'a> {
    pub engine: &'a ConversionEngine,
    pub source: &'a mut dyn VideoSource,
    pub input: &'a mut dyn RenderTarget,
    pub output: &'a mut dyn RenderTarget,
    pub max_output_size: u32,
}

/// Ce qu'a fait un tick.
#[derive(Debug, PartialEq)]
pub enum TickOutcome {
    /// Frame converted and drawn.
    Converted(Conversion),
    /// Video paused or ended: nothing converted, surfaces untouched.
    Skipped,
    /// Expected capture failure (seek, restart), ignored.
    SwallowedFault,
    /// Unexpected capture failure, logged.
    CaptureFailed(CaptureError),
    /// Conversion failed; the message is in `last_error`.
    Failed(ConvertError),
    /// Stale token or scheduler not running: no work done.
    Cancelled,
}

/// Result of [`VideoScheduler::fire`].
#[derive(Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Next armed tick; `None` only when cancelled.
    pub next: Option<TimerToken>,
}

/// Compteurs pour la ligne de statut.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub converted: u64,
    pub skipped: u64,
    pub faults: u64,
    pub last_convert: Option<Duration>,
}

/// Timer vidéo : convertit la frame courante toutes les `1 / frame_rate` s.
///
/// `Idle → Scheduled → Stopped`. Chaque tick armé est un [`TimerToken`] ;
/// `stop()` incrémente la génération et périme tous les jetons en cours.
/// L'intervalle est compté à partir de la *fin* du tick précédent.
///
/// # Example
/// ```
/// use std::time::Instant;
/// use aimg_engine::VideoScheduler;
///
/// let mut s = VideoScheduler::new(24.0).unwrap();
/// assert!((s.interval().as_secs_f64() * 1000.0 - 41.67).abs() < 0.01);
/// let now = Instant::now();
/// let token = s.play(now).unwrap();
/// assert_eq!(token.due(), now);
/// assert!(s.play(now).is_none());
/// s.stop();
/// assert!(!s.state().running);
/// ```
#[derive(Debug)]
pub struct VideoScheduler {
    phase: Phase,
    state: ScheduleState,
    generation: u64,
    stats: SchedulerStats,
}

impl VideoScheduler {
    /// # Errors
    /// [`ConvertError::InvalidConfig`] if `frame_rate` is not finite or `<= 0`.
    pub fn new(frame_rate: f64) -> Result<Self, ConvertError> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "frame rate must be a positive number, got {frame_rate}"
            )));
        }
        let interval = Duration::try_from_secs_f64(1.0 / frame_rate).map_err(|e| {
            ConvertError::InvalidConfig(format!("frame rate {frame_rate} unusable: {e}"))
        })?;
        Ok(Self {
            phase: Phase::Idle,
            state: ScheduleState {
                target_interval: interval,
                running: false,
                last_error: None,
            },
            generation: 0,
            stats: SchedulerStats::default(),
        })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.state.target_interval
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Arm the first tick, due at `now`. `None` if already running or stopped.
    pub fn play(&mut self, now: Instant) -> Option<TimerToken> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Scheduled;
                self.state.running = true;
                log::info!(
                    "Scheduler démarré : {:.2} ms par frame",
                    self.interval().as_secs_f64() * 1000.0
                );
                Some(self.token(now))
            }
            Phase::Scheduled => {
                log::debug!("play() ignoré : déjà armé");
                None
            }
            Phase::Stopped => {
                log::debug!("play() ignoré : scheduler arrêté");
                None
            }
        }
    }

    /// Stop for good. Outstanding tokens become stale.
    pub fn stop(&mut self) {
        if self.phase != Phase::Stopped {
            log::info!(
                "Scheduler arrêté après {} ticks ({} converties)",
                self.stats.ticks,
                self.stats.converted
            );
        }
        self.phase = Phase::Stopped;
        self.state.running = false;
        self.generation += 1;
    }

    /// Whether `token` would still do work if fired.
    #[must_use]
    pub fn is_current(&self, token: &TimerToken) -> bool {
        self.phase == Phase::Scheduled && token.generation == self.generation
    }

    fn token(&self, due: Instant) -> TimerToken {
        TimerToken {
            generation: self.generation,
            due,
        }
    }

    /// Run the tick for `token` and arm the next one.
    pub fn fire(&mut self, token: TimerToken, ctx: TickContext<'_>) -> TickReport {
        if !self.is_current(&token) {
            return TickReport {
                outcome: TickOutcome::Cancelled,
                next: None,
            };
        }
        self.stats.ticks += 1;
        let outcome = self.tick(ctx);
        let next = self.token(Instant::now() + self.state.target_interval);
        TickReport {
            outcome,
            next: Some(next),
        }
    }

    fn tick(&mut self, ctx: TickContext<'_>) -> TickOutcome {
        if ctx.source.is_paused() || ctx.source.is_ended() {
            self.stats.skipped += 1;
            return TickOutcome::Skipped;
        }

        let frame = match ctx.source.capture_frame() {
            Ok(frame) => frame,
            Err(CaptureError::Transient(reason)) => {
                log::trace!("Capture ignorée : {reason}");
                return TickOutcome::SwallowedFault;
            }
            Err(err) => {
                log::error!("{err}");
                self.stats.faults += 1;
                return TickOutcome::CaptureFailed(err);
            }
        };

        let started = Instant::now();
        let result = ctx
            .engine
            .convert(&frame, ctx.input, ctx.output, ctx.max_output_size);
        self.stats.last_convert = Some(started.elapsed());

        match result {
            Ok(conversion) => {
                self.stats.converted += 1;
                self.state.last_error = None;
                TickOutcome::Converted(conversion)
            }
            Err(err) => {
                log::warn!("Conversion échouée : {err}");
                self.state.last_error = Some(err.to_string());
                TickOutcome::Failed(err)
            }
        }
    }
}
