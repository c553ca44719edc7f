//! Fixed-timestep scheduling.
//!
//! Wall-clock time is read once per rendered frame through a [`Clock`] and
//! poured into an accumulator. The main loop then drains the accumulator in
//! constant `fixed_dt_us` slices:
//!
//!   1. `begin_frame(&clock)` -- measure the delta since the previous frame
//!   2. `while should_step()` -- run one simulation tick per fixed slice
//!   3. `end_frame()` -- derive the interpolation alpha from the remainder
//!
//! All bookkeeping is integer microseconds so the number of ticks executed for
//! a given sequence of clock readings is exact: the remainder is carried into
//! the next frame, never dropped and never counted twice.

use std::cell::Cell;
use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Default simulation step (~60 Hz).
pub const DEFAULT_FIXED_DT_US: u64 = 16_667;

/// Monotonic time source, in microseconds since the clock was created.
pub trait Clock {
    fn now_us(&self) -> u64;
}

/// `Instant`-backed clock used by the running game.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Hand-driven clock for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_us(&self, dt_us: u64) {
        self.now_us.set(self.now_us.get() + dt_us);
    }

    pub fn advance_ms(&self, dt_ms: u64) {
        self.advance_us(dt_ms * 1000);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}

pub struct TimeState {
    pub fixed_dt_us: u64,
    /// Spiral-of-death cap on a single frame's delta. `None` keeps every
    /// microsecond, which is what the determinism guarantees rely on.
    pub max_frame_us: Option<u64>,
    accumulator_us: u64,
    last_reading_us: u64,
    pub total_time_us: u64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt_us: u64,
    pub interpolation_alpha: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new(fixed_dt_us: u64) -> Self {
        assert!(fixed_dt_us > 0, "fixed_dt_us must be > 0");
        let fixed_dt_secs = fixed_dt_us as f64 / 1_000_000.0;
        Self {
            fixed_dt_us,
            max_frame_us: None,
            accumulator_us: 0,
            last_reading_us: 0,
            total_time_us: 0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt_us: 0,
            interpolation_alpha: 0.0,
            fps_samples: [fixed_dt_secs; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / fixed_dt_secs,
            smoothed_frame_time_ms: fixed_dt_secs * 1000.0,
        }
    }

    /// Fixed step in seconds, as handed to the integrator.
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt_us as f32 / 1_000_000.0
    }

    pub fn accumulator_us(&self) -> u64 {
        self.accumulator_us
    }

    /// Read the clock and feed the elapsed time since the previous reading.
    pub fn begin_frame(&mut self, clock: &impl Clock) {
        let now = clock.now_us();
        let elapsed = now.saturating_sub(self.last_reading_us);
        self.last_reading_us = now;
        self.advance(elapsed);
    }

    /// Feed an already-measured frame delta into the accumulator.
    pub fn advance(&mut self, elapsed_us: u64) {
        self.real_dt_us = elapsed_us;

        if let Some(cap) = self.max_frame_us {
            if self.real_dt_us > cap {
                log::warn!(
                    "Frame took {:.1}ms, capping accumulator input to {:.1}ms",
                    self.real_dt_us as f64 / 1000.0,
                    cap as f64 / 1000.0
                );
                self.real_dt_us = cap;
            }
        }

        self.accumulator_us += self.real_dt_us;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        // FPS smoothing
        let real_dt_secs = self.real_dt_us as f64 / 1_000_000.0;
        self.fps_samples[self.fps_sample_index] = real_dt_secs;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator_us >= self.fixed_dt_us {
            self.accumulator_us -= self.fixed_dt_us;
            self.total_time_us += self.fixed_dt_us;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator_us as f64 / self.fixed_dt_us as f64;
    }

    /// Drop pending time without simulating it. Used while the simulation is
    /// paused so resuming does not replay the paused interval.
    pub fn discard_pending(&mut self) {
        self.accumulator_us = 0;
    }

    /// Feed one frame and run `step` once per fixed slice. Returns the number
    /// of ticks executed.
    pub fn run_frame(&mut self, clock: &impl Clock, mut step: impl FnMut(u64)) -> u32 {
        self.begin_frame(clock);
        while self.should_step() {
            step(self.fixed_dt_us);
        }
        self.end_frame();
        self.steps_this_frame
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_DT_US)
    }
}
