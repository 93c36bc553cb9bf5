//! Frame timing
//!
//! [`Timer`] yields the per-frame delta that scales camera steps and the day
//! clock. Interactive hosts call [`Timer::update`]; headless runs feed fixed
//! steps through [`Timer::advance`]. [`Stopwatch`] measures wall time spent
//! in a block of work.

use std::time::{Duration, Instant};

/// Per-frame delta and running totals
#[derive(Debug, Clone)]
pub struct Timer {
    last_tick: Instant,
    delta: Duration,
    total: Duration,
    frames: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Timer starting now with no frames counted
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: Duration::ZERO,
            total: Duration::ZERO,
            frames: 0,
        }
    }

    /// Close the current frame using the wall clock
    pub fn update(&mut self) {
        let now = Instant::now();
        self.advance(now - self.last_tick);
        self.last_tick = now;
    }

    /// Close the current frame as if `step` had elapsed
    pub fn advance(&mut self, step: Duration) {
        self.delta = step;
        self.total += step;
        self.frames += 1;
    }

    /// Length of the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Sum of all frame lengths in seconds
    pub fn total_time(&self) -> f32 {
        self.total.as_secs_f32()
    }

    /// Frames closed so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Frames per second averaged over the whole run
    pub fn average_fps(&self) -> f32 {
        let total = self.total_time();
        if total > 0.0 {
            self.frames as f32 / total
        } else {
            0.0
        }
    }
}

/// Accumulating wall-clock stopwatch
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    /// Stopped stopwatch at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or restart the current lap
    pub fn start(&mut self) {
        self.running_since = Some(Instant::now());
    }

    /// End the current lap and return its length
    pub fn stop(&mut self) -> Duration {
        let lap = self.running_since.take().map_or(Duration::ZERO, |since| since.elapsed());
        self.accumulated += lap;
        lap
    }

    /// Back to zero, stopped
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// All laps plus the running one
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |since| since.elapsed())
    }

    /// [`Stopwatch::elapsed`] in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Whether a lap is in progress
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}
