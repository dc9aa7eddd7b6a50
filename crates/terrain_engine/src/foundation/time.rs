//! Time management utilities
//!
//! The simulation never reads the wall clock itself: every update receives an
//! elapsed time from the caller. [`FrameClock`] produces those elapsed times
//! for a fixed-step loop, [`Stopwatch`] measures real time for diagnostics.

use std::time::{Duration, Instant};

/// Upper bound on one simulation step, in seconds
pub const MAX_FRAME_TIME: f32 = 0.25;

/// Fixed-step clock driving the simulation
///
/// Real frame times are accumulated and handed out as whole steps, so the
/// game logic sees the same `dt` on every tick.
#[derive(Debug, Clone)]
pub struct FrameClock {
    step: f32,
    accumulator: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameClock {
    /// Create a clock producing steps of `step` seconds
    pub fn new(step: f32) -> Self {
        Self {
            step: step.max(f32::EPSILON),
            accumulator: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Create a clock stepping at `hz` ticks per second
    pub fn from_rate(hz: f32) -> Self {
        Self::new(1.0 / hz.max(1.0))
    }

    /// Feed elapsed real time, returning how many steps are due
    ///
    /// Large hitches are capped at [`MAX_FRAME_TIME`] so a stalled frame does
    /// not trigger a long burst of catch-up steps.
    pub fn accumulate(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_TIME);

        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            self.total_time += self.step;
            self.frame_count += 1;
            steps += 1;
        }
        steps
    }

    /// Duration of one step in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Simulated time since creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of steps handed out
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Restart the stopwatch from zero
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.start();
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_clock_hands_out_whole_steps() {
        let mut clock = FrameClock::new(0.1);

        assert_eq!(clock.accumulate(0.05), 0);
        assert_eq!(clock.accumulate(0.16), 2);
        assert_eq!(clock.frame_count(), 2);
        assert_relative_eq!(clock.total_time(), 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_frame_clock_caps_hitches() {
        let mut clock = FrameClock::new(0.125);

        assert_eq!(clock.accumulate(10.0), 2);
        assert_eq!(clock.accumulate(0.0), 0);
    }

    #[test]
    fn test_stopwatch_stopped_does_not_advance() {
        let mut stopwatch = Stopwatch::new();
        assert!(stopwatch.elapsed() == Duration::ZERO);

        stopwatch.start();
        stopwatch.stop();
        let frozen = stopwatch.elapsed();
        assert!(stopwatch.elapsed() == frozen);
    }
}
