//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Wall-clock accumulator for a fixed-rate tick.
///
/// Tracks elapsed time since the last fired tick and fires once the
/// accumulated duration crosses the configured step. The delta handed back
/// is the actual elapsed time, not the nominal step, so drift does not
/// cause over- or under-stepping.
pub struct FixedStep {
    step: Duration,
    last_tick: Instant,
}

impl FixedStep {
    /// Create an accumulator firing `rate` times per second
    pub fn from_rate(rate: f32) -> Self {
        Self {
            step: Duration::from_secs_f32(1.0 / rate),
            last_tick: Instant::now(),
        }
    }

    /// If a full step has accumulated, consume it and return the elapsed
    /// time in seconds; otherwise `None`
    pub fn tick(&mut self) -> Option<f32> {
        let elapsed = self.last_tick.elapsed();
        if elapsed >= self.step {
            self.last_tick = Instant::now();
            Some(elapsed.as_secs_f32())
        } else {
            None
        }
    }

    /// Time left until the next step is due (zero if already due)
    pub fn remaining(&self) -> Duration {
        self.step.saturating_sub(self.last_tick.elapsed())
    }

    /// The nominal step duration
    pub fn step(&self) -> Duration {
        self.step
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
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Get the elapsed time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.total_time() >= 0.0);
    }

    #[test]
    fn test_fixed_step_not_due_immediately() {
        let mut step = FixedStep::from_rate(1.0);
        assert!(step.tick().is_none());
        assert!(step.remaining() <= step.step());
    }

    #[test]
    fn test_fixed_step_fires_after_step() {
        let mut step = FixedStep::from_rate(1000.0);
        std::thread::sleep(Duration::from_millis(5));
        let dt = step.tick().expect("step should be due");
        // Actual elapsed time, not the nominal step
        assert!(dt >= 0.001);
    }

    #[test]
    fn test_stopwatch_accumulates() {
        let mut watch = Stopwatch::start_new();
        std::thread::sleep(Duration::from_millis(2));
        watch.stop();
        assert!(watch.elapsed() >= Duration::from_millis(2));
    }
}
