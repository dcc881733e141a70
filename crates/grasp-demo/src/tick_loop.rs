//! Fixed-timestep tracking loop.
//!
//! Interaction ticks run at the configured tracking rate no matter how long
//! each rendered frame takes. Frame time accumulates; every whole tick's worth
//! runs one interaction tick.

use tracing::warn;

/// Accumulator that turns variable frame times into fixed interaction ticks.
#[derive(Debug)]
pub struct TickLoop {
    tick_dt: f64,
    max_frame_time: f64,
    accumulator: f64,
    session_time: f64,
    frame_count: u64,
    tick_count: u64,
}

impl TickLoop {
    /// Loop running ticks of `tick_dt` seconds, clamping frames longer than
    /// `max_frame_time` so a stall does not trigger a burst of catch-up ticks.
    pub fn new(tick_dt: f64, max_frame_time: f64) -> Self {
        Self {
            tick_dt,
            max_frame_time,
            accumulator: 0.0,
            session_time: 0.0,
            frame_count: 0,
            tick_count: 0,
        }
    }

    /// Account for one frame of `frame_time` seconds, calling
    /// `tick_fn(tick_dt, session_time)` once per whole tick that fits.
    /// Returns how many ticks ran.
    pub fn frame(&mut self, frame_time: f64, mut tick_fn: impl FnMut(f64, f64)) -> u32 {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > self.max_frame_time {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                self.max_frame_time * 1000.0
            );
            frame_time = self.max_frame_time;
        }

        self.accumulator += frame_time;

        let mut ran = 0;
        while self.accumulator >= self.tick_dt {
            tick_fn(self.tick_dt, self.session_time);
            self.session_time += self.tick_dt;
            self.accumulator -= self.tick_dt;
            self.tick_count += 1;
            ran += 1;
        }

        self.frame_count += 1;
        ran
    }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / self.tick_dt
        } else {
            0.0
        }
    }

    /// Frames accounted so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Interaction ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated session time in seconds.
    pub fn session_time(&self) -> f64 {
        self.session_time
    }
}
