//! Time profiling (component O), grounded on the original's `pprofiler.h`
//! stopwatch contract (`start`/`elapsed_usecs`/`reset`) over
//! `std::time::Instant` rather than a hand-rolled high-resolution clock.

use std::time::{Duration, Instant};

pub struct Profiler {
    started_at: Instant,
}

impl Profiler {
    pub fn start() -> Self {
        Profiler { started_at: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn elapsed_usecs(&self) -> u64 {
        self.elapsed().as_micros() as u64
    }

    pub fn elapsed_msecs(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn reset(&mut self) {
        self.started_at = Instant::now();
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonically_non_decreasing() {
        let profiler = Profiler::start();
        let first = profiler.elapsed_usecs();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = profiler.elapsed_usecs();
        assert!(second >= first);
    }

    #[test]
    fn reset_restarts_the_clock() {
        let mut profiler = Profiler::start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        profiler.reset();
        assert!(profiler.elapsed_usecs() < 5_000);
    }
}
