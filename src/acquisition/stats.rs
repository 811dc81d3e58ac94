//! Acquisition loop statistics

use crate::config::EmptyFramePolicy;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Size of the rolling window for recent cycle times
const RECENT_WINDOW_SIZE: usize = 100;

/// Counters and cycle latency of one acquisition run
///
/// Latency is measured from requesting a capture to handing the sample to the
/// publisher, in microseconds.
#[derive(Debug, Clone)]
pub struct AcquisitionStats {
    /// Completed cycles, including frames without a subject
    pub cycles: u64,
    /// Samples handed to the publisher
    pub published: u64,
    /// Frames without a subject
    pub empty_frames: u64,
    /// Total cycle time in microseconds
    pub total_cycle_time_us: u64,
    /// Minimum cycle time observed (microseconds)
    pub min_cycle_time_us: u64,
    /// Maximum cycle time observed (microseconds)
    pub max_cycle_time_us: u64,
    /// Rolling window of recent cycle times for jitter calculation
    pub recent_cycle_times: VecDeque<u64>,
}

impl Default for AcquisitionStats {
    fn default() -> Self {
        Self {
            cycles: 0,
            published: 0,
            empty_frames: 0,
            total_cycle_time_us: 0,
            min_cycle_time_us: u64::MAX,
            max_cycle_time_us: 0,
            recent_cycle_times: VecDeque::with_capacity(RECENT_WINDOW_SIZE),
        }
    }
}

impl AcquisitionStats {
    /// Record a completed cycle
    pub fn record_cycle(&mut self, elapsed: Duration) {
        let time_us = elapsed.as_micros().min(u64::MAX as u128) as u64;
        self.cycles += 1;
        self.total_cycle_time_us += time_us;
        self.min_cycle_time_us = self.min_cycle_time_us.min(time_us);
        self.max_cycle_time_us = self.max_cycle_time_us.max(time_us);

        self.recent_cycle_times.push_back(time_us);
        if self.recent_cycle_times.len() > RECENT_WINDOW_SIZE {
            self.recent_cycle_times.pop_front();
        }
    }

    /// Record a sample handed to the publisher
    pub fn record_published(&mut self) {
        self.published += 1;
    }

    /// Record a frame without a subject
    pub fn record_empty(&mut self, policy: EmptyFramePolicy) {
        self.empty_frames += 1;
        if policy == EmptyFramePolicy::Zeros {
            self.published += 1;
        }
    }

    /// Average cycle time in microseconds
    pub fn avg_cycle_time_us(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.total_cycle_time_us as f64 / self.cycles as f64
        }
    }

    /// Minimum cycle time, or 0 before the first cycle
    pub fn min_cycle_us(&self) -> u64 {
        if self.cycles == 0 {
            0
        } else {
            self.min_cycle_time_us
        }
    }

    /// Jitter (max - min) over the recent window in microseconds
    pub fn jitter_us(&self) -> u64 {
        let min = self.recent_cycle_times.iter().min().copied().unwrap_or(0);
        let max = self.recent_cycle_times.iter().max().copied().unwrap_or(0);
        max.saturating_sub(min)
    }

    /// Achieved cycle rate in Hz, from the average cycle time
    pub fn cycle_rate_hz(&self) -> f64 {
        let avg = self.avg_cycle_time_us();
        if avg <= 0.0 {
            0.0
        } else {
            1_000_000.0 / avg
        }
    }
}

impl fmt::Display for AcquisitionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles, {} published, {} empty, cycle avg {:.1}ms (min {:.1}ms, max {:.1}ms, jitter {:.1}ms), {:.1} Hz",
            self.cycles,
            self.published,
            self.empty_frames,
            self.avg_cycle_time_us() / 1000.0,
            self.min_cycle_us() as f64 / 1000.0,
            self.max_cycle_time_us as f64 / 1000.0,
            self.jitter_us() as f64 / 1000.0,
            self.cycle_rate_hz()
        )
    }
}
