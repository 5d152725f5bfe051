//! Owner clock estimation.
//!
//! Receivers play back in the owner's time base. The offset between owner
//! timestamps and the local clock is averaged over a sliding window so tick
//! aliasing and latency jitter do not show up as playback jitter.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::config::SyncConfig;

/// External clock synchronization, used instead of the running average
/// when it has an answer.
pub trait ClockSource {
    /// Seconds to add to the local clock to get owner time.
    fn owner_time_offset(&self) -> Option<f32>;
}

/// A clock source with a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedOffset(pub f32);

impl ClockSource for FixedOffset {
    fn owner_time_offset(&self) -> Option<f32> {
        Some(self.0)
    }
}

/// Sliding-window average of `owner timestamp - local time`.
#[derive(Debug, Clone)]
pub struct OwnerClock {
    samples: VecDeque<f32>,
    window: NonZeroUsize,
    sum: f64,
}

impl OwnerClock {
    #[must_use]
    pub fn new(window: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(window.get()),
            window,
            sum: 0.0,
        }
    }

    /// Clock sized by [`SyncConfig::clock_window`].
    #[must_use]
    pub fn with_config(config: &SyncConfig) -> Self {
        Self::new(config.clock_window())
    }

    #[must_use]
    pub const fn window_len(&self) -> NonZeroUsize {
        self.window
    }

    /// Records one sample, evicting the oldest once the window is full.
    pub fn record(&mut self, owner_timestamp: f32, local_time: f32) {
        if self.samples.len() >= self.window.get() {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= f64::from(oldest);
            }
        }
        let offset = owner_timestamp - local_time;
        self.samples.push_back(offset);
        self.sum += f64::from(offset);
    }

    /// Mean offset, zero before the first sample.
    #[must_use]
    pub fn average_offset(&self) -> f32 {
        if self.samples.is_empty() {
            0.0
        } else {
            (self.sum / self.samples.len() as f64) as f32
        }
    }

    /// Estimated owner time, preferring `source` when it has an offset.
    #[must_use]
    pub fn owner_time(&self, local_time: f32, source: Option<&dyn ClockSource>) -> f32 {
        let offset = source
            .and_then(|source| source.owner_time_offset())
            .unwrap_or_else(|| self.average_offset());
        local_time + offset
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(window: usize) -> OwnerClock {
        OwnerClock::new(NonZeroUsize::new(window).unwrap())
    }

    #[test]
    fn empty_offset_is_zero() {
        let clock = clock(4);
        assert_eq!(clock.average_offset(), 0.0);
        assert_eq!(clock.owner_time(3.0, None), 3.0);
    }

    #[test]
    fn averages_window() {
        let mut clock = clock(3);
        clock.record(10.0, 9.0);
        clock.record(10.0, 7.0);
        assert!((clock.average_offset() - 2.0).abs() < 1e-6);
        clock.record(10.0, 10.0);
        clock.record(10.0, 10.0);
        // Window now holds 3, 0, 0.
        assert_eq!(clock.len(), 3);
        assert!((clock.average_offset() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clock_source_overrides_average() {
        let mut clock = clock(2);
        clock.record(5.0, 1.0);
        assert_eq!(clock.owner_time(1.0, None), 5.0);
        let source = FixedOffset(0.5);
        assert_eq!(clock.owner_time(1.0, Some(&source)), 1.5);
    }

    #[test]
    fn clear_resets() {
        let mut clock = OwnerClock::with_config(&SyncConfig::default());
        assert_eq!(clock.window_len().get(), 60);
        clock.record(3.0, 1.0);
        clock.clear();
        assert!(clock.is_empty());
        assert_eq!(clock.average_offset(), 0.0);
    }
}
