//! Consumer-gated publisher
//!
//! Wraps an [`Outlet`] with the two operations the acquisition pipeline
//! needs:
//!
//! - [`ConsumerGatedPublisher::await_consumer`] blocks until somebody is
//!   listening, so no tracked frame is produced for nobody.
//! - [`ConsumerGatedPublisher::publish`] hands one sample to the outlet and
//!   returns immediately. Consumers may come and go afterwards; delivery is
//!   best effort.

use super::outlet_trait::Outlet;
use std::time::Duration;

/// Counters for published samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    /// Samples accepted by the outlet
    pub published: u64,
    /// Samples the outlet rejected
    pub failed: u64,
    /// Consumer polls that timed out before the first consumer attached
    pub consumer_polls: u64,
}

/// Publisher that only starts once a consumer is attached
pub struct ConsumerGatedPublisher<O: Outlet> {
    outlet: O,
    stats: PublisherStats,
}

impl<O: Outlet> ConsumerGatedPublisher<O> {
    /// Wrap an outlet
    pub fn new(outlet: O) -> Self {
        Self {
            outlet,
            stats: PublisherStats::default(),
        }
    }

    /// Block until at least one consumer is attached
    ///
    /// Polls the outlet every `poll_interval` and never gives up.
    pub fn await_consumer(&mut self, poll_interval: Duration) {
        tracing::info!("Waiting for recorder");
        while !self.outlet.wait_for_consumers(poll_interval) {
            self.stats.consumer_polls += 1;
            tracing::debug!(
                "No consumer after {} polls of {:?}",
                self.stats.consumer_polls,
                poll_interval
            );
        }
        tracing::info!("Consumer attached, now sending data");
    }

    /// Send one sample to every attached consumer
    ///
    /// Never blocks on consumers and never fails; rejected samples are
    /// logged and counted.
    pub fn publish(&mut self, sample: &[f32]) {
        match self.outlet.push_sample(sample) {
            Ok(()) => self.stats.published += 1,
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!("Dropped sample: {}", e);
            }
        }
    }

    /// Whether at least one consumer is attached right now
    pub fn has_consumers(&mut self) -> bool {
        self.outlet.have_consumers()
    }

    /// Publishing statistics
    pub fn stats(&self) -> PublisherStats {
        self.stats
    }

    /// Access the wrapped outlet
    pub fn outlet(&self) -> &O {
        &self.outlet
    }

    /// Unwrap the outlet
    pub fn into_inner(self) -> O {
        self.outlet
    }
}
