//! Stream transport traits
//!
//! A transport turns a [`StreamInfo`] into an [`Outlet`]. The outlet is the
//! publish side of the stream: it reports whether anyone is listening and
//! accepts samples without waiting for them to be delivered.

use super::metadata::StreamInfo;
use crate::error::Result;
use std::time::Duration;

/// Factory for outlets
pub trait StreamTransport {
    /// Outlet type produced by this transport
    type Outlet: Outlet;

    /// Create an outlet advertising `info`
    ///
    /// # Arguments
    /// * `chunk_size` - Preferred samples per network chunk (0 = transport default)
    /// * `max_buffered` - Samples each consumer may lag behind before drops
    fn create_outlet(
        &mut self,
        info: &StreamInfo,
        chunk_size: u32,
        max_buffered: u32,
    ) -> Result<Self::Outlet>;
}

/// Publish side of a stream
pub trait Outlet: Send {
    /// Block for up to `timeout` until at least one consumer is attached
    fn wait_for_consumers(&mut self, timeout: Duration) -> bool;

    /// Whether at least one consumer is attached right now
    fn have_consumers(&mut self) -> bool;

    /// Queue one sample for every attached consumer
    ///
    /// Must not block on slow consumers. Having no consumer is not an error.
    fn push_sample(&mut self, sample: &[f32]) -> Result<()>;
}
