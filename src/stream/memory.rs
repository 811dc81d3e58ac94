//! In-memory transport
//!
//! Records every pushed sample and lets the caller decide how many consumers
//! are attached. Used by `--dry-run` and by the tests.
//!
//! # Example
//!
//! ```ignore
//! let handle = MemoryOutletHandle::new();
//! let mut transport = MemoryTransport::new(handle.clone());
//! let outlet = transport.create_outlet(&info, 0, 60)?;
//!
//! handle.attach_consumer();
//! // ... run the pipeline ...
//! assert_eq!(handle.sample_count(), 100);
//! ```

use super::metadata::StreamInfo;
use super::outlet_trait::{Outlet, StreamTransport};
use crate::error::{Result, StreamError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Shared {
    consumers: Mutex<usize>,
    attached: Condvar,
    samples: Mutex<Vec<Vec<f32>>>,
    info: Mutex<Option<StreamInfo>>,
    fail_pushes: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Caller-side view of an in-memory outlet
#[derive(Debug, Clone, Default)]
pub struct MemoryOutletHandle {
    shared: Arc<Shared>,
}

impl MemoryOutletHandle {
    /// Create a handle with no consumers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an outlet bound to this handle
    pub fn outlet(&self) -> MemoryOutlet {
        MemoryOutlet {
            shared: self.shared.clone(),
        }
    }

    /// Simulate a consumer attaching
    pub fn attach_consumer(&self) {
        *lock(&self.shared.consumers) += 1;
        self.shared.attached.notify_all();
    }

    /// Simulate a consumer detaching
    pub fn detach_consumer(&self) {
        let mut consumers = lock(&self.shared.consumers);
        *consumers = consumers.saturating_sub(1);
    }

    /// Make every subsequent push fail
    pub fn set_fail_pushes(&self, fail: bool) {
        *lock(&self.shared.fail_pushes) = fail;
    }

    /// All samples pushed so far
    pub fn samples(&self) -> Vec<Vec<f32>> {
        lock(&self.shared.samples).clone()
    }

    /// Number of samples pushed so far
    pub fn sample_count(&self) -> usize {
        lock(&self.shared.samples).len()
    }

    /// Descriptor of the outlet, once created through [`MemoryTransport`]
    pub fn info(&self) -> Option<StreamInfo> {
        lock(&self.shared.info).clone()
    }
}

/// Transport that creates in-memory outlets
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    handle: MemoryOutletHandle,
}

impl MemoryTransport {
    pub fn new(handle: MemoryOutletHandle) -> Self {
        Self { handle }
    }
}

impl StreamTransport for MemoryTransport {
    type Outlet = MemoryOutlet;

    fn create_outlet(
        &mut self,
        info: &StreamInfo,
        _chunk_size: u32,
        _max_buffered: u32,
    ) -> Result<MemoryOutlet> {
        *lock(&self.handle.shared.info) = Some(info.clone());
        Ok(self.handle.outlet())
    }
}

/// Outlet recording samples in memory
#[derive(Debug)]
pub struct MemoryOutlet {
    shared: Arc<Shared>,
}

impl Outlet for MemoryOutlet {
    fn wait_for_consumers(&mut self, timeout: Duration) -> bool {
        let consumers = lock(&self.shared.consumers);
        let (consumers, _) = self
            .shared
            .attached
            .wait_timeout_while(consumers, timeout, |count| *count == 0)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *consumers > 0
    }

    fn have_consumers(&mut self) -> bool {
        *lock(&self.shared.consumers) > 0
    }

    fn push_sample(&mut self, sample: &[f32]) -> Result<()> {
        if *lock(&self.shared.fail_pushes) {
            return Err(StreamError::Transport(
                "In-memory outlet rejects pushes".to_string(),
            ));
        }
        lock(&self.shared.samples).push(sample.to_vec());
        Ok(())
    }
}
