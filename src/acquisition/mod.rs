//! Acquisition loop
//!
//! Drives one capture through the tracker and out to the publisher per
//! cycle:
//!
//! ```text
//! AwaitCapture ──► Submit ──► AwaitTrackResult ──► Extract ──► Publish
//!      ▲                                                          │
//!      └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every wait blocks indefinitely. A failure at any stage ends the loop with
//! [`LoopOutcome::Fault`]; nothing is retried. A frame with more than one
//! subject ends it with [`LoopOutcome::MultipleSubjects`] without publishing.
//!
//! Captures are released right after submission and tracking results right
//! after publishing, by dropping them.

pub mod stats;

pub use stats::AcquisitionStats;

use crate::config::{AcquisitionConfig, EmptyFramePolicy};
use crate::error::{Result, StreamError};
use crate::sensor::{BodyFrame, BodyTracker, DepthSensor};
use crate::stream::{ConsumerGatedPublisher, FrameBuffer, Outlet};
use crate::types::{JointCatalog, ProcessingMode, WaitPolicy};
use std::time::Instant;

/// Policy knobs of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionSettings {
    /// Cycles to run; `None` runs until a terminal transition
    pub frame_limit: Option<u64>,
    /// What to publish for frames without a subject
    pub empty_frames: EmptyFramePolicy,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self::from(&AcquisitionConfig::default())
    }
}

impl From<&AcquisitionConfig> for AcquisitionSettings {
    fn from(config: &AcquisitionConfig) -> Self {
        Self {
            frame_limit: config.frame_limit,
            empty_frames: config.empty_frames,
        }
    }
}

/// Progress of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopState {
    /// Completed cycles
    pub iterations: u64,
    pub limit: Option<u64>,
    pub mode: ProcessingMode,
}

impl LoopState {
    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.iterations >= limit)
    }
}

/// How the loop ended
#[derive(Debug)]
pub enum LoopOutcome {
    /// The cycle limit was reached
    Completed { frames: u64 },
    /// A frame contained more than one subject
    MultipleSubjects {
        count: usize,
        /// 1-based number of the offending cycle
        frame: u64,
    },
    /// A collaborator failed
    Fault(StreamError),
}

impl LoopOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, LoopOutcome::Completed { .. })
    }
}

/// Result of one cycle that did not fail
enum Cycle {
    Done,
    MultipleSubjects(usize),
}

/// The per-frame pipeline
pub struct AcquisitionLoop<'a> {
    catalog: &'a JointCatalog,
    settings: AcquisitionSettings,
    buffer: FrameBuffer,
    state: LoopState,
    stats: AcquisitionStats,
}

impl<'a> AcquisitionLoop<'a> {
    /// Create a loop for a catalog in the negotiated mode
    ///
    /// The frame buffer is allocated here once and reused by every cycle.
    pub fn new(catalog: &'a JointCatalog, settings: AcquisitionSettings, mode: ProcessingMode) -> Self {
        Self {
            catalog,
            settings,
            buffer: FrameBuffer::new(catalog),
            state: LoopState {
                iterations: 0,
                limit: settings.frame_limit,
                mode,
            },
            stats: AcquisitionStats::default(),
        }
    }

    /// Run until the limit is reached or a terminal transition happens
    pub fn run<D, T, O>(
        &mut self,
        device: &mut D,
        tracker: &mut T,
        publisher: &mut ConsumerGatedPublisher<O>,
    ) -> LoopOutcome
    where
        D: DepthSensor,
        T: BodyTracker<Capture = D::Capture>,
        O: Outlet,
    {
        tracing::info!(
            "Acquisition started ({} mode, limit: {})",
            self.state.mode,
            self.state
                .limit
                .map_or_else(|| "none".to_string(), |l| l.to_string())
        );

        let outcome = loop {
            if self.state.limit_reached() {
                break LoopOutcome::Completed {
                    frames: self.state.iterations,
                };
            }

            match self.step(device, tracker, publisher) {
                Ok(Cycle::Done) => {}
                Ok(Cycle::MultipleSubjects(count)) => {
                    break LoopOutcome::MultipleSubjects {
                        count,
                        frame: self.state.iterations + 1,
                    };
                }
                Err(e) => break LoopOutcome::Fault(e),
            }
        };

        match &outcome {
            LoopOutcome::Completed { frames } => {
                tracing::info!("Acquisition completed after {} frames", frames);
            }
            LoopOutcome::MultipleSubjects { count, frame } => {
                tracing::error!(
                    "Frame {} contains {} subjects, only one is supported",
                    frame,
                    count
                );
            }
            LoopOutcome::Fault(e) => {
                tracing::error!("Acquisition stopped: {}", e);
            }
        }
        tracing::info!("Acquisition stats: {}", self.stats);

        outcome
    }

    fn step<D, T, O>(
        &mut self,
        device: &mut D,
        tracker: &mut T,
        publisher: &mut ConsumerGatedPublisher<O>,
    ) -> Result<Cycle>
    where
        D: DepthSensor,
        T: BodyTracker<Capture = D::Capture>,
        O: Outlet,
    {
        let started = Instant::now();

        let capture = device
            .get_capture(WaitPolicy::Infinite)
            .map_err(StreamError::Capture)?;
        let queued = tracker.enqueue_capture(&capture, WaitPolicy::Infinite);
        drop(capture);
        queued.map_err(StreamError::Enqueue)?;

        let frame = tracker
            .pop_result(WaitPolicy::Infinite)
            .map_err(StreamError::PopResult)?;
        let cycle = self.publish_frame(&frame, publisher);
        drop(frame);

        if let Ok(Cycle::Done) = cycle {
            self.state.iterations += 1;
            self.stats.record_cycle(started.elapsed());
        }
        cycle
    }

    fn publish_frame<F, O>(
        &mut self,
        frame: &F,
        publisher: &mut ConsumerGatedPublisher<O>,
    ) -> Result<Cycle>
    where
        F: BodyFrame,
        O: Outlet,
    {
        match frame.num_bodies() {
            0 => {
                self.stats.record_empty(self.settings.empty_frames);
                match self.settings.empty_frames {
                    EmptyFramePolicy::Skip => {
                        tracing::debug!("No subject in frame, skipping");
                    }
                    EmptyFramePolicy::Zeros => {
                        self.buffer.clear();
                        publisher.publish(self.buffer.as_slice());
                    }
                }
                Ok(Cycle::Done)
            }
            1 => {
                let skeleton = frame.skeleton(0).ok_or_else(|| {
                    StreamError::Extraction("Get body skeleton failed".to_string())
                })?;
                tracing::trace!(
                    "Body {:?} at {:?}",
                    frame.body_id(0),
                    frame.device_timestamp()
                );
                self.buffer.fill(self.catalog, &skeleton);
                publisher.publish(self.buffer.as_slice());
                self.stats.record_published();
                Ok(Cycle::Done)
            }
            count => Ok(Cycle::MultipleSubjects(count)),
        }
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Statistics so far
    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    /// Last sample written into the frame buffer
    pub fn last_sample(&self) -> &[f32] {
        self.buffer.as_slice()
    }
}
