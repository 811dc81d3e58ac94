//! Session orchestration
//!
//! [`Streamer::run`] wires the collaborators together for one session:
//!
//! 1. Open the device, start its cameras and fetch the calibration
//! 2. Negotiate the tracker processing mode
//! 3. Build the channel layout and stream descriptor, create the outlet
//! 4. Wait for the first consumer
//! 5. Run the acquisition loop
//! 6. Tear everything down
//!
//! # Teardown
//!
//! Whatever happens after the device is opened, acquired resources are
//! released exactly once in this order:
//!
//! ```text
//! tracker.shutdown() → tracker.destroy() → device.stop_cameras() → device.close()
//! ```
//!
//! Steps for resources that were never acquired are skipped.

use crate::acquisition::{AcquisitionLoop, AcquisitionSettings, AcquisitionStats, LoopOutcome};
use crate::config::AppConfig;
use crate::error::{Result, ResultExt};
use crate::sensor::{negotiate, BodyTracker, DepthSensor, SensorDriver};
use crate::stream::{ChannelLayout, ConsumerGatedPublisher, PublisherStats, StreamInfo, StreamTransport};
use crate::types::ProcessingMode;

/// Exit code for a session that ran to its frame limit
pub const EXIT_COMPLETED: i32 = 0;

/// Exit code for initialization or configuration failures
pub const EXIT_INIT_FAILURE: i32 = 1;

/// Exit code for a frame with more than one subject
pub const EXIT_MULTIPLE_SUBJECTS: i32 = 2;

/// Exit code for a collaborator failure during acquisition
pub const EXIT_FAULT: i32 = 3;

/// Summary of a session that got as far as the acquisition loop
#[derive(Debug)]
pub struct SessionReport {
    pub mode: ProcessingMode,
    pub outcome: LoopOutcome,
    pub stats: AcquisitionStats,
    pub publisher: PublisherStats,
}

impl SessionReport {
    /// Process exit code for this session
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            LoopOutcome::Completed { .. } => EXIT_COMPLETED,
            LoopOutcome::MultipleSubjects { .. } => EXIT_MULTIPLE_SUBJECTS,
            LoopOutcome::Fault(_) => EXIT_FAULT,
        }
    }
}

/// Resources acquired so far, released by [`Acquired::teardown`]
struct Acquired<D: DepthSensor, T: BodyTracker> {
    device: D,
    cameras_started: bool,
    tracker: Option<T>,
}

impl<D: DepthSensor, T: BodyTracker> Acquired<D, T> {
    fn teardown(mut self) {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.shutdown();
            tracker.destroy();
            tracing::debug!("Body tracker released");
        }
        if self.cameras_started {
            self.device.stop_cameras();
        }
        self.device.close();
        tracing::info!("Device closed");
    }
}

/// Runs streaming sessions
pub struct Streamer;

impl Streamer {
    /// Stream descriptor a session in `mode` would advertise
    pub fn stream_info(config: &AppConfig, mode: ProcessingMode) -> Result<StreamInfo> {
        let catalog = config.catalog()?;
        let layout = ChannelLayout::build(&catalog);
        Ok(StreamInfo::new(&config.stream, &layout, mode))
    }

    /// Run one session to its end
    ///
    /// Returns `Err` only for failures before the acquisition loop starts.
    /// Loop outcomes, including faults, are reported in the [`SessionReport`].
    pub fn run<S, X>(driver: &mut S, transport: &mut X, config: &AppConfig) -> Result<SessionReport>
    where
        S: SensorDriver,
        X: StreamTransport,
    {
        config.validate()?;

        let device = driver
            .open_device(config.device.index)
            .with_context(|| format!("Open device {}", config.device.index))?;
        tracing::info!("Opened device {}", config.device.index);

        let mut acquired = Acquired {
            device,
            cameras_started: false,
            tracker: None,
        };
        let result = Self::run_session(driver, transport, config, &mut acquired);
        acquired.teardown();
        result
    }

    fn run_session<S, X>(
        driver: &mut S,
        transport: &mut X,
        config: &AppConfig,
        acquired: &mut Acquired<S::Device, S::Tracker>,
    ) -> Result<SessionReport>
    where
        S: SensorDriver,
        X: StreamTransport,
    {
        let settings = config.device_settings();
        acquired.device.start_cameras(&settings)?;
        acquired.cameras_started = true;
        tracing::info!(
            "Cameras started ({:?}, color {:?}, {} fps)",
            settings.depth_mode,
            settings.color_resolution,
            settings.fps.hz()
        );

        let calibration = acquired
            .device
            .calibration(settings.depth_mode, settings.color_resolution)?;

        let (tracker, mode) =
            negotiate(driver, &calibration, config.tracker.prefer_accelerated)?;
        let tracker = acquired.tracker.insert(tracker);

        let catalog = config.catalog()?;
        let layout = ChannelLayout::build(&catalog);
        let info = StreamInfo::new(&config.stream, &layout, mode);
        tracing::info!(
            "Stream '{}' ({}), {} channels at {} Hz",
            info.name,
            info.content_type,
            info.channel_count,
            info.nominal_rate
        );

        let outlet = transport.create_outlet(
            &info,
            config.stream.chunk_size,
            config.stream.max_buffered,
        )?;
        let mut publisher = ConsumerGatedPublisher::new(outlet);
        publisher.await_consumer(config.stream.consumer_poll());

        let mut acquisition = AcquisitionLoop::new(
            &catalog,
            AcquisitionSettings::from(&config.acquisition),
            mode,
        );
        let outcome = acquisition.run(&mut acquired.device, tracker, &mut publisher);

        Ok(SessionReport {
            mode,
            outcome,
            stats: acquisition.stats().clone(),
            publisher: publisher.stats(),
        })
    }
}
