//! Mock collaborators and construction helpers
//!
//! The `mock!` types stand in for the vendor SDK so tests can script every
//! call and check the order of teardown calls with a shared
//! [`mockall::Sequence`].

use bodystream_rs::error::{Result, WaitError};
use bodystream_rs::sensor::{BodyFrame, BodyTracker, DepthSensor, SensorDriver, SimulatedCapture};
use bodystream_rs::stream::{Outlet, StreamInfo, StreamTransport};
use bodystream_rs::types::{
    Calibration, ColorResolution, DepthMode, DeviceSettings, ProcessingMode, Skeleton, WaitPolicy,
};
use mockall::mock;
use std::time::Duration;

/// Tracking result with a scripted body count
#[derive(Debug, Clone)]
pub struct ScriptedFrame {
    pub num_bodies: usize,
    pub bodies: Vec<Skeleton>,
    pub timestamp: Duration,
}

impl BodyFrame for ScriptedFrame {
    fn num_bodies(&self) -> usize {
        self.num_bodies
    }

    fn skeleton(&self, index: usize) -> Option<Skeleton> {
        self.bodies.get(index).cloned()
    }

    fn body_id(&self, index: usize) -> Option<u32> {
        (index < self.bodies.len()).then_some(index as u32 + 1)
    }

    fn device_timestamp(&self) -> Duration {
        self.timestamp
    }
}

mock! {
    pub Device {}

    impl DepthSensor for Device {
        type Capture = SimulatedCapture;

        fn start_cameras(&mut self, settings: &DeviceSettings) -> Result<()>;
        fn calibration(
            &mut self,
            depth_mode: DepthMode,
            color_resolution: ColorResolution,
        ) -> Result<Calibration>;
        fn get_capture(
            &mut self,
            wait: WaitPolicy,
        ) -> std::result::Result<SimulatedCapture, WaitError>;
        fn stop_cameras(&mut self);
        fn close(&mut self);
    }
}

mock! {
    pub Tracker {}

    impl BodyTracker for Tracker {
        type Capture = SimulatedCapture;
        type Frame = ScriptedFrame;

        fn enqueue_capture(
            &mut self,
            capture: &SimulatedCapture,
            wait: WaitPolicy,
        ) -> std::result::Result<(), WaitError>;
        fn pop_result(&mut self, wait: WaitPolicy) -> std::result::Result<ScriptedFrame, WaitError>;
        fn shutdown(&mut self);
        fn destroy(&mut self);
    }
}

mock! {
    pub Driver {}

    impl SensorDriver for Driver {
        type Device = MockDevice;
        type Tracker = MockTracker;

        fn open_device(&mut self, index: u32) -> Result<MockDevice>;
        fn create_tracker(
            &mut self,
            calibration: &Calibration,
            mode: ProcessingMode,
        ) -> Result<MockTracker>;
    }
}

mock! {
    pub StreamOutlet {}

    impl Outlet for StreamOutlet {
        fn wait_for_consumers(&mut self, timeout: Duration) -> bool;
        fn have_consumers(&mut self) -> bool;
        fn push_sample(&mut self, sample: &[f32]) -> Result<()>;
    }
}

mock! {
    pub Transport {}

    impl StreamTransport for Transport {
        type Outlet = MockStreamOutlet;

        fn create_outlet(
            &mut self,
            info: &StreamInfo,
            chunk_size: u32,
            max_buffered: u32,
        ) -> Result<MockStreamOutlet>;
    }
}

/// Calibration matching the default device settings
pub fn test_calibration() -> Calibration {
    Calibration {
        depth_mode: DepthMode::NfovBinned,
        color_resolution: ColorResolution::Off,
        depth_width: 320,
        depth_height: 288,
    }
}

/// Capture with sequence number `index`
pub fn capture(index: u64) -> SimulatedCapture {
    SimulatedCapture {
        index,
        device_timestamp: Duration::from_millis(index * 33),
    }
}

/// Device whose cameras start and whose calibration succeeds
///
/// Capture and teardown expectations are left to the caller.
pub fn ready_device() -> MockDevice {
    let mut device = MockDevice::new();
    device.expect_start_cameras().times(1).returning(|_| Ok(()));
    device
        .expect_calibration()
        .times(1)
        .returning(|_, _| Ok(test_calibration()));
    device
}

/// Hand out `count` captures, then time out
pub fn expect_captures(device: &mut MockDevice, count: u64) {
    let mut next = 0u64;
    device.expect_get_capture().returning(move |_| {
        if next < count {
            next += 1;
            Ok(capture(next - 1))
        } else {
            Err(WaitError::Timeout)
        }
    });
}

/// Device that hands out `count` captures, then times out
pub fn counting_device(count: u64) -> MockDevice {
    let mut device = MockDevice::new();
    expect_captures(&mut device, count);
    device
}

/// Tracker that accepts every capture and answers with `frame`
pub fn echo_tracker(frame: ScriptedFrame) -> MockTracker {
    let mut tracker = MockTracker::new();
    tracker.expect_enqueue_capture().returning(|_, _| Ok(()));
    tracker
        .expect_pop_result()
        .returning(move |_| Ok(frame.clone()));
    tracker
}

/// Outlet that always has a consumer and accepts every sample
pub fn accepting_outlet() -> MockStreamOutlet {
    let mut outlet = MockStreamOutlet::new();
    outlet.expect_wait_for_consumers().returning(|_| true);
    outlet.expect_have_consumers().returning(|| true);
    outlet.expect_push_sample().returning(|_| Ok(()));
    outlet
}
