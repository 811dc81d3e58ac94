//! Sensor and tracker traits
//!
//! These traits are the boundary between the capture pipeline and the vendor
//! SDK. The simulated sensor in this crate implements them, and so does any
//! hardware binding.
//!
//! Resource release follows ownership: a capture is released when it is
//! dropped, and so is a body frame. The pipeline drops both as soon as it is
//! done with them, on every path.

use crate::error::{Result, WaitError};
use crate::types::{
    Calibration, ColorResolution, DepthMode, DeviceSettings, ProcessingMode, Skeleton, WaitPolicy,
};
use std::time::Duration;

/// Entry points of a sensor SDK
///
/// # Example
///
/// ```ignore
/// fn open_first<D: SensorDriver>(driver: &mut D) -> Result<D::Device> {
///     driver.open_device(0)
/// }
/// ```
pub trait SensorDriver {
    /// Handle to an opened depth sensor
    type Device: DepthSensor;

    /// Handle to a body tracker fed from [`Self::Device`]
    type Tracker: BodyTracker<Capture = <Self::Device as DepthSensor>::Capture>;

    /// Open the device at `index`
    fn open_device(&mut self, index: u32) -> Result<Self::Device>;

    /// Create a body tracker for the given calibration and processing mode
    fn create_tracker(
        &mut self,
        calibration: &Calibration,
        mode: ProcessingMode,
    ) -> Result<Self::Tracker>;
}

/// An opened depth sensor
pub trait DepthSensor: Send {
    /// One raw acquisition; released on drop
    type Capture: Send;

    /// Start the cameras with the given settings
    fn start_cameras(&mut self, settings: &DeviceSettings) -> Result<()>;

    /// Fetch the calibration for a depth/color mode pair
    fn calibration(
        &mut self,
        depth_mode: DepthMode,
        color_resolution: ColorResolution,
    ) -> Result<Calibration>;

    /// Wait for the next capture
    fn get_capture(&mut self, wait: WaitPolicy) -> std::result::Result<Self::Capture, WaitError>;

    /// Stop the cameras
    fn stop_cameras(&mut self);

    /// Close the device
    fn close(&mut self);
}

/// A body tracker consuming captures and producing body frames
pub trait BodyTracker: Send {
    /// Capture type accepted by [`BodyTracker::enqueue_capture`]
    type Capture;

    /// Tracking result type; released on drop
    type Frame: BodyFrame;

    /// Add a capture to the tracker input queue
    ///
    /// The tracker keeps its own reference to the capture data, so the caller
    /// may release the capture as soon as this returns.
    fn enqueue_capture(
        &mut self,
        capture: &Self::Capture,
        wait: WaitPolicy,
    ) -> std::result::Result<(), WaitError>;

    /// Wait for the next tracking result
    fn pop_result(&mut self, wait: WaitPolicy) -> std::result::Result<Self::Frame, WaitError>;

    /// Stop accepting captures and flush pending results
    fn shutdown(&mut self);

    /// Release the tracker
    fn destroy(&mut self);
}

/// The tracker output for one capture
pub trait BodyFrame {
    /// Number of subjects tracked in this frame
    fn num_bodies(&self) -> usize;

    /// Skeleton of the subject at `index`
    fn skeleton(&self, index: usize) -> Option<Skeleton>;

    /// Tracker-assigned id of the subject at `index`
    fn body_id(&self, index: usize) -> Option<u32>;

    /// Device timestamp of the capture this frame was computed from
    fn device_timestamp(&self) -> Duration;
}
