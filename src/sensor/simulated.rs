//! Simulated depth sensor and body tracker
//!
//! This module provides a sensor driver that runs without hardware. It
//! produces a standing skeleton that sways slowly from side to side, and it
//! can be scripted to misbehave so the pipeline's failure paths can be
//! exercised end to end.
//!
//! # Scriptable Behavior
//!
//! All knobs live in [`SimulationConfig`]:
//!
//! - `accelerated_available` / `baseline_available` - Tracker creation per mode
//! - `subjects` - Number of bodies in every tracked frame
//! - `empty_every` - Every Nth frame has nobody in view
//! - `capture_timeout_after` - Captures time out after this many frames
//! - `realtime` - Pace captures at the configured camera frame rate
//!
//! # Example
//!
//! ```ignore
//! use bodystream_rs::sensor::{SensorDriver, SimulatedDriver};
//!
//! let mut driver = SimulatedDriver::new(SimulationConfig::default());
//! let mut device = driver.open_device(0)?;
//! device.start_cameras(&DeviceSettings::default())?;
//! ```

use super::sensor_trait::{BodyFrame, BodyTracker, DepthSensor, SensorDriver};
use crate::config::SimulationConfig;
use crate::error::{Result, StreamError, WaitError};
use crate::types::{
    Calibration, ColorResolution, DepthMode, DeviceSettings, JointConfidence, JointId, JointPose,
    ProcessingMode, Quaternion, Skeleton, Vec3, WaitPolicy, JOINT_COUNT,
};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::time::{Duration, Instant};

/// Failure code reported when the device is used before the cameras start
const NOT_STARTED_CODE: i32 = -1;

/// Failure code reported by a tracker that has been shut down
const TRACKER_SHUTDOWN_CODE: i32 = -2;

/// Lateral distance between simulated subjects
const SUBJECT_SPACING_MM: f32 = 800.0;

/// Standing pose in depth camera coordinates (mm, y pointing down)
const REST_POSE: [(f32, f32, f32); JOINT_COUNT] = [
    (0.0, 0.0, 2000.0),       // PELVIS
    (0.0, -200.0, 2000.0),    // SPINE_NAVAL
    (0.0, -380.0, 2010.0),    // SPINE_CHEST
    (0.0, -560.0, 2020.0),    // NECK
    (-40.0, -520.0, 2010.0),  // CLAVICLE_LEFT
    (-180.0, -500.0, 2020.0), // SHOULDER_LEFT
    (-220.0, -240.0, 2030.0), // ELBOW_LEFT
    (-240.0, 0.0, 2000.0),    // WRIST_LEFT
    (-245.0, 60.0, 1990.0),   // HAND_LEFT
    (-250.0, 140.0, 1980.0),  // HANDTIP_LEFT
    (-210.0, 70.0, 1960.0),   // THUMB_LEFT
    (40.0, -520.0, 2010.0),   // CLAVICLE_RIGHT
    (180.0, -500.0, 2020.0),  // SHOULDER_RIGHT
    (220.0, -240.0, 2030.0),  // ELBOW_RIGHT
    (240.0, 0.0, 2000.0),     // WRIST_RIGHT
    (245.0, 60.0, 1990.0),    // HAND_RIGHT
    (250.0, 140.0, 1980.0),   // HANDTIP_RIGHT
    (210.0, 70.0, 1960.0),    // THUMB_RIGHT
    (-100.0, 20.0, 2000.0),   // HIP_LEFT
    (-110.0, 440.0, 2010.0),  // KNEE_LEFT
    (-115.0, 840.0, 2040.0),  // ANKLE_LEFT
    (-120.0, 880.0, 1920.0),  // FOOT_LEFT
    (100.0, 20.0, 2000.0),    // HIP_RIGHT
    (110.0, 440.0, 2010.0),   // KNEE_RIGHT
    (115.0, 840.0, 2040.0),   // ANKLE_RIGHT
    (120.0, 880.0, 1920.0),   // FOOT_RIGHT
    (0.0, -700.0, 2010.0),    // HEAD
    (0.0, -700.0, 1910.0),    // NOSE
    (-35.0, -730.0, 1930.0),  // EYE_LEFT
    (-75.0, -720.0, 2000.0),  // EAR_LEFT
    (35.0, -730.0, 1930.0),   // EYE_RIGHT
    (75.0, -720.0, 2000.0),   // EAR_RIGHT
];

/// Build the simulated skeleton of subject `subject` at time `t` (seconds)
pub fn synthetic_skeleton(subject: usize, t: f32, sway_amplitude_mm: f32) -> Skeleton {
    let sway = sway_amplitude_mm * (2.0 * PI * 0.5 * t).sin();
    let yaw = 0.2 * (2.0 * PI * 0.25 * t).sin();
    let orientation = Quaternion::from_yaw(yaw);
    let offset_x = subject as f32 * SUBJECT_SPACING_MM;

    let mut skeleton = Skeleton::default();
    for joint in JointId::ALL {
        let (x, y, z) = REST_POSE[joint.index()];
        let pose = JointPose {
            position: Vec3::new(x + offset_x + sway, y, z),
            orientation,
            confidence: JointConfidence::Medium,
        };
        skeleton.set_joint(joint, pose);
    }
    skeleton
}

// ==================== Driver ====================

/// Sensor driver backed by the simulation
#[derive(Debug)]
pub struct SimulatedDriver {
    config: SimulationConfig,
    trackers_created: usize,
}

impl SimulatedDriver {
    /// Create a new simulated driver
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            trackers_created: 0,
        }
    }

    /// Number of trackers successfully created so far
    pub fn trackers_created(&self) -> usize {
        self.trackers_created
    }
}

impl SensorDriver for SimulatedDriver {
    type Device = SimulatedDevice;
    type Tracker = SimulatedTracker;

    fn open_device(&mut self, index: u32) -> Result<SimulatedDevice> {
        if index >= self.config.device_count {
            return Err(StreamError::Device(format!(
                "No simulated device at index {} ({} available)",
                index, self.config.device_count
            )));
        }

        tracing::info!("Opened simulated depth sensor {}", index);
        Ok(SimulatedDevice::new(self.config.clone()))
    }

    fn create_tracker(
        &mut self,
        calibration: &Calibration,
        mode: ProcessingMode,
    ) -> Result<SimulatedTracker> {
        let available = match mode {
            ProcessingMode::Accelerated => self.config.accelerated_available,
            ProcessingMode::Baseline => self.config.baseline_available,
        };
        if !available {
            return Err(StreamError::TrackerInit {
                mode,
                message: format!("simulated {} backend disabled", mode),
            });
        }
        if !calibration.depth_mode.supports_body_tracking() {
            return Err(StreamError::TrackerInit {
                mode,
                message: format!(
                    "depth mode {:?} cannot be used for body tracking",
                    calibration.depth_mode
                ),
            });
        }

        self.trackers_created += 1;
        Ok(SimulatedTracker::new(mode, self.config.clone()))
    }
}

// ==================== Device ====================

/// One simulated acquisition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedCapture {
    /// Sequence number of this capture, starting at 0
    pub index: u64,
    /// Time since the cameras started
    pub device_timestamp: Duration,
}

/// Simulated depth sensor
#[derive(Debug)]
pub struct SimulatedDevice {
    config: SimulationConfig,
    settings: Option<DeviceSettings>,
    started_at: Instant,
    last_capture: Option<Instant>,
    next_index: u64,
    closed: bool,
}

impl SimulatedDevice {
    fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            settings: None,
            started_at: Instant::now(),
            last_capture: None,
            next_index: 0,
            closed: false,
        }
    }

    /// Whether the cameras are running
    pub fn is_started(&self) -> bool {
        self.settings.is_some()
    }

    /// Whether the device has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn pace(&mut self, interval: Duration) {
        if let Some(last) = self.last_capture {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_capture = Some(Instant::now());
    }
}

impl DepthSensor for SimulatedDevice {
    type Capture = SimulatedCapture;

    fn start_cameras(&mut self, settings: &DeviceSettings) -> Result<()> {
        if self.closed {
            return Err(StreamError::Device("Simulated device is closed".to_string()));
        }
        if settings.depth_mode == DepthMode::Off {
            return Err(StreamError::Device(
                "Depth camera must be enabled".to_string(),
            ));
        }

        self.settings = Some(*settings);
        self.started_at = Instant::now();
        self.next_index = 0;
        tracing::debug!(
            "Simulated cameras started ({:?}, {} fps)",
            settings.depth_mode,
            settings.fps.hz()
        );
        Ok(())
    }

    fn calibration(
        &mut self,
        depth_mode: DepthMode,
        color_resolution: ColorResolution,
    ) -> Result<Calibration> {
        let (depth_width, depth_height) = depth_mode.resolution().ok_or_else(|| {
            StreamError::Calibration(format!("No depth calibration for {:?}", depth_mode))
        })?;

        Ok(Calibration {
            depth_mode,
            color_resolution,
            depth_width,
            depth_height,
        })
    }

    fn get_capture(&mut self, _wait: WaitPolicy) -> std::result::Result<SimulatedCapture, WaitError> {
        let Some(settings) = self.settings else {
            return Err(WaitError::Failed(NOT_STARTED_CODE));
        };

        if let Some(limit) = self.config.capture_timeout_after {
            if self.next_index >= limit {
                return Err(WaitError::Timeout);
            }
        }

        if self.config.realtime {
            self.pace(settings.fps.frame_interval());
        }

        let capture = SimulatedCapture {
            index: self.next_index,
            device_timestamp: self.started_at.elapsed(),
        };
        self.next_index += 1;
        Ok(capture)
    }

    fn stop_cameras(&mut self) {
        if self.settings.take().is_some() {
            tracing::debug!("Simulated cameras stopped");
        }
    }

    fn close(&mut self) {
        self.settings = None;
        self.closed = true;
        tracing::debug!("Simulated device closed");
    }
}

// ==================== Tracker ====================

/// Tracking result produced by [`SimulatedTracker`]
#[derive(Debug, Clone)]
pub struct SimulatedFrame {
    bodies: Vec<(u32, Skeleton)>,
    device_timestamp: Duration,
}

impl SimulatedFrame {
    /// Build a frame from explicit bodies
    pub fn new(bodies: Vec<(u32, Skeleton)>, device_timestamp: Duration) -> Self {
        Self {
            bodies,
            device_timestamp,
        }
    }
}

impl BodyFrame for SimulatedFrame {
    fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    fn skeleton(&self, index: usize) -> Option<Skeleton> {
        self.bodies.get(index).map(|(_, skeleton)| skeleton.clone())
    }

    fn body_id(&self, index: usize) -> Option<u32> {
        self.bodies.get(index).map(|(id, _)| *id)
    }

    fn device_timestamp(&self) -> Duration {
        self.device_timestamp
    }
}

/// Simulated body tracker
///
/// Captures are queued on enqueue and turned into frames on pop. There is no
/// worker thread, so popping from an empty queue reports a timeout instead
/// of blocking.
#[derive(Debug)]
pub struct SimulatedTracker {
    mode: ProcessingMode,
    config: SimulationConfig,
    queue: VecDeque<SimulatedCapture>,
    shut_down: bool,
    destroyed: bool,
}

impl SimulatedTracker {
    fn new(mode: ProcessingMode, config: SimulationConfig) -> Self {
        Self {
            mode,
            config,
            queue: VecDeque::new(),
            shut_down: false,
            destroyed: false,
        }
    }

    /// Processing mode this tracker was created with
    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Whether [`BodyTracker::destroy`] has been called
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn subjects_for(&self, capture: &SimulatedCapture) -> usize {
        match self.config.empty_every {
            Some(n) if n > 0 && (capture.index + 1) % n == 0 => 0,
            _ => self.config.subjects,
        }
    }
}

impl BodyTracker for SimulatedTracker {
    type Capture = SimulatedCapture;
    type Frame = SimulatedFrame;

    fn enqueue_capture(
        &mut self,
        capture: &SimulatedCapture,
        _wait: WaitPolicy,
    ) -> std::result::Result<(), WaitError> {
        if self.shut_down || self.destroyed {
            return Err(WaitError::Failed(TRACKER_SHUTDOWN_CODE));
        }
        self.queue.push_back(*capture);
        Ok(())
    }

    fn pop_result(&mut self, _wait: WaitPolicy) -> std::result::Result<SimulatedFrame, WaitError> {
        if self.destroyed {
            return Err(WaitError::Failed(TRACKER_SHUTDOWN_CODE));
        }
        let capture = self.queue.pop_front().ok_or(WaitError::Timeout)?;

        let t = capture.device_timestamp.as_secs_f32();
        let bodies = (0..self.subjects_for(&capture))
            .map(|subject| {
                let id = subject as u32 + 1;
                (id, synthetic_skeleton(subject, t, self.config.sway_amplitude_mm))
            })
            .collect();

        Ok(SimulatedFrame::new(bodies, capture.device_timestamp))
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        tracing::debug!("Simulated {} tracker shut down", self.mode);
    }

    fn destroy(&mut self) {
        self.queue.clear();
        self.destroyed = true;
    }
}
