//! Core data types for bodystream-rs
//!
//! This module contains the data structures shared by the sensor, stream and
//! acquisition modules.
//!
//! # Main Types
//!
//! - [`ProcessingMode`] - Which backend the body tracker runs on
//! - [`JointId`] - The 32 skeletal joints reported by the tracker
//! - [`JointCatalog`] - The ordered set of joints that is streamed
//! - [`Skeleton`] - Per-joint pose of one tracked subject
//! - [`DeviceSettings`] / [`Calibration`] - Sensor configuration and calibration
//! - [`WaitPolicy`] - How long a collaborator call may block
//!
//! # Joint Order
//!
//! The catalog order fixes the column order of every published frame.
//! Consumers decode samples positionally, so the catalog never changes once
//! the stream has been created.

use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Number of joints reported by the body tracker
pub const JOINT_COUNT: usize = 32;

/// Number of channels published per joint (3 position + 4 orientation)
pub const CHANNELS_PER_JOINT: usize = 7;

// ==================== Processing Mode ====================

/// Computational backend used by the body tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// GPU inference
    Accelerated,
    /// CPU inference
    Baseline,
}

impl ProcessingMode {
    /// Short lowercase label used in logs and stream metadata
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingMode::Accelerated => "accelerated",
            ProcessingMode::Baseline => "baseline",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==================== Joints ====================

/// Skeletal joints in tracker index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointId {
    Pelvis,
    SpineNavel,
    SpineChest,
    Neck,
    ClavicleLeft,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    HandtipLeft,
    ThumbLeft,
    ClavicleRight,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HandtipRight,
    ThumbRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    Head,
    Nose,
    EyeLeft,
    EarLeft,
    EyeRight,
    EarRight,
}

impl JointId {
    /// All joints in tracker index order
    pub const ALL: [JointId; JOINT_COUNT] = [
        JointId::Pelvis,
        JointId::SpineNavel,
        JointId::SpineChest,
        JointId::Neck,
        JointId::ClavicleLeft,
        JointId::ShoulderLeft,
        JointId::ElbowLeft,
        JointId::WristLeft,
        JointId::HandLeft,
        JointId::HandtipLeft,
        JointId::ThumbLeft,
        JointId::ClavicleRight,
        JointId::ShoulderRight,
        JointId::ElbowRight,
        JointId::WristRight,
        JointId::HandRight,
        JointId::HandtipRight,
        JointId::ThumbRight,
        JointId::HipLeft,
        JointId::KneeLeft,
        JointId::AnkleLeft,
        JointId::FootLeft,
        JointId::HipRight,
        JointId::KneeRight,
        JointId::AnkleRight,
        JointId::FootRight,
        JointId::Head,
        JointId::Nose,
        JointId::EyeLeft,
        JointId::EarLeft,
        JointId::EyeRight,
        JointId::EarRight,
    ];

    /// Index of this joint in a tracker skeleton
    pub fn index(self) -> usize {
        self as usize
    }

    /// Channel name prefix for this joint
    pub fn name(self) -> &'static str {
        match self {
            JointId::Pelvis => "PELVIS",
            JointId::SpineNavel => "SPINE_NAVAL",
            JointId::SpineChest => "SPINE_CHEST",
            JointId::Neck => "NECK",
            JointId::ClavicleLeft => "CLAVICLE_LEFT",
            JointId::ShoulderLeft => "SHOULDER_LEFT",
            JointId::ElbowLeft => "ELBOW_LEFT",
            JointId::WristLeft => "WRIST_LEFT",
            JointId::HandLeft => "HAND_LEFT",
            JointId::HandtipLeft => "HANDTIP_LEFT",
            JointId::ThumbLeft => "THUMB_LEFT",
            JointId::ClavicleRight => "CLAVICLE_RIGHT",
            JointId::ShoulderRight => "SHOULDER_RIGHT",
            JointId::ElbowRight => "ELBOW_RIGHT",
            JointId::WristRight => "WRIST_RIGHT",
            JointId::HandRight => "HAND_RIGHT",
            JointId::HandtipRight => "HANDTIP_RIGHT",
            JointId::ThumbRight => "THUMB_RIGHT",
            JointId::HipLeft => "HIP_LEFT",
            JointId::KneeLeft => "KNEE_LEFT",
            JointId::AnkleLeft => "ANKLE_LEFT",
            JointId::FootLeft => "FOOT_LEFT",
            JointId::HipRight => "HIP_RIGHT",
            JointId::KneeRight => "KNEE_RIGHT",
            JointId::AnkleRight => "ANKLE_RIGHT",
            JointId::FootRight => "FOOT_RIGHT",
            JointId::Head => "HEAD",
            JointId::Nose => "NOSE",
            JointId::EyeLeft => "EYE_LEFT",
            JointId::EarLeft => "EAR_LEFT",
            JointId::EyeRight => "EYE_RIGHT",
            JointId::EarRight => "EAR_RIGHT",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JointId {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        JointId::ALL
            .iter()
            .copied()
            .find(|joint| joint.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StreamError::Config(format!("Unknown joint name '{}'", s)))
    }
}

/// Ordered, duplicate-free set of joints to stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointCatalog {
    joints: Vec<JointId>,
}

impl JointCatalog {
    /// Create a catalog from an explicit joint order
    pub fn new(joints: Vec<JointId>) -> Result<Self> {
        if joints.is_empty() {
            return Err(StreamError::Config(
                "Joint catalog must contain at least one joint".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(joints.len());
        for joint in &joints {
            if !seen.insert(*joint) {
                return Err(StreamError::Config(format!(
                    "Joint {} appears more than once in the catalog",
                    joint
                )));
            }
        }

        Ok(Self { joints })
    }

    /// Catalog of every tracked joint in tracker index order
    pub fn full() -> Self {
        Self {
            joints: JointId::ALL.to_vec(),
        }
    }

    /// Parse a catalog from joint names (case-insensitive)
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let joints = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<JointId>>>()?;
        Self::new(joints)
    }

    /// Number of joints in the catalog
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Always false; an empty catalog cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Joints in catalog order
    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    /// Iterate over joints in catalog order
    pub fn iter(&self) -> impl Iterator<Item = JointId> + '_ {
        self.joints.iter().copied()
    }

    /// Width of one frame sample for this catalog
    pub fn channel_count(&self) -> usize {
        self.joints.len() * CHANNELS_PER_JOINT
    }
}

impl Default for JointCatalog {
    fn default() -> Self {
        Self::full()
    }
}

// ==================== Skeleton ====================

/// Position in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Orientation as a unit quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians about the vertical (y) axis
    pub fn from_yaw(angle: f32) -> Self {
        let half = angle * 0.5;
        Self::new(half.cos(), 0.0, half.sin(), 0.0)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// How confident the tracker is in a joint estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum JointConfidence {
    /// Joint is out of range
    #[default]
    None,
    /// Joint is occluded and predicted
    Low,
    /// Joint is observed
    Medium,
    /// Reserved by the tracker for future use
    High,
}

/// Pose of a single joint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointPose {
    pub position: Vec3,
    pub orientation: Quaternion,
    pub confidence: JointConfidence,
}

impl JointPose {
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
            confidence: JointConfidence::Medium,
        }
    }

    /// Write the 7 published channels of this joint into `out`
    ///
    /// Order is position x, y, z followed by orientation w, x, y, z.
    pub fn write_channels(&self, out: &mut [f32]) {
        out[0] = self.position.x;
        out[1] = self.position.y;
        out[2] = self.position.z;
        out[3] = self.orientation.w;
        out[4] = self.orientation.x;
        out[5] = self.orientation.y;
        out[6] = self.orientation.z;
    }
}

/// Pose of every joint of one tracked subject
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    joints: [JointPose; JOINT_COUNT],
}

impl Skeleton {
    pub fn new(joints: [JointPose; JOINT_COUNT]) -> Self {
        Self { joints }
    }

    /// Pose of a joint
    pub fn joint(&self, id: JointId) -> &JointPose {
        &self.joints[id.index()]
    }

    /// Replace the pose of a joint
    pub fn set_joint(&mut self, id: JointId, pose: JointPose) {
        self.joints[id.index()] = pose;
    }

    /// Builder-style variant of [`Skeleton::set_joint`]
    pub fn with_joint(mut self, id: JointId, pose: JointPose) -> Self {
        self.set_joint(id, pose);
        self
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self {
            joints: [JointPose::default(); JOINT_COUNT],
        }
    }
}

// ==================== Device ====================

/// Depth camera operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// Depth camera disabled
    Off,
    /// Narrow field of view, 2x2 binned (320x288)
    #[default]
    NfovBinned,
    /// Narrow field of view, unbinned (640x576)
    NfovUnbinned,
    /// Wide field of view, 2x2 binned (512x512)
    WfovBinned,
    /// Wide field of view, unbinned (1024x1024)
    WfovUnbinned,
    /// Passive IR only
    PassiveIr,
}

impl DepthMode {
    /// Depth image dimensions for this mode, if any
    pub fn resolution(&self) -> Option<(u32, u32)> {
        match self {
            DepthMode::Off => None,
            DepthMode::NfovBinned => Some((320, 288)),
            DepthMode::NfovUnbinned => Some((640, 576)),
            DepthMode::WfovBinned => Some((512, 512)),
            DepthMode::WfovUnbinned => Some((1024, 1024)),
            DepthMode::PassiveIr => Some((1024, 1024)),
        }
    }

    /// Whether the body tracker can run on this mode
    pub fn supports_body_tracking(&self) -> bool {
        !matches!(self, DepthMode::Off | DepthMode::PassiveIr)
    }
}

/// Color camera resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorResolution {
    /// Color camera disabled
    #[default]
    Off,
    R720p,
    R1080p,
    R1440p,
    R1536p,
    R2160p,
    R3072p,
}

/// Camera frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CameraFps {
    #[serde(rename = "5")]
    Fps5,
    #[serde(rename = "15")]
    Fps15,
    #[default]
    #[serde(rename = "30")]
    Fps30,
}

impl CameraFps {
    pub fn hz(&self) -> u32 {
        match self {
            CameraFps::Fps5 => 5,
            CameraFps::Fps15 => 15,
            CameraFps::Fps30 => 30,
        }
    }

    /// Time between two captures
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.hz() as u64)
    }
}

/// Settings used to start the sensor cameras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceSettings {
    pub depth_mode: DepthMode,
    pub color_resolution: ColorResolution,
    pub fps: CameraFps,
}

/// Sensor calibration consumed by the body tracker
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub depth_mode: DepthMode,
    pub color_resolution: ColorResolution,
    /// Depth image width in pixels
    pub depth_width: u32,
    /// Depth image height in pixels
    pub depth_height: u32,
}

/// How long a blocking collaborator call may wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Block until the call completes
    #[default]
    Infinite,
    /// Give up after the duration
    Timeout(Duration),
}
