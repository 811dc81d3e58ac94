//! Configuration module for bodystream-rs
//!
//! Configuration is a single TOML file. Every section is optional; missing
//! sections and fields fall back to the defaults below.
//!
//! # Config Location
//!
//! Unless `--config` is given, the file is read from the platform config dir:
//! - **Linux**: `~/.config/dev.bodystream.bodystream-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.bodystream.bodystream-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.bodystream.bodystream-rs\config.toml`
//!
//! # Example
//!
//! ```toml
//! [device]
//! index = 0
//! depth_mode = "nfov_unbinned"
//!
//! [tracker]
//! prefer_accelerated = true
//!
//! [stream]
//! name = "Azure-Kinect"
//! listen = "0.0.0.0:16571"
//!
//! [acquisition]
//! frame_limit = 100
//! empty_frames = "skip"
//! joints = ["PELVIS", "NECK", "HEAD"]
//! ```

use crate::error::{Result, StreamError};
use crate::types::{
    CameraFps, ColorResolution, DepthMode, DeviceSettings, JointCatalog, ProcessingMode,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "dev.bodystream.bodystream-rs";

/// Config filename inside the app config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default stream name
pub const DEFAULT_STREAM_NAME: &str = "Azure-Kinect";

/// Default stream content type
pub const DEFAULT_CONTENT_TYPE: &str = "MoCap";

/// Default advertised rate with the accelerated tracker, in Hz
pub const DEFAULT_ACCELERATED_RATE_HZ: f64 = 10.0;

/// Default advertised rate with the baseline tracker, in Hz
pub const DEFAULT_BASELINE_RATE_HZ: f64 = 4.0;

/// Default number of samples a consumer may lag behind
pub const DEFAULT_MAX_BUFFERED: u32 = 60;

/// Default consumer poll interval in milliseconds
pub const DEFAULT_CONSUMER_POLL_MS: u64 = 1200;

/// Default number of cycles per session
pub const DEFAULT_FRAME_LIMIT: u64 = 100;

/// Default listen address of the TCP outlet
pub const DEFAULT_LISTEN: &str = "0.0.0.0:16571";

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== Sections ====================

/// Sensor device selection and camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Index of the device to open
    pub index: u32,
    pub depth_mode: DepthMode,
    pub color_resolution: ColorResolution,
    pub fps: CameraFps,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            index: 0,
            depth_mode: DepthMode::NfovBinned,
            color_resolution: ColorResolution::Off,
            fps: CameraFps::Fps30,
        }
    }
}

/// Body tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Try the accelerated backend before falling back to baseline
    pub prefer_accelerated: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            prefer_accelerated: true,
        }
    }
}

/// Stream identity and outlet settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub name: String,
    pub content_type: String,
    /// Stable id consumers use to find the stream again after a restart
    pub source_id: String,
    pub manufacturer: String,
    pub model: String,
    /// Advertised rate when the tracker runs accelerated
    pub accelerated_rate_hz: f64,
    /// Advertised rate when the tracker runs on the baseline backend
    pub baseline_rate_hz: f64,
    /// Samples per network chunk (0 = transport default)
    pub chunk_size: u32,
    /// Samples a consumer may lag behind before samples are dropped for it
    pub max_buffered: u32,
    /// How long each consumer poll blocks, in milliseconds
    pub consumer_poll_ms: u64,
    /// Listen address of the TCP outlet
    pub listen: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STREAM_NAME.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            source_id: "bodystream-0".to_string(),
            manufacturer: "Microsoft".to_string(),
            model: "Azure Kinect".to_string(),
            accelerated_rate_hz: DEFAULT_ACCELERATED_RATE_HZ,
            baseline_rate_hz: DEFAULT_BASELINE_RATE_HZ,
            chunk_size: 0,
            max_buffered: DEFAULT_MAX_BUFFERED,
            consumer_poll_ms: DEFAULT_CONSUMER_POLL_MS,
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl StreamConfig {
    /// Advertised nominal rate for a processing mode
    pub fn advertised_rate(&self, mode: ProcessingMode) -> f64 {
        match mode {
            ProcessingMode::Accelerated => self.accelerated_rate_hz,
            ProcessingMode::Baseline => self.baseline_rate_hz,
        }
    }

    /// Consumer poll interval
    pub fn consumer_poll(&self) -> Duration {
        Duration::from_millis(self.consumer_poll_ms)
    }
}

/// What to publish for a frame with no tracked subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptyFramePolicy {
    /// Publish nothing
    #[default]
    Skip,
    /// Publish an all-zero sample
    Zeros,
}

/// Acquisition loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Cycles to run before stopping; `None` (`"unbounded"` on disk) runs until a fault
    #[serde(with = "frame_limit")]
    pub frame_limit: Option<u64>,
    pub empty_frames: EmptyFramePolicy,
    /// Joint names in publish order; all joints when absent
    pub joints: Option<Vec<String>>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            frame_limit: Some(DEFAULT_FRAME_LIMIT),
            empty_frames: EmptyFramePolicy::Skip,
            joints: None,
        }
    }
}

mod frame_limit {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const UNBOUNDED: &str = "unbounded";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Count(u64),
        Word(String),
    }

    pub fn serialize<S: Serializer>(limit: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
        match limit {
            Some(n) => s.serialize_u64(*n),
            None => s.serialize_str(UNBOUNDED),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Count(n) => Ok(Some(n)),
            Raw::Word(word) if word == UNBOUNDED => Ok(None),
            Raw::Word(word) => Err(D::Error::custom(format!(
                "expected a cycle count or \"{}\", got \"{}\"",
                UNBOUNDED, word
            ))),
        }
    }
}

/// Knobs of the simulated sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of devices the simulated driver reports
    pub device_count: u32,
    pub accelerated_available: bool,
    pub baseline_available: bool,
    /// Subjects present in every non-empty frame
    pub subjects: usize,
    /// Every Nth frame has no subject
    pub empty_every: Option<u64>,
    /// Capture waits time out after this many captures
    pub capture_timeout_after: Option<u64>,
    /// Pace captures at the configured camera frame rate
    pub realtime: bool,
    /// Amplitude of the synthetic side-to-side sway
    pub sway_amplitude_mm: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_count: 1,
            accelerated_available: true,
            baseline_available: true,
            subjects: 1,
            empty_every: None,
            capture_timeout_after: None,
            realtime: true,
            sway_amplitude_mm: 50.0,
        }
    }
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub tracker: TrackerConfig,
    pub stream: StreamConfig,
    pub acquisition: AcquisitionConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StreamError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            StreamError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load a config file, returning defaults if it does not exist or is invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to a config file, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StreamError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| StreamError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            StreamError::Config(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        let stream = &self.stream;
        for (field, rate) in [
            ("accelerated_rate_hz", stream.accelerated_rate_hz),
            ("baseline_rate_hz", stream.baseline_rate_hz),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(StreamError::Config(format!(
                    "stream.{} must be positive, got {}",
                    field, rate
                )));
            }
        }

        if stream.consumer_poll_ms == 0 {
            return Err(StreamError::Config(
                "stream.consumer_poll_ms must be greater than 0".to_string(),
            ));
        }

        if stream.name.trim().is_empty() {
            return Err(StreamError::Config("stream.name must not be empty".to_string()));
        }

        if self.acquisition.frame_limit == Some(0) {
            return Err(StreamError::Config(
                "acquisition.frame_limit must be at least 1".to_string(),
            ));
        }

        if !self.device.depth_mode.supports_body_tracking() {
            return Err(StreamError::Config(format!(
                "device.depth_mode {:?} cannot be used for body tracking",
                self.device.depth_mode
            )));
        }

        self.catalog().map(|_| ())
    }

    /// Joint catalog selected by the acquisition section
    pub fn catalog(&self) -> Result<JointCatalog> {
        match &self.acquisition.joints {
            Some(names) => JointCatalog::from_names(names),
            None => Ok(JointCatalog::full()),
        }
    }

    /// Camera settings for the device section
    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            depth_mode: self.device.depth_mode,
            color_resolution: self.device.color_resolution,
            fps: self.device.fps,
        }
    }

    /// Tracker processing mode tried first
    pub fn preferred_mode(&self) -> ProcessingMode {
        if self.tracker.prefer_accelerated {
            ProcessingMode::Accelerated
        } else {
            ProcessingMode::Baseline
        }
    }
}
