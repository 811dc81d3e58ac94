//! Sensor module: depth sensor and body tracker collaborators
//!
//! The capture pipeline only talks to the sensor through the traits in
//! [`sensor_trait`]. Everything behind them (device discovery, calibration,
//! inference) belongs to the vendor SDK or to the simulation.
//!
//! # Components
//!
//! - [`SensorDriver`] - SDK entry points (open a device, create a tracker)
//! - [`DepthSensor`] - An opened device producing raw captures
//! - [`BodyTracker`] / [`BodyFrame`] - Tracker queue and its results
//! - [`negotiate`] - Accelerated-first tracker creation with baseline fallback
//! - [`SimulatedDriver`] - Hardware-free implementation of all of the above

pub mod negotiator;
pub mod sensor_trait;
pub mod simulated;

pub use negotiator::negotiate;
pub use sensor_trait::{BodyFrame, BodyTracker, DepthSensor, SensorDriver};
pub use simulated::{
    synthetic_skeleton, SimulatedCapture, SimulatedDevice, SimulatedDriver, SimulatedFrame,
    SimulatedTracker,
};
