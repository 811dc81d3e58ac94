//! # bodystream-rs: Body Tracking Stream Publisher
//!
//! Reads depth captures from a body-tracking depth sensor, runs them through
//! the body tracker and publishes the skeleton of the single tracked subject
//! as one fixed-width sample per frame on a network stream.
//!
//! ## Architecture
//!
//! - **Sensor**: Collaborator traits for the depth device and body tracker,
//!   tracker mode negotiation, and a simulated sensor
//! - **Stream**: Channel layout, stream descriptor, consumer-gated publisher
//!   and the TCP / in-memory outlets
//! - **Acquisition**: The capture → track → extract → publish loop
//! - **Streamer**: Session setup, acquisition and ordered teardown
//!
//! ## Configuration
//!
//! Settings are read from a TOML file, by default in the platform config
//! directory under `dev.bodystream.bodystream-rs`. See [`config`].
//!
//! ## Example
//!
//! ```ignore
//! use bodystream_rs::{
//!     config::AppConfig,
//!     sensor::SimulatedDriver,
//!     stream::TcpTransport,
//!     Streamer,
//! };
//!
//! let config = AppConfig::default();
//! let mut driver = SimulatedDriver::new(config.simulation.clone());
//! let mut transport = TcpTransport::new(config.stream.listen.clone());
//!
//! let report = Streamer::run(&mut driver, &mut transport, &config)?;
//! std::process::exit(report.exit_code());
//! ```

pub mod acquisition;
pub mod config;
pub mod error;
pub mod sensor;
pub mod stream;
pub mod streamer;
pub mod types;

// Re-export commonly used types
pub use acquisition::{AcquisitionLoop, AcquisitionSettings, AcquisitionStats, LoopOutcome};
pub use config::{AppConfig, EmptyFramePolicy};
pub use error::{Result, StreamError, WaitError};
pub use streamer::{SessionReport, Streamer};
pub use types::{JointCatalog, JointId, ProcessingMode};
