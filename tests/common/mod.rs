//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use bodystream_rs::config::{AppConfig, SimulationConfig};
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Config that runs `frames` cycles without real-time pacing
pub fn fast_config(frames: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.acquisition.frame_limit = Some(frames);
    config.stream.consumer_poll_ms = 10;
    config.simulation = SimulationConfig {
        realtime: false,
        ..SimulationConfig::default()
    };
    config
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
