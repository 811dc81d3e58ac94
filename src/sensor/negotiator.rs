//! Tracker capability negotiation
//!
//! The accelerated tracker is tried first. If it cannot be created the
//! failure is logged and the baseline tracker is created instead. Only a
//! baseline failure is reported to the caller.

use super::sensor_trait::SensorDriver;
use crate::error::{Result, StreamError};
use crate::types::{Calibration, ProcessingMode};

/// Create exactly one tracker, preferring the accelerated backend
///
/// With `prefer_accelerated == false` only the baseline backend is tried.
pub fn negotiate<D: SensorDriver>(
    driver: &mut D,
    calibration: &Calibration,
    prefer_accelerated: bool,
) -> Result<(D::Tracker, ProcessingMode)> {
    if prefer_accelerated {
        match driver.create_tracker(calibration, ProcessingMode::Accelerated) {
            Ok(tracker) => {
                tracing::info!("Body tracker running in accelerated mode");
                return Ok((tracker, ProcessingMode::Accelerated));
            }
            Err(e) => {
                tracing::warn!(
                    "Accelerated body tracker unavailable ({}), falling back to baseline mode",
                    e
                );
            }
        }
    }

    let tracker = driver
        .create_tracker(calibration, ProcessingMode::Baseline)
        .map_err(|e| match e {
            err @ StreamError::TrackerInit { .. } => err,
            other => StreamError::TrackerInit {
                mode: ProcessingMode::Baseline,
                message: other.to_string(),
            },
        })?;

    tracing::info!("Body tracker running in baseline (slow) mode");
    Ok((tracker, ProcessingMode::Baseline))
}
