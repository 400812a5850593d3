//! Error types for evaluation.

use glam::Vec3;
use thiserror::Error;

use crate::sampling::SamplingError;

/// Errors that stop a tick from being evaluated.
///
/// Finding no hidden point is not an error; see [`crate::EvasionController::evaluate_tick`].
#[derive(Debug, Error)]
pub enum EvasionError {
    /// Caller passed a position containing NaN or infinity
    #[error("{what} position is not finite: {value}")]
    NonFiniteGeometry { what: &'static str, value: Vec3 },
    /// Sampler parameters from the configuration were rejected
    #[error("sampling failed: {0}")]
    Sampling(#[from] SamplingError),
}

pub(crate) fn ensure_finite(what: &'static str, value: Vec3) -> Result<Vec3, EvasionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvasionError::NonFiniteGeometry { what, value })
    }
}
