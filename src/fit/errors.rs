//! Errors for correlated χ² fits (configuration, shape checks, evaluation,
//! and resampled-fit roll-up).
//!
//! This module defines [`FitError`], used by the fit data container, the fit
//! drivers, the resampling layer, and post-fit inference.
//!
//! ## Conventions
//! - **Indices are 0-based**: data dimensions run over `0..nxdim` /
//!   `0..nydim`, points over `0..ndata`, replicas over `0..nsample`.
//! - Invalid-argument and shape errors are returned immediately; numerical
//!   trouble in covariance inversion is never an error (it is logged).
//! - Minimizer failures are wrapped unchanged in [`FitError::Optimization`].
use crate::optimization::errors::OptError;

/// Crate-wide result alias for fit operations that may produce [`FitError`].
pub type FitResult<T> = Result<T, FitError>;

/// Unified error type for fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    // ---- Construction ----
    /// Point count and y dimension must both be positive.
    InvalidShape { ndata: usize, nxdim: usize, nydim: usize },

    // ---- Invalid arguments ----
    /// Dimension index out of range for the given axis (`"x"` or `"y"`).
    DimensionOutOfRange { axis: &'static str, index: usize, ndim: usize },

    /// Point index out of range.
    PointOutOfRange { index: usize, ndata: usize },

    /// A point cannot be decorrelated from itself.
    SelfDecorrelation { index: usize },

    // ---- Length mismatches ----
    /// A vector argument has the wrong length, including a diagonal vector
    /// passed where a full `ndata × ndata` block is required.
    LengthMismatch { what: &'static str, expected: usize, actual: usize },

    /// A matrix argument has the wrong shape; the matrix form of a length
    /// mismatch.
    ShapeMismatch { what: &'static str, expected: (usize, usize), actual: (usize, usize) },

    /// Bound model dimensions disagree with the fit data.
    ModelDimMismatch { expected: (usize, usize), found: (usize, usize) },

    /// A built-in model was configured with unusable settings.
    InvalidModelConfig { model: &'static str, reason: &'static str },

    // ---- Evaluation ----
    /// No model has been bound.
    ModelNotSet,

    /// Every point is excluded from the fit.
    NoActivePoints,

    /// χ² evaluated to NaN or ±inf.
    NonFiniteChi2 { value: f64 },

    // ---- Resampling ----
    /// Replica ensembles disagree in length or replica count.
    SampleMismatch { what: &'static str, expected: usize, actual: usize },

    /// A resampling estimator needs at least one configuration.
    EmptyEnsemble,

    /// A replica statistic needs more replicas than are available.
    TooFewReplicas { needed: usize, nsample: usize },

    /// Estimator reported a domain failure.
    EstimatorFailed { text: String },

    /// At least one fit in a resampled run failed. `failed` lists the replica
    /// indices (`0` is the central fit, replica `s` is `s + 1`).
    ResampleFailed { failed: Vec<usize>, first: Box<FitError> },

    // ---- Optimizer ----
    /// Minimizer or objective failure.
    Optimization(OptError),
}

impl std::error::Error for FitError {}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Construction ----
            FitError::InvalidShape { ndata, nxdim, nydim } => {
                write!(
                    f,
                    "Invalid fit data shape (ndata = {ndata}, nxdim = {nxdim}, nydim = {nydim}); \
                     ndata and nydim must be > 0"
                )
            }
            // ---- Invalid arguments ----
            FitError::DimensionOutOfRange { axis, index, ndim } => {
                write!(f, "{axis} dimension index {index} out of range (ndim = {ndim})")
            }
            FitError::PointOutOfRange { index, ndata } => {
                write!(f, "Point index {index} out of range (ndata = {ndata})")
            }
            FitError::SelfDecorrelation { index } => {
                write!(f, "Point {index} cannot be decorrelated from itself")
            }
            // ---- Length mismatches ----
            FitError::LengthMismatch { what, expected, actual } => {
                write!(f, "Length mismatch for {what}: expected {expected}, got {actual}")
            }
            FitError::ShapeMismatch { what, expected, actual } => {
                write!(f, "Shape mismatch for {what}: expected {expected:?}, got {actual:?}")
            }
            FitError::ModelDimMismatch { expected, found } => {
                write!(
                    f,
                    "Model dimensions (nxdim, nydim) = {found:?} do not match fit data {expected:?}"
                )
            }
            FitError::InvalidModelConfig { model, reason } => {
                write!(f, "Invalid {model} model configuration: {reason}")
            }
            // ---- Evaluation ----
            FitError::ModelNotSet => {
                write!(f, "No model bound to the fit data")
            }
            FitError::NoActivePoints => {
                write!(f, "No data point is included in the fit")
            }
            FitError::NonFiniteChi2 { value } => {
                write!(f, "Chi-square evaluated to a non-finite value: {value}")
            }
            // ---- Resampling ----
            FitError::SampleMismatch { what, expected, actual } => {
                write!(f, "Sample mismatch for {what}: expected {expected}, got {actual}")
            }
            FitError::EmptyEnsemble => {
                write!(f, "Resampling needs at least one configuration")
            }
            FitError::TooFewReplicas { needed, nsample } => {
                write!(f, "Need at least {needed} replicas, got {nsample}")
            }
            FitError::EstimatorFailed { text } => {
                write!(f, "Estimator failed: {text}")
            }
            FitError::ResampleFailed { failed, first } => {
                write!(f, "{} resampled fit(s) failed (indices {failed:?}); first: {first}", failed.len())
            }
            // ---- Optimizer ----
            FitError::Optimization(err) => {
                write!(f, "Optimization failed: {err}")
            }
        }
    }
}

impl From<OptError> for FitError {
    fn from(err: OptError) -> FitError {
        FitError::Optimization(err)
    }
}

/// Fit errors raised inside an objective travel through the minimizer as
/// [`OptError::ObjectiveFailed`].
impl From<FitError> for OptError {
    fn from(err: FitError) -> OptError {
        match err {
            FitError::Optimization(inner) => inner,
            other => OptError::ObjectiveFailed { text: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Wrapped optimizer errors unwrap back to the original `OptError`, other
    // fit errors become `ObjectiveFailed` carrying their message.
    fn fit_error_converts_into_opt_error() {
        // Arrange
        let wrapped = FitError::Optimization(OptError::NoTolerancesProvided);
        let domain = FitError::NoActivePoints;

        // Act
        let a: OptError = wrapped.into();
        let b: OptError = domain.clone().into();

        // Assert
        assert_eq!(a, OptError::NoTolerancesProvided);
        assert_eq!(b, OptError::ObjectiveFailed { text: domain.to_string() });
    }

    #[test]
    fn resample_failed_display_mentions_first_error() {
        let err = FitError::ResampleFailed {
            failed: vec![0, 3],
            first: Box::new(FitError::ModelNotSet),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 resampled"));
        assert!(msg.contains("No model bound"));
    }
}
