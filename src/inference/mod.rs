//! inference — curvature-based parameter uncertainties for χ² fits.
//!
//! Purpose
//! -------
//! Complement resampled errors with the classical estimate read off the χ²
//! curvature at the minimum: `Cov(θ̂) = 2 H⁺`, with `H` the finite-difference
//! Hessian of the χ².
//!
//! Key behaviors
//! -------------
//! - [`chi2_parameter_covariance`] returns the full `n_theta × n_theta`
//!   covariance, x nuisance parameters included.
//! - [`chi2_standard_errors`] returns the model-parameter standard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - The χ² is evaluated on the data as currently configured (mask,
//!   filter, covariance); call these right after the fit they describe.
//! - Flat Hessian directions are dropped by the pseudo-inverse and
//!   reported through `log::warn!`.
//!
//! Downstream usage
//! ----------------
//! - After `fit`, rebuild `θ̂ = [params; x_estimates]` (or take
//!   `FitOutcome::optim.theta_hat`) and pass it with the same `FitData`.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against the analytic weighted least-squares
//!   covariance of a straight line.

pub mod hessian;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::hessian::{chi2_parameter_covariance, chi2_standard_errors};

pub mod prelude {
    pub use super::hessian::{chi2_parameter_covariance, chi2_standard_errors};
}
