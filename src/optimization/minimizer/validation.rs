//! Finiteness and shape checks shared by the minimizer layer.
//!
//! Tolerances are checked when options are built, parameter vectors before
//! they reach an objective, and gradients, Hessians, costs and the best
//! point after they come back. Every check reports the first offending entry.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{Grad, Theta, types::Hessian},
};

fn first_non_finite<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(usize, f64)> {
    values.into_iter().copied().enumerate().find(|(_, v)| !v.is_finite())
}

fn tolerance_problem(tol: f64) -> Option<&'static str> {
    if !tol.is_finite() {
        Some("not finite")
    } else if tol <= 0.0 {
        Some("must be strictly positive")
    } else {
        None
    }
}

/// # Errors
/// [`OptError::InvalidTolGrad`] for a non-finite or non-positive tolerance.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    match tol.and_then(|t| tolerance_problem(t).map(|r| (t, r))) {
        Some((tol, reason)) => Err(OptError::InvalidTolGrad { tol, reason }),
        None => Ok(()),
    }
}

/// # Errors
/// [`OptError::InvalidTolCost`] for a non-finite or non-positive tolerance.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    match tol.and_then(|t| tolerance_problem(t).map(|r| (t, r))) {
        Some((tol, reason)) => Err(OptError::InvalidTolCost { tol, reason }),
        None => Ok(()),
    }
}

/// Check a parameter vector handed to an objective.
///
/// # Errors
/// - [`OptError::ThetaLengthMismatch`] if `theta.len() != expected`.
/// - [`OptError::InvalidThetaInput`] for the first non-finite entry.
pub fn validate_theta_input(theta: &Theta, expected: usize) -> OptResult<()> {
    if theta.len() != expected {
        return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
    }
    match first_non_finite(theta) {
        Some((index, value)) => Err(OptError::InvalidThetaInput { index, value }),
        None => Ok(()),
    }
}

/// # Errors
/// - [`OptError::GradientDimMismatch`] if `grad.len() != dim`.
/// - [`OptError::InvalidGradient`] for the first non-finite entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match first_non_finite(grad) {
        Some((index, value)) => {
            Err(OptError::InvalidGradient { index, value, reason: "not finite" })
        }
        None => Ok(()),
    }
}

/// Unwrap the solver's best point.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] for `None`.
/// - [`OptError::InvalidThetaHat`] for the first non-finite entry.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some((index, value)) = first_non_finite(&theta) {
        return Err(OptError::InvalidThetaHat { index, value, reason: "not finite" });
    }
    Ok(theta)
}

/// # Errors
/// [`OptError::NonFiniteCost`] for `NaN` or `±∞`.
pub fn validate_value(value: f64) -> OptResult<()> {
    if value.is_finite() { Ok(()) } else { Err(OptError::NonFiniteCost { value }) }
}

/// # Errors
/// - [`OptError::HessianDimMismatch`] unless `hessian` is `dim × dim`.
/// - [`OptError::InvalidHessian`] for the first non-finite entry, row-major.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.dim() != (dim, dim) {
        return Err(OptError::HessianDimMismatch { expected: dim, found: hessian.dim() });
    }
    match hessian.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), &value)) => Err(OptError::InvalidHessian { row, col, value }),
        None => Ok(()),
    }
}
