//! minimizer::finite_diff — numerical derivatives of χ²-like objectives.
//!
//! Purpose
//! -------
//! Supply gradients to L-BFGS when an objective has no analytic one, and
//! Hessians to the curvature-based error estimate, all checked for shape
//! and finiteness before they leave this module.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: sequential forward differences through `finitediff`.
//!   Objective failures are parked in a `RefCell` by the caller's closure
//!   and re-raised once the sweep is done.
//! - [`par_central_diff`]: central differences with one rayon task per
//!   coordinate; the objective must be `Sync`.
//! - [`compute_hessian`]: central Hessian of a gradient function, retried
//!   with forward differences if the central one is not finite, then
//!   symmetrized.
//!
//! Invariants & assumptions
//! ------------------------
//! - An objective failure anywhere in a sweep fails the whole derivative.
//!
//! Testing notes
//! -------------
//! - Unit tests compare both gradient paths against analytic derivatives
//!   and exercise failure propagation.
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use ndarray::Array1;
use rayon::prelude::*;
use std::cell::RefCell;

/// Relative step used by [`par_central_diff`]; `ε^{1/3}` balances
/// truncation against round-off for central differences.
pub const CENTRAL_DIFF_STEP: f64 = 6.055_454_452_393_343e-6;

/// Forward-difference gradient of `func` at `theta`.
///
/// `func` reports failures by storing them in `failure` and returning
/// `NaN`; the cell is cleared first and drained after the sweep.
///
/// # Errors
/// - The stored failure, converted into `OptError`.
/// - [`validate_grad`] errors.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, failure: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    failure.replace(None);
    let grad = theta.forward_diff(func);
    if let Some(err) = failure.take() {
        return Err(err.into());
    }
    validate_grad(&grad, theta.len())?;
    Ok(grad)
}

/// par_central_diff — central-difference gradient evaluated on the rayon pool.
///
/// Each coordinate `i` is handled by its own task, which evaluates `func`
/// at `θ ± h_i e_i` with `h_i = CENTRAL_DIFF_STEP · max(1, |θ_i|)`. The
/// first failing evaluation aborts the gradient.
///
/// # Errors
/// - Any error returned by `func`.
/// - Validation errors from [`validate_grad`].
pub fn par_central_diff<G>(theta: &Theta, func: &G) -> OptResult<Grad>
where
    G: Fn(&Theta) -> OptResult<f64> + Sync,
{
    let dim = theta.len();
    let entries = (0..dim)
        .into_par_iter()
        .map(|i| {
            let h = CENTRAL_DIFF_STEP * theta[i].abs().max(1.0);
            let mut shifted = theta.clone();
            shifted[i] = theta[i] + h;
            let f_plus = func(&shifted)?;
            shifted[i] = theta[i] - h;
            let f_minus = func(&shifted)?;
            Ok((f_plus - f_minus) / (2.0 * h))
        })
        .collect::<OptResult<Vec<f64>>>()?;
    let grad = Array1::from(entries);
    validate_grad(&grad, dim)?;
    Ok(grad)
}

/// Hessian of the function whose gradient is `grad_fn`, at `theta`.
///
/// # Errors
/// [`validate_hessian`] errors when neither the central nor the forward
/// scheme yields a finite matrix.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(grad_fn: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let central = theta.central_hessian(grad_fn);
    let mut hess = if validate_hessian(&central, dim).is_ok() {
        central
    } else {
        let forward = theta.forward_hessian(grad_fn);
        validate_hessian(&forward, dim)?;
        forward
    };
    symmetrize(&mut hess);
    Ok(hess)
}

/// Average mirrored off-diagonal entries.
fn symmetrize(hess: &mut Hessian) {
    let n = hess.nrows();
    for i in 1..n {
        for j in 0..i {
            let mean = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = mean;
            hess[[j, i]] = mean;
        }
    }
}
