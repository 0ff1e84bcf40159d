//! inference::hessian — parameter covariance from the χ² curvature.
//!
//! Purpose
//! -------
//! Turn a minimized χ² into parameter uncertainties without resampling:
//! near the minimum `χ²(θ) ≈ χ²(θ̂) + ½ (θ − θ̂)ᵀ H (θ − θ̂)`, so the
//! parameter covariance is `Cov(θ̂) = 2 H⁻¹`.
//!
//! Key behaviors
//! -------------
//! - The χ² gradient is a rayon-parallel central difference
//!   ([`par_central_diff`]); the Hessian is a finite difference of that
//!   gradient ([`compute_hessian`]), symmetrized.
//! - `H` is inverted through the same eigen pseudo-inverse the covariance
//!   engine uses, so flat directions (unconstrained parameters) are
//!   dropped with a warning instead of producing huge variances.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ̂` is the full parameter vector, nuisance entries included; the
//!   returned covariance is `n_theta × n_theta`.
//! - The χ² is smooth around `θ̂`; a failing evaluation aborts the
//!   Hessian.
//!
//! Conventions
//! -----------
//! - Standard errors are reported for the model parameters only (the
//!   leading `npar` entries).
use crate::{
    fit::{
        core::data::FitData,
        errors::{FitError, FitResult},
    },
    optimization::{
        errors::OptError,
        minimizer::{
            Theta,
            finite_diff::{compute_hessian, par_central_diff},
        },
        numerical_stability::{PinvOptions, pseudo_inverse_symmetric},
    },
};
use ndarray::{Array1, Array2, s};

/// Covariance `2 H⁺` of the full parameter vector at `theta_hat`.
///
/// # Errors
/// - [`FitError::LengthMismatch`] if `theta_hat.len() != n_theta`.
/// - [`FitError::Optimization`] if the finite-difference Hessian is not
///   finite.
pub fn chi2_parameter_covariance(
    data: &FitData<'_>, theta_hat: &Array1<f64>,
) -> FitResult<Array2<f64>> {
    data.require_model()?;
    let n = data.n_theta();
    if theta_hat.len() != n {
        return Err(FitError::LengthMismatch {
            what: "parameter vector",
            expected: n,
            actual: theta_hat.len(),
        });
    }
    let chi2 = |theta: &Theta| data.chi2_value(theta).map_err(OptError::from);
    // A failed gradient poisons the Hessian with NaN, which its validation
    // rejects.
    let grad = |theta: &Theta| {
        par_central_diff(theta, &chi2).unwrap_or_else(|_| Array1::from_elem(theta.len(), f64::NAN))
    };
    let mut hess = compute_hessian(&grad, theta_hat)?;
    pseudo_inverse_symmetric(&mut hess, true, &PinvOptions::default())?;
    Ok(hess * 2.0)
}

/// Standard errors of the model parameters at `theta_hat`.
///
/// # Errors
/// Same as [`chi2_parameter_covariance`].
pub fn chi2_standard_errors(data: &FitData<'_>, theta_hat: &Array1<f64>) -> FitResult<Array1<f64>> {
    let cov = chi2_parameter_covariance(data, theta_hat)?;
    let npar = data.npar();
    Ok(cov.diag().slice(s![..npar]).mapv(|v| v.max(0.0).sqrt()))
}
