//! driver — one deterministic χ² fit.
//!
//! Purpose
//! -------
//! Hand a configured [`FitData`] to a [`Minimizer`] as its own objective,
//! then collect the minimized parameters, the x nuisance estimates, the χ²,
//! the degrees of freedom, and the p-value.
//!
//! Key behaviors
//! -------------
//! - The starting point is `θ0 = [params; x̃]`, where the nuisance slots
//!   `x̃` are seeded with the observed x values of the active points.
//! - Unless the verbosity is `Quiet`, the active correlation kinds are
//!   logged at `info` level before the run and a summary line after it.
//! - Minimizer failures are returned as-is, wrapped in
//!   [`FitError::Optimization`]; no retry happens here. A run that stops
//!   without converging (line-search exit, iteration cap) is a failure too,
//!   and `params` is left untouched.
//! - On success the model part of `θ̂` is written back into `params`, and
//!   the χ² with its decomposition is saved on the data when
//!   [`FitOptions::save_chi2`] is set.
//!
//! Invariants & assumptions
//! ------------------------
//! - `params.len() == npar` of the bound model.
//! - The inverse covariance is built (or confirmed fresh) before the first
//!   objective evaluation.
use crate::{
    fit::{
        core::{
            data::{FitData, chi2_p_value},
            inversion::InverseCovariance,
            options::FitOptions,
        },
        errors::{FitError, FitResult},
    },
    optimization::{
        errors::OptError,
        minimizer::{Minimizer, OptimOutcome, Verbosity},
    },
};
use ndarray::{Array1, Array2, s};

/// Result of a successful [`fit`].
///
/// - `params`: minimized model parameters (`npar`).
/// - `x_estimates`: nuisance estimates of the uncertain x values, one row
///   per uncertain x dimension and one column per active point; empty when
///   no x dimension carries uncertainty.
/// - `chi2`: minimized χ², extension term included.
/// - `dof`: `n_fit_points · nydim − npar + ndpar`.
/// - `p_value`: upper-tail χ² probability, `None` when `dof <= 0`.
/// - `optim`: raw minimizer outcome over the full θ.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: Array1<f64>,
    pub x_estimates: Array2<f64>,
    pub chi2: f64,
    pub dof: isize,
    pub p_value: Option<f64>,
    pub optim: OptimOutcome,
}

impl FitOutcome {
    /// χ²/dof, `None` when `dof <= 0`.
    pub fn chi2_per_dof(&self) -> Option<f64> {
        (self.dof > 0).then(|| self.chi2 / self.dof as f64)
    }
}

/// Minimize the χ² of `data` starting from `params`.
///
/// # Errors
/// - [`FitError::ModelNotSet`] / [`FitError::NoActivePoints`].
/// - [`FitError::LengthMismatch`] if `params.len() != npar`.
/// - [`FitError::Optimization`] for any minimizer failure, including
///   [`OptError::NotConverged`].
/// - [`FitError::NonFiniteChi2`] if the minimizer ends on an overflowing
///   point.
pub fn fit<M: Minimizer>(
    params: &mut Array1<f64>, data: &mut FitData<'_>, minimizer: &M, opts: &FitOptions,
) -> FitResult<FitOutcome> {
    let model = data.require_model()?;
    let npar = model.npar();
    if params.len() != npar {
        return Err(FitError::LengthMismatch {
            what: "model parameters",
            expected: npar,
            actual: params.len(),
        });
    }
    let inv = data.inverse_covariance()?;
    if opts.verbosity != Verbosity::Quiet {
        log::info!(
            "fitting '{}' on {} points: {}",
            model.name(),
            inv.nfit(),
            correlation_summary(data)
        );
    }

    let theta0 = initial_theta(params, data, &inv);
    let optim = minimizer.minimize(&*data, theta0, opts.verbosity)?;
    if !optim.converged {
        return Err(FitError::Optimization(OptError::NotConverged {
            status: optim.status,
            iterations: optim.iterations,
        }));
    }
    let theta = &optim.theta_hat;

    let chi2 = if opts.save_chi2 {
        let report = data.evaluate_report(theta)?;
        let chi2 = report.chi2;
        data.save_report(report);
        chi2
    } else {
        data.chi2_value(theta)?
    };
    params.assign(&theta.slice(s![..npar]));

    let nfit = inv.nfit();
    let x_estimates =
        Array2::from_shape_fn((inv.x_dims.len(), nfit), |(j, p)| theta[npar + j * nfit + p]);
    let dof = data.dof();
    let p_value = chi2_p_value(chi2, dof);

    let outcome =
        FitOutcome { params: params.clone(), x_estimates, chi2, dof, p_value, optim };
    if opts.verbosity != Verbosity::Quiet {
        match outcome.chi2_per_dof() {
            Some(r) => log::info!(
                "fit '{}' done: chi2/dof = {r:.4} (dof = {dof}), converged = {}",
                model.name(),
                outcome.optim.converged
            ),
            None => log::info!(
                "fit '{}' done: chi2 = {chi2:.4} (dof = {dof}), converged = {}",
                model.name(),
                outcome.optim.converged
            ),
        }
    }
    Ok(outcome)
}

// ---- Helper methods ----

fn initial_theta(params: &Array1<f64>, data: &FitData<'_>, inv: &InverseCovariance) -> Array1<f64> {
    let npar = params.len();
    let nfit = inv.nfit();
    let mut theta = Array1::<f64>::zeros(npar + inv.x_size);
    theta.slice_mut(s![..npar]).assign(params);
    for (j, &kx) in inv.x_dims.iter().enumerate() {
        for (p, &i) in inv.active.iter().enumerate() {
            theta[npar + j * nfit + p] = data.x[[kx, i]];
        }
    }
    theta
}

fn correlation_summary(data: &FitData<'_>) -> String {
    let mut kinds = Vec::new();
    if data.is_y_correlated() {
        kinds.push("y-y");
    }
    if data.is_x_correlated() {
        kinds.push("x-x");
    }
    if data.has_xy_covariance() {
        kinds.push("y-x");
    }
    if kinds.is_empty() {
        "uncorrelated".to_string()
    } else {
        format!("correlated {}", kinds.join(", "))
    }
}
