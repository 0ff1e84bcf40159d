//! χ² evaluator — residuals, quadratic form, decomposition.
//!
//! Purpose
//! -------
//! Map a parameter vector `θ = [p; ξ]` (model parameters `p`, x nuisance
//! estimates `ξ`) to the generalized χ²
//!
//! `χ²(θ) = rᵀ V r + ext(θ)`,
//!
//! where `r = [Y; X]`, `Y_{k,p} = f_k(x̃_p, p) − y_{k,p}` over active points
//! (with `x̃` the nuisance estimate for uncertain x dimensions and the
//! observed x otherwise), `X_{j,p} = ξ_{j,p} − x_{j,p}`, and `V` the cached
//! inverse covariance.
//!
//! Key behaviors
//! -------------
//! - Without cross covariance the form splits into
//!   `Yᵀ V_y Y + Xᵀ V_x X`; otherwise `V` is the joint inverse.
//! - Residual and product buffers are per-thread ([`Chi2Scratch`] inside a
//!   `thread_local::ThreadLocal`), resized on first use and reused across
//!   calls, so concurrent evaluations from one minimizer never share
//!   mutable state.
//! - [`FitData::chi2_components`] reports the pulls `r_i √V_ii`, the
//!   correlation term `rᵀVr − Σ pull_i²`, and the extension term.
//!
//! Invariants & assumptions
//! ------------------------
//! - Repeated evaluation with identical inputs and a warm cache is
//!   bit-for-bit reproducible.
//! - A non-finite χ² is reported as [`FitError::NonFiniteChi2`] by
//!   [`FitData::chi2_value`]. As a minimizer objective the same point costs
//!   [`NON_FINITE_CHI2_PENALTY`], so a line search can back off from it.
use crate::{
    fit::{
        core::{
            data::FitData,
            inversion::{InverseCovariance, InverseForm},
            options::Chi2Report,
        },
        errors::{FitError, FitResult},
    },
    optimization::{
        errors::OptResult,
        minimizer::{Cost, Objective, Theta, validation::validate_theta_input},
    },
};
use ndarray::{Array1, ArrayView1, linalg::general_mat_vec_mul, s};
use std::cell::RefCell;

/// Objective value of a point whose χ² overflows.
pub const NON_FINITE_CHI2_PENALTY: f64 = 1e30;

/// Per-thread evaluation buffers.
#[derive(Debug, Default)]
pub struct Chi2Scratch {
    xbuf: Array1<f64>,
    resid: Array1<f64>,
    tmp: Array1<f64>,
}

impl Chi2Scratch {
    fn resize(&mut self, nxdim: usize, n: usize) {
        if self.xbuf.len() != nxdim {
            self.xbuf = Array1::zeros(nxdim);
        }
        if self.resid.len() != n {
            self.resid = Array1::zeros(n);
            self.tmp = Array1::zeros(n);
        }
    }
}

impl<'m> FitData<'m> {
    /// χ² at `θ`, including the extension term.
    ///
    /// # Errors
    /// - [`FitError::ModelNotSet`], [`FitError::NoActivePoints`].
    /// - [`FitError::LengthMismatch`] if `θ.len() != npar + n_nuisance`.
    /// - [`FitError::NonFiniteChi2`].
    pub fn chi2_value(&self, theta: &Array1<f64>) -> FitResult<f64> {
        let quad = self.with_residuals(theta.view(), |inv, scratch| quadratic_form(inv, scratch))?;
        let chi2 = quad + self.extension_term(theta.view());
        if !chi2.is_finite() {
            return Err(FitError::NonFiniteChi2 { value: chi2 });
        }
        Ok(chi2)
    }

    /// Residual vector `[Y; X]` at `θ`.
    pub fn residuals(&self, theta: &Array1<f64>) -> FitResult<Array1<f64>> {
        self.with_residuals(theta.view(), |_, scratch| scratch.resid.clone())
    }

    /// Per-term χ² decomposition at `θ`, length `y_size + x_size + 2`:
    /// `[pulls of Y; pulls of X; correlation term; extension term]`.
    ///
    /// The entries satisfy `Σ pull² + correlation + extension = χ²(θ)`.
    pub fn chi2_components(&self, theta: &Array1<f64>) -> FitResult<Array1<f64>> {
        let (quad, pulls) = self.with_residuals(theta.view(), |inv, scratch| {
            let quad = quadratic_form(inv, scratch);
            let pulls: Vec<f64> = scratch
                .resid
                .iter()
                .enumerate()
                .map(|(i, r)| r * inv.diagonal(i).max(0.0).sqrt())
                .collect();
            (quad, pulls)
        })?;
        let diag_sum: f64 = pulls.iter().map(|p| p * p).sum();
        let n = pulls.len();
        let mut out = Array1::<f64>::zeros(n + 2);
        out.slice_mut(s![..n]).assign(&Array1::from(pulls));
        out[n] = quad - diag_sum;
        out[n + 1] = self.extension_term(theta.view());
        Ok(out)
    }

    /// χ² and decomposition at `θ`, in the form saved by a fit.
    pub fn evaluate_report(&self, theta: &Array1<f64>) -> FitResult<Chi2Report> {
        let chi2 = self.chi2_value(theta)?;
        let decomposition = self.chi2_components(theta)?;
        Ok(Chi2Report { chi2, decomposition })
    }

    // ---- Helper methods ----

    fn extension_term(&self, theta: ArrayView1<f64>) -> f64 {
        self.extension.as_ref().map_or(0.0, |ext| ext(theta))
    }

    /// Fill this thread's residual buffer for `θ` and hand it to `f`.
    fn with_residuals<R, F>(&self, theta: ArrayView1<f64>, f: F) -> FitResult<R>
    where
        F: FnOnce(&InverseCovariance, &mut Chi2Scratch) -> R,
    {
        let model = self.require_model()?;
        let inv = self.inverse_covariance()?;
        let npar = model.npar();
        let expected = npar + inv.x_size;
        if theta.len() != expected {
            return Err(FitError::LengthMismatch {
                what: "parameter vector",
                expected,
                actual: theta.len(),
            });
        }
        let params = theta.slice(s![..npar]);
        let nuisance = theta.slice(s![npar..]);
        let nfit = inv.nfit();

        let cell = self.scratch.get_or(|| RefCell::new(Chi2Scratch::default()));
        let mut scratch = cell.borrow_mut();
        scratch.resize(self.nxdim, inv.y_size + inv.x_size);
        let Chi2Scratch { xbuf, resid, .. } = &mut *scratch;

        for (p, &i) in inv.active.iter().enumerate() {
            for kx in 0..self.nxdim {
                xbuf[kx] = match inv.x_slot[kx] {
                    Some(j) => nuisance[j * nfit + p],
                    None => self.x[[kx, i]],
                };
            }
            for k in 0..self.nydim {
                resid[k * nfit + p] = model.eval(k, xbuf.view(), params) - self.y[[k, i]];
            }
        }
        for (j, &kx) in inv.x_dims.iter().enumerate() {
            for (p, &i) in inv.active.iter().enumerate() {
                let idx = j * nfit + p;
                resid[inv.y_size + idx] = nuisance[idx] - self.x[[kx, i]];
            }
        }
        Ok(f(&*inv, &mut *scratch))
    }
}

/// `rᵀ V r` over the residuals currently held in `scratch`.
fn quadratic_form(inv: &InverseCovariance, scratch: &mut Chi2Scratch) -> f64 {
    let Chi2Scratch { resid, tmp, .. } = scratch;
    match &inv.form {
        InverseForm::Joint(v) => {
            general_mat_vec_mul(1.0, v, &*resid, 0.0, tmp);
            resid.dot(&*tmp)
        }
        InverseForm::Split { y, x } => {
            let ys = inv.y_size;
            general_mat_vec_mul(1.0, y, &resid.slice(s![..ys]), 0.0, &mut tmp.slice_mut(s![..ys]));
            let mut total = resid.slice(s![..ys]).dot(&tmp.slice(s![..ys]));
            if let Some(vx) = x {
                general_mat_vec_mul(
                    1.0,
                    vx,
                    &resid.slice(s![ys..]),
                    0.0,
                    &mut tmp.slice_mut(s![ys..]),
                );
                total += resid.slice(s![ys..]).dot(&tmp.slice(s![ys..]));
            }
            total
        }
    }
}

/// The χ² is the objective; `FitData` is its own evaluation context.
impl<'m> Objective for FitData<'m> {
    fn value(&self, theta: &Theta) -> OptResult<Cost> {
        match self.chi2_value(theta) {
            Ok(chi2) => Ok(chi2),
            Err(FitError::NonFiniteChi2 { .. }) => Ok(NON_FINITE_CHI2_PENALTY),
            Err(e) => Err(e.into()),
        }
    }

    fn check(&self, theta: &Theta) -> OptResult<()> {
        self.require_model()?;
        self.inverse_covariance()?;
        validate_theta_input(theta, self.n_theta())
    }
}
