//! Fit model interface.
//!
//! A model maps an abscissa point `x ∈ ℝ^{nxdim}` and a parameter vector
//! `p ∈ ℝ^{npar}` to `nydim` ordinates `f_k(x, p)`. Models are borrowed by
//! [`FitData`](crate::fit::core::FitData) and evaluated from several worker
//! threads at once, hence the `Send + Sync` bound.
use ndarray::ArrayView1;

/// Parametric model `y_k = f_k(x, p)` for `k = 0..nydim`.
///
/// Implementations must return a value for every `k < nydim()` and may
/// assume `x.len() == nxdim()` and `p.len() == npar()`; the fit layer checks
/// both before evaluating.
pub trait FitModel: Send + Sync {
    /// Human-readable name used in log lines.
    fn name(&self) -> &str;

    fn nxdim(&self) -> usize;

    fn nydim(&self) -> usize;

    /// Number of model parameters.
    fn npar(&self) -> usize;

    /// Evaluate dimension `k` of the model at `x` with parameters `p`.
    fn eval(&self, k: usize, x: ArrayView1<f64>, p: ArrayView1<f64>) -> f64;
}
