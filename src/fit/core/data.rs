//! Fit data container — observations, covariance blocks, masks, and caches.
//!
//! Purpose
//! -------
//! Provide the central aggregate of a correlated χ² fit: observed abscissae
//! `x` (`nxdim × ndata`) and ordinates `y` (`nydim × ndata`), their
//! covariance blocks, the per-point fit mask, a correlation filter, the bound
//! model, and the lazily rebuilt inverse covariance used by the χ²
//! evaluator.
//!
//! Key behaviors
//! -------------
//! - Shapes `(ndata, nxdim, nydim)` are fixed at construction by
//!   [`FitData::new`]; every setter checks indices against them.
//! - Every setter that affects the covariance layout (covariance blocks,
//!   fit mask, correlation filter, x-uncertainty flags) invalidates the
//!   inverse cache. Value setters (`set_x`, `set_y`, …) do not.
//! - The model is borrowed (`&'m dyn FitModel`) and dimension-checked when
//!   bound.
//! - Degrees of freedom, χ²/dof and the χ² p-value are derived from the last
//!   saved [`Chi2Report`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `ndata > 0` and `nydim > 0`; `nxdim` may be `0` for models without an
//!   abscissa.
//! - The correlation filter is symmetric with ones on the diagonal.
//! - Block sizes used by the χ² are driven by the number of *active* points,
//!   never by `ndata`.
//!
//! Conventions
//! -----------
//! - Parameter vectors handed to the χ² are laid out as
//!   `θ = [model parameters (npar); x nuisance estimates (n_nuisance)]` with
//!   the nuisance estimate of x dimension `j` (counted over dimensions with
//!   x uncertainty) at active point `p` stored at `npar + j·nfit + p`.
//! - Indices are 0-based.
use crate::{
    fit::{
        core::{
            blocks::SymBlocks,
            chi2::Chi2Scratch,
            inversion::InverseCache,
            model::FitModel,
            options::Chi2Report,
        },
        errors::{FitError, FitResult},
    },
    optimization::numerical_stability::PinvOptions,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::cell::RefCell;
use std::ops::Range;
use thread_local::ThreadLocal;

/// Optional additive χ² term evaluated on the full parameter vector.
pub type Extension<'m> = Box<dyn Fn(ArrayView1<f64>) -> f64 + Send + Sync + 'm>;

/// FitData — observations, covariances and fit configuration for one fit.
///
/// Fields are private; use the accessors and setters below. See the module
/// docs for the parameter layout and invalidation rules.
pub struct FitData<'m> {
    pub(crate) ndata: usize,
    pub(crate) nxdim: usize,
    pub(crate) nydim: usize,
    pub(crate) x: Array2<f64>,
    pub(crate) y: Array2<f64>,
    pub(crate) y_cov: SymBlocks,
    pub(crate) x_cov: SymBlocks,
    /// `Cov(y dim ky, x dim kx)` at `ky * nxdim + kx`.
    pub(crate) xy_cov: Vec<Array2<f64>>,
    pub(crate) cor_filter: Array2<f64>,
    pub(crate) to_fit: Vec<bool>,
    pub(crate) have_x_covar: Vec<bool>,
    pub(crate) have_xy_covar: Vec<bool>,
    pub(crate) is_x_correlated: bool,
    pub(crate) is_y_correlated: bool,
    pub(crate) model: Option<&'m dyn FitModel>,
    pub(crate) ndpar: usize,
    pub(crate) extension: Option<Extension<'m>>,
    pub(crate) inverse: InverseCache,
    pub(crate) scratch: ThreadLocal<RefCell<Chi2Scratch>>,
    pub(crate) pinv: PinvOptions,
    report: Option<Chi2Report>,
    current_sample: usize,
}

impl<'m> FitData<'m> {
    /// Create fit data with zero observations, identity y/x covariances,
    /// zero cross covariances, every point active and a unit correlation
    /// filter.
    ///
    /// # Errors
    /// [`FitError::InvalidShape`] if `ndata == 0` or `nydim == 0`.
    pub fn new(ndata: usize, nxdim: usize, nydim: usize) -> FitResult<Self> {
        if ndata == 0 || nydim == 0 {
            return Err(FitError::InvalidShape { ndata, nxdim, nydim });
        }
        Ok(Self {
            ndata,
            nxdim,
            nydim,
            x: Array2::zeros((nxdim, ndata)),
            y: Array2::zeros((nydim, ndata)),
            y_cov: SymBlocks::new(nydim, ndata),
            x_cov: SymBlocks::new(nxdim, ndata),
            xy_cov: vec![Array2::zeros((ndata, ndata)); nydim * nxdim],
            cor_filter: Array2::ones((ndata, ndata)),
            to_fit: vec![true; ndata],
            have_x_covar: vec![false; nxdim],
            have_xy_covar: vec![false; nxdim],
            is_x_correlated: false,
            is_y_correlated: false,
            model: None,
            ndpar: 0,
            extension: None,
            inverse: InverseCache::default(),
            scratch: ThreadLocal::new(),
            pinv: PinvOptions::default(),
            report: None,
            current_sample: 0,
        })
    }

    // ---- Shape ----

    pub fn ndata(&self) -> usize {
        self.ndata
    }

    pub fn nxdim(&self) -> usize {
        self.nxdim
    }

    pub fn nydim(&self) -> usize {
        self.nydim
    }

    // ---- Values ----

    /// Observed abscissae, `nxdim × ndata`.
    pub fn x(&self) -> ArrayView2<f64> {
        self.x.view()
    }

    /// Observed ordinates, `nydim × ndata`.
    pub fn y(&self) -> ArrayView2<f64> {
        self.y.view()
    }

    pub fn x_value(&self, kx: usize, i: usize) -> FitResult<f64> {
        self.check_x_dim(kx)?;
        self.check_point(i)?;
        Ok(self.x[[kx, i]])
    }

    pub fn y_value(&self, ky: usize, i: usize) -> FitResult<f64> {
        self.check_y_dim(ky)?;
        self.check_point(i)?;
        Ok(self.y[[ky, i]])
    }

    pub fn set_x(&mut self, kx: usize, i: usize, value: f64) -> FitResult<()> {
        self.check_x_dim(kx)?;
        self.check_point(i)?;
        self.x[[kx, i]] = value;
        Ok(())
    }

    pub fn set_y(&mut self, ky: usize, i: usize, value: f64) -> FitResult<()> {
        self.check_y_dim(ky)?;
        self.check_point(i)?;
        self.y[[ky, i]] = value;
        Ok(())
    }

    /// Overwrite all points of x dimension `kx`.
    pub fn set_x_dim(&mut self, kx: usize, values: ArrayView1<f64>) -> FitResult<()> {
        self.check_x_dim(kx)?;
        self.check_len("x values", values.len())?;
        self.x.row_mut(kx).assign(&values);
        Ok(())
    }

    /// Overwrite all points of y dimension `ky`.
    pub fn set_y_dim(&mut self, ky: usize, values: ArrayView1<f64>) -> FitResult<()> {
        self.check_y_dim(ky)?;
        self.check_len("y values", values.len())?;
        self.y.row_mut(ky).assign(&values);
        Ok(())
    }

    // ---- Model ----

    /// Bind a model.
    ///
    /// # Errors
    /// [`FitError::ModelDimMismatch`] if the model's `(nxdim, nydim)` differ
    /// from the data's.
    pub fn set_model(&mut self, model: &'m dyn FitModel) -> FitResult<()> {
        let found = (model.nxdim(), model.nydim());
        let expected = (self.nxdim, self.nydim);
        if found != expected {
            return Err(FitError::ModelDimMismatch { expected, found });
        }
        self.model = Some(model);
        Ok(())
    }

    pub fn model(&self) -> Option<&'m dyn FitModel> {
        self.model
    }

    pub(crate) fn require_model(&self) -> FitResult<&'m dyn FitModel> {
        self.model.ok_or(FitError::ModelNotSet)
    }

    /// Model parameter count, `0` when no model is bound.
    pub fn npar(&self) -> usize {
        self.model.map_or(0, |m| m.npar())
    }

    /// Extra parameters that are not counted against the degrees of freedom.
    pub fn set_ndpar(&mut self, ndpar: usize) {
        self.ndpar = ndpar;
    }

    pub fn ndpar(&self) -> usize {
        self.ndpar
    }

    /// Add `f(θ)` to every χ² evaluation.
    pub fn set_extension<F>(&mut self, f: F)
    where
        F: Fn(ArrayView1<f64>) -> f64 + Send + Sync + 'm,
    {
        self.extension = Some(Box::new(f));
    }

    pub fn clear_extension(&mut self) {
        self.extension = None;
    }

    // ---- Fit mask ----

    pub fn fit_all_points(&mut self, fit: bool) {
        self.to_fit.iter_mut().for_each(|f| *f = fit);
        self.invalidate();
    }

    pub fn set_fit_point(&mut self, i: usize, fit: bool) -> FitResult<()> {
        self.check_point(i)?;
        self.to_fit[i] = fit;
        self.invalidate();
        Ok(())
    }

    /// Set the fit flag on the half-open point range `range`.
    pub fn set_fit_range(&mut self, range: Range<usize>, fit: bool) -> FitResult<()> {
        if range.end > self.ndata {
            return Err(FitError::PointOutOfRange { index: range.end - 1, ndata: self.ndata });
        }
        for i in range {
            self.to_fit[i] = fit;
        }
        self.invalidate();
        Ok(())
    }

    pub fn is_fit_point(&self, i: usize) -> FitResult<bool> {
        self.check_point(i)?;
        Ok(self.to_fit[i])
    }

    /// Number of active points.
    pub fn n_fit_points(&self) -> usize {
        self.to_fit.iter().filter(|f| **f).count()
    }

    /// Indices of active points in increasing order.
    pub fn active_points(&self) -> Vec<usize> {
        (0..self.ndata).filter(|&i| self.to_fit[i]).collect()
    }

    // ---- Correlation filter ----

    /// Keep (`true`) or drop (`false`) the covariance between points `i` and
    /// `j` without touching the stored covariance values.
    ///
    /// # Errors
    /// - [`FitError::PointOutOfRange`] for a bad index.
    /// - [`FitError::SelfDecorrelation`] if `i == j`.
    pub fn set_correlation_filter(&mut self, i: usize, j: usize, keep: bool) -> FitResult<()> {
        self.check_point(i)?;
        self.check_point(j)?;
        if i == j {
            return Err(FitError::SelfDecorrelation { index: i });
        }
        let value = if keep { 1.0 } else { 0.0 };
        self.cor_filter[[i, j]] = value;
        self.cor_filter[[j, i]] = value;
        self.invalidate();
        Ok(())
    }

    pub fn correlation_filter(&self, i: usize, j: usize) -> FitResult<bool> {
        self.check_point(i)?;
        self.check_point(j)?;
        Ok(self.cor_filter[[i, j]] != 0.0)
    }

    // ---- Flags and sizes ----

    pub fn is_y_correlated(&self) -> bool {
        self.is_y_correlated
    }

    pub fn is_x_correlated(&self) -> bool {
        self.is_x_correlated
    }

    /// Whether any y–x cross covariance has been set.
    pub fn has_xy_covariance(&self) -> bool {
        self.have_xy_covar.iter().any(|f| *f)
    }

    /// Whether x dimension `kx` carries uncertainty (own or cross
    /// covariance), i.e. gets nuisance parameters.
    pub fn has_x_uncertainty(&self, kx: usize) -> FitResult<bool> {
        self.check_x_dim(kx)?;
        Ok(self.have_x_covar[kx] || self.have_xy_covar[kx])
    }

    /// x dimensions carrying uncertainty, in increasing order.
    pub fn uncertain_x_dims(&self) -> Vec<usize> {
        (0..self.nxdim).filter(|&k| self.have_x_covar[k] || self.have_xy_covar[k]).collect()
    }

    /// `nydim × n_fit_points`.
    pub fn y_size(&self) -> usize {
        self.nydim * self.n_fit_points()
    }

    /// `(#x dims with uncertainty) × n_fit_points`.
    pub fn x_size(&self) -> usize {
        self.uncertain_x_dims().len() * self.n_fit_points()
    }

    /// Number of x nuisance parameters appended to θ.
    pub fn n_nuisance(&self) -> usize {
        self.x_size()
    }

    /// Full parameter vector length, `npar + n_nuisance`.
    pub fn n_theta(&self) -> usize {
        self.npar() + self.n_nuisance()
    }

    /// `n_fit_points · nydim − npar + ndpar`; may be negative.
    pub fn dof(&self) -> isize {
        (self.y_size() + self.ndpar) as isize - self.npar() as isize
    }

    // ---- Saved χ² ----

    pub fn chi2(&self) -> Option<f64> {
        self.report.as_ref().map(|r| r.chi2)
    }

    pub fn chi2_decomposition(&self) -> Option<&Array1<f64>> {
        self.report.as_ref().map(|r| &r.decomposition)
    }

    pub fn chi2_report(&self) -> Option<&Chi2Report> {
        self.report.as_ref()
    }

    /// χ²/dof of the saved fit; `None` without a saved χ² or with `dof <= 0`.
    pub fn chi2_per_dof(&self) -> Option<f64> {
        let dof = self.dof();
        if dof <= 0 {
            return None;
        }
        self.chi2().map(|c| c / dof as f64)
    }

    /// Upper-tail probability `P(χ²_dof > χ²)` of the saved fit.
    pub fn p_value(&self) -> Option<f64> {
        chi2_p_value(self.chi2()?, self.dof())
    }

    pub(crate) fn save_report(&mut self, report: Chi2Report) {
        self.report = Some(report);
    }

    pub(crate) fn restore_report(&mut self, report: Option<Chi2Report>) {
        self.report = report;
    }

    // ---- Diagnostics ----

    /// Replica currently loaded by the resampled driver (`0` = central).
    pub fn current_sample(&self) -> usize {
        self.current_sample
    }

    pub(crate) fn set_current_sample(&mut self, s: usize) {
        self.current_sample = s;
    }

    pub fn set_pinv_options(&mut self, opts: PinvOptions) {
        self.pinv = opts;
        self.invalidate();
    }

    pub fn pinv_options(&self) -> PinvOptions {
        self.pinv
    }

    // ---- Helper methods ----

    pub(crate) fn invalidate(&mut self) {
        self.inverse.invalidate();
    }

    pub(crate) fn check_x_dim(&self, kx: usize) -> FitResult<()> {
        if kx >= self.nxdim {
            return Err(FitError::DimensionOutOfRange { axis: "x", index: kx, ndim: self.nxdim });
        }
        Ok(())
    }

    pub(crate) fn check_y_dim(&self, ky: usize) -> FitResult<()> {
        if ky >= self.nydim {
            return Err(FitError::DimensionOutOfRange { axis: "y", index: ky, ndim: self.nydim });
        }
        Ok(())
    }

    pub(crate) fn check_point(&self, i: usize) -> FitResult<()> {
        if i >= self.ndata {
            return Err(FitError::PointOutOfRange { index: i, ndata: self.ndata });
        }
        Ok(())
    }

    fn check_len(&self, what: &'static str, actual: usize) -> FitResult<()> {
        if actual != self.ndata {
            return Err(FitError::LengthMismatch { what, expected: self.ndata, actual });
        }
        Ok(())
    }
}

/// Upper-tail χ² probability; `None` when `dof <= 0` or `chi2` is not finite.
pub fn chi2_p_value(chi2: f64, dof: isize) -> Option<f64> {
    if dof <= 0 || !chi2.is_finite() {
        return None;
    }
    let dist = ChiSquared::new(dof as f64).ok()?;
    Some(dist.sf(chi2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction defaults and shape validation.
    // - Index checks on value setters and the correlation filter.
    // - Fit-mask bookkeeping and the resulting sizes and dof.
    // - Model binding dimension checks.
    //
    // They intentionally DO NOT cover:
    // - Covariance setters, inversion and χ² evaluation (sibling modules).
    // -------------------------------------------------------------------------

    struct Line;

    impl FitModel for Line {
        fn name(&self) -> &str {
            "line"
        }
        fn nxdim(&self) -> usize {
            1
        }
        fn nydim(&self) -> usize {
            1
        }
        fn npar(&self) -> usize {
            2
        }
        fn eval(&self, _k: usize, x: ArrayView1<f64>, p: ArrayView1<f64>) -> f64 {
            p[0] + p[1] * x[0]
        }
    }

    #[test]
    // Purpose
    // -------
    // A fresh container has every point active, a unit filter and no
    // correlation flags.
    fn new_sets_documented_defaults() {
        // Arrange / Act
        let data = FitData::new(4, 1, 2).unwrap();

        // Assert
        assert_eq!(data.n_fit_points(), 4);
        assert_eq!(data.y_size(), 8);
        assert_eq!(data.x_size(), 0);
        assert!(!data.is_y_correlated() && !data.is_x_correlated());
        assert!(data.correlation_filter(0, 3).unwrap());
        assert!(data.chi2().is_none());
        assert!(matches!(FitData::new(0, 1, 1), Err(FitError::InvalidShape { .. })));
    }

    #[test]
    fn setters_reject_out_of_range_indices() {
        let mut data = FitData::new(3, 1, 1).unwrap();
        assert_eq!(
            data.set_y(1, 0, 1.0),
            Err(FitError::DimensionOutOfRange { axis: "y", index: 1, ndim: 1 })
        );
        assert_eq!(data.set_x(0, 3, 1.0), Err(FitError::PointOutOfRange { index: 3, ndata: 3 }));
        assert!(matches!(
            data.set_y_dim(0, array![1.0, 2.0].view()),
            Err(FitError::LengthMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Decorrelating a point from itself is an invalid argument; other pairs
    // are stored symmetrically.
    fn correlation_filter_is_symmetric_and_rejects_diagonal() {
        // Arrange
        let mut data = FitData::new(3, 0, 1).unwrap();

        // Act
        data.set_correlation_filter(0, 2, false).unwrap();

        // Assert
        assert!(!data.correlation_filter(2, 0).unwrap());
        assert_eq!(
            data.set_correlation_filter(1, 1, false),
            Err(FitError::SelfDecorrelation { index: 1 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Excluding one point removes `nydim` from `y_size` and from the dof.
    //
    // Given
    // -----
    // - 5 points, nydim = 1, a 2-parameter line, one dumb parameter.
    //
    // Expect
    // ------
    // - dof goes from 5 − 2 + 1 = 4 to 3.
    fn fit_mask_changes_sizes_and_dof() {
        // Arrange
        let model = Line;
        let mut data = FitData::new(5, 1, 1).unwrap();
        data.set_model(&model).unwrap();
        data.set_ndpar(1);
        let before = data.dof();

        // Act
        data.set_fit_point(2, false).unwrap();

        // Assert
        assert_eq!(before, 4);
        assert_eq!(before - data.dof(), 1);
        assert_eq!(data.active_points(), vec![0, 1, 3, 4]);
        data.set_fit_range(0..5, false).unwrap();
        assert_eq!(data.n_fit_points(), 0);
        assert!(data.set_fit_range(3..6, true).is_err());
    }

    #[test]
    fn set_model_checks_dimensions() {
        let model = Line;
        let mut data = FitData::new(2, 2, 1).unwrap();
        assert_eq!(
            data.set_model(&model),
            Err(FitError::ModelDimMismatch { expected: (2, 1), found: (1, 1) })
        );
        assert!(data.model().is_none());
    }

    #[test]
    fn chi2_p_value_matches_known_quantile() {
        // The 95th percentile of χ²(2) is 5.991464547...
        assert_relative_eq!(chi2_p_value(5.991464547107979, 2).unwrap(), 0.05, epsilon = 1e-9);
        assert!(chi2_p_value(1.0, 0).is_none());
    }

    #[test]
    // Purpose
    // -------
    // Far-tail p-values keep their magnitude instead of rounding to zero.
    //
    // Given
    // -----
    // - χ² = 200 with 2 degrees of freedom, where `P = e^{−100}`.
    //
    // Expect
    // ------
    // - A positive value within 1e-6 relative of `e^{−100}`.
    fn chi2_p_value_resolves_far_tail() {
        let p = chi2_p_value(200.0, 2).unwrap();
        assert!(p > 0.0);
        assert_relative_eq!(p, (-100.0_f64).exp(), max_relative = 1e-6);
    }
}
