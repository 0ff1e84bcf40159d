//! Covariance inversion engine — assembly, pseudo-inversion, and caching.
//!
//! Purpose
//! -------
//! Produce the inverse covariance actually used by the χ² evaluator,
//! restricted to the active fit points, lazily and cached until the next
//! covariance-affecting mutation of the fit data.
//!
//! Key behaviors
//! -------------
//! - Assemble the y block (`y_size × y_size`) from every y–y pair,
//!   multiplied entry-wise by the correlation filter and restricted to
//!   active points; block `(k1, k2)` holds `Cov(k1, k2)` and block
//!   `(k2, k1)` its transpose.
//! - Do the same for the x block over x dimensions that carry uncertainty.
//! - Without cross covariance, pseudo-invert the y and x blocks separately
//!   (eigen path if the family is correlated, reciprocal diagonal
//!   otherwise). With cross covariance, assemble and pseudo-invert the full
//!   `[[C_y, C_yx], [C_yxᵀ, C_x]]` matrix.
//! - Cache the result behind a generation counter: readers share an
//!   `Arc<InverseCovariance>` under a read lock; a stale entry is rebuilt by
//!   exactly one thread under the write lock.
//!
//! Invariants & assumptions
//! ------------------------
//! - A cached inverse is only returned when its generation equals the
//!   current one; all invalidating setters take `&mut FitData`, so no
//!   evaluation can observe a half-updated configuration.
//! - The layout snapshot stored with the inverse (active points, uncertain
//!   x dimensions) is the one the χ² uses to build residuals.
//!
//! Testing notes
//! -------------
//! - Unit tests check diagonal inversion, correlated 2×2 inversion through
//!   the fit data, filter application, mask restriction, joint inversion
//!   with cross covariance, and cache reuse/invalidation.
use crate::{
    fit::{
        core::data::FitData,
        errors::{FitError, FitResult},
    },
    optimization::numerical_stability::{PinvReport, pseudo_inverse_symmetric},
};
use ndarray::Array2;
use std::sync::{Arc, PoisonError, RwLock};

/// Inverse covariance in the layout used by the χ².
#[derive(Debug, Clone, PartialEq)]
pub enum InverseForm {
    /// Independent y and (optional) x inverses.
    Split { y: Array2<f64>, x: Option<Array2<f64>> },
    /// Single inverse over the concatenated `[Y; X]` residual.
    Joint(Array2<f64>),
}

/// Cached inverse covariance plus the layout it was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseCovariance {
    /// Active point indices, increasing.
    pub active: Vec<usize>,
    /// x dimensions carrying uncertainty, increasing.
    pub x_dims: Vec<usize>,
    /// For each x dimension, its position in `x_dims`.
    pub x_slot: Vec<Option<usize>>,
    pub y_size: usize,
    pub x_size: usize,
    pub form: InverseForm,
    pub report: PinvReport,
}

impl InverseCovariance {
    pub fn nfit(&self) -> usize {
        self.active.len()
    }

    /// Diagonal entry of the inverse for residual `i` of the concatenated
    /// `[Y; X]` vector.
    pub fn diagonal(&self, i: usize) -> f64 {
        match &self.form {
            InverseForm::Joint(m) => m[[i, i]],
            InverseForm::Split { y, x } => {
                if i < self.y_size {
                    y[[i, i]]
                } else {
                    x.as_ref().map_or(0.0, |m| m[[i - self.y_size, i - self.y_size]])
                }
            }
        }
    }
}

/// Generation-stamped cache of the inverse covariance.
#[derive(Debug, Default)]
pub struct InverseCache {
    generation: u64,
    slot: RwLock<Option<(u64, Arc<InverseCovariance>)>>,
}

impl InverseCache {
    /// Mark the cached inverse stale.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_fresh(&self) -> bool {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        matches!(guard.as_ref(), Some((g, _)) if *g == self.generation)
    }

    /// Return the cached inverse, building it first if stale.
    pub fn get_or_build<F>(&self, build: F) -> FitResult<Arc<InverseCovariance>>
    where
        F: FnOnce() -> FitResult<InverseCovariance>,
    {
        {
            let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((g, inv)) = guard.as_ref() {
                if *g == self.generation {
                    return Ok(Arc::clone(inv));
                }
            }
        }
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have rebuilt while we waited for the lock.
        if let Some((g, inv)) = guard.as_ref() {
            if *g == self.generation {
                return Ok(Arc::clone(inv));
            }
        }
        let inv = Arc::new(build()?);
        *guard = Some((self.generation, Arc::clone(&inv)));
        Ok(inv)
    }
}

impl<'m> FitData<'m> {
    /// Inverse covariance for the current configuration, rebuilt if stale.
    ///
    /// # Errors
    /// [`FitError::NoActivePoints`] if every point is excluded.
    pub fn inverse_covariance(&self) -> FitResult<Arc<InverseCovariance>> {
        self.inverse.get_or_build(|| self.build_inverse())
    }

    fn build_inverse(&self) -> FitResult<InverseCovariance> {
        let active = self.active_points();
        if active.is_empty() {
            return Err(FitError::NoActivePoints);
        }
        let nfit = active.len();
        let x_dims = self.uncertain_x_dims();
        let mut x_slot = vec![None; self.nxdim];
        for (j, &kx) in x_dims.iter().enumerate() {
            x_slot[kx] = Some(j);
        }
        let y_size = self.nydim * nfit;
        let x_size = x_dims.len() * nfit;

        let y_block = self.assemble_y(&active);
        let x_block = if x_size > 0 { Some(self.assemble_x(&active, &x_dims)) } else { None };

        let (form, report) = match x_block {
            Some(xb) if self.has_xy_covariance() => {
                let mut full = Array2::<f64>::zeros((y_size + x_size, y_size + x_size));
                full.slice_mut(ndarray::s![..y_size, ..y_size]).assign(&y_block);
                full.slice_mut(ndarray::s![y_size.., y_size..]).assign(&xb);
                self.place_cross(&mut full, &active, &x_dims);
                let report = pseudo_inverse_symmetric(&mut full, true, &self.pinv)?;
                (InverseForm::Joint(full), report)
            }
            Some(mut xb) => {
                let mut yb = y_block;
                let ry = pseudo_inverse_symmetric(&mut yb, self.is_y_correlated, &self.pinv)?;
                let rx = pseudo_inverse_symmetric(&mut xb, self.is_x_correlated, &self.pinv)?;
                let report = PinvReport {
                    discarded: ry.discarded + rx.discarded,
                    errorless: ry.errorless + rx.errorless,
                };
                (InverseForm::Split { y: yb, x: Some(xb) }, report)
            }
            None => {
                let mut yb = y_block;
                let report = pseudo_inverse_symmetric(&mut yb, self.is_y_correlated, &self.pinv)?;
                (InverseForm::Split { y: yb, x: None }, report)
            }
        };
        log::debug!(
            "inverse covariance rebuilt: {nfit} active points, y_size = {y_size}, x_size = {x_size}"
        );
        Ok(InverseCovariance { active, x_dims, x_slot, y_size, x_size, form, report })
    }

    // ---- Helper methods ----

    /// Filtered value of `block[[active[p], active[q]]]`.
    fn filtered(&self, block: &Array2<f64>, active: &[usize], p: usize, q: usize) -> f64 {
        let (i, j) = (active[p], active[q]);
        block[[i, j]] * self.cor_filter[[i, j]]
    }

    fn assemble_y(&self, active: &[usize]) -> Array2<f64> {
        let nfit = active.len();
        let mut out = Array2::<f64>::zeros((self.nydim * nfit, self.nydim * nfit));
        for k1 in 0..self.nydim {
            for k2 in k1..self.nydim {
                if let Some(block) = self.y_cov.stored(k1, k2) {
                    self.place_pair(&mut out, block, active, k1 * nfit, k2 * nfit);
                }
            }
        }
        out
    }

    fn assemble_x(&self, active: &[usize], x_dims: &[usize]) -> Array2<f64> {
        let nfit = active.len();
        let n = x_dims.len() * nfit;
        let mut out = Array2::<f64>::zeros((n, n));
        for (j1, &kx1) in x_dims.iter().enumerate() {
            for (j2, &kx2) in x_dims.iter().enumerate().skip(j1) {
                if let Some(block) = self.x_cov.stored(kx1, kx2) {
                    self.place_pair(&mut out, block, active, j1 * nfit, j2 * nfit);
                }
            }
        }
        out
    }

    /// Write `block` at `(r0, c0)` and, off the diagonal, its transpose at
    /// `(c0, r0)`.
    fn place_pair(
        &self, out: &mut Array2<f64>, block: &Array2<f64>, active: &[usize], r0: usize, c0: usize,
    ) {
        let nfit = active.len();
        for p in 0..nfit {
            for q in 0..nfit {
                let v = self.filtered(block, active, p, q);
                out[[r0 + p, c0 + q]] = v;
                if r0 != c0 {
                    out[[c0 + q, r0 + p]] = v;
                }
            }
        }
    }

    fn place_cross(&self, full: &mut Array2<f64>, active: &[usize], x_dims: &[usize]) {
        let nfit = active.len();
        let y_size = self.nydim * nfit;
        for ky in 0..self.nydim {
            for (j, &kx) in x_dims.iter().enumerate() {
                if !self.have_xy_covar[kx] {
                    continue;
                }
                let block = &self.xy_cov[ky * self.nxdim + kx];
                self.place_pair(full, block, active, ky * nfit, y_size + j * nfit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::core::covariance::{CovInput, CovarianceKind};
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Diagonal and correlated inversion through the fit data.
    // - Correlation filter and fit mask restriction.
    // - Joint inversion when a cross covariance exists.
    // - Cache reuse and invalidation.
    // -------------------------------------------------------------------------

    fn split_y(inv: &InverseCovariance) -> &Array2<f64> {
        match &inv.form {
            InverseForm::Split { y, .. } => y,
            InverseForm::Joint(_) => panic!("expected split form"),
        }
    }

    #[test]
    fn diagonal_covariance_inverts_to_reciprocals() {
        let mut data = FitData::new(3, 0, 1).unwrap();
        data.set_covariance(CovarianceKind::Y, 0, 0, CovInput::Diagonal(array![4.0, 0.25, 1.0]))
            .unwrap();
        let inv = data.inverse_covariance().unwrap();
        assert_eq!(split_y(&inv), &Array2::from_diag(&array![0.25, 4.0, 1.0]));
    }

    #[test]
    // Purpose
    // -------
    // The correlation filter removes the covariance between two points and
    // restoring it brings back the original inverse.
    //
    // Given
    // -----
    // - C = [[2, 1], [1, 2]], filter (0, 1) toggled off and on.
    //
    // Expect
    // ------
    // - Filtered inverse = diag(1/2, 1/2); restored inverse = C⁻¹.
    fn correlation_filter_is_applied_and_reversible() {
        // Arrange
        let mut data = FitData::new(2, 0, 1).unwrap();
        let c = array![[2.0, 1.0], [1.0, 2.0]];
        data.set_covariance(CovarianceKind::Y, 0, 0, CovInput::Matrix(c)).unwrap();
        let original = split_y(&data.inverse_covariance().unwrap()).clone();

        // Act
        data.set_correlation_filter(0, 1, false).unwrap();
        let filtered = split_y(&data.inverse_covariance().unwrap()).clone();
        data.set_correlation_filter(0, 1, true).unwrap();
        let restored = split_y(&data.inverse_covariance().unwrap()).clone();

        // Assert
        assert_relative_eq!(filtered[[0, 0]], 0.5, epsilon = 1e-12);
        assert_relative_eq!(filtered[[0, 1]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(original[[0, 0]], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(original[[0, 1]], -1.0 / 3.0, epsilon = 1e-12);
        for ((i, j), &v) in original.indexed_iter() {
            assert_relative_eq!(restored[[i, j]], v, epsilon = 1e-14);
        }
    }

    #[test]
    fn inactive_points_are_dropped_from_the_layout() {
        let mut data = FitData::new(4, 0, 2).unwrap();
        data.set_fit_point(1, false).unwrap();
        let inv = data.inverse_covariance().unwrap();
        assert_eq!(inv.active, vec![0, 2, 3]);
        assert_eq!(split_y(&inv).dim(), (6, 6));
        data.fit_all_points(false);
        assert_eq!(data.inverse_covariance(), Err(FitError::NoActivePoints));
    }

    #[test]
    // Purpose
    // -------
    // A y–x cross block forces a single joint inverse over `[Y; X]`.
    //
    // Given
    // -----
    // - One point, one x and one y dimension, unit variances and
    //   `Cov(y, x) = 0.5`.
    //
    // Expect
    // ------
    // - The joint inverse of [[1, 0.5], [0.5, 1]].
    fn cross_covariance_produces_joint_inverse() {
        // Arrange
        let mut data = FitData::new(1, 1, 1).unwrap();
        data.set_covariance(CovarianceKind::XY, 0, 0, CovInput::Matrix(array![[0.5]])).unwrap();

        // Act
        let inv = data.inverse_covariance().unwrap();

        // Assert
        assert_eq!(inv.x_size, 1);
        match &inv.form {
            InverseForm::Joint(m) => {
                let det = 1.0 - 0.25;
                assert_relative_eq!(m[[0, 0]], 1.0 / det, epsilon = 1e-12);
                assert_relative_eq!(m[[0, 1]], -0.5 / det, epsilon = 1e-12);
                assert_relative_eq!(m[[1, 0]], -0.5 / det, epsilon = 1e-12);
            }
            InverseForm::Split { .. } => panic!("expected joint form"),
        }
    }

    #[test]
    fn cache_is_reused_until_invalidated() {
        let mut data = FitData::new(2, 0, 1).unwrap();
        let first = data.inverse_covariance().unwrap();
        let second = data.inverse_covariance().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        data.set_fit_point(0, true).unwrap();
        assert!(!data.inverse.is_fresh());
        let third = data.inverse_covariance().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
