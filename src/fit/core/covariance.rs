//! Covariance block setters and getters on [`FitData`].
//!
//! Purpose
//! -------
//! Hold and mutate raw covariance data without interpreting correlation
//! semantics beyond the aggregate flags the inversion engine needs.
//!
//! Key behaviors
//! -------------
//! - [`FitData::set_covariance`] accepts a full `ndata × ndata` matrix or,
//!   for diagonal pairs of y–y and x–x blocks, an `ndata` vector that is
//!   expanded to `diag(v)`.
//! - The correlation flag of a block family is recomputed from its stored
//!   blocks after every write, so overwriting a correlated block with a
//!   diagonal one clears it again. x–x and y–x blocks mark their x
//!   dimension as carrying uncertainty.
//! - Every setter invalidates the cached inverse.
//!
//! Conventions
//! -----------
//! - `CovarianceKind::Y` / `X` use `(k1, k2)` as `(dim, dim)` of the same
//!   axis; `CovarianceKind::XY` uses `(ky, kx)` and stores
//!   `Cov(y dim ky, x dim kx)`.
use crate::fit::{
    core::data::FitData,
    errors::{FitError, FitResult},
};
use ndarray::{Array1, Array2};

/// Which block family a covariance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovarianceKind {
    /// y–y blocks, indexed by `(ky1, ky2)`.
    Y,
    /// x–x blocks, indexed by `(kx1, kx2)`.
    X,
    /// y–x cross blocks, indexed by `(ky, kx)`.
    XY,
}

/// Covariance payload: a full matrix or the diagonal of one.
#[derive(Debug, Clone, PartialEq)]
pub enum CovInput {
    Matrix(Array2<f64>),
    Diagonal(Array1<f64>),
}

impl<'m> FitData<'m> {
    /// Store a covariance block.
    ///
    /// # Errors
    /// - [`FitError::DimensionOutOfRange`] for a bad `k1`/`k2`.
    /// - [`FitError::ShapeMismatch`] if a matrix is not `ndata × ndata`.
    /// - [`FitError::LengthMismatch`] if a diagonal vector is not `ndata`
    ///   long, or is passed for a cross block (`k1 ≠ k2` or `XY`), which
    ///   needs all `ndata²` entries.
    pub fn set_covariance(
        &mut self, kind: CovarianceKind, k1: usize, k2: usize, input: CovInput,
    ) -> FitResult<()> {
        match kind {
            CovarianceKind::Y => {
                self.check_y_dim(k1)?;
                self.check_y_dim(k2)?;
            }
            CovarianceKind::X => {
                self.check_x_dim(k1)?;
                self.check_x_dim(k2)?;
            }
            CovarianceKind::XY => {
                self.check_y_dim(k1)?;
                self.check_x_dim(k2)?;
            }
        }
        let cross = kind == CovarianceKind::XY || k1 != k2;
        let matrix = self.expand_input(input, cross)?;

        match kind {
            CovarianceKind::Y => {
                self.y_cov.set(k1, k2, matrix);
                self.is_y_correlated = self.y_cov.is_correlated();
            }
            CovarianceKind::X => {
                self.x_cov.set(k1, k2, matrix);
                self.is_x_correlated = self.x_cov.is_correlated();
                self.have_x_covar[k1] = true;
                self.have_x_covar[k2] = true;
            }
            CovarianceKind::XY => {
                self.xy_cov[k1 * self.nxdim + k2] = matrix;
                self.have_xy_covar[k2] = true;
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Stored covariance block, oriented as requested.
    ///
    /// # Errors
    /// [`FitError::DimensionOutOfRange`] for a bad `k1`/`k2`.
    pub fn covariance(&self, kind: CovarianceKind, k1: usize, k2: usize) -> FitResult<Array2<f64>> {
        match kind {
            CovarianceKind::Y => {
                self.check_y_dim(k1)?;
                self.check_y_dim(k2)?;
                self.y_cov.get(k1, k2).ok_or(FitError::DimensionOutOfRange {
                    axis: "y",
                    index: k1.max(k2),
                    ndim: self.nydim,
                })
            }
            CovarianceKind::X => {
                self.check_x_dim(k1)?;
                self.check_x_dim(k2)?;
                self.x_cov.get(k1, k2).ok_or(FitError::DimensionOutOfRange {
                    axis: "x",
                    index: k1.max(k2),
                    ndim: self.nxdim,
                })
            }
            CovarianceKind::XY => Ok(self.xy_covariance(k1, k2)?.clone()),
        }
    }

    /// Borrow the `Cov(y dim ky, x dim kx)` block.
    pub fn xy_covariance(&self, ky: usize, kx: usize) -> FitResult<&Array2<f64>> {
        self.check_y_dim(ky)?;
        self.check_x_dim(kx)?;
        Ok(&self.xy_cov[ky * self.nxdim + kx])
    }

    /// Turn nuisance parameters for x dimension `kx` on or off without
    /// touching its stored covariance.
    pub fn set_x_uncertainty(&mut self, kx: usize, enabled: bool) -> FitResult<()> {
        self.check_x_dim(kx)?;
        self.have_x_covar[kx] = enabled;
        if !enabled {
            self.have_xy_covar[kx] = false;
        }
        self.invalidate();
        Ok(())
    }

    // ---- Helper methods ----

    fn expand_input(&self, input: CovInput, cross: bool) -> FitResult<Array2<f64>> {
        let n = self.ndata;
        match input {
            CovInput::Matrix(m) => {
                if m.dim() != (n, n) {
                    return Err(FitError::ShapeMismatch {
                        what: "covariance block",
                        expected: (n, n),
                        actual: m.dim(),
                    });
                }
                Ok(m)
            }
            CovInput::Diagonal(v) => {
                if cross {
                    return Err(FitError::LengthMismatch {
                        what: "cross covariance block entries",
                        expected: n * n,
                        actual: v.len(),
                    });
                }
                if v.len() != n {
                    return Err(FitError::LengthMismatch {
                        what: "covariance diagonal",
                        expected: n,
                        actual: v.len(),
                    });
                }
                Ok(Array2::from_diag(&v))
            }
        }
    }
}
