//! numerical_stability::pseudo_inverse — robust inversion of covariance blocks.
//!
//! Purpose
//! -------
//! Invert symmetric covariance matrices that may be singular or badly
//! scaled. Correlated matrices are normalized to a correlation matrix,
//! pseudo-inverted through a symmetric eigendecomposition with a relative
//! eigenvalue cutoff, and scaled back. Uncorrelated (diagonal) matrices are
//! inverted entry by entry.
//!
//! Key behaviors
//! -------------
//! - Correlated path: `A = S M S` with `S = diag(1/sqrt(M_ii))`, then
//!   `A⁺ = Σ_{|λ_k| > c} q_k q_kᵀ / λ_k` with
//!   `c = max(nrow, ncol) · max_k |λ_k| · cutoff_scale`, then `M⁺ = S A⁺ S`.
//!   Dropped directions are counted and reported as a warning.
//! - Diagonal path: `M⁺_ii = 1 / M_ii`; zero ("errorless") entries become
//!   `0`, which removes the point from the weighting, and are reported as a
//!   warning. Off-diagonal entries are cleared.
//!
//! Invariants & assumptions
//! ------------------------
//! - The input is treated as symmetric; only `symmetric_eigen` is used.
//! - Non-positive diagonal entries are left unscaled on the correlated path.
//!
//! Conventions
//! -----------
//! - The matrix is replaced in place; callers get a [`PinvReport`] back.
//! - Warnings go through the `log` facade; nothing here is fatal except a
//!   non-square input.
use crate::optimization::errors::{OptError, OptResult};
use nalgebra::DMatrix;
use ndarray::Array2;

/// Configuration for [`pseudo_inverse_symmetric`].
///
/// - `cutoff_scale`: relative factor in the eigenvalue cutoff
///   `max(nrow, ncol) · |λ|_max · cutoff_scale`; defaults to machine epsilon.
/// - `rescale_correlated`: normalize correlated matrices by their diagonal
///   before the eigendecomposition (default `true`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinvOptions {
    pub cutoff_scale: f64,
    pub rescale_correlated: bool,
}

impl PinvOptions {
    /// Validated constructor.
    ///
    /// # Errors
    /// [`OptError::InvalidCutoffScale`] if `cutoff_scale` is negative or not
    /// finite.
    pub fn new(cutoff_scale: f64, rescale_correlated: bool) -> OptResult<Self> {
        if !cutoff_scale.is_finite() || cutoff_scale < 0.0 {
            return Err(OptError::InvalidCutoffScale {
                value: cutoff_scale,
                reason: "Cutoff scale must be finite and non-negative.",
            });
        }
        Ok(Self { cutoff_scale, rescale_correlated })
    }
}

impl Default for PinvOptions {
    fn default() -> Self {
        Self { cutoff_scale: f64::EPSILON, rescale_correlated: true }
    }
}

/// What happened during a pseudo-inversion.
///
/// - `discarded`: eigen-directions dropped below the cutoff (correlated path).
/// - `errorless`: zero diagonal entries replaced by `0` (diagonal path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinvReport {
    pub discarded: usize,
    pub errorless: usize,
}

/// Pseudo-invert a symmetric matrix in place.
///
/// `correlated` selects the eigen path; otherwise only the diagonal is read.
///
/// # Errors
/// [`OptError::NonSquareMatrix`] if `m` is not square.
pub fn pseudo_inverse_symmetric(
    m: &mut Array2<f64>, correlated: bool, opts: &PinvOptions,
) -> OptResult<PinvReport> {
    let (rows, cols) = m.dim();
    if rows != cols {
        return Err(OptError::NonSquareMatrix { rows, cols });
    }
    if rows == 0 {
        return Ok(PinvReport::default());
    }
    let report = if correlated {
        eigen_pinv(m, opts)
    } else {
        diagonal_pinv(m)
    };
    if report.discarded > 0 {
        log::warn!(
            "pseudo-inverse: {} of {} singular directions discarded",
            report.discarded,
            rows
        );
    }
    if report.errorless > 0 {
        log::warn!("pseudo-inverse: {} errorless points removed from weighting", report.errorless);
    }
    Ok(report)
}

// ---- Helper methods ----

fn eigen_pinv(m: &mut Array2<f64>, opts: &PinvOptions) -> PinvReport {
    let n = m.nrows();
    let scale: Vec<f64> = (0..n)
        .map(|i| {
            let d = m[[i, i]];
            if opts.rescale_correlated && d > 0.0 { 1.0 / d.sqrt() } else { 1.0 }
        })
        .collect();
    let scaled = DMatrix::<f64>::from_fn(n, n, |i, j| m[[i, j]] * scale[i] * scale[j]);

    let eigen = scaled.symmetric_eigen();
    let q = eigen.eigenvectors;
    let lambda = eigen.eigenvalues;
    let lambda_max = lambda.iter().fold(0.0_f64, |acc, l| acc.max(l.abs()));
    let cutoff = n as f64 * lambda_max * opts.cutoff_scale;

    m.fill(0.0);
    let mut discarded = 0;
    for (k, &l) in lambda.iter().enumerate() {
        if l.abs() <= cutoff {
            discarded += 1;
            continue;
        }
        let inv = 1.0 / l;
        for i in 0..n {
            let qi = q[(i, k)] * inv;
            if qi == 0.0 {
                continue;
            }
            for j in 0..n {
                m[[i, j]] += qi * q[(j, k)];
            }
        }
    }
    for i in 0..n {
        for j in 0..n {
            m[[i, j]] *= scale[i] * scale[j];
        }
    }
    PinvReport { discarded, errorless: 0 }
}

fn diagonal_pinv(m: &mut Array2<f64>) -> PinvReport {
    let n = m.nrows();
    let mut errorless = 0;
    for i in 0..n {
        for j in 0..n {
            if i == j {
                let d = m[[i, i]];
                m[[i, i]] = if d == 0.0 {
                    errorless += 1;
                    0.0
                } else {
                    1.0 / d
                };
            } else {
                m[[i, j]] = 0.0;
            }
        }
    }
    PinvReport { discarded: 0, errorless }
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
    // - Idempotence of pseudo-inversion on diagonal positive matrices, on
    //   both the diagonal and the eigen path.
    // - Agreement with the analytic inverse of a well-conditioned 2×2 matrix.
    // - Discarding of singular directions and the Moore–Penrose identity
    //   `M M⁺ M = M`.
    // - Errorless diagonal entries.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Pseudo-inverting a diagonal positive covariance twice returns the
    // original matrix.
    //
    // Given
    // -----
    // - diag(0.25, 4.0, 1e-6), processed by both paths.
    //
    // Expect
    // ------
    // - Entry-wise agreement within relative tolerance 1e-10.
    fn pseudo_inverse_is_idempotent_on_diagonal_matrices() {
        for correlated in [false, true] {
            // Arrange
            let original = Array2::from_diag(&array![0.25, 4.0, 1e-6]);
            let mut m = original.clone();
            let opts = PinvOptions::default();

            // Act
            pseudo_inverse_symmetric(&mut m, correlated, &opts).unwrap();
            pseudo_inverse_symmetric(&mut m, correlated, &opts).unwrap();

            // Assert
            for ((i, j), &v) in original.indexed_iter() {
                assert_relative_eq!(m[[i, j]], v, max_relative = 1e-10, epsilon = 1e-14);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A well-conditioned correlated matrix is inverted exactly.
    fn correlated_two_by_two_matches_analytic_inverse() {
        // Arrange
        let mut m = array![[4.0, 1.0], [1.0, 2.0]];
        let det = 4.0 * 2.0 - 1.0;
        let expected = array![[2.0 / det, -1.0 / det], [-1.0 / det, 4.0 / det]];

        // Act
        let report = pseudo_inverse_symmetric(&mut m, true, &PinvOptions::default()).unwrap();

        // Assert
        assert_eq!(report, PinvReport::default());
        for ((i, j), &v) in expected.indexed_iter() {
            assert_relative_eq!(m[[i, j]], v, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // A rank-deficient covariance loses exactly one direction and the
    // result satisfies the Moore–Penrose identity.
    //
    // Given
    // -----
    // - A 3×3 covariance whose first and last rows coincide, inverted with
    //   a loose cutoff scale of 1e-10.
    //
    // Expect
    // ------
    // - `discarded == 1` and `M M⁺ M ≈ M`.
    fn singular_matrix_discards_direction_and_satisfies_identity() {
        // Arrange
        let original = array![[1.0, 0.5, 1.0], [0.5, 2.0, 0.5], [1.0, 0.5, 1.0]];
        let mut m = original.clone();
        let opts = PinvOptions::new(1e-10, true).unwrap();

        // Act
        let report = pseudo_inverse_symmetric(&mut m, true, &opts).unwrap();

        // Assert
        assert_eq!(report.discarded, 1);
        let back = original.dot(&m).dot(&original);
        for ((i, j), &v) in original.indexed_iter() {
            assert_relative_eq!(back[[i, j]], v, epsilon = 1e-10);
        }
    }

    #[test]
    fn zero_diagonal_entry_is_errorless() {
        let mut m = Array2::from_diag(&array![2.0, 0.0]);
        let report = pseudo_inverse_symmetric(&mut m, false, &PinvOptions::default()).unwrap();
        assert_eq!(report.errorless, 1);
        assert_eq!(m[[1, 1]], 0.0);
        assert_eq!(m[[0, 0]], 0.5);
    }

    #[test]
    fn non_square_input_is_rejected() {
        let mut m = Array2::<f64>::zeros((2, 3));
        assert_eq!(
            pseudo_inverse_symmetric(&mut m, true, &PinvOptions::default()),
            Err(OptError::NonSquareMatrix { rows: 2, cols: 3 })
        );
        assert!(PinvOptions::new(-1.0, true).is_err());
    }
}
