//! Bootstrap resampling of per-configuration measurements.
//!
//! Purpose
//! -------
//! Turn an ensemble of `nconf` measurements (rows of an `nconf × dim`
//! matrix) into an [`RsSample`]: the estimator on the full ensemble gives
//! the central value, the estimator on `nsample` resamplings with
//! replacement gives the replicas.
//!
//! Key behaviors
//! -------------
//! - Resampling indices come from a single `StdRng` seeded with `seed`, so
//!   a given `(configs, nsample, seed)` always yields the same sample.
//! - Estimators implement [`SampleEstimator`]; [`MeanEstimator`] is the
//!   ensemble average.
//!
//! Invariants & assumptions
//! ------------------------
//! - The estimator's output length must not depend on which
//!   configurations it sees.
use crate::{
    fit::errors::{FitError, FitResult},
    resample::sample::RsSample,
};
use ndarray::{Array1, ArrayView2, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Reduces an ensemble of configurations to one vector.
pub trait SampleEstimator {
    /// Estimate from `configs` (`nconf × dim`, `nconf >= 1`).
    fn estimate(&self, configs: ArrayView2<f64>) -> FitResult<Array1<f64>>;
}

/// Column-wise ensemble mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanEstimator;

impl SampleEstimator for MeanEstimator {
    fn estimate(&self, configs: ArrayView2<f64>) -> FitResult<Array1<f64>> {
        configs.mean_axis(Axis(0)).ok_or(FitError::EmptyEnsemble)
    }
}

/// Bootstrap `configs` into `nsample` replicas of `estimator`.
///
/// # Errors
/// - [`FitError::EmptyEnsemble`] if `configs` has no rows.
/// - [`FitError::SampleMismatch`] if a replica estimate changes length.
/// - Any error returned by `estimator`.
pub fn bootstrap<E: SampleEstimator + ?Sized>(
    configs: ArrayView2<f64>, nsample: usize, seed: u64, estimator: &E,
) -> FitResult<RsSample> {
    let nconf = configs.nrows();
    if nconf == 0 {
        return Err(FitError::EmptyEnsemble);
    }
    let central = estimator.estimate(configs)?;
    let mut out = RsSample::new(central, nsample);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut draw = vec![0usize; nconf];
    for s in 0..nsample {
        draw.iter_mut().for_each(|d| *d = rng.gen_range(0..nconf));
        let resampled = configs.select(Axis(0), &draw);
        let value = estimator.estimate(resampled.view())?;
        if value.len() != out.len() {
            return Err(FitError::SampleMismatch {
                what: "estimator output",
                expected: out.len(),
                actual: value.len(),
            });
        }
        out.set_replica(s, value.view())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};
    use rand_distr::{Distribution, Normal};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Seed reproducibility and the central value of the mean bootstrap.
    // - The bootstrap error of a mean against σ/√n.
    // - Estimator failures and empty ensembles.
    // -------------------------------------------------------------------------

    #[test]
    fn same_seed_same_sample() {
        let configs = array![[1.0, 0.0], [2.0, 1.0], [4.0, 3.0], [8.0, 2.0]];
        let a = bootstrap(configs.view(), 16, 3, &MeanEstimator).unwrap();
        let b = bootstrap(configs.view(), 16, 3, &MeanEstimator).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.central(), array![3.75, 1.5].view());
        assert_eq!(a.nsample(), 16);
    }

    #[test]
    // Purpose
    // -------
    // The bootstrap standard error of a mean approaches σ/√n.
    //
    // Given
    // -----
    // - 400 unit-variance Gaussian configurations, 500 replicas.
    //
    // Expect
    // ------
    // - Standard error within 20% of 1/√400 = 0.05.
    fn bootstrap_error_of_mean_matches_sigma_over_sqrt_n() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(11);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let configs = Array2::from_shape_fn((400, 1), |_| normal.sample(&mut rng));

        // Act
        let s = bootstrap(configs.view(), 500, 5, &MeanEstimator).unwrap();

        // Assert
        assert_relative_eq!(s.standard_error().unwrap()[0], 0.05, max_relative = 0.2);
    }

    struct Failing;

    impl SampleEstimator for Failing {
        fn estimate(&self, _configs: ArrayView2<f64>) -> FitResult<Array1<f64>> {
            Err(FitError::EstimatorFailed { text: "no signal".to_string() })
        }
    }

    #[test]
    fn estimator_errors_and_empty_ensembles_propagate() {
        let configs = array![[1.0], [2.0]];
        assert!(matches!(
            bootstrap(configs.view(), 4, 0, &Failing),
            Err(FitError::EstimatorFailed { .. })
        ));
        let empty = Array2::<f64>::zeros((0, 2));
        assert_eq!(bootstrap(empty.view(), 4, 0, &MeanEstimator), Err(FitError::EmptyEnsemble));
    }
}
