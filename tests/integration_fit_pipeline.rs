//! Integration tests for correlated χ² fits and resampled fits.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: fit data configuration, covariance
//!   inversion, χ² evaluation, minimization, resampled fits, and curvature
//!   errors.
//! - Use synthetic Gaussian data with fixed seeds so every run sees the same
//!   numbers.
//!
//! Coverage
//! --------
//! - `fit::core`:
//!   - χ² reproducibility and its law-of-large-numbers scale on two y
//!     dimensions.
//!   - Correlation filter round trips and fit-mask effects on sizes and dof.
//!   - Diagonal expansion and length errors of covariance setters.
//! - `fit::driver`:
//!   - The exponential-decay scenario with χ²/dof inside its 1–99% band.
//!   - Fits started far from the minimum.
//! - `resample`:
//!   - `nsample = 0` reducing to a plain fit.
//!   - Bootstrap covariance estimation and replica spread versus the
//!     curvature covariance of `inference`.
//!
//! Exclusions
//! ----------
//! - Solver internals and pseudo-inverse edge cases (unit tests).
use approx::assert_relative_eq;
use corrfit::{
    fit::{
        CovInput, CovarianceKind, ExpDecay, FitData, FitError, FitOptions, FnModel, Polynomial,
        fit,
    },
    inference::chi2_standard_errors,
    optimization::minimizer::{Algorithm, LineSearcher, MinimizerOptions, Tolerances, Verbosity},
    resample::{CorrelationFlags, MeanEstimator, RsSample, bootstrap, rs_data_fit},
};
use ndarray::{Array1, Array2, array};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// L-BFGS with central-difference gradients and a cost tolerance; steep χ²
/// surfaces need both.
fn minimizer() -> MinimizerOptions {
    let tols = Tolerances::new(Some(1e-6), Some(1e-12), Some(1000)).unwrap();
    MinimizerOptions::new(tols, Algorithm::Lbfgs, LineSearcher::MoreThuente, None)
        .unwrap()
        .with_parallel_gradient(true)
}

fn quiet() -> FitOptions {
    FitOptions::new(true, Verbosity::Quiet)
}

/// `y = 5 e^{−0.5 x}` at `x_i = i · 5/20`, plus N(0, σ²) noise.
fn exp_data<'m>(model: &'m ExpDecay, seed: u64, sigma: f64) -> FitData<'m> {
    let n = 20;
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();
    let mut data = FitData::new(n, 1, 1).unwrap();
    data.set_model(model).unwrap();
    for i in 0..n {
        let x = i as f64 * 5.0 / n as f64;
        data.set_x(0, i, x).unwrap();
        data.set_y(0, i, 5.0 * (-0.5 * x).exp() + noise.sample(&mut rng)).unwrap();
    }
    data.set_covariance(CovarianceKind::Y, 0, 0, CovInput::Diagonal(Array1::from_elem(n, sigma * sigma)))
        .unwrap();
    data
}

/// Tridiagonal correlation with unit variance.
fn banded_cov(n: usize, rho: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| match i.abs_diff(j) {
        0 => 1.0,
        1 => rho,
        _ => 0.0,
    })
}

#[test]
// Purpose
// -------
// With identity covariances and the true parameters, the χ² of a
// two-dimensional model is reproducible and scales like `n · nydim`.
//
// Given
// -----
// - 1500 points, y₀ = 1 + x and y₁ = 2 − x with unit Gaussian noise.
//
// Expect
// ------
// - Bit-identical repeated evaluations; |χ² / 3000 − 1| < 0.1.
fn chi2_is_reproducible_and_scales_with_points() {
    // Arrange
    let n = 1500;
    let model = FnModel::new("pair", 1, 2, 2, |k, x, p| {
        if k == 0 { p[0] + x[0] } else { p[1] - x[0] }
    })
    .unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut data = FitData::new(n, 1, 2).unwrap();
    data.set_model(&model).unwrap();
    for i in 0..n {
        let x = i as f64 / n as f64;
        data.set_x(0, i, x).unwrap();
        data.set_y(0, i, 1.0 + x + noise.sample(&mut rng)).unwrap();
        data.set_y(1, i, 2.0 - x + noise.sample(&mut rng)).unwrap();
    }
    let theta = array![1.0, 2.0];

    // Act
    let first = data.chi2_value(&theta).unwrap();
    let second = data.chi2_value(&theta).unwrap();

    // Assert
    assert_eq!(first.to_bits(), second.to_bits());
    assert!((first / (2 * n) as f64 - 1.0).abs() < 0.1);
}

#[test]
// Purpose
// -------
// Decorrelating a point pair changes the χ²; restoring the pair brings the
// original value back.
fn correlation_filter_round_trip_restores_chi2() {
    // Arrange
    let model = Polynomial::new(1);
    let mut data = FitData::new(6, 1, 1).unwrap();
    data.set_model(&model).unwrap();
    for (i, y) in [0.2, 1.1, 1.8, 3.3, 3.9, 5.2].into_iter().enumerate() {
        data.set_x(0, i, i as f64).unwrap();
        data.set_y(0, i, y).unwrap();
    }
    data.set_covariance(CovarianceKind::Y, 0, 0, CovInput::Matrix(banded_cov(6, 0.4))).unwrap();
    let theta = array![0.1, 1.0];
    let original = data.chi2_value(&theta).unwrap();

    // Act
    data.set_correlation_filter(2, 3, false).unwrap();
    let filtered = data.chi2_value(&theta).unwrap();
    data.set_correlation_filter(2, 3, true).unwrap();
    let restored = data.chi2_value(&theta).unwrap();

    // Assert
    assert!((filtered - original).abs() > 1e-6);
    assert_relative_eq!(restored, original, epsilon = 1e-12);
    assert_eq!(data.set_correlation_filter(4, 4, false), Err(FitError::SelfDecorrelation { index: 4 }));
}

#[test]
// Purpose
// -------
// Excluding a point removes `nydim` y residuals, its nuisance x slot, and
// `nydim` degrees of freedom.
//
// Given
// -----
// - 5 points, nydim = 2, one uncertain x dimension, a 2-parameter model.
//
// Expect
// ------
// - y_size 10 → 8, x_size 5 → 4, dof 8 → 6.
fn fit_mask_updates_sizes_and_dof() {
    // Arrange
    let model = FnModel::new("pair", 1, 2, 2, |k, x, p| p[k] * x[0]).unwrap();
    let mut data = FitData::new(5, 1, 2).unwrap();
    data.set_model(&model).unwrap();
    data.set_covariance(CovarianceKind::X, 0, 0, CovInput::Diagonal(Array1::from_elem(5, 0.01)))
        .unwrap();
    let before = (data.y_size(), data.x_size(), data.dof());

    // Act
    data.set_fit_point(3, false).unwrap();

    // Assert
    assert_eq!(before, (10, 5, 8));
    assert_eq!((data.y_size(), data.x_size(), data.dof()), (8, 4, 6));
    assert_eq!(data.n_theta(), 2 + 4);
}

#[test]
// Purpose
// -------
// A diagonal vector on a diagonal pair becomes `diag(v)`; a vector on an
// off-diagonal pair is a length error against the 9 entries of a block.
fn covariance_setter_expands_diagonals_and_rejects_cross_vectors() {
    // Arrange
    let mut data = FitData::new(3, 0, 2).unwrap();
    let v = array![0.5, 1.5, 2.5];

    // Act
    data.set_covariance(CovarianceKind::Y, 1, 1, CovInput::Diagonal(v.clone())).unwrap();
    let cross = data.set_covariance(CovarianceKind::Y, 0, 1, CovInput::Diagonal(v.clone()));

    // Assert
    assert_eq!(data.covariance(CovarianceKind::Y, 1, 1).unwrap(), Array2::from_diag(&v));
    assert!(matches!(cross, Err(FitError::LengthMismatch { expected: 9, actual: 3, .. })));
    assert!(matches!(
        data.set_covariance(CovarianceKind::Y, 0, 0, CovInput::Diagonal(array![1.0])),
        Err(FitError::LengthMismatch { expected: 3, actual: 1, .. })
    ));
}

#[test]
// Purpose
// -------
// The exponential-decay scenario: fitted χ²/dof falls inside the 1–99%
// band of χ²(18)/18.
//
// Given
// -----
// - 20 points of 5 e^{−0.5 x} with σ = 0.05 noise, three fixed seeds.
//
// Expect
// ------
// - At least two of three fits inside the band, parameters near the truth.
fn exponential_fit_chi2_per_dof_is_plausible() {
    // Arrange
    let model = ExpDecay::new(1).unwrap();
    let dist = ChiSquared::new(18.0).unwrap();
    let (lo, hi) = (dist.inverse_cdf(0.01) / 18.0, dist.inverse_cdf(0.99) / 18.0);
    let minimizer = minimizer();
    let mut inside = 0;

    for seed in [1_u64, 2, 3] {
        let mut data = exp_data(&model, seed, 0.05);
        let mut params = array![0.4, 4.0];

        // Act
        let out = fit(&mut params, &mut data, &minimizer, &quiet()).unwrap();

        // Assert
        assert_eq!(out.dof, 18);
        assert_relative_eq!(params[0], 0.5, max_relative = 0.1);
        assert_relative_eq!(params[1], 5.0, max_relative = 0.05);
        let ratio = out.chi2_per_dof().unwrap();
        assert_relative_eq!(data.chi2_per_dof().unwrap(), ratio, epsilon = 1e-12);
        if (lo..=hi).contains(&ratio) {
            inside += 1;
        }
    }
    assert!(inside >= 2, "only {inside} of 3 fits inside [{lo}, {hi}]");
}

#[test]
// Purpose
// -------
// Starting far from the minimum, a fit either reaches the same minimum as a
// fit started nearby or reports a minimizer failure; it never hands back the
// starting point as a result.
//
// Given
// -----
// - The exponential-decay data (seed 1), start (0.1, 1.0) where χ² ≈ 2·10⁴.
// - L-BFGS, and Nelder–Mead with a tight spread tolerance.
// - A reference L-BFGS fit started at (0.4, 4.0).
//
// Expect
// ------
// - Nelder–Mead converges to the reference parameters.
// - L-BFGS either matches the reference or returns `FitError::Optimization`
//   with `params` unchanged.
fn far_start_converges_or_reports_failure() {
    // Arrange
    let model = ExpDecay::new(1).unwrap();
    let start = array![0.1, 1.0];
    let mut reference = array![0.4, 4.0];
    let ref_out = fit(&mut reference, &mut exp_data(&model, 1, 0.05), &minimizer(), &quiet())
        .unwrap();
    let simplex = MinimizerOptions::new(
        Tolerances::new(None, Some(1e-10), Some(5000)).unwrap(),
        Algorithm::NelderMead,
        LineSearcher::MoreThuente,
        None,
    )
    .unwrap();

    // Act
    let mut nm_params = start.clone();
    let nm = fit(&mut nm_params, &mut exp_data(&model, 1, 0.05), &simplex, &quiet()).unwrap();
    let mut lbfgs_params = start.clone();
    let lbfgs = fit(&mut lbfgs_params, &mut exp_data(&model, 1, 0.05), &minimizer(), &quiet());

    // Assert
    assert_relative_eq!(nm_params[0], reference[0], max_relative = 1e-3);
    assert_relative_eq!(nm_params[1], reference[1], max_relative = 1e-3);
    assert_relative_eq!(nm.chi2, ref_out.chi2, max_relative = 1e-6);
    match lbfgs {
        Ok(out) => {
            assert_relative_eq!(lbfgs_params[0], reference[0], max_relative = 1e-3);
            assert_relative_eq!(lbfgs_params[1], reference[1], max_relative = 1e-3);
            assert_relative_eq!(out.chi2, ref_out.chi2, max_relative = 1e-6);
        }
        Err(err) => {
            assert!(matches!(err, FitError::Optimization(_)), "unexpected error {err:?}");
            assert_eq!(lbfgs_params, start);
        }
    }
}

#[test]
// Purpose
// -------
// Without replicas the resampled driver is exactly the plain driver.
fn resampled_fit_without_replicas_equals_plain_fit() {
    // Arrange
    let model = ExpDecay::new(1).unwrap();
    let mut plain = exp_data(&model, 5, 0.05);
    let mut resampled = exp_data(&model, 5, 0.05);
    let y = RsSample::new(resampled.y().row(0).to_owned(), 0);
    let mut sample = RsSample::new(array![0.4, 4.0], 0);
    let minimizer = minimizer();

    // Act
    let direct = fit(&mut array![0.4, 4.0], &mut plain, &minimizer, &quiet()).unwrap();
    let rs = rs_data_fit(
        &mut sample,
        &[],
        std::slice::from_ref(&y),
        &mut resampled,
        CorrelationFlags::default(),
        false,
        &minimizer,
        &quiet(),
    )
    .unwrap();

    // Assert
    assert_eq!(rs.central.params, direct.params);
    assert_eq!(rs.central.chi2, direct.chi2);
    assert_eq!(sample.central(), direct.params.view());
    assert_eq!(resampled.chi2(), plain.chi2());
    assert!(rs.replica_chi2.is_empty());
}

#[test]
// Purpose
// -------
// For a linear model fitted with the replica covariance, the spread of the
// replica parameters equals the curvature standard errors.
//
// Given
// -----
// - 8 points on y = 2 − 0.3 x, 300 configurations with σ = 0.5,
//   bootstrapped into 200 replicas, full y covariance.
//
// Expect
// ------
// - Replica standard errors within 5% of `chi2_standard_errors`.
// - Central slope within 5 standard errors of the truth.
fn bootstrap_spread_matches_curvature_errors() {
    // Arrange
    let model = Polynomial::new(1);
    let mut rng = StdRng::seed_from_u64(99);
    let noise = Normal::new(0.0, 0.5).unwrap();
    let configs =
        Array2::from_shape_fn((300, 8), |(_, i)| 2.0 - 0.3 * i as f64 + noise.sample(&mut rng));
    let y = bootstrap(configs.view(), 200, 17, &MeanEstimator).unwrap();
    let mut data = FitData::new(8, 1, 1).unwrap();
    data.set_model(&model).unwrap();
    for i in 0..8 {
        data.set_x(0, i, i as f64).unwrap();
    }
    let mut params = RsSample::new(array![1.0, 0.0], 200);

    // Act
    let out = rs_data_fit(
        &mut params,
        &[],
        std::slice::from_ref(&y),
        &mut data,
        CorrelationFlags::new(true, false, false),
        false,
        &minimizer(),
        &quiet(),
    )
    .unwrap();
    let curvature = chi2_standard_errors(&data, &out.central.optim.theta_hat).unwrap();
    let spread = params.standard_error().unwrap();

    // Assert
    assert!(data.is_y_correlated());
    assert_relative_eq!(spread[0], curvature[0], max_relative = 0.05);
    assert_relative_eq!(spread[1], curvature[1], max_relative = 0.05);
    assert!((params.central()[1] + 0.3).abs() < 5.0 * spread[1]);
    assert_eq!(data.p_value(), out.central.p_value);
}
