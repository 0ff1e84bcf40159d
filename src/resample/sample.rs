//! Resampled vectors: a central value plus `nsample` replicas.
//!
//! Purpose
//! -------
//! Carry a vector quantity together with its bootstrap replicas so that
//! statistical errors can be read off the replica spread and propagated
//! through fits.
//!
//! Conventions
//! -----------
//! - `samples` is `nsample × len`; row `s` is replica `s` (0-based).
//! - Replica statistics use the replica mean, not the central value, and
//!   the unbiased `1 / (nsample − 1)` normalization.
use crate::fit::errors::{FitError, FitResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Central value and bootstrap replicas of a vector of length `len`.
#[derive(Debug, Clone, PartialEq)]
pub struct RsSample {
    central: Array1<f64>,
    samples: Array2<f64>,
}

impl RsSample {
    /// Sample whose `nsample` replicas all equal `central`.
    pub fn new(central: Array1<f64>, nsample: usize) -> Self {
        let samples = Array2::from_shape_fn((nsample, central.len()), |(_, i)| central[i]);
        Self { central, samples }
    }

    /// # Errors
    /// [`FitError::SampleMismatch`] if `samples.ncols() != central.len()`.
    pub fn from_parts(central: Array1<f64>, samples: Array2<f64>) -> FitResult<Self> {
        if samples.ncols() != central.len() {
            return Err(FitError::SampleMismatch {
                what: "replica length",
                expected: central.len(),
                actual: samples.ncols(),
            });
        }
        Ok(Self { central, samples })
    }

    pub fn zeros(len: usize, nsample: usize) -> Self {
        Self { central: Array1::zeros(len), samples: Array2::zeros((nsample, len)) }
    }

    pub fn len(&self) -> usize {
        self.central.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central.is_empty()
    }

    pub fn nsample(&self) -> usize {
        self.samples.nrows()
    }

    pub fn central(&self) -> ArrayView1<f64> {
        self.central.view()
    }

    /// # Errors
    /// [`FitError::LengthMismatch`] if `values.len() != len()`.
    pub fn set_central(&mut self, values: ArrayView1<f64>) -> FitResult<()> {
        self.check_len(values.len())?;
        self.central.assign(&values);
        Ok(())
    }

    /// # Errors
    /// [`FitError::SampleMismatch`] if `s >= nsample`.
    pub fn replica(&self, s: usize) -> FitResult<ArrayView1<f64>> {
        self.check_replica(s)?;
        Ok(self.samples.row(s))
    }

    /// # Errors
    /// - [`FitError::SampleMismatch`] if `s >= nsample`.
    /// - [`FitError::LengthMismatch`] if `values.len() != len()`.
    pub fn set_replica(&mut self, s: usize, values: ArrayView1<f64>) -> FitResult<()> {
        self.check_replica(s)?;
        self.check_len(values.len())?;
        self.samples.row_mut(s).assign(&values);
        Ok(())
    }

    /// All replicas, `nsample × len`.
    pub fn samples(&self) -> &Array2<f64> {
        &self.samples
    }

    /// Replica mean; the central value when there are no replicas.
    pub fn mean(&self) -> Array1<f64> {
        self.samples.mean_axis(Axis(0)).unwrap_or_else(|| self.central.clone())
    }

    /// Unbiased replica variance of each component.
    ///
    /// # Errors
    /// [`FitError::TooFewReplicas`] if `nsample < 2`.
    pub fn variance(&self) -> FitResult<Array1<f64>> {
        self.check_spread()?;
        Ok(self.samples.var_axis(Axis(0), 1.0))
    }

    pub fn standard_error(&self) -> FitResult<Array1<f64>> {
        Ok(self.variance()?.mapv(f64::sqrt))
    }

    /// Replica covariance `Cov(self_i, other_j)`, shape `len × other.len`.
    ///
    /// # Errors
    /// - [`FitError::SampleMismatch`] if the replica counts differ.
    /// - [`FitError::TooFewReplicas`] if `nsample < 2`.
    pub fn covariance(&self, other: &RsSample) -> FitResult<Array2<f64>> {
        if other.nsample() != self.nsample() {
            return Err(FitError::SampleMismatch {
                what: "replica count",
                expected: self.nsample(),
                actual: other.nsample(),
            });
        }
        self.check_spread()?;
        let a = &self.samples - &self.mean();
        let b = &other.samples - &other.mean();
        Ok(a.t().dot(&b) / (self.nsample() - 1) as f64)
    }

    // ---- Helper methods ----

    fn check_len(&self, actual: usize) -> FitResult<()> {
        if actual != self.len() {
            return Err(FitError::LengthMismatch {
                what: "sample values",
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }

    fn check_replica(&self, s: usize) -> FitResult<()> {
        if s >= self.nsample() {
            return Err(FitError::SampleMismatch {
                what: "replica index",
                expected: self.nsample(),
                actual: s,
            });
        }
        Ok(())
    }

    fn check_spread(&self) -> FitResult<()> {
        if self.nsample() < 2 {
            return Err(FitError::TooFewReplicas { needed: 2, nsample: self.nsample() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Replica statistics use the replica mean and the unbiased
    // normalization.
    //
    // Given
    // -----
    // - Component 0 replicas (1, 2, 3), component 1 replicas (2, 4, 6).
    //
    // Expect
    // ------
    // - mean = (2, 4); variance = (1, 4); covariance[0][1] = 2.
    fn replica_statistics_match_hand_values() {
        // Arrange
        let s = RsSample::from_parts(
            array![0.0, 0.0],
            array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]],
        )
        .unwrap();

        // Act
        let mean = s.mean();
        let var = s.variance().unwrap();
        let cov = s.covariance(&s).unwrap();

        // Assert
        assert_eq!(mean, array![2.0, 4.0]);
        assert_relative_eq!(var[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(var[1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(s.standard_error().unwrap()[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn accessors_check_indices_and_lengths() {
        let mut s = RsSample::zeros(2, 1);
        assert!(s.set_replica(0, array![1.0, 2.0].view()).is_ok());
        assert_eq!(s.replica(0).unwrap(), array![1.0, 2.0].view());
        assert!(matches!(s.replica(1), Err(FitError::SampleMismatch { .. })));
        assert!(matches!(s.set_central(array![1.0].view()), Err(FitError::LengthMismatch { .. })));
        assert_eq!(s.variance(), Err(FitError::TooFewReplicas { needed: 2, nsample: 1 }));
        assert!(RsSample::from_parts(array![0.0], Array2::zeros((3, 2))).is_err());
    }

    #[test]
    fn new_copies_central_into_every_replica() {
        let s = RsSample::new(array![1.5, -2.0], 3);
        assert_eq!(s.nsample(), 3);
        assert_eq!(s.replica(2).unwrap(), array![1.5, -2.0].view());
        assert_eq!(s.mean(), array![1.5, -2.0]);
        assert_eq!(RsSample::zeros(2, 0).mean(), array![0.0, 0.0]);
    }
}
