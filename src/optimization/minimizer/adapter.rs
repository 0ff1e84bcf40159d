//! Adapter that exposes a user `Objective` as an `argmin` problem.
//!
//! The objective is minimized directly, so costs and analytic gradients pass
//! through unchanged. When no analytic gradient is provided we finite-
//! difference the cost, either serially through `finitediff` or one rayon
//! task per coordinate.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    minimizer::{
        finite_diff::{par_central_diff, run_fd_diff},
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `Objective` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `c(θ)` after a finiteness check.
/// - `Gradient::gradient` returns the analytic gradient if the user provides
///   one, otherwise a finite-difference gradient of the cost.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub parallel_gradient: bool,
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `Objective`.
    pub fn new(f: &'a F, parallel_gradient: bool) -> Self {
        Self { f, parallel_gradient }
    }

    fn checked_value(&self, theta: &Theta) -> Result<Cost, OptError> {
        let output = self.f.value(theta)?;
        if !output.is_finite() {
            return Err(OptError::NonFiniteCost { value: output });
        }
        Ok(output)
    }
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ)`.
    ///
    /// # Errors
    /// Propagates any `OptError` from the user’s `value`, or
    /// `NonFiniteCost` if the value is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.checked_value(theta)?)
    }
}

impl<'a, F: Objective + Sync> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// Behavior:
    /// - If the user implements `grad(θ)`, validate and return it.
    /// - Otherwise, with `parallel_gradient`, use [`par_central_diff`].
    /// - Otherwise try serial *central* differences first and retry with
    ///   *forward* differences when an evaluation failed or the result does
    ///   not validate.
    ///
    /// The serial FD closure must return `f64`, so the first error is parked
    /// in `closure_err` and the closure returns `NaN`.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) if self.parallel_gradient => {
                Ok(par_central_diff(theta, &|t: &Theta| self.checked_value(t))?)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    return Ok(run_fd_diff(theta, &cost_func, &closure_err)?);
                }
                match validate_grad(&fd_grad, dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => Ok(run_fd_diff(theta, &cost_func, &closure_err)?),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Bowl;

    impl Objective for Bowl {
        fn value(&self, theta: &Theta) -> OptResult<Cost> {
            Ok((theta[0] - 1.0).powi(2) + 3.0 * (theta[1] + 2.0).powi(2))
        }
        fn check(&self, _theta: &Theta) -> OptResult<()> {
            Ok(())
        }
    }

    struct Exploding;

    impl Objective for Exploding {
        fn value(&self, _theta: &Theta) -> OptResult<Cost> {
            Ok(f64::INFINITY)
        }
        fn check(&self, _theta: &Theta) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Serial and parallel finite-difference paths agree with each other and
    // with the analytic gradient of a quadratic bowl.
    fn serial_and_parallel_fd_gradients_agree() {
        // Arrange
        let theta = array![0.5, -1.0];
        let serial = ArgMinAdapter::new(&Bowl, false);
        let parallel = ArgMinAdapter::new(&Bowl, true);

        // Act
        let g_serial = serial.gradient(&theta).unwrap();
        let g_parallel = parallel.gradient(&theta).unwrap();

        // Assert
        assert_relative_eq!(g_serial[0], -1.0, epsilon = 1e-5);
        assert_relative_eq!(g_serial[1], 6.0, epsilon = 1e-5);
        assert_relative_eq!(g_parallel[0], g_serial[0], epsilon = 1e-5);
        assert_relative_eq!(g_parallel[1], g_serial[1], epsilon = 1e-5);
    }

    #[test]
    fn non_finite_cost_is_an_error() {
        let adapter = ArgMinAdapter::new(&Exploding, false);
        let err: OptError = adapter.cost(&array![0.0]).unwrap_err().into();
        assert!(matches!(err, OptError::NonFiniteCost { .. }));
    }
}
