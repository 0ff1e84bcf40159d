//! High-level entry point for minimizing a user-provided [`Objective`].
//!
//! This validates the starting point, wraps the objective in an
//! [`ArgMinAdapter`], builds the solver selected by
//! [`MinimizerOptions::algorithm`] and delegates the run to
//! [`run_lbfgs`] or [`run_simplex`]. [`MinimizerOptions`] implements
//! [`Minimizer`] by forwarding to [`minimize`].
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_lbfgs, build_simplex},
        run::{run_lbfgs, run_simplex},
        traits::{Algorithm, LineSearcher, Minimizer, MinimizerOptions, Objective, Verbosity},
        types::{HagerZhangLS, MoreThuenteLS},
    },
};

/// Minimize an objective `c(θ)` from `theta0`.
///
/// # Behavior
/// - Validates the initial guess via `f.check(&theta0)`.
/// - Wraps `f` in an [`ArgMinAdapter`] (serial or rayon-parallel finite
///   differences according to `opts.parallel_gradient`).
/// - `Algorithm::Lbfgs`: builds L-BFGS with **Hager–Zhang** or
///   **More–Thuente** line search based on `opts.line_searcher`.
/// - `Algorithm::NelderMead`: builds a simplex around `theta0`.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates tolerance rejections from the solver builders.
/// - Propagates runtime errors from the runners (e.g., line search
///   failures, objective failures).
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use corrfit::optimization::errors::OptResult;
/// use corrfit::optimization::minimizer::{minimize, MinimizerOptions, Objective, Theta, Verbosity};
///
/// struct Bowl;
/// impl Objective for Bowl {
///     fn value(&self, theta: &Theta) -> OptResult<f64> {
///         Ok(theta.dot(theta))
///     }
///     fn check(&self, _: &Theta) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = minimize(&Bowl, array![0.1, -0.2], &MinimizerOptions::default(), Verbosity::Quiet)?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), corrfit::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: Objective + Sync>(
    f: &F, theta0: Theta, opts: &MinimizerOptions, verbosity: Verbosity,
) -> OptResult<OptimOutcome> {
    f.check(&theta0)?;
    let problem = ArgMinAdapter::new(f, opts.parallel_gradient);
    match (opts.algorithm, opts.line_searcher) {
        (Algorithm::Lbfgs, LineSearcher::MoreThuente) => {
            let solver = build_lbfgs(MoreThuenteLS::new(), opts)?;
            run_lbfgs(theta0, opts, verbosity, problem, solver)
        }
        (Algorithm::Lbfgs, LineSearcher::HagerZhang) => {
            let solver = build_lbfgs(HagerZhangLS::new(), opts)?;
            run_lbfgs(theta0, opts, verbosity, problem, solver)
        }
        (Algorithm::NelderMead, _) => {
            let solver = build_simplex(&theta0, opts)?;
            run_simplex(opts, verbosity, problem, solver)
        }
    }
}

impl Minimizer for MinimizerOptions {
    fn minimize<F: Objective + Sync>(
        &self, f: &F, theta0: Theta, verbosity: Verbosity,
    ) -> OptResult<OptimOutcome> {
        minimize(f, theta0, self, verbosity)
    }
}
