//! Public API surface for objective minimization.
//!
//! - [`Objective`]: trait users implement for whatever they want minimized.
//! - [`Minimizer`]: trait for anything that can drive an [`Objective`] to a
//!   minimum; [`MinimizerOptions`] is the Argmin-backed implementation.
//! - [`MinimizerOptions`] and [`Tolerances`]: configuration for the solver.
//! - [`Algorithm`] / [`LineSearcher`]: choice of solver and of line search.
//! - [`OptimOutcome`]: normalized result returned by every minimizer.
//!
//! Convention: the objective is minimized as-is. If an analytic gradient is
//! provided it must be the gradient of the objective itself.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        Cost, FnEvalMap, Grad, Theta,
        types::DEFAULT_SIMPLEX_STEP,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use std::str::FromStr;

/// User-implemented objective interface.
///
/// The implementing type doubles as the evaluation context: whatever state
/// the objective needs (data, covariance caches, models) lives on `self`.
///
/// Required:
/// - `value(&Theta) -> OptResult<Cost>`: evaluate `c(θ)`.
/// - `check(&Theta) -> OptResult<()>`: validation hook to reject obviously
///   invalid `θ`. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta) -> OptResult<Grad>`: analytic gradient `∇c(θ)`.
///   If not implemented, robust finite differences are used automatically.
pub trait Objective {
    // Required methods
    fn value(&self, theta: &Theta) -> OptResult<Cost>;
    fn check(&self, theta: &Theta) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Output level for a minimization or fit call.
///
/// - `Quiet`: nothing beyond warnings.
/// - `Normal`: one summary line per fit at `info` level.
/// - `Debug`: per-run diagnostics at `debug` level, plus the Argmin
///   observer when the `obs_slog` feature is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Debug,
}

/// Anything able to minimize an [`Objective`] from a starting point.
///
/// Implementations may evaluate `f` from several worker threads at once,
/// which is why `F: Sync` is required.
pub trait Minimizer {
    fn minimize<F: Objective + Sync>(
        &self, f: &F, theta0: Theta, verbosity: Verbosity,
    ) -> OptResult<OptimOutcome>;
}

/// L-BFGS line search, parsed case-insensitively from `"MoreThuente"` or
/// `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if key.eq_ignore_ascii_case("morethuente") {
            Ok(LineSearcher::MoreThuente)
        } else if key.eq_ignore_ascii_case("hagerzhang") {
            Ok(LineSearcher::HagerZhang)
        } else {
            Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "expected MoreThuente or HagerZhang",
            })
        }
    }
}

/// Solver family.
///
/// - `Lbfgs`: quasi-Newton with the configured [`LineSearcher`]; uses
///   analytic gradients when available, finite differences otherwise.
/// - `NelderMead`: derivative-free simplex search, useful when χ² surfaces
///   are too rough for finite differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Lbfgs,
    NelderMead,
}

/// Minimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `algorithm: Algorithm` — solver family.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `lbfgs_mem` — L-BFGS history size (`None` uses the default of 7).
/// - `parallel_gradient` — evaluate finite-difference gradient coordinates
///   on the rayon pool.
/// - `simplex_step` — relative edge length of the initial Nelder–Mead
///   simplex.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 300`
/// - `algorithm`: `Lbfgs`, `line_searcher`: `MoreThuente`
/// - `parallel_gradient`: `false`
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizerOptions {
    pub tols: Tolerances,
    pub algorithm: Algorithm,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    pub parallel_gradient: bool,
    pub simplex_step: f64,
}

impl MinimizerOptions {
    /// Create a new set of minimizer options.
    ///
    /// Validation of numeric tolerances is performed inside
    /// [`Tolerances::new`]; here only the L-BFGS memory is checked.
    pub fn new(
        tols: Tolerances, algorithm: Algorithm, line_searcher: LineSearcher,
        lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self {
            tols,
            algorithm,
            line_searcher,
            lbfgs_mem,
            parallel_gradient: false,
            simplex_step: DEFAULT_SIMPLEX_STEP,
        })
    }

    /// Toggle parallel finite-difference gradients.
    pub fn with_parallel_gradient(mut self, parallel: bool) -> Self {
        self.parallel_gradient = parallel;
        self
    }

    /// Set the relative edge length of the initial simplex.
    ///
    /// # Errors
    /// [`OptError::InvalidSimplexStep`] if `step` is zero or non-finite.
    pub fn with_simplex_step(mut self, step: f64) -> OptResult<Self> {
        if !step.is_finite() || step == 0.0 {
            return Err(OptError::InvalidSimplexStep {
                step,
                reason: "Simplex step must be finite and non-zero.",
            });
        }
        self.simplex_step = step;
        Ok(self)
    }
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            algorithm: Algorithm::Lbfgs,
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
            parallel_gradient: false,
            simplex_step: DEFAULT_SIMPLEX_STEP,
        }
    }
}

/// Stopping rules shared by both solver families.
///
/// `tol_grad` bounds the gradient norm (L-BFGS only), `tol_cost` the cost
/// change between iterations (for Nelder–Mead, the spread of simplex
/// costs), and `max_iter` the iteration count. A run stops at the first
/// rule met; `None` disables a rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] when every rule is `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for a
    ///   tolerance that is not finite and positive.
    /// - [`OptError::InvalidMaxIter`] for `max_iter == Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if [tol_grad.is_none(), tol_cost.is_none(), max_iter.is_none()].iter().all(|n| *n) {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "at least one iteration is required",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// What a minimizer run produced.
///
/// `converged` is `true` only when the solver met its own tolerance or the
/// target cost. Hitting `max_iter`, a failed line search, or any other exit
/// leaves it `false`; `status` carries the reason.
/// `grad_norm` is `None` for derivative-free runs.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Assemble an outcome from the final argmin state.
    ///
    /// # Errors
    /// [`OptError::MissingThetaHat`], [`OptError::InvalidThetaHat`] or
    /// [`OptError::NonFiniteCost`] when the best point is absent or not
    /// finite.
    pub fn new(
        best: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(best)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "not terminated".to_string()),
            TerminationStatus::Terminated(reason) => (
                matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                ),
                format!("{reason:?}"),
            ),
        };
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.dot(&g).sqrt()),
        })
    }
}
