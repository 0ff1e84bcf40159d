//! minimizer — argmin-powered objective minimizer.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **minimizing**
//! scalar objectives `c(θ)` such as a χ². Callers implement a single trait,
//! [`Objective`], and either invoke [`minimize`] directly or go through the
//! [`Minimizer`] trait, which [`MinimizerOptions`] implements.
//!
//! Key behaviors
//! -------------
//! - Convert user objectives into Argmin-compatible problems via
//!   [`adapter::ArgMinAdapter`].
//! - Expose a single entrypoint [`minimize`] that:
//!   - validates the initial guess with [`Objective::check`],
//!   - selects an L-BFGS or Nelder–Mead solver via [`builders`],
//!   - executes the solver via [`run`], and
//!   - normalizes results into an [`OptimOutcome`].
//! - Provide finite-difference helpers in [`finite_diff`] for gradients and
//!   Hessians when analytic derivatives are missing, including a
//!   rayon-parallel central difference.
//! - Centralize configuration ([`Tolerances`], [`MinimizerOptions`]) and
//!   validation logic ([`validation`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective is minimized as-is; no sign flips happen in this layer.
//! - [`Objective::value`] and [`Objective::grad`] must report invalid inputs
//!   as recoverable [`OptError`](crate::optimization::errors::OptError)
//!   values, not panics.
//! - Objectives passed to [`minimize`] are `Sync`; the parallel gradient path
//!   evaluates them concurrently.
//!
//! Downstream usage
//! ----------------
//! - The fit layer implements [`Objective`] for its χ² data object and hands
//!   it to any [`Minimizer`].
//! - [`finite_diff::compute_hessian`] is reused by the inference layer.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover gradient handling in [`adapter`], solver
//!   construction in [`builders`], runner convergence on Rosenbrock and
//!   quadratic objectives in [`run`], finite differences, validation, and
//!   configuration invariants in [`traits`].

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::traits::{
    Algorithm, LineSearcher, Minimizer, MinimizerOptions, Objective, OptimOutcome, Tolerances,
    Verbosity,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::minimize;
    pub use super::traits::{
        Algorithm, LineSearcher, Minimizer, MinimizerOptions, Objective, OptimOutcome, Tolerances,
        Verbosity,
    };
    pub use super::types::{Cost, Grad, Theta};
}
