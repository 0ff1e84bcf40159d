//! optimization — minimizer stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for model fitting, combining an
//! Argmin-backed objective minimizer, robust pseudo-inversion of symmetric
//! matrices, and a single error/result surface. Callers implement an
//! objective, choose tolerances and a solver, and obtain fitted parameters
//! and diagnostics without touching backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **minimizing objectives** `c(θ)`
//!   (`minimizer`), including L-BFGS and Nelder–Mead solvers, stopping
//!   criteria, and finite-difference derivatives.
//! - Supply shared numerical primitives (`numerical_stability`) for
//!   pseudo-inverting covariance matrices and Hessians.
//! - Normalize configuration issues, numerical failures, and backend solver
//!   errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Minimizers operate on an unconstrained parameter vector `θ`; invalid
//!   states are reported as `OptError`, not panics.
//! - Objectives treat domain violations as recoverable errors surfaced
//!   through this layer.
//!
//! Conventions
//! -----------
//! - Parameters, gradients, and Hessians use the `ndarray`-based aliases
//!   `Theta`, `Grad`, `Hessian`.
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - Only numerical warnings are logged here (through `log`); run summaries
//!   belong to the fit layer.
//!
//! Downstream usage
//! ----------------
//! - The fit layer implements `Objective` for its data object and passes a
//!   `Minimizer` to its drivers.
//! - Inference code reuses `compute_hessian` and the pseudo-inverse.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; end-to-end behavior is covered
//!   by the fit integration tests.

pub mod errors;
pub mod minimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult, SolverFailure};
    pub use super::minimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
