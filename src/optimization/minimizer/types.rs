//! minimizer::types — numeric aliases and solver type shorthands.
//!
//! Everything the minimizer handles is an `ndarray` container over `f64`:
//! parameter vectors ([`Theta`]), gradients ([`Grad`]), Hessians
//! ([`Hessian`]) and the scalar [`Cost`], which is always minimized as-is.
//! The line-search and simplex aliases pin argmin's generics to those
//! shapes.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ` handed to the minimizer.
pub type Theta = Array1<f64>;

/// Gradient vector `∇c(θ)`, same shape as `Theta`.
pub type Grad = Array1<f64>;

/// Dense Hessian matrix for second-order information (`n × n`).
pub type Hessian = Array2<f64>;

/// Scalar objective value minimized by the solver.
pub type Cost = f64;

/// argmin's evaluation counters, keyed like `"cost_count"`.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Default relative size of the initial Nelder–Mead simplex edges.
pub const DEFAULT_SIMPLEX_STEP: f64 = 0.1;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// Derivative-free simplex solver.
pub type Simplex = NelderMead<Theta, Cost>;
