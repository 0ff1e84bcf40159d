//! models — ready-made [`FitModel`](crate::fit::core::FitModel)
//! implementations.
//!
//! Purpose
//! -------
//! Ship the handful of models most fits on propagator-like data need, plus a
//! closure adapter for everything else, so callers rarely implement the
//! trait by hand.
//!
//! Conventions
//! -----------
//! - Multi-state models interleave parameters per state as `(E_i, A_i)`.
//! - All built-in models have one x and one y dimension; use [`FnModel`]
//!   for anything wider.

pub mod library;

pub use self::library::{CoshDecay, ExpDecay, FnModel, Polynomial};
