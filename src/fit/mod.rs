//! fit — correlated χ² fitting: data, models, driver, and errors.
//!
//! Purpose
//! -------
//! Fit parametric models `y_k = f_k(x, p)` to multi-dimensional data whose
//! y values (and optionally x values) are correlated, by minimizing the
//! generalized χ² `rᵀ V r` over model parameters and, where x carries
//! uncertainty, per-point x nuisance parameters.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds the [`FitData`] aggregate, its covariance blocks, the
//!   cached inverse covariance, and the χ² evaluator.
//! - [`models`] ships common models ([`ExpDecay`], [`CoshDecay`],
//!   [`Polynomial`]) and the closure adapter [`FnModel`].
//! - [`driver`] runs one fit through any
//!   [`Minimizer`](crate::optimization::minimizer::Minimizer) and returns a
//!   [`FitOutcome`].
//! - [`errors`] defines [`FitError`] / [`FitResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Singular or ill-conditioned covariances are never an error: they are
//!   pseudo-inverted and reported through `log::warn!`.
//! - Shape and index problems are returned immediately.
//!
//! Downstream usage
//! ----------------
//! - Typical flow:
//!   1. `FitData::new(ndata, nxdim, nydim)`, then set x/y values.
//!   2. Set covariance blocks, the fit mask, and the correlation filter.
//!   3. Bind a model with `set_model`.
//!   4. Call [`fit`] with an initial parameter guess.
//!   5. Read `chi2_per_dof`, `p_value`, and `chi2_decomposition` from the
//!      data or the outcome.
//! - The resampling layer (`crate::resample`) repeats step 4 per replica.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; end-to-end scenarios live in
//!   `tests/integration_fit_pipeline.rs`.

pub mod core;
pub mod driver;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Chi2Report, CovInput, CovarianceKind, FitData, FitModel, FitOptions, chi2_p_value,
};
pub use self::driver::{FitOutcome, fit};
pub use self::errors::{FitError, FitResult};
pub use self::models::{CoshDecay, ExpDecay, FnModel, Polynomial};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use corrfit::fit::prelude::*;
//
// to import the everyday fitting surface in a single line.

pub mod prelude {
    pub use super::{
        Chi2Report, CovInput, CovarianceKind, CoshDecay, ExpDecay, FitData, FitError, FitModel,
        FitOptions, FitOutcome, FitResult, FnModel, Polynomial, fit,
    };
}
