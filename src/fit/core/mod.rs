//! core — fit data, covariance blocks, inversion cache, and the χ² itself.
//!
//! Purpose
//! -------
//! Collect the building blocks of a correlated χ² fit: the [`FitData`]
//! aggregate (observations, covariance blocks, fit mask, correlation
//! filter, bound model), the symmetric block store, the lazily rebuilt
//! inverse covariance, and the χ² evaluator that the minimizer calls.
//!
//! Key behaviors
//! -------------
//! - [`FitData`] owns every matrix it allocates and borrows the bound
//!   [`FitModel`]; setters are index-checked and return [`FitResult`].
//! - [`blocks`] stores `ndim(ndim+1)/2` symmetric covariance blocks behind a
//!   [`SymmetricIndex`].
//! - [`inversion`] assembles the active sub-blocks, filters them, and
//!   pseudo-inverts them once per invalidation ([`InverseCache`]).
//! - [`chi2`] evaluates `rᵀ V r + ext(θ)` with per-thread scratch buffers
//!   and implements
//!   [`Objective`](crate::optimization::minimizer::Objective) for
//!   [`FitData`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `(ndata, nxdim, nydim)` never change after construction.
//! - Covariance blocks are `ndata × ndata`; assembled matrices are sized by
//!   the number of active points.
//! - The inverse cache is fresh before the first quadratic form of a fit
//!   reads it.
//!
//! Conventions
//! -----------
//! - θ layout: `[model parameters (npar); x nuisance estimates]`, the
//!   nuisance estimate for uncertain x dimension `j` at active point `p`
//!   sitting at `npar + j·nfit + p`.
//! - Residual layout: `[Y (nydim·nfit, dimension-major); X (x_size)]`.
//!
//! Downstream usage
//! ----------------
//! - The fit driver (`fit::driver`) minimizes [`FitData`] directly and
//!   saves a [`Chi2Report`] on success.
//! - The resampled driver mutates y/x values between replica fits without
//!   touching the cached inverse.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover block indexing, covariance setters and
//!   flags, inversion against analytic inverses, filter and mask effects,
//!   hand-computed χ² values, and concurrent evaluation.

pub mod blocks;
pub mod chi2;
pub mod covariance;
pub mod data;
pub mod inversion;
pub mod model;
pub mod options;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::blocks::{SymBlocks, SymmetricIndex};
pub use self::chi2::Chi2Scratch;
pub use self::covariance::{CovInput, CovarianceKind};
pub use self::data::{Extension, FitData, chi2_p_value};
pub use self::inversion::{InverseCache, InverseCovariance, InverseForm};
pub use self::model::FitModel;
pub use self::options::{Chi2Report, FitOptions};

pub mod prelude {
    pub use super::covariance::{CovInput, CovarianceKind};
    pub use super::data::{FitData, chi2_p_value};
    pub use super::model::FitModel;
    pub use super::options::{Chi2Report, FitOptions};
}
