//! corrfit — correlated χ² fitting with bootstrap error propagation.
//!
//! Purpose
//! -------
//! Serve as the crate root for fitting parametric models to correlated,
//! possibly multi-dimensional data: assemble block covariance matrices over
//! y dimensions and uncertain x dimensions, pseudo-invert them robustly,
//! minimize the generalized χ², and repeat the fit over bootstrap replicas
//! to propagate statistical errors into the parameters.
//!
//! Key behaviors
//! -------------
//! - [`optimization`]: the argmin-backed minimizer layer ([`Objective`],
//!   [`Minimizer`], L-BFGS and Nelder–Mead), finite differences, and the
//!   symmetric pseudo-inverse.
//! - [`fit`]: the [`FitData`](fit::FitData) container, covariance
//!   inversion cache, χ² evaluator, model library, and the single-fit
//!   driver.
//! - [`resample`]: bootstrap samples and the resampled fit driver.
//! - [`inference`]: curvature-based parameter covariances.
//!
//! Invariants & assumptions
//! ------------------------
//! - The χ² of one `FitData` may be evaluated from several threads at once;
//!   replica fits are sequential.
//! - Numerical trouble in covariance inversion is logged through the `log`
//!   facade, never raised.
//!
//! Conventions
//! -----------
//! - Indices are 0-based throughout.
//! - Errors are [`FitError`](fit::FitError) at the fit layer and
//!   [`OptError`](optimization::errors::OptError) at the minimizer layer,
//!   converting into each other.
//! - The crate installs no logger; binaries pick their own `log` backend.
//!
//! Downstream usage
//! ----------------
//! - `use corrfit::prelude::*;` brings in the everyday surface.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end scenarios live in
//!   `tests/integration_fit_pipeline.rs`.
//!
//! [`Objective`]: optimization::minimizer::Objective
//! [`Minimizer`]: optimization::minimizer::Minimizer

pub mod fit;
pub mod inference;
pub mod optimization;
pub mod resample;

pub mod prelude {
    pub use crate::fit::prelude::*;
    pub use crate::inference::prelude::*;
    pub use crate::optimization::prelude::*;
    pub use crate::resample::prelude::*;
}
