//! numerical_stability — robust linear algebra for covariance handling.
//!
//! Purpose
//! -------
//! Collect the numerically delicate pieces shared by the fit and inference
//! layers. Today that is the symmetric pseudo-inverse used for covariance
//! blocks and for Hessians: a correlation-normalized eigendecomposition with
//! a relative eigenvalue cutoff, plus a cheap diagonal path.
//!
//! Key behaviors
//! -------------
//! - [`pseudo_inverse_symmetric`] inverts in place and returns a
//!   [`PinvReport`] counting discarded directions and errorless points.
//! - [`PinvOptions`] keeps the cutoff scale and the rescaling switch
//!   configurable instead of hard-coded.
//!
//! Conventions
//! -----------
//! - Routines operate on `ndarray` matrices and bridge to `nalgebra` only
//!   for the eigendecomposition.
//! - Singular input is never fatal; it produces `log::warn!` diagnostics.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`pseudo_inverse`] cover idempotence on diagonal
//!   matrices, the analytic 2×2 inverse, rank deficiency, and errorless
//!   entries.

pub mod pseudo_inverse;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::pseudo_inverse::{PinvOptions, PinvReport, pseudo_inverse_symmetric};

pub mod prelude {
    pub use super::pseudo_inverse::{PinvOptions, PinvReport, pseudo_inverse_symmetric};
}
