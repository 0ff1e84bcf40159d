//! resample — bootstrap samples and resampled fits.
//!
//! Purpose
//! -------
//! Propagate statistical uncertainty into fit parameters: bootstrap an
//! ensemble of measurements into central value plus replicas
//! ([`RsSample`], [`bootstrap`]), then fit the central value and every
//! replica on the same [`FitData`](crate::fit::FitData) ([`rs_data_fit`]).
//!
//! Key behaviors
//! -------------
//! - [`bootstrap`] is deterministic for a given seed.
//! - [`rs_data_fit`] estimates covariances once from the whole ensemble,
//!   runs every fit even when some fail, and restores the central state.
//!
//! Invariants & assumptions
//! ------------------------
//! - Replica fits are sequential; they share and mutate one `FitData`.
//! - Replica statistics need at least two replicas.
//!
//! Testing notes
//! -------------
//! - Unit tests cover replica statistics, bootstrap reproducibility and
//!   error scaling, covariance estimation, state restoration, and failure
//!   roll-up. The `nsample = 0` equivalence with a plain fit is an
//!   integration test.

pub mod bootstrap;
pub mod rs_fit;
pub mod sample;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bootstrap::{MeanEstimator, SampleEstimator, bootstrap};
pub use self::rs_fit::{CorrelationFlags, RsFitOutcome, rs_data_fit};
pub use self::sample::RsSample;

pub mod prelude {
    pub use super::bootstrap::{MeanEstimator, SampleEstimator, bootstrap};
    pub use super::rs_fit::{CorrelationFlags, RsFitOutcome, rs_data_fit};
    pub use super::sample::RsSample;
}
