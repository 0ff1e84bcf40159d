//! Fit-level options and saved χ² bookkeeping.
use crate::optimization::minimizer::Verbosity;
use ndarray::Array1;

/// Per-call options for [`fit`](crate::fit::fit).
///
/// - `save_chi2`: store the minimized χ² and its decomposition on the fit
///   data (replica fits skip this to save one decomposition per replica).
/// - `verbosity`: `Quiet` silences the per-fit log lines.
///
/// Default: `save_chi2 = true`, `verbosity = Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    pub save_chi2: bool,
    pub verbosity: Verbosity,
}

impl FitOptions {
    pub fn new(save_chi2: bool, verbosity: Verbosity) -> Self {
        Self { save_chi2, verbosity }
    }

    /// Options used for replica fits: nothing saved, nothing logged.
    pub fn replica() -> Self {
        Self { save_chi2: false, verbosity: Verbosity::Quiet }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { save_chi2: true, verbosity: Verbosity::Normal }
    }
}

/// Minimized χ² and its per-term decomposition, as saved by a fit.
///
/// `decomposition` has length `y_size + x_size + 2`:
/// `[pulls of Y; pulls of X; correlation term; extension term]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chi2Report {
    pub chi2: f64,
    pub decomposition: Array1<f64>,
}
