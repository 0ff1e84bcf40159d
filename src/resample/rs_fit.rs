//! Resampled fit driver — the central fit plus one fit per replica.
//!
//! Purpose
//! -------
//! Propagate the statistical error of bootstrap-resampled data into fit
//! parameters: estimate the covariance once from the replica ensemble, fit
//! the central values, then refit every replica starting from the central
//! result and collect the replica parameters into an [`RsSample`].
//!
//! Key behaviors
//! -------------
//! - With `nsample >= 2` the y (and, when `use_x_var`, x) covariance blocks
//!   are recomputed from the replicas. [`CorrelationFlags`] selects full
//!   covariance matrices versus plain variances per block family; without
//!   a flag the diagonal blocks get variances and every other pair of the
//!   family is reset to zero. With fewer replicas the
//!   covariance already configured on the data is used as-is.
//! - Replica fits run with [`FitOptions::replica`]: nothing saved, nothing
//!   logged beyond `debug` progress lines.
//! - Failures never stop the loop: every fit runs, then the first error is
//!   reported inside [`FitError::ResampleFailed`] together with the indices
//!   of all failed fits (`0` = central, replica `s` = `s + 1`).
//! - Afterwards the data holds the central y/x values and the central χ²
//!   again, whatever happened in between.
//!
//! Invariants & assumptions
//! ------------------------
//! - Replicas run sequentially on the same [`FitData`]; replica `s` never
//!   sees values of replica `s + 1`.
//! - Slots of the parameter sample whose fit failed keep their previous
//!   content.
use crate::{
    fit::{
        core::{
            covariance::{CovInput, CovarianceKind},
            data::FitData,
            options::FitOptions,
        },
        driver::{FitOutcome, fit},
        errors::{FitError, FitResult},
    },
    optimization::minimizer::{Minimizer, Verbosity},
    resample::sample::RsSample,
};
use ndarray::{Array1, Array2};

/// Which block families get full covariance matrices when estimated from
/// replicas.
///
/// - `data`: y–y correlations between points and between y dimensions.
/// - `x`: x–x correlations between points and between x dimensions.
/// - `x_data`: y–x cross covariance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorrelationFlags {
    pub data: bool,
    pub x: bool,
    pub x_data: bool,
}

impl CorrelationFlags {
    pub fn new(data: bool, x: bool, x_data: bool) -> Self {
        Self { data, x, x_data }
    }
}

/// Result of a fully successful [`rs_data_fit`].
///
/// - `central`: outcome of the central-value fit; its χ² is the one saved
///   on the data.
/// - `replica_chi2`: minimized χ² of each replica fit (diagnostic only).
#[derive(Debug, Clone, PartialEq)]
pub struct RsFitOutcome {
    pub central: FitOutcome,
    pub replica_chi2: Vec<f64>,
}

/// Fit central values and every replica of `y_samples` (and `x_samples`).
///
/// `params` carries the initial guess in its central value and receives the
/// central fit result there and replica `s` results in replica slot `s`.
/// `x_samples` is either empty (x stays as set on `data`) or holds one
/// sample per x dimension; `y_samples` holds one sample per y dimension.
/// Every sample has `ndata` components and `params.nsample()` replicas.
///
/// # Errors
/// - [`FitError::ModelNotSet`], [`FitError::LengthMismatch`],
///   [`FitError::SampleMismatch`] for inconsistent inputs, before any fit.
/// - [`FitError::ResampleFailed`] if at least one fit failed.
#[allow(clippy::too_many_arguments)]
pub fn rs_data_fit<M: Minimizer>(
    params: &mut RsSample, x_samples: &[RsSample], y_samples: &[RsSample],
    data: &mut FitData<'_>, flags: CorrelationFlags, use_x_var: bool, minimizer: &M,
    opts: &FitOptions,
) -> FitResult<RsFitOutcome> {
    check_inputs(params, x_samples, y_samples, data)?;
    let nsample = params.nsample();
    if nsample >= 2 {
        estimate_covariance(x_samples, y_samples, data, flags, use_x_var)?;
    }

    let mut failed = Vec::new();
    let mut first: Option<FitError> = None;
    let mut record = |index: usize, err: FitError| {
        failed.push(index);
        first.get_or_insert(err);
    };

    // ---- Central fit ----
    load_values(data, x_samples, y_samples, None)?;
    data.set_current_sample(0);
    let mut start = params.central().to_owned();
    let central = fit(&mut start, data, minimizer, opts);
    match &central {
        Ok(out) => params.set_central(out.params.view())?,
        Err(err) => {
            log::warn!("central fit failed: {err}");
            record(0, err.clone());
        }
    }
    let central_report = data.chi2_report().cloned();
    let seed: Array1<f64> = params.central().to_owned();

    // ---- Replica fits ----
    let replica_opts = FitOptions::replica();
    let mut replica_chi2 = vec![f64::NAN; nsample];
    for s in 0..nsample {
        load_values(data, x_samples, y_samples, Some(s))?;
        data.set_current_sample(s + 1);
        let mut p = seed.clone();
        match fit(&mut p, data, minimizer, &replica_opts) {
            Ok(out) => {
                params.set_replica(s, out.params.view())?;
                replica_chi2[s] = out.chi2;
                if opts.verbosity == Verbosity::Debug {
                    log::debug!("replica {}/{nsample}: chi2 = {:.6}", s + 1, out.chi2);
                }
            }
            Err(err) => {
                log::warn!("replica {}/{nsample} fit failed: {err}", s + 1);
                record(s + 1, err);
            }
        }
    }

    // ---- Restore central state ----
    load_values(data, x_samples, y_samples, None)?;
    data.set_current_sample(0);
    data.restore_report(central_report);

    if let Some(first) = first {
        return Err(FitError::ResampleFailed { failed, first: Box::new(first) });
    }
    if opts.verbosity != Verbosity::Quiet && nsample > 0 {
        log::info!("{nsample} replica fits done");
    }
    Ok(RsFitOutcome { central: central?, replica_chi2 })
}

// ---- Helper methods ----

fn check_inputs(
    params: &RsSample, x_samples: &[RsSample], y_samples: &[RsSample], data: &FitData<'_>,
) -> FitResult<()> {
    let npar = data.require_model()?.npar();
    if params.len() != npar {
        return Err(FitError::LengthMismatch {
            what: "parameter sample",
            expected: npar,
            actual: params.len(),
        });
    }
    if y_samples.len() != data.nydim() {
        return Err(FitError::SampleMismatch {
            what: "y sample count",
            expected: data.nydim(),
            actual: y_samples.len(),
        });
    }
    if !x_samples.is_empty() && x_samples.len() != data.nxdim() {
        return Err(FitError::SampleMismatch {
            what: "x sample count",
            expected: data.nxdim(),
            actual: x_samples.len(),
        });
    }
    for sample in x_samples.iter().chain(y_samples) {
        if sample.len() != data.ndata() {
            return Err(FitError::LengthMismatch {
                what: "data sample",
                expected: data.ndata(),
                actual: sample.len(),
            });
        }
        if sample.nsample() != params.nsample() {
            return Err(FitError::SampleMismatch {
                what: "replica count",
                expected: params.nsample(),
                actual: sample.nsample(),
            });
        }
    }
    Ok(())
}

/// Central values for `None`, replica `s` for `Some(s)`.
fn load_values(
    data: &mut FitData<'_>, x_samples: &[RsSample], y_samples: &[RsSample], which: Option<usize>,
) -> FitResult<()> {
    for (kx, sample) in x_samples.iter().enumerate() {
        let values = match which {
            Some(s) => sample.replica(s)?,
            None => sample.central(),
        };
        data.set_x_dim(kx, values)?;
    }
    for (ky, sample) in y_samples.iter().enumerate() {
        let values = match which {
            Some(s) => sample.replica(s)?,
            None => sample.central(),
        };
        data.set_y_dim(ky, values)?;
    }
    Ok(())
}

fn estimate_covariance(
    x_samples: &[RsSample], y_samples: &[RsSample], data: &mut FitData<'_>,
    flags: CorrelationFlags, use_x_var: bool,
) -> FitResult<()> {
    set_blocks(data, CovarianceKind::Y, y_samples, flags.data)?;
    if use_x_var && !x_samples.is_empty() {
        set_blocks(data, CovarianceKind::X, x_samples, flags.x)?;
        if flags.x_data {
            for (ky, ys) in y_samples.iter().enumerate() {
                for (kx, xs) in x_samples.iter().enumerate() {
                    data.set_covariance(
                        CovarianceKind::XY,
                        ky,
                        kx,
                        CovInput::Matrix(ys.covariance(xs)?),
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Diagonal pairs get variances or full covariances; the other pairs get
/// cross covariances, or zeros so no earlier correlation survives.
fn set_blocks(
    data: &mut FitData<'_>, kind: CovarianceKind, samples: &[RsSample], correlated: bool,
) -> FitResult<()> {
    let n = data.ndata();
    for (k1, a) in samples.iter().enumerate() {
        let diag = if correlated {
            CovInput::Matrix(a.covariance(a)?)
        } else {
            CovInput::Diagonal(a.variance()?)
        };
        data.set_covariance(kind, k1, k1, diag)?;
        for (k2, b) in samples.iter().enumerate().skip(k1 + 1) {
            let cross = if correlated { a.covariance(b)? } else { Array2::zeros((n, n)) };
            data.set_covariance(kind, k1, k2, CovInput::Matrix(cross))?;
        }
    }
    Ok(())
}
