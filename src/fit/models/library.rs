//! Built-in fit models.
//!
//! - [`ExpDecay`]: `f(x) = Σ_i A_i e^{−E_i x}` (one x, one y).
//! - [`CoshDecay`]: `f(t) = Σ_i A_i (e^{−E_i t} + e^{−E_i (nt − t)})`, the
//!   periodic two-point function on a lattice of temporal extent `nt`.
//! - [`Polynomial`]: `f(x) = Σ_i p_i x^i`.
//! - [`FnModel`]: any closure `(k, x, p) -> f64` with declared dimensions.
//!
//! Parameters of the multi-state models are interleaved per state:
//! `p = (E_0, A_0, E_1, A_1, …)`.
use crate::fit::{
    core::model::FitModel,
    errors::{FitError, FitResult},
};
use ndarray::ArrayView1;

/// Sum of `nstate` decaying exponentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpDecay {
    nstate: usize,
}

impl ExpDecay {
    /// # Errors
    /// [`FitError::InvalidModelConfig`] if `nstate == 0`.
    pub fn new(nstate: usize) -> FitResult<Self> {
        if nstate == 0 {
            return Err(FitError::InvalidModelConfig {
                model: "exponential decay",
                reason: "at least one state is required",
            });
        }
        Ok(Self { nstate })
    }

    pub fn nstate(&self) -> usize {
        self.nstate
    }
}

impl FitModel for ExpDecay {
    fn name(&self) -> &str {
        "exp"
    }

    fn nxdim(&self) -> usize {
        1
    }

    fn nydim(&self) -> usize {
        1
    }

    fn npar(&self) -> usize {
        2 * self.nstate
    }

    fn eval(&self, _k: usize, x: ArrayView1<f64>, p: ArrayView1<f64>) -> f64 {
        (0..self.nstate).map(|i| p[2 * i + 1] * (-p[2 * i] * x[0]).exp()).sum()
    }
}

/// Sum of `nstate` cosh-like propagators periodic in `nt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoshDecay {
    nstate: usize,
    nt: f64,
}

impl CoshDecay {
    /// # Errors
    /// [`FitError::InvalidModelConfig`] if `nstate == 0` or `nt` is not a
    /// positive finite extent.
    pub fn new(nstate: usize, nt: f64) -> FitResult<Self> {
        if nstate == 0 {
            return Err(FitError::InvalidModelConfig {
                model: "cosh decay",
                reason: "at least one state is required",
            });
        }
        if !nt.is_finite() || nt <= 0.0 {
            return Err(FitError::InvalidModelConfig {
                model: "cosh decay",
                reason: "temporal extent must be positive and finite",
            });
        }
        Ok(Self { nstate, nt })
    }

    pub fn nstate(&self) -> usize {
        self.nstate
    }

    pub fn nt(&self) -> f64 {
        self.nt
    }
}

impl FitModel for CoshDecay {
    fn name(&self) -> &str {
        "cosh"
    }

    fn nxdim(&self) -> usize {
        1
    }

    fn nydim(&self) -> usize {
        1
    }

    fn npar(&self) -> usize {
        2 * self.nstate
    }

    fn eval(&self, _k: usize, x: ArrayView1<f64>, p: ArrayView1<f64>) -> f64 {
        let t = x[0];
        (0..self.nstate)
            .map(|i| {
                let e = p[2 * i];
                p[2 * i + 1] * ((-e * t).exp() + (-e * (self.nt - t)).exp())
            })
            .sum()
    }
}

/// Polynomial of fixed degree in one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polynomial {
    degree: usize,
}

impl Polynomial {
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl FitModel for Polynomial {
    fn name(&self) -> &str {
        "polynomial"
    }

    fn nxdim(&self) -> usize {
        1
    }

    fn nydim(&self) -> usize {
        1
    }

    fn npar(&self) -> usize {
        self.degree + 1
    }

    // Horner over `p` stored lowest degree first, folded from the top.
    fn eval(&self, _k: usize, x: ArrayView1<f64>, p: ArrayView1<f64>) -> f64 {
        p.iter().rev().fold(0.0, |acc, c| acc * x[0] + c)
    }
}

type ModelFn = dyn Fn(usize, ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync;

/// Closure-backed model with explicit dimensions.
///
/// The closure receives `(k, x, p)` and must handle every `k < nydim`.
pub struct FnModel {
    name: String,
    nxdim: usize,
    nydim: usize,
    npar: usize,
    f: Box<ModelFn>,
}

impl FnModel {
    /// # Errors
    /// [`FitError::InvalidModelConfig`] if `nydim == 0`.
    pub fn new<F>(
        name: impl Into<String>, nxdim: usize, nydim: usize, npar: usize, f: F,
    ) -> FitResult<Self>
    where
        F: Fn(usize, ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync + 'static,
    {
        if nydim == 0 {
            return Err(FitError::InvalidModelConfig {
                model: "closure",
                reason: "at least one y dimension is required",
            });
        }
        Ok(Self { name: name.into(), nxdim, nydim, npar, f: Box::new(f) })
    }
}

impl std::fmt::Debug for FnModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModel")
            .field("name", &self.name)
            .field("nxdim", &self.nxdim)
            .field("nydim", &self.nydim)
            .field("npar", &self.npar)
            .finish_non_exhaustive()
    }
}

impl FitModel for FnModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn nxdim(&self) -> usize {
        self.nxdim
    }

    fn nydim(&self) -> usize {
        self.nydim
    }

    fn npar(&self) -> usize {
        self.npar
    }

    fn eval(&self, k: usize, x: ArrayView1<f64>, p: ArrayView1<f64>) -> f64 {
        (self.f)(k, x, p)
    }
}
