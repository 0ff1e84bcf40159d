//! minimizer::builders — argmin solver construction.
//!
//! Purpose
//! -------
//! Turn [`MinimizerOptions`] into configured argmin solvers so the entry
//! point never deals with argmin generics.
//!
//! Key behaviors
//! -------------
//! - [`build_lbfgs`] wraps any line search into L-BFGS with the configured
//!   history size and optional gradient/cost tolerances.
//! - [`build_simplex`] places the initial Nelder–Mead simplex around `θ₀`.
//!
//! Conventions
//! -----------
//! - Starting points and iteration caps are set by the runners, not here.
//! - Tolerance rejections by argmin come back as `OptError`.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    minimizer::{
        traits::MinimizerOptions,
        types::{Cost, DEFAULT_LBFGS_MEM, Grad, Simplex, Theta},
    },
};

/// L-BFGS around `line_search`.
///
/// History size is `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`]; a `None`
/// tolerance keeps argmin's default.
///
/// # Errors
/// `OptError::Solver` when argmin rejects a tolerance.
pub fn build_lbfgs<L>(line_search: L, opts: &MinimizerOptions) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    let mut solver = LBFGS::new(line_search, opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM));
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}

/// Nelder–Mead with vertices `θ₀` and `θ₀ + hᵢ eᵢ`,
/// `hᵢ = opts.simplex_step · max(1, |θ₀ᵢ|)`.
///
/// `opts.tols.tol_cost` becomes the tolerance on the spread of vertex
/// costs.
///
/// # Errors
/// `OptError::Solver` when argmin rejects the tolerance.
pub fn build_simplex(theta0: &Theta, opts: &MinimizerOptions) -> OptResult<Simplex> {
    let vertices: Vec<Theta> = std::iter::once(theta0.clone())
        .chain((0..theta0.len()).map(|i| {
            let mut vertex = theta0.clone();
            vertex[i] += opts.simplex_step * theta0[i].abs().max(1.0);
            vertex
        }))
        .collect();
    let solver = Simplex::new(vertices);
    match opts.tols.tol_cost {
        Some(tol) => Ok(solver.with_sd_tolerance(tol)?),
        None => Ok(solver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::minimizer::{
        traits::{Algorithm, LineSearcher, Tolerances},
        types::{HagerZhangLS, MoreThuenteLS},
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - L-BFGS construction with both line searches, with and without
    //   tolerances and explicit history sizes.
    // - Nelder–Mead construction.
    //
    // They intentionally DO NOT cover:
    // - Solver runs (runner tests).
    // -------------------------------------------------------------------------

    fn opts(tol_cost: Option<f64>, mem: Option<usize>) -> MinimizerOptions {
        let tols = Tolerances::new(Some(1e-6), tol_cost, Some(50)).unwrap();
        MinimizerOptions::new(tols, Algorithm::Lbfgs, LineSearcher::MoreThuente, mem).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Both line searches wire into L-BFGS with default and explicit memory.
    fn lbfgs_builds_with_either_line_search() {
        assert!(build_lbfgs(MoreThuenteLS::new(), &opts(Some(1e-8), None)).is_ok());
        assert!(build_lbfgs(MoreThuenteLS::new(), &opts(None, Some(3))).is_ok());
        assert!(build_lbfgs(HagerZhangLS::new(), &opts(Some(1e-8), Some(11))).is_ok());
    }

    #[test]
    fn simplex_builds_with_and_without_cost_tolerance() {
        let start = array![0.0, 5.0, -3.0];
        assert!(build_simplex(&start, &opts(Some(1e-8), None)).is_ok());
        assert!(build_simplex(&start, &opts(None, None)).is_ok());
    }
}
