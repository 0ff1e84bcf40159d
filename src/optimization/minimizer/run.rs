//! Execution helpers that run an `argmin` solver on an [`Objective`] and
//! return a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        Grad, OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        traits::{MinimizerOptions, Objective, Verbosity},
    },
};
use argmin::core::{CostFunction, Executor, Gradient, IterState, Solver, State};

/// Run a gradient-based solver from `theta0`.
///
/// `max_iter` from `opts` caps the executor; the argmin slog observer is
/// attached at [`Verbosity::Debug`] when the `obs_slog` feature is on.
///
/// # Errors
/// Objective, line-search and solver failures raised during the run, and
/// the checks of [`OptimOutcome::new`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MinimizerOptions, verbosity: Verbosity, problem: ArgMinAdapter<'a, F>,
    solver: S,
) -> OptResult<OptimOutcome>
where
    F: Objective + Sync,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>> + Send + 'static,
{
    log_initial_state(&theta0, &problem, verbosity)?;
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if verbosity == Verbosity::Debug {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

/// Run a derivative-free solver whose simplex already holds the start.
///
/// # Errors
/// Same as [`run_lbfgs`].
pub fn run_simplex<'a, F, S>(
    opts: &MinimizerOptions, verbosity: Verbosity, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: Objective + Sync,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, (), (), (), (), f64>> + Send + 'static,
{
    let mut optimizer = Executor::new(problem, solver);
    #[cfg(feature = "obs_slog")]
    if verbosity == Verbosity::Debug {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    if verbosity == Verbosity::Debug {
        log::debug!("nelder-mead finished after {iterations} iterations: {termination:?}");
    }
    OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        None,
    )
}

// ---- Helper Methods ----

fn log_initial_state<F>(
    theta0: &Theta, problem: &ArgMinAdapter<'_, F>, verbosity: Verbosity,
) -> OptResult<()>
where
    F: Objective + Sync,
{
    if verbosity != Verbosity::Debug {
        return Ok(());
    }
    let c0 = problem.cost(theta0)?;
    match problem.gradient(theta0) {
        Ok(g) => log::debug!("start: cost = {c0:.6}, |grad| = {:.6}", g.dot(&g).sqrt()),
        Err(_) => log::debug!("start: cost = {c0:.6}, gradient unavailable"),
    }
    Ok(())
}
