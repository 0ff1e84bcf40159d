//! Error surface of the minimizer layer.
//!
//! [`OptError`] covers invalid solver configuration, objective failures,
//! derivative checks, pseudo-inverse arguments, and errors raised inside
//! argmin. The fit layer wraps it as `FitError::Optimization`; fit errors
//! raised inside an objective travel back through argmin boxed as
//! [`OptError::ObjectiveFailed`] or as the original `OptError`.
use argmin::core::{ArgminError, Error};

/// Result alias for minimizer operations.
pub type OptResult<T> = Result<T, OptError>;

/// Category of an error produced by argmin itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverFailure {
    InvalidParameter,
    NotImplemented,
    NotInitialized,
    ConditionViolated,
    CheckpointNotFound,
    PotentialBug,
    Impossible,
    /// Any error argmin did not classify.
    Other,
}

impl SolverFailure {
    fn label(self) -> &'static str {
        match self {
            SolverFailure::InvalidParameter => "invalid parameter",
            SolverFailure::NotImplemented => "not implemented",
            SolverFailure::NotInitialized => "not initialized",
            SolverFailure::ConditionViolated => "condition violated",
            SolverFailure::CheckpointNotFound => "checkpoint not found",
            SolverFailure::PotentialBug => "potential bug",
            SolverFailure::Impossible => "impossible state",
            SolverFailure::Other => "backend failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// The objective has no analytic gradient; finite differences apply.
    GradientNotImplemented,

    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Solver configuration ----
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// `Tolerances` needs at least one stopping rule.
    NoTolerancesProvided,

    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    /// Initial simplex step must be finite and non-zero.
    InvalidSimplexStep {
        step: f64,
        reason: &'static str,
    },

    // ---- Objective ----
    NonFiniteCost {
        value: f64,
    },

    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },

    InvalidThetaInput {
        index: usize,
        value: f64,
    },

    /// Domain failure raised by the objective implementation.
    ObjectiveFailed {
        text: String,
    },

    // ---- Solver outcome ----
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// The solver finished without a best parameter vector.
    MissingThetaHat,

    /// The solver stopped before meeting its tolerance.
    NotConverged {
        status: String,
        iterations: usize,
    },

    /// Error raised inside argmin.
    Solver {
        kind: SolverFailure,
        text: String,
    },

    // ---- Finite differences ----
    HessianDimMismatch {
        expected: usize,
        found: (usize, usize),
    },

    InvalidHessian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Linear algebra ----
    /// Pseudo-inversion needs a square matrix.
    NonSquareMatrix {
        rows: usize,
        cols: usize,
    },

    /// Eigenvalue cutoff scale must be finite and non-negative.
    InvalidCutoffScale {
        value: f64,
        reason: &'static str,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => write!(f, "Analytic gradient not available"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient has {found} entries, expected {expected}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Gradient entry {index} is {value}: {reason}")
            }

            // ---- Solver configuration ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Gradient tolerance {tol} rejected: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Cost tolerance {tol} rejected: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Iteration cap {max_iter} rejected: {reason}")
            }
            OptError::NoTolerancesProvided => write!(f, "No stopping rule configured"),
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Unknown line search '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "L-BFGS history size {mem} rejected: {reason}")
            }
            OptError::InvalidSimplexStep { step, reason } => {
                write!(f, "Simplex step {step} rejected: {reason}")
            }

            // ---- Objective ----
            OptError::NonFiniteCost { value } => write!(f, "Objective returned {value}"),
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Parameter vector has {actual} entries, expected {expected}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Parameter entry {index} is {value}, must be finite")
            }
            OptError::ObjectiveFailed { text } => write!(f, "Objective evaluation failed: {text}"),

            // ---- Solver outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Fitted parameter {index} is {value}: {reason}")
            }
            OptError::MissingThetaHat => write!(f, "Solver returned no best parameters"),
            OptError::NotConverged { status, iterations } => {
                write!(f, "Solver stopped without converging after {iterations} iterations: {status}")
            }
            OptError::Solver { kind, text } => write!(f, "Solver error ({}): {text}", kind.label()),

            // ---- Finite differences ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(f, "Hessian is {}x{}, expected {expected}x{expected}", found.0, found.1)
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Hessian entry ({row}, {col}) is {value}, must be finite")
            }

            // ---- Linear algebra ----
            OptError::NonSquareMatrix { rows, cols } => {
                write!(f, "Expected a square matrix, found {rows}x{cols}")
            }
            OptError::InvalidCutoffScale { value, reason } => {
                write!(f, "Pseudo-inverse cutoff scale {value} rejected: {reason}")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        // Objective errors travel through argmin boxed.
        let err = match err.downcast::<OptError>() {
            Ok(own) => return own,
            Err(err) => err,
        };
        let (kind, text) = match err.downcast::<ArgminError>() {
            Ok(ArgminError::InvalidParameter { text }) => (SolverFailure::InvalidParameter, text),
            Ok(ArgminError::NotImplemented { text }) => (SolverFailure::NotImplemented, text),
            Ok(ArgminError::NotInitialized { text }) => (SolverFailure::NotInitialized, text),
            Ok(ArgminError::ConditionViolated { text }) => (SolverFailure::ConditionViolated, text),
            Ok(ArgminError::CheckpointNotFound { text }) => {
                (SolverFailure::CheckpointNotFound, text)
            }
            Ok(ArgminError::PotentialBug { text }) => (SolverFailure::PotentialBug, text),
            Ok(ArgminError::ImpossibleError { text }) => (SolverFailure::Impossible, text),
            Ok(other) => (SolverFailure::Other, other.to_string()),
            Err(err) => (SolverFailure::Other, err.to_string()),
        };
        OptError::Solver { kind, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // An `OptError` boxed into an argmin `Error` comes back unchanged instead
    // of collapsing into a generic solver error.
    fn opt_error_roundtrips_through_argmin_error() {
        // Arrange
        let original = OptError::NonFiniteCost { value: f64::INFINITY };
        let boxed: Error = original.clone().into();

        // Act
        let back: OptError = boxed.into();

        // Assert
        assert_eq!(back, original);
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds keep their category and message.
    fn argmin_condition_violated_keeps_kind_and_text() {
        // Arrange
        let boxed: Error = ArgminError::ConditionViolated { text: "bad step".to_string() }.into();

        // Act
        let mapped: OptError = boxed.into();

        // Assert
        assert_eq!(
            mapped,
            OptError::Solver { kind: SolverFailure::ConditionViolated, text: "bad step".to_string() }
        );
        assert!(mapped.to_string().contains("condition violated"));
    }

    #[test]
    fn display_embeds_payload() {
        let msg = OptError::ThetaLengthMismatch { expected: 3, actual: 5 }.to_string();
        assert!(msg.contains('3') && msg.contains('5'));
    }
}
