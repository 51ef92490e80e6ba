//! Error taxonomy for circuit construction.

use thiserror::Error;

/// Structural failures raised while laying out parameters or appending gates.
///
/// None of these are recoverable: each one means the parameters, modes and
/// inputs handed to a builder do not fit together.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    #[error("not enough modes: need {needed}, have {available}")]
    InsufficientModes { needed: usize, available: usize },
    #[error("mode count must be positive, got {0}")]
    InvalidModeCount(usize),
    #[error("parameter vector has {got} entries but {expected} are required")]
    ParameterCount { expected: usize, got: usize },
    #[error("sequence step {step} has width {got}, expected {expected}")]
    RaggedSequence { step: usize, expected: usize, got: usize },
    #[error("expected {expected} parameter blocks, got {got}")]
    BlockCount { expected: usize, got: usize },
    #[error("invalid initialisation: {0}")]
    InvalidInit(String),
}

pub type Result<T> = std::result::Result<T, CircuitError>;

/// Failure of a build-then-execute pipeline.
///
/// Device errors are carried as-is in the `Device` arm.
#[derive(Error, Debug)]
pub enum RunError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Build(#[from] CircuitError),
    #[error("device failure: {0}")]
    Device(#[source] E),
}

impl<E: std::error::Error + 'static> RunError<E> {
    /// The device error, if the failure came from execution.
    pub fn device_error(&self) -> Option<&E> {
        match self {
            RunError::Device(err) => Some(err),
            RunError::Build(_) => None,
        }
    }
}
