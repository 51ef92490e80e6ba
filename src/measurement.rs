//! Measurement adapter and the device boundary.
//!
//! Two separate paths, chosen by the caller before execution:
//! - [`measure_expectations`]: ordered ⟨x⟩ values, the trainable path.
//! - [`extract_diagnostic_state`]: full state reduced to Σ|a|². Not
//!   differentiable; only for monitoring.

use ndarray::ArrayD;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::circuit::{CircuitProgram, Mode};
use crate::error::{CircuitError, Result};

/// Single-mode quadrature observable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observable {
    /// Position quadrature.
    X(Mode),
    /// Momentum quadrature.
    P(Mode),
}

impl Observable {
    pub fn mode(&self) -> Mode {
        match *self {
            Observable::X(m) | Observable::P(m) => m,
        }
    }
}

/// Full quantum state returned by a device, e.g. Fock amplitudes with
/// one axis per mode.
#[derive(Clone, Debug, PartialEq)]
pub struct StateArtifact {
    pub amplitudes: ArrayD<Complex64>,
}

impl StateArtifact {
    pub fn new(amplitudes: ArrayD<Complex64>) -> Self {
        Self { amplitudes }
    }
}

/// Executor of circuit programs.
///
/// Implementations own numerical simulation and differentiation. Errors are
/// returned to callers exactly as the device reports them.
pub trait Device {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Expectation values of `observables`, in the same order.
    fn expectations(
        &self,
        program: &CircuitProgram,
        observables: &[Observable],
    ) -> std::result::Result<Vec<f64>, Self::Error>;

    /// Final state of the program.
    fn state(&self, program: &CircuitProgram) -> std::result::Result<StateArtifact, Self::Error>;
}

/// Position quadratures of the first `output_size` modes of `modes`,
/// returned in ascending mode order.
pub fn measure(modes: &[Mode], output_size: usize) -> Result<Vec<Observable>> {
    if output_size > modes.len() {
        return Err(CircuitError::InsufficientModes {
            needed: output_size,
            available: modes.len(),
        });
    }
    let mut prefix = modes[..output_size].to_vec();
    prefix.sort_unstable();
    Ok(prefix.into_iter().map(Observable::X).collect())
}

/// Run `program` on `device` and read ⟨x⟩ on the first `output_size` modes.
///
/// A measurement shape error is a build error; execution errors come back as
/// the device's own error inside [`crate::RunError::Device`].
pub fn measure_expectations<D: Device>(
    device: &D,
    program: &CircuitProgram,
    modes: &[Mode],
    output_size: usize,
) -> std::result::Result<Vec<f64>, crate::RunError<D::Error>> {
    let observables = measure(modes, output_size)?;
    device
        .expectations(program, &observables)
        .map_err(crate::RunError::Device)
}

/// Σ|a|² over every amplitude of the state.
pub fn extract_state_summary(state: &StateArtifact) -> f64 {
    state.amplitudes.iter().map(|a| a.norm_sqr()).sum()
}

/// Execute `program` for its full state and summarise it.
pub fn extract_diagnostic_state<D: Device>(
    device: &D,
    program: &CircuitProgram,
) -> std::result::Result<f64, D::Error> {
    let state = device.state(program)?;
    Ok(extract_state_summary(&state))
}
