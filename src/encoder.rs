//! Displacement encoding of classical inputs.

use std::f64::consts::PI;

use crate::circuit::{CircuitProgram, Gate, Mode};
use crate::error::{CircuitError, Result};

fn check_fit(input: &[f64], modes: &[Mode]) -> Result<()> {
    if modes.len() < input.len() {
        return Err(CircuitError::InsufficientModes {
            needed: input.len(),
            available: modes.len(),
        });
    }
    Ok(())
}

/// `Displacement(x_i, 0)` on `modes[i]` for every input value.
pub fn encode(program: &mut CircuitProgram, input: &[f64], modes: &[Mode]) -> Result<()> {
    check_fit(input, modes)?;
    for (&x, &mode) in input.iter().zip(modes) {
        program.push(Gate::Displacement { r: x, phi: 0.0, mode });
    }
    Ok(())
}

/// Inverse of [`encode`]: `Displacement(x_i, π)` on `modes[i]`.
pub fn decode(program: &mut CircuitProgram, input: &[f64], modes: &[Mode]) -> Result<()> {
    check_fit(input, modes)?;
    for (&x, &mode) in input.iter().zip(modes) {
        program.push(Gate::Displacement { r: x, phi: PI, mode });
    }
    Ok(())
}
