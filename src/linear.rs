//! Linear layer: interferometer, squeezing, interferometer, displacement.
//!
//! Together the four blocks realise an arbitrary Gaussian transform of the
//! register, the CV analogue of an affine layer `W x + b`.

use std::f64::consts::PI;

use tracing::debug;

use crate::circuit::{CircuitProgram, Gate, Mode};
use crate::error::{CircuitError, Result};
use crate::interferometer::{build_interferometer, build_interferometer_inverse};
use crate::layout::split_linear_layer;

pub fn build_linear_layer(
    program: &mut CircuitProgram,
    params: &[f64],
    modes: &[Mode],
) -> Result<()> {
    if modes.is_empty() {
        return Err(CircuitError::InvalidModeCount(0));
    }
    let split = split_linear_layer(params, modes.len())?;

    build_interferometer(program, split.int1, modes)?;
    for (&r, &mode) in split.squeeze.iter().zip(modes) {
        program.push(Gate::Squeezing { r, phi: 0.0, mode });
    }
    build_interferometer(program, split.int2, modes)?;
    for ((&r, &phi), &mode) in split.disp_r.iter().zip(split.disp_phi).zip(modes) {
        program.push(Gate::Displacement { r, phi, mode });
    }

    debug!(modes = modes.len(), "built linear layer");
    Ok(())
}

/// Append the exact inverse of [`build_linear_layer`].
///
/// Blocks come in reverse order: displacements flipped by π, second
/// interferometer inverted, squeezing along π, first interferometer
/// inverted.
pub fn build_linear_layer_inverse(
    program: &mut CircuitProgram,
    params: &[f64],
    modes: &[Mode],
) -> Result<()> {
    if modes.is_empty() {
        return Err(CircuitError::InvalidModeCount(0));
    }
    let split = split_linear_layer(params, modes.len())?;

    for ((&r, &phi), &mode) in split.disp_r.iter().zip(split.disp_phi).zip(modes) {
        program.push(Gate::Displacement { r, phi: phi + PI, mode });
    }
    build_interferometer_inverse(program, split.int2, modes)?;
    for (&r, &mode) in split.squeeze.iter().zip(modes) {
        program.push(Gate::Squeezing { r, phi: PI, mode });
    }
    build_interferometer_inverse(program, split.int1, modes)?;

    debug!(modes = modes.len(), "built inverse linear layer");
    Ok(())
}
