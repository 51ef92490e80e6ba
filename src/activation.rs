//! Kerr activation layer.
//!
//! The Kerr gate is the only non-Gaussian element in the network and plays
//! the role of the nonlinearity. It is never uncomputed.

use crate::circuit::{CircuitProgram, Gate, Mode};
use crate::error::Result;
use crate::layout::{activation_param_count, check_len};

/// One Kerr gate per mode, coefficients in mode order.
pub fn build_activation_layer(
    program: &mut CircuitProgram,
    params: &[f64],
    modes: &[Mode],
) -> Result<()> {
    check_len(params, activation_param_count(modes.len())?)?;

    for (&kappa, &mode) in params.iter().zip(modes) {
        program.push(Gate::Kerr { kappa, mode });
    }
    Ok(())
}
