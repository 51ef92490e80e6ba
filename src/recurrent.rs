//! Recurrent cell over a hidden and a working register.
//!
//! The hidden register carries the recurrent state from step to step; there
//! is no state tensor. Each step encodes the input on the working register,
//! couples it to the hidden register, then uncomputes the working register
//! so the next step can reuse it.

use tracing::{debug, trace};

use crate::activation::build_activation_layer;
use crate::circuit::{all_distinct, CircuitProgram, Gate, Mode};
use crate::encoder::{decode, encode};
use crate::error::{CircuitError, Result};
use crate::layout::split_recurrent_cell;
use crate::linear::{build_linear_layer, build_linear_layer_inverse};

/// Append one timestep for input `x_t`.
///
/// `params` is laid out by [`crate::layout::split_recurrent_cell`] for
/// `working.len()` working and `hidden.len()` hidden modes. Nothing is
/// appended when the inputs do not fit.
pub fn build_recurrent_cell_step(
    program: &mut CircuitProgram,
    x_t: &[f64],
    params: &[f64],
    hidden: &[Mode],
    working: &[Mode],
) -> Result<()> {
    if hidden.is_empty() || working.is_empty() {
        return Err(CircuitError::InvalidModeCount(0));
    }
    debug_assert!(
        all_distinct(&[hidden, working]),
        "hidden {:?} and working {:?} must be disjoint",
        hidden,
        working
    );
    let cell = split_recurrent_cell(params, working.len(), hidden.len())?;

    encode(program, x_t, working)?;
    build_linear_layer(program, cell.working_linear, working)?;
    build_linear_layer(program, cell.hidden_linear, hidden)?;

    let coupled = hidden.len().min(x_t.len());
    for i in 0..coupled {
        program.push(Gate::ControlledPhase {
            s: cell.coupling[i],
            modes: (working[i], hidden[i]),
        });
    }

    build_linear_layer_inverse(program, cell.working_linear, working)?;
    decode(program, x_t, working)?;

    build_activation_layer(program, cell.activation, hidden)?;

    trace!(inputs = x_t.len(), coupled, "appended recurrent step");
    Ok(())
}

/// Append one step per row of `sequence`, in order.
///
/// Only the first `width` working modes are used, where `width` is the row
/// length; all rows must share it.
pub fn build_recurrent_sequence<R: AsRef<[f64]>>(
    program: &mut CircuitProgram,
    sequence: &[R],
    params: &[f64],
    hidden: &[Mode],
    working: &[Mode],
) -> Result<()> {
    let width = match sequence.first() {
        Some(row) => row.as_ref().len(),
        None => return Ok(()),
    };
    for (step, row) in sequence.iter().enumerate() {
        if row.as_ref().len() != width {
            return Err(CircuitError::RaggedSequence {
                step,
                expected: width,
                got: row.as_ref().len(),
            });
        }
    }
    if working.len() < width {
        return Err(CircuitError::InsufficientModes {
            needed: width,
            available: working.len(),
        });
    }
    let working = &working[..width];
    // Validate the layout once so a bad vector appends nothing
    split_recurrent_cell(params, working.len(), hidden.len())?;

    for row in sequence {
        build_recurrent_cell_step(program, row.as_ref(), params, hidden, working)?;
    }

    debug!(steps = sequence.len(), width, hidden = hidden.len(), "built recurrent sequence");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::mode_range;
    use crate::layout::{linear_layer_param_count, recurrent_cell_param_count};
    use crate::phase_space::PhaseSpaceMap;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_params(working: usize, hidden: usize, rng: &mut StdRng) -> Vec<f64> {
        (0..recurrent_cell_param_count(working, hidden).unwrap())
            .map(|_| rng.gen_range(-0.5..0.5))
            .collect()
    }

    fn gaussian_part(program: &CircuitProgram) -> CircuitProgram {
        let mut out = CircuitProgram::new();
        out.extend(program.iter().copied().filter(|g| g.is_gaussian()));
        out
    }

    #[test]
    fn test_step_structure() {
        let mut rng = StdRng::seed_from_u64(1);
        let hidden = mode_range(0, 3);
        let working = mode_range(3, 2);
        let params = random_params(2, 3, &mut rng);

        let mut program = CircuitProgram::new();
        build_recurrent_cell_step(&mut program, &[0.4, -0.1], &params, &hidden, &working).unwrap();

        // min(3 hidden, 2 inputs) couplings, working[i] -> hidden[i]
        let couplings: Vec<&Gate> = program.iter().filter(|g| g.name() == "ControlledPhase").collect();
        assert_eq!(couplings.len(), 2);
        assert_eq!(
            *couplings[1],
            Gate::ControlledPhase { s: 1.0, modes: (Mode(4), Mode(1)) }
        );

        assert_eq!(program.count("Kerr"), 3);
        assert!(program.iter().rev().take(3).all(|g| g.name() == "Kerr"));
        assert_eq!(program.gates()[0], Gate::Displacement { r: 0.4, phi: 0.0, mode: Mode(3) });
    }

    #[test]
    fn test_working_register_uncomputed() {
        // The working block of the step map is the identity; the only trace
        // left on the working register is the kick from the hidden x
        // quadratures, which vanishes for a vacuum hidden register.
        let mut rng = StdRng::seed_from_u64(2);
        let hidden = mode_range(0, 2);
        let working = mode_range(2, 2);
        let mut params = random_params(2, 2, &mut rng);
        let hidden_start = linear_layer_param_count(2).unwrap();
        for p in &mut params[hidden_start..] {
            *p = 0.0;
        }

        let mut program = CircuitProgram::new();
        build_recurrent_cell_step(&mut program, &[0.3, 0.7], &params, &hidden, &working).unwrap();
        let map = PhaseSpaceMap::from_program(&gaussian_part(&program), 4).unwrap();

        let s = map.symplectic();
        let working_quads = [2usize, 3, 6, 7];
        for &row in &working_quads {
            for &col in &working_quads {
                let expected = if col == row { 1.0 } else { 0.0 };
                assert!((s[[row, col]] - expected).abs() < 1e-9, "row {} col {}", row, col);
            }
            assert!(map.displacement()[row].abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_input_leaves_hidden_means_to_hidden_layer() {
        let mut rng = StdRng::seed_from_u64(3);
        let (n_w, n_h) = (2, 2);
        let hidden = mode_range(0, n_h);
        let working = mode_range(n_h, n_w);
        let mut params = random_params(n_w, n_h, &mut rng);

        // Working layer without displacement keeps the working means at zero
        let l_w = linear_layer_param_count(n_w).unwrap();
        for p in &mut params[l_w - 2 * n_w..l_w] {
            *p = 0.0;
        }

        let mut step = CircuitProgram::new();
        build_recurrent_cell_step(&mut step, &[0.0, 0.0], &params, &hidden, &working).unwrap();

        let l_h = linear_layer_param_count(n_h).unwrap();
        let mut reference = CircuitProgram::new();
        build_linear_layer(&mut reference, &params[l_w..l_w + l_h], &hidden).unwrap();

        let total = n_w + n_h;
        let got = PhaseSpaceMap::from_program(&gaussian_part(&step), total).unwrap();
        let want = PhaseSpaceMap::from_program(&reference, total).unwrap();
        for mode in 0..n_h {
            for idx in [mode, mode + total] {
                let diff = (got.displacement()[idx] - want.displacement()[idx]).abs();
                assert!(diff < 1e-9, "quadrature {}: {}", idx, diff);
            }
        }
    }

    #[test]
    fn test_hidden_block_matches_hidden_layer() {
        // The coupling only adds working-column terms to the hidden p rows, so
        // the hidden x hidden block is the hidden linear layer's alone.
        let mut rng = StdRng::seed_from_u64(7);
        let (n_w, n_h) = (2, 3);
        let hidden = mode_range(0, n_h);
        let working = mode_range(n_h, n_w);
        let params = random_params(n_w, n_h, &mut rng);

        let l_w = linear_layer_param_count(n_w).unwrap();
        let l_h = linear_layer_param_count(n_h).unwrap();
        let mut reference = CircuitProgram::new();
        build_linear_layer(&mut reference, &params[l_w..l_w + l_h], &hidden).unwrap();

        let total = n_w + n_h;
        let want = PhaseSpaceMap::from_program(&reference, total).unwrap();
        let hidden_quads: Vec<usize> = (0..n_h).chain(total..total + n_h).collect();

        for x_t in [[0.0, 0.0], [0.4, -0.3]] {
            let mut step = CircuitProgram::new();
            build_recurrent_cell_step(&mut step, &x_t, &params, &hidden, &working).unwrap();
            let got = PhaseSpaceMap::from_program(&gaussian_part(&step), total).unwrap();

            for &row in &hidden_quads {
                for &col in &hidden_quads {
                    let diff = (got.symplectic()[[row, col]] - want.symplectic()[[row, col]]).abs();
                    assert!(diff < 1e-9, "row {} col {}: {}", row, col, diff);
                }
            }
        }

        // The registers are still correlated through the working columns
        let mut step = CircuitProgram::new();
        build_recurrent_cell_step(&mut step, &[0.0, 0.0], &params, &hidden, &working).unwrap();
        let got = PhaseSpaceMap::from_program(&gaussian_part(&step), total).unwrap();
        let cross = (0..n_h)
            .map(|h| h + total)
            .flat_map(|row| [n_h, n_h + 1, total + n_h, total + n_h + 1].map(|col| (row, col)))
            .fold(0.0_f64, |acc, (row, col)| acc.max(got.symplectic()[[row, col]].abs()));
        assert!(cross > 1e-3, "cross block = {}", cross);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must be disjoint")]
    fn test_overlapping_registers_panic_in_debug() {
        let mut rng = StdRng::seed_from_u64(8);
        let params = random_params(2, 2, &mut rng);
        let mut program = CircuitProgram::new();
        let _ = build_recurrent_cell_step(&mut program, &[0.1, 0.2], &params, &mode_range(0, 2), &mode_range(1, 2));
    }

    #[test]
    fn test_step_rejects_wide_input() {
        let mut rng = StdRng::seed_from_u64(4);
        let params = random_params(2, 2, &mut rng);
        let mut program = CircuitProgram::new();
        let err = build_recurrent_cell_step(
            &mut program,
            &[0.1, 0.2, 0.3],
            &params,
            &mode_range(0, 2),
            &mode_range(2, 2),
        )
        .unwrap_err();
        assert_eq!(err, CircuitError::InsufficientModes { needed: 3, available: 2 });
        assert!(program.is_empty());
    }

    #[test]
    fn test_sequence_truncates_working_modes() {
        let mut rng = StdRng::seed_from_u64(5);
        let hidden = mode_range(0, 2);
        let working = mode_range(2, 4);
        let params = random_params(1, 2, &mut rng);
        let sequence = vec![vec![0.1], vec![0.2], vec![0.3]];

        let mut program = CircuitProgram::new();
        build_recurrent_sequence(&mut program, &sequence, &params, &hidden, &working).unwrap();

        let mut one = CircuitProgram::new();
        build_recurrent_cell_step(&mut one, &[0.1], &params, &hidden, &working[..1]).unwrap();
        assert_eq!(program.len(), 3 * one.len());
        assert_eq!(program.mode_span(), 3);
        assert_eq!(program.count("ControlledPhase"), 3);
    }

    #[test]
    fn test_sequence_shape_errors() {
        let mut rng = StdRng::seed_from_u64(6);
        let params = random_params(2, 2, &mut rng);
        let hidden = mode_range(0, 2);
        let working = mode_range(2, 2);
        let mut program = CircuitProgram::new();

        let ragged = vec![vec![0.1, 0.2], vec![0.3]];
        assert_eq!(
            build_recurrent_sequence(&mut program, &ragged, &params, &hidden, &working),
            Err(CircuitError::RaggedSequence { step: 1, expected: 2, got: 1 })
        );

        let wide = vec![vec![0.0; 3]];
        assert!(build_recurrent_sequence(&mut program, &wide, &params, &hidden, &working).is_err());

        let wrong_width = vec![vec![0.0; 1]];
        assert!(matches!(
            build_recurrent_sequence(&mut program, &wrong_width, &params, &hidden, &working),
            Err(CircuitError::ParameterCount { .. })
        ));
        assert!(program.is_empty());

        let empty: Vec<Vec<f64>> = Vec::new();
        build_recurrent_sequence(&mut program, &empty, &params, &hidden, &working).unwrap();
        assert!(program.is_empty());
    }
}
