//! Universal multiport interferometer.
//!
//! Rectangular mesh of depth N built from two-mode beamsplitters, followed
//! by local phase rotations. The mesh carries N(N-1)/2 beamsplitters.

use tracing::debug;

use crate::circuit::{all_distinct, CircuitProgram, Gate, Mode};
use crate::error::{CircuitError, Result};
use crate::layout::{rotation_count, split_interferometer};

/// Adjacent-port pairs of an `n`-port mesh, in emission order.
///
/// Layer `l` skips pair `k` when `l + k` is odd. Both the forward and the
/// inverse builder derive their pairs from this, so nothing is cached.
pub fn mesh_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(crate::layout::mesh_size(n));
    for layer in 0..n {
        for k in 0..n.saturating_sub(1) {
            if (layer + k) % 2 != 1 {
                pairs.push((k, k + 1));
            }
        }
    }
    pairs
}

fn check_modes(modes: &[Mode]) -> Result<()> {
    if modes.is_empty() {
        return Err(CircuitError::InvalidModeCount(0));
    }
    debug_assert!(all_distinct(&[modes]), "repeated mode in {:?}", modes);
    Ok(())
}

/// Append the interferometer described by `params` on `modes`.
pub fn build_interferometer(
    program: &mut CircuitProgram,
    params: &[f64],
    modes: &[Mode],
) -> Result<()> {
    check_modes(modes)?;
    let n = modes.len();
    let split = split_interferometer(params, n)?;

    if n == 1 {
        program.push(Gate::Rotation {
            phi: split.rphi[0],
            mode: modes[0],
        });
        return Ok(());
    }

    for (i, (a, b)) in mesh_pairs(n).into_iter().enumerate() {
        program.push(Gate::Beamsplitter {
            theta: split.theta[i],
            phi: split.phi[i],
            modes: (modes[a], modes[b]),
        });
    }

    // Local phases on every mode but the last
    for i in 0..rotation_count(n) {
        program.push(Gate::Rotation {
            phi: split.rphi[i],
            mode: modes[i],
        });
    }

    debug!(modes = n, beamsplitters = split.theta.len(), "built interferometer");
    Ok(())
}

/// Append the exact inverse of [`build_interferometer`] for the same inputs.
pub fn build_interferometer_inverse(
    program: &mut CircuitProgram,
    params: &[f64],
    modes: &[Mode],
) -> Result<()> {
    check_modes(modes)?;
    let n = modes.len();
    let split = split_interferometer(params, n)?;

    if n == 1 {
        program.push(Gate::Rotation {
            phi: -split.rphi[0],
            mode: modes[0],
        });
        return Ok(());
    }

    for i in 0..rotation_count(n) {
        program.push(Gate::Rotation {
            phi: -split.rphi[i],
            mode: modes[i],
        });
    }

    let pairs = mesh_pairs(n);
    for i in (0..pairs.len()).rev() {
        let (a, b) = pairs[i];
        program.push(Gate::Beamsplitter {
            theta: -split.theta[i],
            phi: split.phi[i],
            modes: (modes[a], modes[b]),
        });
    }

    debug!(modes = n, "built inverse interferometer");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::mode_range;
    use crate::layout::interferometer_param_count;
    use crate::phase_space::PhaseSpaceMap;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn random_params(n: usize, rng: &mut StdRng) -> Vec<f64> {
        (0..interferometer_param_count(n).unwrap())
            .map(|_| rng.gen_range(-PI..PI))
            .collect()
    }

    #[test]
    fn test_mesh_size() {
        for n in 1..=12 {
            assert_eq!(mesh_pairs(n).len(), n * (n - 1) / 2, "n = {}", n);
        }
        assert_eq!(mesh_pairs(3), vec![(0, 1), (1, 2), (0, 1)]);
        assert_eq!(mesh_pairs(4), vec![(0, 1), (2, 3), (1, 2), (0, 1), (2, 3), (1, 2)]);
    }

    #[test]
    fn test_gate_counts() {
        let mut rng = StdRng::seed_from_u64(3);
        for n in 1..=12 {
            let modes = mode_range(0, n);
            let mut program = CircuitProgram::new();
            build_interferometer(&mut program, &random_params(n, &mut rng), &modes).unwrap();
            assert_eq!(program.count("Beamsplitter"), n * (n - 1) / 2);
            assert_eq!(program.count("Rotation"), (n - 1).max(1));
        }
    }

    #[test]
    fn test_single_mode() {
        let modes = [Mode(4)];
        let mut program = CircuitProgram::new();
        build_interferometer(&mut program, &[0.3], &modes).unwrap();
        assert_eq!(program.gates(), &[Gate::Rotation { phi: 0.3, mode: Mode(4) }]);

        let mut inverse = CircuitProgram::new();
        build_interferometer_inverse(&mut inverse, &[0.3], &modes).unwrap();
        assert_eq!(inverse.gates(), &[Gate::Rotation { phi: -0.3, mode: Mode(4) }]);
    }

    #[test]
    fn test_params_consumed_in_emission_order() {
        // theta = [1, 2, 3], phi = [4, 5, 6], rphi = [7, 8]
        let params = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let modes = [Mode(10), Mode(11), Mode(12)];
        let mut program = CircuitProgram::new();
        build_interferometer(&mut program, &params, &modes).unwrap();

        assert_eq!(
            program.gates(),
            &[
                Gate::Beamsplitter { theta: 1.0, phi: 4.0, modes: (Mode(10), Mode(11)) },
                Gate::Beamsplitter { theta: 2.0, phi: 5.0, modes: (Mode(11), Mode(12)) },
                Gate::Beamsplitter { theta: 3.0, phi: 6.0, modes: (Mode(10), Mode(11)) },
                Gate::Rotation { phi: 7.0, mode: Mode(10) },
                Gate::Rotation { phi: 8.0, mode: Mode(11) },
            ]
        );
    }

    #[test]
    fn test_inverse_mirrors_forward() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 5;
        let modes = mode_range(2, n);
        let params = random_params(n, &mut rng);

        let mut forward = CircuitProgram::new();
        build_interferometer(&mut forward, &params, &modes).unwrap();
        let mut inverse = CircuitProgram::new();
        build_interferometer_inverse(&mut inverse, &params, &modes).unwrap();

        assert_eq!(forward.len(), inverse.len());
        for (f, i) in forward.iter().zip(inverse.iter().rev()) {
            match (*f, *i) {
                (Gate::Rotation { phi: a, mode: m }, Gate::Rotation { phi: b, mode: k }) => {
                    assert_eq!(m, k);
                    assert_eq!(a, -b);
                }
                (
                    Gate::Beamsplitter { theta: t1, phi: p1, modes: m1 },
                    Gate::Beamsplitter { theta: t2, phi: p2, modes: m2 },
                ) => {
                    assert_eq!(m1, m2);
                    assert_eq!(t1, -t2);
                    assert_eq!(p1, p2);
                }
                other => panic!("mismatched gates: {:?}", other),
            }
        }
    }

    #[test]
    fn test_inverse_restores_phase_space() {
        let mut rng = StdRng::seed_from_u64(5);
        for n in 1..=8 {
            let modes = mode_range(0, n);
            let params = random_params(n, &mut rng);
            let mut program = CircuitProgram::new();
            build_interferometer(&mut program, &params, &modes).unwrap();
            build_interferometer_inverse(&mut program, &params, &modes).unwrap();

            let map = PhaseSpaceMap::from_program(&program, n).unwrap();
            let err = map.distance_from_identity();
            assert!(err < 1e-9, "n = {}: error {}", n, err);
        }
    }

    #[test]
    fn test_forward_is_passive() {
        // Interferometers are orthogonal symplectic maps
        let mut rng = StdRng::seed_from_u64(8);
        let n = 4;
        let mut program = CircuitProgram::new();
        build_interferometer(&mut program, &random_params(n, &mut rng), &mode_range(0, n)).unwrap();
        let map = PhaseSpaceMap::from_program(&program, n).unwrap();
        assert!(map.is_orthogonal(1e-9));
    }

    #[test]
    fn test_rejects_mismatched_params() {
        let mut program = CircuitProgram::new();
        let err = build_interferometer(&mut program, &[0.0; 7], &mode_range(0, 3)).unwrap_err();
        assert_eq!(err, CircuitError::ParameterCount { expected: 8, got: 7 });
        assert!(program.is_empty());

        let err = build_interferometer_inverse(&mut program, &[], &[]).unwrap_err();
        assert_eq!(err, CircuitError::InvalidModeCount(0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "repeated mode")]
    fn test_repeated_mode_panics_in_debug() {
        let mut program = CircuitProgram::new();
        let _ = build_interferometer(&mut program, &[0.0; 3], &[Mode(0), Mode(0)]);
    }
}
