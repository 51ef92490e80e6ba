//! Phase-space picture of Gaussian programs.
//!
//! Every Gaussian gate acts on the quadrature vector
//! `(x_1..x_n, p_1..p_n)` as an affine map `r -> S r + d` with `S`
//! symplectic (ħ = 2). Composing a program's gates gives one `(S, d)`,
//! which makes compute/uncompute identities checkable without a Fock
//! simulator, and gives exact ⟨x⟩, ⟨p⟩ for vacuum input.

use ndarray::{arr2, Array1, Array2};
use num_complex::Complex64;
use thiserror::Error;

use crate::circuit::{CircuitProgram, Gate, Mode};
use crate::measurement::{Device, Observable, StateArtifact};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseSpaceError {
    #[error("{gate} is not a Gaussian gate")]
    NonGaussian { gate: &'static str },
    #[error("mode {mode} outside a {modes}-mode register")]
    ModeOutOfRange { mode: usize, modes: usize },
    #[error("phase-space device does not produce Fock states")]
    StateUnavailable,
}

/// Affine symplectic map of a Gaussian program.
#[derive(Clone, Debug)]
pub struct PhaseSpaceMap {
    pub n_modes: usize,
    symplectic: Array2<f64>,
    displacement: Array1<f64>,
}

impl PhaseSpaceMap {
    /// Identity map on `n_modes` modes.
    pub fn identity(n_modes: usize) -> Self {
        Self {
            n_modes,
            symplectic: Array2::eye(2 * n_modes),
            displacement: Array1::zeros(2 * n_modes),
        }
    }

    /// Compose every gate of `program`, in order.
    pub fn from_program(program: &CircuitProgram, n_modes: usize) -> Result<Self, PhaseSpaceError> {
        let mut map = Self::identity(n_modes);
        for gate in program {
            map.apply(gate)?;
        }
        Ok(map)
    }

    pub fn symplectic(&self) -> &Array2<f64> {
        &self.symplectic
    }

    pub fn displacement(&self) -> &Array1<f64> {
        &self.displacement
    }

    fn x(&self, mode: Mode) -> Result<usize, PhaseSpaceError> {
        if mode.index() >= self.n_modes {
            return Err(PhaseSpaceError::ModeOutOfRange {
                mode: mode.index(),
                modes: self.n_modes,
            });
        }
        Ok(mode.index())
    }

    fn p(&self, mode: Mode) -> Result<usize, PhaseSpaceError> {
        Ok(self.x(mode)? + self.n_modes)
    }

    /// Left-multiply by `local`, which acts on quadrature `rows` only.
    fn apply_local(&mut self, rows: &[usize], local: &Array2<f64>) {
        let k = rows.len();
        let mut buf = vec![0.0; k];

        for col in 0..2 * self.n_modes {
            for (i, out) in buf.iter_mut().enumerate() {
                *out = (0..k).map(|j| local[[i, j]] * self.symplectic[[rows[j], col]]).sum();
            }
            for (i, &row) in rows.iter().enumerate() {
                self.symplectic[[row, col]] = buf[i];
            }
        }

        for (i, out) in buf.iter_mut().enumerate() {
            *out = (0..k).map(|j| local[[i, j]] * self.displacement[rows[j]]).sum();
        }
        for (i, &row) in rows.iter().enumerate() {
            self.displacement[row] = buf[i];
        }
    }

    /// Real form `[[Re U, -Im U], [Im U, Re U]]` of a passive mode transform.
    fn passive(u: &Array2<Complex64>) -> Array2<f64> {
        let k = u.nrows();
        let mut s: Array2<f64> = Array2::zeros((2 * k, 2 * k));
        for i in 0..k {
            for j in 0..k {
                s[[i, j]] = u[[i, j]].re;
                s[[i, j + k]] = -u[[i, j]].im;
                s[[i + k, j]] = u[[i, j]].im;
                s[[i + k, j + k]] = u[[i, j]].re;
            }
        }
        s
    }

    /// Compose one more gate after the current map.
    pub fn apply(&mut self, gate: &Gate) -> Result<(), PhaseSpaceError> {
        match *gate {
            Gate::Displacement { r, phi, mode } => {
                let (x, p) = (self.x(mode)?, self.p(mode)?);
                self.displacement[x] += 2.0 * r * phi.cos();
                self.displacement[p] += 2.0 * r * phi.sin();
            }
            Gate::Squeezing { r, phi, mode } => {
                let rows = [self.x(mode)?, self.p(mode)?];
                let (ch, sh) = (r.cosh(), r.sinh());
                let local = arr2(&[
                    [ch - phi.cos() * sh, -phi.sin() * sh],
                    [-phi.sin() * sh, ch + phi.cos() * sh],
                ]);
                self.apply_local(&rows, &local);
            }
            Gate::Rotation { phi, mode } => {
                let rows = [self.x(mode)?, self.p(mode)?];
                let u = Array2::from_elem((1, 1), Complex64::from_polar(1.0, phi));
                self.apply_local(&rows, &Self::passive(&u));
            }
            Gate::Beamsplitter { theta, phi, modes: (a, b) } => {
                let rows = [self.x(a)?, self.x(b)?, self.p(a)?, self.p(b)?];
                let (c, s) = (theta.cos(), theta.sin());
                let u = arr2(&[
                    [Complex64::new(c, 0.0), -Complex64::from_polar(s, -phi)],
                    [Complex64::from_polar(s, phi), Complex64::new(c, 0.0)],
                ]);
                self.apply_local(&rows, &Self::passive(&u));
            }
            Gate::ControlledPhase { s, modes: (a, b) } => {
                let rows = [self.x(a)?, self.x(b)?, self.p(a)?, self.p(b)?];
                let mut local: Array2<f64> = Array2::eye(4);
                local[[2, 1]] = s;
                local[[3, 0]] = s;
                self.apply_local(&rows, &local);
            }
            Gate::Kerr { .. } => {
                return Err(PhaseSpaceError::NonGaussian { gate: gate.name() });
            }
        }
        Ok(())
    }

    /// Largest entry of `|S - I|` and `|d|`.
    pub fn distance_from_identity(&self) -> f64 {
        let eye: Array2<f64> = Array2::eye(2 * self.n_modes);
        let s_err = (&self.symplectic - &eye)
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let d_err = self.displacement.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        s_err.max(d_err)
    }

    /// `S Sᵀ = I`, i.e. the map is passive.
    pub fn is_orthogonal(&self, tolerance: f64) -> bool {
        let product = self.symplectic.dot(&self.symplectic.t());
        let eye: Array2<f64> = Array2::eye(2 * self.n_modes);
        (&product - &eye).iter().all(|v| v.abs() <= tolerance)
    }

    /// `S Ω Sᵀ = Ω`.
    pub fn is_symplectic(&self, tolerance: f64) -> bool {
        let n = self.n_modes;
        let mut omega: Array2<f64> = Array2::zeros((2 * n, 2 * n));
        for i in 0..n {
            omega[[i, i + n]] = 1.0;
            omega[[i + n, i]] = -1.0;
        }
        let product = self.symplectic.dot(&omega).dot(&self.symplectic.t());
        (&product - &omega).iter().all(|v| v.abs() <= tolerance)
    }

    /// Image of the quadrature means `r`.
    pub fn apply_to_means(&self, means: &Array1<f64>) -> Array1<f64> {
        self.symplectic.dot(means) + &self.displacement
    }

    /// Covariance produced from vacuum (`V = S Sᵀ` for ħ = 2).
    pub fn vacuum_covariance(&self) -> Array2<f64> {
        self.symplectic.dot(&self.symplectic.t())
    }
}

/// Reference device for Gaussian programs on a vacuum register.
///
/// Returns exact quadrature expectations. Kerr gates and state requests
/// are reported as errors.
#[derive(Clone, Copy, Debug)]
pub struct GaussianDevice {
    pub n_modes: usize,
}

impl GaussianDevice {
    pub fn new(n_modes: usize) -> Self {
        Self { n_modes }
    }
}

impl Device for GaussianDevice {
    type Error = PhaseSpaceError;

    fn expectations(
        &self,
        program: &CircuitProgram,
        observables: &[Observable],
    ) -> Result<Vec<f64>, PhaseSpaceError> {
        let map = PhaseSpaceMap::from_program(program, self.n_modes)?;
        observables
            .iter()
            .map(|obs| match *obs {
                Observable::X(mode) => Ok(map.displacement[map.x(mode)?]),
                Observable::P(mode) => Ok(map.displacement[map.p(mode)?]),
            })
            .collect()
    }

    fn state(&self, _program: &CircuitProgram) -> Result<StateArtifact, PhaseSpaceError> {
        Err(PhaseSpaceError::StateUnavailable)
    }
}
