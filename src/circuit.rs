//! Gate-level circuit programs.
//!
//! A program is an ordered list of continuous-variable gates acting on
//! optical modes. Builders only ever append; the device consumes the result.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Optical mode (wire) identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Mode(pub usize);

impl Mode {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Consecutive modes `start..start + count`.
pub fn mode_range(start: usize, count: usize) -> Vec<Mode> {
    (start..start + count).map(Mode).collect()
}

/// `true` when no mode appears twice across `registers`.
pub(crate) fn all_distinct(registers: &[&[Mode]]) -> bool {
    let mut seen = HashSet::new();
    registers.iter().flat_map(|r| r.iter()).all(|m| seen.insert(*m))
}

/// Continuous-variable gate with its parameter values bound.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Phase-space displacement by `r·e^(iφ)`.
    Displacement { r: f64, phi: f64, mode: Mode },
    /// Single-mode squeezing with amplitude `r` along angle `phi`.
    Squeezing { r: f64, phi: f64, mode: Mode },
    /// Phase rotation.
    Rotation { phi: f64, mode: Mode },
    /// Two-mode beamsplitter with mixing angle `theta` and phase `phi`.
    Beamsplitter { theta: f64, phi: f64, modes: (Mode, Mode) },
    /// Kerr nonlinearity.
    Kerr { kappa: f64, mode: Mode },
    /// Controlled phase coupling of strength `s`.
    ControlledPhase { s: f64, modes: (Mode, Mode) },
}

impl Gate {
    /// Modes the gate acts on, in application order.
    pub fn modes(&self) -> Vec<Mode> {
        match *self {
            Gate::Displacement { mode, .. }
            | Gate::Squeezing { mode, .. }
            | Gate::Rotation { mode, .. }
            | Gate::Kerr { mode, .. } => vec![mode],
            Gate::Beamsplitter { modes: (a, b), .. }
            | Gate::ControlledPhase { modes: (a, b), .. } => vec![a, b],
        }
    }

    /// Short gate name as used by photonic toolkits.
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Displacement { .. } => "Displacement",
            Gate::Squeezing { .. } => "Squeezing",
            Gate::Rotation { .. } => "Rotation",
            Gate::Beamsplitter { .. } => "Beamsplitter",
            Gate::Kerr { .. } => "Kerr",
            Gate::ControlledPhase { .. } => "ControlledPhase",
        }
    }

    /// Whether the gate is Gaussian (maps Gaussian states to Gaussian states).
    pub fn is_gaussian(&self) -> bool {
        !matches!(self, Gate::Kerr { .. })
    }
}

/// Ordered, append-only gate sequence for a single sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitProgram {
    gates: Vec<Gate>,
}

impl CircuitProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            gates: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, gate: Gate) {
        self.gates.push(gate);
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of gates with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.gates.iter().filter(|g| g.name() == name).count()
    }

    /// Highest mode index touched plus one, or zero for an empty program.
    pub fn mode_span(&self) -> usize {
        self.gates
            .iter()
            .flat_map(|g| g.modes())
            .map(|m| m.index() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gate> {
        self.gates.iter()
    }

    /// Serialize for an out-of-process device.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Extend<Gate> for CircuitProgram {
    fn extend<I: IntoIterator<Item = Gate>>(&mut self, iter: I) {
        self.gates.extend(iter);
    }
}

impl<'a> IntoIterator for &'a CircuitProgram {
    type Item = &'a Gate;
    type IntoIter = std::slice::Iter<'a, Gate>;

    fn into_iter(self) -> Self::IntoIter {
        self.gates.iter()
    }
}
