//! Parameter layout for every gate block.
//!
//! Parameter vectors are flat and segmented purely by position. The count
//! functions and the split functions below must agree index-for-index,
//! because the inverse builders re-split the same vector to undo a block.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, Result};

/// Strength of the working/hidden controlled-phase coupling.
///
/// Fixed, so the recurrent cell layout reserves no parameters for it.
pub const COUPLING_STRENGTH: f64 = 1.0;

#[inline]
fn check_modes(n: usize) -> Result<()> {
    if n == 0 {
        return Err(CircuitError::InvalidModeCount(n));
    }
    Ok(())
}

/// Parameter slice length must equal `expected`.
#[inline]
pub(crate) fn check_len(params: &[f64], expected: usize) -> Result<()> {
    if params.len() != expected {
        return Err(CircuitError::ParameterCount {
            expected,
            got: params.len(),
        });
    }
    Ok(())
}

/// Beamsplitters in an `n`-mode mesh: `n(n-1)/2`.
#[inline]
pub fn mesh_size(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Final phase rotations of an `n`-mode interferometer: `max(1, n-1)`.
#[inline]
pub fn rotation_count(n: usize) -> usize {
    n.saturating_sub(1).max(1)
}

/// `n(n-1) + max(1, n-1)`.
pub fn interferometer_param_count(n: usize) -> Result<usize> {
    check_modes(n)?;
    Ok(2 * mesh_size(n) + rotation_count(n))
}

/// `2M + 3n` where `M` is the interferometer count.
pub fn linear_layer_param_count(n: usize) -> Result<usize> {
    let m = interferometer_param_count(n)?;
    Ok(2 * m + 3 * n)
}

/// One Kerr coefficient per mode.
pub fn activation_param_count(n: usize) -> Result<usize> {
    check_modes(n)?;
    Ok(n)
}

/// Working linear layer, hidden linear layer, hidden activation.
pub fn recurrent_cell_param_count(working: usize, hidden: usize) -> Result<usize> {
    Ok(linear_layer_param_count(working)?
        + linear_layer_param_count(hidden)?
        + activation_param_count(hidden)?)
}

/// Interferometer parameters viewed in place.
#[derive(Clone, Copy, Debug)]
pub struct InterferometerParams<'a> {
    pub theta: &'a [f64],
    pub phi: &'a [f64],
    pub rphi: &'a [f64],
}

/// Split an interferometer vector into `theta`, `phi` and `rphi`.
///
/// `rphi` is taken from the end of the vector.
pub fn split_interferometer(params: &[f64], n: usize) -> Result<InterferometerParams<'_>> {
    check_len(params, interferometer_param_count(n)?)?;
    let half = mesh_size(n);
    let rphi_start = params.len() - rotation_count(n);
    Ok(InterferometerParams {
        theta: &params[..half],
        phi: &params[half..2 * half],
        rphi: &params[rphi_start..],
    })
}

/// Linear layer parameters viewed in place.
#[derive(Clone, Copy, Debug)]
pub struct LinearLayerParams<'a> {
    pub int1: &'a [f64],
    pub squeeze: &'a [f64],
    pub int2: &'a [f64],
    pub disp_r: &'a [f64],
    pub disp_phi: &'a [f64],
}

pub fn split_linear_layer(params: &[f64], n: usize) -> Result<LinearLayerParams<'_>> {
    check_len(params, linear_layer_param_count(n)?)?;
    let m = interferometer_param_count(n)?;
    let (int1, rest) = params.split_at(m);
    let (squeeze, rest) = rest.split_at(n);
    let (int2, rest) = rest.split_at(m);
    let (disp_r, disp_phi) = rest.split_at(n);
    Ok(LinearLayerParams {
        int1,
        squeeze,
        int2,
        disp_r,
        disp_phi,
    })
}

/// Recurrent cell parameters. `coupling` is not part of the vector.
#[derive(Clone, Debug)]
pub struct RecurrentCellParams<'a> {
    pub working_linear: &'a [f64],
    pub hidden_linear: &'a [f64],
    pub coupling: Vec<f64>,
    pub activation: &'a [f64],
}

pub fn split_recurrent_cell(
    params: &[f64],
    working: usize,
    hidden: usize,
) -> Result<RecurrentCellParams<'_>> {
    check_len(params, recurrent_cell_param_count(working, hidden)?)?;
    let (working_linear, rest) = params.split_at(linear_layer_param_count(working)?);
    let (hidden_linear, activation) = rest.split_at(linear_layer_param_count(hidden)?);
    Ok(RecurrentCellParams {
        working_linear,
        hidden_linear,
        coupling: vec![COUPLING_STRENGTH; hidden],
        activation,
    })
}

/// Gate block whose layout is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Interferometer,
    LinearLayer,
    Activation,
    /// Recurrent cell over `n` hidden modes and `working` working modes.
    RecurrentCell { working: usize },
}

/// Total parameter count plus named, contiguous sub-ranges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub total: usize,
    pub ranges: Vec<(String, Range<usize>)>,
}

impl Layout {
    fn from_lengths(parts: &[(&str, usize)]) -> Self {
        let mut start = 0;
        let ranges = parts
            .iter()
            .map(|&(name, len)| {
                let range = start..start + len;
                start += len;
                (name.to_string(), range)
            })
            .collect();
        Self { total: start, ranges }
    }

    pub fn range(&self, name: &str) -> Option<Range<usize>> {
        self.ranges
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.clone())
    }

    /// Named sub-slice of `params`; `None` for unknown names or short vectors.
    pub fn slice<'a>(&self, name: &str, params: &'a [f64]) -> Option<&'a [f64]> {
        self.range(name).and_then(|r| params.get(r))
    }
}

/// Layout of `kind` over `n` modes.
pub fn layout(n: usize, kind: LayerKind) -> Result<Layout> {
    check_modes(n)?;
    let layout = match kind {
        LayerKind::Interferometer => Layout::from_lengths(&[
            ("theta", mesh_size(n)),
            ("phi", mesh_size(n)),
            ("rphi", rotation_count(n)),
        ]),
        LayerKind::LinearLayer => {
            let m = interferometer_param_count(n)?;
            Layout::from_lengths(&[
                ("int1", m),
                ("squeeze", n),
                ("int2", m),
                ("disp_r", n),
                ("disp_phi", n),
            ])
        }
        LayerKind::Activation => Layout::from_lengths(&[("kerr", n)]),
        LayerKind::RecurrentCell { working } => Layout::from_lengths(&[
            ("working_linear", linear_layer_param_count(working)?),
            ("hidden_linear", linear_layer_param_count(n)?),
            ("activation", n),
        ]),
    };
    Ok(layout)
}
