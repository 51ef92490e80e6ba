//! Whole-network circuit assemblies.
//!
//! A dense network stacks linear and activation layers on one register; a
//! recurrent network runs the recurrent cell over a sequence and reads out
//! the hidden register. Each sample gets its own program, so samples are
//! independent and a batch is built and executed in parallel.

use std::borrow::Borrow;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activation::build_activation_layer;
use crate::circuit::{mode_range, CircuitProgram, Mode};
use crate::encoder::encode;
use crate::error::{CircuitError, Result, RunError};
use crate::init::{init_params, InitConfig};
use crate::layout::{
    activation_param_count, check_len, linear_layer_param_count, recurrent_cell_param_count,
};
use crate::linear::build_linear_layer;
use crate::measurement::{extract_diagnostic_state, measure_expectations, Device};
use crate::recurrent::build_recurrent_sequence;

fn check_readout(output_size: usize, available: usize) -> Result<()> {
    if output_size == 0 {
        return Err(CircuitError::InvalidModeCount(0));
    }
    if output_size > available {
        return Err(CircuitError::InsufficientModes {
            needed: output_size,
            available,
        });
    }
    Ok(())
}

/// A model whose forward pass is a circuit program per sample.
pub trait CircuitModel: Sync {
    type Sample: ?Sized + Sync;
    type Params: Sync;

    fn build_program(&self, sample: &Self::Sample, params: &Self::Params) -> Result<CircuitProgram>;

    /// Ordered modes whose prefix is read out.
    fn readout_modes(&self) -> Vec<Mode>;

    fn output_size(&self) -> usize;

    /// ⟨x⟩ on the readout modes. The trainable path.
    fn forward<D: Device>(
        &self,
        device: &D,
        sample: &Self::Sample,
        params: &Self::Params,
    ) -> std::result::Result<Vec<f64>, RunError<D::Error>> {
        let program = self.build_program(sample, params)?;
        measure_expectations(device, &program, &self.readout_modes(), self.output_size())
    }

    /// Σ|a|² of the final state. Diagnostic only, never differentiated.
    fn diagnostic_trace<D: Device>(
        &self,
        device: &D,
        sample: &Self::Sample,
        params: &Self::Params,
    ) -> std::result::Result<f64, RunError<D::Error>> {
        let program = self.build_program(sample, params)?;
        extract_diagnostic_state(device, &program).map_err(RunError::Device)
    }

    /// [`CircuitModel::forward`] over a batch; output order follows input order.
    fn forward_batch<D, S>(
        &self,
        device: &D,
        batch: &[S],
        params: &Self::Params,
    ) -> std::result::Result<Vec<Vec<f64>>, RunError<D::Error>>
    where
        D: Device + Sync,
        S: Borrow<Self::Sample> + Sync,
    {
        debug!(samples = batch.len(), "running forward batch");
        batch
            .par_iter()
            .map(|sample| self.forward(device, sample.borrow(), params))
            .collect()
    }

    fn diagnostic_trace_batch<D, S>(
        &self,
        device: &D,
        batch: &[S],
        params: &Self::Params,
    ) -> std::result::Result<Vec<f64>, RunError<D::Error>>
    where
        D: Device + Sync,
        S: Borrow<Self::Sample> + Sync,
    {
        batch
            .par_iter()
            .map(|sample| self.diagnostic_trace(device, sample.borrow(), params))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseNetConfig {
    pub modes: usize,
    pub output_size: usize,
    pub layers: usize,
    pub last_activation: bool,
}

impl DenseNetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.modes == 0 {
            return Err(CircuitError::InvalidModeCount(0));
        }
        if self.layers == 0 {
            return Err(CircuitError::BlockCount { expected: 1, got: 0 });
        }
        check_readout(self.output_size, self.modes)
    }
}

/// Trainable parameters of a [`DenseNet`].
///
/// `last_activation` has one entry per mode; only the first `output_size`
/// are applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseNetParams {
    pub linear: Vec<Vec<f64>>,
    pub activation: Vec<Vec<f64>>,
    pub last_activation: Option<Vec<f64>>,
}

impl DenseNetParams {
    pub fn random<R: Rng + ?Sized>(config: &DenseNetConfig, init: &InitConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let linear_len = linear_layer_param_count(config.modes)?;
        let act_len = activation_param_count(config.modes)?;

        let linear = (0..config.layers)
            .map(|_| init_params(linear_len, init, rng))
            .collect::<Result<Vec<_>>>()?;
        let activation = (0..config.layers - 1)
            .map(|_| init_params(act_len, init, rng))
            .collect::<Result<Vec<_>>>()?;
        let last_activation = if config.last_activation {
            Some(init_params(act_len, init, rng)?)
        } else {
            None
        };

        Ok(Self {
            linear,
            activation,
            last_activation,
        })
    }

    /// Shapes must match `config` exactly.
    pub fn check(&self, config: &DenseNetConfig) -> Result<()> {
        config.validate()?;
        if self.linear.len() != config.layers {
            return Err(CircuitError::BlockCount {
                expected: config.layers,
                got: self.linear.len(),
            });
        }
        if self.activation.len() != config.layers - 1 {
            return Err(CircuitError::BlockCount {
                expected: config.layers - 1,
                got: self.activation.len(),
            });
        }
        let linear_len = linear_layer_param_count(config.modes)?;
        for block in &self.linear {
            check_len(block, linear_len)?;
        }
        for block in &self.activation {
            check_len(block, config.modes)?;
        }
        match (&self.last_activation, config.last_activation) {
            (Some(last), true) => check_len(last, config.modes),
            (None, false) => Ok(()),
            (Some(_), false) => Err(CircuitError::BlockCount { expected: 0, got: 1 }),
            (None, true) => Err(CircuitError::BlockCount { expected: 1, got: 0 }),
        }
    }
}

/// Encode, then `layers - 1` × (linear, Kerr), a final linear layer and an
/// optional Kerr layer on the readout modes.
#[derive(Clone, Debug)]
pub struct DenseNet {
    pub config: DenseNetConfig,
}

impl DenseNet {
    pub fn new(config: DenseNetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl CircuitModel for DenseNet {
    type Sample = [f64];
    type Params = DenseNetParams;

    fn build_program(&self, input: &[f64], params: &DenseNetParams) -> Result<CircuitProgram> {
        params.check(&self.config)?;
        let q = mode_range(0, self.config.modes);
        let mut program = CircuitProgram::new();

        encode(&mut program, input, &q)?;
        for (linear, activation) in params.linear.iter().zip(&params.activation) {
            build_linear_layer(&mut program, linear, &q)?;
            build_activation_layer(&mut program, activation, &q)?;
        }
        if let Some(last) = params.linear.last() {
            build_linear_layer(&mut program, last, &q)?;
        }
        if let Some(last) = &params.last_activation {
            let out = self.config.output_size;
            build_activation_layer(&mut program, &last[..out], &q[..out])?;
        }
        Ok(program)
    }

    fn readout_modes(&self) -> Vec<Mode> {
        mode_range(0, self.config.modes)
    }

    fn output_size(&self) -> usize {
        self.config.output_size
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrentNetConfig {
    pub hidden_modes: usize,
    pub output_size: usize,
}

impl RecurrentNetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_modes == 0 {
            return Err(CircuitError::InvalidModeCount(0));
        }
        check_readout(self.output_size, self.hidden_modes)
    }
}

/// Trainable parameters of a [`RecurrentNet`] for a fixed input width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurrentNetParams {
    pub cell: Vec<f64>,
    pub linear: Vec<f64>,
    pub activation: Vec<f64>,
}

impl RecurrentNetParams {
    /// Parameters for sequences whose steps have `width` values.
    pub fn random<R: Rng + ?Sized>(
        config: &RecurrentNetConfig,
        width: usize,
        init: &InitConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let hidden = config.hidden_modes;
        Ok(Self {
            cell: init_params(recurrent_cell_param_count(width, hidden)?, init, rng)?,
            linear: init_params(linear_layer_param_count(hidden)?, init, rng)?,
            activation: init_params(activation_param_count(hidden)?, init, rng)?,
        })
    }
}

/// Hidden modes `0..hidden_modes`, working modes right after them.
#[derive(Clone, Debug)]
pub struct RecurrentNet {
    pub config: RecurrentNetConfig,
}

impl RecurrentNet {
    pub fn new(config: RecurrentNetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn hidden_modes(&self) -> Vec<Mode> {
        mode_range(0, self.config.hidden_modes)
    }

    /// Working modes for steps of `width` values.
    pub fn working_modes(&self, width: usize) -> Vec<Mode> {
        mode_range(self.config.hidden_modes, width)
    }
}

impl CircuitModel for RecurrentNet {
    type Sample = [Vec<f64>];
    type Params = RecurrentNetParams;

    fn build_program(&self, sequence: &[Vec<f64>], params: &RecurrentNetParams) -> Result<CircuitProgram> {
        let hidden = self.hidden_modes();
        let width = sequence.first().map_or(0, Vec::len);
        let working = self.working_modes(width);
        let mut program = CircuitProgram::new();

        build_recurrent_sequence(&mut program, sequence, &params.cell, &hidden, &working)?;
        build_linear_layer(&mut program, &params.linear, &hidden)?;
        build_activation_layer(&mut program, &params.activation, &hidden)?;
        Ok(program)
    }

    fn readout_modes(&self) -> Vec<Mode> {
        self.hidden_modes()
    }

    fn output_size(&self) -> usize {
        self.config.output_size
    }
}
