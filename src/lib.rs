//! Continuous-Variable Quantum Neural Network Circuits
//!
//! Builds gate-level photonic programs for trainable CV layers:
//! interferometer meshes, linear layers, Kerr activations, displacement
//! encoding and a compute/uncompute recurrent cell. Execution and
//! differentiation belong to an external [`Device`].

pub mod error;
pub mod circuit;
pub mod layout;
pub mod interferometer;
pub mod linear;
pub mod activation;
pub mod encoder;
pub mod recurrent;
pub mod measurement;
pub mod phase_space;
pub mod init;
pub mod network;

pub use error::{CircuitError, Result, RunError};
pub use circuit::{mode_range, CircuitProgram, Gate, Mode};
pub use layout::{layout, LayerKind, Layout};
pub use interferometer::{build_interferometer, build_interferometer_inverse};
pub use linear::{build_linear_layer, build_linear_layer_inverse};
pub use activation::build_activation_layer;
pub use encoder::{decode, encode};
pub use recurrent::{build_recurrent_cell_step, build_recurrent_sequence};
pub use measurement::{
    extract_diagnostic_state, extract_state_summary, measure, measure_expectations, Device,
    Observable, StateArtifact,
};
pub use phase_space::{GaussianDevice, PhaseSpaceMap};
pub use init::{init_params, InitConfig};
pub use network::{CircuitModel, DenseNet, DenseNetConfig, DenseNetParams, RecurrentNet, RecurrentNetConfig, RecurrentNetParams};
