//! Random initialisation of parameter vectors.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, Result};

/// Parameters are drawn from `Normal(0, stddev)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitConfig {
    pub stddev: f64,
}

impl Default for InitConfig {
    fn default() -> Self {
        // Near-identity circuits at the start of training
        Self { stddev: 0.001 }
    }
}

/// `len` independent draws.
pub fn init_params<R: Rng + ?Sized>(len: usize, config: &InitConfig, rng: &mut R) -> Result<Vec<f64>> {
    let normal = Normal::new(0.0, config.stddev)
        .map_err(|err| CircuitError::InvalidInit(err.to_string()))?;
    Ok((0..len).map(|_| normal.sample(rng)).collect())
}
