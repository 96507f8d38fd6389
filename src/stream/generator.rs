//! Synthetic scalar stream: a slow sine wave, Gaussian noise, and rare
//! injected spikes.
//!
//! ```text
//! value(t) = sin(f * t) + N(0, σ)            (probability 1 - p)
//! value(t) = sin(f * t) + N(0, σ) ± M        (probability p, sign uniform)
//! ```
//!
//! Defaults: f = 0.1, σ = 0.5, p = 0.01, M = 5.

use rand::prelude::*;
use rand_distr::{Bernoulli, Normal};
use thiserror::Error;

use crate::config::{defaults, StreamConfig};

#[derive(Debug, Error, PartialEq)]
pub enum GeneratorError {
    #[error("Noise standard deviation must be finite and >= 0, got {0}")]
    InvalidNoise(f64),

    #[error("Spike probability must be within [0, 1], got {0}")]
    InvalidSpikeProbability(f64),
}

/// Shape of the generated signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorParams {
    pub seasonal_frequency: f64,
    pub noise_std_dev: f64,
    pub spike_probability: f64,
    pub spike_magnitude: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            seasonal_frequency: defaults::SEASONAL_FREQUENCY,
            noise_std_dev: defaults::NOISE_STD_DEV,
            spike_probability: defaults::SPIKE_PROBABILITY,
            spike_magnitude: defaults::SPIKE_MAGNITUDE,
        }
    }
}

impl From<&StreamConfig> for GeneratorParams {
    fn from(config: &StreamConfig) -> Self {
        Self {
            seasonal_frequency: config.seasonal_frequency,
            noise_std_dev: config.noise_std_dev,
            spike_probability: config.spike_probability,
            spike_magnitude: config.spike_magnitude,
        }
    }
}

/// Produces one sample per tick.
///
/// The only state is the RNG and a spike counter; the caller supplies the
/// tick number `t` and is responsible for incrementing it.
pub struct SignalGenerator {
    rng: StdRng,
    params: GeneratorParams,
    noise: Normal<f64>,
    spike: Bernoulli,
    spikes_injected: u64,
}

impl SignalGenerator {
    /// Build a generator. `seed = None` draws the RNG seed from OS entropy.
    pub fn new(params: GeneratorParams, seed: Option<u64>) -> Result<Self, GeneratorError> {
        let noise = Normal::new(0.0, params.noise_std_dev)
            .map_err(|_| GeneratorError::InvalidNoise(params.noise_std_dev))?;
        let spike = Bernoulli::new(params.spike_probability)
            .map_err(|_| GeneratorError::InvalidSpikeProbability(params.spike_probability))?;

        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            rng,
            params,
            noise,
            spike,
            spikes_injected: 0,
        })
    }

    pub fn from_config(config: &StreamConfig) -> Result<Self, GeneratorError> {
        Self::new(GeneratorParams::from(config), config.seed)
    }

    pub const fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Deterministic component at tick `t`.
    pub fn seasonal(&self, t: u64) -> f64 {
        (self.params.seasonal_frequency * t as f64).sin()
    }

    /// Next sample value for tick `t`.
    pub fn next_value(&mut self, t: u64) -> f64 {
        let mut value = self.seasonal(t) + self.noise.sample(&mut self.rng);

        if self.spike.sample(&mut self.rng) {
            let magnitude = self.params.spike_magnitude;
            value += if self.rng.gen::<bool>() { magnitude } else { -magnitude };
            self.spikes_injected += 1;
        }

        value
    }

    /// Number of spikes injected so far.
    pub const fn spikes_injected(&self) -> u64 {
        self.spikes_injected
    }
}

impl std::fmt::Debug for SignalGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalGenerator")
            .field("params", &self.params)
            .field("spikes_injected", &self.spikes_injected)
            .finish_non_exhaustive()
    }
}
