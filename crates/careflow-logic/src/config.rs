//! Simulation configuration: the wire request and its validated form.
//!
//! The orchestrator sends a `SimulationRequest` with signed integers so that
//! negative values can be reported as configuration errors rather than parse
//! failures. The seed stays unsigned. `SimulationConfig` can only be built
//! by validating a request, which makes every config reaching the engine
//! well-formed.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Per-step multiplicative drift for untreated patients when none is given.
pub const DEFAULT_DECAY: f64 = 0.95;

/// Standard deviation of the ranking noise when none is given.
pub const DEFAULT_NOISE: f64 = 0.10;

/// Largest population a single run accepts. A run keeps a few `f64`s per
/// patient, so this caps one run's working set at a few hundred MB.
pub const MAX_PATIENTS: usize = 10_000_000;

fn default_decay() -> f64 {
    DEFAULT_DECAY
}

fn default_noise() -> f64 {
    DEFAULT_NOISE
}

/// Unvalidated simulation parameters as received from the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Number of patients (arms).
    pub num_patients: i64,
    /// Number of decision steps.
    pub horizon: i64,
    /// Patients that can be treated per step.
    pub budget: i64,
    #[serde(default = "default_decay")]
    pub decay: f64,
    #[serde(default = "default_noise")]
    pub noise: f64,
    /// Non-negative; a negative JSON seed fails to decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SimulationRequest {
    /// Request with default decay and noise and no seed.
    pub fn new(num_patients: i64, horizon: i64, budget: i64) -> Self {
        Self {
            num_patients,
            horizon,
            budget,
            decay: DEFAULT_DECAY,
            noise: DEFAULT_NOISE,
            seed: None,
        }
    }

    pub fn decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate into a `SimulationConfig`.
    ///
    /// Checks run in declaration order, so the first offending field is the
    /// one reported.
    pub fn validate(self) -> Result<SimulationConfig, ConfigError> {
        SimulationConfig::try_from(self)
    }
}

/// Validated, immutable simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    num_patients: usize,
    horizon: usize,
    budget: usize,
    decay: f64,
    noise: f64,
    seed: Option<u64>,
}

impl SimulationConfig {
    pub fn num_patients(&self) -> usize {
        self.num_patients
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn noise(&self) -> f64 {
        self.noise
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of patients treated each step.
    pub fn treated_per_step(&self) -> usize {
        self.budget.min(self.num_patients)
    }

    /// Same parameters with the seed replaced. The seed has no validity
    /// constraints, so this cannot fail.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl TryFrom<SimulationRequest> for SimulationConfig {
    type Error = ConfigError;

    fn try_from(req: SimulationRequest) -> Result<Self, Self::Error> {
        if req.num_patients <= 0 {
            return Err(ConfigError::NonPositivePatients {
                value: req.num_patients,
            });
        }
        if req.num_patients as u64 > MAX_PATIENTS as u64 {
            return Err(ConfigError::TooManyPatients {
                value: req.num_patients,
                max: MAX_PATIENTS,
            });
        }
        if req.horizon <= 0 {
            return Err(ConfigError::NonPositiveHorizon { value: req.horizon });
        }
        if req.budget < 0 {
            return Err(ConfigError::NegativeBudget { value: req.budget });
        }
        if req.budget > req.num_patients {
            return Err(ConfigError::BudgetExceedsPopulation {
                budget: req.budget,
                num_patients: req.num_patients,
            });
        }
        // NaN fails the range check as well.
        if !(0.0..=1.0).contains(&req.decay) {
            return Err(ConfigError::DecayOutOfRange { value: req.decay });
        }
        if !req.noise.is_finite() || req.noise < 0.0 {
            return Err(ConfigError::InvalidNoise { value: req.noise });
        }

        Ok(Self {
            num_patients: to_usize("num_patients", req.num_patients)?,
            horizon: to_usize("horizon", req.horizon)?,
            budget: to_usize("budget", req.budget)?,
            decay: req.decay,
            noise: req.noise,
            seed: req.seed,
        })
    }
}

impl From<&SimulationConfig> for SimulationRequest {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            num_patients: config.num_patients as i64,
            horizon: config.horizon as i64,
            budget: config.budget as i64,
            decay: config.decay,
            noise: config.noise,
            seed: config.seed,
        }
    }
}

fn to_usize(field: &'static str, value: i64) -> Result<usize, ConfigError> {
    usize::try_from(value).map_err(|_| ConfigError::TooLarge { field, value })
}
