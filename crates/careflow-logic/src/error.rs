//! Error types for the allocation logic.
//!
//! Configuration problems are caught before a run mutates any state;
//! computation problems are detected during a transition and abort the run.

use thiserror::Error;

/// Rejected simulation parameters or initial states.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("num_patients must be > 0, got {value}")]
    NonPositivePatients { value: i64 },

    #[error("num_patients {value} exceeds the limit of {max}")]
    TooManyPatients { value: i64, max: usize },

    #[error("horizon must be > 0, got {value}")]
    NonPositiveHorizon { value: i64 },

    #[error("budget must be >= 0, got {value}")]
    NegativeBudget { value: i64 },

    #[error("budget {budget} exceeds num_patients {num_patients}")]
    BudgetExceedsPopulation { budget: i64, num_patients: i64 },

    #[error("decay {value} is outside [0.0, 1.0]")]
    DecayOutOfRange { value: f64 },

    #[error("noise {value} must be a finite value >= 0.0")]
    InvalidNoise { value: f64 },

    #[error("{field} value {value} does not fit the platform word size")]
    TooLarge { field: &'static str, value: i64 },

    #[error("initial state has {actual} entries, expected {expected}")]
    StateLengthMismatch { expected: usize, actual: usize },

    #[error("initial state for patient {index} is {value}, expected a value in [0.0, 1.0]")]
    StateOutOfRange { index: usize, value: f64 },

    #[error("care protocol has {supplied} steps, a journey needs at least {required}")]
    ProtocolTooShort { required: usize, supplied: usize },
}

/// A transition could not produce a valid state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("state of patient {patient} became non-finite ({value})")]
    NonFinite { patient: usize, value: f64 },

    #[error("state of patient {patient} fell below zero ({value})")]
    Negative { patient: usize, value: f64 },

    #[error("treated patient {patient} is out of range for {num_patients} patients")]
    TreatedOutOfRange { patient: usize, num_patients: usize },
}

impl ComputationError {
    /// Index of the offending patient.
    pub fn patient(&self) -> usize {
        match self {
            Self::NonFinite { patient, .. }
            | Self::Negative { patient, .. }
            | Self::TreatedOutOfRange { patient, .. } => *patient,
        }
    }
}
