//! Deterministic state transition.
//!
//! Treated patients are multiplied by [`TREATMENT_MULTIPLIER`], everyone else
//! by `decay`. Nothing random touches the state here; given a selection the
//! dynamics are fully determined.
//!
//! Untreated risk also shrinks toward zero whenever `decay < 1`, so an
//! untreated patient still "improves". Callers that want upward drift must
//! model it outside this transition.

use crate::error::{ComputationError, ConfigError};
use crate::state::StateVector;

/// Multiplicative effect of one intervention on a patient's risk.
pub const TREATMENT_MULTIPLIER: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionModel {
    decay: f64,
}

impl TransitionModel {
    pub fn new(decay: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&decay) {
            return Err(ConfigError::DecayOutOfRange { value: decay });
        }
        Ok(Self { decay })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Apply one step in place.
    ///
    /// `treated` is a set of patient indices; order and duplicates don't
    /// matter. An out-of-range index is rejected before any state changes.
    /// The state is bounds-checked afterwards; a non-finite or negative
    /// value is reported and the caller must discard the run.
    pub fn apply(
        &self,
        state: &mut StateVector,
        treated: &[usize],
    ) -> Result<(), ComputationError> {
        let num_patients = state.len();
        let mut is_treated = vec![false; num_patients];
        for &patient in treated {
            match is_treated.get_mut(patient) {
                Some(flag) => *flag = true,
                None => {
                    return Err(ComputationError::TreatedOutOfRange {
                        patient,
                        num_patients,
                    })
                }
            }
        }

        for (value, flag) in state.as_mut_slice().iter_mut().zip(is_treated) {
            *value *= if flag { TREATMENT_MULTIPLIER } else { self.decay };
        }
        state.check_bounds()
    }
}
