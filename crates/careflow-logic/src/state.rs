//! Per-patient risk state.
//!
//! One `f64` per patient, larger = higher risk. Values start in [0, 1] and
//! must stay finite and non-negative for the lifetime of a run.

use std::ops::{Index, IndexMut};

use rand::Rng;
use serde::Serialize;

use crate::error::{ComputationError, ConfigError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StateVector {
    values: Vec<f64>,
}

impl StateVector {
    /// Draw `num_patients` independent uniform samples from [0, 1).
    pub fn initialize<R: Rng + ?Sized>(num_patients: usize, rng: &mut R) -> Self {
        let values = (0..num_patients).map(|_| rng.gen::<f64>()).collect();
        Self { values }
    }

    /// Wrap externally supplied states, rejecting anything outside [0, 1].
    pub fn from_values(values: Vec<f64>) -> Result<Self, ConfigError> {
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(ConfigError::StateOutOfRange { index, value });
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Arithmetic mean; 0.0 for an empty vector.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// First coordinate that is non-finite or negative, if any.
    pub fn check_bounds(&self) -> Result<(), ComputationError> {
        for (patient, &value) in self.values.iter().enumerate() {
            if !value.is_finite() {
                return Err(ComputationError::NonFinite { patient, value });
            }
            if value < 0.0 {
                return Err(ComputationError::Negative { patient, value });
            }
        }
        Ok(())
    }
}

impl Index<usize> for StateVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl IndexMut<usize> for StateVector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngSource;

    #[test]
    fn test_initialize_in_unit_interval() {
        let mut rng = RngSource::from_seed(3);
        let state = StateVector::initialize(500, &mut rng);
        assert_eq!(state.len(), 500);
        assert!(state.as_slice().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_initialize_reproducible() {
        let a = StateVector::initialize(20, &mut RngSource::from_seed(8));
        let b = StateVector::initialize(20, &mut RngSource::from_seed(8));
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_values_rejects_out_of_range() {
        assert!(StateVector::from_values(vec![0.0, 0.5, 1.0]).is_ok());
        assert_eq!(
            StateVector::from_values(vec![0.2, 1.5]),
            Err(ConfigError::StateOutOfRange {
                index: 1,
                value: 1.5
            })
        );
        assert!(StateVector::from_values(vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_mean_and_indexing() {
        let mut state = StateVector::from_values(vec![0.2, 0.4, 0.6]).unwrap();
        assert!((state.mean() - 0.4).abs() < 1e-12);
        state[2] = 0.0;
        assert_eq!(state.get(2), Some(0.0));
        assert_eq!(state.get(3), None);
        assert!((state.mean() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_check_bounds() {
        let mut state = StateVector::from_values(vec![0.1, 0.2]).unwrap();
        assert!(state.check_bounds().is_ok());
        state[1] = f64::NAN;
        assert!(matches!(
            state.check_bounds(),
            Err(ComputationError::NonFinite { patient: 1, .. })
        ));
        state[1] = -0.01;
        assert_eq!(
            state.check_bounds(),
            Err(ComputationError::Negative {
                patient: 1,
                value: -0.01
            })
        );
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let state = StateVector::from_values(vec![0.25, 0.5]).unwrap();
        assert_eq!(serde_json::to_string(&state).unwrap(), "[0.25,0.5]");
    }
}
