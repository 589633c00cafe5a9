//! Noisy priority scores.
//!
//! The allocator never sees the true risk state directly: each step it ranks
//! patients by `state[i] + N(0, noise)`. With `noise == 0` the score is the
//! state itself and no random draws are consumed.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::ConfigError;
use crate::state::StateVector;

#[derive(Debug, Clone, Copy)]
pub struct PriorityScorer {
    /// `None` when noise is zero.
    noise: Option<Normal<f64>>,
}

impl PriorityScorer {
    pub fn new(noise: f64) -> Result<Self, ConfigError> {
        if !noise.is_finite() || noise < 0.0 {
            return Err(ConfigError::InvalidNoise { value: noise });
        }
        if noise == 0.0 {
            return Ok(Self { noise: None });
        }
        let normal =
            Normal::new(0.0, noise).map_err(|_| ConfigError::InvalidNoise { value: noise })?;
        Ok(Self {
            noise: Some(normal),
        })
    }

    /// Whether scores equal the underlying state exactly.
    pub fn is_exact(&self) -> bool {
        self.noise.is_none()
    }

    /// One score per patient, in patient order.
    pub fn score<R: Rng + ?Sized>(&self, state: &StateVector, rng: &mut R) -> Vec<f64> {
        let mut scores = Vec::with_capacity(state.len());
        self.score_into(state, rng, &mut scores);
        scores
    }

    /// Like [`score`](Self::score) but reuses `out` across steps.
    pub fn score_into<R: Rng + ?Sized>(
        &self,
        state: &StateVector,
        rng: &mut R,
        out: &mut Vec<f64>,
    ) {
        out.clear();
        match &self.noise {
            None => out.extend_from_slice(state.as_slice()),
            Some(normal) => out.extend(state.as_slice().iter().map(|&s| s + normal.sample(rng))),
        }
    }
}
