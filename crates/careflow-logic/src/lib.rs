//! Pure allocation logic for careflow.
//!
//! This crate holds everything the care-program allocator needs that is
//! independent of threads, logging or any runtime: configuration validation,
//! the per-patient risk state, the noisy priority scorer, the budgeted top-K
//! selector and the deterministic transition model. Functions take plain data
//! and an injected RNG, so every piece is unit-testable in isolation and a
//! run is reproducible from its seed.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Wire request, validated `SimulationConfig`, defaults |
//! | [`error`] | Configuration and computation error types |
//! | [`pathway`] | Care pathway assignment, baseline clinical profile, scripted and protocol-driven journeys |
//! | [`rng`] | Seedable `RngSource` and per-stream seed derivation |
//! | [`scoring`] | Noisy priority scores (`state + N(0, noise)`) |
//! | [`selection`] | Budgeted top-K selection with ascending-index tie-break |
//! | [`state`] | Per-patient risk vector with bounds checks |
//! | [`transition`] | Treatment multiplier and passive decay |

pub mod config;
pub mod error;
pub mod pathway;
pub mod rng;
pub mod scoring;
pub mod selection;
pub mod state;
pub mod transition;

pub use config::{SimulationConfig, SimulationRequest};
pub use error::{ComputationError, ConfigError};
pub use rng::RngSource;
pub use scoring::PriorityScorer;
pub use selection::BudgetSelector;
pub use state::StateVector;
pub use transition::{TransitionModel, TREATMENT_MULTIPLIER};
