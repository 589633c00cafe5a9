//! careflow core - care-program allocation engine
//!
//! Simulates a restless multi-armed bandit over a patient population: every
//! step a fixed budget of interventions goes to the patients with the highest
//! noisy risk scores, treated patients improve by a fixed multiplier and
//! everyone else drifts by `decay`. The run log (who was treated when, and
//! the population's mean risk) is the artifact handed back to the
//! record generator.
//!
//! # Architecture
//!
//! - [`engine`]: single-run state machine (`Initialized -> Running -> Completed`)
//!   with cooperative cancellation between steps
//! - [`batch`]: bounded worker pool that runs many independent population
//!   profiles and joins their results
//! - [`tools`]: the `Tool` interface and name-keyed registry the orchestrator
//!   invokes with JSON
//!
//! The pure pieces (config validation, state, scorer, selector, transition)
//! live in `careflow_logic`.
//!
//! # Example
//!
//! ```rust
//! use careflow_core::prelude::*;
//!
//! let config = SimulationRequest::new(50, 12, 5).seed(42).validate()?;
//! let result = simulate(config)?;
//! assert_eq!(result.log.len(), 12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod engine;
pub mod error;
pub mod tools;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::batch::{BatchConfig, BatchRunner, ProfileOutcome};
    pub use crate::engine::{
        simulate, simulate_request, CancelToken, PartialRun, RunPhase, RunStatus, Simulation,
        SimulationResult, StepLog,
    };
    pub use crate::error::{BatchError, ErrorKind, RunError, ToolError};
    pub use crate::tools::{Tool, ToolRegistry};
    pub use careflow_logic::{RngSource, SimulationConfig, SimulationRequest, StateVector};
}
