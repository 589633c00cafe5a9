//! Simulation engine - drives one allocation run from config to log
//!
//! A `Simulation` owns its state vector and RNG for the whole run. `run`
//! consumes it, so an instance can never be reused; a second run needs a
//! fresh `Simulation` and a fresh `RngSource`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

use careflow_logic::{
    BudgetSelector, ComputationError, ConfigError, PriorityScorer, RngSource, SimulationConfig,
    SimulationRequest, StateVector, TransitionModel,
};

use crate::error::RunError;

/// Upper bound on log entries reserved up front; long horizons grow the log
/// as they go.
const LOG_PREALLOC_LIMIT: usize = 4096;

/// One step of the allocation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    /// 1-based step index.
    pub step: usize,
    /// Ascending, unique patient indices treated this step.
    pub treated_patients: Vec<usize>,
    /// Mean risk after this step's transition.
    pub mean_state: f64,
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub final_states: Vec<f64>,
    pub log: Vec<StepLog>,
}

/// Lifecycle of a `Simulation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Initialized,
    Running,
    Completed,
}

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Cancelled,
    Failed,
}

/// Everything a run produced before it stopped. Always incomplete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialRun {
    pub status: RunStatus,
    pub completed_steps: usize,
    pub horizon: usize,
    /// State snapshot at the moment the run stopped. For a failed run this
    /// includes the offending value.
    pub states: Vec<f64>,
    pub log: Vec<StepLog>,
}

/// Cooperative cancellation flag, checked between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A single allocation run.
pub struct Simulation {
    config: SimulationConfig,
    state: StateVector,
    rng: RngSource,
    scorer: PriorityScorer,
    selector: BudgetSelector,
    transition: TransitionModel,
    log: Vec<StepLog>,
    phase: RunPhase,
}

impl Simulation {
    /// Create a run with uniformly initialized states drawn from `rng`.
    pub fn new(config: SimulationConfig, mut rng: RngSource) -> Result<Self, ConfigError> {
        let state = StateVector::initialize(config.num_patients(), &mut rng);
        Self::assemble(config, state, rng)
    }

    /// Create a run from externally supplied initial states.
    pub fn with_initial_states(
        config: SimulationConfig,
        state: StateVector,
        rng: RngSource,
    ) -> Result<Self, ConfigError> {
        if state.len() != config.num_patients() {
            return Err(ConfigError::StateLengthMismatch {
                expected: config.num_patients(),
                actual: state.len(),
            });
        }
        Self::assemble(config, state, rng)
    }

    fn assemble(
        config: SimulationConfig,
        state: StateVector,
        rng: RngSource,
    ) -> Result<Self, ConfigError> {
        let scorer = PriorityScorer::new(config.noise())?;
        let transition = TransitionModel::new(config.decay())?;
        let selector = BudgetSelector::new(config.budget());
        Ok(Self {
            log: Vec::with_capacity(config.horizon().min(LOG_PREALLOC_LIMIT)),
            config,
            state,
            rng,
            scorer,
            selector,
            transition,
            phase: RunPhase::Initialized,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current states (the initial states before `run`).
    pub fn state(&self) -> &StateVector {
        &self.state
    }

    /// Run every step to the horizon, checking `cancel` before each one.
    pub fn run(mut self, cancel: &CancelToken) -> Result<SimulationResult, RunError> {
        self.phase = RunPhase::Running;
        info!(
            "Allocation run started: patients={} horizon={} budget={} decay={} noise={} seed={}",
            self.config.num_patients(),
            self.config.horizon(),
            self.config.budget(),
            self.config.decay(),
            self.config.noise(),
            self.rng.seed(),
        );

        let mut scores = Vec::with_capacity(self.config.num_patients());
        for step in 1..=self.config.horizon() {
            if cancel.is_cancelled() {
                warn!(
                    "Allocation run cancelled before step {} of {}",
                    step,
                    self.config.horizon()
                );
                return Err(RunError::Cancelled {
                    partial: Box::new(self.into_partial(RunStatus::Cancelled)),
                });
            }

            if let Err(source) = self.advance(step, &mut scores) {
                error!("Allocation run aborted at step {}: {}", step, source);
                return Err(RunError::Computation {
                    step,
                    source,
                    partial: Box::new(self.into_partial(RunStatus::Failed)),
                });
            }
        }

        self.phase = RunPhase::Completed;
        info!(
            "Allocation run completed: {} steps, final mean state {:.4}",
            self.log.len(),
            self.state.mean()
        );

        Ok(SimulationResult {
            final_states: self.state.into_vec(),
            log: self.log,
        })
    }

    /// Score, select, transition, record.
    fn advance(&mut self, step: usize, scores: &mut Vec<f64>) -> Result<(), ComputationError> {
        self.scorer.score_into(&self.state, &mut self.rng, scores);
        trace!("step {} scores {:?}", step, scores);

        let treated = self.selector.select(scores);
        self.transition.apply(&mut self.state, &treated)?;

        let mean_state = self.state.mean();
        debug!("step {} treated {:?} mean_state {:.6}", step, treated, mean_state);
        self.log.push(StepLog {
            step,
            treated_patients: treated,
            mean_state,
        });
        Ok(())
    }

    fn into_partial(self, status: RunStatus) -> PartialRun {
        PartialRun {
            status,
            completed_steps: self.log.len(),
            horizon: self.config.horizon(),
            states: self.state.into_vec(),
            log: self.log,
        }
    }
}

/// Run `config` to completion with an RNG built from its seed.
///
/// Without a seed the RNG is drawn from entropy and the drawn seed is logged
/// so the run can be replayed.
pub fn simulate(config: SimulationConfig) -> Result<SimulationResult, RunError> {
    let rng = RngSource::from_optional_seed(config.seed());
    if config.seed().is_none() {
        info!("No seed supplied, using {}", rng.seed());
    }
    Simulation::new(config, rng)?.run(&CancelToken::new())
}

/// Validate a wire request and run it.
pub fn simulate_request(request: SimulationRequest) -> Result<SimulationResult, RunError> {
    simulate(request.validate()?)
}
