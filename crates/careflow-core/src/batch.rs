//! Batch runner - fans independent population profiles out to a worker pool.
//!
//! Each profile is a separate run with its own state and RNG, so workers share
//! nothing but the job queue and their batch's cancel flag. The job queue is
//! bounded: submission blocks while every worker is busy and the queue is
//! full. Results are joined and returned in profile order, and one profile's
//! failure never touches another's result. Cancellation is per batch: a
//! cancelled batch leaves the pool ready for the next one.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info};

use careflow_logic::rng::derive_seed;
use careflow_logic::{RngSource, SimulationConfig};

use crate::engine::{CancelToken, Simulation, SimulationResult};
use crate::error::{BatchError, RunError};

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of worker threads (at least 1).
    pub workers: usize,
    /// Maximum queued jobs (at least 1).
    pub queue_capacity: usize,
    /// Seed from which unseeded profiles derive theirs. Drawn from entropy
    /// when `None`.
    pub master_seed: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            queue_capacity: 64,
            master_seed: None,
        }
    }
}

/// Result of one profile in a batch.
#[derive(Debug)]
pub struct ProfileOutcome {
    /// Position of the profile in the submitted batch.
    pub index: usize,
    /// Seed the profile actually ran with.
    pub seed: u64,
    pub result: Result<SimulationResult, RunError>,
}

struct Job {
    index: usize,
    config: SimulationConfig,
    cancel: CancelToken,
    reply: Sender<ProfileOutcome>,
}

/// Bounded pool of simulation workers.
pub struct BatchRunner {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    master_seed: u64,
}

impl BatchRunner {
    pub fn start(config: BatchConfig) -> Result<Self, BatchError> {
        let workers = config.workers.max(1);
        let queue_capacity = config.queue_capacity.max(1);
        let master_seed = config
            .master_seed
            .unwrap_or_else(|| RngSource::from_entropy().seed());
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("careflow-batch-{idx}"))
                .spawn(move || worker_loop(rx))?;
            handles.push(handle);
        }

        debug!(
            "Batch pool started: workers={} queue_capacity={} master_seed={}",
            workers, queue_capacity, master_seed
        );

        Ok(Self {
            tx: Some(tx),
            workers: handles,
            master_seed,
        })
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Run every profile and wait for all of them.
    ///
    /// Profiles without a seed get `derive_seed(master_seed, index)`, so a
    /// batch with a fixed master seed is reproducible whatever the worker
    /// count or scheduling order.
    pub fn run_batch(
        &self,
        profiles: Vec<SimulationConfig>,
    ) -> Result<Vec<ProfileOutcome>, BatchError> {
        self.run_batch_with_cancel(profiles, &CancelToken::new())
    }

    /// Like [`run_batch`](Self::run_batch), but `cancel` aborts every
    /// in-flight and queued run of this batch. Other batches are unaffected.
    pub fn run_batch_with_cancel(
        &self,
        profiles: Vec<SimulationConfig>,
        cancel: &CancelToken,
    ) -> Result<Vec<ProfileOutcome>, BatchError> {
        let tx = self.tx.as_ref().ok_or(BatchError::ShutDown)?;
        let expected = profiles.len();
        info!("Batch started: {} profiles", expected);

        // Room for every reply, so workers never block on a slow collector.
        let (reply_tx, reply_rx) = bounded::<ProfileOutcome>(expected.max(1));
        for (index, config) in profiles.into_iter().enumerate() {
            let config = match config.seed() {
                Some(_) => config,
                None => config.with_seed(derive_seed(self.master_seed, index as u64)),
            };
            let job = Job {
                index,
                config,
                cancel: cancel.clone(),
                reply: reply_tx.clone(),
            };
            tx.send(job).map_err(|_| BatchError::Disconnected {
                received: 0,
                expected,
            })?;
        }
        drop(reply_tx);

        let mut outcomes = Vec::with_capacity(expected);
        for received in 0..expected {
            let outcome = reply_rx
                .recv()
                .map_err(|_| BatchError::Disconnected { received, expected })?;
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|o| o.index);

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(
            "Batch finished: {} completed, {} did not complete",
            expected - failed,
            failed
        );
        Ok(outcomes)
    }

    /// Close the queue, let workers drain it, then join them.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(tx) = self.tx.take() {
            drop(tx);
            for handle in self.workers.drain(..) {
                let _ = handle.join();
            }
            debug!("Batch pool stopped");
        }
    }
}

impl Drop for BatchRunner {
    fn drop(&mut self) {
        self.close();
    }
}

fn worker_loop(rx: Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        let outcome = run_profile(job.index, job.config, &job.cancel);
        let _ = job.reply.send(outcome);
    }
}

fn run_profile(index: usize, config: SimulationConfig, cancel: &CancelToken) -> ProfileOutcome {
    // `run_batch` always assigns a seed before queuing.
    let rng = RngSource::from_optional_seed(config.seed());
    let seed = rng.seed();
    let result = Simulation::new(config, rng)
        .map_err(RunError::from)
        .and_then(|sim| sim.run(cancel));
    ProfileOutcome {
        index,
        seed,
        result,
    }
}
