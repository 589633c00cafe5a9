//! Error types for the allocation engine.
//!
//! Three outcomes other than success are kept distinct: a rejected
//! configuration, a computation that produced an invalid state, and a
//! cooperative cancellation. The latter two carry the partial run.

use thiserror::Error;

use careflow_logic::{ComputationError, ConfigError};

use crate::engine::PartialRun;

/// Coarse classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Computation,
    Cancelled,
}

/// A run that did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("computation failed at step {step}: {source}")]
    Computation {
        step: usize,
        #[source]
        source: ComputationError,
        partial: Box<PartialRun>,
    },

    #[error("run cancelled after {} of {} steps", .partial.completed_steps, .partial.horizon)]
    Cancelled { partial: Box<PartialRun> },
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Computation { .. } => ErrorKind::Computation,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// The log accumulated before the run stopped, if any steps could run.
    pub fn partial(&self) -> Option<&PartialRun> {
        match self {
            Self::Config(_) => None,
            Self::Computation { partial, .. } | Self::Cancelled { partial } => Some(partial),
        }
    }
}

/// Failures of the batch worker pool itself (not of individual runs).
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to spawn batch worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("batch pool is shut down")]
    ShutDown,

    #[error("batch workers disconnected after {received} of {expected} results")]
    Disconnected { received: usize, expected: usize },
}

/// Errors raised while invoking a registered tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("invalid input for '{tool}': {source}")]
    InvalidInput {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("tool '{tool}' rejected its input: {source}")]
    Config {
        tool: &'static str,
        #[source]
        source: ConfigError,
    },

    #[error("failed to encode output of '{tool}': {source}")]
    Output {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("tool '{tool}' failed: {source}")]
    Run {
        tool: &'static str,
        #[source]
        source: RunError,
    },
}
