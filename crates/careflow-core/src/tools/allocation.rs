//! `rmab_tool`: run one allocation simulation from a JSON request.

use serde_json::{json, Value};

use careflow_logic::config::{DEFAULT_DECAY, DEFAULT_NOISE, MAX_PATIENTS};
use careflow_logic::SimulationRequest;

use super::{decode, encode, Tool};
use crate::engine::simulate_request;
use crate::error::ToolError;

const NAME: &str = "rmab_tool";

#[derive(Debug, Clone, Copy, Default)]
pub struct RmabTool;

impl Tool for RmabTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Simulates a restless multi-armed bandit process for allocating care resources over time. \
         Useful for modeling dynamic patient prioritization in chronic care management. \
         The optional seed must be a non-negative integer; other seeds are rejected as \
         invalid input."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "num_patients": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_PATIENTS,
                    "description": "Total number of patients (arms)."
                },
                "horizon": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Total number of decision steps (e.g., months)."
                },
                "budget": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Number of patients that can be treated per step."
                },
                "decay": {
                    "type": "number",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "default": DEFAULT_DECAY,
                    "description": "Per-step multiplier for untreated patients."
                },
                "noise": {
                    "type": "number",
                    "minimum": 0.0,
                    "default": DEFAULT_NOISE,
                    "description": "Standard deviation of the ranking noise."
                },
                "seed": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Non-negative seed for reproducible runs."
                }
            },
            "required": ["num_patients", "horizon", "budget"]
        })
    }

    fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let request: SimulationRequest = decode(NAME, input)?;
        let result =
            simulate_request(request).map_err(|source| ToolError::Run { tool: NAME, source })?;
        encode(NAME, &result)
    }
}
