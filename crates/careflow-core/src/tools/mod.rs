//! Tools - the JSON-in/JSON-out surface the orchestrator calls.
//!
//! Every tool has a stable name, a description, and a JSON-Schema for its
//! input. The registry is keyed by name and holds a closed enum of built-in
//! tools, so dispatch is a `match`, not a trait object.

mod allocation;
mod pathway;

pub use allocation::RmabTool;
pub use pathway::{CarePathwayTool, ClinicalProfileTool, PatientJourneyTool, ProtocolJourneyTool};

use std::collections::BTreeMap;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

/// A named operation invoked with JSON input.
pub trait Tool {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON-Schema object describing the accepted input.
    fn input_schema(&self) -> Value;

    fn execute(&self, input: Value) -> Result<Value, ToolError>;
}

/// All tools shipped with the engine.
#[derive(Debug, Clone)]
pub enum BuiltinTool {
    Rmab(RmabTool),
    CarePathway(CarePathwayTool),
    ClinicalProfile(ClinicalProfileTool),
    PatientJourney(PatientJourneyTool),
    ProtocolJourney(ProtocolJourneyTool),
}

impl Tool for BuiltinTool {
    fn name(&self) -> &'static str {
        match self {
            Self::Rmab(t) => t.name(),
            Self::CarePathway(t) => t.name(),
            Self::ClinicalProfile(t) => t.name(),
            Self::PatientJourney(t) => t.name(),
            Self::ProtocolJourney(t) => t.name(),
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Rmab(t) => t.description(),
            Self::CarePathway(t) => t.description(),
            Self::ClinicalProfile(t) => t.description(),
            Self::PatientJourney(t) => t.description(),
            Self::ProtocolJourney(t) => t.description(),
        }
    }

    fn input_schema(&self) -> Value {
        match self {
            Self::Rmab(t) => t.input_schema(),
            Self::CarePathway(t) => t.input_schema(),
            Self::ClinicalProfile(t) => t.input_schema(),
            Self::PatientJourney(t) => t.input_schema(),
            Self::ProtocolJourney(t) => t.input_schema(),
        }
    }

    fn execute(&self, input: Value) -> Result<Value, ToolError> {
        match self {
            Self::Rmab(t) => t.execute(input),
            Self::CarePathway(t) => t.execute(input),
            Self::ClinicalProfile(t) => t.execute(input),
            Self::PatientJourney(t) => t.execute(input),
            Self::ProtocolJourney(t) => t.execute(input),
        }
    }
}

/// Name, description and schema of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Name-keyed tool registry.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, BuiltinTool>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BuiltinTool::Rmab(RmabTool));
        registry.register(BuiltinTool::CarePathway(CarePathwayTool));
        registry.register(BuiltinTool::ClinicalProfile(ClinicalProfileTool));
        registry.register(BuiltinTool::PatientJourney(PatientJourneyTool));
        registry.register(BuiltinTool::ProtocolJourney(ProtocolJourneyTool));
        registry
    }

    /// Register a tool, returning any tool previously under the same name.
    pub fn register(&mut self, tool: BuiltinTool) -> Option<BuiltinTool> {
        self.tools.insert(tool.name(), tool)
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinTool> {
        self.tools.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn execute(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;
        debug!("Executing tool {}", name);
        tool.execute(input)
    }

    /// Descriptors for every registered tool, for advertising to the
    /// orchestrator.
    pub fn manifest(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|t| ToolDescriptor {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }
}

fn decode<T: DeserializeOwned>(tool: &'static str, input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|source| ToolError::InvalidInput { tool, source })
}

fn encode<T: Serialize>(tool: &'static str, output: &T) -> Result<Value, ToolError> {
    serde_json::to_value(output).map_err(|source| ToolError::Output { tool, source })
}
