//! Care pathway tools: assignment, baseline profile, and the scripted and
//! protocol-driven journeys.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use careflow_logic::pathway::{
    generate_clinical_profile, sample_pathway, simulate_journey, simulate_protocol_journey,
    CarePathway, CareProtocolStep, ClinicalProfile, PROTOCOL_JOURNEY_MONTHS,
};
use careflow_logic::RngSource;

use super::{decode, encode, Tool};
use crate::error::ToolError;

const PATHWAY_NAMES: [&str; 3] = ["T2D_HighRisk", "T2D_ModerateRisk", "Obesity"];

#[derive(Debug, Deserialize)]
struct SeedInput {
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PathwayOutput {
    pathway: CarePathway,
}

#[derive(Debug, Deserialize)]
struct ProfileInput {
    pathway: CarePathway,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JourneyInput {
    pathway: CarePathway,
    baseline_a1c: f64,
    baseline_weight: f64,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProtocolJourneyInput {
    pathway: CarePathway,
    baseline_a1c: f64,
    baseline_weight: f64,
    care_protocol: Vec<CareProtocolStep>,
    #[serde(default)]
    seed: Option<u64>,
}

/// `care_pathway`: assign a care pathway.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarePathwayTool;

impl Tool for CarePathwayTool {
    fn name(&self) -> &'static str {
        "care_pathway"
    }

    fn description(&self) -> &'static str {
        "Determines the care pathway for a new patient."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "seed": { "type": "integer", "minimum": 0 }
            }
        })
    }

    fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let input: SeedInput = decode(self.name(), input)?;
        let mut rng = RngSource::from_optional_seed(input.seed);
        let pathway = sample_pathway(&mut rng);
        encode(self.name(), &PathwayOutput { pathway })
    }
}

/// `clinical_profile`: baseline A1c and weight for a pathway.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClinicalProfileTool;

impl Tool for ClinicalProfileTool {
    fn name(&self) -> &'static str {
        "clinical_profile"
    }

    fn description(&self) -> &'static str {
        "Generates baseline clinical data (A1c, weight) for a patient based on their care pathway."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pathway": { "type": "string", "enum": PATHWAY_NAMES },
                "seed": { "type": "integer", "minimum": 0 }
            },
            "required": ["pathway"]
        })
    }

    fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let input: ProfileInput = decode(self.name(), input)?;
        let mut rng = RngSource::from_optional_seed(input.seed);
        let profile = generate_clinical_profile(input.pathway, &mut rng);
        encode(self.name(), &profile)
    }
}

/// `patient_journey`: 12-month milestone trajectory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatientJourneyTool;

impl Tool for PatientJourneyTool {
    fn name(&self) -> &'static str {
        "patient_journey"
    }

    fn description(&self) -> &'static str {
        "Simulates a 12-month journey for a patient based on their care pathway, \
         with stochastic jitter on A1c and weight outcomes."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pathway": { "type": "string", "enum": PATHWAY_NAMES },
                "baseline_a1c": { "type": "number" },
                "baseline_weight": { "type": "number" },
                "seed": { "type": "integer", "minimum": 0 }
            },
            "required": ["pathway", "baseline_a1c", "baseline_weight"]
        })
    }

    fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let input: JourneyInput = decode(self.name(), input)?;
        let mut rng = RngSource::from_optional_seed(input.seed);
        let profile = ClinicalProfile {
            baseline_a1c: input.baseline_a1c,
            baseline_weight: input.baseline_weight,
        };
        let journey = simulate_journey(input.pathway, profile, &mut rng);
        encode(self.name(), &journey)
    }
}

/// `protocol_journey`: 12 months of events drawn from a care protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolJourneyTool;

impl Tool for ProtocolJourneyTool {
    fn name(&self) -> &'static str {
        "protocol_journey"
    }

    fn description(&self) -> &'static str {
        "Simulates a 12-month journey from care protocol steps: twelve distinct steps become \
         months 1 to 12 while A1c and weight drift month over month."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pathway": { "type": "string", "enum": PATHWAY_NAMES },
                "baseline_a1c": { "type": "number" },
                "baseline_weight": { "type": "number" },
                "care_protocol": {
                    "type": "array",
                    "minItems": PROTOCOL_JOURNEY_MONTHS,
                    "items": {
                        "type": "object",
                        "properties": {
                            "pathway": { "type": "string" },
                            "sub_pathway": { "type": "string" },
                            "trigger": { "type": "string" },
                            "task": { "type": "string" },
                            "persona": { "type": "string" }
                        },
                        "required": ["pathway", "sub_pathway", "trigger", "task", "persona"]
                    }
                },
                "seed": { "type": "integer", "minimum": 0 }
            },
            "required": ["pathway", "baseline_a1c", "baseline_weight", "care_protocol"]
        })
    }

    fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let input: ProtocolJourneyInput = decode(self.name(), input)?;
        debug!(
            "Protocol journey for {} from {} protocol steps",
            input.pathway.name(),
            input.care_protocol.len()
        );
        let mut rng = RngSource::from_optional_seed(input.seed);
        let profile = ClinicalProfile {
            baseline_a1c: input.baseline_a1c,
            baseline_weight: input.baseline_weight,
        };
        let journey = simulate_protocol_journey(profile, &input.care_protocol, &mut rng)
            .map_err(|source| ToolError::Config {
                tool: self.name(),
                source,
            })?;
        encode(self.name(), &journey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careflow_logic::ConfigError;

    #[test]
    fn test_pathway_names_match_enum() {
        let names: Vec<_> = CarePathway::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(names, PATHWAY_NAMES);
    }

    #[test]
    fn test_care_pathway_seeded() {
        let a = CarePathwayTool.execute(json!({ "seed": 5 })).unwrap();
        let b = CarePathwayTool.execute(json!({ "seed": 5 })).unwrap();
        assert_eq!(a, b);
        let name = a["pathway"].as_str().unwrap();
        assert!(PATHWAY_NAMES.contains(&name));
    }

    #[test]
    fn test_clinical_profile_output() {
        let out = ClinicalProfileTool
            .execute(json!({ "pathway": "Obesity", "seed": 3 }))
            .unwrap();
        let a1c = out["baseline_a1c"].as_f64().unwrap();
        let weight = out["baseline_weight"].as_f64().unwrap();
        assert!((5.7..=6.4).contains(&a1c));
        assert!((250.0..=400.0).contains(&weight));
    }

    #[test]
    fn test_clinical_profile_rejects_unknown_pathway() {
        let err = ClinicalProfileTool
            .execute(json!({ "pathway": "Hypertension" }))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    fn protocol_steps(len: usize) -> Value {
        let steps: Vec<Value> = (0..len)
            .map(|i| {
                json!({
                    "pathway": "Diabetes",
                    "sub_pathway": "Onboarding",
                    "trigger": format!("Lab result {i}"),
                    "task": format!("Outreach {i}"),
                    "persona": "Care Coordinator"
                })
            })
            .collect();
        Value::Array(steps)
    }

    #[test]
    fn test_protocol_journey_output() {
        let input = json!({
            "pathway": "T2D_HighRisk",
            "baseline_a1c": 11.2,
            "baseline_weight": 260.0,
            "care_protocol": protocol_steps(20),
            "seed": 4
        });
        let out = ProtocolJourneyTool.execute(input.clone()).unwrap();
        assert_eq!(out, ProtocolJourneyTool.execute(input).unwrap());

        let entries = out.as_array().unwrap();
        assert_eq!(entries.len(), 12);
        assert_eq!(entries[0]["month"], 1);
        assert_eq!(entries[11]["month"], 12);
        assert!(entries[0]["event"].as_str().unwrap().starts_with("Outreach "));
        assert!(entries[0]["details"].as_str().unwrap().contains("A1c: "));
    }

    #[test]
    fn test_protocol_journey_short_protocol_is_config_error() {
        let err = ProtocolJourneyTool
            .execute(json!({
                "pathway": "Obesity",
                "baseline_a1c": 6.0,
                "baseline_weight": 310.0,
                "care_protocol": protocol_steps(5)
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::Config {
                tool: "protocol_journey",
                source: ConfigError::ProtocolTooShort {
                    required: 12,
                    supplied: 5
                }
            }
        ));
    }

    #[test]
    fn test_journey_output() {
        let out = PatientJourneyTool
            .execute(json!({
                "pathway": "T2D_ModerateRisk",
                "baseline_a1c": 9.0,
                "baseline_weight": 220.0,
                "seed": 11
            }))
            .unwrap();
        let points = out.as_array().unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0]["event"], "Enrollment");
        assert_eq!(points[4]["month"], 12);
    }
}
