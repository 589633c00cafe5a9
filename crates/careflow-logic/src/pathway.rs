//! Care pathway assignment, baseline clinical profiles and scripted journeys.
//!
//! Numeric scaffolding for a synthetic patient record: which program the
//! patient is enrolled in, their starting A1c and weight, and the
//! milestone-by-milestone trajectory over a 12-month program. A second
//! journey form draws its monthly events from a supplied care protocol
//! instead of the scripted milestones. Narrative text is produced elsewhere;
//! this module only emits numbers, event labels and short trigger details.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Care program a patient is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarePathway {
    #[serde(rename = "T2D_HighRisk")]
    T2dHighRisk,
    #[serde(rename = "T2D_ModerateRisk")]
    T2dModerateRisk,
    #[serde(rename = "Obesity")]
    Obesity,
}

impl CarePathway {
    pub const ALL: [CarePathway; 3] = [Self::T2dHighRisk, Self::T2dModerateRisk, Self::Obesity];

    pub fn name(self) -> &'static str {
        match self {
            Self::T2dHighRisk => "T2D_HighRisk",
            Self::T2dModerateRisk => "T2D_ModerateRisk",
            Self::Obesity => "Obesity",
        }
    }

    /// Baseline A1c range (%), half-open.
    fn a1c_range(self) -> (f64, f64) {
        match self {
            Self::T2dHighRisk => (10.0, 12.5),
            Self::T2dModerateRisk => (8.0, 9.9),
            // Pre-diabetic range
            Self::Obesity => (5.7, 6.4),
        }
    }

    /// Baseline weight range (lbs), half-open.
    fn weight_range(self) -> (f64, f64) {
        match self {
            Self::T2dHighRisk | Self::T2dModerateRisk => (180.0, 350.0),
            Self::Obesity => (250.0, 400.0),
        }
    }

    /// Scripted milestones for the 12-month program.
    pub fn milestones(self) -> &'static [Milestone] {
        match self {
            Self::T2dHighRisk => &HIGH_RISK_MILESTONES,
            Self::T2dModerateRisk => &MODERATE_RISK_MILESTONES,
            Self::Obesity => &OBESITY_MILESTONES,
        }
    }
}

/// Cumulative assignment thresholds: 35% high risk, 35% moderate, 30% obesity.
const HIGH_RISK_CUTOFF: f64 = 0.35;
const MODERATE_RISK_CUTOFF: f64 = 0.70;

/// Assign a care pathway.
pub fn sample_pathway<R: Rng + ?Sized>(rng: &mut R) -> CarePathway {
    let roll = rng.gen::<f64>();
    if roll < HIGH_RISK_CUTOFF {
        CarePathway::T2dHighRisk
    } else if roll < MODERATE_RISK_CUTOFF {
        CarePathway::T2dModerateRisk
    } else {
        CarePathway::Obesity
    }
}

/// Starting clinical measurements for a new patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalProfile {
    pub baseline_a1c: f64,
    pub baseline_weight: f64,
}

/// Draw a baseline profile for `pathway`. A1c is rounded to 2 decimals,
/// weight to 1.
pub fn generate_clinical_profile<R: Rng + ?Sized>(
    pathway: CarePathway,
    rng: &mut R,
) -> ClinicalProfile {
    let (a1c_lo, a1c_hi) = pathway.a1c_range();
    let (w_lo, w_hi) = pathway.weight_range();
    ClinicalProfile {
        baseline_a1c: round_to(rng.gen_range(a1c_lo..a1c_hi), 2),
        baseline_weight: round_to(rng.gen_range(w_lo..w_hi), 1),
    }
}

/// A fixed program event with its expected effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Milestone {
    pub month: u32,
    pub event: &'static str,
    pub a1c_change: f64,
    pub weight_change: f64,
}

const fn milestone(
    month: u32,
    event: &'static str,
    a1c_change: f64,
    weight_change: f64,
) -> Milestone {
    Milestone {
        month,
        event,
        a1c_change,
        weight_change,
    }
}

static HIGH_RISK_MILESTONES: [Milestone; 4] = [
    milestone(1, "Initial RN Appointment", -0.5, -2.0),
    milestone(4, "PC Follow-up, Meds Adjusted", -0.6, -3.0),
    milestone(8, "Coach Appointment", -0.2, -1.0),
    milestone(12, "Final Coach Appointment", -0.1, -1.0),
];

static MODERATE_RISK_MILESTONES: [Milestone; 4] = [
    milestone(1, "Initial Coach Appointment", -0.4, -3.0),
    milestone(4, "PC Follow-up", -0.3, -2.0),
    milestone(8, "Coach Appointment", -0.2, -2.0),
    milestone(12, "Final Coach Appointment", -0.1, -1.0),
];

static OBESITY_MILESTONES: [Milestone; 4] = [
    milestone(1, "Step Therapy Start", -0.1, -5.0),
    milestone(3, "AOM Titration", -0.1, -8.0),
    milestone(6, "Quarterly Telehealth Visit", 0.0, -6.0),
    milestone(12, "Final Evaluation", 0.0, -4.0),
];

/// Jitter half-widths applied on top of each milestone's change.
const A1C_JITTER: f64 = 0.1;
const WEIGHT_JITTER: f64 = 2.0;

/// One point on a patient's journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyPoint {
    pub month: u32,
    pub event: String,
    pub a1c: f64,
    pub weight: f64,
}

/// Simulate the 12-month journey: an enrollment point at month 0, then each
/// milestone's change plus uniform jitter, accumulated from the previous
/// point. Reported values are rounded (A1c 2 decimals, weight 1); the
/// running values are not.
pub fn simulate_journey<R: Rng + ?Sized>(
    pathway: CarePathway,
    profile: ClinicalProfile,
    rng: &mut R,
) -> Vec<JourneyPoint> {
    let milestones = pathway.milestones();
    let mut journey = Vec::with_capacity(milestones.len() + 1);
    journey.push(JourneyPoint {
        month: 0,
        event: "Enrollment".to_string(),
        a1c: profile.baseline_a1c,
        weight: profile.baseline_weight,
    });

    let mut a1c = profile.baseline_a1c;
    let mut weight = profile.baseline_weight;
    for m in milestones {
        a1c += m.a1c_change + rng.gen_range(-A1C_JITTER..=A1C_JITTER);
        weight += m.weight_change + rng.gen_range(-WEIGHT_JITTER..=WEIGHT_JITTER);
        journey.push(JourneyPoint {
            month: m.month,
            event: m.event.to_string(),
            a1c: round_to(a1c, 2),
            weight: round_to(weight, 1),
        });
    }

    journey
}

/// Months in a protocol-driven journey, one protocol step per month.
pub const PROTOCOL_JOURNEY_MONTHS: usize = 12;

/// Per-month drift ranges for protocol journeys, half-open. Both lean
/// toward improvement.
const PROTOCOL_A1C_DRIFT: (f64, f64) = (-0.2, 0.1);
const PROTOCOL_WEIGHT_DRIFT: (f64, f64) = (-3.0, 1.0);

/// One row of a care protocol: what happens, when, and who does it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareProtocolStep {
    pub pathway: String,
    pub sub_pathway: String,
    pub trigger: String,
    pub task: String,
    pub persona: String,
}

/// One month of a protocol-driven journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolJourneyEntry {
    pub month: u32,
    pub event: String,
    pub details: String,
    pub a1c: f64,
    pub weight: f64,
}

/// Simulate a 12-month journey driven by `protocol`.
///
/// Twelve distinct steps are drawn without replacement, in random order, and
/// become months 1 through 12. Each month A1c and weight take a random step
/// from the previous month's unrounded values. Fails without drawing anything
/// when the protocol has fewer than 12 steps.
pub fn simulate_protocol_journey<R: Rng + ?Sized>(
    profile: ClinicalProfile,
    protocol: &[CareProtocolStep],
    rng: &mut R,
) -> Result<Vec<ProtocolJourneyEntry>, ConfigError> {
    if protocol.len() < PROTOCOL_JOURNEY_MONTHS {
        return Err(ConfigError::ProtocolTooShort {
            required: PROTOCOL_JOURNEY_MONTHS,
            supplied: protocol.len(),
        });
    }

    let mut a1c = profile.baseline_a1c;
    let mut weight = profile.baseline_weight;
    let picks = index::sample(rng, protocol.len(), PROTOCOL_JOURNEY_MONTHS);

    let mut journey = Vec::with_capacity(PROTOCOL_JOURNEY_MONTHS);
    for (month, pick) in (1u32..).zip(picks.iter()) {
        let step = &protocol[pick];
        a1c += rng.gen_range(PROTOCOL_A1C_DRIFT.0..PROTOCOL_A1C_DRIFT.1);
        weight += rng.gen_range(PROTOCOL_WEIGHT_DRIFT.0..PROTOCOL_WEIGHT_DRIFT.1);
        journey.push(ProtocolJourneyEntry {
            month,
            event: step.task.clone(),
            details: format!(
                "Triggered by: {}. A1c: {:.2}, Weight: {:.1} lbs.",
                step.trigger, a1c, weight
            ),
            a1c: round_to(a1c, 2),
            weight: round_to(weight, 1),
        });
    }

    Ok(journey)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngSource;

    #[test]
    fn test_pathway_distribution() {
        let mut rng = RngSource::from_seed(2024);
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            match sample_pathway(&mut rng) {
                CarePathway::T2dHighRisk => counts[0] += 1,
                CarePathway::T2dModerateRisk => counts[1] += 1,
                CarePathway::Obesity => counts[2] += 1,
            }
        }
        assert!((3200..3800).contains(&counts[0]), "{counts:?}");
        assert!((3200..3800).contains(&counts[1]), "{counts:?}");
        assert!((2700..3300).contains(&counts[2]), "{counts:?}");
    }

    #[test]
    fn test_profile_ranges() {
        let mut rng = RngSource::from_seed(1);
        for pathway in CarePathway::ALL {
            let (a_lo, a_hi) = pathway.a1c_range();
            let (w_lo, w_hi) = pathway.weight_range();
            for _ in 0..200 {
                let p = generate_clinical_profile(pathway, &mut rng);
                // Rounding can land exactly on the upper bound.
                assert!(p.baseline_a1c >= a_lo && p.baseline_a1c <= a_hi);
                assert!(p.baseline_weight >= w_lo && p.baseline_weight <= w_hi);
            }
        }
    }

    #[test]
    fn test_journey_shape() {
        let mut rng = RngSource::from_seed(7);
        let profile = ClinicalProfile {
            baseline_a1c: 11.0,
            baseline_weight: 250.0,
        };
        let journey = simulate_journey(CarePathway::T2dHighRisk, profile, &mut rng);

        assert_eq!(journey.len(), 5);
        assert_eq!(journey[0].month, 0);
        assert_eq!(journey[0].a1c, 11.0);
        let months: Vec<u32> = journey.iter().map(|p| p.month).collect();
        assert_eq!(months, vec![0, 1, 4, 8, 12]);

        // Total scripted A1c change is -1.4, jitter at most ±0.4 overall.
        let last = journey.last().unwrap();
        assert!(last.a1c < 11.0 - 1.4 + 0.41 && last.a1c > 11.0 - 1.4 - 0.41);
    }

    fn protocol(len: usize) -> Vec<CareProtocolStep> {
        (0..len)
            .map(|i| CareProtocolStep {
                pathway: "T2D".to_string(),
                sub_pathway: format!("Sub {i}"),
                trigger: format!("Trigger {i}"),
                task: format!("Task {i}"),
                persona: "RN".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_protocol_journey_shape() {
        let mut rng = RngSource::from_seed(12);
        let profile = ClinicalProfile {
            baseline_a1c: 9.0,
            baseline_weight: 220.0,
        };
        let steps = protocol(30);
        let journey = simulate_protocol_journey(profile, &steps, &mut rng).unwrap();

        assert_eq!(journey.len(), PROTOCOL_JOURNEY_MONTHS);
        let months: Vec<u32> = journey.iter().map(|e| e.month).collect();
        assert_eq!(months, (1..=12).collect::<Vec<u32>>());

        // Steps are drawn without replacement.
        let mut events: Vec<&str> = journey.iter().map(|e| e.event.as_str()).collect();
        events.sort_unstable();
        events.dedup();
        assert_eq!(events.len(), PROTOCOL_JOURNEY_MONTHS);

        // Twelve drifts of at most -0.2 / +0.1 A1c and -3 / +1 lbs.
        let last = &journey[11];
        assert!(last.a1c > 9.0 - 2.41 && last.a1c < 9.0 + 1.21, "{}", last.a1c);
        assert!(last.weight > 220.0 - 36.1 && last.weight < 220.0 + 12.1, "{}", last.weight);
        assert!(journey[0].details.starts_with("Triggered by: Trigger "));
    }

    #[test]
    fn test_protocol_journey_uses_whole_protocol_when_exact() {
        let mut rng = RngSource::from_seed(3);
        let profile = ClinicalProfile {
            baseline_a1c: 6.0,
            baseline_weight: 300.0,
        };
        let steps = protocol(PROTOCOL_JOURNEY_MONTHS);
        let journey = simulate_protocol_journey(profile, &steps, &mut rng).unwrap();

        let mut events: Vec<String> = journey.into_iter().map(|e| e.event).collect();
        events.sort();
        let mut expected: Vec<String> = steps.into_iter().map(|s| s.task).collect();
        expected.sort();
        assert_eq!(events, expected);
    }

    #[test]
    fn test_protocol_journey_rejects_short_protocol() {
        let mut rng = RngSource::from_seed(3);
        let profile = ClinicalProfile {
            baseline_a1c: 6.0,
            baseline_weight: 300.0,
        };
        assert_eq!(
            simulate_protocol_journey(profile, &protocol(11), &mut rng),
            Err(ConfigError::ProtocolTooShort {
                required: 12,
                supplied: 11
            })
        );
    }

    #[test]
    fn test_pathway_serde_names() {
        for pathway in CarePathway::ALL {
            let json = serde_json::to_string(&pathway).unwrap();
            assert_eq!(json, format!("\"{}\"", pathway.name()));
        }
    }
}
