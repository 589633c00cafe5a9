//! Integration tests for a single allocation step and the patient record
//! pipeline.
//!
//! Exercises: SimulationRequest → SimulationConfig → StateVector
//! → PriorityScorer → BudgetSelector → TransitionModel, and
//! CarePathway → ClinicalProfile → JourneyPoints.
//!
//! All tests are pure logic, no worker threads and no logging.

use careflow_logic::config::SimulationRequest;
use careflow_logic::pathway::{
    generate_clinical_profile, sample_pathway, simulate_journey, CarePathway,
};
use careflow_logic::rng::derive_seed;
use careflow_logic::{
    BudgetSelector, ConfigError, PriorityScorer, RngSource, StateVector, TransitionModel,
    TREATMENT_MULTIPLIER,
};

// ── Helpers ────────────────────────────────────────────────────────────

/// One step by hand, returning the treated set.
fn step(
    state: &mut StateVector,
    scorer: &PriorityScorer,
    selector: &BudgetSelector,
    transition: &TransitionModel,
    rng: &mut RngSource,
) -> Vec<usize> {
    let scores = scorer.score(state, rng);
    let treated = selector.select(&scores);
    transition.apply(state, &treated).unwrap();
    treated
}

// ── Allocation step ────────────────────────────────────────────────────

#[test]
fn step_components_agree_with_config() {
    let config = SimulationRequest::new(50, 3, 7)
        .decay(0.9)
        .noise(0.25)
        .seed(11)
        .validate()
        .unwrap();

    let mut rng = RngSource::from_seed(config.seed().unwrap());
    let mut state = StateVector::initialize(config.num_patients(), &mut rng);
    let scorer = PriorityScorer::new(config.noise()).unwrap();
    let selector = BudgetSelector::new(config.budget());
    let transition = TransitionModel::new(config.decay()).unwrap();

    for _ in 0..config.horizon() {
        let before = state.clone();
        let treated = step(&mut state, &scorer, &selector, &transition, &mut rng);
        assert_eq!(treated.len(), 7);
        for i in 0..state.len() {
            let factor = if treated.contains(&i) {
                TREATMENT_MULTIPLIER
            } else {
                0.9
            };
            assert!((state[i] - before[i] * factor).abs() < 1e-15);
        }
    }
}

#[test]
fn exact_scores_pick_highest_states() {
    let mut state = StateVector::from_values(vec![0.2, 0.8, 0.8, 0.1, 0.6]).unwrap();
    let scorer = PriorityScorer::new(0.0).unwrap();
    assert!(scorer.is_exact());

    let mut rng = RngSource::from_seed(0);
    let treated = step(
        &mut state,
        &scorer,
        &BudgetSelector::new(3),
        &TransitionModel::new(1.0).unwrap(),
        &mut rng,
    );
    assert_eq!(treated, vec![1, 2, 4]);
}

#[test]
fn exact_scores_leave_rng_untouched() {
    let state = StateVector::from_values(vec![0.3; 10]).unwrap();
    let scorer = PriorityScorer::new(0.0).unwrap();

    let mut used = RngSource::from_seed(4);
    let _ = scorer.score(&state, &mut used);
    let mut fresh = RngSource::from_seed(4);
    assert_eq!(used.uniform(), fresh.uniform());
}

#[test]
fn invalid_request_rejected_before_any_state_exists() {
    assert_eq!(
        SimulationRequest::new(4, 2, 5).validate(),
        Err(ConfigError::BudgetExceedsPopulation {
            budget: 5,
            num_patients: 4
        })
    );
}

#[test]
fn derived_streams_are_distinct() {
    let seeds: Vec<u64> = (0..16).map(|i| derive_seed(99, i)).collect();
    assert_eq!(seeds[0], 99);
    for (i, a) in seeds.iter().enumerate() {
        for b in &seeds[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

// ── Patient record pipeline ────────────────────────────────────────────

#[test]
fn pathway_profile_journey_pipeline() {
    let mut rng = RngSource::from_seed(321);
    for _ in 0..50 {
        let pathway = sample_pathway(&mut rng);
        let profile = generate_clinical_profile(pathway, &mut rng);
        let journey = simulate_journey(pathway, profile, &mut rng);

        assert_eq!(journey.len(), pathway.milestones().len() + 1);
        assert_eq!(journey[0].event, "Enrollment");
        assert_eq!(journey[0].a1c, profile.baseline_a1c);
        assert_eq!(journey[0].weight, profile.baseline_weight);
        assert!(journey.windows(2).all(|w| w[0].month < w[1].month));
        assert_eq!(journey.last().map(|p| p.month), Some(12));
    }
}

#[test]
fn obesity_journey_loses_weight() {
    let mut rng = RngSource::from_seed(8);
    let profile = generate_clinical_profile(CarePathway::Obesity, &mut rng);
    let journey = simulate_journey(CarePathway::Obesity, profile, &mut rng);

    // Scripted loss is 23 lbs, jitter at most ±8 lbs overall.
    let lost = profile.baseline_weight - journey[4].weight;
    assert!(lost > 14.9 && lost < 31.1, "lost {lost}");
}

#[test]
fn seeded_pipeline_is_reproducible() {
    let run = |seed| {
        let mut rng = RngSource::from_seed(seed);
        let pathway = sample_pathway(&mut rng);
        let profile = generate_clinical_profile(pathway, &mut rng);
        simulate_journey(pathway, profile, &mut rng)
    };
    assert_eq!(run(77), run(77));
}
