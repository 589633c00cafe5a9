//! careflow Headless Simulation Harness
//!
//! Runs a batch of population profiles through the allocation engine and
//! validates its invariants. Runs entirely in-process: no DB, no networking,
//! no LLM calls.
//!
//! Usage:
//!   cargo run -p careflow-simtest
//!   cargo run -p careflow-simtest -- --verbose
//!   cargo run -p careflow-simtest -- --json --workers 8 --seed 42
//!
//! Log output is controlled with `RUST_LOG` (default `info`).

use careflow_core::prelude::*;
use careflow_logic::config::{DEFAULT_DECAY, DEFAULT_NOISE};
use careflow_logic::TREATMENT_MULTIPLIER;
use serde::Serialize;
use serde_json::json;

// ── Population profiles ─────────────────────────────────────────────────

struct PopulationProfile {
    name: &'static str,
    num_patients: i64,
    horizon: i64,
    budget: i64,
    decay: f64,
    noise: f64,
}

const PROFILES: &[PopulationProfile] = &[
    PopulationProfile {
        name: "rural_clinic",
        num_patients: 40,
        horizon: 12,
        budget: 4,
        decay: DEFAULT_DECAY,
        noise: DEFAULT_NOISE,
    },
    PopulationProfile {
        name: "urban_clinic",
        num_patients: 400,
        horizon: 12,
        budget: 30,
        decay: DEFAULT_DECAY,
        noise: DEFAULT_NOISE,
    },
    PopulationProfile {
        name: "health_system",
        num_patients: 5_000,
        horizon: 24,
        budget: 250,
        decay: 0.98,
        noise: 0.05,
    },
    PopulationProfile {
        name: "no_capacity",
        num_patients: 60,
        horizon: 12,
        budget: 0,
        decay: 0.9,
        noise: DEFAULT_NOISE,
    },
    PopulationProfile {
        name: "full_capacity",
        num_patients: 25,
        horizon: 12,
        budget: 25,
        decay: 0.9,
        noise: 0.3,
    },
    PopulationProfile {
        name: "perfect_triage",
        num_patients: 200,
        horizon: 6,
        budget: 20,
        decay: 1.0,
        noise: 0.0,
    },
    PopulationProfile {
        name: "blind_triage",
        num_patients: 200,
        horizon: 6,
        budget: 20,
        decay: 0.95,
        noise: 2.0,
    },
];

// ── Harness options ─────────────────────────────────────────────────────

struct Options {
    verbose: bool,
    json: bool,
    workers: Option<usize>,
    seed: u64,
}

fn parse_options() -> Options {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let value_of = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.parse::<u64>().ok())
    };
    Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        json: args.iter().any(|a| a == "--json"),
        workers: value_of("--workers").map(|w| w as usize),
        seed: value_of("--seed").unwrap_or(42),
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

#[derive(Serialize)]
struct ProfileReport<'a> {
    profile: &'a str,
    seed: u64,
    result: &'a SimulationResult,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_options();
    if !options.json {
        println!("=== careflow Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Configuration validation
    results.extend(validate_configuration());

    // 2. Concrete allocation scenario
    results.extend(validate_concrete_scenario());

    // 3. Budget edge cases
    results.extend(validate_budget_edges(options.seed));

    // 4. Determinism
    results.extend(validate_determinism(options.seed));

    // 5. Population batch
    results.extend(validate_population_batch(&options));

    // 6. Tool registry
    results.extend(validate_tools(options.seed));

    if options.json {
        return exit_on_failure(&results);
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || options.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    exit_on_failure(&results);
}

fn exit_on_failure(results: &[TestResult]) {
    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
}

fn section(title: &str) {
    log::info!("--- {} ---", title);
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_configuration() -> Vec<TestResult> {
    section("Configuration");
    let cases = [
        ("reject_zero_patients", SimulationRequest::new(0, 5, 0)),
        ("reject_zero_horizon", SimulationRequest::new(5, 0, 1)),
        ("reject_negative_budget", SimulationRequest::new(5, 5, -1)),
        ("reject_budget_over_population", SimulationRequest::new(5, 5, 6)),
        ("reject_decay_above_one", SimulationRequest::new(5, 5, 1).decay(1.5)),
        ("reject_negative_noise", SimulationRequest::new(5, 5, 1).noise(-0.1)),
    ];

    cases
        .into_iter()
        .map(|(name, request)| match simulate_request(request) {
            Err(e) if e.kind() == ErrorKind::Config => TestResult::new(name, true, e.to_string()),
            Err(e) => TestResult::new(name, false, format!("wrong error kind: {e}")),
            Ok(_) => TestResult::new(name, false, "request was accepted"),
        })
        .collect()
}

// ── 2. Concrete scenario ────────────────────────────────────────────────

fn validate_concrete_scenario() -> Vec<TestResult> {
    section("Concrete scenario");
    let mut results = Vec::new();

    let outcome = SimulationRequest::new(5, 1, 2)
        .decay(1.0)
        .noise(0.0)
        .seed(0)
        .validate()
        .map_err(RunError::from)
        .and_then(|config| {
            let state = StateVector::from_values(vec![0.9, 0.1, 0.5, 0.9, 0.3])?;
            let sim = Simulation::with_initial_states(config, state, RngSource::from_seed(0))?;
            sim.run(&CancelToken::new())
        });

    let result = match outcome {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult::new("scenario_runs", false, e.to_string()));
            return results;
        }
    };

    let treated = &result.log[0].treated_patients;
    results.push(TestResult::new(
        "scenario_tie_break",
        treated.as_slice() == [0, 3],
        format!("treated {:?}", treated),
    ));

    let expected = [0.63, 0.1, 0.5, 0.63, 0.3];
    let states_ok = result
        .final_states
        .iter()
        .zip(expected)
        .all(|(a, e)| (a - e).abs() < 1e-9);
    results.push(TestResult::new(
        "scenario_final_states",
        states_ok,
        format!("final {:?}", result.final_states),
    ));

    let mean = result.log[0].mean_state;
    results.push(TestResult::new(
        "scenario_mean_state",
        (mean - 0.432).abs() < 1e-9,
        format!("mean_state {:.6}", mean),
    ));

    results
}

// ── 3. Budget edges ─────────────────────────────────────────────────────

fn validate_budget_edges(seed: u64) -> Vec<TestResult> {
    section("Budget edges");
    let mut results = Vec::new();

    for (name, budget, factor) in [
        ("budget_zero_pure_decay", 0, 0.9),
        ("budget_full_pure_treatment", 30, TREATMENT_MULTIPLIER),
    ] {
        let check = SimulationRequest::new(30, 10, budget)
            .decay(0.9)
            .seed(seed)
            .validate()
            .map_err(RunError::from)
            .and_then(|config| {
                let sim = Simulation::new(config, RngSource::from_seed(seed))?;
                let initial = sim.state().as_slice().to_vec();
                let result = sim.run(&CancelToken::new())?;
                Ok((initial, result))
            });

        let (passed, detail) = match check {
            Ok((initial, result)) => {
                let scale = f64::powi(factor, 10);
                let worst = initial
                    .iter()
                    .zip(&result.final_states)
                    .map(|(s0, s)| (s0 * scale - s).abs())
                    .fold(0.0, f64::max);
                let counts_ok = result
                    .log
                    .iter()
                    .all(|s| s.treated_patients.len() == budget as usize);
                (
                    worst < 1e-12 && counts_ok,
                    format!("max deviation {:.2e}", worst),
                )
            }
            Err(e) => (false, e.to_string()),
        };
        results.push(TestResult::new(name, passed, detail));
    }

    results
}

// ── 4. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(seed: u64) -> Vec<TestResult> {
    section("Determinism");
    let run = || simulate_request(SimulationRequest::new(500, 12, 50).seed(seed));
    let (passed, detail) = match (run(), run()) {
        (Ok(a), Ok(b)) => (a == b, format!("{} steps compared", a.log.len())),
        (Err(e), _) | (_, Err(e)) => (false, e.to_string()),
    };
    vec![TestResult::new("seeded_runs_identical", passed, detail)]
}

// ── 5. Population batch ─────────────────────────────────────────────────

fn validate_population_batch(options: &Options) -> Vec<TestResult> {
    section("Population batch");
    let mut results = Vec::new();

    let configs: Result<Vec<_>, _> = PROFILES
        .iter()
        .map(|p| {
            SimulationRequest::new(p.num_patients, p.horizon, p.budget)
                .decay(p.decay)
                .noise(p.noise)
                .validate()
        })
        .collect();
    let configs = match configs {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::new("batch_profiles_valid", false, e.to_string()));
            return results;
        }
    };

    let mut batch_config = BatchConfig {
        master_seed: Some(options.seed),
        ..Default::default()
    };
    if let Some(workers) = options.workers {
        batch_config.workers = workers;
    }

    let outcomes = match BatchRunner::start(batch_config).and_then(|pool| pool.run_batch(configs)) {
        Ok(o) => o,
        Err(e) => {
            results.push(TestResult::new("batch_runs", false, e.to_string()));
            return results;
        }
    };

    let mut reports = Vec::new();
    for (profile, outcome) in PROFILES.iter().zip(&outcomes) {
        let result = match &outcome.result {
            Ok(r) => r,
            Err(e) => {
                results.push(TestResult::new(profile.name, false, e.to_string()));
                continue;
            }
        };

        let expected = profile.budget.min(profile.num_patients) as usize;
        let cardinality_ok = result.log.iter().all(|s| {
            s.treated_patients.len() == expected
                && s.treated_patients.windows(2).all(|w| w[0] < w[1])
                && s.treated_patients.iter().all(|&i| (i as i64) < profile.num_patients)
        });
        let means_ok = result
            .log
            .windows(2)
            .all(|w| w[1].mean_state <= w[0].mean_state);
        let last_mean = result.log.last().map(|s| s.mean_state).unwrap_or(0.0);

        results.push(TestResult::new(
            profile.name,
            cardinality_ok && means_ok,
            format!(
                "{} patients, {} steps, seed {}, final mean {:.4}",
                profile.num_patients,
                result.log.len(),
                outcome.seed,
                last_mean
            ),
        ));
        reports.push(ProfileReport {
            profile: profile.name,
            seed: outcome.seed,
            result,
        });
    }

    if options.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(s) => println!("{}", s),
            Err(e) => results.push(TestResult::new("batch_json", false, e.to_string())),
        }
    }

    results
}

// ── 6. Tools ────────────────────────────────────────────────────────────

fn validate_tools(seed: u64) -> Vec<TestResult> {
    section("Tools");
    let registry = ToolRegistry::builtin();
    let mut results = Vec::new();

    let names: Vec<_> = registry.names().collect();
    results.push(TestResult::new(
        "tools_registered",
        names.len() == 5,
        names.join(", "),
    ));

    let rmab = registry.execute(
        "rmab_tool",
        json!({ "num_patients": 10, "horizon": 3, "budget": 2, "seed": seed }),
    );
    results.push(match rmab {
        Ok(v) => TestResult::new(
            "rmab_tool_executes",
            v["log"].as_array().map(|l| l.len()) == Some(3),
            format!("{} final states", v["final_states"].as_array().map_or(0, |a| a.len())),
        ),
        Err(e) => TestResult::new("rmab_tool_executes", false, e.to_string()),
    });

    // Pathway → profile → journey pipeline
    let journey = registry
        .execute("care_pathway", json!({ "seed": seed }))
        .and_then(|p| {
            let pathway = p["pathway"].clone();
            let profile = registry.execute(
                "clinical_profile",
                json!({ "pathway": pathway, "seed": seed }),
            )?;
            registry.execute(
                "patient_journey",
                json!({
                    "pathway": pathway,
                    "baseline_a1c": profile["baseline_a1c"],
                    "baseline_weight": profile["baseline_weight"],
                    "seed": seed,
                }),
            )
        });
    results.push(match journey {
        Ok(v) => {
            let points = v.as_array().map_or(0, |a| a.len());
            TestResult::new("pathway_pipeline", points == 5, format!("{} journey points", points))
        }
        Err(e) => TestResult::new("pathway_pipeline", false, e.to_string()),
    });

    results.push(match registry.execute("unknown", json!({})) {
        Err(ToolError::UnknownTool { .. }) => {
            TestResult::new("unknown_tool_rejected", true, "rejected")
        }
        Err(e) => TestResult::new("unknown_tool_rejected", false, e.to_string()),
        Ok(_) => TestResult::new("unknown_tool_rejected", false, "accepted"),
    });

    results
}
