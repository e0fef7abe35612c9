//! Survivor: Adaptation Headless Harness
//!
//! Validates the game rules and plays one classroom session against the
//! in-memory store. No UI, no network.
//!
//! Usage:
//!   cargo run -p survivor-simtest
//!   cargo run -p survivor-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p survivor-simtest

use std::sync::Arc;

use log::info;
use serde_json::Value;
use survivor_host::{HostConfig, HostError, InMemoryRepository, PhaseController, SessionRepository};
use survivor_logic::catalog::{
    contra_stats, inherent_stats, is_available, kingdom_stats, Environment, Kingdom, Stat,
};
use survivor_logic::compatibility::{
    city_compatibility, environment_compatibility, preview_survival, KingdomBonusPreset,
    ScoringTable,
};
use survivor_logic::constants::POINT_BUDGET;
use survivor_logic::organism::{Organism, OrganismStatus, TraitEditError};
use survivor_logic::phase::{survivors_by_environment, PhaseError};
use survivor_logic::roster::parse_roster;
use survivor_logic::session::{GameSettings, GameState};
use survivor_logic::status::{classify, CITY_THRESHOLDS, ENVIRONMENT_THRESHOLDS};

// ── Sample roster (same document shape the store holds) ─────────────────
const ROSTER_JSON: &str = include_str!("../../../data/sample_roster.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Survivor: Adaptation Harness ===\n");

    let mut results = Vec::new();

    // 1. Trait catalog consistency
    results.extend(validate_catalog(verbose));

    // 2. Point budget and contra-stats
    results.extend(validate_builder(verbose));

    // 3. Compatibility scoring scenarios
    results.extend(validate_scoring(verbose));

    // 4. Sample roster parsing
    results.extend(validate_sample_roster(verbose));

    // 5. Full session against the in-memory store
    results.extend(play_session(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Trait Catalog ────────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Trait Catalog ---");
    let mut results = Vec::new();

    // Inherent stats belong to their kingdom
    let orphaned: Vec<String> = Kingdom::all()
        .iter()
        .flat_map(|&k| {
            inherent_stats(k)
                .iter()
                .filter(move |&&s| !is_available(k, s))
                .map(move |s| format!("{k}.{s}"))
        })
        .collect();
    results.push(TestResult {
        name: "catalog_inherent_in_vocabulary".into(),
        passed: orphaned.is_empty(),
        detail: if orphaned.is_empty() {
            "every inherent stat is in its kingdom's list".into()
        } else {
            format!("orphaned: {}", orphaned.join(", "))
        },
    });

    // Inherent stats never suppress anything
    let inherent_with_contra: Vec<_> = Kingdom::all()
        .iter()
        .flat_map(|&k| inherent_stats(k).iter())
        .filter(|s| !contra_stats(**s).is_empty())
        .collect();
    results.push(TestResult {
        name: "catalog_inherent_no_contra".into(),
        passed: inherent_with_contra.is_empty(),
        detail: format!("{} inherent stats suppress others", inherent_with_contra.len()),
    });

    // Every stat is used by some kingdom
    let unused: Vec<_> = Stat::all()
        .iter()
        .filter(|s| !Kingdom::all().iter().any(|&k| is_available(k, **s)))
        .collect();
    results.push(TestResult {
        name: "catalog_no_unused_stats".into(),
        passed: unused.is_empty(),
        detail: format!("{} stats, {} unused", Stat::all().len(), unused.len()),
    });

    if verbose {
        for &k in Kingdom::all() {
            let names: Vec<&str> = kingdom_stats(k).iter().map(|s| s.name()).collect();
            println!("  {:9}: {}", k.name(), names.join(", "));
        }
    }

    results
}

// ── 2. Organism Builder ─────────────────────────────────────────────────

fn validate_builder(_verbose: bool) -> Vec<TestResult> {
    println!("--- Organism Builder ---");
    let mut results = Vec::new();

    // agility 0 → 3 with strength 2 leaves strength at 0
    let mut ox = Organism::new("Ox", Kingdom::Animal, Environment::Grassland);
    let suppressed = ox.set_stat(Stat::Strength, 2).is_ok()
        && ox.set_stat(Stat::Agility, 3).is_ok()
        && ox.stat(Stat::Strength) == 0;
    results.push(TestResult {
        name: "builder_contra_suppression".into(),
        passed: suppressed,
        detail: format!(
            "strength={} agility={}",
            ox.stat(Stat::Strength),
            ox.stat(Stat::Agility)
        ),
    });

    // Budget stops at exactly POINT_BUDGET
    let mut runner = Organism::new("Runner", Kingdom::Animal, Environment::Grassland);
    let filled = runner.set_stat(Stat::Agility, 5).is_ok()
        && runner.set_stat(Stat::Resilience, 5).is_ok()
        && runner.set_stat(Stat::Vision, 1).is_ok();
    let over = runner.set_stat(Stat::Stealth, 1);
    results.push(TestResult {
        name: "builder_budget_cap".into(),
        passed: filled
            && runner.used_points() == POINT_BUDGET as u32
            && matches!(over, Err(TraitEditError::BudgetExceeded { .. })),
        detail: format!("{} points used, extra point → {:?}", runner.used_points(), over),
    });

    // Inherent traits cannot be edited
    let mut microbe = Organism::new("Microbe", Kingdom::Bacteria, Environment::Jungle);
    let locked = matches!(
        microbe.set_stat(Stat::Mutation, 0),
        Err(TraitEditError::InvalidTraitEdit { .. })
    );
    results.push(TestResult {
        name: "builder_inherent_locked".into(),
        passed: locked && microbe.stat(Stat::Mutation) == 5,
        detail: format!("mutation stays at {}", microbe.stat(Stat::Mutation)),
    });

    results
}

// ── 3. Compatibility Scoring ────────────────────────────────────────────

fn validate_scoring(verbose: bool) -> Vec<TestResult> {
    println!("--- Compatibility Scoring ---");
    let mut results = Vec::new();
    let table = ScoringTable::default();

    let mut gazelle = Organism::new("Gazelle", Kingdom::Animal, Environment::Grassland);
    let built = gazelle.set_stat(Stat::Agility, 5).is_ok()
        && gazelle.set_stat(Stat::Resilience, 3).is_ok();
    let score = environment_compatibility(&gazelle, Environment::Grassland, &table);
    results.push(TestResult {
        name: "scoring_grassland_animal_thrives".into(),
        passed: built && classify(score, &ENVIRONMENT_THRESHOLDS) == OrganismStatus::Thriving,
        detail: format!("score {:.2}", score),
    });

    let cactus = Organism::new("Cactus?", Kingdom::Plant, Environment::Desert);
    let score = environment_compatibility(&cactus, Environment::Desert, &table);
    results.push(TestResult {
        name: "scoring_bare_plant_desert_extinct".into(),
        passed: score < 3.0 && preview_survival(&cactus, &table).1 == OrganismStatus::Extinct,
        detail: format!("score {:.2}", score),
    });

    let microbe = Organism::new("Microbe", Kingdom::Bacteria, Environment::Jungle);
    let score = city_compatibility(&microbe, &table);
    results.push(TestResult {
        name: "scoring_bacteria_city".into(),
        passed: classify(score, &CITY_THRESHOLDS) != OrganismStatus::Extinct,
        detail: format!("score {:.2} → {}", score, classify(score, &CITY_THRESHOLDS)),
    });

    let flat = ScoringTable::with_preset(KingdomBonusPreset::FlatAdaptability);
    let archaea = Organism::new("Archaea", Kingdom::Archaea, Environment::Jungle);
    let targeted_jungle = environment_compatibility(&archaea, Environment::Jungle, &table);
    let flat_jungle = environment_compatibility(&archaea, Environment::Jungle, &flat);
    results.push(TestResult {
        name: "scoring_presets_differ".into(),
        passed: (flat_jungle - targeted_jungle - 0.5).abs() < 1e-4,
        detail: format!("archaea jungle {:.2} targeted, {:.2} flat", targeted_jungle, flat_jungle),
    });

    if verbose {
        println!("  Bare organism scores (Targeted preset):");
        for &k in Kingdom::all() {
            let org = Organism::new("probe", k, Environment::Grassland);
            let cells: Vec<String> = Environment::all()
                .iter()
                .map(|&e| format!("{:>6.2}", environment_compatibility(&org, e, &table)))
                .collect();
            println!(
                "    {:9} {}  city {:>6.2}",
                k.name(),
                cells.join(" "),
                city_compatibility(&org, &table)
            );
        }
    }

    results
}

// ── 4. Sample Roster ────────────────────────────────────────────────────

fn sample_documents() -> Result<Vec<Value>, serde_json::Error> {
    serde_json::from_str(ROSTER_JSON)
}

fn validate_sample_roster(verbose: bool) -> Vec<TestResult> {
    println!("--- Sample Roster ---");
    let mut results = Vec::new();

    let docs = match sample_documents() {
        Ok(d) => d,
        Err(e) => {
            results.push(TestResult {
                name: "roster_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    let roster = parse_roster(&docs);
    results.push(TestResult {
        name: "roster_filters_malformed".into(),
        passed: roster.organisms.len() == 7 && roster.rejected.len() == 3,
        detail: format!(
            "{} kept, {} rejected",
            roster.organisms.len(),
            roster.rejected.len()
        ),
    });

    let every_kingdom = Kingdom::all()
        .iter()
        .all(|k| roster.organisms.iter().any(|o| o.kingdom == *k));
    results.push(TestResult {
        name: "roster_covers_every_kingdom".into(),
        passed: every_kingdom,
        detail: "one organism or more per kingdom".into(),
    });

    if verbose {
        for r in &roster.rejected {
            println!("  rejected #{}: {}", r.index, r.reason);
        }
    }

    results
}

// ── 5. Full Session ─────────────────────────────────────────────────────

fn play_session(verbose: bool) -> Vec<TestResult> {
    println!("--- Full Session ---");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            return vec![TestResult {
                name: "session_runtime".into(),
                passed: false,
                detail: format!("cannot build runtime: {}", e),
            }];
        }
    };

    match runtime.block_on(run_session(verbose)) {
        Ok(results) => results,
        Err(e) => vec![TestResult {
            name: "session_flow".into(),
            passed: false,
            detail: format!("session aborted: {}", e),
        }],
    }
}

async fn run_session(verbose: bool) -> Result<Vec<TestResult>, HostError> {
    let mut results = Vec::new();
    let repo = Arc::new(InMemoryRepository::seeded(2024));
    let config = HostConfig {
        champion_seed: Some(7),
        ..HostConfig::default()
    };
    let mut host =
        PhaseController::create(repo.clone(), "Harness", GameSettings::default(), &config).await?;
    let code = host.code().to_string();
    info!("Harness playing session {}", code);

    // Starting an empty session must fail and stay in waiting
    let empty_start = host.start().await;
    results.push(TestResult {
        name: "session_empty_start_rejected".into(),
        passed: matches!(empty_start, Err(HostError::Phase(PhaseError::NoOrganisms)))
            && host.state() == GameState::Waiting,
        detail: format!("{:?}", empty_start.err()),
    });

    // Students join and submit; raw drafts go straight into the store
    let docs = sample_documents().unwrap_or_default();
    for doc in docs {
        if let Some(player) = doc.get("playerName").and_then(Value::as_str) {
            host.join_game(player).await?;
        }
        repo.insert_raw_document(&code, doc).await?;
    }

    host.start().await?;
    let env_summary = host.run_environment_phase().await?;
    results.push(TestResult {
        name: "session_environment_round".into(),
        passed: env_summary.total == 7 && host.state() == GameState::Environment,
        detail: env_summary.to_string(),
    });

    let roster = parse_roster(&repo.get_roster(&code).await?).organisms;
    if verbose {
        for (env, orgs) in survivors_by_environment(&roster) {
            let names: Vec<&str> = orgs.iter().map(|o| o.name.as_str()).collect();
            println!("  {:9}: {}", env.name(), names.join(", "));
        }
    }
    let extinct_after_env: Vec<String> = roster
        .iter()
        .filter(|o| o.is_extinct())
        .map(|o| o.name.clone())
        .collect();

    host.move_to_city_phase().await?;
    let city_summary = host.run_city_phase().await?;
    let roster = parse_roster(&repo.get_roster(&code).await?).organisms;

    let still_extinct = extinct_after_env.iter().all(|name| {
        roster
            .iter()
            .any(|o| &o.name == name && o.status == OrganismStatus::Extinct)
    });
    let env_extinct = env_summary.count(OrganismStatus::Extinct);
    results.push(TestResult {
        name: "session_extinction_absorbing".into(),
        passed: !extinct_after_env.is_empty()
            && extinct_after_env.len() == env_extinct
            && still_extinct,
        detail: format!(
            "{} extinct after biome round, {} stored",
            env_extinct,
            extinct_after_env.len()
        ),
    });

    results.push(TestResult {
        name: "session_results".into(),
        passed: host.state() == GameState::Results
            && host.winners().len() == city_summary.survivors(),
        detail: format!(
            "{}; champion {}",
            city_summary,
            host.champion().map(|o| o.name.as_str()).unwrap_or("none")
        ),
    });

    let extinct_after_city = roster.iter().filter(|o| o.is_extinct()).count();
    host.reset_game().await?;
    let roster = parse_roster(&repo.get_roster(&code).await?).organisms;
    results.push(TestResult {
        name: "session_reset".into(),
        passed: extinct_after_city > 0
            && roster.len() == env_summary.total
            && host.state() == GameState::Waiting
            && roster.iter().all(|o| o.status == OrganismStatus::Alive),
        detail: format!("{} organisms revived, {} were extinct", roster.len(), extinct_after_city),
    });

    host.end_game().await?;
    info!("Harness session {} finished", code);
    results.push(TestResult {
        name: "session_end".into(),
        passed: repo.session_count().await == 0,
        detail: format!("session {} deleted", code),
    });

    Ok(results)
}
