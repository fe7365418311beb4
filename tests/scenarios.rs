//! End-to-end scenarios: worked examples, the run lifecycle and the
//! result artifact.

use slot_optim::constraint::validate;
use slot_optim::error::{AppError, SolveError};
use slot_optim::ga::GaConfig;
use slot_optim::greedy::GreedyConfig;
use slot_optim::interactive::{self, InteractiveSession};
use slot_optim::model::{
    Candidate, CandidateKey, Category, ConstraintSet, DisciplineId, EvaluationPeriod, Pin,
};
use slot_optim::pool::{CandidatePool, InMemoryStore, PoolBuilder};
use slot_optim::report::ResultArtifact;
use slot_optim::restart::RestartConfig;
use slot_optim::run::{
    solve_institution, InMemoryRunRepository, InstitutionRequest, RunController, RunRequest,
    RunStatus,
};
use slot_optim::solver::{SolveContext, Solver, StopReason};
use std::sync::Arc;

fn article(publication: &str, author: u64, points: f64) -> Candidate {
    Candidate::new(
        CandidateKey::new(publication, author),
        DisciplineId::from("economics"),
        points,
        1.0,
        Category::Article,
        2023,
    )
    .unwrap()
}

fn pool(candidates: Vec<Candidate>, quota: f64) -> CandidatePool {
    CandidatePool::new(
        DisciplineId::from("economics"),
        EvaluationPeriod::default(),
        candidates,
        ConstraintSet::new(quota, 4.0, 2.0).unwrap(),
    )
    .unwrap()
}

fn greedy() -> Solver {
    Solver::Greedy(GreedyConfig::default())
}

const STORE_JSON: &str = r#"{
  "disciplines": [
    { "discipline_id": "economics", "headcount": 2.0 },
    { "discipline_id": "linguistics", "headcount": 14.0, "sanctions": 1.5 },
    { "discipline_id": "theology" }
  ],
  "candidates": [
    { "publication_id": "e-1", "author_id": 1, "discipline_id": "economics",
      "points": 140.0, "participation_share": 1.0, "category": "ARTICLE", "year": 2023 },
    { "publication_id": "e-2", "author_id": 1, "discipline_id": "economics",
      "points": 100.0, "participation_share": 0.5, "category": "ARTICLE", "year": 2024 },
    { "publication_id": "e-3", "author_id": 2, "discipline_id": "economics",
      "points": 200.0, "participation_share": 1.0, "category": "MONOGRAPH", "year": 2022 },
    { "publication_id": "e-4", "author_id": 2, "discipline_id": "economics",
      "points": 20.0, "participation_share": 0.05, "category": "ARTICLE", "year": 2023 },
    { "publication_id": "e-5", "author_id": 3, "discipline_id": "economics",
      "points": 70.0, "participation_share": 1.0, "category": "CHAPTER", "year": 2019 },
    { "publication_id": "l-1", "author_id": 9, "discipline_id": "linguistics",
      "points": 40.0, "participation_share": 1.0, "category": "ARTICLE", "year": 2024 }
  ]
}"#;

// ---- worked examples ----

#[test]
fn single_author_with_ample_quota_takes_everything() {
    let pool = pool(
        vec![article("a", 1, 100.0), article("b", 1, 90.0), article("c", 1, 10.0)],
        10.0,
    );
    let outcome = interactive::solve(&pool, &[], &greedy(), &SolveContext::new()).unwrap();
    assert_eq!(outcome.solution.len(), 3);
    assert!((outcome.solution.total_score() - 200.0).abs() < 1e-9);
}

#[test]
fn global_quota_drops_the_lowest_scoring_candidate() {
    let pool = pool(
        vec![
            article("a1", 1, 100.0),
            article("a2", 1, 90.0),
            article("a3", 1, 10.0),
            article("b1", 2, 80.0),
            article("b2", 2, 70.0),
            article("b3", 2, 60.0),
        ],
        5.0,
    );
    for solver in [
        greedy(),
        Solver::Genetic(GaConfig::fast().with_seed(3)),
        Solver::RandomRestart(RestartConfig::fast().with_seed(3)),
    ] {
        let outcome = interactive::solve(&pool, &[], &solver, &SolveContext::new()).unwrap();
        assert_eq!(outcome.solution.len(), 5, "{}", solver.strategy());
        assert!(!outcome.solution.contains(&CandidateKey::new("a3", 1)));
        assert!((outcome.solution.total_score() - 400.0).abs() < 1e-9);
        assert!((outcome.solution.participation_used() - 5.0).abs() < 1e-9);
    }
}

#[test]
fn forcing_out_the_top_candidate_costs_score() {
    let pool = pool(
        vec![
            article("a1", 1, 100.0),
            article("a2", 1, 90.0),
            article("b1", 2, 80.0),
            article("b2", 2, 70.0),
        ],
        3.0,
    );
    let top = CandidateKey::new("a1", 1);
    let free = interactive::solve(&pool, &[], &greedy(), &SolveContext::new()).unwrap();
    let pinned = interactive::solve(
        &pool,
        &[Pin::forced_out(top.clone())],
        &greedy(),
        &SolveContext::new(),
    )
    .unwrap();
    assert!(free.solution.contains(&top));
    assert!(!pinned.solution.contains(&top));
    assert!(pinned.solution.total_score() < free.solution.total_score());
}

#[test]
fn genetic_re_solve_with_same_seed_is_reproducible() {
    let pool = pool(
        (0..12)
            .map(|i| article(&format!("p{i}"), i % 4 + 1, (i * 13 % 50) as f64 + 5.0))
            .collect(),
        6.0,
    );
    let solver = Solver::Genetic(GaConfig::fast().with_seed(99));
    let mut session = InteractiveSession::new(pool, solver);
    let ctx = SolveContext::new();
    let first = session.resolve(&ctx).unwrap().solution.total_score();
    let second = session.resolve(&ctx).unwrap().solution.total_score();
    assert!(second >= first - 1e-9);
}

// ---- store and pool ----

#[test]
fn pool_from_store_applies_filters() {
    let store = InMemoryStore::from_json_str(STORE_JSON).unwrap();
    let pool = PoolBuilder::new(&store)
        .build(&DisciplineId::from("economics"), EvaluationPeriod::new(2022, 2025))
        .unwrap();
    // e-4 is below the minimum share, e-5 is outside the period.
    let keys: Vec<String> = pool.candidates().iter().map(|c| c.key().to_string()).collect();
    assert_eq!(keys, vec!["e-1@1", "e-2@1", "e-3@2"]);
    assert!((pool.constraints().global_quota_n - 6.0).abs() < 1e-9);
}

#[test]
fn missing_headcount_maps_to_exit_code_two() {
    let store = InMemoryStore::from_json_str(STORE_JSON).unwrap();
    let err = PoolBuilder::new(&store)
        .build(&DisciplineId::from("theology"), EvaluationPeriod::default())
        .unwrap_err();
    assert!(matches!(err, SolveError::DataUnavailable { .. }));
    assert_eq!(AppError::from(err).exit_code(), 2);
}

#[test]
fn contradictory_pins_map_to_exit_code_three() {
    let pool = pool(vec![article("a", 1, 10.0)], 2.0);
    let key = CandidateKey::new("a", 1);
    let err = interactive::solve(
        &pool,
        &[Pin::forced_in(key.clone()), Pin::forced_out(key)],
        &greedy(),
        &SolveContext::new(),
    )
    .unwrap_err();
    assert_eq!(AppError::from(err).exit_code(), 3);
}

// ---- run lifecycle ----

fn controller() -> RunController {
    let store = InMemoryStore::from_json_str(STORE_JSON).unwrap();
    RunController::new(Arc::new(store), Arc::new(InMemoryRunRepository::new()))
}

#[test]
fn completed_run_produces_artifact() {
    let controller = controller();
    let period = EvaluationPeriod::new(2022, 2025);
    let id = controller
        .start(RunRequest::new("economics", greedy()).with_period(period))
        .unwrap();
    let run = controller.wait(id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    let solution = controller.solution(id).unwrap().unwrap();
    let store = InMemoryStore::from_json_str(STORE_JSON).unwrap();
    let pool = PoolBuilder::new(&store)
        .build(&run.discipline_id, period)
        .unwrap();
    assert!(validate(&solution, pool.constraints(), &[]).unwrap().is_ok());
    assert_eq!(run.constraints.as_ref(), Some(pool.constraints()));

    let artifact =
        ResultArtifact::from_run(&run, period, &solution, run.constraints.as_ref().unwrap());
    assert_eq!(artifact.run_id, Some(id));
    assert!((artifact.total_score - 390.0).abs() < 1e-9);
    assert_eq!(artifact.authors.len(), 2);

    let dir = std::env::temp_dir().join(format!("slot-scenario-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = artifact.write(Some(&dir)).unwrap().unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["strategy"], "GREEDY");
    assert_eq!(json["selected"].as_array().unwrap().len(), 3);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn cancelled_run_keeps_a_feasible_solution() {
    let controller = controller();
    let solver = Solver::Genetic(
        GaConfig::default()
            .with_max_generations(5_000_000)
            .with_saturate(0)
            .with_seed(1),
    );
    let id = controller
        .start(RunRequest::new("economics", solver))
        .unwrap();
    controller.cancel(id).unwrap();
    let run = controller.wait(id).unwrap();

    // Tiny pool: the GA may also reach the upper bound before seeing the flag.
    assert!(run.status.has_solution());
    if run.status == RunStatus::Cancelled {
        assert_eq!(run.stop, Some(StopReason::Cancelled));
    }
    let solution = controller.solution(id).unwrap().unwrap();
    let store = InMemoryStore::from_json_str(STORE_JSON).unwrap();
    let pool = PoolBuilder::new(&store)
        .build(&DisciplineId::from("economics"), EvaluationPeriod::default())
        .unwrap();
    assert!(validate(&solution, pool.constraints(), &[]).unwrap().is_ok());
}

#[test]
fn institution_batch_respects_min_headcount() {
    let controller = controller();
    let report = solve_institution(
        &controller,
        &InstitutionRequest::new(greedy()).with_min_headcount(12.0),
    )
    .unwrap();
    assert_eq!(report.runs.len(), 1);
    assert_eq!(report.runs[0].discipline_id, DisciplineId::from("linguistics"));
    assert_eq!(report.runs[0].status, RunStatus::Completed);
    let skipped: Vec<&str> = report
        .skipped
        .iter()
        .map(|s| s.discipline_id.0.as_str())
        .collect();
    assert_eq!(skipped, vec!["economics", "theology"]);
}
