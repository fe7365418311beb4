//! Command-line entry points.
//!
//! Each binary parses its own argument struct and hands it to one of the
//! `run_*` functions; [`exit`] turns the result into a process exit code.
//! Results go to stdout (or `--output-path`), logs go to stderr.

use crate::config::AppConfig;
use crate::error::{AppError, SolveError};
use crate::ga::GaConfig;
use crate::greedy::GreedyConfig;
use crate::model::{DisciplineId, EvaluationPeriod, Pin};
use crate::pool::InMemoryStore;
use crate::report::ResultArtifact;
use crate::restart::RestartConfig;
use crate::run::{
    solve_institution, InMemoryRunRepository, InstitutionRequest, OptimizationRun,
    RunController, RunId, RunRequest, RunStatus, DEFAULT_MIN_HEADCOUNT,
};
use crate::solver::{Solver, Strategy};
use crate::telemetry;
use clap::{Args, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Input and output options shared by every binary.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Bibliographic store JSON (defaults to SLOT_INPUT)
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Where to write the result artifact: a file, or a directory receiving
    /// `{strategy}_{discipline}.json`. Stdout when omitted
    #[arg(long = "output-path")]
    pub output_path: Option<PathBuf>,
    /// RNG seed (defaults to SLOT_SEED)
    #[arg(long)]
    pub seed: Option<u64>,
    /// First publication year of the evaluation period
    #[arg(long, default_value_t = 2022)]
    pub period_start: i32,
    /// Last publication year of the evaluation period
    #[arg(long, default_value_t = 2025)]
    pub period_end: i32,
}

impl StoreArgs {
    fn period(&self) -> EvaluationPeriod {
        EvaluationPeriod::new(self.period_start, self.period_end)
    }
}

/// Discipline selection and pins for single-discipline binaries.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Discipline to optimize
    #[arg(long = "dyscyplina")]
    pub discipline: String,
    /// JSON array of pins: `[{"candidate": {...}, "state": "FORCED_IN"}]`
    #[arg(long)]
    pub pins: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(name = "slot-greedy", about = "Capacity-aware greedy slot selection", version)]
pub struct GreedyCli {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Parser, Debug)]
#[command(name = "slot-genetic", about = "Genetic-algorithm slot selection", version)]
pub struct GeneticCli {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub store: StoreArgs,
    #[command(flatten)]
    pub genetic: GeneticArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GeneticArgs {
    /// Generation budget per epoch
    #[arg(long, default_value_t = 1000)]
    pub generations: usize,
    /// Stop after this many generations without improvement (0 disables)
    #[arg(long, default_value_t = 300)]
    pub saturate: usize,
    /// Population size
    #[arg(long)]
    pub population: Option<usize>,
    /// Wall-clock limit in milliseconds
    #[arg(long)]
    pub time_limit_ms: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(name = "slot-restart", about = "Randomized-restart slot selection", version)]
pub struct RestartCli {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub store: StoreArgs,
    #[command(flatten)]
    pub restart: RestartArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RestartArgs {
    /// Number of restarts
    #[arg(long, default_value_t = 500)]
    pub restarts: usize,
}

#[derive(Parser, Debug)]
#[command(
    name = "slot-institution",
    about = "Solve every sufficiently staffed discipline of the institution",
    version
)]
pub struct InstitutionCli {
    #[command(flatten)]
    pub store: StoreArgs,
    /// Strategy used for every discipline
    #[arg(long, value_enum, default_value_t = Strategy::Genetic)]
    pub strategy: Strategy,
    /// Disciplines with a smaller headcount are skipped
    #[arg(long, default_value_t = DEFAULT_MIN_HEADCOUNT)]
    pub min_headcount: f64,
    #[command(flatten)]
    pub genetic: GeneticArgs,
    #[command(flatten)]
    pub restart: RestartArgs,
}

// ============================================================================
// Solver construction
// ============================================================================

fn genetic_solver(args: &GeneticArgs, seed: Option<u64>) -> Solver {
    let mut config = GaConfig::default()
        .with_max_generations(args.generations)
        .with_saturate(args.saturate);
    if let Some(population) = args.population {
        config = config.with_population_size(population);
    }
    if let Some(ms) = args.time_limit_ms {
        config = config.with_time_limit_ms(ms);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    Solver::Genetic(config)
}

fn restart_solver(args: &RestartArgs, seed: Option<u64>) -> Solver {
    let mut config = RestartConfig::default().with_num_restarts(args.restarts);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    Solver::RandomRestart(config)
}

// ============================================================================
// Entry points
// ============================================================================

pub fn run_greedy(cli: GreedyCli) -> Result<(), AppError> {
    let config = bootstrap()?;
    let solver = Solver::Greedy(GreedyConfig::default());
    run_discipline(&config, &cli.store, &cli.target, solver)
}

pub fn run_genetic(cli: GeneticCli) -> Result<(), AppError> {
    let config = bootstrap()?;
    let solver = genetic_solver(&cli.genetic, cli.store.seed.or(config.seed));
    run_discipline(&config, &cli.store, &cli.target, solver)
}

pub fn run_restart(cli: RestartCli) -> Result<(), AppError> {
    let config = bootstrap()?;
    let solver = restart_solver(&cli.restart, cli.store.seed.or(config.seed));
    run_discipline(&config, &cli.store, &cli.target, solver)
}

pub fn run_institution(cli: InstitutionCli) -> Result<(), AppError> {
    let config = bootstrap()?;
    let seed = cli.store.seed.or(config.seed);
    let solver = match cli.strategy {
        Strategy::Greedy => Solver::Greedy(GreedyConfig::default()),
        Strategy::Genetic => genetic_solver(&cli.genetic, seed),
        Strategy::RandomRestart => restart_solver(&cli.restart, seed),
    };
    let store = open_store(&config, &cli.store)?;
    let controller = RunController::new(store, Arc::new(InMemoryRunRepository::new()));
    let period = cli.store.period();
    let request = InstitutionRequest::new(solver)
        .with_period(period)
        .with_min_headcount(cli.min_headcount);

    if let Some(dir) = &cli.store.output_path {
        fs::create_dir_all(dir)?;
    }
    let report = solve_institution(&controller, &request)?;
    for skipped in &report.skipped {
        info!(discipline = %skipped.discipline_id, reason = %skipped.reason, "discipline skipped");
    }
    let mut first_failure = None;
    for run in &report.runs {
        if run.status.has_solution() {
            emit_artifact(
                &controller,
                run,
                period,
                cli.store.output_path.as_deref(),
            )?;
        } else {
            warn!(
                discipline = %run.discipline_id,
                run_id = %run.id,
                error = run.error_message.as_deref().unwrap_or(""),
                "discipline failed"
            );
            first_failure.get_or_insert_with(|| run_failed(run));
        }
    }
    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Maps an entry-point result to the process exit code, reporting the error
/// on stderr.
pub fn exit(result: Result<(), AppError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn bootstrap() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn open_store(config: &AppConfig, args: &StoreArgs) -> Result<Arc<InMemoryStore>, AppError> {
    let path = args
        .input
        .clone()
        .or_else(|| config.input.clone())
        .ok_or_else(|| AppError::MissingInput("pass --input or set SLOT_INPUT".into()))?;
    let store = InMemoryStore::from_path(&path).map_err(SolveError::from)?;
    debug!(path = %path.display(), "store loaded");
    Ok(Arc::new(store))
}

fn read_pins(path: Option<&Path>) -> Result<Vec<Pin>, AppError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(Vec::new()),
    }
}

fn run_discipline(
    config: &AppConfig,
    store_args: &StoreArgs,
    target: &TargetArgs,
    solver: Solver,
) -> Result<(), AppError> {
    let store = open_store(config, store_args)?;
    let pins = read_pins(target.pins.as_deref())?;
    let period = store_args.period();
    let controller = RunController::new(store, Arc::new(InMemoryRunRepository::new()));

    let request = RunRequest::new(DisciplineId(target.discipline.clone()), solver)
        .with_pins(pins)
        .with_period(period);
    let id = controller.start(request)?;
    let run = await_run(&controller, id, config.stale_run_after)?;
    if !run.status.has_solution() {
        return Err(run_failed(&run));
    }
    emit_artifact(
        &controller,
        &run,
        period,
        store_args.output_path.as_deref(),
    )
}

/// Polls until the run is terminal, reclaiming it if the worker falls silent
/// for longer than `stale_after`.
fn await_run(
    controller: &RunController,
    id: RunId,
    stale_after: Duration,
) -> Result<OptimizationRun, AppError> {
    loop {
        let progress = controller.get_progress(id)?;
        if progress.status.is_terminal() {
            return Ok(controller.wait(id)?);
        }
        debug!(
            run_id = %id,
            percent = progress.progress_percent,
            best_score = progress.best_score,
            "run progress"
        );
        if controller.sweep_stale(stale_after)?.contains(&id) {
            return Ok(controller.get(id)?);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn emit_artifact(
    controller: &RunController,
    run: &OptimizationRun,
    period: EvaluationPeriod,
    output: Option<&Path>,
) -> Result<(), AppError> {
    let solution = controller
        .solution(run.id)?
        .ok_or_else(|| run_failed(run))?;
    let constraints = run.constraints.as_ref().ok_or_else(|| run_failed(run))?;
    let artifact = ResultArtifact::from_run(run, period, &solution, constraints);
    if let Some(path) = artifact.write(output)? {
        info!(
            discipline = %run.discipline_id,
            path = %path.display(),
            score = artifact.total_score,
            "artifact written"
        );
    }
    if run.status == RunStatus::Cancelled {
        warn!(run_id = %run.id, "run was cancelled; artifact holds the best solution found");
    }
    Ok(())
}

fn run_failed(run: &OptimizationRun) -> AppError {
    AppError::RunFailed {
        run: run.id,
        status: run.status.to_string(),
        message: run
            .error_message
            .clone()
            .unwrap_or_else(|| "no solution recorded".to_string()),
        kind: run.failure_kind,
    }
}
