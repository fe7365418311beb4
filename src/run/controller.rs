//! Background execution of optimization runs.

use super::lock::{DisciplineLock, DisciplineLocks};
use super::repository::RunRepository;
use super::types::{FailureKind, OptimizationRun, RunId, RunProgress, RunStatus};
use crate::error::{RunError, SolveError};
use crate::interactive;
use crate::model::{ConstraintSet, DisciplineId, EvaluationPeriod, Pin, Solution};
use crate::pool::{BibliographicStore, PoolBuilder, PoolOptions};
use crate::solver::{
    CancelToken, ProgressObserver, ProgressUpdate, SolveContext, SolveOutcome, Solver,
};
use chrono::Utc;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// What to optimize.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub discipline_id: DisciplineId,
    pub solver: Solver,
    pub pins: Vec<Pin>,
    pub period: EvaluationPeriod,
}

impl RunRequest {
    pub fn new(discipline_id: impl Into<DisciplineId>, solver: Solver) -> Self {
        Self {
            discipline_id: discipline_id.into(),
            solver,
            pins: Vec::new(),
            period: EvaluationPeriod::default(),
        }
    }

    pub fn with_pins(mut self, pins: Vec<Pin>) -> Self {
        self.pins = pins;
        self
    }

    pub fn with_period(mut self, period: EvaluationPeriod) -> Self {
        self.period = period;
        self
    }
}

struct ActiveRun {
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

/// Runs whose worker has not exited yet. Each worker removes its own entry.
type ActiveRuns = Arc<Mutex<HashMap<RunId, ActiveRun>>>;

fn lock_active(active: &ActiveRuns) -> MutexGuard<'_, HashMap<RunId, ActiveRun>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Starts, observes and cancels runs.
///
/// Each run executes on its own worker thread. At most one run per
/// discipline is active at a time; a second [`start`](Self::start) for the
/// same discipline fails with [`RunError::AlreadyRunning`].
pub struct RunController {
    store: Arc<dyn BibliographicStore>,
    repository: Arc<dyn RunRepository>,
    locks: DisciplineLocks,
    pool_options: PoolOptions,
    next_id: AtomicU64,
    active: ActiveRuns,
}

impl RunController {
    pub fn new(store: Arc<dyn BibliographicStore>, repository: Arc<dyn RunRepository>) -> Self {
        Self {
            store,
            repository,
            locks: DisciplineLocks::new(),
            pool_options: PoolOptions::default(),
            next_id: AtomicU64::new(1),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_pool_options(mut self, options: PoolOptions) -> Self {
        self.pool_options = options;
        self
    }

    pub fn store(&self) -> &Arc<dyn BibliographicStore> {
        &self.store
    }

    pub fn repository(&self) -> &Arc<dyn RunRepository> {
        &self.repository
    }

    pub fn pool_options(&self) -> &PoolOptions {
        &self.pool_options
    }

    pub fn locks(&self) -> &DisciplineLocks {
        &self.locks
    }

    fn active(&self) -> MutexGuard<'_, HashMap<RunId, ActiveRun>> {
        lock_active(&self.active)
    }

    /// Queues a run and returns its id immediately.
    ///
    /// # Errors
    ///
    /// [`RunError::AlreadyRunning`] if the discipline has an active run,
    /// [`RunError::Spawn`] if the worker thread cannot be created.
    pub fn start(&self, request: RunRequest) -> Result<RunId, RunError> {
        let id = RunId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let lock = self.locks.try_acquire(&request.discipline_id, id)?;
        let strategy = request.solver.strategy();
        self.repository.insert(OptimizationRun::pending(
            id,
            request.discipline_id.clone(),
            strategy,
        ))?;

        let cancel = CancelToken::new();
        // Registered before the spawn so the worker always finds its entry.
        self.active().insert(
            id,
            ActiveRun {
                cancel: cancel.clone(),
                handle: None,
            },
        );
        let worker = Worker {
            id,
            request,
            store: Arc::clone(&self.store),
            repository: Arc::clone(&self.repository),
            pool_options: self.pool_options,
            cancel,
            active: Arc::clone(&self.active),
            _lock: lock,
        };
        let discipline = worker.request.discipline_id.clone();
        let spawned = thread::Builder::new()
            .name(format!("slot-{id}"))
            .spawn(move || worker.execute());
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.active().remove(&id);
                let message = format!("failed to spawn worker: {err}");
                self.repository.transition(id, RunStatus::Pending, &mut |r| {
                    r.fail(FailureKind::Internal, message.clone(), Utc::now())
                })?;
                return Err(RunError::Spawn(err));
            }
        };
        // A worker that already finished has removed its entry; its handle
        // is simply dropped.
        if let Some(active) = self.active().get_mut(&id) {
            active.handle = Some(handle);
        }
        info!(run_id = %id, discipline = %discipline, strategy = %strategy, "run started");
        Ok(id)
    }

    /// Requests cooperative cancellation.
    ///
    /// The solver stops at its next iteration boundary and the run ends
    /// CANCELLED with the best solution found. A greedy pass is never
    /// interrupted. Cancelling a finished run has no effect.
    pub fn cancel(&self, id: RunId) -> Result<(), RunError> {
        let run = self.get(id)?;
        if let Some(active) = self.active().get(&id) {
            active.cancel.cancel();
        }
        info!(run_id = %id, status = %run.status, "cancellation requested");
        Ok(())
    }

    pub fn get(&self, id: RunId) -> Result<OptimizationRun, RunError> {
        self.repository.fetch(id)?.ok_or(RunError::NotFound(id))
    }

    pub fn get_progress(&self, id: RunId) -> Result<RunProgress, RunError> {
        let run = self.get(id)?;
        Ok(RunProgress {
            status: run.status,
            progress_percent: run.progress_percent,
            best_score: run.best_score,
        })
    }

    /// Solution attached to a COMPLETED or CANCELLED run.
    pub fn solution(&self, id: RunId) -> Result<Option<Solution>, RunError> {
        let run = self.get(id)?;
        match run.best_solution_ref {
            Some(key) => self.repository.solution(key),
            None => Ok(None),
        }
    }

    /// Number of runs whose worker has not exited yet.
    pub fn active_count(&self) -> usize {
        self.active().len()
    }

    /// Blocks until the run's worker has exited and returns the final record.
    pub fn wait(&self, id: RunId) -> Result<OptimizationRun, RunError> {
        let handle = self.active().get_mut(&id).and_then(|a| a.handle.take());
        if let Some(handle) = handle {
            let joined = handle.join();
            self.active().remove(&id);
            if joined.is_err() {
                return Err(RunError::WorkerPanicked(id));
            }
        }
        self.get(id)
    }

    /// Fails RUNNING runs that have been silent for longer than
    /// `max_silence`, requests their cancellation and frees their
    /// disciplines. Returns the reclaimed ids.
    pub fn sweep_stale(&self, max_silence: Duration) -> Result<Vec<RunId>, RunError> {
        let now = Utc::now();
        let mut reclaimed = Vec::new();
        for run in self.repository.list()? {
            if run.status != RunStatus::Running {
                continue;
            }
            let last_seen = run
                .heartbeat
                .or(run.started_on)
                .unwrap_or(run.created_on);
            let silent = now
                .signed_duration_since(last_seen)
                .to_std()
                .is_ok_and(|silence| silence > max_silence);
            if !silent {
                continue;
            }
            let message = format!(
                "no heartbeat since {}; reclaimed by stale-run sweep",
                last_seen.to_rfc3339()
            );
            let applied = self.repository.transition(run.id, RunStatus::Running, &mut |r| {
                r.fail(FailureKind::Internal, message.clone(), now)
            })?;
            if !applied {
                continue;
            }
            if let Some(active) = self.active().get(&run.id) {
                active.cancel.cancel();
            }
            self.locks.release(&run.discipline_id, run.id);
            warn!(run_id = %run.id, discipline = %run.discipline_id, "stale run reclaimed");
            reclaimed.push(run.id);
        }
        Ok(reclaimed)
    }
}

/// Everything a worker thread owns.
struct Worker {
    id: RunId,
    request: RunRequest,
    store: Arc<dyn BibliographicStore>,
    repository: Arc<dyn RunRepository>,
    pool_options: PoolOptions,
    cancel: CancelToken,
    active: ActiveRuns,
    // Released when the worker exits.
    _lock: DisciplineLock,
}

impl Worker {
    /// Runs to a terminal state, frees the discipline, then deregisters.
    fn execute(self) {
        self.run();
        let id = self.id;
        let active = Arc::clone(&self.active);
        drop(self);
        lock_active(&active).remove(&id);
    }

    fn run(&self) {
        let id = self.id;
        let now = Utc::now();
        match self.repository.transition(id, RunStatus::Pending, &mut |r| {
            r.status = RunStatus::Running;
            r.started_on = Some(now);
            r.heartbeat = Some(now);
        }) {
            Ok(true) => {}
            Ok(false) => {
                warn!(run_id = %id, "run left PENDING before its worker started");
                return;
            }
            Err(err) => {
                error!(run_id = %id, error = %err, "could not mark run RUNNING");
                return;
            }
        }

        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.solve())) {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(err)) => Err((FailureKind::from(&err), err.to_string())),
            Err(payload) => Err((
                FailureKind::Internal,
                format!("solver panicked: {}", panic_message(payload.as_ref())),
            )),
        };
        if let Err(err) = self.finish(result) {
            error!(run_id = %id, error = %err, "could not record run result");
        }
    }

    fn solve(&self) -> Result<(SolveOutcome, ConstraintSet), SolveError> {
        let pool = PoolBuilder::new(&*self.store)
            .with_options(self.pool_options)
            .build(&self.request.discipline_id, self.request.period)?;
        let observer = Arc::new(ProgressWriter {
            id: self.id,
            repository: Arc::clone(&self.repository),
        });
        let ctx = SolveContext::new()
            .with_cancel(self.cancel.clone())
            .with_observer(observer);
        let outcome = interactive::solve(&pool, &self.request.pins, &self.request.solver, &ctx)?;
        Ok((outcome, pool.constraints().clone()))
    }

    fn finish(
        &self,
        result: Result<(SolveOutcome, ConstraintSet), (FailureKind, String)>,
    ) -> Result<(), RunError> {
        let id = self.id;
        let now = Utc::now();
        let applied = match result {
            Ok((outcome, constraints)) => {
                self.repository.save_solution(id, &outcome.solution)?;
                let status = if outcome.cancelled() {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Completed
                };
                let score = outcome.solution.total_score();
                let applied = self.repository.transition(id, RunStatus::Running, &mut |r| {
                    let percent = if status == RunStatus::Completed {
                        100.0
                    } else {
                        r.progress_percent
                    };
                    r.record_progress(percent, score, now);
                    r.status = status;
                    r.best_solution_ref = Some(id);
                    r.iterations = outcome.iterations;
                    r.stop = Some(outcome.stop);
                    r.constraints = Some(constraints.clone());
                    r.finished_on = Some(now);
                })?;
                if applied {
                    info!(
                        run_id = %id,
                        discipline = %self.request.discipline_id,
                        status = %status,
                        score,
                        "run finished"
                    );
                }
                applied
            }
            Err((kind, message)) => {
                error!(
                    run_id = %id,
                    discipline = %self.request.discipline_id,
                    kind = ?kind,
                    error = %message,
                    "run failed"
                );
                self.repository.transition(id, RunStatus::Running, &mut |r| {
                    r.fail(kind, message.clone(), now)
                })?
            }
        };
        if !applied {
            warn!(run_id = %id, "run was reclaimed before it finished; result discarded");
        }
        Ok(())
    }
}

/// Writes progress ticks into the run record.
struct ProgressWriter {
    id: RunId,
    repository: Arc<dyn RunRepository>,
}

impl ProgressObserver for ProgressWriter {
    fn on_progress(&self, update: ProgressUpdate) {
        let now = Utc::now();
        let written = self.repository.transition(self.id, RunStatus::Running, &mut |r| {
            r.record_progress(update.percent, update.best_score, now)
        });
        if let Err(err) = written {
            warn!(run_id = %self.id, error = %err, "progress update lost");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::GaConfig;
    use crate::greedy::GreedyConfig;
    use crate::model::{AuthorId, CandidateRecord, Category, PublicationId};
    use crate::pool::{DisciplineProfile, InMemoryStore};
    use crate::run::InMemoryRunRepository;
    use crate::solver::StopReason;

    fn store() -> InMemoryStore {
        let mut rows = Vec::new();
        for author in 1..=6u64 {
            for p in 0..5u64 {
                rows.push(CandidateRecord {
                    publication_id: PublicationId(format!("a{author}p{p}")),
                    author_id: AuthorId(author),
                    discipline_id: DisciplineId::from("physics"),
                    points: (20 * p + 7 * author) as f64 + 10.0,
                    participation_share: if p % 2 == 0 { 1.0 } else { 0.5 },
                    category: if p == 4 { Category::Monograph } else { Category::Article },
                    year: 2023,
                });
            }
        }
        let mut empty = DisciplineProfile::new("history", 10.0);
        empty.headcount = None;
        InMemoryStore::new()
            .with_profile(DisciplineProfile::new("physics", 2.0))
            .with_profile(empty)
            .with_rows(rows)
    }

    fn controller() -> RunController {
        RunController::new(Arc::new(store()), Arc::new(InMemoryRunRepository::new()))
    }

    fn endless_ga() -> Solver {
        Solver::Genetic(
            GaConfig::fast()
                .with_max_generations(10_000_000)
                .with_saturate(0)
                .with_seed(11),
        )
    }

    #[test]
    fn test_greedy_run_completes() {
        let controller = controller();
        let id = controller
            .start(RunRequest::new("physics", Solver::Greedy(GreedyConfig::default())))
            .unwrap();
        let run = controller.wait(id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.progress_percent, 100.0);
        assert!(run.finished_on.is_some());
        let solution = controller.solution(id).unwrap().unwrap();
        assert_eq!(run.best_score, Some(solution.total_score()));
        assert!((run.constraints.unwrap().global_quota_n - 6.0).abs() < 1e-9);
        assert!(controller.locks().holder(&DisciplineId::from("physics")).is_none());
    }

    #[test]
    fn test_second_start_rejected_while_running() {
        let controller = controller();
        let first = controller
            .start(RunRequest::new("physics", endless_ga()))
            .unwrap();
        let err = controller
            .start(RunRequest::new("physics", Solver::for_strategy(crate::solver::Strategy::Greedy)))
            .unwrap_err();
        assert!(matches!(err, RunError::AlreadyRunning { run, .. } if run == first));

        controller.cancel(first).unwrap();
        let run = controller.wait(first).unwrap();
        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(run.stop, Some(StopReason::Cancelled));
        assert!(controller.solution(first).unwrap().is_some());

        let again = controller
            .start(RunRequest::new("physics", Solver::Greedy(GreedyConfig::default())))
            .unwrap();
        assert_eq!(controller.wait(again).unwrap().status, RunStatus::Completed);
    }

    #[test]
    fn test_missing_headcount_fails_run() {
        let controller = controller();
        let id = controller
            .start(RunRequest::new("history", Solver::Greedy(GreedyConfig::default())))
            .unwrap();
        let run = controller.wait(id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.failure_kind, Some(FailureKind::DataUnavailable));
        assert!(run.error_message.unwrap().contains("history"));
        assert!(controller.solution(id).unwrap().is_none());
    }

    #[test]
    fn test_pin_conflict_fails_run() {
        let controller = controller();
        let key = crate::model::CandidateKey::new("a1p0", 1);
        let pins = vec![Pin::forced_in(key.clone()), Pin::forced_out(key)];
        let id = controller
            .start(
                RunRequest::new("physics", Solver::Greedy(GreedyConfig::default()))
                    .with_pins(pins),
            )
            .unwrap();
        let run = controller.wait(id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.failure_kind, Some(FailureKind::PinConflict));
    }

    #[test]
    fn test_unknown_run() {
        let controller = controller();
        assert!(matches!(
            controller.get_progress(RunId(77)),
            Err(RunError::NotFound(RunId(77)))
        ));
        assert!(matches!(controller.cancel(RunId(77)), Err(RunError::NotFound(_))));
    }

    #[test]
    fn test_sweep_reclaims_silent_run() {
        let controller = controller();
        let discipline = DisciplineId::from("chemistry");
        let mut run = OptimizationRun::pending(
            RunId(500),
            discipline.clone(),
            crate::solver::Strategy::Genetic,
        );
        let long_ago = Utc::now() - chrono::Duration::hours(2);
        run.status = RunStatus::Running;
        run.started_on = Some(long_ago);
        run.heartbeat = Some(long_ago);
        controller.repository().insert(run).unwrap();
        let _held = controller.locks().try_acquire(&discipline, RunId(500)).unwrap();

        let reclaimed = controller.sweep_stale(Duration::from_secs(60)).unwrap();
        assert_eq!(reclaimed, vec![RunId(500)]);
        let run = controller.get(RunId(500)).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.failure_kind, Some(FailureKind::Internal));
        assert!(controller.locks().holder(&discipline).is_none());

        // Already failed: a second sweep finds nothing.
        assert!(controller.sweep_stale(Duration::from_secs(60)).unwrap().is_empty());
    }

    #[test]
    fn test_sweep_skips_recent_heartbeat() {
        let controller = controller();
        let mut run = OptimizationRun::pending(
            RunId(600),
            DisciplineId::from("biology"),
            crate::solver::Strategy::Genetic,
        );
        run.status = RunStatus::Running;
        run.heartbeat = Some(Utc::now());
        controller.repository().insert(run).unwrap();
        assert!(controller.sweep_stale(Duration::from_secs(60)).unwrap().is_empty());
    }

    #[test]
    fn test_progress_observed() {
        let controller = controller();
        let solver = Solver::Genetic(GaConfig::fast().with_max_generations(30).with_saturate(0).with_seed(5));
        let id = controller.start(RunRequest::new("physics", solver)).unwrap();
        let run = controller.wait(id).unwrap();
        assert!(run.status.has_solution());
        assert!(run.heartbeat.is_some());
        let progress = controller.get_progress(id).unwrap();
        assert_eq!(progress.status, run.status);
        assert!(progress.best_score.unwrap() > 0.0);
    }

    #[test]
    fn test_polled_run_deregisters_without_wait() {
        let controller = controller();
        let id = controller
            .start(RunRequest::new("physics", Solver::Greedy(GreedyConfig::default())))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while !controller.get_progress(id).unwrap().status.is_terminal()
            || controller.active_count() > 0
        {
            assert!(std::time::Instant::now() < deadline, "run never deregistered");
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(controller.get(id).unwrap().status, RunStatus::Completed);
        assert!(controller.locks().holder(&DisciplineId::from("physics")).is_none());
        // Nothing left to join.
        assert_eq!(controller.wait(id).unwrap().status, RunStatus::Completed);
    }

    #[test]
    fn test_panic_message_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
