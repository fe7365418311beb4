//! Cancellation and progress plumbing shared by every strategy.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag.
///
/// Cloning shares the flag. Solvers poll it at iteration boundaries only, so
/// a cancelled solve still returns the best feasible solution found.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing flag.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One progress tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Completion in `[0, 100]`.
    pub percent: f64,
    /// Best objective value found so far.
    pub best_score: f64,
    /// Generation or restart just completed.
    pub iteration: usize,
}

/// Receives progress ticks from a running solver.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn on_progress(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// Per-solve environment: cancellation and an optional observer.
#[derive(Clone, Default)]
pub struct SolveContext {
    cancel: CancelToken,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl fmt::Debug for SolveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolveContext")
            .field("cancel", &self.cancel)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl SolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn report(&self, percent: f64, best_score: f64, iteration: usize) {
        if let Some(observer) = &self.observer {
            observer.on_progress(ProgressUpdate {
                percent: percent.clamp(0.0, 100.0),
                best_score,
                iteration,
            });
        }
    }
}
