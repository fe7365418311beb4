//! Evaluation slot optimization engine.
//!
//! For one scientific discipline and evaluation period, selects the subset
//! of (publication, author) assignments that maximizes the discipline's
//! evaluation score while respecting a global participation quota N and
//! per-author participation caps, including a stricter monograph sub-cap.
//!
//! Provides three interchangeable strategies:
//!
//! - **Greedy** ([`greedy`]): deterministic capacity-aware fill in density
//!   order; the baseline and the seed of the other two.
//! - **Genetic Algorithm** ([`ga`]): boolean-vector GA with feasibility
//!   repair, elitism and saturation-based early stopping.
//! - **Randomized restart** ([`restart`]): repeated greedy passes over
//!   perturbed orders, keeping the best.
//!
//! Around them:
//!
//! - [`pool`] builds the candidate pool and its constraints from a
//!   bibliographic store
//! - [`constraint`] decides feasibility and resolves pins
//! - [`interactive`] re-solves under operator pins, warm-starting from the
//!   previous answer
//! - [`run`] executes solves in the background with per-discipline locking,
//!   cooperative cancellation and progress tracking
//! - [`report`] emits the JSON result artifact
//!
//! # Architecture
//!
//! Solvers are pure functions of a [`pool::CandidatePool`], a pin list and
//! a [`solver::SolveContext`]; they never touch I/O. Persistence, locking
//! and threads live in [`run`]; argument parsing and process exit codes in
//! [`cli`].

pub mod cli;
pub mod config;
pub mod constraint;
pub mod error;
pub mod ga;
pub mod greedy;
pub mod interactive;
pub mod model;
pub mod objective;
pub mod pool;
pub mod random;
pub mod report;
pub mod restart;
pub mod run;
pub mod solver;
pub mod telemetry;
