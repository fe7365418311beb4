//! Data model of the slot optimization problem.
//!
//! - [`Candidate`]: one (publication, author) contribution with its points,
//!   participation share and category
//! - [`ConstraintSet`]: the global quota N and per-author caps
//! - [`Pin`] / [`PinSet`]: operator overrides forcing inclusion or exclusion
//! - [`Solution`]: a selected subset with its objective value

mod candidate;
mod constraints;
mod pin;
mod solution;

pub use candidate::{
    AuthorId, Candidate, CandidateKey, CandidateRecord, Category, DisciplineId, EvaluationPeriod,
    PublicationId,
};
pub use constraints::{AuthorCaps, ConstraintSet};
pub use pin::{Pin, PinSet, PinState};
pub use solution::{AuthorUsage, Solution};
