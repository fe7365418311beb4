//! Constraint model: feasibility of a selection against a [`ConstraintSet`].
//!
//! Violations are ordinary values. [`validate`] only returns `Err` for
//! malformed input (duplicate assignments, an invalid rule set); a selection
//! that breaks a cap yields `Ok(Feasibility::Violation(..))`.
//!
//! [`CapacityTracker`] is the incremental form of the same rules, used by the
//! solvers to decide admission and repair without rescanning a selection.

use crate::error::ModelError;
use crate::model::{
    AuthorId, AuthorUsage, Candidate, CandidateKey, ConstraintSet, Pin, PinSet, PinState, Solution,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Tolerance for comparing accumulated participation against caps.
pub const CAPACITY_EPSILON: f64 = 1e-9;

/// Which rule a selection breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    GlobalQuotaExceeded,
    AuthorCapExceeded,
    AuthorMonographCapExceeded,
    PinConflict,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::GlobalQuotaExceeded => "GLOBAL_QUOTA_EXCEEDED",
            ViolationKind::AuthorCapExceeded => "AUTHOR_CAP_EXCEEDED",
            ViolationKind::AuthorMonographCapExceeded => "AUTHOR_MONOGRAPH_CAP_EXCEEDED",
            ViolationKind::PinConflict => "PIN_CONFLICT",
        };
        f.write_str(name)
    }
}

/// A broken rule with the candidates involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub detail: String,
    pub candidates: Vec<CandidateKey>,
}

impl Violation {
    pub fn new(kind: ViolationKind, detail: impl Into<String>, candidates: Vec<CandidateKey>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            candidates,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)?;
        if !self.candidates.is_empty() {
            let keys: Vec<String> = self.candidates.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", keys.join(", "))?;
        }
        Ok(())
    }
}

/// Result of checking a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feasibility {
    Ok,
    Violation(Violation),
}

impl Feasibility {
    pub fn is_ok(&self) -> bool {
        matches!(self, Feasibility::Ok)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Feasibility::Ok => None,
            Feasibility::Violation(v) => Some(v),
        }
    }
}

/// Running participation totals checked against a rule set.
#[derive(Debug, Clone)]
pub struct CapacityTracker<'a> {
    constraints: &'a ConstraintSet,
    global_used: f64,
    authors: HashMap<AuthorId, AuthorUsage>,
}

impl<'a> CapacityTracker<'a> {
    pub fn new(constraints: &'a ConstraintSet) -> Self {
        Self {
            constraints,
            global_used: 0.0,
            authors: HashMap::new(),
        }
    }

    pub fn constraints(&self) -> &ConstraintSet {
        self.constraints
    }

    pub fn global_used(&self) -> f64 {
        self.global_used
    }

    /// Participation units left under the global quota.
    pub fn remaining(&self) -> f64 {
        (self.constraints.global_quota_n - self.global_used).max(0.0)
    }

    pub fn usage(&self, author: AuthorId) -> AuthorUsage {
        self.authors.get(&author).copied().unwrap_or_default()
    }

    /// The rule that admitting `candidate` would break, if any.
    pub fn check(&self, candidate: &Candidate) -> Option<ViolationKind> {
        let share = candidate.participation_share();
        if self.global_used + share > self.constraints.global_quota_n + CAPACITY_EPSILON {
            return Some(ViolationKind::GlobalQuotaExceeded);
        }
        let caps = self.constraints.caps_for(candidate.author_id());
        let usage = self.usage(candidate.author_id());
        if usage.total + share > caps.total + CAPACITY_EPSILON {
            return Some(ViolationKind::AuthorCapExceeded);
        }
        if candidate.is_monograph() && usage.monograph + share > caps.monograph + CAPACITY_EPSILON
        {
            return Some(ViolationKind::AuthorMonographCapExceeded);
        }
        None
    }

    pub fn can_admit(&self, candidate: &Candidate) -> bool {
        self.check(candidate).is_none()
    }

    /// Charges `candidate` without checking.
    pub fn admit(&mut self, candidate: &Candidate) {
        self.global_used += candidate.participation_share();
        self.authors
            .entry(candidate.author_id())
            .or_default()
            .add(candidate);
    }

    /// Charges `candidate` only if it fits. Returns whether it was admitted.
    pub fn try_admit(&mut self, candidate: &Candidate) -> bool {
        if self.can_admit(candidate) {
            self.admit(candidate);
            true
        } else {
            false
        }
    }

    pub fn release(&mut self, candidate: &Candidate) {
        self.global_used -= candidate.participation_share();
        if let Some(usage) = self.authors.get_mut(&candidate.author_id()) {
            usage.remove(candidate);
        }
    }

    pub fn global_exceeded(&self) -> bool {
        self.global_used > self.constraints.global_quota_n + CAPACITY_EPSILON
    }

    pub fn author_exceeded(&self, author: AuthorId) -> bool {
        self.usage(author).total > self.constraints.caps_for(author).total + CAPACITY_EPSILON
    }

    pub fn author_monograph_exceeded(&self, author: AuthorId) -> bool {
        self.usage(author).monograph
            > self.constraints.caps_for(author).monograph + CAPACITY_EPSILON
    }

    /// Whether the current totals satisfy every rule.
    pub fn is_feasible(&self) -> bool {
        !self.global_exceeded()
            && self
                .authors
                .keys()
                .all(|&a| !self.author_exceeded(a) && !self.author_monograph_exceeded(a))
    }

    /// First broken rule over the charged candidates: the global quota, then
    /// authors in ascending id order.
    pub fn first_violation(&self, charged: &[&Candidate]) -> Option<Violation> {
        if self.global_exceeded() {
            return Some(Violation::new(
                ViolationKind::GlobalQuotaExceeded,
                format!(
                    "participation {:.4} exceeds global quota {:.4}",
                    self.global_used, self.constraints.global_quota_n
                ),
                Vec::new(),
            ));
        }
        let mut authors: Vec<AuthorId> = self.authors.keys().copied().collect();
        authors.sort_unstable();
        for author in authors {
            let usage = self.usage(author);
            let caps = self.constraints.caps_for(author);
            let keys_of = |monographs_only: bool| -> Vec<CandidateKey> {
                charged
                    .iter()
                    .filter(|c| c.author_id() == author && (!monographs_only || c.is_monograph()))
                    .map(|c| c.key().clone())
                    .collect()
            };
            if self.author_exceeded(author) {
                return Some(Violation::new(
                    ViolationKind::AuthorCapExceeded,
                    format!(
                        "author {author} uses {:.4} of cap {:.4}",
                        usage.total, caps.total
                    ),
                    keys_of(false),
                ));
            }
            if self.author_monograph_exceeded(author) {
                return Some(Violation::new(
                    ViolationKind::AuthorMonographCapExceeded,
                    format!(
                        "author {author} uses {:.4} monograph participation of cap {:.4}",
                        usage.monograph, caps.monograph
                    ),
                    keys_of(true),
                ));
            }
        }
        None
    }
}

/// Resolves raw pins against the candidate pool.
///
/// Fails with a [`ViolationKind::PinConflict`] when a candidate is pinned
/// both in and out, when a pin names a candidate outside the pool, or when
/// the FORCED_IN set alone already breaks a rule.
pub fn check_pins(
    candidates: &[Candidate],
    constraints: &ConstraintSet,
    pins: &[Pin],
) -> Result<PinSet, Violation> {
    let mut states: BTreeMap<&CandidateKey, PinState> = BTreeMap::new();
    let mut contradictory: Vec<CandidateKey> = Vec::new();
    for pin in pins {
        match states.get(&pin.candidate) {
            Some(existing) if *existing != pin.state => {
                if !contradictory.contains(&pin.candidate) {
                    contradictory.push(pin.candidate.clone());
                }
            }
            _ => {
                states.insert(&pin.candidate, pin.state);
            }
        }
    }
    if !contradictory.is_empty() {
        contradictory.sort();
        return Err(Violation::new(
            ViolationKind::PinConflict,
            "candidates pinned both FORCED_IN and FORCED_OUT",
            contradictory,
        ));
    }

    let by_key: HashMap<&CandidateKey, &Candidate> =
        candidates.iter().map(|c| (c.key(), c)).collect();
    let unknown: Vec<CandidateKey> = states
        .keys()
        .filter(|k| !by_key.contains_key(*k))
        .map(|k| (*k).clone())
        .collect();
    if !unknown.is_empty() {
        return Err(Violation::new(
            ViolationKind::PinConflict,
            "pins reference candidates outside the pool",
            unknown,
        ));
    }

    let forced_in: Vec<&Candidate> = states
        .iter()
        .filter(|(_, s)| **s == PinState::ForcedIn)
        .map(|(k, _)| by_key[*k])
        .collect();
    forced_in_violation(constraints, &forced_in).map_or(Ok(()), Err)?;

    let mut set = PinSet::new();
    for (key, state) in states {
        set.set(key.clone(), state);
    }
    Ok(set)
}

/// PIN_CONFLICT if the FORCED_IN candidates alone break a rule.
fn forced_in_violation(constraints: &ConstraintSet, forced_in: &[&Candidate]) -> Option<Violation> {
    let mut tracker = CapacityTracker::new(constraints);
    for c in forced_in {
        tracker.admit(c);
    }
    tracker.first_violation(forced_in).map(|v| {
        Violation::new(
            ViolationKind::PinConflict,
            format!("FORCED_IN pins alone are infeasible ({}: {})", v.kind, v.detail),
            if v.candidates.is_empty() {
                forced_in.iter().map(|c| c.key().clone()).collect()
            } else {
                v.candidates
            },
        )
    })
}

/// Checks `solution` against `constraints` and `pins`.
///
/// Pin problems are reported first, then the global quota, then per-author
/// caps in ascending author order.
pub fn validate(
    solution: &Solution,
    constraints: &ConstraintSet,
    pins: &[Pin],
) -> Result<Feasibility, ModelError> {
    constraints.validate()?;

    let selected = solution.selected();
    for pair in selected.windows(2) {
        if pair[0].key() == pair[1].key() {
            return Err(ModelError::DuplicateAssignment(pair[0].key().clone()));
        }
    }

    let mut states: BTreeMap<&CandidateKey, PinState> = BTreeMap::new();
    let mut contradictory = Vec::new();
    for pin in pins {
        if let Some(existing) = states.insert(&pin.candidate, pin.state) {
            if existing != pin.state && !contradictory.contains(&pin.candidate) {
                contradictory.push(pin.candidate.clone());
            }
        }
    }
    if !contradictory.is_empty() {
        contradictory.sort();
        return Ok(Feasibility::Violation(Violation::new(
            ViolationKind::PinConflict,
            "candidates pinned both FORCED_IN and FORCED_OUT",
            contradictory,
        )));
    }

    let missing: Vec<CandidateKey> = states
        .iter()
        .filter(|(k, s)| **s == PinState::ForcedIn && !solution.contains(k))
        .map(|(k, _)| (*k).clone())
        .collect();
    if !missing.is_empty() {
        return Ok(Feasibility::Violation(Violation::new(
            ViolationKind::PinConflict,
            "FORCED_IN candidates missing from the selection",
            missing,
        )));
    }
    let present: Vec<CandidateKey> = states
        .iter()
        .filter(|(k, s)| **s == PinState::ForcedOut && solution.contains(k))
        .map(|(k, _)| (*k).clone())
        .collect();
    if !present.is_empty() {
        return Ok(Feasibility::Violation(Violation::new(
            ViolationKind::PinConflict,
            "FORCED_OUT candidates present in the selection",
            present,
        )));
    }

    let forced_in: Vec<&Candidate> = selected
        .iter()
        .filter(|c| states.get(c.key()) == Some(&PinState::ForcedIn))
        .collect();
    if let Some(v) = forced_in_violation(constraints, &forced_in) {
        return Ok(Feasibility::Violation(v));
    }

    let mut tracker = CapacityTracker::new(constraints);
    for c in selected {
        tracker.admit(c);
    }
    let charged: Vec<&Candidate> = selected.iter().collect();
    Ok(match tracker.first_violation(&charged) {
        Some(v) => Feasibility::Violation(v),
        None => Feasibility::Ok,
    })
}
