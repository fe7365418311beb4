//! Operator overrides forcing a candidate in or out of the selection.

use super::candidate::CandidateKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusion state forced by a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PinState {
    ForcedIn,
    ForcedOut,
}

impl PinState {
    pub fn flipped(self) -> Self {
        match self {
            PinState::ForcedIn => PinState::ForcedOut,
            PinState::ForcedOut => PinState::ForcedIn,
        }
    }
}

/// A single operator override as supplied, possibly contradicting others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub candidate: CandidateKey,
    pub state: PinState,
}

impl Pin {
    pub fn forced_in(candidate: CandidateKey) -> Self {
        Self {
            candidate,
            state: PinState::ForcedIn,
        }
    }

    pub fn forced_out(candidate: CandidateKey) -> Self {
        Self {
            candidate,
            state: PinState::ForcedOut,
        }
    }
}

/// Resolved, non-contradictory pins: at most one state per candidate.
///
/// Built by [`check_pins`](crate::constraint::check_pins) or directly when the
/// caller already knows its pins are consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Pin>", into = "Vec<Pin>")]
pub struct PinSet {
    pins: BTreeMap<CandidateKey, PinState>,
}

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CandidateKey) -> Option<PinState> {
        self.pins.get(key).copied()
    }

    pub fn set(&mut self, key: CandidateKey, state: PinState) {
        self.pins.insert(key, state);
    }

    pub fn clear(&mut self, key: &CandidateKey) -> Option<PinState> {
        self.pins.remove(key)
    }

    /// Flips a pin: unpinned becomes FORCED_IN, pinned states swap.
    ///
    /// Returns the new state.
    pub fn toggle(&mut self, key: CandidateKey) -> PinState {
        let next = match self.pins.get(&key) {
            None => PinState::ForcedIn,
            Some(state) => state.flipped(),
        };
        self.pins.insert(key, next);
        next
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateKey, PinState)> {
        self.pins.iter().map(|(k, s)| (k, *s))
    }

    pub fn forced_in(&self) -> impl Iterator<Item = &CandidateKey> {
        self.iter()
            .filter(|(_, s)| *s == PinState::ForcedIn)
            .map(|(k, _)| k)
    }

    pub fn forced_out(&self) -> impl Iterator<Item = &CandidateKey> {
        self.iter()
            .filter(|(_, s)| *s == PinState::ForcedOut)
            .map(|(k, _)| k)
    }

    /// Pins in canonical order, for persistence.
    pub fn to_pins(&self) -> Vec<Pin> {
        self.iter()
            .map(|(candidate, state)| Pin {
                candidate: candidate.clone(),
                state,
            })
            .collect()
    }
}

impl From<Vec<Pin>> for PinSet {
    /// Later pins on the same candidate replace earlier ones.
    fn from(pins: Vec<Pin>) -> Self {
        let mut set = PinSet::new();
        for pin in pins {
            set.set(pin.candidate, pin.state);
        }
        set
    }
}

impl From<PinSet> for Vec<Pin> {
    fn from(set: PinSet) -> Self {
        set.to_pins()
    }
}
