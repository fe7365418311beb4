//! Per-discipline evaluation rules.

use super::candidate::AuthorId;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Participation ceilings for a single author.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthorCaps {
    /// Ceiling across all categories.
    pub total: f64,
    /// Ceiling on the MONOGRAPH subset. Never above `total`.
    pub monograph: f64,
}

impl AuthorCaps {
    pub fn new(total: f64, monograph: f64) -> Self {
        Self { total, monograph }
    }

    fn validate(&self, scope: impl Fn() -> String) -> Result<(), ModelError> {
        let invalid = |reason: &str| ModelError::InvalidCaps {
            scope: scope(),
            reason: reason.to_string(),
        };
        if !self.total.is_finite() || self.total < 0.0 {
            return Err(invalid("total cap must be finite and non-negative"));
        }
        if !self.monograph.is_finite() || self.monograph < 0.0 {
            return Err(invalid("monograph cap must be finite and non-negative"));
        }
        if self.monograph > self.total {
            return Err(invalid("monograph cap exceeds total cap"));
        }
        Ok(())
    }
}

/// Rules a [`Solution`](super::Solution) must satisfy for one discipline.
///
/// # Examples
///
/// ```
/// use slot_optim::model::{AuthorCaps, AuthorId, ConstraintSet};
///
/// let rules = ConstraintSet::new(30.0, 4.0, 2.0)
///     .unwrap()
///     .with_author_override(AuthorId(7), AuthorCaps::new(2.5, 1.0))
///     .unwrap();
///
/// assert_eq!(rules.caps_for(AuthorId(1)), AuthorCaps::new(4.0, 2.0));
/// assert_eq!(rules.caps_for(AuthorId(7)), AuthorCaps::new(2.5, 1.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Maximum total participation units counted for the discipline.
    pub global_quota_n: f64,
    /// Default per-author ceiling across all categories.
    pub author_max_participation: f64,
    /// Default per-author ceiling on monographs.
    pub author_max_monograph_participation: f64,
    /// Author-specific ceilings replacing the defaults.
    #[serde(default)]
    pub author_overrides: BTreeMap<AuthorId, AuthorCaps>,
}

impl ConstraintSet {
    /// Regulatory ceiling on an author's total participation.
    pub const DEFAULT_AUTHOR_CAP: f64 = 4.0;
    /// Regulatory ceiling on an author's monograph participation.
    pub const DEFAULT_MONOGRAPH_CAP: f64 = 2.0;

    pub fn new(
        global_quota_n: f64,
        author_max_participation: f64,
        author_max_monograph_participation: f64,
    ) -> Result<Self, ModelError> {
        let set = Self {
            global_quota_n,
            author_max_participation,
            author_max_monograph_participation,
            author_overrides: BTreeMap::new(),
        };
        set.validate()?;
        Ok(set)
    }

    /// Adds an author-specific cap.
    pub fn with_author_override(
        mut self,
        author: AuthorId,
        caps: AuthorCaps,
    ) -> Result<Self, ModelError> {
        caps.validate(|| format!("author {author}"))?;
        self.author_overrides.insert(author, caps);
        Ok(self)
    }

    /// Caps in force for `author`.
    pub fn caps_for(&self, author: AuthorId) -> AuthorCaps {
        self.author_overrides
            .get(&author)
            .copied()
            .unwrap_or(AuthorCaps {
                total: self.author_max_participation,
                monograph: self.author_max_monograph_participation,
            })
    }

    /// Checks the invariants of the rule set itself.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.global_quota_n.is_finite() || self.global_quota_n < 0.0 {
            return Err(ModelError::InvalidQuota(self.global_quota_n));
        }
        AuthorCaps::new(
            self.author_max_participation,
            self.author_max_monograph_participation,
        )
        .validate(|| "discipline defaults".to_string())?;
        for (author, caps) in &self.author_overrides {
            caps.validate(|| format!("author {author}"))?;
        }
        Ok(())
    }
}
