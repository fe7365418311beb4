//! Candidate assignments and their identifiers.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key of a publication in the bibliographic store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationId(pub String);

/// Opaque key of an author in the bibliographic store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AuthorId(pub u64);

/// Scientific discipline, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisciplineId(pub String);

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DisciplineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for DisciplineId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Publication category. Monographs are subject to a stricter per-author cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Article,
    Monograph,
    Chapter,
    Other,
}

/// Stable identity of a candidate: one publication credited to one author.
///
/// Ordering is publication first, then author. Solvers use it as the final
/// tie-break, which is what makes greedy output reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateKey {
    pub publication_id: PublicationId,
    pub author_id: AuthorId,
}

impl CandidateKey {
    pub fn new(publication_id: impl Into<String>, author_id: u64) -> Self {
        Self {
            publication_id: PublicationId(publication_id.into()),
            author_id: AuthorId(author_id),
        }
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.publication_id, self.author_id)
    }
}

/// Inclusive range of publication years under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPeriod {
    pub first_year: i32,
    pub last_year: i32,
}

impl EvaluationPeriod {
    pub fn new(first_year: i32, last_year: i32) -> Self {
        Self {
            first_year,
            last_year,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&year)
    }
}

impl Default for EvaluationPeriod {
    fn default() -> Self {
        Self::new(2022, 2025)
    }
}

impl fmt::Display for EvaluationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first_year, self.last_year)
    }
}

/// Raw candidate row as supplied by the bibliographic store.
///
/// Not validated; convert with [`Candidate::try_from`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub publication_id: PublicationId,
    pub author_id: AuthorId,
    pub discipline_id: DisciplineId,
    pub points: f64,
    pub participation_share: f64,
    pub category: Category,
    pub year: i32,
}

/// One possible (publication, author, discipline) contribution.
///
/// Immutable once built: fields are private and the constructor enforces
/// `points >= 0` and `participation_share ∈ (0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CandidateRecord", into = "CandidateRecord")]
pub struct Candidate {
    key: CandidateKey,
    discipline_id: DisciplineId,
    points: f64,
    participation_share: f64,
    category: Category,
    year: i32,
}

impl Candidate {
    /// Builds a validated candidate.
    pub fn new(
        key: CandidateKey,
        discipline_id: DisciplineId,
        points: f64,
        participation_share: f64,
        category: Category,
        year: i32,
    ) -> Result<Self, ModelError> {
        if !points.is_finite() || points < 0.0 {
            return Err(ModelError::InvalidPoints { key, points });
        }
        if !participation_share.is_finite()
            || participation_share <= 0.0
            || participation_share > 1.0
        {
            return Err(ModelError::InvalidShare {
                key,
                share: participation_share,
            });
        }
        Ok(Self {
            key,
            discipline_id,
            points,
            participation_share,
            category,
            year,
        })
    }

    pub fn key(&self) -> &CandidateKey {
        &self.key
    }

    pub fn publication_id(&self) -> &PublicationId {
        &self.key.publication_id
    }

    pub fn author_id(&self) -> AuthorId {
        self.key.author_id
    }

    pub fn discipline_id(&self) -> &DisciplineId {
        &self.discipline_id
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn participation_share(&self) -> f64 {
        self.participation_share
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_monograph(&self) -> bool {
        self.category == Category::Monograph
    }

    /// Contribution to the objective: `points * participation_share`.
    pub fn weighted_points(&self) -> f64 {
        self.points * self.participation_share
    }
}

impl TryFrom<CandidateRecord> for Candidate {
    type Error = ModelError;

    fn try_from(record: CandidateRecord) -> Result<Self, Self::Error> {
        Candidate::new(
            CandidateKey {
                publication_id: record.publication_id,
                author_id: record.author_id,
            },
            record.discipline_id,
            record.points,
            record.participation_share,
            record.category,
            record.year,
        )
    }
}

impl From<Candidate> for CandidateRecord {
    fn from(candidate: Candidate) -> Self {
        CandidateRecord {
            publication_id: candidate.key.publication_id,
            author_id: candidate.key.author_id,
            discipline_id: candidate.discipline_id,
            points: candidate.points,
            participation_share: candidate.participation_share,
            category: candidate.category,
            year: candidate.year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(points: f64, share: f64) -> Result<Candidate, ModelError> {
        Candidate::new(
            CandidateKey::new("p1", 1),
            DisciplineId::from("physics"),
            points,
            share,
            Category::Article,
            2023,
        )
    }

    #[test]
    fn test_weighted_points() {
        let c = build(140.0, 0.5).unwrap();
        assert!((c.weighted_points() - 70.0).abs() < 1e-12);
        assert!(!c.is_monograph());
    }

    #[test]
    fn test_rejects_negative_points() {
        assert!(matches!(
            build(-1.0, 0.5),
            Err(ModelError::InvalidPoints { .. })
        ));
        assert!(matches!(
            build(f64::NAN, 0.5),
            Err(ModelError::InvalidPoints { .. })
        ));
    }

    #[test]
    fn test_rejects_share_out_of_range() {
        assert!(matches!(build(10.0, 0.0), Err(ModelError::InvalidShare { .. })));
        assert!(matches!(build(10.0, 1.5), Err(ModelError::InvalidShare { .. })));
        assert!(build(10.0, 1.0).is_ok());
    }

    #[test]
    fn test_key_ordering_is_publication_then_author() {
        let a = CandidateKey::new("a", 9);
        let b = CandidateKey::new("b", 1);
        let a2 = CandidateKey::new("a", 10);
        assert!(a < b);
        assert!(a < a2);
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"{"publication_id":"p","author_id":3,"discipline_id":"law",
            "points":-5.0,"participation_share":1.0,"category":"ARTICLE","year":2022}"#;
        assert!(serde_json::from_str::<Candidate>(json).is_err());

        let json = json.replace("-5.0", "5.0");
        let c: Candidate = serde_json::from_str(&json).unwrap();
        assert_eq!(c.author_id(), AuthorId(3));
        assert_eq!(c.category(), Category::Article);
    }

    #[test]
    fn test_period_contains() {
        let period = EvaluationPeriod::default();
        assert!(period.contains(2022));
        assert!(period.contains(2025));
        assert!(!period.contains(2021));
        assert_eq!(period.to_string(), "2022-2025");
    }
}
