use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Concept, MasteryRecord};
use crate::services::{subject_mastery, MasteryError};
use crate::store::{MappingLookup, MasteryStore};

/// Offset that keeps the priority denominator positive for typical abilities.
const PRIORITY_ABILITY_OFFSET: f64 = 100.0;
const PRIORITY_SCALE: f64 = 100.0;

/// Which ordering a call site wants. The two are not interchangeable: they
/// disagree whenever importance weights differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// Importance-scaled priority, highest first.
    ImportanceWeighted,
    /// Lowest raw ability first.
    RawAbility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakConcept {
    pub concept_id: String,
    pub name: String,
    pub ability: f64,
    pub attempts: i64,
    pub accuracy: f64,
    pub importance_weight: f64,
    pub priority_score: f64,
}

impl WeakConcept {
    fn from_parts(concept: &Concept, record: &MasteryRecord) -> Self {
        Self {
            concept_id: concept.id.clone(),
            name: concept.name.clone(),
            ability: record.ability,
            attempts: record.attempts,
            accuracy: record.accuracy(),
            importance_weight: concept.importance_weight,
            priority_score: priority_score(concept.importance_weight, record.ability),
        }
    }
}

pub fn priority_score(importance_weight: f64, ability: f64) -> f64 {
    (importance_weight * PRIORITY_SCALE) / (ability + PRIORITY_ABILITY_OFFSET).max(1.0)
}

/// Highest priority first; ties fall back to concept id.
pub fn sort_by_priority(concepts: &mut [WeakConcept]) {
    concepts.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| a.concept_id.cmp(&b.concept_id))
    });
}

/// Lowest ability first; ties fall back to concept id.
pub fn sort_by_raw_ability(concepts: &mut [WeakConcept]) {
    concepts.sort_by(|a, b| match a.ability.total_cmp(&b.ability) {
        Ordering::Equal => a.concept_id.cmp(&b.concept_id),
        other => other,
    });
}

/// Concepts of `subject` the learner most needs to practice, by importance-weighted priority.
///
/// A learner with no rows in the subject gets an empty list.
pub async fn rank_weak_concepts<S, M>(
    store: &S,
    lookup: &M,
    learner_id: &str,
    subject: &str,
    limit: usize,
) -> Result<Vec<WeakConcept>, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    rank(store, lookup, RankingStrategy::ImportanceWeighted, learner_id, subject, limit).await
}

/// Concepts of `subject` ordered purely by ascending ability.
pub async fn rank_by_raw_ability<S, M>(
    store: &S,
    lookup: &M,
    learner_id: &str,
    subject: &str,
    limit: usize,
) -> Result<Vec<WeakConcept>, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    rank(store, lookup, RankingStrategy::RawAbility, learner_id, subject, limit).await
}

pub async fn rank<S, M>(
    store: &S,
    lookup: &M,
    strategy: RankingStrategy,
    learner_id: &str,
    subject: &str,
    limit: usize,
) -> Result<Vec<WeakConcept>, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    let rows = subject_mastery(store, lookup, learner_id, subject).await?;
    if rows.is_empty() {
        tracing::debug!(learner_id, subject, "no mastery rows, nothing to rank");
        return Ok(Vec::new());
    }

    let mut concepts: Vec<WeakConcept> = rows
        .iter()
        .map(|(concept, record)| WeakConcept::from_parts(concept, record))
        .collect();

    match strategy {
        RankingStrategy::ImportanceWeighted => sort_by_priority(&mut concepts),
        RankingStrategy::RawAbility => sort_by_raw_ability(&mut concepts),
    }
    concepts.truncate(limit);
    Ok(concepts)
}
