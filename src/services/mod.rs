pub mod credit;
pub mod overview;
pub mod ranking;

use thiserror::Error;

use crate::models::{Concept, MasteryRecord};
use crate::store::{MappingLookup, MasteryStore, StoreError};

#[derive(Debug, Error)]
pub enum MasteryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Every concept of `subject` the learner has a mastery row for, ordered by concept id.
pub(crate) async fn subject_mastery<S, M>(
    store: &S,
    lookup: &M,
    learner_id: &str,
    subject: &str,
) -> Result<Vec<(Concept, MasteryRecord)>, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    let concepts = lookup.concepts_for_subject(subject).await?;
    if concepts.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = concepts.iter().map(|c| c.id.clone()).collect();
    let mut records = store.list_for_concepts(learner_id, &ids).await?;
    records.sort_by(|a, b| a.concept_id.cmp(&b.concept_id));

    let mut out = Vec::with_capacity(records.len());
    for concept in concepts {
        if let Ok(pos) = records.binary_search_by(|r| r.concept_id.cmp(&concept.id)) {
            out.push((concept, records[pos].clone()));
        }
    }
    out.sort_by(|a, b| a.0.id.cmp(&b.0.id));
    Ok(out)
}
