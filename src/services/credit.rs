use std::collections::BTreeMap;

use crate::ability::update_ability;
use crate::config::MasteryConfig;
use crate::models::{
    AttemptFailure, AttemptInput, AttemptOutcome, ConceptUpdate, KnowledgeSkillMapping,
    MasteryWrite,
};
use crate::services::MasteryError;
use crate::store::{MappingLookup, MasteryStore, StoreError, StoreResult};

/// Fans one attempt's correctness out to every concept its item maps to.
///
/// Each concept moves with `learning_rate * knowledge_weight`, where the
/// weight is summed over all mapping rows for that concept. Concepts are
/// processed in concept-id order; each write is its own atomic upsert. On a
/// store failure the fan-out stops, already committed updates are still
/// reported and `success` is false.
pub async fn apply_attempt<S, M>(
    store: &S,
    lookup: &M,
    config: &MasteryConfig,
    input: &AttemptInput,
) -> Result<AttemptOutcome, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    validate_learner(&input.learner_id)?;
    validate_difficulty(input.item_difficulty)?;
    validate_learning_rate(config.learning_rate)?;

    let mappings = resolve_mappings(lookup, input).await?;
    if mappings.is_empty() {
        tracing::warn!(
            learner_id = %input.learner_id,
            item_id = ?input.item_id,
            parent_item_id = ?input.parent_item_id,
            "attempt has no knowledge mapping"
        );
        return Ok(AttemptOutcome::no_mapping());
    }

    let mut outcome = AttemptOutcome {
        success: true,
        updates: Vec::new(),
        skipped_concepts: Vec::new(),
        failure: None,
    };

    for (concept_id, weight) in aggregate_weights(&mappings) {
        if !weight.is_finite() || weight < 0.0 {
            tracing::warn!(%concept_id, weight, "invalid knowledge weight, concept skipped");
            outcome.skipped_concepts.push(concept_id);
            continue;
        }

        let result = match lookup.concept(&concept_id).await {
            Ok(Some(_)) => {
                credit_concept(
                    store,
                    &input.learner_id,
                    &concept_id,
                    weight,
                    config.learning_rate,
                    input.correct,
                    input.item_difficulty,
                )
                .await
            }
            Ok(None) => {
                tracing::warn!(%concept_id, "mapped concept has no metadata, credit dropped");
                outcome.skipped_concepts.push(concept_id);
                continue;
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(update) => outcome.updates.push(update),
            Err(err) => {
                tracing::error!(
                    learner_id = %input.learner_id,
                    %concept_id,
                    error = %err,
                    committed = outcome.updates.len(),
                    "mastery write failed, stopping fan-out"
                );
                outcome.success = false;
                outcome.failure = Some(AttemptFailure::Persistence {
                    concept_id,
                    message: err.to_string(),
                });
                return Ok(outcome);
            }
        }
    }

    if outcome.updates.is_empty() {
        // every mapped concept was unusable
        outcome.success = false;
        outcome.failure = Some(AttemptFailure::NoMapping);
    }

    Ok(outcome)
}

/// Applies attempts in order and returns one result per input, index-aligned.
///
/// A rejected or failed attempt does not stop the ones after it, and the
/// outcomes of attempts committed before it are still reported.
pub async fn apply_attempts<S, M>(
    store: &S,
    lookup: &M,
    config: &MasteryConfig,
    inputs: &[AttemptInput],
) -> Vec<Result<AttemptOutcome, MasteryError>>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    let mut results = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let result = apply_attempt(store, lookup, config, input).await;
        if let Err(err) = &result {
            tracing::warn!(index, learner_id = %input.learner_id, error = %err, "attempt in batch rejected");
        }
        results.push(result);
    }
    results
}

/// Single-concept path for items without mappings: implicit weight 1.
pub async fn update_after_attempt<S>(
    store: &S,
    config: &MasteryConfig,
    learner_id: &str,
    concept_id: &str,
    correct: bool,
    item_difficulty: f64,
) -> Result<f64, MasteryError>
where
    S: MasteryStore + ?Sized,
{
    validate_learner(learner_id)?;
    validate_difficulty(item_difficulty)?;
    validate_learning_rate(config.learning_rate)?;

    let update = credit_concept(
        store,
        learner_id,
        concept_id,
        1.0,
        config.learning_rate,
        correct,
        item_difficulty,
    )
    .await?;
    Ok(update.new_ability)
}

/// Sums knowledge weight per distinct concept.
pub fn aggregate_weights(mappings: &[KnowledgeSkillMapping]) -> BTreeMap<String, f64> {
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    for mapping in mappings {
        *weights.entry(mapping.concept_id.clone()).or_insert(0.0) += mapping.knowledge_weight;
    }
    weights
}

async fn resolve_mappings<M>(
    lookup: &M,
    input: &AttemptInput,
) -> StoreResult<Vec<KnowledgeSkillMapping>>
where
    M: MappingLookup + ?Sized,
{
    let item_id = non_empty(input.item_id.as_deref());
    let explicit_parent = non_empty(input.parent_item_id.as_deref());
    if item_id.is_none() && explicit_parent.is_none() {
        return Ok(Vec::new());
    }

    let item = match item_id {
        Some(id) => lookup.item(id).await?,
        None => None,
    };

    let parent_item_id = explicit_parent
        .map(str::to_string)
        .or_else(|| item.as_ref().and_then(|i| i.parent_item_id.clone()));

    let mappings = lookup
        .mappings_for(item_id, parent_item_id.as_deref())
        .await?;
    if !mappings.is_empty() {
        return Ok(mappings);
    }

    match (item_id, item.and_then(|i| i.concept_id)) {
        (Some(item_id), Some(concept_id)) => {
            Ok(vec![KnowledgeSkillMapping::implicit(item_id, &concept_id)])
        }
        _ => Ok(Vec::new()),
    }
}

async fn credit_concept<S>(
    store: &S,
    learner_id: &str,
    concept_id: &str,
    weight: f64,
    base_rate: f64,
    correct: bool,
    difficulty: f64,
) -> Result<ConceptUpdate, StoreError>
where
    S: MasteryStore + ?Sized,
{
    let current = store.load_or_initial(learner_id, concept_id).await?;
    let new_ability = update_ability(current.ability, correct, difficulty, base_rate * weight);

    store
        .upsert(&MasteryWrite {
            learner_id: learner_id.to_string(),
            concept_id: concept_id.to_string(),
            ability: new_ability,
            correct,
            updated_at: chrono::Utc::now().timestamp_millis(),
        })
        .await?;

    tracing::debug!(
        learner_id,
        concept_id,
        weight,
        old_ability = current.ability,
        new_ability,
        "concept mastery updated"
    );

    Ok(ConceptUpdate {
        concept_id: concept_id.to_string(),
        old_ability: current.ability,
        new_ability,
        weight,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_learner(learner_id: &str) -> Result<(), MasteryError> {
    if learner_id.trim().is_empty() {
        return Err(MasteryError::InvalidInput("learner id is empty".to_string()));
    }
    Ok(())
}

fn validate_difficulty(difficulty: f64) -> Result<(), MasteryError> {
    if !difficulty.is_finite() {
        return Err(MasteryError::InvalidInput(format!(
            "item difficulty must be finite, got {difficulty}"
        )));
    }
    Ok(())
}

fn validate_learning_rate(rate: f64) -> Result<(), MasteryError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(MasteryError::InvalidInput(format!(
            "learning rate must be finite and non-negative, got {rate}"
        )));
    }
    Ok(())
}
