use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Concept, KnowledgeSkillMapping, MasteryRecord, MasteryStatus, ParentItem};
use crate::services::credit::aggregate_weights;
use crate::services::{subject_mastery, MasteryError};
use crate::store::{MappingLookup, MasteryStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryOverview {
    pub subject: String,
    pub total_concepts: usize,
    pub weighted_mean_ability: f64,
    pub total_attempts: i64,
    pub total_correct: i64,
    pub overall_accuracy: f64,
    /// Strongest first.
    pub strong_concepts: Vec<String>,
    /// Weakest first.
    pub weak_concepts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_items: Option<Vec<ParentItemMastery>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentItemMastery {
    pub parent_item_id: String,
    pub title: String,
    pub weighted_ability: f64,
    /// Sum of per-concept attempt counts, not attempts on the parent item.
    pub total_attempts: i64,
    pub accuracy: f64,
    pub status: MasteryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMastery {
    pub skill_id: String,
    pub name: String,
    pub weighted_ability: f64,
    pub concept_count: usize,
}

/// Single row read; absent rows come back as the zero state without being written.
pub async fn get_mastery<S>(
    store: &S,
    learner_id: &str,
    concept_id: &str,
) -> Result<MasteryRecord, MasteryError>
where
    S: MasteryStore + ?Sized,
{
    Ok(store.load_or_initial(learner_id, concept_id).await?)
}

pub async fn mastery_overview<S, M>(
    store: &S,
    lookup: &M,
    learner_id: &str,
    subject: &str,
    include_parent_items: bool,
) -> Result<MasteryOverview, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    let rows = subject_mastery(store, lookup, learner_id, subject).await?;
    let mut overview = summarize(subject, &rows);

    if include_parent_items {
        overview.parent_items = Some(parent_item_rollups(store, lookup, learner_id, subject).await?);
    }

    Ok(overview)
}

/// Subject statistics over `(concept, row)` pairs. Zero pairs give all-zero figures.
pub fn summarize(subject: &str, rows: &[(Concept, MasteryRecord)]) -> MasteryOverview {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut total_attempts = 0;
    let mut total_correct = 0;
    let mut strong: Vec<(f64, &str)> = Vec::new();
    let mut weak: Vec<(f64, &str)> = Vec::new();

    for (concept, record) in rows {
        weighted_sum += record.ability * concept.importance_weight;
        weight_total += concept.importance_weight;
        total_attempts += record.attempts;
        total_correct += record.correct_count;

        match MasteryStatus::from_ability(record.ability) {
            MasteryStatus::Strong => strong.push((record.ability, concept.id.as_str())),
            MasteryStatus::Weak | MasteryStatus::VeryWeak => {
                weak.push((record.ability, concept.id.as_str()))
            }
            MasteryStatus::Medium => {}
        }
    }

    strong.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    weak.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    MasteryOverview {
        subject: subject.to_string(),
        total_concepts: rows.len(),
        weighted_mean_ability: if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        },
        total_attempts,
        total_correct,
        overall_accuracy: if total_attempts > 0 {
            total_correct as f64 / total_attempts as f64
        } else {
            0.0
        },
        strong_concepts: strong.into_iter().map(|(_, id)| id.to_string()).collect(),
        weak_concepts: weak.into_iter().map(|(_, id)| id.to_string()).collect(),
        parent_items: None,
    }
}

pub async fn parent_item_rollups<S, M>(
    store: &S,
    lookup: &M,
    learner_id: &str,
    subject: &str,
) -> Result<Vec<ParentItemMastery>, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    let parents = lookup.parent_items_for_subject(subject).await?;
    let mut out = Vec::with_capacity(parents.len());

    for parent in parents {
        let mappings = lookup.mappings_for(None, Some(parent.id.as_str())).await?;
        let concept_ids: Vec<String> = aggregate_weights(&mappings).into_keys().collect();
        let records: HashMap<String, MasteryRecord> = store
            .list_for_concepts(learner_id, &concept_ids)
            .await?
            .into_iter()
            .map(|r| (r.concept_id.clone(), r))
            .collect();

        out.push(rollup_parent_item(&parent, &mappings, &records));
    }

    Ok(out)
}

/// Knowledge-weighted ability over the concepts of one parent item.
///
/// Concepts without a row are left out. A parent item none of whose concepts
/// were attempted reports ability 0 with status `very_weak`.
///
/// `total_attempts` and `accuracy` are summed over the touched concepts' rows.
/// One attempt on a parent item that maps to two concepts counts twice, and a
/// concept shared with other parent items brings their attempts along too.
pub fn rollup_parent_item(
    parent: &ParentItem,
    mappings: &[KnowledgeSkillMapping],
    records: &HashMap<String, MasteryRecord>,
) -> ParentItemMastery {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut attempts = 0;
    let mut correct = 0;
    let mut touched = 0usize;

    for (concept_id, weight) in aggregate_weights(mappings) {
        let Some(record) = records.get(&concept_id) else {
            continue;
        };
        touched += 1;
        weighted_sum += record.ability * weight;
        weight_total += weight;
        attempts += record.attempts;
        correct += record.correct_count;
    }

    let weighted_ability = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };
    let status = if touched == 0 {
        MasteryStatus::VeryWeak
    } else {
        MasteryStatus::from_ability(weighted_ability)
    };

    ParentItemMastery {
        parent_item_id: parent.id.clone(),
        title: parent.title.clone(),
        weighted_ability,
        total_attempts: attempts,
        accuracy: if attempts > 0 {
            correct as f64 / attempts as f64
        } else {
            0.0
        },
        status,
    }
}

/// Ability per cognitive skill, weighted by `skill_weight` over every mapping
/// row whose concept the learner has attempted in `subject`.
pub async fn skill_profile<S, M>(
    store: &S,
    lookup: &M,
    learner_id: &str,
    subject: &str,
) -> Result<Vec<SkillMastery>, MasteryError>
where
    S: MasteryStore + ?Sized,
    M: MappingLookup + ?Sized,
{
    let rows = subject_mastery(store, lookup, learner_id, subject).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let abilities: HashMap<&str, f64> = rows
        .iter()
        .map(|(concept, record)| (concept.id.as_str(), record.ability))
        .collect();
    let concept_ids: Vec<String> = rows.iter().map(|(c, _)| c.id.clone()).collect();
    let mappings = lookup.mappings_for_concepts(&concept_ids).await?;

    // skill id -> (weighted sum, weight total, concepts)
    let mut acc: BTreeMap<String, (f64, f64, BTreeSet<String>)> = BTreeMap::new();
    for mapping in &mappings {
        let (Some(skill_id), Some(ability)) =
            (mapping.skill_id.as_ref(), abilities.get(mapping.concept_id.as_str()))
        else {
            continue;
        };
        if !mapping.skill_weight.is_finite() || mapping.skill_weight <= 0.0 {
            continue;
        }
        let entry = acc
            .entry(skill_id.clone())
            .or_insert_with(|| (0.0, 0.0, BTreeSet::new()));
        entry.0 += ability * mapping.skill_weight;
        entry.1 += mapping.skill_weight;
        entry.2.insert(mapping.concept_id.clone());
    }

    let mut out = Vec::with_capacity(acc.len());
    for (skill_id, (sum, total, concepts)) in acc {
        let name = match lookup.skill(&skill_id).await? {
            Some(skill) => skill.name,
            None => skill_id.clone(),
        };
        out.push(SkillMastery {
            skill_id,
            name,
            weighted_ability: sum / total,
            concept_count: concepts.len(),
        });
    }

    Ok(out)
}
