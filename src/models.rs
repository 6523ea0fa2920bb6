use serde::{Deserialize, Serialize};

use crate::ability::INITIAL_ABILITY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: String,
    pub subject: String,
    pub name: String,
    pub grade_band: Option<String>,
    /// Curricular importance. Scales practice priority, never ability.
    pub importance_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentItem {
    pub id: String,
    pub subject: String,
    pub title: String,
}

/// A concrete question. Standalone items carry their single concept directly;
/// variants of a parent item take their concepts from the mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub parent_item_id: Option<String>,
    pub concept_id: Option<String>,
    pub difficulty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSkillMapping {
    pub id: String,
    pub parent_item_id: Option<String>,
    pub item_id: Option<String>,
    pub concept_id: String,
    pub skill_id: Option<String>,
    pub knowledge_weight: f64,
    pub skill_weight: f64,
}

impl KnowledgeSkillMapping {
    /// Implicit weight-1 mapping for an item that predates the mapping table.
    pub fn implicit(item_id: &str, concept_id: &str) -> Self {
        Self {
            id: format!("implicit:{item_id}:{concept_id}"),
            parent_item_id: None,
            item_id: Some(item_id.to_string()),
            concept_id: concept_id.to_string(),
            skill_id: None,
            knowledge_weight: 1.0,
            skill_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub learner_id: String,
    pub concept_id: String,
    pub ability: f64,
    pub attempts: i64,
    pub correct_count: i64,
    pub updated_at: i64,
}

impl MasteryRecord {
    /// Zero state for a (learner, concept) pair that has never been attempted.
    pub fn initial(learner_id: &str, concept_id: &str) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            concept_id: concept_id.to_string(),
            ability: INITIAL_ABILITY,
            attempts: 0,
            correct_count: 0,
            updated_at: 0,
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.attempts > 0 {
            self.correct_count as f64 / self.attempts as f64
        } else {
            0.0
        }
    }
}

/// One per-row write: the new ability plus the outcome to fold into the counters.
#[derive(Debug, Clone, PartialEq)]
pub struct MasteryWrite {
    pub learner_id: String,
    pub concept_id: String,
    pub ability: f64,
    pub correct: bool,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptInput {
    pub learner_id: String,
    pub item_id: Option<String>,
    pub parent_item_id: Option<String>,
    pub correct: bool,
    pub item_difficulty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptUpdate {
    pub concept_id: String,
    pub old_ability: f64,
    pub new_ability: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptFailure {
    NoMapping,
    #[serde(rename_all = "camelCase")]
    Persistence { concept_id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub success: bool,
    pub updates: Vec<ConceptUpdate>,
    pub skipped_concepts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<AttemptFailure>,
}

impl AttemptOutcome {
    pub fn no_mapping() -> Self {
        Self {
            success: false,
            updates: Vec::new(),
            skipped_concepts: Vec::new(),
            failure: Some(AttemptFailure::NoMapping),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryStatus {
    Strong,
    Medium,
    Weak,
    VeryWeak,
}

impl MasteryStatus {
    pub fn from_ability(ability: f64) -> Self {
        if ability > 50.0 {
            Self::Strong
        } else if ability > 0.0 {
            Self::Medium
        } else if ability > -50.0 {
            Self::Weak
        } else {
            Self::VeryWeak
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Medium => "medium",
            Self::Weak => "weak",
            Self::VeryWeak => "very_weak",
        }
    }
}
