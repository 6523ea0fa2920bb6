//! Storage contract between the mastery core and its persistence collaborators.
//!
//! `MasteryStore` owns the per-(learner, concept) rows the core mutates;
//! `MappingLookup` is the read-only curriculum side (concepts, skills,
//! parent items and their weighted mappings).

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Concept, Item, KnowledgeSkillMapping, MasteryRecord, MasteryWrite, ParentItem, Skill,
};

pub use memory::{InMemoryMasteryStore, StaticMappings};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait MasteryStore: Send + Sync {
    async fn get(&self, learner_id: &str, concept_id: &str) -> StoreResult<Option<MasteryRecord>>;

    /// Rows for the given concepts. Concepts the learner never attempted are absent.
    async fn list_for_concepts(
        &self,
        learner_id: &str,
        concept_ids: &[String],
    ) -> StoreResult<Vec<MasteryRecord>>;

    /// Atomic upsert of one row: ability is overwritten, `attempts` and
    /// `correct_count` are incremented in the same unit of work.
    async fn upsert(&self, write: &MasteryWrite) -> StoreResult<MasteryRecord>;

    /// The single source of the zero-state default for absent rows.
    async fn load_or_initial(&self, learner_id: &str, concept_id: &str) -> StoreResult<MasteryRecord> {
        Ok(self
            .get(learner_id, concept_id)
            .await?
            .unwrap_or_else(|| MasteryRecord::initial(learner_id, concept_id)))
    }
}

#[async_trait]
pub trait MappingLookup: Send + Sync {
    async fn concept(&self, concept_id: &str) -> StoreResult<Option<Concept>>;

    async fn concepts_for_subject(&self, subject: &str) -> StoreResult<Vec<Concept>>;

    async fn skill(&self, skill_id: &str) -> StoreResult<Option<Skill>>;

    async fn item(&self, item_id: &str) -> StoreResult<Option<Item>>;

    async fn parent_items_for_subject(&self, subject: &str) -> StoreResult<Vec<ParentItem>>;

    /// Mapping rows keyed by either id. A row matching both is returned once.
    async fn mappings_for(
        &self,
        item_id: Option<&str>,
        parent_item_id: Option<&str>,
    ) -> StoreResult<Vec<KnowledgeSkillMapping>>;

    async fn mappings_for_concepts(
        &self,
        concept_ids: &[String],
    ) -> StoreResult<Vec<KnowledgeSkillMapping>>;
}
