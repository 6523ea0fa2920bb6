use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{MappingLookup, MasteryStore, StoreResult};
use crate::models::{
    Concept, Item, KnowledgeSkillMapping, MasteryRecord, MasteryWrite, ParentItem, Skill,
};

type MasteryKey = (String, String);

/// Process-local mastery rows. The write lock is held across each upsert's
/// read-modify-write, so counter increments never interleave.
#[derive(Debug, Default)]
pub struct InMemoryMasteryStore {
    rows: RwLock<HashMap<MasteryKey, MasteryRecord>>,
}

impl InMemoryMasteryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: MasteryRecord) {
        let key = (record.learner_id.clone(), record.concept_id.clone());
        self.rows.write().insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl MasteryStore for InMemoryMasteryStore {
    async fn get(&self, learner_id: &str, concept_id: &str) -> StoreResult<Option<MasteryRecord>> {
        let key = (learner_id.to_string(), concept_id.to_string());
        Ok(self.rows.read().get(&key).cloned())
    }

    async fn list_for_concepts(
        &self,
        learner_id: &str,
        concept_ids: &[String],
    ) -> StoreResult<Vec<MasteryRecord>> {
        let rows = self.rows.read();
        Ok(concept_ids
            .iter()
            .filter_map(|concept_id| rows.get(&(learner_id.to_string(), concept_id.clone())))
            .cloned()
            .collect())
    }

    async fn upsert(&self, write: &MasteryWrite) -> StoreResult<MasteryRecord> {
        let key = (write.learner_id.clone(), write.concept_id.clone());
        let mut rows = self.rows.write();
        let row = rows
            .entry(key)
            .or_insert_with(|| MasteryRecord::initial(&write.learner_id, &write.concept_id));
        row.ability = write.ability;
        row.attempts += 1;
        if write.correct {
            row.correct_count += 1;
        }
        row.updated_at = write.updated_at;
        Ok(row.clone())
    }
}

/// Curriculum held in memory, e.g. a table loaded at startup.
#[derive(Debug, Default, Clone)]
pub struct StaticMappings {
    concepts: HashMap<String, Concept>,
    skills: HashMap<String, Skill>,
    items: HashMap<String, Item>,
    parent_items: Vec<ParentItem>,
    mappings: Vec<KnowledgeSkillMapping>,
}

impl StaticMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concept(mut self, concept: Concept) -> Self {
        self.concepts.insert(concept.id.clone(), concept);
        self
    }

    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.insert(skill.id.clone(), skill);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_parent_item(mut self, parent: ParentItem) -> Self {
        self.parent_items.push(parent);
        self
    }

    pub fn with_mapping(mut self, mapping: KnowledgeSkillMapping) -> Self {
        self.mappings.push(mapping);
        self
    }
}

#[async_trait]
impl MappingLookup for StaticMappings {
    async fn concept(&self, concept_id: &str) -> StoreResult<Option<Concept>> {
        Ok(self.concepts.get(concept_id).cloned())
    }

    async fn concepts_for_subject(&self, subject: &str) -> StoreResult<Vec<Concept>> {
        let mut out: Vec<Concept> = self
            .concepts
            .values()
            .filter(|c| c.subject == subject)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn skill(&self, skill_id: &str) -> StoreResult<Option<Skill>> {
        Ok(self.skills.get(skill_id).cloned())
    }

    async fn item(&self, item_id: &str) -> StoreResult<Option<Item>> {
        Ok(self.items.get(item_id).cloned())
    }

    async fn parent_items_for_subject(&self, subject: &str) -> StoreResult<Vec<ParentItem>> {
        Ok(self
            .parent_items
            .iter()
            .filter(|p| p.subject == subject)
            .cloned()
            .collect())
    }

    async fn mappings_for(
        &self,
        item_id: Option<&str>,
        parent_item_id: Option<&str>,
    ) -> StoreResult<Vec<KnowledgeSkillMapping>> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| {
                let by_item = item_id.is_some() && m.item_id.as_deref() == item_id;
                let by_parent =
                    parent_item_id.is_some() && m.parent_item_id.as_deref() == parent_item_id;
                by_item || by_parent
            })
            .cloned()
            .collect())
    }

    async fn mappings_for_concepts(
        &self,
        concept_ids: &[String],
    ) -> StoreResult<Vec<KnowledgeSkillMapping>> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| concept_ids.contains(&m.concept_id))
            .cloned()
            .collect())
    }
}
