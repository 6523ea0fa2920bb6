use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::db::DatabaseProxy;
use crate::models::{Concept, Item, KnowledgeSkillMapping, ParentItem, Skill};
use crate::store::{MappingLookup, StoreResult};

const MAPPING_COLUMNS: &str = r#""id","parentItemId","itemId","conceptId","skillId","knowledgeWeight","skillWeight""#;

#[async_trait]
impl MappingLookup for DatabaseProxy {
    async fn concept(&self, concept_id: &str) -> StoreResult<Option<Concept>> {
        let row = sqlx::query(
            r#"SELECT "id","subject","name","gradeBand","importanceWeight" FROM "concepts" WHERE "id" = ? LIMIT 1"#,
        )
        .bind(concept_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(map_concept_row).transpose()?)
    }

    async fn concepts_for_subject(&self, subject: &str) -> StoreResult<Vec<Concept>> {
        let rows = sqlx::query(
            r#"SELECT "id","subject","name","gradeBand","importanceWeight" FROM "concepts" WHERE "subject" = ? ORDER BY "id""#,
        )
        .bind(subject)
        .fetch_all(self.pool())
        .await?;

        let concepts = rows
            .iter()
            .map(map_concept_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(concepts)
    }

    async fn skill(&self, skill_id: &str) -> StoreResult<Option<Skill>> {
        let row = sqlx::query(r#"SELECT "id","name","description" FROM "skills" WHERE "id" = ? LIMIT 1"#)
            .bind(skill_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.as_ref().map(map_skill_row).transpose()?)
    }

    async fn item(&self, item_id: &str) -> StoreResult<Option<Item>> {
        let row = sqlx::query(
            r#"SELECT "id","parentItemId","conceptId","difficulty" FROM "items" WHERE "id" = ? LIMIT 1"#,
        )
        .bind(item_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(map_item_row).transpose()?)
    }

    async fn parent_items_for_subject(&self, subject: &str) -> StoreResult<Vec<ParentItem>> {
        let rows = sqlx::query(
            r#"SELECT "id","subject","title" FROM "parent_items" WHERE "subject" = ? ORDER BY "id""#,
        )
        .bind(subject)
        .fetch_all(self.pool())
        .await?;

        let parents = rows
            .iter()
            .map(map_parent_item_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parents)
    }

    async fn mappings_for(
        &self,
        item_id: Option<&str>,
        parent_item_id: Option<&str>,
    ) -> StoreResult<Vec<KnowledgeSkillMapping>> {
        if item_id.is_none() && parent_item_id.is_none() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"SELECT {MAPPING_COLUMNS} FROM "knowledge_skill_mappings" WHERE "itemId" = ? OR "parentItemId" = ? ORDER BY "id""#
        );
        let rows = sqlx::query(&sql)
            .bind(item_id)
            .bind(parent_item_id)
            .fetch_all(self.pool())
            .await?;

        let mappings = rows
            .iter()
            .map(map_mapping_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(mappings)
    }

    async fn mappings_for_concepts(
        &self,
        concept_ids: &[String],
    ) -> StoreResult<Vec<KnowledgeSkillMapping>> {
        if concept_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            r#"SELECT {MAPPING_COLUMNS} FROM "knowledge_skill_mappings" WHERE "conceptId" IN ("#
        ));
        {
            let mut sep = qb.separated(", ");
            for id in concept_ids {
                sep.push_bind(id);
            }
            sep.push_unseparated(")");
        }
        qb.push(r#" ORDER BY "id""#);

        let rows = qb.build().fetch_all(self.pool()).await?;
        let mappings = rows
            .iter()
            .map(map_mapping_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(mappings)
    }
}

pub async fn insert_concept(proxy: &DatabaseProxy, concept: &Concept) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT OR REPLACE INTO "concepts" ("id","subject","name","gradeBand","importanceWeight") VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(&concept.id)
    .bind(&concept.subject)
    .bind(&concept.name)
    .bind(&concept.grade_band)
    .bind(concept.importance_weight)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn insert_skill(proxy: &DatabaseProxy, skill: &Skill) -> Result<(), sqlx::Error> {
    sqlx::query(r#"INSERT OR REPLACE INTO "skills" ("id","name","description") VALUES (?, ?, ?)"#)
        .bind(&skill.id)
        .bind(&skill.name)
        .bind(&skill.description)
        .execute(proxy.pool())
        .await?;
    Ok(())
}

pub async fn insert_parent_item(proxy: &DatabaseProxy, parent: &ParentItem) -> Result<(), sqlx::Error> {
    sqlx::query(r#"INSERT OR REPLACE INTO "parent_items" ("id","subject","title") VALUES (?, ?, ?)"#)
        .bind(&parent.id)
        .bind(&parent.subject)
        .bind(&parent.title)
        .execute(proxy.pool())
        .await?;
    Ok(())
}

pub async fn insert_item(proxy: &DatabaseProxy, item: &Item) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT OR REPLACE INTO "items" ("id","parentItemId","conceptId","difficulty") VALUES (?, ?, ?, ?)"#,
    )
    .bind(&item.id)
    .bind(&item.parent_item_id)
    .bind(&item.concept_id)
    .bind(item.difficulty)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn insert_mapping(
    proxy: &DatabaseProxy,
    mapping: &KnowledgeSkillMapping,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO "knowledge_skill_mappings"
          ("id","parentItemId","itemId","conceptId","skillId","knowledgeWeight","skillWeight")
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&mapping.id)
    .bind(&mapping.parent_item_id)
    .bind(&mapping.item_id)
    .bind(&mapping.concept_id)
    .bind(&mapping.skill_id)
    .bind(mapping.knowledge_weight)
    .bind(mapping.skill_weight)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

fn map_concept_row(row: &SqliteRow) -> Result<Concept, sqlx::Error> {
    Ok(Concept {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        name: row.try_get("name")?,
        grade_band: row.try_get("gradeBand")?,
        importance_weight: row.try_get("importanceWeight")?,
    })
}

fn map_skill_row(row: &SqliteRow) -> Result<Skill, sqlx::Error> {
    Ok(Skill {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn map_parent_item_row(row: &SqliteRow) -> Result<ParentItem, sqlx::Error> {
    Ok(ParentItem {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        title: row.try_get("title")?,
    })
}

fn map_item_row(row: &SqliteRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        id: row.try_get("id")?,
        parent_item_id: row.try_get("parentItemId")?,
        concept_id: row.try_get("conceptId")?,
        difficulty: row.try_get("difficulty")?,
    })
}

fn map_mapping_row(row: &SqliteRow) -> Result<KnowledgeSkillMapping, sqlx::Error> {
    Ok(KnowledgeSkillMapping {
        id: row.try_get("id")?,
        parent_item_id: row.try_get("parentItemId")?,
        item_id: row.try_get("itemId")?,
        concept_id: row.try_get("conceptId")?,
        skill_id: row.try_get("skillId")?,
        knowledge_weight: row.try_get("knowledgeWeight")?,
        skill_weight: row.try_get("skillWeight")?,
    })
}
