use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::db::DatabaseProxy;
use crate::models::{MasteryRecord, MasteryWrite};
use crate::store::{MasteryStore, StoreResult};

const MASTERY_COLUMNS: &str =
    r#""learnerId","conceptId","ability","attempts","correctCount","updatedAt""#;

#[async_trait]
impl MasteryStore for DatabaseProxy {
    async fn get(&self, learner_id: &str, concept_id: &str) -> StoreResult<Option<MasteryRecord>> {
        let sql = format!(
            r#"SELECT {MASTERY_COLUMNS} FROM "concept_mastery" WHERE "learnerId" = ? AND "conceptId" = ? LIMIT 1"#
        );
        let row = sqlx::query(&sql)
            .bind(learner_id)
            .bind(concept_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.as_ref().map(map_mastery_row).transpose()?)
    }

    async fn list_for_concepts(
        &self,
        learner_id: &str,
        concept_ids: &[String],
    ) -> StoreResult<Vec<MasteryRecord>> {
        if concept_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            r#"SELECT {MASTERY_COLUMNS} FROM "concept_mastery" WHERE "learnerId" = "#
        ));
        qb.push_bind(learner_id);
        qb.push(r#" AND "conceptId" IN ("#);
        {
            let mut sep = qb.separated(", ");
            for id in concept_ids {
                sep.push_bind(id);
            }
            sep.push_unseparated(")");
        }
        qb.push(r#" ORDER BY "conceptId""#);

        let rows = qb.build().fetch_all(self.pool()).await?;
        let records = rows
            .iter()
            .map(map_mastery_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn upsert(&self, write: &MasteryWrite) -> StoreResult<MasteryRecord> {
        let sql = format!(
            r#"
            INSERT INTO "concept_mastery"
              ("id","learnerId","conceptId","ability","attempts","correctCount","updatedAt")
            VALUES (?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT ("learnerId","conceptId") DO UPDATE SET
              "ability" = excluded."ability",
              "attempts" = "concept_mastery"."attempts" + 1,
              "correctCount" = "concept_mastery"."correctCount" + excluded."correctCount",
              "updatedAt" = excluded."updatedAt"
            RETURNING {MASTERY_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&write.learner_id)
            .bind(&write.concept_id)
            .bind(write.ability)
            .bind(i64::from(write.correct))
            .bind(write.updated_at)
            .fetch_one(self.pool())
            .await?;

        Ok(map_mastery_row(&row)?)
    }
}

/// A cell that does not decode is an error, never a default.
fn map_mastery_row(row: &SqliteRow) -> Result<MasteryRecord, sqlx::Error> {
    Ok(MasteryRecord {
        learner_id: row.try_get("learnerId")?,
        concept_id: row.try_get("conceptId")?,
        ability: row.try_get("ability")?,
        attempts: row.try_get("attempts")?,
        correct_count: row.try_get("correctCount")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MasteryConfig;
    use crate::db::operations::curriculum::insert_concept;
    use crate::models::{AttemptFailure, AttemptInput, Concept, Item};
    use crate::services::credit::{apply_attempt, update_after_attempt};
    use crate::store::{MappingLookup, StaticMappings, StoreError};

    fn write(concept_id: &str, correct: bool, ability: f64, at: i64) -> MasteryWrite {
        MasteryWrite {
            learner_id: "u1".to_string(),
            concept_id: concept_id.to_string(),
            ability,
            correct,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_increments_counters() {
        let db = DatabaseProxy::in_memory().await.unwrap();

        let first = db.upsert(&write("c1", true, 12.0, 100)).await.unwrap();
        assert_eq!(first.attempts, 1);
        assert_eq!(first.correct_count, 1);

        let second = db.upsert(&write("c1", false, 0.5, 200)).await.unwrap();
        assert_eq!(second.attempts, 2);
        assert_eq!(second.correct_count, 1);
        assert_eq!(second.ability, 0.5);
        assert_eq!(second.updated_at, 200);

        let stored = db.get("u1", "c1").await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_list_for_concepts_filters_and_orders() {
        let db = DatabaseProxy::in_memory().await.unwrap();
        db.upsert(&write("b", true, 1.0, 1)).await.unwrap();
        db.upsert(&write("a", false, -1.0, 1)).await.unwrap();
        db.upsert(&write("z", true, 5.0, 1)).await.unwrap();

        let rows = db
            .list_for_concepts("u1", &["b".to_string(), "a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.concept_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(db.list_for_concepts("u1", &[]).await.unwrap().is_empty());
        assert!(db.list_for_concepts("u2", &["a".to_string()]).await.unwrap().is_empty());
    }

    async fn seed_corrupt_ability(db: &DatabaseProxy) {
        sqlx::query(
            r#"INSERT INTO "concept_mastery" ("id","learnerId","conceptId","ability","attempts","correctCount","updatedAt")
               VALUES ('row-1', 'u1', 'c1', 'corrupt', 7, 3, 0)"#,
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_ability_is_an_error() {
        let db = DatabaseProxy::in_memory().await.unwrap();
        seed_corrupt_ability(&db).await;

        assert!(matches!(db.get("u1", "c1").await, Err(StoreError::Sqlx(_))));
        assert!(matches!(
            db.load_or_initial("u1", "c1").await,
            Err(StoreError::Sqlx(_))
        ));
        assert!(matches!(
            db.list_for_concepts("u1", &["c1".to_string()]).await,
            Err(StoreError::Sqlx(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_row_is_not_overwritten_by_fan_out() {
        let db = DatabaseProxy::in_memory().await.unwrap();
        insert_concept(
            &db,
            &Concept {
                id: "c1".to_string(),
                subject: "math".to_string(),
                name: "C1".to_string(),
                grade_band: None,
                importance_weight: 1.0,
            },
        )
        .await
        .unwrap();
        seed_corrupt_ability(&db).await;

        let err = update_after_attempt(&db, &MasteryConfig::default(), "u1", "c1", true, 0.0).await;
        assert!(err.is_err());

        let lookup = StaticMappings::new()
            .with_concept(db.concept("c1").await.unwrap().unwrap())
            .with_item(Item {
                id: "q1".to_string(),
                parent_item_id: None,
                concept_id: Some("c1".to_string()),
                difficulty: 0.0,
            });
        let input = AttemptInput {
            learner_id: "u1".to_string(),
            item_id: Some("q1".to_string()),
            parent_item_id: None,
            correct: true,
            item_difficulty: 0.0,
        };
        let outcome = apply_attempt(&db, &lookup, &MasteryConfig::default(), &input)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.updates.is_empty());
        assert!(matches!(
            outcome.failure,
            Some(AttemptFailure::Persistence { ref concept_id, .. }) if concept_id == "c1"
        ));

        let (ability, attempts): (String, i64) = sqlx::query_as(
            r#"SELECT "ability","attempts" FROM "concept_mastery" WHERE "learnerId" = 'u1' AND "conceptId" = 'c1'"#,
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(ability, "corrupt");
        assert_eq!(attempts, 7);
    }

    #[tokio::test]
    async fn test_absent_row_loads_as_initial() {
        let db = DatabaseProxy::in_memory().await.unwrap();
        let record = db.load_or_initial("u1", "c1").await.unwrap();
        assert_eq!(record, MasteryRecord::initial("u1", "c1"));
        assert!(db.get("u1", "c1").await.unwrap().is_none());
    }
}
