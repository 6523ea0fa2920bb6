#![allow(dead_code)]

use knowledge_mastery::db::operations::{
    insert_concept, insert_item, insert_mapping, insert_parent_item, insert_skill,
};
use knowledge_mastery::db::DatabaseProxy;
use knowledge_mastery::models::{Concept, Item, KnowledgeSkillMapping, ParentItem, Skill};
use knowledge_mastery::AttemptInput;

pub fn concept(id: &str, subject: &str, importance: f64) -> Concept {
    Concept {
        id: id.to_string(),
        subject: subject.to_string(),
        name: id.replace('_', " "),
        grade_band: Some("6-8".to_string()),
        importance_weight: importance,
    }
}

pub fn mapping(
    id: &str,
    parent: &str,
    concept_id: &str,
    skill_id: &str,
    knowledge_weight: f64,
    skill_weight: f64,
) -> KnowledgeSkillMapping {
    KnowledgeSkillMapping {
        id: id.to_string(),
        parent_item_id: Some(parent.to_string()),
        item_id: None,
        concept_id: concept_id.to_string(),
        skill_id: Some(skill_id.to_string()),
        knowledge_weight,
        skill_weight,
    }
}

pub fn parent_attempt(learner: &str, parent: &str, correct: bool) -> AttemptInput {
    AttemptInput {
        learner_id: learner.to_string(),
        item_id: None,
        parent_item_id: Some(parent.to_string()),
        correct,
        item_difficulty: 0.0,
    }
}

/// Math curriculum:
/// - `ratio_word_problem` maps linear_equations 0.7 / fractions 0.3
/// - `area_problem` maps geometry 1.0
/// - `unseen_problem` maps probability 1.0
/// - item `legacy_q` is standalone on fractions, item `variant_q` belongs to `ratio_word_problem`
pub async fn seeded_db() -> DatabaseProxy {
    let db = DatabaseProxy::in_memory().await.expect("in-memory database");

    for c in [
        concept("linear_equations", "math", 5.0),
        concept("fractions", "math", 3.0),
        concept("geometry", "math", 1.0),
        concept("probability", "math", 2.0),
        concept("photosynthesis", "biology", 4.0),
    ] {
        insert_concept(&db, &c).await.expect("concept");
    }

    for (id, name) in [("reasoning", "Reasoning"), ("computation", "Computation")] {
        insert_skill(
            &db,
            &Skill {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
            },
        )
        .await
        .expect("skill");
    }

    for (id, title) in [
        ("ratio_word_problem", "Ratio word problem"),
        ("area_problem", "Area of composite shapes"),
        ("unseen_problem", "Dice outcomes"),
    ] {
        insert_parent_item(
            &db,
            &ParentItem {
                id: id.to_string(),
                subject: "math".to_string(),
                title: title.to_string(),
            },
        )
        .await
        .expect("parent item");
    }

    for m in [
        mapping("m1", "ratio_word_problem", "linear_equations", "reasoning", 0.7, 1.0),
        mapping("m2", "ratio_word_problem", "fractions", "computation", 0.3, 1.0),
        mapping("m3", "area_problem", "geometry", "computation", 1.0, 1.0),
        mapping("m4", "unseen_problem", "probability", "reasoning", 1.0, 1.0),
    ] {
        insert_mapping(&db, &m).await.expect("mapping");
    }

    for item in [
        Item {
            id: "legacy_q".to_string(),
            parent_item_id: None,
            concept_id: Some("fractions".to_string()),
            difficulty: 0.0,
        },
        Item {
            id: "variant_q".to_string(),
            parent_item_id: Some("ratio_word_problem".to_string()),
            concept_id: None,
            difficulty: 0.0,
        },
    ] {
        insert_item(&db, &item).await.expect("item");
    }

    db
}
