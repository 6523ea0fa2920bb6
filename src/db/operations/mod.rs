pub mod curriculum;
pub mod mastery;

pub use curriculum::{insert_concept, insert_item, insert_mapping, insert_parent_item, insert_skill};
