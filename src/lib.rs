//! Per-learner, per-concept ability estimation.
//!
//! Attempts move a logistic ability estimate for every concept their item maps
//! to, scaled by each concept's knowledge weight. Read-side helpers rank the
//! concepts a learner should practice next and summarize a subject.

pub mod ability;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;

pub use config::MasteryConfig;
pub use models::{AttemptInput, AttemptOutcome, ConceptUpdate, MasteryRecord, MasteryStatus};
pub use services::MasteryError;
pub use store::{MappingLookup, MasteryStore, StoreError};
