//! Medication occurrence engine.
//!
//! Expands a medication schedule into its reminder occurrences, derives
//! auto notes from the same fields, and keeps both reconciled with the
//! stored schedule on create, update and delete:
//! - generate: validation, overflow check, occurrence expansion (pure)
//! - notes: auto-note lines and note-prefix keys (pure)
//! - traits: `ScheduleStore`, the persistence boundary
//! - store: SQLite implementation of `ScheduleStore`
//! - engine: `OccurrenceEngine`, ownership checks and reconciliation

pub mod engine;
pub mod error;
pub mod generate;
pub mod notes;
pub mod store;
pub mod time;
pub mod traits;

pub use engine::{DeleteOutcome, OccurrenceEngine};
pub use error::EngineError;
pub use generate::{generate_occurrences, validate_schedule, ValidatedSchedule};
pub use notes::generate_auto_notes;
pub use store::SqliteScheduleStore;
pub use time::{format_time_string, INVALID_TIME};
pub use traits::ScheduleStore;
