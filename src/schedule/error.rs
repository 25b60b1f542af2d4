//! Error taxonomy for the occurrence engine.

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid schedule: {0}")]
    Validation(String),

    #[error(
        "Schedule overflow: {repeat_times} x {repeat_duration}h needs {needed_minutes} min \
         but the window is {window_minutes} min"
    )]
    ScheduleOverflow {
        repeat_times: u32,
        repeat_duration: u32,
        needed_minutes: u64,
        window_minutes: u64,
    },

    #[error("Medication {0} was modified concurrently, retry the request")]
    ConcurrentModification(Uuid),

    /// Same message as `NotFound` so the other user's data is not revealed.
    #[error("{entity} not found: {id}")]
    Unauthorized { entity: &'static str, id: Uuid },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),
}

impl EngineError {
    pub(crate) fn medication_not_found(id: Uuid) -> Self {
        Self::NotFound { entity: "Medication", id }
    }

    pub(crate) fn medication_unauthorized(id: Uuid) -> Self {
        Self::Unauthorized { entity: "Medication", id }
    }

    /// Lift a store error, turning SQLite lock conflicts into
    /// `ConcurrentModification` for the medication being changed.
    pub(crate) fn from_store(err: DatabaseError, medication_id: Uuid) -> Self {
        if err.is_lock_conflict() {
            Self::ConcurrentModification(medication_id)
        } else {
            Self::Persistence(err)
        }
    }
}
