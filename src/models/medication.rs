use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-entered medication timing definition. Hours are kept as the raw
/// `HH:MM` text the caller sent; they are validated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationSchedule {
    pub name: String,
    pub schedule_date: NaiveDate,
    #[serde(default)]
    pub frequency_type: String,
    pub start_hour: String,
    pub end_hour: String,
    pub repeat_times: u32,
    #[serde(default)]
    pub repeat_duration: u32,
}

/// A persisted medication schedule owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub schedule_date: NaiveDate,
    pub frequency_type: String,
    pub start_hour: String,
    pub end_hour: String,
    pub repeat_times: u32,
    pub repeat_duration: u32,
    /// Hour component of `start_hour`, used for ordering a day's list.
    pub schedule_hour: u32,
    pub audio_link: Option<String>,
    pub created_at: String,
}

impl Medication {
    /// The schedule this medication was last saved with.
    pub fn schedule(&self) -> MedicationSchedule {
        MedicationSchedule {
            name: self.name.clone(),
            schedule_date: self.schedule_date,
            frequency_type: self.frequency_type.clone(),
            start_hour: self.start_hour.clone(),
            end_hour: self.end_hour.clone(),
            repeat_times: self.repeat_times,
            repeat_duration: self.repeat_duration,
        }
    }
}

/// An occurrence computed from a schedule but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOccurrence {
    pub name: String,
    pub schedule_date: NaiveDate,
    pub occurrence_time: NaiveTime,
    pub schedule_hour: u32,
    pub audio_link: Option<String>,
}

/// One concrete reminder instance, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub name: String,
    pub schedule_date: NaiveDate,
    pub occurrence_time: NaiveTime,
    pub schedule_hour: u32,
    pub audio_link: Option<String>,
}
