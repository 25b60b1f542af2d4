//! Storage boundary consumed by the occurrence engine.
//!
//! Granular operations map one-to-one onto store statements. The compound
//! operations (`create_medication`, `replace_schedule`,
//! `delete_medication_cascade`, `insert_notes_if_absent`) have default
//! implementations built from the granular ones; a store that can offer a
//! transaction must override them so each runs as a single unit.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

pub trait ScheduleStore: Send + Sync {
    // ── Medications ────────────────────────────────────────

    /// Owner of a medication, `None` if it does not exist.
    fn medication_owner(&self, medication_id: &Uuid) -> Result<Option<Uuid>, DatabaseError>;

    fn get_medication(&self, medication_id: &Uuid) -> Result<Option<Medication>, DatabaseError>;

    fn medications_on_date(
        &self,
        user_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Medication>, DatabaseError>;

    fn insert_medication(&self, medication: &Medication) -> Result<(), DatabaseError>;

    /// Overwrite the schedule fields. Returns false if no row matched.
    fn update_medication_schedule(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        schedule: &MedicationSchedule,
        schedule_hour: u32,
    ) -> Result<bool, DatabaseError>;

    fn set_medication_audio_link(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        audio_link: &str,
    ) -> Result<bool, DatabaseError>;

    /// Delete the medication row only; occurrences and notes must already
    /// be gone. Returns false if no row matched.
    fn delete_medication(&self, medication_id: &Uuid, user_id: &Uuid) -> Result<bool, DatabaseError>;

    // ── Occurrences ────────────────────────────────────────

    fn insert_occurrences(
        &self,
        medication_id: &Uuid,
        occurrences: &[NewOccurrence],
    ) -> Result<usize, DatabaseError>;

    fn delete_occurrences_by_medication_id(&self, medication_id: &Uuid) -> Result<usize, DatabaseError>;

    /// Occurrences in generation order.
    fn occurrences(&self, medication_id: &Uuid) -> Result<Vec<Occurrence>, DatabaseError>;

    fn occurrences_on(
        &self,
        medication_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Occurrence>, DatabaseError>;

    /// Only touches occurrences whose medication belongs to `user_id`.
    fn set_occurrence_audio_link(
        &self,
        occurrence_id: &Uuid,
        user_id: &Uuid,
        audio_link: &str,
    ) -> Result<bool, DatabaseError>;

    // ── Notes ──────────────────────────────────────────────

    fn note_exists(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        text: &str,
        note_type: NoteType,
    ) -> Result<bool, DatabaseError>;

    fn insert_note(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        text: &str,
        note_type: NoteType,
    ) -> Result<Note, DatabaseError>;

    fn notes(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        note_type: Option<NoteType>,
    ) -> Result<Vec<Note>, DatabaseError>;

    fn delete_notes_by_prefix(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        prefix: &str,
    ) -> Result<usize, DatabaseError>;

    fn delete_notes_by_medication_id(&self, medication_id: &Uuid) -> Result<usize, DatabaseError>;

    // ── Compound operations ────────────────────────────────

    /// Insert a medication together with its first occurrence batch.
    fn create_medication(
        &self,
        medication: &Medication,
        occurrences: &[NewOccurrence],
    ) -> Result<usize, DatabaseError> {
        self.insert_medication(medication)?;
        self.insert_occurrences(&medication.id, occurrences)
    }

    /// Save a new schedule and swap the occurrence set for it.
    /// `None` if the medication row no longer matches.
    fn replace_schedule(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        schedule: &MedicationSchedule,
        schedule_hour: u32,
        occurrences: &[NewOccurrence],
    ) -> Result<Option<usize>, DatabaseError> {
        if !self.update_medication_schedule(medication_id, user_id, schedule, schedule_hour)? {
            return Ok(None);
        }
        self.delete_occurrences_by_medication_id(medication_id)?;
        self.insert_occurrences(medication_id, occurrences).map(Some)
    }

    /// Occurrences, then notes, then the medication itself. Nothing is
    /// touched unless `user_id` owns the medication.
    fn delete_medication_cascade(&self, medication_id: &Uuid, user_id: &Uuid) -> Result<bool, DatabaseError> {
        if self.medication_owner(medication_id)? != Some(*user_id) {
            return Ok(false);
        }
        self.delete_occurrences_by_medication_id(medication_id)?;
        self.delete_notes_by_medication_id(medication_id)?;
        self.delete_medication(medication_id, user_id)
    }

    /// Insert each line not already present with exactly that text.
    /// Returns how many were inserted.
    fn insert_notes_if_absent(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        lines: &[String],
        note_type: NoteType,
    ) -> Result<usize, DatabaseError> {
        let mut inserted = 0;
        for line in lines {
            if !self.note_exists(medication_id, user_id, line, note_type)? {
                self.insert_note(medication_id, user_id, line, note_type)?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::schedule::store::SqliteScheduleStore;
    use chrono::NaiveTime;

    /// Forwards the granular operations only, so the compound operations
    /// run through the trait defaults.
    struct GranularOnly(SqliteScheduleStore);

    impl ScheduleStore for GranularOnly {
        fn medication_owner(&self, id: &Uuid) -> Result<Option<Uuid>, DatabaseError> {
            self.0.medication_owner(id)
        }
        fn get_medication(&self, id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
            self.0.get_medication(id)
        }
        fn medications_on_date(&self, user_id: &Uuid, date: NaiveDate) -> Result<Vec<Medication>, DatabaseError> {
            self.0.medications_on_date(user_id, date)
        }
        fn insert_medication(&self, medication: &Medication) -> Result<(), DatabaseError> {
            self.0.insert_medication(medication)
        }
        fn update_medication_schedule(
            &self,
            id: &Uuid,
            user_id: &Uuid,
            schedule: &MedicationSchedule,
            schedule_hour: u32,
        ) -> Result<bool, DatabaseError> {
            self.0.update_medication_schedule(id, user_id, schedule, schedule_hour)
        }
        fn set_medication_audio_link(&self, id: &Uuid, user_id: &Uuid, link: &str) -> Result<bool, DatabaseError> {
            self.0.set_medication_audio_link(id, user_id, link)
        }
        fn delete_medication(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, DatabaseError> {
            self.0.delete_medication(id, user_id)
        }
        fn insert_occurrences(&self, id: &Uuid, occurrences: &[NewOccurrence]) -> Result<usize, DatabaseError> {
            self.0.insert_occurrences(id, occurrences)
        }
        fn delete_occurrences_by_medication_id(&self, id: &Uuid) -> Result<usize, DatabaseError> {
            self.0.delete_occurrences_by_medication_id(id)
        }
        fn occurrences(&self, id: &Uuid) -> Result<Vec<Occurrence>, DatabaseError> {
            self.0.occurrences(id)
        }
        fn occurrences_on(&self, id: &Uuid, date: NaiveDate) -> Result<Vec<Occurrence>, DatabaseError> {
            self.0.occurrences_on(id, date)
        }
        fn set_occurrence_audio_link(&self, id: &Uuid, user_id: &Uuid, link: &str) -> Result<bool, DatabaseError> {
            self.0.set_occurrence_audio_link(id, user_id, link)
        }
        fn note_exists(&self, id: &Uuid, user_id: &Uuid, text: &str, note_type: NoteType) -> Result<bool, DatabaseError> {
            self.0.note_exists(id, user_id, text, note_type)
        }
        fn insert_note(&self, id: &Uuid, user_id: &Uuid, text: &str, note_type: NoteType) -> Result<Note, DatabaseError> {
            self.0.insert_note(id, user_id, text, note_type)
        }
        fn notes(&self, id: &Uuid, user_id: &Uuid, note_type: Option<NoteType>) -> Result<Vec<Note>, DatabaseError> {
            self.0.notes(id, user_id, note_type)
        }
        fn delete_notes_by_prefix(&self, id: &Uuid, user_id: &Uuid, prefix: &str) -> Result<usize, DatabaseError> {
            self.0.delete_notes_by_prefix(id, user_id, prefix)
        }
        fn delete_notes_by_medication_id(&self, id: &Uuid) -> Result<usize, DatabaseError> {
            self.0.delete_notes_by_medication_id(id)
        }
    }

    fn setup() -> (tempfile::TempDir, GranularOnly, Medication) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteScheduleStore::open(&EngineConfig::new(dir.path().join("meds.db"))).unwrap();
        let medication = Medication {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Aspirin".into(),
            schedule_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            frequency_type: "Daily".into(),
            start_hour: "08:00".into(),
            end_hour: "20:00".into(),
            repeat_times: 1,
            repeat_duration: 4,
            schedule_hour: 8,
            audio_link: None,
            created_at: "2024-05-01T07:00:00Z".into(),
        };
        let occurrence = NewOccurrence {
            name: "Aspirin".into(),
            schedule_date: medication.schedule_date,
            occurrence_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            schedule_hour: 12,
            audio_link: None,
        };
        let store = GranularOnly(store);
        store.create_medication(&medication, &[occurrence]).unwrap();
        store
            .insert_note(&medication.id, &medication.user_id, "Take with food", NoteType::Manual)
            .unwrap();
        (dir, store, medication)
    }

    #[test]
    fn store_is_object_safe() {
        fn _assert_store(_: &dyn ScheduleStore) {}
    }

    #[test]
    fn default_cascade_ignores_other_users() {
        let (_dir, store, med) = setup();

        assert!(!store.delete_medication_cascade(&med.id, &Uuid::new_v4()).unwrap());
        assert_eq!(store.occurrences(&med.id).unwrap().len(), 1);
        assert_eq!(store.notes(&med.id, &med.user_id, None).unwrap().len(), 1);
        assert!(store.get_medication(&med.id).unwrap().is_some());
    }

    #[test]
    fn default_cascade_removes_owned_medication() {
        let (_dir, store, med) = setup();

        assert!(store.delete_medication_cascade(&med.id, &med.user_id).unwrap());
        assert!(store.occurrences(&med.id).unwrap().is_empty());
        assert!(store.notes(&med.id, &med.user_id, None).unwrap().is_empty());
        assert!(!store.delete_medication_cascade(&med.id, &med.user_id).unwrap());
    }
}
