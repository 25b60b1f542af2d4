//! SQLite-backed `ScheduleStore`.
//!
//! Each call opens its own connection and drops it before returning.
//! Compound mutations run in an `IMMEDIATE` transaction so the write lock
//! is taken before the first statement; a competing writer waits up to the
//! configured busy timeout and then fails with `SQLITE_BUSY`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::traits::ScheduleStore;
use crate::config::EngineConfig;
use crate::db::{self, repository, DatabaseError};
use crate::models::*;

pub struct SqliteScheduleStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteScheduleStore {
    /// Create the database if needed and bring its schema up to date.
    pub fn open(config: &EngineConfig) -> Result<Self, DatabaseError> {
        db::open_database(&config.database_path, config.busy_timeout)?;
        Ok(Self {
            path: config.database_path.clone(),
            busy_timeout: config.busy_timeout,
        })
    }

    fn connect(&self) -> Result<Connection, DatabaseError> {
        db::connect(&self.path, self.busy_timeout)
    }

    /// Run `f` in one IMMEDIATE transaction; dropped on error (rollback).
    fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn new_note(medication_id: &Uuid, user_id: &Uuid, text: &str, note_type: NoteType) -> Note {
    Note {
        id: Uuid::new_v4(),
        medication_id: *medication_id,
        user_id: *user_id,
        note_text: text.to_string(),
        note_type,
        created_at: now_timestamp(),
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn medication_owner(&self, medication_id: &Uuid) -> Result<Option<Uuid>, DatabaseError> {
        repository::get_medication_owner(&self.connect()?, medication_id)
    }

    fn get_medication(&self, medication_id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
        repository::get_medication(&self.connect()?, medication_id)
    }

    fn medications_on_date(
        &self,
        user_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Medication>, DatabaseError> {
        repository::get_medications_by_date(&self.connect()?, user_id, date)
    }

    fn insert_medication(&self, medication: &Medication) -> Result<(), DatabaseError> {
        repository::insert_medication(&self.connect()?, medication)
    }

    fn update_medication_schedule(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        schedule: &MedicationSchedule,
        schedule_hour: u32,
    ) -> Result<bool, DatabaseError> {
        let updated = repository::update_medication_schedule(
            &self.connect()?,
            medication_id,
            user_id,
            schedule,
            schedule_hour,
        )?;
        Ok(updated > 0)
    }

    fn set_medication_audio_link(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        audio_link: &str,
    ) -> Result<bool, DatabaseError> {
        let updated =
            repository::set_medication_audio_link(&self.connect()?, medication_id, user_id, audio_link)?;
        Ok(updated > 0)
    }

    fn delete_medication(&self, medication_id: &Uuid, user_id: &Uuid) -> Result<bool, DatabaseError> {
        Ok(repository::delete_medication(&self.connect()?, medication_id, user_id)? > 0)
    }

    fn insert_occurrences(
        &self,
        medication_id: &Uuid,
        occurrences: &[NewOccurrence],
    ) -> Result<usize, DatabaseError> {
        self.write(|tx| Ok(repository::insert_occurrences(tx, medication_id, occurrences)?.len()))
    }

    fn delete_occurrences_by_medication_id(&self, medication_id: &Uuid) -> Result<usize, DatabaseError> {
        repository::delete_occurrences_by_medication(&self.connect()?, medication_id)
    }

    fn occurrences(&self, medication_id: &Uuid) -> Result<Vec<Occurrence>, DatabaseError> {
        repository::get_occurrences_by_medication(&self.connect()?, medication_id)
    }

    fn occurrences_on(
        &self,
        medication_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Occurrence>, DatabaseError> {
        repository::get_occurrences_by_medication_and_date(&self.connect()?, medication_id, date)
    }

    fn set_occurrence_audio_link(
        &self,
        occurrence_id: &Uuid,
        user_id: &Uuid,
        audio_link: &str,
    ) -> Result<bool, DatabaseError> {
        let updated =
            repository::set_occurrence_audio_link(&self.connect()?, occurrence_id, user_id, audio_link)?;
        Ok(updated > 0)
    }

    fn note_exists(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        text: &str,
        note_type: NoteType,
    ) -> Result<bool, DatabaseError> {
        repository::note_exists(&self.connect()?, medication_id, user_id, text, note_type)
    }

    fn insert_note(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        text: &str,
        note_type: NoteType,
    ) -> Result<Note, DatabaseError> {
        let note = new_note(medication_id, user_id, text, note_type);
        repository::insert_note(&self.connect()?, &note)?;
        Ok(note)
    }

    fn notes(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        note_type: Option<NoteType>,
    ) -> Result<Vec<Note>, DatabaseError> {
        repository::get_notes(&self.connect()?, medication_id, user_id, note_type)
    }

    fn delete_notes_by_prefix(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        prefix: &str,
    ) -> Result<usize, DatabaseError> {
        repository::delete_notes_by_prefix(&self.connect()?, medication_id, user_id, prefix)
    }

    fn delete_notes_by_medication_id(&self, medication_id: &Uuid) -> Result<usize, DatabaseError> {
        repository::delete_notes_by_medication(&self.connect()?, medication_id)
    }

    fn create_medication(
        &self,
        medication: &Medication,
        occurrences: &[NewOccurrence],
    ) -> Result<usize, DatabaseError> {
        self.write(|tx| {
            repository::insert_medication(tx, medication)?;
            Ok(repository::insert_occurrences(tx, &medication.id, occurrences)?.len())
        })
    }

    fn replace_schedule(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        schedule: &MedicationSchedule,
        schedule_hour: u32,
        occurrences: &[NewOccurrence],
    ) -> Result<Option<usize>, DatabaseError> {
        self.write(|tx| {
            let updated =
                repository::update_medication_schedule(tx, medication_id, user_id, schedule, schedule_hour)?;
            if updated == 0 {
                return Ok(None);
            }
            let removed = repository::delete_occurrences_by_medication(tx, medication_id)?;
            let inserted = repository::insert_occurrences(tx, medication_id, occurrences)?.len();
            tracing::debug!(%medication_id, removed, inserted, "Replaced occurrence set");
            Ok(Some(inserted))
        })
    }

    fn delete_medication_cascade(&self, medication_id: &Uuid, user_id: &Uuid) -> Result<bool, DatabaseError> {
        self.write(|tx| {
            if repository::get_medication_owner(tx, medication_id)? != Some(*user_id) {
                return Ok(false);
            }
            let occurrences = repository::delete_occurrences_by_medication(tx, medication_id)?;
            let notes = repository::delete_notes_by_medication(tx, medication_id)?;
            let deleted = repository::delete_medication(tx, medication_id, user_id)? > 0;
            tracing::debug!(%medication_id, occurrences, notes, deleted, "Cascade delete");
            Ok(deleted)
        })
    }

    fn insert_notes_if_absent(
        &self,
        medication_id: &Uuid,
        user_id: &Uuid,
        lines: &[String],
        note_type: NoteType,
    ) -> Result<usize, DatabaseError> {
        self.write(|tx| {
            let mut inserted = 0;
            for line in lines {
                if !repository::note_exists(tx, medication_id, user_id, line, note_type)? {
                    repository::insert_note(tx, &new_note(medication_id, user_id, line, note_type))?;
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> (tempfile::TempDir, SqliteScheduleStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = EngineConfig {
            database_path: dir.path().join("meds.db"),
            busy_timeout: Duration::from_millis(50),
        };
        let store = SqliteScheduleStore::open(&config).expect("Failed to open store");
        (dir, store)
    }

    fn make_medication(user_id: Uuid) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            user_id,
            name: "Aspirin".into(),
            schedule_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            frequency_type: "Daily".into(),
            start_hour: "08:00".into(),
            end_hour: "20:00".into(),
            repeat_times: 1,
            repeat_duration: 4,
            schedule_hour: 8,
            audio_link: None,
            created_at: now_timestamp(),
        }
    }

    /// `hour` above 23 violates the schedule_hour CHECK constraint.
    fn occurrence(hour: u32) -> NewOccurrence {
        NewOccurrence {
            name: "Aspirin".into(),
            schedule_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            occurrence_time: chrono::NaiveTime::from_hms_opt(hour % 24, 0, 0).unwrap(),
            schedule_hour: hour,
            audio_link: None,
        }
    }

    #[test]
    fn create_medication_is_atomic() {
        let (_dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());

        // Invalid hour trips the CHECK constraint on the second occurrence
        let result = store.create_medication(&med, &[occurrence(12), occurrence(24)]);
        assert!(result.is_err());
        assert!(store.get_medication(&med.id).unwrap().is_none());
        assert!(store.occurrences(&med.id).unwrap().is_empty());

        assert_eq!(store.create_medication(&med, &[occurrence(12)]).unwrap(), 1);
        assert!(store.get_medication(&med.id).unwrap().is_some());
    }

    #[test]
    fn replace_schedule_rolls_back_on_insert_failure() {
        let (_dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());
        store.create_medication(&med, &[occurrence(12)]).unwrap();

        let mut schedule = med.schedule();
        schedule.start_hour = "09:00".into();
        let result = store.replace_schedule(&med.id, &med.user_id, &schedule, 9, &[occurrence(13), occurrence(24)]);
        assert!(result.is_err());

        let occurrences = store.occurrences(&med.id).unwrap();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].schedule_hour, 12);
        assert_eq!(store.get_medication(&med.id).unwrap().unwrap().start_hour, "08:00");
    }

    #[test]
    fn replace_schedule_for_wrong_user_is_none() {
        let (_dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());
        store.create_medication(&med, &[occurrence(12)]).unwrap();

        let result = store
            .replace_schedule(&med.id, &Uuid::new_v4(), &med.schedule(), 8, &[occurrence(14)])
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.occurrences(&med.id).unwrap()[0].schedule_hour, 12);
    }

    #[test]
    fn held_write_lock_surfaces_busy() {
        let (dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());
        store.create_medication(&med, &[occurrence(12)]).unwrap();

        let mut blocker = Connection::open(dir.path().join("meds.db")).unwrap();
        let _held = blocker
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();

        let err = store
            .replace_schedule(&med.id, &med.user_id, &med.schedule(), 8, &[occurrence(14)])
            .unwrap_err();
        assert!(err.is_lock_conflict(), "expected busy, got {err:?}");
    }

    #[test]
    fn transactional_note_dedup() {
        let (_dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());
        store.create_medication(&med, &[]).unwrap();

        let lines = vec!["Repeat Times: 1".to_string(), "Repeat Times: 1".to_string()];
        assert_eq!(store.insert_notes_if_absent(&med.id, &med.user_id, &lines, NoteType::Auto).unwrap(), 1);
        assert_eq!(store.insert_notes_if_absent(&med.id, &med.user_id, &lines, NoteType::Auto).unwrap(), 0);
    }

    #[test]
    fn cascade_delete_removes_children_first() {
        let (_dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());
        store.create_medication(&med, &[occurrence(12)]).unwrap();
        store.insert_note(&med.id, &med.user_id, "Take with food", NoteType::Manual).unwrap();

        assert!(store.delete_medication_cascade(&med.id, &med.user_id).unwrap());
        assert!(store.get_medication(&med.id).unwrap().is_none());
        assert!(store.occurrences(&med.id).unwrap().is_empty());
        assert!(store.notes(&med.id, &med.user_id, None).unwrap().is_empty());
        assert!(!store.delete_medication_cascade(&med.id, &med.user_id).unwrap());
    }

    #[test]
    fn cascade_delete_by_other_user_keeps_children() {
        let (_dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());
        store.create_medication(&med, &[occurrence(12)]).unwrap();
        store.insert_note(&med.id, &med.user_id, "Take with food", NoteType::Manual).unwrap();

        assert!(!store.delete_medication_cascade(&med.id, &Uuid::new_v4()).unwrap());
        assert!(store.get_medication(&med.id).unwrap().is_some());
        assert_eq!(store.occurrences(&med.id).unwrap().len(), 1);
        assert_eq!(store.notes(&med.id, &med.user_id, None).unwrap().len(), 1);
    }

    #[test]
    fn plain_delete_blocked_by_children() {
        let (_dir, store) = setup_store();
        let med = make_medication(Uuid::new_v4());
        store.create_medication(&med, &[occurrence(12)]).unwrap();

        // Foreign keys keep the parent until its occurrences are gone
        assert!(store.delete_medication(&med.id, &med.user_id).is_err());
        store.delete_occurrences_by_medication_id(&med.id).unwrap();
        assert!(store.delete_medication(&med.id, &med.user_id).unwrap());
    }
}
