//! The occurrence engine: ownership checks, validation and reconciliation
//! of a medication's occurrences and auto notes against its schedule.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::error::EngineError;
use super::generate::{expand, validate_schedule};
use super::notes::{generate_auto_notes, note_prefix_key};
use super::traits::ScheduleStore;
use crate::models::*;

/// Result of deleting a medication. Deleting twice is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

pub struct OccurrenceEngine<S: ScheduleStore> {
    store: S,
}

impl<S: ScheduleStore> OccurrenceEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pure expansion of a schedule; nothing is persisted.
    pub fn generate_occurrences(&self, schedule: &MedicationSchedule) -> Result<Vec<NewOccurrence>, EngineError> {
        super::generate::generate_occurrences(schedule)
    }

    pub fn generate_auto_notes(&self, schedule: &MedicationSchedule) -> Vec<String> {
        generate_auto_notes(schedule).to_vec()
    }

    // ── Medication lifecycle ───────────────────────────────

    /// Validate, generate and persist a new medication with its occurrences.
    pub fn create_medication(&self, user_id: Uuid, schedule: &MedicationSchedule) -> Result<Medication, EngineError> {
        let validated = validate_schedule(schedule)?;
        let occurrences = expand(&validated);
        let schedule_hour = validated.schedule_hour();
        let s = validated.schedule;

        let medication = Medication {
            id: Uuid::new_v4(),
            user_id,
            name: s.name,
            schedule_date: s.schedule_date,
            frequency_type: s.frequency_type,
            start_hour: s.start_hour,
            end_hour: s.end_hour,
            repeat_times: s.repeat_times,
            repeat_duration: s.repeat_duration,
            schedule_hour,
            audio_link: None,
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        };

        let inserted = self
            .store
            .create_medication(&medication, &occurrences)
            .map_err(|e| EngineError::from_store(e, medication.id))?;

        tracing::info!(
            medication_id = %medication.id,
            %user_id,
            occurrences = inserted,
            "Medication created"
        );
        Ok(medication)
    }

    pub fn get_medication(&self, medication_id: Uuid, user_id: Uuid) -> Result<Medication, EngineError> {
        self.authorize(medication_id, user_id)?;
        self.store
            .get_medication(&medication_id)?
            .ok_or_else(|| EngineError::medication_not_found(medication_id))
    }

    pub fn medications_on_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<Medication>, EngineError> {
        Ok(self.store.medications_on_date(&user_id, date)?)
    }

    /// Replace the medication's schedule and regenerate all of its
    /// occurrences as one unit. Returns how many occurrences now exist.
    pub fn reconcile_on_update(
        &self,
        medication_id: Uuid,
        user_id: Uuid,
        schedule: &MedicationSchedule,
    ) -> Result<usize, EngineError> {
        self.authorize(medication_id, user_id)?;

        let validated = validate_schedule(schedule)?;
        let occurrences = expand(&validated);

        let inserted = self
            .store
            .replace_schedule(
                &medication_id,
                &user_id,
                &validated.schedule,
                validated.schedule_hour(),
                &occurrences,
            )
            .map_err(|e| EngineError::from_store(e, medication_id))?
            .ok_or_else(|| EngineError::medication_not_found(medication_id))?;

        tracing::info!(%medication_id, %user_id, occurrences = inserted, "Occurrences regenerated");
        Ok(inserted)
    }

    /// Remove the medication with all of its occurrences and notes.
    pub fn reconcile_on_delete(&self, medication_id: Uuid, user_id: Uuid) -> Result<DeleteOutcome, EngineError> {
        match self.authorize(medication_id, user_id) {
            Ok(()) => {}
            Err(EngineError::NotFound { .. }) => return Ok(DeleteOutcome::NotFound),
            Err(e) => return Err(e),
        }

        let deleted = self
            .store
            .delete_medication_cascade(&medication_id, &user_id)
            .map_err(|e| EngineError::from_store(e, medication_id))?;

        if deleted {
            tracing::info!(%medication_id, %user_id, "Medication deleted");
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    // ── Occurrences ────────────────────────────────────────

    pub fn occurrences_for(&self, medication_id: Uuid, user_id: Uuid) -> Result<Vec<Occurrence>, EngineError> {
        self.authorize(medication_id, user_id)?;
        Ok(self.store.occurrences(&medication_id)?)
    }

    pub fn occurrences_on(
        &self,
        medication_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Occurrence>, EngineError> {
        self.authorize(medication_id, user_id)?;
        Ok(self.store.occurrences_on(&medication_id, date)?)
    }

    pub fn set_medication_audio_link(
        &self,
        medication_id: Uuid,
        user_id: Uuid,
        audio_link: &str,
    ) -> Result<(), EngineError> {
        let audio_link = require_audio_link(audio_link)?;
        self.authorize(medication_id, user_id)?;
        if !self.store.set_medication_audio_link(&medication_id, &user_id, audio_link)? {
            return Err(EngineError::medication_not_found(medication_id));
        }
        Ok(())
    }

    /// An occurrence reached through another user's medication reads as
    /// not found.
    pub fn set_occurrence_audio_link(
        &self,
        occurrence_id: Uuid,
        user_id: Uuid,
        audio_link: &str,
    ) -> Result<(), EngineError> {
        let audio_link = require_audio_link(audio_link)?;
        if !self.store.set_occurrence_audio_link(&occurrence_id, &user_id, audio_link)? {
            return Err(EngineError::NotFound {
                entity: "Occurrence",
                id: occurrence_id,
            });
        }
        Ok(())
    }

    // ── Notes ──────────────────────────────────────────────

    /// Store auto-note lines that are not already present. Calling this
    /// again with the same lines inserts nothing.
    pub fn store_auto_notes_if_absent(
        &self,
        medication_id: Uuid,
        user_id: Uuid,
        lines: &[String],
    ) -> Result<usize, EngineError> {
        self.authorize(medication_id, user_id)?;
        let inserted = self
            .store
            .insert_notes_if_absent(&medication_id, &user_id, lines, NoteType::Auto)
            .map_err(|e| EngineError::from_store(e, medication_id))?;
        tracing::debug!(%medication_id, offered = lines.len(), inserted, "Auto notes stored");
        Ok(inserted)
    }

    /// Derive auto notes from the saved schedule and store the missing ones.
    pub fn refresh_auto_notes(&self, medication_id: Uuid, user_id: Uuid) -> Result<usize, EngineError> {
        let medication = self.get_medication(medication_id, user_id)?;
        let lines = generate_auto_notes(&medication.schedule());
        self.store_auto_notes_if_absent(medication_id, user_id, &lines)
    }

    pub fn add_manual_note(&self, medication_id: Uuid, user_id: Uuid, text: &str) -> Result<Note, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::Validation("note text must not be empty".into()));
        }
        self.authorize(medication_id, user_id)?;
        self.store
            .insert_note(&medication_id, &user_id, text, NoteType::Manual)
            .map_err(|e| EngineError::from_store(e, medication_id))
    }

    pub fn notes_for(
        &self,
        medication_id: Uuid,
        user_id: Uuid,
        note_type: Option<NoteType>,
    ) -> Result<Vec<Note>, EngineError> {
        self.authorize(medication_id, user_id)?;
        Ok(self.store.notes(&medication_id, &user_id, note_type)?)
    }

    /// Delete notes of either type whose text starts with the label before
    /// the first `:` in `prefix`.
    pub fn delete_note_by_prefix(&self, medication_id: Uuid, user_id: Uuid, prefix: &str) -> Result<usize, EngineError> {
        let key = note_prefix_key(prefix)?;
        self.authorize(medication_id, user_id)?;
        let deleted = self
            .store
            .delete_notes_by_prefix(&medication_id, &user_id, key)
            .map_err(|e| EngineError::from_store(e, medication_id))?;
        tracing::debug!(%medication_id, key, deleted, "Notes deleted by prefix");
        Ok(deleted)
    }

    // ── Ownership ──────────────────────────────────────────

    fn authorize(&self, medication_id: Uuid, user_id: Uuid) -> Result<(), EngineError> {
        match self.store.medication_owner(&medication_id)? {
            None => Err(EngineError::medication_not_found(medication_id)),
            Some(owner) if owner == user_id => Ok(()),
            Some(_) => {
                tracing::warn!(%medication_id, %user_id, "Rejected access to another user's medication");
                Err(EngineError::medication_unauthorized(medication_id))
            }
        }
    }
}

fn require_audio_link(audio_link: &str) -> Result<&str, EngineError> {
    let audio_link = audio_link.trim();
    if audio_link.is_empty() {
        return Err(EngineError::Validation("audio_link must not be empty".into()));
    }
    Ok(audio_link)
}
