use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

const MEDICATION_COLUMNS: &str = "id, user_id, name, schedule_date, frequency_type, start_hour,
     end_hour, repeat_times, repeat_duration, schedule_hour, audio_link, created_at";

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, user_id, name, schedule_date, frequency_type, start_hour,
         end_hour, repeat_times, repeat_duration, schedule_hour, audio_link, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            med.id.to_string(),
            med.user_id.to_string(),
            med.name,
            med.schedule_date.to_string(),
            med.frequency_type,
            med.start_hour,
            med.end_hour,
            med.repeat_times,
            med.repeat_duration,
            med.schedule_hour,
            med.audio_link,
            med.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_medication(conn: &Connection, med_id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1"),
            params![med_id.to_string()],
            medication_row_from_rusqlite,
        )
        .optional()?;

    row.map(medication_from_row).transpose()
}

/// Owner of a medication, `None` if it does not exist.
pub fn get_medication_owner(conn: &Connection, med_id: &Uuid) -> Result<Option<Uuid>, DatabaseError> {
    let owner: Option<String> = conn
        .query_row(
            "SELECT user_id FROM medications WHERE id = ?1",
            params![med_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    owner.map(|s| parse_uuid(&s)).transpose()
}

/// A user's medications scheduled on `date`, earliest start first.
pub fn get_medications_by_date(
    conn: &Connection,
    user_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE user_id = ?1 AND schedule_date = ?2
         ORDER BY schedule_hour, start_hour, rowid"
    ))?;

    let rows = stmt.query_map(
        params![user_id.to_string(), date.to_string()],
        medication_row_from_rusqlite,
    )?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row?)?);
    }
    Ok(meds)
}

/// Overwrite the schedule fields of a medication. Returns rows affected.
pub fn update_medication_schedule(
    conn: &Connection,
    med_id: &Uuid,
    user_id: &Uuid,
    schedule: &MedicationSchedule,
    schedule_hour: u32,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE medications SET
           name = ?3, schedule_date = ?4, frequency_type = ?5, start_hour = ?6,
           end_hour = ?7, repeat_times = ?8, repeat_duration = ?9, schedule_hour = ?10
         WHERE id = ?1 AND user_id = ?2",
        params![
            med_id.to_string(),
            user_id.to_string(),
            schedule.name,
            schedule.schedule_date.to_string(),
            schedule.frequency_type,
            schedule.start_hour,
            schedule.end_hour,
            schedule.repeat_times,
            schedule.repeat_duration,
            schedule_hour,
        ],
    )?;
    Ok(updated)
}

pub fn set_medication_audio_link(
    conn: &Connection,
    med_id: &Uuid,
    user_id: &Uuid,
    audio_link: &str,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE medications SET audio_link = ?3 WHERE id = ?1 AND user_id = ?2",
        params![med_id.to_string(), user_id.to_string(), audio_link],
    )?;
    Ok(updated)
}

/// Delete the medication row only. Occurrences and notes must be gone first.
pub fn delete_medication(conn: &Connection, med_id: &Uuid, user_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medications WHERE id = ?1 AND user_id = ?2",
        params![med_id.to_string(), user_id.to_string()],
    )?;
    Ok(deleted)
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    user_id: String,
    name: String,
    schedule_date: String,
    frequency_type: String,
    start_hour: String,
    end_hour: String,
    repeat_times: u32,
    repeat_duration: u32,
    schedule_hour: u32,
    audio_link: Option<String>,
    created_at: String,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        schedule_date: row.get(3)?,
        frequency_type: row.get(4)?,
        start_hour: row.get(5)?,
        end_hour: row.get(6)?,
        repeat_times: row.get(7)?,
        repeat_duration: row.get(8)?,
        schedule_hour: row.get(9)?,
        audio_link: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    Ok(Medication {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        name: row.name,
        schedule_date: parse_date(&row.schedule_date)?,
        frequency_type: row.frequency_type,
        start_hour: row.start_hour,
        end_hour: row.end_hour,
        repeat_times: row.repeat_times,
        repeat_duration: row.repeat_duration,
        schedule_hour: row.schedule_hour,
        audio_link: row.audio_link,
        created_at: row.created_at,
    })
}

pub(super) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(super) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {s:?}: {e}")))
}
