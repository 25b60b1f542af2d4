use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::medication::{parse_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

const TIME_FORMAT: &str = "%H:%M:%S";

/// Insert a generated batch for one medication, preserving batch order.
pub fn insert_occurrences(
    conn: &Connection,
    medication_id: &Uuid,
    batch: &[NewOccurrence],
) -> Result<Vec<Occurrence>, DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO medication_occurrences (id, medication_id, name, schedule_date,
         occurrence_time, schedule_hour, audio_link)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    let mut stored = Vec::with_capacity(batch.len());
    for new in batch {
        let occurrence = Occurrence {
            id: Uuid::new_v4(),
            medication_id: *medication_id,
            name: new.name.clone(),
            schedule_date: new.schedule_date,
            occurrence_time: new.occurrence_time,
            schedule_hour: new.schedule_hour,
            audio_link: new.audio_link.clone(),
        };
        stmt.execute(params![
            occurrence.id.to_string(),
            occurrence.medication_id.to_string(),
            occurrence.name,
            occurrence.schedule_date.to_string(),
            occurrence.occurrence_time.format(TIME_FORMAT).to_string(),
            occurrence.schedule_hour,
            occurrence.audio_link,
        ])?;
        stored.push(occurrence);
    }
    Ok(stored)
}

pub fn get_occurrences_by_medication(
    conn: &Connection,
    medication_id: &Uuid,
) -> Result<Vec<Occurrence>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, medication_id, name, schedule_date, occurrence_time, schedule_hour, audio_link
         FROM medication_occurrences WHERE medication_id = ?1
         ORDER BY schedule_date, rowid",
    )?;

    let rows = stmt.query_map(params![medication_id.to_string()], occurrence_row_from_rusqlite)?;

    let mut occurrences = Vec::new();
    for row in rows {
        occurrences.push(occurrence_from_row(row?)?);
    }
    Ok(occurrences)
}

pub fn get_occurrences_by_medication_and_date(
    conn: &Connection,
    medication_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<Occurrence>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, medication_id, name, schedule_date, occurrence_time, schedule_hour, audio_link
         FROM medication_occurrences WHERE medication_id = ?1 AND schedule_date = ?2
         ORDER BY rowid",
    )?;

    let rows = stmt.query_map(
        params![medication_id.to_string(), date.to_string()],
        occurrence_row_from_rusqlite,
    )?;

    let mut occurrences = Vec::new();
    for row in rows {
        occurrences.push(occurrence_from_row(row?)?);
    }
    Ok(occurrences)
}

pub fn delete_occurrences_by_medication(
    conn: &Connection,
    medication_id: &Uuid,
) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medication_occurrences WHERE medication_id = ?1",
        params![medication_id.to_string()],
    )?;
    Ok(deleted)
}

/// Set the reminder sound of one occurrence, only if the user owns its medication.
pub fn set_occurrence_audio_link(
    conn: &Connection,
    occurrence_id: &Uuid,
    user_id: &Uuid,
    audio_link: &str,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE medication_occurrences SET audio_link = ?3
         WHERE id = ?1
           AND medication_id IN (SELECT id FROM medications WHERE user_id = ?2)",
        params![occurrence_id.to_string(), user_id.to_string(), audio_link],
    )?;
    Ok(updated)
}

struct OccurrenceRow {
    id: String,
    medication_id: String,
    name: String,
    schedule_date: String,
    occurrence_time: String,
    schedule_hour: u32,
    audio_link: Option<String>,
}

fn occurrence_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<OccurrenceRow, rusqlite::Error> {
    Ok(OccurrenceRow {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        name: row.get(2)?,
        schedule_date: row.get(3)?,
        occurrence_time: row.get(4)?,
        schedule_hour: row.get(5)?,
        audio_link: row.get(6)?,
    })
}

fn occurrence_from_row(row: OccurrenceRow) -> Result<Occurrence, DatabaseError> {
    let occurrence_time = NaiveTime::parse_from_str(&row.occurrence_time, TIME_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad time {:?}: {e}", row.occurrence_time)))?;

    Ok(Occurrence {
        id: parse_uuid(&row.id)?,
        medication_id: parse_uuid(&row.medication_id)?,
        name: row.name,
        schedule_date: parse_date(&row.schedule_date)?,
        occurrence_time,
        schedule_hour: row.schedule_hour,
        audio_link: row.audio_link,
    })
}
