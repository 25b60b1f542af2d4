use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::medication::parse_uuid;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_note(conn: &Connection, note: &Note) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medication_notes (id, medication_id, user_id, note_text, note_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            note.id.to_string(),
            note.medication_id.to_string(),
            note.user_id.to_string(),
            note.note_text,
            note.note_type.as_str(),
            note.created_at,
        ],
    )?;
    Ok(())
}

/// Exact-text existence check, scoped to medication, user and note type.
pub fn note_exists(
    conn: &Connection,
    medication_id: &Uuid,
    user_id: &Uuid,
    note_text: &str,
    note_type: NoteType,
) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM medication_notes
            WHERE medication_id = ?1 AND user_id = ?2 AND note_text = ?3 AND note_type = ?4
         )",
        params![
            medication_id.to_string(),
            user_id.to_string(),
            note_text,
            note_type.as_str(),
        ],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Notes in insertion order, optionally restricted to one type.
pub fn get_notes(
    conn: &Connection,
    medication_id: &Uuid,
    user_id: &Uuid,
    note_type: Option<NoteType>,
) -> Result<Vec<Note>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, medication_id, user_id, note_text, note_type, created_at
         FROM medication_notes
         WHERE medication_id = ?1 AND user_id = ?2 AND (?3 IS NULL OR note_type = ?3)
         ORDER BY rowid",
    )?;

    let rows = stmt.query_map(
        params![
            medication_id.to_string(),
            user_id.to_string(),
            note_type.map(|t| t.as_str()),
        ],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        },
    )?;

    let mut notes = Vec::new();
    for row in rows {
        let (id, med_id, user, note_text, note_type, created_at) = row?;
        notes.push(Note {
            id: parse_uuid(&id)?,
            medication_id: parse_uuid(&med_id)?,
            user_id: parse_uuid(&user)?,
            note_text,
            note_type: NoteType::from_str(&note_type)?,
            created_at,
        });
    }
    Ok(notes)
}

/// Delete notes whose text starts with `prefix`. The match is literal:
/// `%` and `_` in the prefix are not wildcards.
pub fn delete_notes_by_prefix(
    conn: &Connection,
    medication_id: &Uuid,
    user_id: &Uuid,
    prefix: &str,
) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medication_notes
         WHERE medication_id = ?1 AND user_id = ?2
           AND substr(note_text, 1, length(?3)) = ?3",
        params![medication_id.to_string(), user_id.to_string(), prefix],
    )?;
    Ok(deleted)
}

/// Delete every note attached to a medication, auto and manual alike.
pub fn delete_notes_by_medication(conn: &Connection, medication_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medication_notes WHERE medication_id = ?1",
        params![medication_id.to_string()],
    )?;
    Ok(deleted)
}
