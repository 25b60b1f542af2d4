//! Auto notes: one human-readable line per schedule field.

use super::error::EngineError;
use super::time::format_time_string;
use crate::config::DEFAULT_FREQUENCY_TYPE;
use crate::models::MedicationSchedule;

pub const AUTO_NOTE_COUNT: usize = 5;

/// The five auto-note lines for a schedule, in fixed order. Unreadable
/// hours render as `Invalid Time`, so the list is always complete.
pub fn generate_auto_notes(schedule: &MedicationSchedule) -> [String; AUTO_NOTE_COUNT] {
    let frequency_type = match schedule.frequency_type.trim() {
        "" => DEFAULT_FREQUENCY_TYPE,
        label => label,
    };
    [
        format!("Repeat Times: {}", schedule.repeat_times),
        format!("Start Hour: {}", format_time_string(&schedule.start_hour)),
        format!("End Hour: {}", format_time_string(&schedule.end_hour)),
        format!("Repeat Duration: {}", schedule.repeat_duration),
        format!("Frequency Type: {frequency_type}"),
    ]
}

/// Reduce a user-supplied note reference to the label before its first
/// `:`; "Start Hour: 9:00" and "Start Hour" both become "Start Hour".
pub fn note_prefix_key(prefix: &str) -> Result<&str, EngineError> {
    let key = prefix.split(':').next().unwrap_or_default().trim();
    if key.is_empty() {
        return Err(EngineError::Validation(
            "note prefix must contain text before ':'".into(),
        ));
    }
    Ok(key)
}
