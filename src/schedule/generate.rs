//! Occurrence generation: expands one schedule into its reminder instances.

use chrono::{Duration, NaiveTime, Timelike};

use super::error::EngineError;
use super::time::{parse_hh_mm, window_minutes};
use crate::config::{DEFAULT_FREQUENCY_TYPE, MAX_REPEAT_TIMES};
use crate::models::{MedicationSchedule, NewOccurrence};

/// A schedule that passed boundary validation, with parsed hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSchedule {
    pub schedule: MedicationSchedule,
    pub start: NaiveTime,
}

impl ValidatedSchedule {
    /// Hour component of the start time.
    pub fn schedule_hour(&self) -> u32 {
        self.start.hour()
    }
}

/// Normalize and validate a schedule: trims the name and frequency label
/// (blank label becomes `Daily`), checks repeat count, hour formats and
/// that the requested span fits in the window. The count is capped at
/// [`MAX_REPEAT_TIMES`] even when the span is zero.
pub fn validate_schedule(schedule: &MedicationSchedule) -> Result<ValidatedSchedule, EngineError> {
    let name = schedule.name.trim();
    if name.is_empty() {
        return Err(EngineError::Validation("name must not be empty".into()));
    }
    if schedule.repeat_times < 1 {
        return Err(EngineError::Validation(
            "repeat_times must be a positive whole number".into(),
        ));
    }

    let start = parse_hh_mm("start_hour", &schedule.start_hour)?;
    let end = parse_hh_mm("end_hour", &schedule.end_hour)?;

    let needed_minutes = u64::from(schedule.repeat_times)
        .saturating_mul(u64::from(schedule.repeat_duration))
        .saturating_mul(60);
    let window = window_minutes(start, end);
    if needed_minutes > window {
        return Err(EngineError::ScheduleOverflow {
            repeat_times: schedule.repeat_times,
            repeat_duration: schedule.repeat_duration,
            needed_minutes,
            window_minutes: window,
        });
    }
    if schedule.repeat_times > MAX_REPEAT_TIMES {
        return Err(EngineError::Validation(format!(
            "repeat_times must be at most {MAX_REPEAT_TIMES}, got {}",
            schedule.repeat_times
        )));
    }

    let frequency_type = match schedule.frequency_type.trim() {
        "" => DEFAULT_FREQUENCY_TYPE.to_string(),
        label => label.to_string(),
    };

    Ok(ValidatedSchedule {
        schedule: MedicationSchedule {
            name: name.to_string(),
            frequency_type,
            ..schedule.clone()
        },
        start,
    })
}

/// Expand a schedule into exactly `repeat_times` occurrences.
///
/// Occurrence `i` (1-based) falls `i * repeat_duration` hours after
/// `start_hour`, so the first reminder is one interval after the start.
/// Times wrap past midnight and stay on `schedule_date`.
pub fn generate_occurrences(schedule: &MedicationSchedule) -> Result<Vec<NewOccurrence>, EngineError> {
    let validated = validate_schedule(schedule)?;
    Ok(expand(&validated))
}

pub(crate) fn expand(validated: &ValidatedSchedule) -> Vec<NewOccurrence> {
    let schedule = &validated.schedule;
    let step = Duration::hours(i64::from(schedule.repeat_duration));

    let mut occurrences = Vec::new();
    let mut time = validated.start;
    for _ in 0..schedule.repeat_times {
        // NaiveTime + Duration wraps around midnight
        time = time + step;
        occurrences.push(NewOccurrence {
            name: schedule.name.clone(),
            schedule_date: schedule.schedule_date,
            occurrence_time: time,
            schedule_hour: time.hour(),
            audio_link: None,
        });
    }

    tracing::debug!(
        name = %schedule.name,
        count = occurrences.len(),
        "Generated occurrences"
    );
    occurrences
}
