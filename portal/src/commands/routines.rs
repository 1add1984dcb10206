//! Routine commands
//!
//! Form validation happens here, before anything reaches the routine store.

use crate::app::AppState;
use crate::config::{sections_for, SECTIONS};
use crate::database::{ClassRoutine, NewRoutine};
use crate::error::{AppError, Result, ValidationError};
use chrono::NaiveTime;

/// Raw "New Schedule" form
#[derive(Debug, Clone, Default)]
pub struct RoutineForm {
    pub time: String,
    pub class_name: String,
    pub section: String,
    pub subject: String,
    pub homework: Option<String>,
    pub alarm_music: Option<String>,
}

fn required(value: &str, field: &'static str) -> std::result::Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(value.to_string())
}

/// Check a form and normalize its time to `HH:MM`
pub fn validate_routine(form: RoutineForm) -> std::result::Result<NewRoutine, ValidationError> {
    let raw_time = required(&form.time, "time")?;
    let class_name = required(&form.class_name, "class")?;
    let section = required(&form.section, "section")?;
    let subject = required(&form.subject, "subject")?;

    let time = NaiveTime::parse_from_str(&raw_time, "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(raw_time.clone()))?
        .format("%H:%M")
        .to_string();

    let sections = sections_for(&class_name);
    if sections.is_empty() {
        return Err(ValidationError::UnknownClass(class_name));
    }
    if !sections.contains(&section.as_str()) {
        return Err(ValidationError::UnknownSection {
            class_name,
            section,
        });
    }

    Ok(NewRoutine {
        time,
        class_name,
        section,
        subject,
        homework: form
            .homework
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty()),
        alarm_music: form.alarm_music.filter(|m| !m.trim().is_empty()),
    })
}

/// Class levels with their sections, for the form's pickers
pub fn list_sections() -> Vec<(&'static str, &'static [&'static str])> {
    SECTIONS.to_vec()
}

/// Add a routine for the signed-in teacher
pub async fn add_routine(state: &AppState, form: RoutineForm) -> Result<ClassRoutine> {
    state.auth.require_user().await?;

    let new = validate_routine(form).inspect_err(|e| {
        tracing::info!("Routine rejected: {}", e);
    })?;

    state.routines.add(new).await
}

/// List routines in stored order
pub async fn list_routines(state: &AppState) -> Result<Vec<ClassRoutine>> {
    state.auth.require_user().await?;
    state.routines.list().await
}

/// Flip a routine's alarm flag
pub async fn toggle_alarm(state: &AppState, id: &str) -> Result<ClassRoutine> {
    state.auth.require_user().await?;
    state
        .routines
        .toggle_alarm(id)
        .await?
        .ok_or_else(|| AppError::RoutineNotFound(id.to_string()))
}

/// Delete a routine
pub async fn delete_routine(state: &AppState, id: &str) -> Result<ClassRoutine> {
    state.auth.require_user().await?;
    state
        .routines
        .remove(id)
        .await?
        .ok_or_else(|| AppError::RoutineNotFound(id.to_string()))
}
