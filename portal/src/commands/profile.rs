//! Profile, notebook, language and dashboard commands

use crate::app::AppState;
use crate::database::{ClassRoutine, Language, UserProfile};
use crate::error::{AppError, Result};
use crate::services::alarms::next_upcoming;
use crate::services::ProfileUpdate;

/// Everything the dashboard screen shows
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub user: UserProfile,
    /// Current wall-clock time, `HH:MM`
    pub time: String,
    pub next_class: Option<ClassRoutine>,
    pub notes: String,
}

/// The signed-in teacher's profile
pub async fn get_profile(state: &AppState) -> Result<UserProfile> {
    state.auth.require_user().await
}

/// Save the profile edit form
pub async fn update_profile(state: &AppState, update: ProfileUpdate) -> Result<UserProfile> {
    state.profile.update_profile(update).await
}

/// Replace the profile picture
pub async fn set_profile_pic(state: &AppState, profile_pic: &str) -> Result<UserProfile> {
    let profile_pic = profile_pic.trim();
    if profile_pic.is_empty() {
        return Err(AppError::Generic("Profile picture cannot be empty".to_string()));
    }

    state.profile.set_profile_pic(profile_pic.to_string()).await
}

pub async fn get_notes(state: &AppState) -> Result<String> {
    state.auth.require_user().await?;
    state.profile.notes().await
}

pub async fn save_notes(state: &AppState, text: &str) -> Result<()> {
    state.auth.require_user().await?;
    state.profile.save_notes(text).await
}

pub async fn get_language(state: &AppState) -> Result<Language> {
    state.profile.language().await
}

pub async fn set_language(state: &AppState, language: Language) -> Result<()> {
    state.profile.set_language(language).await?;
    tracing::info!("Language set to {}", language);
    Ok(())
}

/// Greeting, clock, next class today and the notebook
pub async fn dashboard(state: &AppState) -> Result<Dashboard> {
    let user = state.auth.require_user().await?;
    let now = state.clock.now();
    let routines = state.routines.list().await?;

    Ok(Dashboard {
        user,
        time: now.format("%H:%M").to_string(),
        next_class: next_upcoming(&routines, now.time()).cloned(),
        notes: state.profile.notes().await?,
    })
}
