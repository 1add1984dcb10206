//! Settings-related commands
//!
//! AI model, alarm polling interval and the API key in the credential store.
//! Changes apply the next time the portal starts.

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::services::settings::{AiSettings, AlarmSettings};
use crate::services::{AppSettings, CredentialManager};

// ===== Stored Settings =====

/// Current settings as stored on disk
pub async fn get_settings(state: &AppState) -> Result<AppSettings> {
    state.settings_service.load().await
}

/// Change the generative AI model
pub async fn set_ai_model(state: &AppState, model: &str) -> Result<AiSettings> {
    let model = model.trim();
    if model.is_empty() {
        return Err(AppError::Generic("Model name cannot be empty".to_string()));
    }

    let mut ai = state.settings_service.load().await?.ai;
    ai.model = model.to_string();
    state.settings_service.update_ai(ai.clone()).await?;

    tracing::info!("AI model set to {}", ai.model);
    Ok(ai)
}

/// Change the alarm polling interval. Out-of-range values are clamped on use.
pub async fn set_tick_interval(state: &AppState, tick_interval_ms: u64) -> Result<AlarmSettings> {
    let alarm = AlarmSettings { tick_interval_ms };
    state.settings_service.update_alarm(alarm.clone()).await?;

    tracing::info!("Alarm tick interval set to {:?}", alarm.tick_interval());
    Ok(alarm)
}

// ===== API Key =====

/// Store the AI API key in the OS credential store
pub fn set_api_key(api_key: &str) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::Generic("API key cannot be empty".to_string()));
    }

    CredentialManager::store_api_key(api_key)
}

/// Remove the stored AI API key
pub fn clear_api_key() -> Result<()> {
    CredentialManager::delete_api_key()
}
