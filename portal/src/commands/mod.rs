//! Commands exposed to the front end
//!
//! This module organizes commands into logical submodules:
//! - `auth`: Signup, login and logout
//! - `routines`: Class routine form validation and CRUD
//! - `profile`: Profile edits, notebook, language and dashboard
//! - `assistant`: Text scanner and Q&A
//! - `settings`: Application settings and the AI API key

pub mod assistant;
pub mod auth;
pub mod profile;
pub mod routines;
pub mod settings;

use crate::app::AppState;
use crate::error::Result;

pub use assistant::*;
pub use auth::*;
pub use profile::*;
pub use routines::*;
pub use settings::*;

/// Get application information
pub async fn get_app_info(state: &AppState) -> Result<AppInfo> {
    let stored_keys = state
        .store
        .entries()
        .await?
        .into_iter()
        .map(|entry| entry.key)
        .collect();

    Ok(AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app_data_dir: state.app_data_dir.to_string_lossy().to_string(),
        signed_in_as: state.session.read().await.user().map(|user| user.id.clone()),
        stored_keys,
        ai_model: state.settings.ai.model.clone(),
    })
}

/// Application information structure
#[derive(Debug, serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub app_data_dir: String,
    pub signed_in_as: Option<String>,
    pub stored_keys: Vec<String>,
    pub ai_model: String,
}
