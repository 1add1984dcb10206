//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::{APP_DIR_NAME, DATABASE_FILE_NAME, DATA_DIR_ENV};
use crate::database::{create_pool, LocalStore};
use crate::error::{AppError, Result};
use crate::services::{
    AlarmService, AppSettings, AssistantService, AuthService, Clock, CredentialManager,
    GeminiClient, GenerativeAi, ProfileService, RoutinesService, SessionHandle, SettingsService,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings: AppSettings,
    pub settings_service: SettingsService,
    pub store: LocalStore,
    pub session: SessionHandle,
    pub auth: AuthService,
    pub routines: RoutinesService,
    pub profile: ProfileService,
    pub assistant: AssistantService,
    pub alarms: AlarmService,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Production setup: system clock and the Gemini client
    pub async fn initialize(app_data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&app_data_dir)?;
        let settings = SettingsService::new(app_data_dir.clone()).load().await?;

        let api_key = CredentialManager::resolve_api_key();
        if api_key.is_none() {
            tracing::warn!("No AI API key configured; scanner and Q&A will report an error");
        }
        let ai = Arc::new(GeminiClient::new(&settings.ai, api_key)?);

        Self::with_services(app_data_dir, settings, ai, Arc::new(SystemClock)).await
    }

    /// Setup with explicit settings, AI collaborator and clock
    pub async fn with_services(
        app_data_dir: PathBuf,
        settings: AppSettings,
        ai: Arc<dyn GenerativeAi>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        tracing::info!("App data directory: {:?}", app_data_dir);
        std::fs::create_dir_all(&app_data_dir)?;

        let settings_service = SettingsService::new(app_data_dir.clone());

        let pool = create_pool(&app_data_dir.join(DATABASE_FILE_NAME)).await?;
        let store = LocalStore::new(pool);
        let session = SessionHandle::default();

        let auth = AuthService::new(store.clone(), session.clone());
        auth.restore().await?;

        let routines = RoutinesService::new(store.clone());
        let profile = ProfileService::new(store.clone(), session.clone());
        let assistant = AssistantService::new(ai, settings.ai.clone());
        let alarms = AlarmService::new(
            routines.clone(),
            Arc::clone(&clock),
            settings.alarm.tick_interval(),
        );

        tracing::info!("Application initialized successfully");

        Ok(Self {
            app_data_dir,
            settings,
            settings_service,
            store,
            session,
            auth,
            routines,
            profile,
            assistant,
            alarms,
            clock,
        })
    }
}

/// Data directory: `NUHS_PORTAL_DATA_DIR`, else the platform data dir
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::Generic("Failed to locate the user data directory".to_string()))
}
