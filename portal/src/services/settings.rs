//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{
    DEFAULT_AI_BASE_URL, DEFAULT_AI_MODEL, DEFAULT_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS,
    MIN_TICK_INTERVAL_MS, QA_SYSTEM_INSTRUCTION, SCAN_PROMPT, SETTINGS_FILE_NAME,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Generative AI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// System instruction for the Q&A assistant
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    /// Instruction sent with scanned images
    #[serde(default = "default_scan_prompt")]
    pub scan_prompt: String,
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

fn default_ai_base_url() -> String {
    DEFAULT_AI_BASE_URL.to_string()
}

fn default_system_instruction() -> String {
    QA_SYSTEM_INSTRUCTION.to_string()
}

fn default_scan_prompt() -> String {
    SCAN_PROMPT.to_string()
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: default_ai_model(),
            base_url: default_ai_base_url(),
            system_instruction: default_system_instruction(),
            scan_prompt: default_scan_prompt(),
        }
    }
}

/// Alarm polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSettings {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl AlarmSettings {
    /// Polling interval clamped to the supported range
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(
            self.tick_interval_ms
                .clamp(MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS),
        )
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub alarm: AlarmSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    /// Load settings from disk or create default if not exists.
    /// An unreadable file falls back to defaults and is left in place.
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        match serde_json::from_str::<AppSettings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse settings at {:?}, using defaults: {}",
                    self.settings_path,
                    e
                );
                Ok(AppSettings::default())
            }
        }
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Generic(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content).await?;
        tracing::debug!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Update AI settings
    pub async fn update_ai(&self, ai: AiSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.ai = ai;
        self.save(&settings).await
    }

    /// Update alarm settings
    pub async fn update_alarm(&self, alarm: AlarmSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.alarm = alarm;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.ai.model, "gemini-3-flash-preview");
        assert_eq!(settings.alarm.tick_interval_ms, 1000);
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let (service, temp) = create_test_service();

        std::fs::write(
            temp.path().join("settings.json"),
            r#"{"ai":{"model":"gemini-2.5-flash"}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.ai.model, "gemini-2.5-flash");
        assert_eq!(settings.ai.system_instruction, QA_SYSTEM_INSTRUCTION);
        assert_eq!(settings.alarm, AlarmSettings::default());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let service = SettingsService::new(path.clone());
            service
                .update_alarm(AlarmSettings {
                    tick_interval_ms: 250,
                })
                .await
                .unwrap();
        }

        {
            let service = SettingsService::new(path);
            let loaded = service.load().await.unwrap();
            assert_eq!(loaded.alarm.tick_interval_ms, 250);
            assert_eq!(loaded.ai, AiSettings::default());
        }
    }

    #[tokio::test]
    async fn test_malformed_settings_fall_back_to_defaults() {
        let (service, temp) = create_test_service();

        std::fs::write(temp.path().join("settings.json"), "{oops").unwrap();

        assert_eq!(service.load().await.unwrap(), AppSettings::default());
        assert_eq!(
            std::fs::read_to_string(temp.path().join("settings.json")).unwrap(),
            "{oops"
        );
    }

    #[test]
    fn test_tick_interval_is_clamped() {
        let fast = AlarmSettings { tick_interval_ms: 1 };
        let slow = AlarmSettings {
            tick_interval_ms: 3_600_000,
        };

        assert_eq!(fast.tick_interval(), Duration::from_millis(100));
        assert_eq!(slow.tick_interval(), Duration::from_millis(60_000));
    }
}
