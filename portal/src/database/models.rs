//! Database models
//!
//! Rust structs for everything kept in local storage.
//! Routines and the profile keep their camelCase field names when serialized
//! so stored values stay readable by the web build of the portal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Raw key/value row in local storage
#[derive(Debug, Clone, FromRow)]
pub struct StorageEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Bn => "bn",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "bn" => Ok(Language::Bn),
            other => Err(format!("Unsupported language '{}', use 'en' or 'bn'", other)),
        }
    }
}

/// One scheduled lesson with an optional daily alarm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoutine {
    pub id: String,
    /// Wall-clock time of day, `HH:MM` 24-hour
    pub time: String,
    pub class_name: String,
    pub section: String,
    pub subject: String,
    #[serde(default)]
    pub homework: String,
    pub alarm_active: bool,
    /// Opaque reference to an alarm sound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_music: Option<String>,
}

impl ClassRoutine {
    /// Homework text, or the placeholder when none was given
    pub fn homework_or_default(&self) -> &str {
        if self.homework.trim().is_empty() {
            crate::config::DEFAULT_HOMEWORK
        } else {
            &self.homework
        }
    }
}

/// Validated input for a new routine. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoutine {
    pub time: String,
    pub class_name: String,
    pub section: String,
    pub subject: String,
    pub homework: Option<String>,
    pub alarm_music: Option<String>,
}

/// The single locally held teacher account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Data URL or remote URL of the profile picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub notes: String,
}
