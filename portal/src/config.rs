//! Application configuration constants
//!
//! Central location for the allowlist, storage keys, placeholder text,
//! AI defaults and alarm timing bounds used throughout the application.

// ===== Authentication =====

/// Prefix shared by every authorized teacher ID (e.g. "NUHS7")
pub const TEACHER_ID_PREFIX: &str = "NUHS";

/// Number of authorized teacher IDs. Valid indices are 1..=20.
pub const AUTHORIZED_TEACHER_COUNT: u32 = 20;

/// Required password length in characters
pub const PASSWORD_LENGTH: usize = 6;

// ===== Local Storage Keys =====

/// Serialized `UserProfile` of the single local account
pub const KEY_USER: &str = "user";
/// Serialized array of `ClassRoutine`
pub const KEY_ROUTINES: &str = "routines";
/// Raw text of the dashboard notebook
pub const KEY_TEACHER_NOTES: &str = "teacher_notes";
/// Two-letter language code
pub const KEY_LANG: &str = "lang";

// ===== Files =====

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "nuhs-portal";
/// SQLite database file holding local storage
pub const DATABASE_FILE_NAME: &str = "portal.db";
/// JSON settings file
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "NUHS_PORTAL_DATA_DIR";

// ===== Routines =====

/// Shown when a routine has no homework text
pub const DEFAULT_HOMEWORK: &str = "Review previous lesson";

/// Avatar used when signup provides no picture; the teacher ID is appended
pub const DEFAULT_AVATAR_URL: &str = "https://i.pravatar.cc/150?u=";

/// Sections available for each class level.
pub const SECTIONS: &[(&str, &[&str])] = &[
    ("6", &["পদ্মা", "মেঘনা"]),
    ("7", &["গোলাপ", "শাপলা"]),
    ("8", &["ময়না", "টিয়া"]),
    ("9", &["বিজ্ঞান", "মানবিক"]),
    ("10", &["বিজ্ঞান", "মানবিক"]),
];

/// Look up the sections of a class level. Unknown levels have none.
pub fn sections_for(class_name: &str) -> &'static [&'static str] {
    SECTIONS
        .iter()
        .find(|(class, _)| *class == class_name.trim())
        .map(|(_, sections)| *sections)
        .unwrap_or(&[])
}

// ===== Generative AI =====

pub const DEFAULT_AI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// System instruction for the Q&A assistant
pub const QA_SYSTEM_INSTRUCTION: &str =
    "Provide a quick, professional answer for a high school teacher in Bangladesh.";

/// Instruction sent alongside a scanned image
pub const SCAN_PROMPT: &str = "Read all the text visible in this image and return only the text. If it is a URL, just return the URL.";

/// Result text when the model returns nothing for a scan
pub const EMPTY_SCAN_RESULT: &str = "No text found.";
/// Result text when the model returns nothing for a question
pub const EMPTY_ANSWER_RESULT: &str = "No data.";

/// Environment variables checked for the API key, in order
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

// ===== Alarm Timing =====

/// Default alarm polling interval in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// Minimum polling interval. Anything faster only burns CPU.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Maximum polling interval (1 minute). Slower ticks could skip a matching minute.
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;
