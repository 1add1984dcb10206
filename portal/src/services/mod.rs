//! Services module
//!
//! Business logic services that coordinate between commands and local storage.

pub mod alarms;
pub mod assistant;
pub mod auth;
pub mod credentials;
pub mod profile;
pub mod routines;
pub mod settings;

pub use alarms::{
    AlarmEvent, AlarmService, AlarmState, AlarmTrigger, Clock, MinuteKey, SystemClock,
};
pub use assistant::{AiOutcome, AssistantService, GeminiClient, GenerativeAi, QaResult};
pub use auth::{AuthService, Session, SessionHandle, SignupRequest};
pub use credentials::CredentialManager;
pub use profile::{ProfileService, ProfileUpdate};
pub use routines::{RoutineBook, RoutinesService};
pub use settings::{AppSettings, SettingsService};
