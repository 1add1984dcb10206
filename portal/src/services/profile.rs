//! Profile service
//!
//! Edits to the signed-in teacher's profile, the dashboard notebook and the
//! language preference.

use crate::config::{KEY_LANG, KEY_TEACHER_NOTES, KEY_USER};
use crate::database::{Language, LocalStore, UserProfile};
use crate::error::{AuthError, Result};
use crate::services::auth::{Session, SessionHandle};

/// Profile edit form. `profile_pic: None` keeps the current picture.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub subject: String,
    pub notes: String,
    pub profile_pic: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    store: LocalStore,
    session: SessionHandle,
}

impl ProfileService {
    pub fn new(store: LocalStore, session: SessionHandle) -> Self {
        Self { store, session }
    }

    /// Apply `edit` to the active profile and persist it
    async fn modify<F>(&self, edit: F) -> Result<UserProfile>
    where
        F: FnOnce(&mut UserProfile),
    {
        let mut session = self.session.write().await;

        let Session::Active(user) = &mut *session else {
            return Err(AuthError::NotSignedIn.into());
        };

        let mut updated = user.clone();
        edit(&mut updated);
        self.store.save_json(KEY_USER, &updated).await?;
        *user = updated.clone();

        Ok(updated)
    }

    /// Overwrite name, subject and notes in place
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile> {
        let user = self
            .modify(|user| {
                user.name = update.name.trim().to_string();
                user.subject = update.subject.trim().to_string();
                user.notes = update.notes;
                if let Some(pic) = update.profile_pic {
                    user.profile_pic = Some(pic);
                }
            })
            .await?;

        tracing::info!("Profile updated for {}", user.id);
        Ok(user)
    }

    /// Replace only the profile picture
    pub async fn set_profile_pic(&self, profile_pic: String) -> Result<UserProfile> {
        let user = self
            .modify(|user| user.profile_pic = Some(profile_pic))
            .await?;

        tracing::info!("Profile picture replaced for {}", user.id);
        Ok(user)
    }

    /// Dashboard notebook text
    pub async fn notes(&self) -> Result<String> {
        Ok(self.store.get(KEY_TEACHER_NOTES).await?.unwrap_or_default())
    }

    pub async fn save_notes(&self, text: &str) -> Result<()> {
        self.store.set(KEY_TEACHER_NOTES, text).await?;
        tracing::debug!("Notebook saved ({} chars)", text.chars().count());
        Ok(())
    }

    /// Stored language, English when absent or unrecognised
    pub async fn language(&self) -> Result<Language> {
        let Some(code) = self.store.get(KEY_LANG).await? else {
            return Ok(Language::default());
        };

        Ok(code.parse().unwrap_or_else(|e| {
            tracing::warn!("Ignoring stored language: {}", e);
            Language::default()
        }))
    }

    pub async fn set_language(&self, language: Language) -> Result<()> {
        self.store.set(KEY_LANG, language.code()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use crate::error::AppError;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service(session: Session) -> (ProfileService, LocalStore, SessionHandle) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let store = LocalStore::new(pool);
        let handle = SessionHandle::new(tokio::sync::RwLock::new(session));
        (ProfileService::new(store.clone(), handle.clone()), store, handle)
    }

    fn teacher() -> UserProfile {
        UserProfile {
            id: "NUHS7".to_string(),
            name: "Nasreen".to_string(),
            subject: "Chemistry".to_string(),
            password: Some("246810".to_string()),
            profile_pic: Some("data:image/png;base64,AAAA".to_string()),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_update_profile_overwrites_in_place() {
        let (service, store, session) = create_test_service(Session::Active(teacher())).await;

        let updated = service
            .update_profile(ProfileUpdate {
                name: " Nasreen Akter ".to_string(),
                subject: "Biology".to_string(),
                notes: "Lab on Thursday".to_string(),
                profile_pic: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.id, "NUHS7");
        assert_eq!(updated.name, "Nasreen Akter");
        assert_eq!(updated.password.as_deref(), Some("246810"));
        assert_eq!(updated.profile_pic, teacher().profile_pic);

        let stored: UserProfile = store.load_json(KEY_USER).await.unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(session.read().await.user(), Some(&updated));
    }

    #[tokio::test]
    async fn test_set_profile_pic() {
        let (service, _store, _session) = create_test_service(Session::Active(teacher())).await;

        let updated = service
            .set_profile_pic("data:image/jpeg;base64,BBBB".to_string())
            .await
            .unwrap();

        assert_eq!(updated.profile_pic.as_deref(), Some("data:image/jpeg;base64,BBBB"));
        assert_eq!(updated.name, "Nasreen");
    }

    #[tokio::test]
    async fn test_update_requires_session() {
        let (service, store, _session) = create_test_service(Session::Anonymous).await;

        let err = service
            .update_profile(ProfileUpdate::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Auth(AuthError::NotSignedIn)));
        assert!(store.get(KEY_USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_notes_and_language() {
        let (service, store, _session) = create_test_service(Session::Anonymous).await;

        assert_eq!(service.notes().await.unwrap(), "");
        service.save_notes("Bring the projector").await.unwrap();
        assert_eq!(service.notes().await.unwrap(), "Bring the projector");

        assert_eq!(service.language().await.unwrap(), Language::En);
        service.set_language(Language::Bn).await.unwrap();
        assert_eq!(service.language().await.unwrap(), Language::Bn);

        store.set(KEY_LANG, "xx").await.unwrap();
        assert_eq!(service.language().await.unwrap(), Language::En);
    }
}
