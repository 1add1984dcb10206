//! Authentication gate and session
//!
//! The allowlist decides which IDs may ever be used. Credentials are checked
//! against the single profile held in local storage; there is no account
//! directory. The active session is an explicit object shared by the
//! services that need the current teacher.

use crate::config::{
    AUTHORIZED_TEACHER_COUNT, DEFAULT_AVATAR_URL, KEY_USER, PASSWORD_LENGTH, TEACHER_ID_PREFIX,
};
use crate::database::{LocalStore, UserProfile};
use crate::error::{AuthError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trim and uppercase a typed teacher ID
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Whether a normalized ID is one of `NUHS1`..=`NUHS20`
pub fn is_authorized_id(id: &str) -> bool {
    (1..=AUTHORIZED_TEACHER_COUNT).any(|index| format!("{}{}", TEACHER_ID_PREFIX, index) == id)
}

fn check_password_length(password: &str) -> std::result::Result<(), AuthError> {
    let actual = password.chars().count();
    if actual != PASSWORD_LENGTH {
        return Err(AuthError::InvalidPasswordLength {
            expected: PASSWORD_LENGTH,
            actual,
        });
    }
    Ok(())
}

/// Who is using the portal right now
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Active(UserProfile),
}

impl Session {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Session::Active(user) => Some(user),
            Session::Anonymous => None,
        }
    }
}

/// Shared handle to the session
pub type SessionHandle = Arc<RwLock<Session>>;

/// Signup form contents
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub password: String,
    pub profile_pic: Option<String>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: LocalStore,
    session: SessionHandle,
}

impl AuthService {
    pub fn new(store: LocalStore, session: SessionHandle) -> Self {
        Self { store, session }
    }

    /// Restore the session from a stored profile, if one parses
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        let stored: Option<UserProfile> = self.store.load_json(KEY_USER).await?;

        let mut session = self.session.write().await;
        *session = match &stored {
            Some(user) => {
                tracing::info!("Restored session for {}", user.id);
                Session::Active(user.clone())
            }
            None => Session::Anonymous,
        };

        Ok(stored)
    }

    /// Create the local profile and sign in
    pub async fn signup(&self, req: SignupRequest) -> Result<UserProfile> {
        let id = normalize_id(&req.id);

        if !is_authorized_id(&id) {
            tracing::info!("Signup rejected for unauthorized ID {:?}", id);
            return Err(AuthError::NotAuthorized.into());
        }

        if let Err(e) = check_password_length(&req.password) {
            tracing::info!("Signup rejected for {}: {}", id, e);
            return Err(e.into());
        }

        if let Some(existing) = self.store.load_json::<UserProfile>(KEY_USER).await? {
            tracing::warn!("Replacing existing local profile {}", existing.id);
        }

        let profile_pic = req
            .profile_pic
            .filter(|pic| !pic.trim().is_empty())
            .unwrap_or_else(|| format!("{}{}", DEFAULT_AVATAR_URL, id));

        let user = UserProfile {
            id,
            name: req.name.trim().to_string(),
            subject: req.subject.trim().to_string(),
            password: Some(req.password),
            profile_pic: Some(profile_pic),
            notes: String::new(),
        };

        self.store.save_json(KEY_USER, &user).await?;
        *self.session.write().await = Session::Active(user.clone());

        tracing::info!("Signed up {}", user.id);
        Ok(user)
    }

    /// Check credentials against the stored profile and sign in
    pub async fn login(&self, id: &str, password: &str) -> Result<UserProfile> {
        let id = normalize_id(id);

        if !is_authorized_id(&id) {
            tracing::info!("Login rejected for unauthorized ID {:?}", id);
            return Err(AuthError::NotAuthorized.into());
        }

        let stored: Option<UserProfile> = self.store.load_json(KEY_USER).await?;

        match stored {
            Some(user) if user.id == id && user.password.as_deref() == Some(password) => {
                *self.session.write().await = Session::Active(user.clone());
                tracing::info!("Logged in {}", user.id);
                Ok(user)
            }
            _ => {
                tracing::info!("Login failed for {}", id);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Wipe all local state and end the session
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        *self.session.write().await = Session::Anonymous;

        tracing::info!("Logged out, local storage wiped");
        Ok(())
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        self.session.read().await.user().cloned()
    }

    /// The signed-in teacher, or `NotSignedIn`
    pub async fn require_user(&self) -> Result<UserProfile> {
        self.current_user()
            .await
            .ok_or_else(|| AuthError::NotSignedIn.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use crate::error::AppError;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> (AuthService, LocalStore) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let store = LocalStore::new(pool);
        let session = SessionHandle::default();
        (AuthService::new(store.clone(), session), store)
    }

    fn signup_request(id: &str, password: &str) -> SignupRequest {
        SignupRequest {
            id: id.to_string(),
            name: "Karim".to_string(),
            subject: "Mathematics".to_string(),
            password: password.to_string(),
            profile_pic: None,
        }
    }

    fn auth_error(err: AppError) -> AuthError {
        match err {
            AppError::Auth(e) => e,
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_allowlist_membership() {
        assert!(is_authorized_id("NUHS1"));
        assert!(is_authorized_id("NUHS20"));
        assert!(!is_authorized_id("NUHS0"));
        assert!(!is_authorized_id("NUHS21"));
        assert!(!is_authorized_id("NUHS05"));
        assert!(!is_authorized_id("nuhs5"));
        assert!(!is_authorized_id(""));
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("  nuhs3 "), "NUHS3");
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(check_password_length("123456").is_ok());
        assert!(check_password_length("১২৩৪৫৬").is_ok());
        assert_eq!(
            check_password_length("12345"),
            Err(AuthError::InvalidPasswordLength {
                expected: 6,
                actual: 5
            })
        );
    }

    #[tokio::test]
    async fn test_signup_rejects_unlisted_id() {
        let (service, store) = create_test_service().await;

        let err = service.signup(signup_request("NUHS21", "123456")).await.unwrap_err();

        assert_eq!(auth_error(err), AuthError::NotAuthorized);
        assert!(store.get(KEY_USER).await.unwrap().is_none());
        assert!(service.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let (service, store) = create_test_service().await;

        let err = service.signup(signup_request("NUHS3", "12345")).await.unwrap_err();

        assert!(matches!(auth_error(err), AuthError::InvalidPasswordLength { .. }));
        assert!(store.get(KEY_USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signup_normalizes_id_and_sets_avatar() {
        let (service, _store) = create_test_service().await;

        let user = service.signup(signup_request("nuhs3", "654321")).await.unwrap();

        assert_eq!(user.id, "NUHS3");
        assert_eq!(user.profile_pic.as_deref(), Some("https://i.pravatar.cc/150?u=NUHS3"));
        assert_eq!(user.notes, "");
        assert_eq!(service.current_user().await, Some(user));
    }

    #[tokio::test]
    async fn test_login_requires_matching_profile() {
        let (service, _store) = create_test_service().await;

        // Allowed ID but nothing stored yet
        let err = service.login("NUHS5", "123456").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::InvalidCredentials);

        service.signup(signup_request("NUHS5", "123456")).await.unwrap();

        assert!(service.login(" nuhs5", "123456").await.is_ok());

        let err = service.login("NUHS5", "123457").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::InvalidCredentials);

        let err = service.login("NUHS6", "123456").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::InvalidCredentials);

        let err = service.login("NUHS99", "123456").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::NotAuthorized);
    }

    #[tokio::test]
    async fn test_logout_wipes_everything() {
        let (service, store) = create_test_service().await;

        service.signup(signup_request("NUHS1", "111111")).await.unwrap();
        store.set("teacher_notes", "remember chalk").await.unwrap();

        service.logout().await.unwrap();

        assert!(store.entries().await.unwrap().is_empty());
        assert!(service.current_user().await.is_none());
        let err = service.require_user().await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::NotSignedIn);
    }

    #[tokio::test]
    async fn test_restore_discards_malformed_profile() {
        let (service, store) = create_test_service().await;

        store.set(KEY_USER, "{\"id\":").await.unwrap();

        assert_eq!(service.restore().await.unwrap(), None);
        assert!(service.current_user().await.is_none());
    }
}
