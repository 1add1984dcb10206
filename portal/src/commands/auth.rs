//! Authentication commands
//!
//! Signup, login and logout for the single local teacher account.

use crate::app::AppState;
use crate::database::UserProfile;
use crate::error::Result;
use crate::services::SignupRequest;

/// Create the local account and sign in
pub async fn signup(state: &AppState, req: SignupRequest) -> Result<UserProfile> {
    state.auth.signup(req).await
}

/// Sign in against the stored account
pub async fn login(state: &AppState, id: &str, password: &str) -> Result<UserProfile> {
    state.auth.login(id, password).await
}

/// Wipe all local data and sign out
pub async fn logout(state: &AppState) -> Result<()> {
    state.auth.logout().await
}
