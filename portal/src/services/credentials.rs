/// Credential Manager Service
/// Stores the generative AI API key in the OS credential store
use crate::config::API_KEY_ENV_VARS;
use crate::error::{AppError, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "NUHS-Portal";
const AI_API_KEY: &str = "ai_api_key";

/// Credential manager for the AI API key
pub struct CredentialManager;

impl CredentialManager {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, AI_API_KEY)
            .map_err(|e| AppError::Credentials(format!("Failed to create keyring entry: {}", e)))
    }

    /// Store the API key in the OS credential store.
    ///
    /// The key is read back through a fresh entry; a backend that does not
    /// persist (keyring's mock store) is reported as an error.
    pub fn store_api_key(api_key: &str) -> Result<()> {
        Self::entry()?
            .set_password(api_key)
            .map_err(|e| AppError::Credentials(format!("Failed to store API key: {}", e)))?;

        match Self::get_api_key() {
            Ok(stored) if stored == api_key => {}
            _ => {
                tracing::warn!("AI API key did not persist in the credential store");
                return Err(AppError::Credentials(
                    "No persistent credential store is available; set GEMINI_API_KEY instead"
                        .to_string(),
                ));
            }
        }

        tracing::info!("AI API key stored in credential manager");
        Ok(())
    }

    /// Retrieve the API key from the OS credential store
    pub fn get_api_key() -> Result<String> {
        Self::entry()?
            .get_password()
            .map_err(|e| AppError::Credentials(format!("Failed to retrieve API key: {}", e)))
    }

    /// Delete the API key from the OS credential store
    pub fn delete_api_key() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .map_err(|e| AppError::Credentials(format!("Failed to delete API key: {}", e)))?;

        tracing::info!("AI API key deleted from credential manager");
        Ok(())
    }

    /// Resolve the API key: environment first, then the credential store.
    /// Blank values count as missing.
    pub fn resolve_api_key() -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty() && key != "undefined")
            .or_else(|| {
                Self::get_api_key()
                    .ok()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_fails_when_backend_does_not_persist() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());

        let err = CredentialManager::store_api_key("secret-key").unwrap_err();

        assert!(matches!(err, AppError::Credentials(msg) if msg.contains("GEMINI_API_KEY")));
    }
}
