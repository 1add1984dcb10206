//! Scanner and Q&A commands

use crate::app::AppState;
use crate::error::Result;
use crate::services::{AiOutcome, QaResult};

/// Extract text from an image data URL
pub async fn scan_image(state: &AppState, data_url: &str) -> Result<AiOutcome> {
    state.auth.require_user().await?;
    Ok(state.assistant.scan(data_url).await)
}

/// Ask the assistant a question. Blank questions return `None`.
pub async fn ask_question(state: &AppState, question: &str) -> Result<Option<QaResult>> {
    state.auth.require_user().await?;
    Ok(state.assistant.ask(question).await)
}
