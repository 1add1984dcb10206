//! AI assistant service
//!
//! Text scanner and Q&A backed by a generative AI API. The API is reached
//! through the `GenerativeAi` trait; `GeminiClient` is the HTTP
//! implementation. Results come back as `AiOutcome` so a failure message is
//! never mistaken for extracted text or an answer.

use crate::config::{EMPTY_ANSWER_RESULT, EMPTY_SCAN_RESULT};
use crate::error::{AppError, Result, ValidationError};
use crate::services::settings::AiSettings;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of an assistant call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    Success(String),
    Failure(String),
}

impl AiOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AiOutcome::Success(_))
    }

    pub fn text(&self) -> &str {
        match self {
            AiOutcome::Success(text) | AiOutcome::Failure(text) => text,
        }
    }
}

/// Base64 image taken from a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    /// Parse `data:image/<type>;base64,<body>`
    pub fn from_data_url(url: &str) -> std::result::Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidImage(reason.to_string());

        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| invalid("expected a data URL"))?;
        let (meta, data) = rest
            .split_once(',')
            .ok_or_else(|| invalid("missing ',' separator"))?;
        let mime_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| invalid("only base64 data URLs are supported"))?;

        if !mime_type.starts_with("image/") {
            return Err(invalid("not an image"));
        }
        if data.is_empty() {
            return Err(invalid("empty image body"));
        }

        Ok(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }
}

/// One part of a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    Image(ImagePayload),
}

/// A single content-generation call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateRequest {
    pub parts: Vec<PromptPart>,
    pub system_instruction: Option<String>,
}

/// Generative AI collaborator
#[async_trait]
pub trait GenerativeAi: Send + Sync {
    /// Returns the generated text, possibly empty
    async fn generate(&self, request: GenerateRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: &AiSettings, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("nuhs-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(request: &GenerateRequest) -> serde_json::Value {
        let parts: Vec<serde_json::Value> = request
            .parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => json!({ "text": text }),
                PromptPart::Image(image) => json!({
                    "inlineData": { "mimeType": image.mime_type, "data": image.data }
                }),
            })
            .collect();

        let mut body = json!({ "contents": [{ "parts": parts }] });
        if let Some(instruction) = &request.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        body
    }
}

#[async_trait]
impl GenerativeAi for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Generic(
                "API key missing. Set GEMINI_API_KEY or run `nuhs-portal settings api-key <KEY>`."
                    .to_string(),
            )
        })?;

        tracing::debug!("Calling {} with {} part(s)", self.model, request.parts.len());

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::Generic(format!(
                "AI service returned {}: {}",
                status, message
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(parsed.text())
    }
}

/// Clears the loading flag when dropped
struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A question and what came back for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaResult {
    pub question: String,
    pub outcome: AiOutcome,
}

/// Scanner and Q&A front for the AI collaborator
#[derive(Clone)]
pub struct AssistantService {
    ai: Arc<dyn GenerativeAi>,
    settings: AiSettings,
    loading: Arc<AtomicBool>,
}

impl AssistantService {
    pub fn new(ai: Arc<dyn GenerativeAi>, settings: AiSettings) -> Self {
        Self {
            ai,
            settings,
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a request is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Option<LoadingGuard> {
        self.loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard(Arc::clone(&self.loading)))
    }

    async fn run(&self, request: GenerateRequest, empty_result: &str) -> AiOutcome {
        let Some(_guard) = self.begin() else {
            tracing::info!("Assistant request ignored, another one is in flight");
            return AiOutcome::Failure("Another request is still in progress.".to_string());
        };

        match self.ai.generate(request).await {
            Ok(text) if text.trim().is_empty() => AiOutcome::Success(empty_result.to_string()),
            Ok(text) => AiOutcome::Success(text),
            Err(e) => {
                tracing::error!("Assistant request failed: {}", e);
                AiOutcome::Failure(e.to_string())
            }
        }
    }

    /// Extract the visible text from an image data URL
    pub async fn scan(&self, data_url: &str) -> AiOutcome {
        let image = match ImagePayload::from_data_url(data_url) {
            Ok(image) => image,
            Err(e) => return AiOutcome::Failure(e.to_string()),
        };

        tracing::info!("Scanning {} image ({} base64 chars)", image.mime_type, image.data.len());

        let request = GenerateRequest {
            parts: vec![
                PromptPart::Image(image),
                PromptPart::Text(self.settings.scan_prompt.clone()),
            ],
            system_instruction: None,
        };

        self.run(request, EMPTY_SCAN_RESULT).await
    }

    /// Ask a question. Blank questions are ignored.
    pub async fn ask(&self, question: &str) -> Option<QaResult> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let request = GenerateRequest {
            parts: vec![PromptPart::Text(question.to_string())],
            system_instruction: Some(self.settings.system_instruction.clone()),
        };

        let outcome = self.run(request, EMPTY_ANSWER_RESULT).await;
        Some(QaResult {
            question: question.to_string(),
            outcome,
        })
    }
}
