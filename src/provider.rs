//! Content generation client.
//!
//! Issues one schema-constrained request per hotel to an OpenAI-compatible
//! chat completions endpoint and returns a validated `HotelRecord` or a
//! classified `GenerateError`. The client never retries internally; retry
//! policy belongs to the caller (the batch runner pauses on rate limits).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GenerateError, InputError};
use crate::prompt;
use crate::types::{normalize_swiss_orthography, word_count, HotelRecord};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Target word range for the German description. Violations are logged,
/// not failed: an otherwise complete record is still usable.
const DESCRIPTION_WORDS_MIN: usize = 200;
const DESCRIPTION_WORDS_MAX: usize = 300;

/// Policy for a missing external identifier in the provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierPolicy {
    /// A blank identifier fails the task with `IdentifierNotFound`.
    Required,
    /// A blank identifier is kept and the task still succeeds.
    #[default]
    BestEffort,
}

/// Inputs for a single generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub country: String,
    pub hotel_name: String,
    pub city: Option<String>,
    /// Pre-resolved authoritative identifier; echoed back unchanged.
    pub external_id: Option<String>,
    /// Preferred reference material for the description content.
    pub source_urls: Vec<String>,
}

impl GenerationRequest {
    pub fn new(country: impl Into<String>, hotel_name: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            hotel_name: hotel_name.into(),
            ..Self::default()
        }
    }

    /// Required fields must be non-blank before any request is sent.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.country.trim().is_empty() {
            return Err(InputError::BlankField("country"));
        }
        if self.hotel_name.trim().is_empty() {
            return Err(InputError::BlankField("hotel name"));
        }
        Ok(())
    }
}

/// Seam between the batch runner and the external provider.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a fully populated record for one hotel, or fail with a
    /// classified error.
    async fn generate(&self, request: &GenerationRequest) -> Result<HotelRecord, GenerateError>;
}

// OpenAI-compatible wire structures.
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: Value,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

/// HTTP client for an OpenAI-compatible structured-output endpoint.
pub struct StructuredClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: Option<f32>,
    identifier_policy: IdentifierPolicy,
}

/// Construction parameters for `StructuredClient`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub identifier_policy: IdentifierPolicy,
}

impl StructuredClient {
    pub fn new(options: ClientOptions) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .timeout(options.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
            .build()
            .map_err(|e| GenerateError::Failed(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            model: options.model,
            api_key: options.api_key,
            base_url: options
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            temperature: options.temperature,
            identifier_policy: options.identifier_policy,
        })
    }

    /// Validate the parsed record against the request and apply the
    /// orthography and identifier rules. Shared with tests; transport-free.
    pub(crate) fn finalize_record(
        request: &GenerationRequest,
        mut record: HotelRecord,
        policy: IdentifierPolicy,
    ) -> Result<HotelRecord, GenerateError> {
        // A caller-supplied identifier is authoritative under either policy.
        if let Some(external_id) = request
            .external_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
        {
            record.external_id = external_id.to_string();
        } else if record.external_id.trim().is_empty() {
            match policy {
                IdentifierPolicy::Required => {
                    return Err(GenerateError::IdentifierNotFound(
                        request.hotel_name.clone(),
                    ));
                }
                IdentifierPolicy::BestEffort => {
                    record.external_id = String::new();
                }
            }
        }

        record.country = request.country.clone();
        record.hotel_name = request.hotel_name.clone();
        record.description_de = normalize_swiss_orthography(&record.description_de);

        let words = word_count(&record.description_de);
        if !(DESCRIPTION_WORDS_MIN..=DESCRIPTION_WORDS_MAX).contains(&words) {
            warn!(
                hotel = %record.hotel_name,
                words = words,
                "German description is outside the 200-300 word target"
            );
        }

        Ok(record)
    }
}

fn classify_status(status: StatusCode, body: String) -> GenerateError {
    // Structured classification: the status code decides, never the
    // message text.
    if status == StatusCode::TOO_MANY_REQUESTS {
        GenerateError::RateLimited(body)
    } else {
        GenerateError::Failed(format!("provider returned status {}: {}", status, body))
    }
}

fn map_transport_error(error: reqwest::Error) -> GenerateError {
    if let Some(status) = error.status() {
        return classify_status(status, error.to_string());
    }
    if error.is_timeout() {
        GenerateError::Failed(format!("request timeout: {}", error))
    } else if error.is_connect() {
        GenerateError::Failed(format!("connection error: {}", error))
    } else {
        GenerateError::Failed(format!("HTTP error: {}", error))
    }
}

#[async_trait]
impl ContentGenerator for StructuredClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<HotelRecord, GenerateError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: prompt::SYSTEM_PROMPT.to_string(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: prompt::build_user_prompt(request),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: prompt::response_schema(),
            },
            temperature: self.temperature,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(hotel = %request.hotel_name, country = %request.country, "sending generation request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Failed(format!("failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.trim())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        let record: HotelRecord = serde_json::from_str(content).map_err(|e| {
            GenerateError::Failed(format!("response does not match the record schema: {}", e))
        })?;

        Self::finalize_record(request, record, self.identifier_policy)
    }
}
