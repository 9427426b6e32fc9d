use backoff::{future::retry, ExponentialBackoff};
use base64::prelude::*;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::GeminiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("error decoding response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Request was blocked: {0}")]
    Blocked(String),
    #[error("Operation failed: {0}")]
    Operation(String),
    #[error("Failed to download video: {0}")]
    Download(String),
}

impl GeminiError {
    fn is_transient(&self) -> bool {
        match self {
            GeminiError::Http(e) => e.is_connect() || e.is_timeout(),
            GeminiError::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    video_model: String,
    retry_max_elapsed: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Attach raw bytes as a base64 `inlineData` part.
    pub fn inline(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: BASE64_STANDARD.encode(bytes),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String, // base64 encoded data
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl GenerationConfig {
    /// JSON output constrained by `schema`.
    pub fn json(schema: Value, temperature: f32) -> Self {
        Self {
            temperature,
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    pub total_token_count: u32,
}

#[derive(Debug, Serialize)]
struct PredictRequest<P: Serialize> {
    instances: Vec<PromptInstance>,
    parameters: P,
}

#[derive(Debug, Serialize)]
struct PromptInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct ImagePredictResponse {
    #[serde(default)]
    pub predictions: Vec<ImagePrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrediction {
    pub bytes_base64_encoded: Option<String>,
    pub mime_type: Option<String>,
    pub rai_filtered_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }
}

/// Long-running video generation operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<VideoOperationResponse>,
    pub error: Option<OperationStatus>,
}

impl VideoOperation {
    /// Download link of the first generated video, if any.
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()
            .map(|video| video.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Safety filter reasons reported for a finished but empty operation.
    pub fn filtered_reasons(&self) -> Vec<String> {
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .map(|r| r.rai_media_filtered_reasons.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOperationResponse {
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DownloadedVideo {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeminiClient {
    pub fn new(api_key: String, config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
            retry_max_elapsed: config.retry_max_elapsed,
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url,
            model,
            method,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Structured generation against the configured text model.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = self.model_url(&self.text_model, "generateContent");

        tracing::debug!(
            model = %self.text_model,
            parts = request.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
            "Gemini generateContent request"
        );

        let response: GenerateContentResponse = self.post_with_retry(&url, request).await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(GeminiError::Blocked(reason));
        }

        if let Some(usage) = &response.usage_metadata {
            tracing::info!(
                prompt_tokens = usage.prompt_token_count,
                completion_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "Gemini generateContent usage"
            );
        }

        Ok(response)
    }

    /// Generate a single 16:9 JPEG. `Ok(None)` when the model returned nothing.
    pub async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, GeminiError> {
        let url = self.model_url(&self.image_model, "predict");
        let request = PredictRequest {
            instances: vec![PromptInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio: "16:9".to_string(),
                output_options: OutputOptions {
                    mime_type: "image/jpeg".to_string(),
                },
            },
        };

        tracing::info!(model = %self.image_model, "Generating image");

        let response: ImagePredictResponse = self.post_with_retry(&url, &request).await?;

        for prediction in response.predictions {
            if let Some(data) = prediction.bytes_base64_encoded.filter(|d| !d.is_empty()) {
                let bytes = BASE64_STANDARD.decode(data)?;
                tracing::info!("✅ Generated image ({} bytes)", bytes.len());
                return Ok(Some(GeneratedImage {
                    mime_type: prediction
                        .mime_type
                        .unwrap_or_else(|| "image/jpeg".to_string()),
                    bytes,
                }));
            }
            if let Some(reason) = prediction.rai_filtered_reason {
                tracing::warn!("Image filtered by safety system: {}", reason);
            }
        }

        Ok(None)
    }

    /// Submit a video job. Not retried: a duplicated submission would start a second job.
    pub async fn start_video_generation(&self, prompt: &str) -> Result<VideoOperation, GeminiError> {
        let url = self.model_url(&self.video_model, "predictLongRunning");
        let request = PredictRequest {
            instances: vec![PromptInstance {
                prompt: prompt.to_string(),
            }],
            parameters: VideoParameters { sample_count: 1 },
        };

        tracing::info!(model = %self.video_model, "🎬 Submitting video generation");

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;
        let operation: VideoOperation = Self::read_json(response).await?;

        tracing::info!(operation = %operation.name, "Video operation started");
        Ok(operation)
    }

    /// Re-query a long-running operation by name.
    pub async fn get_operation(&self, name: &str) -> Result<VideoOperation, GeminiError> {
        let url = format!(
            "{}/{}?key={}",
            self.base_url,
            name.trim_start_matches('/'),
            urlencoding::encode(&self.api_key)
        );

        let url = url.as_str();
        let operation = || async move {
            let response = self
                .client
                .get(url)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .map_err(|e| classify(GeminiError::Http(e)))?;
            Self::read_json(response).await.map_err(classify)
        };

        retry(self.backoff(), operation).await
    }

    /// Fetch a finished video. The API key is appended as the `key` query parameter.
    pub async fn download_video(&self, uri: &str) -> Result<DownloadedVideo, GeminiError> {
        let separator = if uri.contains('?') { '&' } else { '?' };
        let url = format!("{}{}key={}", uri, separator, urlencoding::encode(&self.api_key));

        let response = self
            .client
            .get(&url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeminiError::Download(status_text(status)));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("video/"))
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        tracing::info!("✅ Downloaded video ({} bytes)", bytes.len());
        Ok(DownloadedVideo { mime_type, bytes })
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        }
    }

    async fn post_with_retry<B, T>(&self, url: &str, body: &B) -> Result<T, GeminiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let operation = || async move {
            let response = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .timeout(REQUEST_TIMEOUT)
                .json(body)
                .send()
                .await
                .map_err(|e| classify(GeminiError::Http(e)))?;
            Self::read_json(response).await.map_err(classify)
        };

        retry(self.backoff(), operation).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GeminiError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Gemini API error ({}): {}", status, text);
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            tracing::debug!("Response body: {}", truncate_chars(&text, 500));
            GeminiError::Decode(e)
        })
    }
}

fn classify(error: GeminiError) -> backoff::Error<GeminiError> {
    if error.is_transient() {
        tracing::warn!("Gemini API transient error (retrying): {}", error);
        backoff::Error::transient(error)
    } else {
        backoff::Error::permanent(error)
    }
}

/// Pull `error.message` out of a Google API error body, or fall back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// At most `max_chars` characters of `text`, cut on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(i, _)| &text[..i])
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}
