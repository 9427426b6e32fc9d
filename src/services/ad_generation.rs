//! One generation call per user action, with failures mapped to the
//! messages shown in the browser.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::gemini_client::{
    Content, GeminiClient, GeminiError, GenerateContentRequest, GenerationConfig, Part,
};
use crate::media::{MediaEntry, MediaKind, MediaStore};
use crate::models::{AdGenRequest, AdPackage, CreativeOutput, SceneMediaRequest};
use crate::prompt;
use crate::video_poll::{self, PollError};

pub const MISSING_API_KEY: &str = "API_KEY environment variable is not set";
pub const EMPTY_RESPONSE: &str =
    "Received an empty response from the AI. Please try refining your inputs.";
pub const INVALID_JSON: &str = "The AI returned an invalid JSON response. Please try again.";
pub const NO_IMAGE: &str = "No image was generated. The response may have been blocked.";
pub const NO_VIDEO_LINK: &str = "Video generation completed, but no download link was found.";

const TEMPERATURE: f32 = 0.7;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").unwrap();
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{}", MISSING_API_KEY)]
    MissingApiKey,
    #[error("Unknown upload: {0}")]
    UnknownUpload(String),
    #[error("{}", EMPTY_RESPONSE)]
    EmptyResponse,
    #[error("{}", INVALID_JSON)]
    InvalidJson,
    #[error("Failed to generate {what}: {message}")]
    Failed { what: &'static str, message: String },
    #[error("Video generation was cancelled")]
    Cancelled,
}

impl GenerationError {
    fn failed(what: &'static str, message: impl Into<String>) -> Self {
        GenerationError::Failed {
            what,
            message: message.into(),
        }
    }

    /// Upstream errors that mention JSON get the friendlier invalid-JSON message.
    fn from_upstream(what: &'static str, error: GeminiError) -> Self {
        let message = error.to_string();
        if matches!(error, GeminiError::Decode(_)) || message.contains("JSON") {
            GenerationError::InvalidJson
        } else {
            GenerationError::failed(what, message)
        }
    }
}

/// Strip a surrounding markdown code fence, if the model added one.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

/// Parse model text into `T`, mapping blank and malformed output.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    let json_text = strip_code_fence(text);
    if json_text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    serde_json::from_str(json_text).map_err(|e| {
        tracing::error!("Model returned invalid JSON: {}", e);
        GenerationError::InvalidJson
    })
}

pub struct AdGenerationService<'a> {
    client: Option<&'a GeminiClient>,
    media: &'a MediaStore,
}

impl<'a> AdGenerationService<'a> {
    pub fn new(client: Option<&'a GeminiClient>, media: &'a MediaStore) -> Self {
        Self { client, media }
    }

    fn client(&self) -> Result<&'a GeminiClient, GenerationError> {
        self.client.ok_or(GenerationError::MissingApiKey)
    }

    /// Full multi-channel package.
    pub async fn generate_ad_package(
        &self,
        request: &AdGenRequest,
    ) -> Result<AdPackage, GenerationError> {
        let (products, celebrities) = self.resolve_images(request).await?;
        let text = prompt::build_ad_package_prompt(request, products.len(), celebrities.len());

        tracing::info!(
            channels = request.channels.len(),
            product_images = products.len(),
            celebrity_images = celebrities.len(),
            "🎯 Generating ad package"
        );

        self.generate_structured(
            "ad package",
            text,
            prompt::ad_package_schema(),
            products.iter().chain(celebrities.iter()),
        )
        .await
    }

    /// Single concept with a three-scene storyboard.
    pub async fn generate_creative_concept(
        &self,
        request: &AdGenRequest,
    ) -> Result<CreativeOutput, GenerationError> {
        let (products, celebrities) = self.resolve_images(request).await?;
        let text = prompt::build_creative_prompt(request, products.len(), celebrities.len());

        tracing::info!("💡 Generating creative concept");

        self.generate_structured(
            "ad concept",
            text,
            prompt::creative_output_schema(),
            products.iter().chain(celebrities.iter()),
        )
        .await
    }

    /// Still frame for a scene, returned as a `data:` URL.
    pub async fn generate_scene_image(
        &self,
        scene: &SceneMediaRequest,
    ) -> Result<String, GenerationError> {
        let client = self.client()?;
        let image_prompt = prompt::scene_image_prompt(scene);

        tracing::info!(scene_id = %scene.scene_id, "🖼️ Generating scene image");

        match client.generate_image(&image_prompt).await {
            Ok(Some(image)) => Ok(image.data_url()),
            Ok(None) => Err(GenerationError::failed("image", NO_IMAGE)),
            Err(e) => {
                tracing::error!("Image generation failed: {}", e);
                Err(GenerationError::failed("image", e.to_string()))
            }
        }
    }

    /// Submit, poll to completion, download, and store a scene video.
    pub async fn generate_scene_video(
        &self,
        scene: &SceneMediaRequest,
        poll: &PollConfig,
        cancel: &CancellationToken,
        on_status: impl Fn(&str),
    ) -> Result<MediaEntry, GenerationError> {
        let client = self.client()?;
        let video_prompt = prompt::scene_video_prompt(scene);

        on_status("Sending request to the video model...");
        let operation = client
            .start_video_generation(&video_prompt)
            .await
            .map_err(|e| video_failure(e.to_string()))?;

        on_status("Generating video... This can take a few minutes. Please wait.");
        let operation = video_poll::wait_for_completion(client, operation, poll, cancel)
            .await
            .map_err(|e| match e {
                PollError::Cancelled => GenerationError::Cancelled,
                other => video_failure(other.to_string()),
            })?;

        if let Some(status) = &operation.error {
            return Err(video_failure(status.message.clone()));
        }

        let uri = match operation.video_uri() {
            Some(uri) => uri.to_string(),
            None => {
                let reasons = operation.filtered_reasons();
                if !reasons.is_empty() {
                    tracing::warn!("Video filtered by safety system: {:?}", reasons);
                }
                return Err(video_failure(NO_VIDEO_LINK));
            }
        };

        on_status("Downloading video...");
        let video = client
            .download_video(&uri)
            .await
            .map_err(|e| video_failure(e.to_string()))?;

        let file_name = format!("scene-{}.mp4", scene.scene_id);
        Ok(self
            .media
            .insert(MediaKind::Video, file_name, video.mime_type, video.bytes)
            .await)
    }

    async fn resolve_images(
        &self,
        request: &AdGenRequest,
    ) -> Result<(Vec<MediaEntry>, Vec<MediaEntry>), GenerationError> {
        let mut products = Vec::with_capacity(request.product_images.len());
        for id in &request.product_images {
            products.push(self.lookup_upload(id).await?);
        }
        let mut celebrities = Vec::with_capacity(request.celebrity_images.len());
        for id in &request.celebrity_images {
            celebrities.push(self.lookup_upload(id).await?);
        }
        Ok((products, celebrities))
    }

    async fn lookup_upload(&self, id: &str) -> Result<MediaEntry, GenerationError> {
        match self.media.get(id).await {
            Some(entry) if entry.kind == MediaKind::Upload => Ok(entry),
            _ => Err(GenerationError::UnknownUpload(id.to_string())),
        }
    }

    async fn generate_structured<'e, T, I>(
        &self,
        what: &'static str,
        text: String,
        schema: serde_json::Value,
        images: I,
    ) -> Result<T, GenerationError>
    where
        T: DeserializeOwned,
        I: Iterator<Item = &'e MediaEntry>,
    {
        let client = self.client()?;

        let mut parts = vec![Part::text(text)];
        parts.extend(images.map(|image| Part::inline(image.mime_type.clone(), &image.bytes)));

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts,
                role: Some("user".to_string()),
            }],
            generation_config: Some(GenerationConfig::json(schema, TEMPERATURE)),
        };

        let response = client.generate_content(&request).await.map_err(|e| {
            tracing::error!("Gemini API call failed: {}", e);
            GenerationError::from_upstream(what, e)
        })?;

        parse_model_json(&response.text())
    }
}

fn video_failure(message: impl Into<String>) -> GenerationError {
    GenerationError::failed("video", message)
}
