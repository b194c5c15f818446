//! Generative image model client (Gemini `generateContent` REST API).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use thumblify_types::catalog::AspectRatio;
use tracing::{debug, info};

use crate::error::ModelError;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";

/// Decoded image bytes returned by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate(&self, prompt: &str, aspect_ratio: AspectRatio)
    -> Result<GeneratedImage, ModelError>;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

// -- generateContent request --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig<'a>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    response_modalities: [&'static str; 1],
    image_config: ImageConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig<'a> {
    aspect_ratio: &'a str,
    image_size: &'static str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

// -- generateContent response --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client for Gemini API")?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn call_once(
        &self,
        body: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, ModelError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
                retry_after,
            });
        }

        // Body read failures stay transport errors so timeouts are retried
        let bytes = response.bytes().await?;
        serde_json::from_slice::<GenerateContentResponse>(&bytes)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<GeneratedImage, ModelError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 32768,
                temperature: 1.0,
                top_p: 0.95,
                response_modalities: ["IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.as_str(),
                    image_size: "1K",
                },
            },
            safety_settings: HARM_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "OFF",
                })
                .collect(),
        };

        let response = self
            .config
            .retry
            .run(|attempt| {
                debug!(attempt, model = %self.config.model, "Calling image model");
                self.call_once(&body)
            })
            .await?;

        let image = extract_image(response)?;
        info!(
            bytes = image.bytes.len(),
            mime_type = %image.mime_type,
            "Image model returned image"
        );
        Ok(image)
    }
}

/// Pull the image out of a model response. When several parts carry inline
/// data the last one wins.
pub(crate) fn extract_image(response: GenerateContentResponse) -> Result<GeneratedImage, ModelError> {
    let GenerateContentResponse {
        candidates,
        prompt_feedback,
    } = response;

    if let Some(reason) = prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ModelError::Blocked(reason));
    }

    let parts = candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .ok_or_else(|| ModelError::InvalidResponse("missing candidate content parts".into()))?;

    let inline = parts
        .into_iter()
        .filter_map(|p| p.inline_data)
        .filter(|d| d.data.as_deref().is_some_and(|s| !s.is_empty()))
        .last()
        .ok_or(ModelError::NoImage)?;

    let bytes = B64
        .decode(inline.data.unwrap_or_default().trim())
        .map_err(|e| ModelError::InvalidResponse(format!("image payload is not base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(ModelError::NoImage);
    }

    Ok(GeneratedImage {
        bytes,
        mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
    })
}
