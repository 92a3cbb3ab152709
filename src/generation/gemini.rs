// Gemini REST implementation
// Media is sent inline (base64) with the prompt; structured calls set a
// JSON response MIME type plus a response schema.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::encoder::MediaPart;
use crate::error::{Result, VidbookError};
use super::GenerationClient;
use super::schema::{Schema, parse_structured};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationSettings>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    config: GenerationConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: GenerationConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VidbookError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config, api_key })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.config.endpoint.trim_end_matches('/'), self.config.model)
    }

    async fn generate(&self, prompt: &str, attachments: &[MediaPart], schema: Option<&Schema>) -> Result<String> {
        let request = build_request(prompt, attachments, schema);
        let url = format!("{}:generateContent", self.model_url());

        debug!("Sending generation request to {} with {} attachments", url, attachments.len());

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| VidbookError::Generation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VidbookError::Generation(format!(
                "Generation API error {}: {}", status, error_text
            )));
        }

        let body: GenerateResponse = response.json().await
            .map_err(|e| VidbookError::Generation(format!("Failed to parse response envelope: {}", e)))?;

        extract_text(body)
    }
}

fn build_request<'a>(prompt: &'a str, attachments: &'a [MediaPart], schema: Option<&Schema>) -> GenerateRequest<'a> {
    let mut parts = Vec::with_capacity(attachments.len() + 1);
    parts.push(RequestPart::Text { text: prompt });
    parts.extend(attachments.iter().map(|a| RequestPart::Inline {
        inline_data: InlineData { mime_type: &a.mime_type, data: &a.data },
    }));

    GenerateRequest {
        contents: vec![Content { role: "user", parts }],
        generation_config: schema.map(|s| GenerationSettings {
            response_mime_type: "application/json",
            response_schema: s.to_response_schema(),
        }),
    }
}

fn extract_text(body: GenerateResponse) -> Result<String> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(VidbookError::Generation(format!("Request blocked by the service: {}", reason)));
    }

    let candidate = body.candidates.into_iter().next()
        .ok_or_else(|| VidbookError::Generation("Response contained no candidates".to_string()))?;

    let text: String = candidate.content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(VidbookError::Generation(format!(
            "Empty response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_text(&self, prompt: &str, attachments: &[MediaPart]) -> Result<String> {
        self.generate(prompt, attachments, None).await
    }

    async fn generate_structured(&self, prompt: &str, attachments: &[MediaPart], schema: &Schema) -> Result<Value> {
        let raw = self.generate(prompt, attachments, Some(schema)).await?;
        debug!("Raw structured response: {}", raw);
        parse_structured(&raw, schema)
    }

    async fn check_availability(&self) -> Result<()> {
        let response = self.client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| VidbookError::Generation(format!("Failed to connect to generation service: {}", e)))?;

        if response.status().is_success() {
            info!("Generation model '{}' is available", self.config.model);
            Ok(())
        } else {
            Err(VidbookError::Generation(format!(
                "Generation model '{}' is not available (HTTP {})",
                self.config.model,
                response.status()
            )))
        }
    }
}
