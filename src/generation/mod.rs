// Generation client architecture
//
// The pipeline talks to the generative model only through GenerationClient:
// - Gemini: REST implementation with inline media attachments
// - Schema: structured response shapes and their validation
//
// Tests substitute a scripted client; nothing in the pipeline depends on
// a live service.

pub mod gemini;
pub mod schema;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use schema::{Field, Schema, SchemaKind};
use crate::config::Config;
use crate::encoder::MediaPart;
use crate::error::{Result, VidbookError};

/// Capability boundary to the external generative model. Each call is one
/// request and one response.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Free-text generation
    async fn generate_text(&self, prompt: &str, attachments: &[MediaPart]) -> Result<String>;

    /// Structured generation. The returned value conforms to `schema`, or the
    /// call fails with `SchemaViolation`.
    async fn generate_structured(
        &self,
        prompt: &str,
        attachments: &[MediaPart],
        schema: &Schema,
    ) -> Result<Value>;

    /// Check that the service is reachable and the model exists
    async fn check_availability(&self) -> Result<()>;
}

/// Structured call deserialized into `T`
pub async fn request_structured<T: DeserializeOwned>(
    client: &dyn GenerationClient,
    prompt: &str,
    attachments: &[MediaPart],
    schema: &Schema,
) -> Result<T> {
    let value = client.generate_structured(prompt, attachments, schema).await?;
    serde_json::from_value(value)
        .map_err(|e| VidbookError::SchemaViolation(format!("response has unexpected shape: {}", e)))
}

/// Generation service implementation type
#[derive(Debug, Clone)]
pub enum GenerationImplementation {
    Gemini,
}

/// Factory for creating generation client instances
pub struct GenerationClientFactory;

impl GenerationClientFactory {
    pub fn create_client(implementation: GenerationImplementation, config: &Config) -> Result<Box<dyn GenerationClient>> {
        match implementation {
            GenerationImplementation::Gemini => {
                let api_key = config.api_key()?;
                Ok(Box::new(gemini::GeminiClient::new(config.generation.clone(), api_key)?))
            }
        }
    }

    pub fn create_default(config: &Config) -> Result<Box<dyn GenerationClient>> {
        Self::create_client(GenerationImplementation::Gemini, config)
    }
}
