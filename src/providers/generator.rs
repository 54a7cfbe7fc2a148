use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::Provider;
use crate::core::refinement::types::ContentType;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    /// Soft cap in characters; enforcing it is the backend's job.
    pub max_length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub model: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    /// Upstream id carried onto the produced iteration.
    pub correlation_id: Option<String>,
}

impl GenerationMetadata {
    /// Tokens billed for the call, when the backend reported any usage.
    pub fn total_tokens(&self) -> Option<u64> {
        match (self.input_tokens, self.output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            (Some(tokens), None) | (None, Some(tokens)) => Some(tokens),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub text: String,
    #[serde(default)]
    pub metadata: GenerationMetadata,
}

impl GeneratedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: GenerationMetadata::default(),
        }
    }
}

/// The text-generation backend. Called once per refinement and always awaited.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        content_type: ContentType,
        directive: &str,
        options: GenerationOptions,
    ) -> anyhow::Result<GeneratedText>;

    fn name(&self) -> &str;
}

/// Adapts a chat [`Provider`] into a [`ContentGenerator`].
pub struct ProviderGenerator {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub(crate) fn build_system_prompt(content_type: ContentType, max_length: usize) -> String {
        let role = match content_type {
            ContentType::Blog => "You are an experienced blog writer who revises drafts on request.",
            ContentType::Email => {
                "You are a careful business email writer who revises drafts on request."
            }
            ContentType::Social => {
                "You are a social media copywriter who revises posts on request."
            }
        };
        [
            role.to_string(),
            format!("Keep the response under {max_length} characters."),
            "Return only the revised content, without commentary or markdown fences.".to_string(),
        ]
        .join("\n")
    }
}

#[async_trait]
impl ContentGenerator for ProviderGenerator {
    async fn generate(
        &self,
        content_type: ContentType,
        directive: &str,
        options: GenerationOptions,
    ) -> anyhow::Result<GeneratedText> {
        let system_prompt = Self::build_system_prompt(content_type, options.max_length);
        let response = self
            .provider
            .chat_with_system_full(
                Some(&system_prompt),
                directive,
                &self.model,
                options.temperature,
            )
            .await?;

        Ok(GeneratedText {
            text: response.text,
            metadata: GenerationMetadata {
                model: response.model.or_else(|| Some(self.model.clone())),
                input_tokens: response.input_tokens,
                output_tokens: response.output_tokens,
                correlation_id: response.request_id,
            },
        })
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}
