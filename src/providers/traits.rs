use super::response::ProviderResponse;
use async_trait::async_trait;

/// Chat-style model backend.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat_with_system(
        &self,
        system_prompt: Option<&str>,
        message: &str,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String>;

    /// Like `chat_with_system`, keeping usage metadata when the backend reports it.
    async fn chat_with_system_full(
        &self,
        system_prompt: Option<&str>,
        message: &str,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<ProviderResponse> {
        let text = self
            .chat_with_system(system_prompt, message, model, temperature)
            .await?;
        Ok(ProviderResponse::text_only(text))
    }

    fn name(&self) -> &str;
}
