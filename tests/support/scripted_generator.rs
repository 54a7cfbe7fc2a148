use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use draftsmith::core::refinement::ContentType;
use draftsmith::providers::{ContentGenerator, GeneratedText, GenerationOptions};

#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub content_type: ContentType,
    pub directive: String,
    pub options: GenerationOptions,
}

/// Replays queued replies, then falls back to a fixed reply. Directives
/// containing a poisoned marker fail.
#[derive(Debug)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    fallback: String,
    fail_markers: Vec<String>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl ScriptedGenerator {
    pub fn new(fallback: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            fail_markers: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(self, replies: &[&str]) -> Self {
        *self.replies.lock().unwrap_or_else(PoisonError::into_inner) =
            replies.iter().map(|r| (*r).to_string()).collect();
        self
    }

    pub fn failing_when(mut self, marker: &str) -> Self {
        self.fail_markers.push(marker.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        content_type: ContentType,
        directive: &str,
        options: GenerationOptions,
    ) -> anyhow::Result<GeneratedText> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(GenerateCall {
                content_type,
                directive: directive.to_string(),
                options,
            });

        if let Some(marker) = self.fail_markers.iter().find(|m| directive.contains(m.as_str())) {
            anyhow::bail!("backend refused directive containing '{marker}'");
        }

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(GeneratedText::new(reply))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
