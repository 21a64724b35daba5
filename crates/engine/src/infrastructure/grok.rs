//! Grok (x.ai) client.
//!
//! Grok exposes the OpenAI chat-completions envelope at its own base URL,
//! so this is the shared client pointed at api.x.ai.

use async_trait::async_trait;

use crate::infrastructure::openai::OpenAiClient;
use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

/// Grok API base URL.
pub const GROK_BASE_URL: &str = "https://api.x.ai/v1";

#[derive(Clone)]
pub struct GrokClient {
    inner: OpenAiClient,
}

impl GrokClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            inner: OpenAiClient::with_base_url(GROK_BASE_URL, api_key, model),
        }
    }
}

#[async_trait]
impl LlmPort for GrokClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.inner.generate(request).await
    }
}
