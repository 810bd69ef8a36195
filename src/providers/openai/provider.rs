use async_trait::async_trait;

use crate::config::EndpointConfig;
use crate::providers::openai::api;
use crate::providers::{ChatProvider, ChatRequest, Completion, Error};

/// A provider for any endpoint that speaks the OpenAI chat completions API
pub(crate) struct OpenAIProvider {
    api: api::OpenAIApi,
}

impl OpenAIProvider {
    pub(crate) fn new(endpoint: &EndpointConfig) -> Result<OpenAIProvider, Error> {
        Ok(OpenAIProvider {
            api: api::OpenAIApi::new(&endpoint.api_key, endpoint.api_base.clone())?,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<Completion, Error> {
        self.api.chat_completion(request).await
    }
}
