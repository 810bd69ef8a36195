use std::time::Duration;

use reqwest::Client;

use crate::providers::apireq::{endpoint_url, ReqwestError, Url};
use crate::providers::{ChatRequest, Completion, Error};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
// Long completions can take minutes before the first byte arrives
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

pub(super) struct OpenAIApi {
    client: Client,
    api_base: Url,
    api_key: String,
}

impl OpenAIApi {
    pub(super) fn new(api_key: &str, api_base: Url) -> Result<OpenAIApi, Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::RequestFailed(e.into()))?;

        Ok(Self::with_client(client, api_key, api_base))
    }

    pub(super) fn with_client(client: Client, api_key: &str, api_base: Url) -> OpenAIApi {
        OpenAIApi {
            client,
            api_base,
            api_key: api_key.to_string(),
        }
    }

    pub(super) async fn chat_completion(
        &self,
        request: &ChatRequest<'_>,
    ) -> Result<Completion, Error> {
        let url = endpoint_url(&self.api_base, CHAT_COMPLETIONS_PATH)?;

        tracing::debug!(%url, model = request.model, messages = request.messages.len(), "sending chat request");

        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::RequestFailed(ReqwestError::new(e)))?;

        let status = res.status();

        let body = res
            .text()
            .await
            .map_err(|e| Error::RequestFailed(ReqwestError::new(e)))?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "received chat response");

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Completion::from_body(body)
    }
}
