//! OpenAiCompatBackend -- concrete [`ReasoningBackend`] for any provider
//! speaking the OpenAI `/chat/completions` dialect with `json_schema`
//! response format (OpenAI, OpenRouter, local inference servers).
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the Authorization header; it never appears in Debug
//! output or tracing logs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use parley_core::reasoning::ReasoningBackend;
use parley_types::llm::{LlmError, ReasoningRequest, StructuredCompletion, Usage};

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ResponseFormat, WireMessage,
};

/// Reasoning backend for OpenAI-compatible chat-completions APIs.
pub struct OpenAiCompatBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiCompatBackend {
    /// Default per-call timeout; generous because structured generations
    /// with large schemas can be slow.
    const TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_key: SecretString, base_url: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| LlmError::InvalidRequest(format!("client construction: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert a [`ReasoningRequest`] into the wire shape: the system
    /// prompt becomes the leading system message.
    fn to_wire_request(request: &ReasoningRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(WireMessage {
            role: "system".to_string(),
            content: request.system.clone(),
        });
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));

        ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: ResponseFormat::strict_schema(request.output_schema.clone()),
        }
    }

    fn map_status(status: u16, body: String) -> LlmError {
        match status {
            401 | 403 => LlmError::AuthenticationFailed,
            429 => LlmError::RateLimited,
            500..=599 => LlmError::Overloaded(format!("HTTP {status}: {body}")),
            _ => LlmError::Provider {
                message: format!("HTTP {status}: {body}"),
            },
        }
    }

    fn map_transport(err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Provider {
                message: err.to_string(),
            }
        }
    }
}

/// Strip a Markdown code fence if the model wrapped its JSON in one.
///
/// Some providers emit ```json ... ``` despite the response_format
/// contract; the engine's schema parse would reject the fenced text.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

impl ReasoningBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn complete_structured(
        &self,
        request: &ReasoningRequest,
    ) -> Result<StructuredCompletion, LlmError> {
        let body = Self::to_wire_request(request);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status.as_u16(), body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("response body: {e}")))?;

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| LlmError::Deserialization("response carried no content".to_string()))?;

        let output: serde_json::Value = serde_json::from_str(extract_json(content))
            .map_err(|e| LlmError::Deserialization(format!("content is not JSON: {e}")))?;

        let usage = completion.usage.unwrap_or_default();
        debug!(
            model = completion.model.as_deref().unwrap_or("unknown"),
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            "Structured completion received"
        );

        Ok(StructuredCompletion {
            id: completion.id.unwrap_or_default(),
            model: completion
                .model
                .unwrap_or_else(|| request.model.clone()),
            output,
            usage: Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}
