//! LLM request/response types for the structured reasoning call.
//!
//! The reasoning backend receives an assembled prompt plus an output schema
//! and must return a single JSON document conforming to that schema. These
//! types model the request, the raw structured completion, usage tracking,
//! and the parsed [`ReasoningOutput`] shape the schema is derived from.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::message::MessageRole;
use crate::tool::ToolCallRequest;
use crate::trace::ReasoningTrace;
use crate::ui::UiMetadata;

/// A single message in the prompt handed to the reasoning backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Request to the reasoning backend for one structured completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub model: String,
    /// System instructions (persona + context + output contract).
    pub system: String,
    /// Conversation history plus the latest user turn, oldest first.
    pub messages: Vec<PromptMessage>,
    /// JSON schema the completion must conform to.
    pub output_schema: serde_json::Value,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Token usage for a single completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Raw result of a structured completion, before output parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredCompletion {
    /// Provider-assigned response id.
    pub id: String,
    /// Model that produced the completion.
    pub model: String,
    /// The JSON document emitted by the model.
    pub output: serde_json::Value,
    pub usage: Usage,
}

/// Accumulated LLM usage for one pipeline request.
///
/// A request may spend several completions (schema-repair retry, second
/// pass after tool dispatch); this record sums them. The model name is the
/// one from the most recent completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmTrace {
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    pub total_cost: f64,
}

impl LlmTrace {
    /// Fold one completion's usage into the running total.
    pub fn absorb(&mut self, completion: &StructuredCompletion) {
        self.model = completion.model.clone();
        self.input_tokens += completion.usage.input_tokens;
        self.output_tokens += completion.usage.output_tokens;
        self.total_tokens += completion.usage.input_tokens + completion.usage.output_tokens;
    }

    /// Add cost for tokens at the given per-million rates.
    pub fn add_cost(&mut self, input_per_million: f64, output_per_million: f64) {
        self.total_cost += f64::from(self.input_tokens) * input_per_million / 1_000_000.0
            + f64::from(self.output_tokens) * output_per_million / 1_000_000.0;
    }
}

/// The schema-constrained document the reasoning step must emit.
///
/// Either `answer` is present (final answer) or `tool_calls` is non-empty
/// (tool-dispatch round); the reasoning engine rejects documents with
/// neither. The trace is always required.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReasoningOutput {
    /// User-facing answer text; absent while tool calls are pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Mandatory reasoning trace for this turn.
    pub trace: ReasoningTrace,
    /// Tool invocations requested by this pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Structured UI elements accompanying the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<UiMetadata>,
}

/// Errors from reasoning backend operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("rate limited")]
    RateLimited,

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    ///
    /// Auth and request-shape errors are permanent; everything
    /// transport-shaped is worth a bounded retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Provider { .. }
                | LlmError::Timeout
                | LlmError::RateLimited
                | LlmError::Overloaded(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completion(input: u32, output: u32) -> StructuredCompletion {
        StructuredCompletion {
            id: "resp_1".to_string(),
            model: "gpt-4.1".to_string(),
            output: json!({}),
            usage: Usage {
                input_tokens: input,
                output_tokens: output,
            },
        }
    }

    #[test]
    fn test_llm_trace_absorbs_two_completions() {
        let mut trace = LlmTrace::default();
        trace.absorb(&completion(100, 20));
        trace.absorb(&completion(150, 30));

        assert_eq!(trace.model, "gpt-4.1");
        assert_eq!(trace.input_tokens, 250);
        assert_eq!(trace.output_tokens, 50);
        assert_eq!(trace.total_tokens, 300);
    }

    #[test]
    fn test_llm_trace_cost() {
        let mut trace = LlmTrace::default();
        trace.absorb(&completion(1_000_000, 1_000_000));
        trace.add_cost(2.0, 8.0);
        assert!((trace.total_cost - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::Overloaded("529".to_string()).is_transient());
        assert!(!LlmError::AuthenticationFailed.is_transient());
        assert!(!LlmError::Deserialization("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_reasoning_output_parses_final_answer() {
        let json = r#"{
            "answer": "It is 18 C in Paris.",
            "trace": {
                "routing": {"path": "answer-direct", "rationale": "had tool data"},
                "evidence": ["tool:weather:c1"],
                "verification": "verified"
            }
        }"#;
        let output: ReasoningOutput = serde_json::from_str(json).unwrap();
        assert!(output.answer.is_some());
        assert!(output.tool_calls.is_empty());
        assert!(output.metadata.is_none());
    }

    #[test]
    fn test_reasoning_output_parses_tool_dispatch() {
        let json = r#"{
            "trace": {
                "routing": {"path": "tool-dispatch", "rationale": "needs live data"},
                "verification": "unverified"
            },
            "tool_calls": [{
                "id": "c1",
                "tool_name": "weather",
                "arguments": {"city": "Paris"},
                "rationale": "current conditions requested"
            }]
        }"#;
        let output: ReasoningOutput = serde_json::from_str(json).unwrap();
        assert!(output.answer.is_none());
        assert_eq!(output.tool_calls.len(), 1);
        assert_eq!(output.tool_calls[0].tool_name, "weather");
    }

    #[test]
    fn test_reasoning_output_schema_mentions_required_trace() {
        let schema = schemars::schema_for!(ReasoningOutput);
        let value = serde_json::to_value(&schema).unwrap();
        let required = value["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "trace"));
    }
}
