//! The externally visible result of one pipeline request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::LlmTrace;
use crate::message::{MessageRole, StoredTurn, TextFormat};
use crate::trace::ReasoningTrace;
use crate::ui::UiMetadata;

/// A finalized agent reply.
///
/// Created once per request by the response composer and immutable from
/// that point on; handed to backend sync for persistence and to the caller
/// for display. The trace is non-optional by construction -- a response
/// without one is invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message_id: Uuid,
    pub role: MessageRole,
    pub text: String,
    pub text_format: TextFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<UiMetadata>,
    /// Auxiliary observability field; not all callers consume it.
    pub trace: ReasoningTrace,
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    /// Accumulated LLM usage across all completions spent on this request.
    pub llm_trace: LlmTrace,
    /// Non-fatal warnings (e.g. persistence failure after the answer was
    /// already produced).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AgentResponse {
    /// Attach a non-fatal warning, consuming and returning the response.
    ///
    /// The only sanctioned post-construction change; everything else about
    /// the response is fixed once composed.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// The turn record persisted for this response.
    pub fn to_stored_turn(&self) -> StoredTurn {
        StoredTurn {
            message_id: self.message_id,
            role: self.role,
            text: self.text.clone(),
            text_format: self.text_format,
            metadata: self.metadata.clone(),
            trace: Some(self.trace.clone()),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{RoutingDecision, VerificationStatus};

    fn response() -> AgentResponse {
        AgentResponse {
            message_id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            text: "Hello!".to_string(),
            text_format: TextFormat::Plain,
            metadata: None,
            trace: ReasoningTrace {
                routing: RoutingDecision {
                    path: "answer-direct".to_string(),
                    rationale: "greeting".to_string(),
                },
                evidence: vec![],
                verification: VerificationStatus::Unverified,
                warnings: vec![],
            },
            conversation_id: "conv-1".to_string(),
            created_at: Utc::now(),
            llm_trace: LlmTrace::default(),
            warnings: vec![],
        }
    }

    #[test]
    fn test_with_warning_appends() {
        let response = response().with_warning("sync:failed:timeout");
        assert_eq!(response.warnings, vec!["sync:failed:timeout"]);
    }

    #[test]
    fn test_to_stored_turn_carries_trace() {
        let response = response();
        let turn = response.to_stored_turn();
        assert_eq!(turn.message_id, response.message_id);
        assert_eq!(turn.role, MessageRole::Assistant);
        assert!(turn.trace.is_some());
    }

    #[test]
    fn test_warnings_omitted_from_json_when_empty() {
        let json = serde_json::to_string(&response()).unwrap();
        assert!(!json.contains("warnings"));
    }
}
