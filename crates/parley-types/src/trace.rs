//! Reasoning trace types for Parley.
//!
//! Every finalized answer must be accompanied by a [`ReasoningTrace`]: the
//! routing decision that chose a capability path, the evidence consulted,
//! and a verification verdict. Traces are emitted by the reasoning step and
//! annotated by later pipeline stages (composer warnings, degraded-history
//! markers).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Evidence marker recorded when conversation history could not be fetched
/// and the request proceeded with an empty history.
pub const EVIDENCE_HISTORY_DEGRADED: &str = "history:degraded";

/// Routing path recorded on the provisional trace of a tool-dispatch round.
pub const ROUTING_TOOL_DISPATCH: &str = "tool-dispatch";

/// Which capability or tool path the reasoning step chose, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoutingDecision {
    /// Chosen path for this turn (e.g. "answer-direct", "tool-dispatch").
    pub path: String,
    /// One-sentence reason for choosing this path.
    pub rationale: String,
}

/// Verification verdict for the factual content of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Claims are backed by consulted evidence.
    Verified,
    /// No evidence was available to check the claims against.
    Unverified,
    /// Consulted evidence contradicts at least one claim.
    Contradicted,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::Unverified => write!(f, "unverified"),
            VerificationStatus::Contradicted => write!(f, "contradicted"),
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verified" => Ok(VerificationStatus::Verified),
            "unverified" => Ok(VerificationStatus::Unverified),
            "contradicted" => Ok(VerificationStatus::Contradicted),
            other => Err(format!("invalid verification status: '{other}'")),
        }
    }
}

/// Structured record of how an answer was derived.
///
/// A response without a trace is invalid; [`crate::response::AgentResponse`]
/// therefore owns a non-optional `ReasoningTrace`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReasoningTrace {
    /// The capability/tool path chosen for this turn.
    pub routing: RoutingDecision,
    /// Identifiers of sources or tool results consulted. Also carries
    /// pipeline markers such as [`EVIDENCE_HISTORY_DEGRADED`].
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Verification verdict for the answer's factual content.
    pub verification: VerificationStatus,
    /// Non-fatal annotations appended by later pipeline stages
    /// (dropped metadata fields, persistence failures). Not produced by
    /// the reasoning step itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ReasoningTrace {
    /// A provisional trace for a tool-dispatch round.
    pub fn tool_dispatch(rationale: impl Into<String>) -> Self {
        Self {
            routing: RoutingDecision {
                path: ROUTING_TOOL_DISPATCH.to_string(),
                rationale: rationale.into(),
            },
            evidence: Vec::new(),
            verification: VerificationStatus::Unverified,
            warnings: Vec::new(),
        }
    }

    /// Record that an evidence source was consulted.
    pub fn push_evidence(&mut self, id: impl Into<String>) {
        self.evidence.push(id.into());
    }

    /// Attach a non-fatal warning marker.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_status_roundtrip() {
        for status in [
            VerificationStatus::Verified,
            VerificationStatus::Unverified,
            VerificationStatus::Contradicted,
        ] {
            let s = status.to_string();
            let parsed: VerificationStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_verification_status_serde() {
        let json = serde_json::to_string(&VerificationStatus::Contradicted).unwrap();
        assert_eq!(json, "\"contradicted\"");
        let parsed: VerificationStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, VerificationStatus::Contradicted);
    }

    #[test]
    fn test_tool_dispatch_trace_shape() {
        let trace = ReasoningTrace::tool_dispatch("needs live weather data");
        assert_eq!(trace.routing.path, ROUTING_TOOL_DISPATCH);
        assert_eq!(trace.verification, VerificationStatus::Unverified);
        assert!(trace.evidence.is_empty());
        assert!(trace.warnings.is_empty());
    }

    #[test]
    fn test_warnings_omitted_from_json_when_empty() {
        let trace = ReasoningTrace::tool_dispatch("r");
        let json = serde_json::to_string(&trace).unwrap();
        assert!(!json.contains("warnings"));
    }

    #[test]
    fn test_trace_deserializes_without_optional_fields() {
        let json = r#"{
            "routing": {"path": "answer-direct", "rationale": "small talk"},
            "verification": "unverified"
        }"#;
        let trace: ReasoningTrace = serde_json::from_str(json).unwrap();
        assert!(trace.evidence.is_empty());
        assert!(trace.warnings.is_empty());
    }

    #[test]
    fn test_push_evidence_and_warning() {
        let mut trace = ReasoningTrace::tool_dispatch("r");
        trace.push_evidence("tool:weather:abc");
        trace.push_warning("metadata:dropped:card.body");
        assert_eq!(trace.evidence, vec!["tool:weather:abc"]);
        assert_eq!(trace.warnings, vec!["metadata:dropped:card.body"]);
    }
}
