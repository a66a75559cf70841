//! Tool call types for Parley.
//!
//! A [`ToolCallRequest`] is created by the reasoning step's first pass,
//! consumed by the tool executor, and its [`ToolOutcome`] is folded back
//! into the second reasoning pass. Tool-level failures are outcomes, not
//! pipeline errors -- the model gets a chance to recover or apologize.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared contract of a tool: name, description, and input schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name (e.g. "weather").
    pub name: String,
    /// One-line description shown to the reasoning step.
    pub description: String,
    /// JSON schema the tool's arguments must satisfy.
    pub input_schema: serde_json::Value,
}

/// A tool invocation requested by the reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToolCallRequest {
    /// Call identifier; referenced by trace evidence as `tool:<name>:<id>`.
    pub id: String,
    /// Name of the tool to call.
    pub tool_name: String,
    /// Arguments for the tool, matching its declared input schema.
    pub arguments: serde_json::Value,
    /// Why this tool is needed for the current turn.
    pub rationale: String,
}

impl ToolCallRequest {
    /// Evidence identifier for this call's result.
    pub fn evidence_id(&self) -> String {
        format!("tool:{}:{}", self.tool_name, self.id)
    }
}

/// Result of executing a single tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The tool ran and produced a payload.
    Success { payload: serde_json::Value },
    /// The tool failed or its arguments were rejected.
    Error { message: String },
    /// The tool exceeded its invocation timeout.
    Timeout,
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }
}

/// A completed tool call: the original request paired with its outcome.
///
/// Discarded after the second reasoning pass folds the outcome into the
/// trace evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub request: ToolCallRequest,
    pub outcome: ToolOutcome,
}

/// Errors from tool catalogue construction.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("duplicate tool name: '{0}'")]
    DuplicateName(String),
}

/// Errors raised by tool implementations.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}
