//! Wire types for the external conversation backend's REST surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_types::message::{MessageRole, StoredTurn, TextFormat, Turn};

/// Body of `POST /conversations`.
#[derive(Debug, Serialize)]
pub struct CreateConversationBody<'a> {
    pub conversation_id: &'a str,
}

/// Body of `POST /conversations/{id}/turns`.
///
/// The `message_id` is client-supplied so retried writes de-duplicate on
/// the backend side.
#[derive(Debug, Serialize)]
pub struct AppendTurnBody<'a> {
    pub message_id: Uuid,
    pub role: MessageRole,
    pub text: &'a str,
    pub text_format: TextFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl<'a> AppendTurnBody<'a> {
    pub fn from_stored(turn: &'a StoredTurn) -> Self {
        Self {
            message_id: turn.message_id,
            role: turn.role,
            text: &turn.text,
            text_format: turn.text_format,
            metadata: turn
                .metadata
                .as_ref()
                .and_then(|m| serde_json::to_value(m).ok()),
            trace: turn
                .trace
                .as_ref()
                .and_then(|t| serde_json::to_value(t).ok()),
            created_at: turn.created_at,
        }
    }
}

/// One turn as returned by `GET /conversations/{id}/turns`.
#[derive(Debug, Deserialize)]
pub struct TurnRecord {
    pub role: MessageRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<TurnRecord> for Turn {
    fn from(record: TurnRecord) -> Self {
        Turn {
            role: record.role,
            text: record.text,
            created_at: record.created_at,
        }
    }
}
