//! HttpConversationStore -- concrete [`ConversationStore`] for the external
//! conversation backend.
//!
//! The backend owns conversation persistence; this client only speaks its
//! REST surface: `GET` recent turns, `POST` a turn, `POST` a conversation.
//! Every call carries a per-call timeout; error mapping keeps the
//! recoverable/fatal split the pipeline relies on.

use std::time::Duration;

use tracing::debug;

use parley_core::store::ConversationStore;
use parley_types::error::BackendError;
use parley_types::message::{StoredTurn, Turn};

use super::types::{AppendTurnBody, CreateConversationBody, TurnRecord};

/// HTTP client for the external conversation backend.
pub struct HttpConversationStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpConversationStore {
    /// Default per-call timeout.
    const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: String) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("client construction: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_transport(err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Unavailable(err.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(BackendError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

impl ConversationStore for HttpConversationStore {
    async fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, BackendError> {
        let url = self.url(&format!("/conversations/{conversation_id}/turns"));
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(Self::map_transport)?;
        let response = Self::check_status(response).await?;

        let records: Vec<TurnRecord> = response
            .json()
            .await
            .map_err(|e| BackendError::Deserialization(e.to_string()))?;

        debug!(conversation_id, count = records.len(), "Fetched recent turns");
        Ok(records.into_iter().map(Turn::from).collect())
    }

    async fn append_turn(
        &self,
        conversation_id: &str,
        turn: &StoredTurn,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!("/conversations/{conversation_id}/turns"));
        let response = self
            .client
            .post(&url)
            .json(&AppendTurnBody::from_stored(turn))
            .send()
            .await
            .map_err(Self::map_transport)?;
        Self::check_status(response).await?;

        debug!(conversation_id, message_id = %turn.message_id, "Turn appended");
        Ok(())
    }

    async fn ensure_conversation(&self, conversation_id: &str) -> Result<(), BackendError> {
        let url = self.url("/conversations");
        let response = self
            .client
            .post(&url)
            .json(&CreateConversationBody { conversation_id })
            .send()
            .await
            .map_err(Self::map_transport)?;

        // 409 means the conversation already exists, which is exactly what
        // "ensure" asks for.
        if response.status().as_u16() == 409 {
            return Ok(());
        }
        Self::check_status(response).await?;
        Ok(())
    }
}
