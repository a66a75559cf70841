//! Backend sync -- fire-and-confirm persistence of the exchanged turns.
//!
//! The caller already holds the answer by the time sync runs, so
//! persistence failure is never fatal: it is logged and surfaced as a
//! non-fatal warning on the response. The whole write sequence is bounded
//! by a single timeout so the pipeline never blocks indefinitely on the
//! external backend. Eventual-consistency guarantees are the backend's
//! responsibility, not this module's.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use parley_types::error::BackendError;
use parley_types::message::StoredTurn;
use parley_types::response::AgentResponse;

use crate::store::BoxConversationStore;

/// Warning prefix attached to responses whose persistence failed.
const SYNC_WARNING_PREFIX: &str = "sync:failed:";

/// Persists one exchange (user turn + agent response) to the external
/// backend.
pub struct BackendSync {
    write_timeout: Duration,
}

impl BackendSync {
    pub fn new(write_timeout: Duration) -> Self {
        Self { write_timeout }
    }

    /// Persist the exchange, returning a warning string on failure.
    ///
    /// Ensures the conversation exists (creating it if absent), then writes
    /// the user turn and the response turn. The client-supplied message ids
    /// make retried writes idempotent on the backend side.
    pub async fn persist_exchange(
        &self,
        store: &BoxConversationStore,
        conversation_id: &str,
        user_turn: &StoredTurn,
        response: &AgentResponse,
    ) -> Option<String> {
        let response_turn = response.to_stored_turn();
        let sequence = async {
            store.ensure_conversation(conversation_id).await?;
            store.append_turn(conversation_id, user_turn).await?;
            store.append_turn(conversation_id, &response_turn).await?;
            Ok::<(), BackendError>(())
        };

        match timeout(self.write_timeout, sequence).await {
            Ok(Ok(())) => {
                debug!(conversation_id, "Exchange persisted");
                None
            }
            Ok(Err(err)) => {
                warn!(conversation_id, error = %err, "Backend sync failed");
                Some(format!("{SYNC_WARNING_PREFIX}{err}"))
            }
            Err(_) => {
                warn!(
                    conversation_id,
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "Backend sync timed out"
                );
                Some(format!("{SYNC_WARNING_PREFIX}write timed out"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConversationStore;
    use chrono::Utc;
    use parley_types::llm::LlmTrace;
    use parley_types::message::{MessageRole, TextFormat, Turn};
    use parley_types::trace::{ReasoningTrace, RoutingDecision, VerificationStatus};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingStore {
        appended: Mutex<Vec<Uuid>>,
        ensured: Mutex<Vec<String>>,
        fail_writes: bool,
        hang: bool,
    }

    impl ConversationStore for RecordingStore {
        async fn recent_turns(
            &self,
            _conversation_id: &str,
            _limit: usize,
        ) -> Result<Vec<Turn>, BackendError> {
            Ok(vec![])
        }

        async fn append_turn(
            &self,
            _conversation_id: &str,
            turn: &StoredTurn,
        ) -> Result<(), BackendError> {
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail_writes {
                return Err(BackendError::Http {
                    status: 503,
                    message: "maintenance".to_string(),
                });
            }
            self.appended.lock().unwrap().push(turn.message_id);
            Ok(())
        }

        async fn ensure_conversation(&self, conversation_id: &str) -> Result<(), BackendError> {
            self.ensured
                .lock()
                .unwrap()
                .push(conversation_id.to_string());
            Ok(())
        }
    }

    fn user_turn() -> StoredTurn {
        StoredTurn {
            message_id: Uuid::now_v7(),
            role: MessageRole::User,
            text: "hi".to_string(),
            text_format: TextFormat::Plain,
            metadata: None,
            trace: None,
            created_at: Utc::now(),
        }
    }

    fn response() -> AgentResponse {
        AgentResponse {
            message_id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            text: "hello".to_string(),
            text_format: TextFormat::Plain,
            metadata: None,
            trace: ReasoningTrace {
                routing: RoutingDecision {
                    path: "answer-direct".to_string(),
                    rationale: "r".to_string(),
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

    #[tokio::test]
    async fn test_successful_sync_returns_no_warning() {
        let store = BoxConversationStore::new(RecordingStore::default());
        let sync = BackendSync::new(Duration::from_millis(500));

        let warning = sync
            .persist_exchange(&store, "conv-1", &user_turn(), &response())
            .await;

        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_returns_warning() {
        let store = BoxConversationStore::new(RecordingStore {
            fail_writes: true,
            ..RecordingStore::default()
        });
        let sync = BackendSync::new(Duration::from_millis(500));

        let warning = sync
            .persist_exchange(&store, "conv-1", &user_turn(), &response())
            .await
            .unwrap();

        assert!(warning.starts_with("sync:failed:"));
        assert!(warning.contains("503"));
    }

    #[tokio::test]
    async fn test_hanging_backend_hits_timeout() {
        let store = BoxConversationStore::new(RecordingStore {
            hang: true,
            ..RecordingStore::default()
        });
        let sync = BackendSync::new(Duration::from_millis(20));

        let warning = sync
            .persist_exchange(&store, "conv-1", &user_turn(), &response())
            .await
            .unwrap();

        assert_eq!(warning, "sync:failed:write timed out");
    }
}
