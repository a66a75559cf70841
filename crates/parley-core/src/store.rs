//! ConversationStore port -- the contract with the external conversation
//! backend.
//!
//! Uses RPITIT (Rust 2024 edition) for the async methods, with
//! [`BoxConversationStore`] providing object-safe dynamic dispatch via the
//! blanket-impl pattern: an object-safe `ConversationStoreDyn` trait with
//! boxed futures, blanket-implemented for every `ConversationStore`.

use std::future::Future;
use std::pin::Pin;

use parley_types::error::BackendError;
use parley_types::message::{StoredTurn, Turn};

/// Contract with the external backend that owns conversation storage.
///
/// All calls must be idempotent-safe on retry: turn creation de-duplicates
/// on the client-supplied message id, and `ensure_conversation` succeeds
/// when the conversation already exists.
///
/// Implementations live in `parley-infra` (e.g. `HttpConversationStore`).
pub trait ConversationStore: Send + Sync {
    /// Fetch up to `limit` most recent turns, returned oldest-to-newest.
    fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Turn>, BackendError>> + Send;

    /// Append a turn to a conversation.
    fn append_turn(
        &self,
        conversation_id: &str,
        turn: &StoredTurn,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Create the conversation if it does not already exist.
    fn ensure_conversation(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Object-safe version of [`ConversationStore`] with boxed futures.
pub trait ConversationStoreDyn: Send + Sync {
    fn recent_turns_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Turn>, BackendError>> + Send + 'a>>;

    fn append_turn_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
        turn: &'a StoredTurn,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>>;

    fn ensure_conversation_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>>;
}

impl<T: ConversationStore> ConversationStoreDyn for T {
    fn recent_turns_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Turn>, BackendError>> + Send + 'a>> {
        Box::pin(self.recent_turns(conversation_id, limit))
    }

    fn append_turn_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
        turn: &'a StoredTurn,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>> {
        Box::pin(self.append_turn(conversation_id, turn))
    }

    fn ensure_conversation_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>> {
        Box::pin(self.ensure_conversation(conversation_id))
    }
}

/// Type-erased conversation store for runtime backend selection.
pub struct BoxConversationStore {
    inner: Box<dyn ConversationStoreDyn + Send + Sync>,
}

impl BoxConversationStore {
    /// Wrap a concrete store in a type-erased box.
    pub fn new<T: ConversationStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    /// Fetch up to `limit` most recent turns, oldest-to-newest.
    pub async fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, BackendError> {
        self.inner.recent_turns_boxed(conversation_id, limit).await
    }

    /// Append a turn to a conversation.
    pub async fn append_turn(
        &self,
        conversation_id: &str,
        turn: &StoredTurn,
    ) -> Result<(), BackendError> {
        self.inner.append_turn_boxed(conversation_id, turn).await
    }

    /// Create the conversation if it does not already exist.
    pub async fn ensure_conversation(&self, conversation_id: &str) -> Result<(), BackendError> {
        self.inner.ensure_conversation_boxed(conversation_id).await
    }
}
