//! Context assembler -- gathers user facts and conversation history into a
//! request-scoped rendering context.
//!
//! History is fetched from the external backend, bounded to a configured
//! recent-turn window. A backend failure degrades the request to a fresh
//! conversation (empty history) instead of aborting; the degradation is
//! flagged so it lands in the eventual trace's evidence field.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use parley_types::config::UserProfile;
use parley_types::message::Turn;

use crate::store::BoxConversationStore;

/// Injectable clock, overridden in tests for deterministic prompts.
pub type Clock = fn() -> DateTime<Utc>;

/// Request-scoped context for one pipeline run.
///
/// Owned by a single request; never mutated concurrently.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub conversation_id: String,
    /// Prior turns, oldest-to-newest, bounded by the history window.
    pub history: Vec<Turn>,
    pub profile: UserProfile,
    /// Request time rendered in the user's timezone, e.g.
    /// "Friday, 2026-08-07 14:05 (Europe/Berlin)".
    pub local_time: String,
    /// Set when history could not be fetched and the request proceeded
    /// with a fresh conversation.
    pub history_degraded: bool,
}

/// Builds [`ConversationContext`] values from the backend and process-wide
/// configuration. No side effects beyond the history read.
pub struct ContextAssembler {
    profile: UserProfile,
    history_window: usize,
    clock: Clock,
}

impl ContextAssembler {
    pub fn new(profile: UserProfile, history_window: usize) -> Self {
        Self {
            profile,
            history_window,
            clock: Utc::now,
        }
    }

    /// Replace the clock (tests only need determinism, not time travel).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Assemble the context for one request.
    ///
    /// A backend read failure is absorbed: the context carries an empty
    /// history and `history_degraded = true`.
    pub async fn assemble(
        &self,
        store: &BoxConversationStore,
        conversation_id: &str,
    ) -> ConversationContext {
        let (history, history_degraded) = match store
            .recent_turns(conversation_id, self.history_window)
            .await
        {
            Ok(turns) => (turns, false),
            Err(err) => {
                warn!(
                    conversation_id,
                    error = %err,
                    "History fetch failed; degrading to empty history"
                );
                (Vec::new(), true)
            }
        };

        ConversationContext {
            conversation_id: conversation_id.to_string(),
            history,
            profile: self.profile.clone(),
            local_time: self.render_local_time(),
            history_degraded,
        }
    }

    /// Render the current instant in the user's timezone.
    ///
    /// An unparseable timezone name falls back to UTC rather than failing
    /// the request.
    fn render_local_time(&self) -> String {
        let now = (self.clock)();
        match self.profile.timezone.parse::<Tz>() {
            Ok(tz) => {
                let local = now.with_timezone(&tz);
                format!(
                    "{} ({})",
                    local.format("%A, %Y-%m-%d %H:%M"),
                    self.profile.timezone
                )
            }
            Err(_) => {
                warn!(timezone = %self.profile.timezone, "Unknown timezone; using UTC");
                format!("{} (UTC)", now.format("%A, %Y-%m-%d %H:%M"))
            }
        }
    }
}
