//! Response composer -- merges the finalized answer with UI metadata.
//!
//! Enforces the single-source-of-truth invariant: a metadata field whose
//! text already appears in the answer body is dropped, and a warning marker
//! is attached to the trace. Detection is deliberately conservative --
//! case-insensitive, whitespace-normalized exact substring match with a
//! minimum length, so short labels from the fixed button vocabulary are
//! never affected. Produces the final, immutable [`AgentResponse`].

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use parley_types::llm::LlmTrace;
use parley_types::message::{MessageRole, TextFormat};
use parley_types::response::AgentResponse;
use parley_types::trace::EVIDENCE_HISTORY_DEGRADED;
use parley_types::ui::UiMetadata;

use crate::reasoning::FinalDraft;

/// Minimum normalized length before a metadata field can count as a
/// duplicate of answer text.
const MIN_OVERLAP_CHARS: usize = 12;

/// Everything the composer needs for one response.
pub struct ComposeParams {
    pub draft: FinalDraft,
    pub conversation_id: String,
    pub message_id: Uuid,
    pub text_format: TextFormat,
    /// Set when history could not be fetched for this request.
    pub history_degraded: bool,
    pub llm_trace: LlmTrace,
}

/// Builds the final [`AgentResponse`] from a finalized draft.
pub struct ResponseComposer {
    min_overlap: usize,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self {
            min_overlap: MIN_OVERLAP_CHARS,
        }
    }
}

impl ResponseComposer {
    /// Compose the immutable response value.
    pub fn compose(&self, params: ComposeParams) -> AgentResponse {
        let ComposeParams {
            draft,
            conversation_id,
            message_id,
            text_format,
            history_degraded,
            llm_trace,
        } = params;

        let mut trace = draft.trace;
        if history_degraded && !trace.evidence.iter().any(|e| e == EVIDENCE_HISTORY_DEGRADED) {
            trace.push_evidence(EVIDENCE_HISTORY_DEGRADED);
        }

        let metadata = draft.metadata.and_then(|mut metadata| {
            let dropped = self.prune_duplicates(&mut metadata, &draft.answer);
            for field in dropped {
                debug!(%field, "Dropped metadata field duplicating answer text");
                trace.push_warning(format!("metadata:dropped:{field}"));
            }
            if metadata.is_empty() {
                None
            } else {
                Some(metadata)
            }
        });

        AgentResponse {
            message_id,
            role: MessageRole::Assistant,
            text: draft.answer,
            text_format,
            metadata,
            trace,
            conversation_id,
            created_at: Utc::now(),
            llm_trace,
            warnings: Vec::new(),
        }
    }

    /// Remove metadata fields whose text duplicates the answer body.
    ///
    /// Returns the names of dropped fields for trace annotation.
    fn prune_duplicates(&self, metadata: &mut UiMetadata, answer: &str) -> Vec<String> {
        let answer_normalized = normalize(answer);
        let mut dropped = Vec::new();
        let duplicates =
            |text: &str| self.is_duplicate(&answer_normalized, text);

        metadata.cards.retain(|card| {
            if duplicates(&card.body) {
                dropped.push("card.body".to_string());
                false
            } else {
                true
            }
        });
        for card in &mut metadata.cards {
            if card.title.as_deref().is_some_and(&duplicates) {
                card.title = None;
                dropped.push("card.title".to_string());
            }
        }

        for table in &mut metadata.tables {
            if table.caption.as_deref().is_some_and(&duplicates) {
                table.caption = None;
                dropped.push("table.caption".to_string());
            }
        }

        if let Some(navigation) = &mut metadata.navigation {
            if navigation.description.as_deref().is_some_and(&duplicates) {
                navigation.description = None;
                dropped.push("navigation.description".to_string());
            }
        }

        if let Some(contact) = &mut metadata.contact {
            if contact.email.as_deref().is_some_and(&duplicates) {
                contact.email = None;
                dropped.push("contact.email".to_string());
            }
            if contact.phone.as_deref().is_some_and(&duplicates) {
                contact.phone = None;
                dropped.push("contact.phone".to_string());
            }
        }

        dropped
    }

    fn is_duplicate(&self, answer_normalized: &str, field: &str) -> bool {
        let field_normalized = normalize(field);
        field_normalized.chars().count() >= self.min_overlap
            && answer_normalized.contains(&field_normalized)
    }
}

/// Lowercase and collapse whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::trace::{ReasoningTrace, RoutingDecision, VerificationStatus};
    use parley_types::ui::{Card, ContactShortcut, NavigationShortcut, Table};

    fn trace() -> ReasoningTrace {
        ReasoningTrace {
            routing: RoutingDecision {
                path: "answer-direct".to_string(),
                rationale: "test".to_string(),
            },
            evidence: vec![],
            verification: VerificationStatus::Verified,
            warnings: vec![],
        }
    }

    fn params(answer: &str, metadata: Option<UiMetadata>) -> ComposeParams {
        ComposeParams {
            draft: FinalDraft {
                answer: answer.to_string(),
                trace: trace(),
                metadata,
            },
            conversation_id: "conv-1".to_string(),
            message_id: Uuid::now_v7(),
            text_format: TextFormat::Plain,
            history_degraded: false,
            llm_trace: LlmTrace::default(),
        }
    }

    #[test]
    fn test_compose_without_metadata() {
        let response = ResponseComposer::default().compose(params("Hello there!", None));
        assert_eq!(response.text, "Hello there!");
        assert!(response.metadata.is_none());
        assert_eq!(response.role, MessageRole::Assistant);
        assert!(response.trace.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_card_body_dropped_with_warning() {
        let metadata = UiMetadata {
            cards: vec![Card {
                title: Some("Weather".to_string()),
                body: "Currently 18 C with light rain in Paris.".to_string(),
                buttons: vec![],
            }],
            ..UiMetadata::default()
        };
        let answer =
            "Here is the forecast: currently 18 C with   Light Rain in Paris. Take an umbrella!";

        let response = ResponseComposer::default().compose(params(answer, Some(metadata)));

        // The only card duplicated the answer, so the block collapses away.
        assert!(response.metadata.is_none());
        assert_eq!(response.trace.warnings, vec!["metadata:dropped:card.body"]);
    }

    #[test]
    fn test_distinct_card_kept() {
        let metadata = UiMetadata {
            cards: vec![Card {
                title: Some("Tomorrow".to_string()),
                body: "Sunny, high of 24 C.".to_string(),
                buttons: vec![],
            }],
            ..UiMetadata::default()
        };

        let response = ResponseComposer::default()
            .compose(params("Today it is raining in Paris.", Some(metadata)));

        assert!(response.metadata.is_some());
        assert!(response.trace.warnings.is_empty());
    }

    #[test]
    fn test_short_fields_never_dropped() {
        // "Open" appears verbatim in the answer, but is far below the
        // overlap threshold.
        let metadata = UiMetadata {
            cards: vec![Card {
                title: Some("Open".to_string()),
                body: "Detailed opening hours for the week.".to_string(),
                buttons: vec![],
            }],
            ..UiMetadata::default()
        };

        let response = ResponseComposer::default()
            .compose(params("The store is open today.", Some(metadata)));

        let card = &response.metadata.unwrap().cards[0];
        assert_eq!(card.title.as_deref(), Some("Open"));
    }

    #[test]
    fn test_table_caption_pruned_but_table_kept() {
        let metadata = UiMetadata {
            tables: vec![Table {
                caption: Some("Exchange rates for today".to_string()),
                columns: vec!["pair".to_string(), "rate".to_string()],
                rows: vec![vec!["EUR/USD".to_string(), "1.09".to_string()]],
            }],
            ..UiMetadata::default()
        };

        let response = ResponseComposer::default().compose(params(
            "Here are the exchange rates for today.",
            Some(metadata),
        ));

        let tables = &response.metadata.as_ref().unwrap().tables;
        assert!(tables[0].caption.is_none());
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(response.trace.warnings, vec!["metadata:dropped:table.caption"]);
    }

    #[test]
    fn test_navigation_and_contact_pruning() {
        let metadata = UiMetadata {
            navigation: Some(NavigationShortcut {
                title: "Office".to_string(),
                description: Some("Navigate to the Hamburg office now".to_string()),
                url: "https://maps.example/office".to_string(),
                buttons: vec![],
            }),
            contact: Some(ContactShortcut {
                name: "Alex Schmidt".to_string(),
                email: Some("alex.schmidt@example.com".to_string()),
                phone: None,
                buttons: vec![],
            }),
            ..UiMetadata::default()
        };

        let answer = "Navigate to the Hamburg office now, or write to alex.schmidt@example.com.";
        let response = ResponseComposer::default().compose(params(answer, Some(metadata)));

        let metadata = response.metadata.unwrap();
        assert!(metadata.navigation.as_ref().unwrap().description.is_none());
        assert!(metadata.contact.as_ref().unwrap().email.is_none());
        assert_eq!(
            response.trace.warnings,
            vec![
                "metadata:dropped:navigation.description",
                "metadata:dropped:contact.email"
            ]
        );
    }

    #[test]
    fn test_degraded_history_marker_added() {
        let mut p = params("Hello!", None);
        p.history_degraded = true;
        let response = ResponseComposer::default().compose(p);
        assert!(response
            .trace
            .evidence
            .iter()
            .any(|e| e == EVIDENCE_HISTORY_DEGRADED));
    }

    #[test]
    fn test_no_duplication_property_holds_after_compose() {
        // Property from the spec: no surviving metadata text field is a
        // normalized substring of the answer.
        let metadata = UiMetadata {
            cards: vec![
                Card {
                    title: None,
                    body: "It is currently 18 C in Paris.".to_string(),
                    buttons: vec![],
                },
                Card {
                    title: None,
                    body: "Tomorrow will be sunny.".to_string(),
                    buttons: vec![],
                },
            ],
            ..UiMetadata::default()
        };
        let answer = "It is currently 18 C in Paris.";

        let response = ResponseComposer::default().compose(params(answer, Some(metadata)));

        let answer_normalized = normalize(&response.text);
        for card in &response.metadata.unwrap().cards {
            let body = normalize(&card.body);
            assert!(
                body.chars().count() < MIN_OVERLAP_CHARS
                    || !answer_normalized.contains(&body)
            );
        }
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  A\tB \n C  "), "a b c");
    }
}
