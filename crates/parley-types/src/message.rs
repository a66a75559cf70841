//! Conversation message types for Parley.
//!
//! These types model the turns exchanged with the external conversation
//! backend: roles, text formats, history turns, and the inbound chat
//! request shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::trace::ReasoningTrace;
use crate::ui::UiMetadata;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Rendering format of a message body.
///
/// `Voice` is accepted on inbound requests but aliases to `Plain` when
/// prompt instructions are selected; the spoken-audio rendering itself is
/// owned by the voice front-end, not this pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    #[default]
    Plain,
    Markdown,
    Html,
    Voice,
}

impl TextFormat {
    /// The format whose prompt instructions apply to this format.
    ///
    /// Voice replies are generated as plain text and synthesized elsewhere.
    pub fn instruction_alias(self) -> TextFormat {
        match self {
            TextFormat::Voice => TextFormat::Plain,
            other => other,
        }
    }
}

impl fmt::Display for TextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextFormat::Plain => write!(f, "plain"),
            TextFormat::Markdown => write!(f, "markdown"),
            TextFormat::Html => write!(f, "html"),
            TextFormat::Voice => write!(f, "voice"),
        }
    }
}

impl FromStr for TextFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(TextFormat::Plain),
            "markdown" => Ok(TextFormat::Markdown),
            "html" => Ok(TextFormat::Html),
            "voice" => Ok(TextFormat::Voice),
            other => Err(format!("invalid text format: '{other}'")),
        }
    }
}

/// A single prior turn in a conversation, as read from the external backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A turn as persisted to the external backend.
///
/// Carries the client-supplied message id used by the backend to
/// de-duplicate retried writes, plus the metadata and trace blocks for
/// assistant turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTurn {
    pub message_id: Uuid,
    pub role: MessageRole,
    pub text: String,
    pub text_format: TextFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<UiMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<ReasoningTrace>,
    pub created_at: DateTime<Utc>,
}

/// Inbound chat request handed to the pipeline entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Existing conversation to continue, or `None` to start a fresh one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Free-text user message.
    pub text: String,
    /// Persona override; the configured default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    /// Response format hint; the persona default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
}
