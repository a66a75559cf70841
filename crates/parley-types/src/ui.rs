//! UI metadata types for Parley responses.
//!
//! Structured, renderable elements -- cards, tables, navigation and contact
//! shortcuts -- distinct from the free-text answer. The composer enforces
//! that metadata content never restates text already present in the answer
//! body (single source of truth per fact).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Fixed vocabulary of actions a button may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    /// Send a command string back to the agent.
    Command,
    /// Open a URL in the client.
    OpenUrl,
    /// Start a phone call.
    Call,
    /// Compose an email.
    Email,
    /// Start turn-by-turn navigation.
    Navigate,
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonAction::Command => write!(f, "command"),
            ButtonAction::OpenUrl => write!(f, "open_url"),
            ButtonAction::Call => write!(f, "call"),
            ButtonAction::Email => write!(f, "email"),
            ButtonAction::Navigate => write!(f, "navigate"),
        }
    }
}

impl FromStr for ButtonAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "command" => Ok(ButtonAction::Command),
            "open_url" => Ok(ButtonAction::OpenUrl),
            "call" => Ok(ButtonAction::Call),
            "email" => Ok(ButtonAction::Email),
            "navigate" => Ok(ButtonAction::Navigate),
            other => Err(format!("invalid button action: '{other}'")),
        }
    }
}

/// An interactive button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Button {
    /// Text displayed on the button.
    pub label: String,
    /// What pressing the button does.
    pub action: ButtonAction,
    /// Action payload: command string, URL, phone number, or address.
    pub value: String,
}

/// A card with a title, body text, and optional action buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// A simple column/row table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Shortcut card that starts navigation to a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NavigationShortcut {
    /// Destination name.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Maps URL used to start navigation.
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// Shortcut card exposing contact details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContactShortcut {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// Structured UI elements accompanying an answer.
///
/// Invariant (enforced by the response composer): no element's text content
/// restates text already present in the answer body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UiMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationShortcut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactShortcut>,
}

impl UiMetadata {
    /// Whether no element is present at all.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
            && self.tables.is_empty()
            && self.navigation.is_none()
            && self.contact.is_none()
    }
}
