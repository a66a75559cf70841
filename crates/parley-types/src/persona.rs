//! Persona types for Parley.
//!
//! A persona is a named style/behavior template applied to the reasoning
//! prompt. Personas are immutable once the registry is built; changing them
//! requires a process restart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

use crate::message::TextFormat;

/// How formally the persona addresses the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Casual,
    #[default]
    Neutral,
    Formal,
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formality::Casual => write!(f, "casual"),
            Formality::Neutral => write!(f, "neutral"),
            Formality::Formal => write!(f, "formal"),
        }
    }
}

impl FromStr for Formality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "casual" => Ok(Formality::Casual),
            "neutral" => Ok(Formality::Neutral),
            "formal" => Ok(Formality::Formal),
            other => Err(format!("invalid formality: '{other}'")),
        }
    }
}

/// A named prompt persona.
///
/// The template body may reference context facts via `{placeholder}`
/// markers (e.g. `{user_name}`, `{formality}`); rendering substitutes them
/// at prompt-build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Registry key (e.g. "business").
    pub key: String,
    /// Human-readable name shown in logs.
    pub display_name: String,
    /// Prompt fragment describing tone, style, and constraints.
    pub template: String,
    /// Formality level substituted into the template.
    #[serde(default)]
    pub formality: Formality,
    /// Response format used when the request carries no hint.
    #[serde(default)]
    pub default_format: TextFormat,
}

/// Errors related to persona lookup and registry construction.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("persona not found: '{0}'")]
    NotFound(String),

    #[error("duplicate persona key: '{0}'")]
    DuplicateKey(String),

    #[error("invalid persona template for '{key}': {reason}")]
    InvalidTemplate { key: String, reason: String },
}
