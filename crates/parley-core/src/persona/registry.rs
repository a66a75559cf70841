//! Fixed persona registry validated at startup.
//!
//! Personas are enumerated once at process start; an unknown key fails at
//! registry construction (or at lookup, as `PersonaError::NotFound`) rather
//! than surfacing mid-request as a missing template file. The registry is
//! read-only after construction and safe for unlimited concurrent readers.

use std::collections::HashMap;

use parley_types::persona::{Persona, PersonaError};

/// Placeholder markers a template may reference. Anything else in braces is
/// left verbatim, so JSON snippets inside templates survive rendering.
const KNOWN_PLACEHOLDERS: &[&str] = &["user_name", "formality", "locale", "units"];

/// Immutable, process-wide persona store.
#[derive(Debug)]
pub struct PersonaRegistry {
    personas: HashMap<String, Persona>,
    /// Keys in registration order, for stable listing.
    keys: Vec<String>,
}

impl PersonaRegistry {
    /// Build a registry from an enumerated persona set.
    ///
    /// Rejects duplicate keys and templates that reference unknown
    /// placeholders, so misconfiguration fails at startup instead of at
    /// first use in a request.
    pub fn new(personas: Vec<Persona>) -> Result<Self, PersonaError> {
        let mut map = HashMap::with_capacity(personas.len());
        let mut keys = Vec::with_capacity(personas.len());

        for persona in personas {
            if let Some(unknown) = first_unknown_placeholder(&persona.template) {
                return Err(PersonaError::InvalidTemplate {
                    key: persona.key,
                    reason: format!("unknown placeholder '{{{unknown}}}'"),
                });
            }
            if map.contains_key(&persona.key) {
                return Err(PersonaError::DuplicateKey(persona.key));
            }
            keys.push(persona.key.clone());
            map.insert(persona.key.clone(), persona);
        }

        Ok(Self {
            personas: map,
            keys,
        })
    }

    /// Look up a persona by key.
    pub fn get(&self, key: &str) -> Result<&Persona, PersonaError> {
        self.personas
            .get(key)
            .ok_or_else(|| PersonaError::NotFound(key.to_string()))
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Render a persona template, substituting context placeholders.
    pub fn render(&self, persona: &Persona, vars: &HashMap<&str, String>) -> String {
        let mut rendered = persona.template.clone();
        for (name, value) in vars {
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        rendered
            .replace("{formality}", &persona.formality.to_string())
            .trim()
            .to_string()
    }
}

/// First `{placeholder}` in the template that is not in the known set.
fn first_unknown_placeholder(template: &str) -> Option<String> {
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return None;
        };
        let name = &after[..close];
        // Only treat identifier-shaped contents as placeholders; braces
        // around arbitrary text (or nested JSON) pass through untouched.
        let identifier = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_');
        if identifier && !KNOWN_PLACEHOLDERS.contains(&name) {
            return Some(name.to_string());
        }
        rest = &after[close + 1..];
    }
    None
}
