//! Pipeline configuration types.
//!
//! Explicitly constructed and injected into the pipeline entry point --
//! there are no ambient globals. Deserialized from `parley.toml` with
//! serde defaults for every field, so a missing or partial file still
//! yields a working configuration.

use serde::{Deserialize, Serialize};

/// Process-wide facts about the user, injected into the prompt context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default = "default_display_name")]
    pub display_name: String,
    /// IANA timezone name (e.g. "Europe/Berlin").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// BCP 47 locale tag (e.g. "en-US").
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Measurement system: "metric" or "imperial".
    #[serde(default = "default_units")]
    pub units: String,
    /// Home city used by location-aware tools when the user names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_city: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            timezone: default_timezone(),
            locale: default_locale(),
            units: default_units(),
            home_city: None,
        }
    }
}

/// Configuration for the response pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Persona applied when the request carries no override.
    #[serde(default = "default_persona")]
    pub default_persona: String,
    /// Recent-turn window fetched from the backend per request.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Concurrent tool invocations allowed within one dispatch round.
    #[serde(default = "default_tool_concurrency")]
    pub tool_concurrency: usize,
    /// Per-invocation tool timeout in milliseconds.
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,
    /// Backend write timeout in milliseconds (fire-and-confirm bound).
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
    /// Model identifier for the reasoning backend.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub profile: UserProfile,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_persona: default_persona(),
            history_window: default_history_window(),
            tool_concurrency: default_tool_concurrency(),
            tool_timeout_ms: default_tool_timeout_ms(),
            sync_timeout_ms: default_sync_timeout_ms(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            profile: UserProfile::default(),
        }
    }
}

fn default_persona() -> String {
    "business".to_string()
}

fn default_history_window() -> usize {
    20
}

fn default_tool_concurrency() -> usize {
    4
}

fn default_tool_timeout_ms() -> u64 {
    10_000
}

fn default_sync_timeout_ms() -> u64 {
    5_000
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    2_048
}

fn default_display_name() -> String {
    "User".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config.default_persona, "business");
        assert_eq!(config.history_window, 20);
        assert_eq!(config.tool_concurrency, 4);
        assert_eq!(config.profile.timezone, "UTC");
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config: PipelineConfig = toml::from_str(
            r#"
history_window = 5

[profile]
display_name = "Nik"
timezone = "Europe/Berlin"
"#,
        )
        .unwrap();
        assert_eq!(config.history_window, 5);
        assert_eq!(config.default_persona, "business");
        assert_eq!(config.profile.display_name, "Nik");
        assert_eq!(config.profile.timezone, "Europe/Berlin");
        assert_eq!(config.profile.units, "metric");
    }
}
