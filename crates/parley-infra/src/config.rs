//! Pipeline configuration loader.
//!
//! Reads `parley.toml` from the given directory and deserializes it into
//! [`PipelineConfig`]. Falls back to defaults when the file is missing or
//! malformed -- a broken config file must not keep the process from
//! starting with sane behavior.

use std::path::Path;

use parley_types::config::PipelineConfig;

/// Load pipeline configuration from `{config_dir}/parley.toml`.
///
/// - Missing file: returns [`PipelineConfig::default()`].
/// - Unreadable or unparseable file: logs a warning, returns the default.
/// - Valid file: returns the parsed config (unset fields take defaults).
pub async fn load_pipeline_config(config_dir: &Path) -> PipelineConfig {
    let config_path = config_dir.join("parley.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No parley.toml found at {}, using defaults",
                config_path.display()
            );
            return PipelineConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return PipelineConfig::default();
        }
    };

    match toml::from_str::<PipelineConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            PipelineConfig::default()
        }
    }
}
