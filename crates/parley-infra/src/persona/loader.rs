//! Persona directory loader.
//!
//! Personas live as `<key>.toml` files in a single directory, loaded once
//! at process start into the fixed registry. Adding a persona means adding
//! a file -- no pipeline code changes. The filename stem must match the
//! declared key so a rename cannot silently shadow a different persona.

use std::path::Path;

use anyhow::{Context, bail};
use tracing::{info, warn};

use parley_types::persona::Persona;

/// Load all `*.toml` personas from a directory, sorted by key.
///
/// Non-TOML files are ignored; a malformed persona file fails the whole
/// load (startup is the right time to find out).
pub async fn load_personas(dir: &Path) -> anyhow::Result<Vec<Persona>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading persona directory {}", dir.display()))?;

    let mut personas = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let persona: Persona = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem != persona.key {
            bail!(
                "persona file {} declares key '{}' (must match the filename)",
                path.display(),
                persona.key
            );
        }

        personas.push(persona);
    }

    if personas.is_empty() {
        warn!(dir = %dir.display(), "No personas found");
    }

    // Directory iteration order is platform-dependent; sort for a stable
    // registry order.
    personas.sort_by(|a, b| a.key.cmp(&b.key));
    info!(count = personas.len(), "Personas loaded");
    Ok(personas)
}
