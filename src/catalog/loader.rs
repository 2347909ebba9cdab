//! Load the template catalog from a TOML file.
//!
//! ```toml
//! [[templates]]
//! id = "giraffe"
//! reference_image = "card_giraffe"
//! cells = [
//!     { x = 0, y = 0, rotation = 90, face = "needs_face_a" },
//!     { x = 0, y = 1 },
//! ]
//! rules = { accept_half_turn = true }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::TemplateRegistry;
use crate::engine::template::Template;

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogFile {
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl CatalogFile {
    pub fn into_registry(self) -> TemplateRegistry {
        for t in &self.templates {
            if !t.is_playable() {
                tracing::warn!(template = %t.id, "template has no cells and will never be active");
            }
            let dups = t.duplicate_positions();
            if !dups.is_empty() {
                tracing::warn!(template = %t.id, duplicates = ?dups, "template lists a cell more than once");
            }
        }
        self.templates.into_iter().collect()
    }
}

pub fn parse_catalog(content: &str) -> Result<TemplateRegistry, String> {
    let file: CatalogFile = toml::from_str(content).map_err(|e| e.to_string())?;
    Ok(file.into_registry())
}

/// Load templates from a TOML file at the given path.
pub fn load_catalog(path: &Path) -> Result<TemplateRegistry, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_catalog(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Try the well-known catalog locations, returning an empty registry if none load.
pub fn load_default_catalog() -> TemplateRegistry {
    let candidates = [
        "patterns.toml",
        "../patterns.toml",
        "/etc/geozoo/patterns.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_catalog(p) {
                Ok(registry) => {
                    tracing::info!(path = %p.display(), count = registry.len(), "loaded template catalog");
                    return registry;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load template catalog");
                }
            }
        }
    }
    tracing::info!("no patterns.toml found, starting with an empty catalog");
    TemplateRegistry::new()
}
