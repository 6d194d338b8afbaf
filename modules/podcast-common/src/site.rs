use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// One feed within a site (spec §3 "Feed").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub feed_id: String,
    pub url: String,
}

/// A tenant: one podcast or group of feeds (spec §3 "Site").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub site_id: String,
    pub title: String,
    pub feeds: Vec<FeedConfig>,
    pub domain: Option<String>,
    /// Path to the site's spelling-corrections JSON, relative to the
    /// site registry file. Missing file is non-fatal (spec §4.4.1).
    pub corrections_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SiteRegistryFile {
    #[serde(default)]
    site: Vec<Site>,
}

/// The set of all configured sites, keyed by `site_id`. Read-only at
/// runtime (spec §3).
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: HashMap<String, Site>,
}

impl SiteRegistry {
    /// Load every `[[site]]` entry from a `sites.toml` file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::config(format!("failed to read site registry {}: {e}", path.display()))
        })?;
        let file: SiteRegistryFile = toml::from_str(&raw).map_err(|e| {
            CoreError::config(format!("failed to parse site registry {}: {e}", path.display()))
        })?;

        let mut sites = HashMap::with_capacity(file.site.len());
        for site in file.site {
            sites.insert(site.site_id.clone(), site);
        }
        tracing::info!(count = sites.len(), "site registry loaded");
        Ok(Self { sites })
    }

    pub fn get(&self, site_id: &str) -> Result<&Site> {
        self.sites
            .get(site_id)
            .ok_or_else(|| CoreError::not_found(format!("unknown site_id {site_id:?}")))
    }

    pub fn all(&self) -> impl Iterator<Item = &Site> {
        self.sites.values()
    }

    pub fn site_ids(&self) -> Vec<String> {
        self.sites.keys().cloned().collect()
    }
}

/// Per-site spelling-correction table (spec §4.4.1 / §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionsFile {
    #[serde(rename = "correctionsToApply", default)]
    pub corrections_to_apply: Vec<Correction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub misspellings: Vec<String>,
    #[serde(rename = "correctedSpelling")]
    pub corrected_spelling: String,
}

impl CorrectionsFile {
    /// Load a corrections file, treating a missing file as an empty table
    /// rather than an error (spec §4.4.1 "missing site file is non-fatal").
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| CoreError::InputInvariantViolation(format!(
                    "malformed corrections file {}: {e}",
                    path.display()
                ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CoreError::TransientIO(e.to_string())),
        }
    }

    /// Merge an operator-scoped table on top of this (site) table. Both
    /// tables load at startup (spec §4.4.1); entries are concatenated,
    /// site entries taking precedence in match order.
    pub fn merged_with(mut self, operator_wide: &CorrectionsFile) -> Self {
        self.corrections_to_apply
            .extend(operator_wide.corrections_to_apply.iter().cloned());
        self
    }
}
