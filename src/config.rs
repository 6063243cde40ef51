//! Engine configuration and persisted user preferences.
//!
//! [`Preferences`] is the JSON document the surrounding application
//! persists; the engine only reads dictionary paths and normalization
//! settings from it. [`EngineConfig`] is the resolved runtime view:
//! where caches live and which folds apply.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::morphology::NormalizationFlags;
use crate::utils::file_path::dictionary_search_path;

/// Persisted user preferences, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Preferences {
    /// Dictionary files to load, in display order.
    #[serde(default)]
    pub dictionary_paths: Vec<PathBuf>,
    /// Insensitivity folds applied to dictionary text and queries.
    #[serde(default)]
    pub normalization: NormalizationFlags,
    /// Cache directory override; the platform cache dir when absent.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Preferences {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let preferences = serde_json::from_str(&contents)
            .map_err(|e| crate::error::JitenError::parse("preferences", e.to_string()))?;
        Ok(preferences)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::JitenError::parse("preferences", e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cache_dir: PathBuf,
    pub normalization: NormalizationFlags,
}

impl EngineConfig {
    pub fn new<P: Into<PathBuf>>(cache_dir: P, normalization: NormalizationFlags) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            normalization,
        }
    }

    /// Resolves preferences into a usable configuration.
    pub fn from_preferences(preferences: &Preferences) -> Self {
        let cache_dir = preferences
            .cache_dir
            .clone()
            .unwrap_or_else(default_cache_dir);
        Self {
            cache_dir,
            normalization: preferences.normalization,
        }
    }

    /// Dictionary files to open: explicit preference paths first, then
    /// every regular file found on the discovery search path.
    pub fn discover_dictionaries(&self, preferences: &Preferences) -> Vec<PathBuf> {
        let mut paths = preferences.dictionary_paths.clone();
        for dir in dictionary_search_path(None) {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            let mut found: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect();
            found.sort();
            for path in found {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        paths
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            normalization: NormalizationFlags::default(),
        }
    }
}

/// `<platform cache dir>/jiten`, falling back to a dot-directory in the
/// working directory on platforms without one.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("jiten")
}
