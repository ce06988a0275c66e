//! Configuration loading for the Forgetful service.
//!
//! Merges a TOML file (optional) with `FORGETFUL_*` environment overrides.
//! Mirrors the teacher's `memory-cli::config` layering (typed struct, a
//! loader, env-var override points) without the CLI wizard/progressive-setup
//! machinery — this crate only needs the load-and-validate half.

use crate::constants;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for a Forgetful instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory-domain limits and budgets.
    pub memory: MemoryConfig,
    /// Embedding provider selection.
    pub embeddings: EmbeddingsConfig,
    /// Reranker provider selection.
    pub reranker: RerankerConfig,
    /// Storage backend selection.
    pub storage: StorageConfig,
    /// Instance-level OAuth scope ceiling (see §4.I).
    pub scopes: String,
    /// Whether READ/QUERIED activity events are emitted (§4.M).
    pub activity_track_reads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            reranker: RerankerConfig::default(),
            storage: StorageConfig::default(),
            scopes: "*".to_string(),
            activity_track_reads: false,
        }
    }
}

/// Memory-domain limits and budgets (spec §3, §4.G).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub title_max_len: usize,
    pub content_max_len: usize,
    pub context_max_len: usize,
    pub keywords_max_count: usize,
    pub tags_max_count: usize,
    /// Default token budget applied when a request omits
    /// `token_context_threshold`. Open Question #1: when both this and the
    /// request field are present, the request field wins (see DESIGN.md).
    pub token_budget: usize,
    pub max_memories: usize,
    pub num_auto_link: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            title_max_len: constants::MEMORY_TITLE_MAX_LEN,
            content_max_len: constants::MEMORY_CONTENT_MAX_LEN,
            context_max_len: constants::MEMORY_CONTEXT_MAX_LEN,
            keywords_max_count: constants::MEMORY_KEYWORDS_MAX_COUNT,
            tags_max_count: constants::MEMORY_TAGS_MAX_COUNT,
            token_budget: constants::DEFAULT_TOKEN_BUDGET,
            max_memories: constants::DEFAULT_MAX_MEMORIES,
            num_auto_link: constants::DEFAULT_NUM_AUTO_LINK,
        }
    }
}

/// Embedding provider selection (§4.A).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// `"deterministic"` (always available, hash-based) or `"http"`.
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    /// Base URL for the `http` provider.
    pub endpoint: Option<String>,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: "deterministic".to_string(),
            model: "forgetful-hash-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Reranker provider selection (§4.B).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    /// `"none"` or `"http"`.
    pub provider: String,
    pub endpoint: Option<String>,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            endpoint: None,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `"redb"` (embedded) or `"turso"` (server-class).
    pub backend: String,
    /// Path to the redb file (embedded backend).
    pub redb_path: Option<String>,
    /// `libsql://...` URL (server backend).
    pub turso_url: Option<String>,
    pub turso_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "redb".to_string(),
            redb_path: Some("./forgetful.redb".to_string()),
            turso_url: None,
            turso_token: None,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply
    /// `FORGETFUL_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the file exists but fails to parse,
    /// or if the merged configuration fails [`Config::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(p)?;
                toml::from_str(&text)
                    .map_err(|e| Error::validation("config file", e))?
            }
            _ => Config::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Overlay `FORGETFUL_*` environment variables onto an already-loaded
    /// config. Unset variables leave the existing value untouched.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("FORGETFUL_SCOPES") {
            self.scopes = v;
        }
        if let Ok(v) = std::env::var("FORGETFUL_STORAGE_BACKEND") {
            self.storage.backend = v;
        }
        if let Ok(v) = std::env::var("FORGETFUL_REDB_PATH") {
            self.storage.redb_path = Some(v);
        }
        if let Ok(v) = std::env::var("FORGETFUL_TURSO_URL") {
            self.storage.turso_url = Some(v);
        }
        if let Ok(v) = std::env::var("FORGETFUL_TURSO_TOKEN") {
            self.storage.turso_token = Some(v);
        }
        if let Ok(v) = std::env::var("FORGETFUL_EMBEDDINGS_PROVIDER") {
            self.embeddings.provider = v;
        }
        if let Ok(v) = std::env::var("FORGETFUL_EMBEDDINGS_DIMENSIONS") {
            if let Ok(parsed) = v.parse() {
                self.embeddings.dimensions = parsed;
            }
        }
        if let Ok(v) = std::env::var("FORGETFUL_MEMORY_TOKEN_BUDGET") {
            if let Ok(parsed) = v.parse() {
                self.memory.token_budget = parsed;
            }
        }
        if let Ok(v) = std::env::var("FORGETFUL_MEMORY_NUM_AUTO_LINK") {
            if let Ok(parsed) = v.parse() {
                self.memory.num_auto_link = parsed;
            }
        }
        if let Ok(v) = std::env::var("FORGETFUL_ACTIVITY_TRACK_READS") {
            self.activity_track_reads = v.eq_ignore_ascii_case("true") || v == "1";
        }
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the embedding dimension is zero, or
    /// if the selected storage backend is missing its required connection
    /// fields — a startup-fatal condition per spec §6.
    pub fn validate(&self) -> Result<()> {
        if self.embeddings.dimensions == 0 {
            return Err(Error::validation(
                "embeddings.dimensions",
                "must be greater than zero",
            ));
        }
        match self.storage.backend.as_str() {
            "redb" => {
                if self.storage.redb_path.is_none() {
                    return Err(Error::validation("storage.redb_path", "required for redb backend"));
                }
            }
            "turso" => {
                if self.storage.turso_url.is_none() {
                    return Err(Error::validation("storage.turso_url", "required for turso backend"));
                }
            }
            other => {
                return Err(Error::validation(
                    "storage.backend",
                    format!("unknown backend '{other}', expected 'redb' or 'turso'"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_dimensions_rejected() {
        let mut config = Config::default();
        config.embeddings.dimensions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn turso_backend_requires_url() {
        let mut config = Config::default();
        config.storage.backend = "turso".to_string();
        config.storage.turso_url = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = Config::default();
        config.storage.backend = "mongo".to_string();
        assert!(config.validate().is_err());
    }
}
