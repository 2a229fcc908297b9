//! Layered configuration and path helpers.
//!
//! Uses Figment to merge typed defaults + `config.toml` + `config.<env>.toml` +
//! `APP_*` env vars (`__` separates nested keys, e.g. `APP_SEARCH__MIN_SCORE`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::QueryOptions;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    /// JSON catalog file, or a directory walked for `*.json`.
    pub catalog_path: String,
    /// Root directory for tantivy indexes, one sub-directory per index name.
    pub index_dir: String,
    pub index_prefix: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            catalog_path: "data/catalog".to_string(),
            index_dir: "data/indexes".to_string(),
            index_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    pub min_score: f32,
    pub max_diff: f32,
    /// Raw hits fetched before relevance clustering.
    pub limit: usize,
    /// Weight of the typo-tolerant clause relative to exact term matches.
    pub fuzzy_boost: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let q = QueryOptions::default();
        Self { min_score: q.min_score, max_diff: q.max_diff, limit: 50, fuzzy_boost: 0.1 }
    }
}

impl SearchSettings {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions { min_score: self.min_score, max_diff: self.max_diff }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotSettings {
    pub variability_threshold: f64,
    /// Retry on the base index when a variant index has no match.
    pub variant_fallback: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self { variability_threshold: 0.15, variant_fallback: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub search: SearchSettings,
    pub bot: BotSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if !(0.0..=1.0).contains(&self.search.max_diff) {
            return invalid(format!("search.max_diff must be within [0, 1], got {}", self.search.max_diff));
        }
        if self.search.min_score < 0.0 {
            return invalid(format!("search.min_score must not be negative, got {}", self.search.min_score));
        }
        if self.search.limit == 0 {
            return invalid("search.limit must be positive".to_string());
        }
        if self.bot.variability_threshold < 0.0 {
            return invalid("bot.variability_threshold must not be negative".to_string());
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
