//! Configuration file handling.
//!
//! Settings come from `.oafinder.toml` in the working directory, or from the file
//! passed with `--config`. Every key is optional.

use crate::sources;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = ".oafinder.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,

    /// Base URLs of the automatically checked services.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound for the single request each source gets.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    format!("oafinder/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_wayback")]
    pub wayback: String,
    #[serde(default = "default_wayback_cdx")]
    pub wayback_cdx: String,
    #[serde(default = "default_openalex")]
    pub openalex: String,
    #[serde(default = "default_doaj")]
    pub doaj: String,
    #[serde(default = "default_crossref")]
    pub crossref: String,
    #[serde(default = "default_semantic_scholar")]
    pub semantic_scholar: String,
    #[serde(default = "default_archive_today")]
    pub archive_today: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            wayback: default_wayback(),
            wayback_cdx: default_wayback_cdx(),
            openalex: default_openalex(),
            doaj: default_doaj(),
            crossref: default_crossref(),
            semantic_scholar: default_semantic_scholar(),
            archive_today: default_archive_today(),
        }
    }
}

#[cfg(test)]
impl EndpointsConfig {
    /// Every endpoint pointed at the same base.
    pub fn all(base: &str) -> Self {
        Self {
            wayback: base.to_string(),
            wayback_cdx: base.to_string(),
            openalex: base.to_string(),
            doaj: base.to_string(),
            crossref: base.to_string(),
            semantic_scholar: base.to_string(),
            archive_today: base.to_string(),
        }
    }
}

fn default_wayback() -> String {
    sources::wayback::DEFAULT_BASE.to_string()
}

fn default_wayback_cdx() -> String {
    sources::wayback_cdx::DEFAULT_BASE.to_string()
}

fn default_openalex() -> String {
    sources::openalex::DEFAULT_BASE.to_string()
}

fn default_doaj() -> String {
    sources::doaj::DEFAULT_BASE.to_string()
}

fn default_crossref() -> String {
    sources::crossref::DEFAULT_BASE.to_string()
}

fn default_semantic_scholar() -> String {
    sources::semantic_scholar::DEFAULT_BASE.to_string()
}

fn default_archive_today() -> String {
    sources::archive_today::DEFAULT_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6601
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Returns `Ok(None)` if there is no config file in the working directory.
    pub fn load_default() -> Result<Option<Self>> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    pub fn default_toml() -> String {
        let body = toml::to_string_pretty(&Config::default()).unwrap_or_default();
        format!(
            "# oafinder configuration\n# Remove any key to fall back to its default.\n\n{}",
            body
        )
    }
}
