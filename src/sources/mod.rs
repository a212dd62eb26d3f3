//! Discovery services that may hold a free, legal copy of an article.
//!
//! Every source issues at most one request per submission. Anything that goes wrong
//! while checking a source is turned into a degraded [`SourceCheck`] for that source only.

pub mod archive_today;
pub mod crossref;
pub mod doaj;
mod manual;
pub mod openalex;
pub mod semantic_scholar;
pub mod wayback;
pub mod wayback_cdx;

pub use archive_today::ArchiveToday;
pub use crossref::Crossref;
pub use doaj::Doaj;
pub use manual::{manual_checks, MANUAL_SOURCES};
pub use openalex::OpenAlex;
pub use semantic_scholar::SemanticScholar;
pub use wayback::Wayback;
pub use wayback_cdx::WaybackCdx;

use crate::target::Target;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Working,
    NotWorking,
    Unknown,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Working => "WORKING",
            CheckStatus::NotWorking => "NOT WORKED",
            CheckStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: String,
    pub href: String,
}

impl Link {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

/// Outcome of checking one source for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCheck {
    pub id: String,
    pub title: String,
    pub status: CheckStatus,
    pub summary: String,
    pub links: Vec<Link>,
}

impl SourceCheck {
    pub fn new(
        id: &str,
        title: &str,
        status: CheckStatus,
        summary: impl Into<String>,
        links: Vec<Link>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status,
            summary: summary.into(),
            links,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait Source: Send + Sync {
    fn id(&self) -> &'static str;

    fn title(&self) -> &'static str;

    /// One request, parsed and classified.
    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError>;

    /// Manual links shown when the automatic check has nothing better to offer.
    fn fallback_links(&self, target: &Target) -> Vec<Link>;

    fn on_failure(&self, target: &Target, err: &SourceError) -> SourceCheck {
        SourceCheck::new(
            self.id(),
            self.title(),
            CheckStatus::NotWorking,
            failure_summary(self.title(), err),
            self.fallback_links(target),
        )
    }

    async fn check(&self, client: &Client, target: &Target) -> SourceCheck {
        match self.probe(client, target).await {
            Ok(check) => {
                debug!("{}: {:?} ({})", self.id(), check.status, check.summary);
                check
            }
            Err(e) => {
                warn!("{} check degraded: {}", self.id(), e);
                self.on_failure(target, &e)
            }
        }
    }
}

pub fn failure_summary(title: &str, err: &SourceError) -> String {
    match err {
        SourceError::Status(code) => format!("{} answered with HTTP {}", title, code),
        SourceError::Network(e) if e.is_timeout() => format!("{} did not answer in time", title),
        SourceError::Network(_) => format!("Could not reach {}", title),
        SourceError::Decode(_) => format!("{} sent a response that could not be read", title),
        SourceError::Url(e) => format!("{} endpoint is misconfigured ({})", title, e),
    }
}

/// Single GET. Non-2xx answers become [`SourceError::Status`].
pub(crate) async fn get_text(
    client: &Client,
    url: url::Url,
    accept: &str,
) -> Result<String, SourceError> {
    debug!("GET {}", url);

    let response = client.get(url).header("Accept", accept).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }

    Ok(response.text().await?)
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: url::Url,
) -> Result<T, SourceError> {
    let body = get_text(client, url, "application/json").await?;
    Ok(serde_json::from_str(&body)?)
}

/// Joins a base URL, a path and query pairs, e.g. `("https://api.x.org", "works", [("q", "a b")])`.
pub(crate) fn endpoint(
    base: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<url::Url, SourceError> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    if params.is_empty() {
        return Ok(url::Url::parse(&raw)?);
    }
    Ok(url::Url::parse_with_params(&raw, params)?)
}

/// Accepts a link candidate from a remote API only if it is an absolute http(s) URL.
pub(crate) fn usable_link(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parsed = url::Url::parse(raw).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(raw.to_string()),
        _ => None,
    }
}

pub(crate) fn wayback_timeline(target: &Target) -> Link {
    Link::new(
        "Wayback timeline",
        format!("https://web.archive.org/web/*/{}", target.url),
    )
}
