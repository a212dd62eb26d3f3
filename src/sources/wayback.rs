use super::{
    endpoint, get_json, usable_link, wayback_timeline, CheckStatus, Link, Source, SourceCheck,
    SourceError,
};
use crate::target::Target;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE: &str = "https://archive.org";

const ID: &str = "wayback";
const TITLE: &str = "Wayback Machine";

/// Closest snapshot lookup on the Wayback Machine availability API.
pub struct Wayback {
    base: String,
}

impl Wayback {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: Option<ArchivedSnapshots>,
}

#[derive(Debug, Deserialize)]
struct ArchivedSnapshots {
    #[serde(default)]
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    available: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// `20200101123456` -> `2020-01-01 12:34:56`; anything else is returned untouched.
pub(crate) fn format_timestamp(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S")
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn classify(target: &Target, data: AvailabilityResponse) -> SourceCheck {
    let closest = data
        .archived_snapshots
        .and_then(|s| s.closest)
        .filter(|c| c.available)
        .and_then(|c| c.url.as_deref().and_then(usable_link).map(|url| (c, url)));

    match closest {
        Some((snapshot, url)) => {
            let when = snapshot
                .timestamp
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| "an unknown date".to_string());
            let status = snapshot.status.as_deref().unwrap_or("?");
            SourceCheck::new(
                ID,
                TITLE,
                CheckStatus::Working,
                format!("Closest snapshot captured {} (HTTP {})", when, status),
                vec![Link::new("Open snapshot", url), wayback_timeline(target)],
            )
        }
        None => SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            "No archived snapshot found",
            vec![wayback_timeline(target)],
        ),
    }
}

#[async_trait]
impl Source for Wayback {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError> {
        let url = endpoint(&self.base, "wayback/available", &[("url", target.url.as_str())])?;
        let data: AvailabilityResponse = get_json(client, url).await?;
        Ok(classify(target, data))
    }

    fn fallback_links(&self, target: &Target) -> Vec<Link> {
        vec![wayback_timeline(target)]
    }
}
