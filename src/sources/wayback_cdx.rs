use super::wayback::format_timestamp;
use super::{endpoint, get_text, wayback_timeline, CheckStatus, Link, Source, SourceCheck, SourceError};
use crate::target::Target;
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_BASE: &str = "https://web.archive.org";

const ID: &str = "wayback-cdx";
const TITLE: &str = "Wayback CDX";

/// Capture index search: up to five captures of the exact URL that answered 200.
pub struct WaybackCdx {
    base: String,
}

impl WaybackCdx {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

// Rows are [timestamp, original, statuscode]; the first row is the header
fn parse_rows(body: &str) -> Result<Vec<Vec<String>>, SourceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<Vec<String>> = serde_json::from_str(body)?;
    Ok(rows.into_iter().skip(1).collect())
}

fn classify(target: &Target, rows: Vec<Vec<String>>) -> SourceCheck {
    let mut links: Vec<Link> = rows
        .iter()
        .filter_map(|row| match row.as_slice() {
            [timestamp, original, ..] if !timestamp.is_empty() && !original.is_empty() => {
                Some(Link::new(
                    format!("Capture {}", format_timestamp(timestamp)),
                    format!("https://web.archive.org/web/{}/{}", timestamp, original),
                ))
            }
            _ => None,
        })
        .collect();

    if links.is_empty() {
        return SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            "No successful captures in the index",
            vec![wayback_timeline(target)],
        );
    }

    let summary = match links.len() {
        1 => "1 successful capture found".to_string(),
        n => format!("{} successful captures found", n),
    };
    links.push(wayback_timeline(target));

    SourceCheck::new(ID, TITLE, CheckStatus::Working, summary, links)
}

#[async_trait]
impl Source for WaybackCdx {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError> {
        let url = endpoint(
            &self.base,
            "cdx/search/cdx",
            &[
                ("url", target.url.as_str()),
                ("output", "json"),
                ("fl", "timestamp,original,statuscode"),
                ("filter", "statuscode:200"),
                ("limit", "5"),
            ],
        )?;
        let body = get_text(client, url, "application/json").await?;
        Ok(classify(target, parse_rows(&body)?))
    }

    fn fallback_links(&self, target: &Target) -> Vec<Link> {
        vec![wayback_timeline(target)]
    }
}
