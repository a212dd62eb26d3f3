use super::{endpoint, failure_summary, get_text, CheckStatus, Link, Source, SourceCheck, SourceError};
use crate::target::Target;
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_BASE: &str = "https://archive.ph";

const ID: &str = "archive-today";
const TITLE: &str = "Archive.today";

/// Reachability probe only. The search page is HTML behind anti-bot checks, so its
/// body is never parsed.
pub struct ArchiveToday {
    base: String,
}

impl ArchiveToday {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

fn links(target: &Target) -> Vec<Link> {
    vec![
        Link::new(
            "Search archive.today",
            format!(
                "https://archive.ph/search/?q={}",
                urlencoding::encode(&target.url)
            ),
        ),
        Link::new("Newest capture", format!("https://archive.ph/newest/{}", target.url)),
    ]
}

#[async_trait]
impl Source for ArchiveToday {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError> {
        let url = endpoint(&self.base, "search/", &[("q", target.url.as_str())])?;
        get_text(client, url, "text/html").await?;

        Ok(SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::Working,
            "Archive.today is reachable, open the search to review captures",
            links(target),
        ))
    }

    fn fallback_links(&self, target: &Target) -> Vec<Link> {
        links(target)
    }

    fn on_failure(&self, target: &Target, err: &SourceError) -> SourceCheck {
        // Dropped connections are routine here and say nothing about the archive itself
        let (status, summary) = match err {
            SourceError::Network(_) => (
                CheckStatus::Unknown,
                "Archive.today refused the automated check, try the links manually".to_string(),
            ),
            other => (CheckStatus::NotWorking, failure_summary(TITLE, other)),
        };
        SourceCheck::new(ID, TITLE, status, summary, links(target))
    }
}
