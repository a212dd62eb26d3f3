use super::{endpoint, get_json, usable_link, CheckStatus, Link, Source, SourceCheck, SourceError};
use crate::target::Target;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE: &str = "https://api.openalex.org";

const ID: &str = "openalex";
const TITLE: &str = "OpenAlex";

pub struct OpenAlex {
    base: String,
}

impl OpenAlex {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorksResponse {
    #[serde(default)]
    results: Option<Vec<Work>>,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    open_access: Option<OpenAccess>,
    #[serde(default)]
    locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct OpenAccess {
    #[serde(default)]
    oa_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(default)]
    pdf_url: Option<String>,
    #[serde(default)]
    landing_page_url: Option<String>,
}

fn candidate(value: Option<&String>) -> Option<String> {
    value.and_then(|s| usable_link(s))
}

impl Work {
    /// Explicit OA URL, then the first location's file, then its landing page.
    fn oa_url(&self) -> Option<String> {
        let first = self.locations.first();
        candidate(self.open_access.as_ref().and_then(|oa| oa.oa_url.as_ref()))
            .or_else(|| candidate(first.and_then(|l| l.pdf_url.as_ref())))
            .or_else(|| candidate(first.and_then(|l| l.landing_page_url.as_ref())))
    }

    fn label(&self) -> String {
        self.display_name
            .as_deref()
            .or(self.title.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled work")
            .to_string()
    }
}

fn search_page(target: &Target) -> Link {
    let query = target.doi.as_deref().unwrap_or(target.query());
    Link::new(
        "Search OpenAlex",
        format!(
            "https://openalex.org/works?search={}",
            urlencoding::encode(query)
        ),
    )
}

fn classify(target: &Target, data: WorksResponse) -> SourceCheck {
    let works = data.results.unwrap_or_default();

    if let Some(doi) = target.doi.as_deref() {
        // DOI filter: any result is a confirmed match
        let Some(work) = works.first() else {
            return SourceCheck::new(
                ID,
                TITLE,
                CheckStatus::NotWorking,
                format!("No OpenAlex record for DOI {}", doi),
                vec![search_page(target)],
            );
        };

        let record = work.id.as_deref().and_then(usable_link);
        let (summary, link) = match (work.oa_url(), record) {
            (Some(url), _) => (
                "DOI matched an open access copy".to_string(),
                Link::new(work.label(), url),
            ),
            (None, Some(record)) => (
                "DOI matched, no open access location listed".to_string(),
                Link::new("OpenAlex record", record),
            ),
            (None, None) => ("DOI matched".to_string(), search_page(target)),
        };
        return SourceCheck::new(ID, TITLE, CheckStatus::Working, summary, vec![link]);
    }

    let links: Vec<Link> = works
        .iter()
        .filter_map(|w| w.oa_url().map(|url| Link::new(w.label(), url)))
        .collect();

    if links.is_empty() {
        SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            format!("No open access works matched \"{}\"", target.query()),
            vec![search_page(target)],
        )
    } else {
        SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::Working,
            format!("{} open access candidate(s) found", links.len()),
            links,
        )
    }
}

#[async_trait]
impl Source for OpenAlex {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError> {
        let url = match target.doi.as_deref() {
            Some(doi) => {
                let filter = format!("doi:{}", doi);
                endpoint(
                    &self.base,
                    "works",
                    &[("filter", filter.as_str()), ("per-page", "6")],
                )?
            }
            None => endpoint(
                &self.base,
                "works",
                &[
                    ("search", target.query()),
                    ("filter", "is_oa:true"),
                    ("per-page", "6"),
                ],
            )?,
        };
        let data: WorksResponse = get_json(client, url).await?;
        Ok(classify(target, data))
    }

    fn fallback_links(&self, target: &Target) -> Vec<Link> {
        vec![search_page(target)]
    }
}
