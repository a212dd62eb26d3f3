use super::{
    endpoint, failure_summary, get_json, usable_link, CheckStatus, Link, Source, SourceCheck,
    SourceError,
};
use crate::target::Target;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE: &str = "https://api.crossref.org";

const ID: &str = "crossref";
const TITLE: &str = "Crossref";

/// DOI registration lookup, or a bibliographic search when the URL carries no DOI.
pub struct Crossref {
    base: String,
}

impl Crossref {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkResponse {
    #[serde(default)]
    message: Option<CrossrefItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    message: Option<SearchMessage>,
}

#[derive(Debug, Deserialize)]
struct SearchMessage {
    #[serde(default)]
    items: Vec<CrossrefItem>,
}

#[derive(Debug, Deserialize)]
struct CrossrefItem {
    #[serde(rename = "DOI", default)]
    doi: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    link: Vec<CrossrefLink>,
}

#[derive(Debug, Deserialize)]
struct CrossrefLink {
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "content-type", default)]
    content_type: Option<String>,
}

fn doi_link(doi: &str) -> String {
    format!("https://doi.org/{}", doi)
}

fn search_page(target: &Target) -> Link {
    Link::new(
        "Search Crossref",
        format!(
            "https://search.crossref.org/?q={}",
            urlencoding::encode(target.query())
        ),
    )
}

fn classify_doi(doi: &str, data: WorkResponse) -> SourceCheck {
    let Some(item) = data.message else {
        return SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            format!("Crossref returned no record for {}", doi),
            vec![Link::new("Resolve DOI", doi_link(doi))],
        );
    };

    let mut links = vec![Link::new("Resolve DOI", doi_link(doi))];
    links.extend(item.link.into_iter().filter_map(|l| {
        let url = usable_link(&l.url)?;
        let label = match l.content_type.as_deref() {
            Some("application/pdf") => "Full text (PDF)",
            _ => "Full text",
        };
        Some(Link::new(label, url))
    }));

    let summary = match item.title.first() {
        Some(title) => format!("DOI registered: {}", title),
        None => "DOI registered with Crossref".to_string(),
    };
    SourceCheck::new(ID, TITLE, CheckStatus::Working, summary, links)
}

fn classify_search(target: &Target, data: SearchResponse) -> SourceCheck {
    let links: Vec<Link> = data
        .message
        .map(|m| m.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let doi = item.doi.filter(|d| !d.is_empty())?;
            let label = item.title.into_iter().next().unwrap_or_else(|| doi.clone());
            Some(Link::new(label, doi_link(&doi)))
        })
        .collect();

    if links.is_empty() {
        return SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            format!("No Crossref records matched \"{}\"", target.query()),
            vec![search_page(target)],
        );
    }

    SourceCheck::new(
        ID,
        TITLE,
        CheckStatus::Working,
        format!("{} related record(s) in Crossref", links.len()),
        links,
    )
}

#[async_trait]
impl Source for Crossref {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError> {
        match target.doi.as_deref() {
            Some(doi) => {
                let path = format!("works/{}", urlencoding::encode(doi));
                let url = endpoint(&self.base, &path, &[])?;
                let data: WorkResponse = get_json(client, url).await?;
                Ok(classify_doi(doi, data))
            }
            None => {
                let url = endpoint(
                    &self.base,
                    "works",
                    &[("query.bibliographic", target.query()), ("rows", "3")],
                )?;
                let data: SearchResponse = get_json(client, url).await?;
                Ok(classify_search(target, data))
            }
        }
    }

    fn fallback_links(&self, target: &Target) -> Vec<Link> {
        match target.doi.as_deref() {
            Some(doi) => vec![Link::new("Resolve DOI", doi_link(doi)), search_page(target)],
            None => vec![search_page(target)],
        }
    }

    fn on_failure(&self, target: &Target, err: &SourceError) -> SourceCheck {
        let summary = match (target.doi.as_deref(), err) {
            (Some(_), SourceError::Status(404)) => "DOI not registered with Crossref".to_string(),
            _ => failure_summary(TITLE, err),
        };
        SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            summary,
            self.fallback_links(target),
        )
    }
}
