use super::{endpoint, get_json, usable_link, CheckStatus, Link, Source, SourceCheck, SourceError};
use crate::target::Target;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE: &str = "https://doaj.org";

const ID: &str = "doaj";
const TITLE: &str = "DOAJ";

/// Directory of Open Access Journals article search.
pub struct Doaj {
    base: String,
}

impl Doaj {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DoajResponse {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    results: Option<Vec<DoajResult>>,
}

#[derive(Debug, Deserialize)]
struct DoajResult {
    #[serde(default)]
    bibjson: Option<DoajBibJson>,
}

#[derive(Debug, Deserialize)]
struct DoajBibJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<Vec<DoajLink>>,
}

#[derive(Debug, Deserialize)]
struct DoajLink {
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "type", default)]
    link_type: Option<String>,
}

fn search_query(target: &Target) -> String {
    match target.doi.as_deref() {
        Some(doi) => format!("doi:{}", doi),
        None => target.query().to_string(),
    }
}

fn search_page(target: &Target) -> Link {
    let source = json!({ "query": { "query_string": { "query": search_query(target) } } });
    Link::new(
        "Search DOAJ",
        format!(
            "https://doaj.org/search/articles?source={}",
            urlencoding::encode(&source.to_string())
        ),
    )
}

fn classify(target: &Target, data: DoajResponse) -> SourceCheck {
    let total = data.total.unwrap_or(0);
    if total == 0 {
        return SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            "No matching articles in DOAJ",
            vec![search_page(target)],
        );
    }

    let mut links: Vec<Link> = data
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| r.bibjson)
        .filter_map(|bib| {
            let title = bib.title.unwrap_or_else(|| "Full text".to_string());
            bib.link?
                .into_iter()
                .find(|l| l.link_type.as_deref() == Some("fulltext"))
                .and_then(|l| l.url.as_deref().and_then(usable_link))
                .map(|url| Link::new(title, url))
        })
        .collect();
    links.push(search_page(target));

    SourceCheck::new(
        ID,
        TITLE,
        CheckStatus::Working,
        format!("{} matching open access article(s) in DOAJ", total),
        links,
    )
}

#[async_trait]
impl Source for Doaj {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError> {
        let path = format!(
            "api/search/articles/{}",
            urlencoding::encode(&search_query(target))
        );
        let url = endpoint(&self.base, &path, &[("page", "1"), ("pageSize", "3")])?;
        let data: DoajResponse = get_json(client, url).await?;
        Ok(classify(target, data))
    }

    fn fallback_links(&self, target: &Target) -> Vec<Link> {
        vec![search_page(target)]
    }
}
