use super::{endpoint, get_json, usable_link, CheckStatus, Link, Source, SourceCheck, SourceError};
use crate::target::Target;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE: &str = "https://api.semanticscholar.org";

const ID: &str = "semantic-scholar";
const TITLE: &str = "Semantic Scholar";

pub struct SemanticScholar {
    base: String,
}

impl SemanticScholar {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaperSearch {
    #[serde(default)]
    data: Option<Vec<Paper>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paper {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
struct OpenAccessPdf {
    #[serde(default)]
    url: Option<String>,
}

fn search_page(target: &Target) -> Link {
    Link::new(
        "Search Semantic Scholar",
        format!(
            "https://www.semanticscholar.org/search?q={}",
            urlencoding::encode(target.query())
        ),
    )
}

fn classify(target: &Target, data: PaperSearch) -> SourceCheck {
    let links: Vec<Link> = data
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|paper| {
            let url = paper.open_access_pdf?.url.as_deref().and_then(usable_link)?;
            let label = paper.title.unwrap_or_else(|| "Open access PDF".to_string());
            Some(Link::new(label, url))
        })
        .collect();

    if links.is_empty() {
        return SourceCheck::new(
            ID,
            TITLE,
            CheckStatus::NotWorking,
            "No open access PDFs among the top matches",
            vec![search_page(target)],
        );
    }

    SourceCheck::new(
        ID,
        TITLE,
        CheckStatus::Working,
        format!("{} open access PDF(s) found", links.len()),
        links,
    )
}

#[async_trait]
impl Source for SemanticScholar {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    async fn probe(&self, client: &Client, target: &Target) -> Result<SourceCheck, SourceError> {
        let url = endpoint(
            &self.base,
            "graph/v1/paper/search",
            &[
                ("query", target.query()),
                ("limit", "3"),
                ("fields", "title,url,openAccessPdf"),
            ],
        )?;
        let data: PaperSearch = get_json(client, url).await?;
        Ok(classify(target, data))
    }

    fn fallback_links(&self, target: &Target) -> Vec<Link> {
        vec![search_page(target)]
    }
}
