//! Fan-out over every configured source, fan-in into one ordered result list.

use crate::config::Config;
use crate::sources::{
    manual_checks, ArchiveToday, CheckStatus, Crossref, Doaj, OpenAlex, SemanticScholar, Source,
    SourceCheck, Wayback, WaybackCdx,
};
use crate::target::Target;
use anyhow::{Context, Result};
use futures::future::{join_all, FutureExt};
use reqwest::Client;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub working: usize,
    pub not_working: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn from_results(results: &[SourceCheck]) -> Self {
        results.iter().fold(Self::default(), |mut counts, r| {
            match r.status {
                CheckStatus::Working => counts.working += 1,
                CheckStatus::NotWorking => counts.not_working += 1,
                CheckStatus::Unknown => counts.unknown += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub target: Target,
    pub results: Vec<SourceCheck>,
    pub counts: StatusCounts,
}

pub struct Aggregator {
    client: Client,
    sources: Vec<Box<dyn Source>>,
}

impl Aggregator {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.http.user_agent.as_str())
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        let endpoints = &config.endpoints;
        let sources: Vec<Box<dyn Source>> = vec![
            Box::new(Wayback::new(&endpoints.wayback)),
            Box::new(WaybackCdx::new(&endpoints.wayback_cdx)),
            Box::new(OpenAlex::new(&endpoints.openalex)),
            Box::new(Doaj::new(&endpoints.doaj)),
            Box::new(Crossref::new(&endpoints.crossref)),
            Box::new(SemanticScholar::new(&endpoints.semantic_scholar)),
            Box::new(ArchiveToday::new(&endpoints.archive_today)),
        ];

        Ok(Self::with_sources(client, sources))
    }

    pub fn with_sources(client: Client, sources: Vec<Box<dyn Source>>) -> Self {
        Self { client, sources }
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn Source> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Checks every source concurrently and waits for all of them. The result list keeps
    /// source order regardless of which answer arrives first, and always holds one entry
    /// per automatic source followed by the manual entries.
    pub async fn run(&self, target: &Target) -> Outcome {
        info!("Checking {} sources for {}", self.sources.len(), target.url);

        let pending = self.sources.iter().map(|source| {
            AssertUnwindSafe(source.check(&self.client, target)).catch_unwind()
        });
        let settled = join_all(pending).await;

        let mut results: Vec<SourceCheck> = self
            .sources
            .iter()
            .zip(settled)
            .map(|(source, outcome)| match outcome {
                Ok(check) => check,
                Err(_) => {
                    error!("{} check panicked", source.id());
                    SourceCheck::new(
                        source.id(),
                        source.title(),
                        CheckStatus::NotWorking,
                        "Check failed unexpectedly",
                        Vec::new(),
                    )
                }
            })
            .collect();
        results.extend(manual_checks(target));

        let counts = StatusCounts::from_results(&results);
        info!(
            "Done: {} working, {} not working, {} unknown",
            counts.working, counts.not_working, counts.unknown
        );

        Outcome {
            target: target.clone(),
            results,
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointsConfig;
    use crate::sources::fixtures::{self, CannedServer};
    use crate::sources::{Link, SourceError};
    use async_trait::async_trait;

    enum Behavior {
        Work { delay_ms: u64 },
        Fail,
        Panic,
    }

    struct FakeSource {
        id: &'static str,
        behavior: Behavior,
    }

    #[async_trait]
    impl Source for FakeSource {
        fn id(&self) -> &'static str {
            self.id
        }

        fn title(&self) -> &'static str {
            "Fake"
        }

        async fn probe(&self, _client: &Client, _target: &Target) -> Result<SourceCheck, SourceError> {
            match self.behavior {
                Behavior::Work { delay_ms } => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Ok(SourceCheck::new(
                        self.id,
                        "Fake",
                        CheckStatus::Working,
                        "found",
                        vec![Link::new("copy", "https://copy.example/")],
                    ))
                }
                Behavior::Fail => Err(SourceError::Status(500)),
                Behavior::Panic => panic!("boom"),
            }
        }

        fn fallback_links(&self, _target: &Target) -> Vec<Link> {
            vec![Link::new("manual", "https://manual.example/")]
        }
    }

    fn fake(id: &'static str, behavior: Behavior) -> Box<dyn Source> {
        Box::new(FakeSource { id, behavior })
    }

    fn target() -> Target {
        Target::from_input("example.org/papers/deep-learning-review.html").unwrap()
    }

    #[tokio::test]
    async fn test_order_follows_sources_not_arrival() {
        let aggregator = Aggregator::with_sources(
            Client::new(),
            vec![
                fake("slow", Behavior::Work { delay_ms: 60 }),
                fake("fast", Behavior::Work { delay_ms: 0 }),
                fake("medium", Behavior::Work { delay_ms: 20 }),
            ],
        );
        let outcome = aggregator.run(&target()).await;

        let ids: Vec<&str> = outcome.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["slow", "fast", "medium", "google-scholar", "base"]);
        assert_eq!(outcome.counts, StatusCounts { working: 3, not_working: 0, unknown: 2 });
    }

    #[tokio::test]
    async fn test_failures_stay_isolated() {
        let aggregator = Aggregator::with_sources(
            Client::new(),
            vec![
                fake("ok", Behavior::Work { delay_ms: 0 }),
                fake("broken", Behavior::Fail),
                fake("crashy", Behavior::Panic),
                fake("ok-too", Behavior::Work { delay_ms: 5 }),
            ],
        );
        let outcome = aggregator.run(&target()).await;

        assert_eq!(outcome.results.len(), 6);
        assert_eq!(outcome.results[0].status, CheckStatus::Working);

        let broken = &outcome.results[1];
        assert_eq!(broken.status, CheckStatus::NotWorking);
        assert_eq!(broken.summary, "Fake answered with HTTP 500");
        assert_eq!(broken.links[0].label, "manual");

        let crashy = &outcome.results[2];
        assert_eq!(crashy.id, "crashy");
        assert_eq!(crashy.status, CheckStatus::NotWorking);
        assert_eq!(crashy.summary, "Check failed unexpectedly");

        assert_eq!(outcome.results[3].status, CheckStatus::Working);
        assert_eq!(outcome.counts, StatusCounts { working: 2, not_working: 2, unknown: 2 });
    }

    #[tokio::test]
    async fn test_default_sources_all_unreachable() {
        let config = Config {
            endpoints: EndpointsConfig::all("http://127.0.0.1:1"),
            ..Config::default()
        };
        let mut aggregator = Aggregator::from_config(&config).unwrap();
        aggregator.client = Client::builder().no_proxy().build().unwrap();

        let outcome = aggregator.run(&target()).await;

        let ids: Vec<&str> = outcome.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "wayback",
                "wayback-cdx",
                "openalex",
                "doaj",
                "crossref",
                "semantic-scholar",
                "archive-today",
                "google-scholar",
                "base"
            ]
        );
        for result in &outcome.results[..6] {
            assert_eq!(result.status, CheckStatus::NotWorking, "{}", result.id);
            assert!(!result.links.is_empty(), "{} has no fallback link", result.id);
        }
        assert_eq!(outcome.results[6].status, CheckStatus::Unknown);
        assert_eq!(outcome.counts, StatusCounts { working: 0, not_working: 6, unknown: 3 });
    }

    #[tokio::test]
    async fn test_doi_target_still_yields_nine() {
        let config = Config {
            endpoints: EndpointsConfig::all("http://127.0.0.1:1"),
            ..Config::default()
        };
        let mut aggregator = Aggregator::from_config(&config).unwrap();
        aggregator.client = Client::builder().no_proxy().build().unwrap();

        let target = Target::from_input("https://doi.org/10.1038/s41586-020-1234-5").unwrap();
        let outcome = aggregator.run(&target).await;

        assert_eq!(outcome.results.len(), 9);
        let crossref = outcome.results.iter().find(|r| r.id == "crossref").unwrap();
        assert_eq!(crossref.links[0].href, "https://doi.org/10.1038/s41586-020-1234-5");
    }

    fn aggregator_for(server: &CannedServer) -> Aggregator {
        let config = Config {
            endpoints: EndpointsConfig::all(&server.base),
            ..Config::default()
        };
        let mut aggregator = Aggregator::from_config(&config).unwrap();
        aggregator.client = Client::builder().no_proxy().build().unwrap();
        aggregator
    }

    fn canned_hits(path: &str) -> (u16, String) {
        let body = if path.starts_with("/wayback/available?") {
            r#"{"archived_snapshots":{"closest":{"available":true,"status":"200","timestamp":"20210305101112","url":"http://web.archive.org/web/20210305101112/https://example.org/papers/deep-learning-review.html"}}}"#
        } else if path.starts_with("/cdx/search/cdx?") {
            r#"[["timestamp","original","statuscode"],["20190102030405","https://example.org/papers/deep-learning-review.html","200"]]"#
        } else if path.starts_with("/works?search=") {
            r#"{"results":[{"display_name":"Review","open_access":{"oa_url":"https://oa.example/review.pdf"}}]}"#
        } else if path.starts_with("/api/search/articles/") {
            r#"{"total":1,"results":[]}"#
        } else if path.starts_with("/works?query.bibliographic=") {
            r#"{"message":{"items":[{"DOI":"10.1000/one","title":["First"]}]}}"#
        } else if path.starts_with("/graph/v1/paper/search?") {
            r#"{"data":[{"title":"Review","openAccessPdf":{"url":"https://pdfs.example/review.pdf"}}]}"#
        } else if path.starts_with("/search/?") {
            "<html></html>"
        } else {
            return (404, "{}".to_string());
        };
        (200, body.to_string())
    }

    #[tokio::test]
    async fn test_live_answers_make_every_source_work() {
        let server = fixtures::serve(canned_hits).await;
        let outcome = aggregator_for(&server).run(&target()).await;

        for result in &outcome.results[..7] {
            assert_eq!(result.status, CheckStatus::Working, "{}: {}", result.id, result.summary);
        }
        assert_eq!(outcome.counts, StatusCounts { working: 7, not_working: 0, unknown: 2 });
        assert_eq!(
            outcome.results[2].links,
            vec![Link::new("Review", "https://oa.example/review.pdf")]
        );

        let mut expected = vec![
            "/wayback/available?url=https%3A%2F%2Fexample.org%2Fpapers%2Fdeep-learning-review.html",
            "/cdx/search/cdx?url=https%3A%2F%2Fexample.org%2Fpapers%2Fdeep-learning-review.html&output=json&fl=timestamp%2Coriginal%2Cstatuscode&filter=statuscode%3A200&limit=5",
            "/works?search=deep+learning+review&filter=is_oa%3Atrue&per-page=6",
            "/api/search/articles/deep%20learning%20review?page=1&pageSize=3",
            "/works?query.bibliographic=deep+learning+review&rows=3",
            "/graph/v1/paper/search?query=deep+learning+review&limit=3&fields=title%2Curl%2CopenAccessPdf",
            "/search/?q=https%3A%2F%2Fexample.org%2Fpapers%2Fdeep-learning-review.html",
        ];
        expected.sort();
        assert_eq!(server.requests(), expected);
    }

    #[tokio::test]
    async fn test_server_errors_are_not_working() {
        let server = fixtures::serve(|_| (500, "{}".to_string())).await;
        let target = Target::from_input("https://doi.org/10.1038/s41586-020-1234-5").unwrap();
        let outcome = aggregator_for(&server).run(&target).await;

        assert_eq!(outcome.results.len(), 9);
        for result in &outcome.results[..7] {
            assert_eq!(result.status, CheckStatus::NotWorking, "{}", result.id);
            assert_eq!(result.summary, format!("{} answered with HTTP 500", result.title));
        }
        assert_eq!(outcome.counts, StatusCounts { working: 0, not_working: 7, unknown: 2 });
        assert_eq!(server.requests().len(), 7);
    }

    #[tokio::test]
    async fn test_unregistered_doi_from_live_404() {
        let server = fixtures::serve(|_| (404, r#"{"status":"error"}"#.to_string())).await;
        let target = Target::from_input("https://doi.org/10.1038/s41586-020-1234-5").unwrap();
        let outcome = aggregator_for(&server).run(&target).await;

        let crossref = outcome.results.iter().find(|r| r.id == "crossref").unwrap();
        assert_eq!(crossref.status, CheckStatus::NotWorking);
        assert_eq!(crossref.summary, "DOI not registered with Crossref");
        assert_eq!(crossref.links[0].href, "https://doi.org/10.1038/s41586-020-1234-5");

        let requests = server.requests();
        for path in [
            "/works/10.1038%2Fs41586-020-1234-5",
            "/works?filter=doi%3A10.1038%2Fs41586-020-1234-5&per-page=6",
            "/api/search/articles/doi%3A10.1038%2Fs41586-020-1234-5?page=1&pageSize=3",
        ] {
            assert!(requests.iter().any(|r| r == path), "missing {} in {:?}", path, requests);
        }
    }

    #[test]
    fn test_counts() {
        let results = vec![
            SourceCheck::new("a", "A", CheckStatus::Working, "", vec![]),
            SourceCheck::new("b", "B", CheckStatus::Unknown, "", vec![]),
            SourceCheck::new("c", "C", CheckStatus::Working, "", vec![]),
        ];
        assert_eq!(
            StatusCounts::from_results(&results),
            StatusCounts { working: 2, not_working: 0, unknown: 1 }
        );
    }
}
