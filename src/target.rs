// Turns whatever the user typed into the reference every source is checked against.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*://").expect("scheme regex"));

static DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)10\.\d{4,9}/[-._;()/:A-Z0-9]+").expect("doi regex"));

static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]{1,5}$").expect("extension regex"));

// Digit runs and separators collapse into a single space
static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d\-_.+~,;:\s]+").expect("noise regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("Please enter a URL")]
    Empty,

    #[error("Only http and https URLs are supported (got {0}://)")]
    UnsupportedScheme(String),

    #[error("Not a valid URL: {0}")]
    Malformed(String),
}

/// What gets checked for one submission. Built once, never changed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub doi: Option<String>,
    pub title_hint: String,
    pub host: String,
}

impl Target {
    pub fn from_input(raw: &str) -> Result<Self, TargetError> {
        let url = normalize_url(raw)?;
        let host = Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        Ok(Self {
            doi: extract_doi(&url),
            title_hint: derive_title_hint(&url),
            host,
            url,
        })
    }

    /// Free-text query for search style sources: the title hint, or the URL when there is none.
    pub fn query(&self) -> &str {
        if self.title_hint.is_empty() {
            &self.url
        } else {
            &self.title_hint
        }
    }
}

pub fn normalize_url(raw: &str) -> Result<String, TargetError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TargetError::Empty);
    }

    let candidate = if SCHEME.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| TargetError::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(TargetError::UnsupportedScheme(other.to_string())),
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(TargetError::Malformed("missing host".to_string()));
    }

    Ok(parsed.to_string())
}

pub fn extract_doi(text: &str) -> Option<String> {
    let decoded = urlencoding::decode(text)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| text.to_string());

    DOI.find(&decoded).map(|m| m.as_str().to_string())
}

pub fn derive_title_hint(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return String::new(),
    };
    let host = parsed.host_str().unwrap_or_default().to_string();

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| host.clone());

    let decoded = match urlencoding::decode(&segment) {
        Ok(d) => d.into_owned(),
        Err(_) => segment.clone(),
    };

    let stem = EXTENSION.replace(&decoded, "");
    let hint = NOISE.replace_all(&stem, " ").trim().to_string();

    if hint.is_empty() {
        host
    } else {
        hint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prepends_https() {
        assert_eq!(
            normalize_url("nature.com/articles/s41586-020-1234-5").unwrap(),
            "https://nature.com/articles/s41586-020-1234-5"
        );
        assert_eq!(normalize_url("  example.org  ").unwrap(), "https://example.org/");
    }

    #[test]
    fn test_normalize_keeps_http() {
        assert_eq!(
            normalize_url("http://example.org/a?b=1").unwrap(),
            "http://example.org/a?b=1"
        );
        assert_eq!(normalize_url("HTTPS://Example.org/x").unwrap(), "https://example.org/x");
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert_eq!(normalize_url("   "), Err(TargetError::Empty));
        assert_eq!(
            normalize_url("ftp://files.example.org/paper.pdf"),
            Err(TargetError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(normalize_url("http://"), Err(TargetError::Malformed(_))));
        assert!(matches!(normalize_url("exa mple.org"), Err(TargetError::Malformed(_))));
    }

    #[test]
    fn test_extract_doi() {
        assert_eq!(
            extract_doi("https://doi.org/10.1038/s41586-020-1234-5"),
            Some("10.1038/s41586-020-1234-5".to_string())
        );
        assert_eq!(
            extract_doi("https://example.org/abs/10.1103%2FPhysRevLett.116.061102?ref=x"),
            Some("10.1103/PhysRevLett.116.061102".to_string())
        );
        assert_eq!(extract_doi("https://nature.com/articles/s41586-020-1234-5"), None);
        assert_eq!(extract_doi(""), None);
    }

    #[test]
    fn test_extract_doi_survives_bad_encoding() {
        assert_eq!(
            extract_doi("https://x.org/%E0%A4%A/10.5555/abc"),
            Some("10.5555/abc".to_string())
        );
    }

    #[test]
    fn test_title_hint() {
        assert_eq!(
            derive_title_hint("https://nature.com/articles/s41586-020-1234-5"),
            "s"
        );
        assert_eq!(
            derive_title_hint("https://blog.example.org/2020/05/deep-learning_review.html"),
            "deep learning review"
        );
        assert_eq!(
            derive_title_hint("https://example.org/papers/Open%20Access%20Rocks/"),
            "Open Access Rocks"
        );
    }

    #[test]
    fn test_title_hint_fallbacks() {
        assert_eq!(derive_title_hint("https://example.org/"), "example");
        assert_eq!(derive_title_hint("https://example.org/2021/"), "example.org");
        assert_eq!(derive_title_hint("not a url"), "");
    }

    #[test]
    fn test_target_from_input() {
        let target = Target::from_input("https://doi.org/10.1038/s41586-020-1234-5").unwrap();
        assert_eq!(target.doi.as_deref(), Some("10.1038/s41586-020-1234-5"));
        assert_eq!(target.host, "doi.org");
        assert_eq!(target.query(), "s");

        assert_eq!(Target::from_input(""), Err(TargetError::Empty));
    }
}
