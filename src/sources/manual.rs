// Services that sit behind captchas. They are never probed, only linked.

use super::{CheckStatus, Link, SourceCheck};
use crate::target::Target;

/// (id, title, search URL prefix)
pub const MANUAL_SOURCES: [(&str, &str, &str); 2] = [
    (
        "google-scholar",
        "Google Scholar",
        "https://scholar.google.com/scholar?q=",
    ),
    (
        "base",
        "BASE",
        "https://www.base-search.net/Search/Results?lookfor=",
    ),
];

pub fn manual_checks(target: &Target) -> Vec<SourceCheck> {
    let query = urlencoding::encode(target.query());

    MANUAL_SOURCES
        .iter()
        .map(|(id, title, prefix)| {
            SourceCheck::new(
                id,
                title,
                CheckStatus::Unknown,
                "Cannot be checked automatically, search manually",
                vec![Link::new(format!("Search {}", title), format!("{}{}", prefix, query))],
            )
        })
        .collect()
}
