//! JSON data index.
//!
//! Written to `<output>/<index.path>/`:
//! - `pages.json`: every published page, newest first
//! - `tags.json`: tag name to the pages carrying it, tags sorted by name

use super::PlannedPage;
use crate::document::MetaValue;
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap};

/// One page entry in `pages.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    /// Page URL path (e.g., "/blog/2020-01-20-zero/")
    pub url: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Publication date as ISO 8601 string (e.g., "2020-01-20")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Header keys without a derived field (`series`, `reviewers`, ...)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, MetaValue>,
}

/// A page reference within `tags.json`.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedPage {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

pub type TagsIndex = BTreeMap<String, Vec<TaggedPage>>;

/// Compare two items by date (newest first), then by title.
///
/// Items with dates come before items without dates.
fn compare_by_date(a_date: &Option<String>, b_date: &Option<String>, a_title: &str, b_title: &str) -> Ordering {
    match (a_date, b_date) {
        (Some(a), Some(b)) => b.cmp(a).then_with(|| a_title.cmp(b_title)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a_title.cmp(b_title),
    }
}

/// Page entries, newest first.
pub fn pages_index(pages: &[PlannedPage]) -> Vec<PageData> {
    let mut data: Vec<_> = pages
        .iter()
        .map(|planned| {
            let page = &planned.page;
            PageData {
                url: planned.destination.url.clone(),
                title: page.title.clone(),
                category: page.category.clone(),
                summary: page.summary.clone(),
                date: page.date.map(|d| d.format("%Y-%m-%d").to_string()),
                author: page.author.clone(),
                tags: page.tags.clone(),
                extra: page.extra.clone(),
            }
        })
        .collect();
    data.sort_by(|a, b| compare_by_date(&a.date, &b.date, &a.title, &b.title));
    data
}

/// Group pages by tag. Pages within a tag keep the newest-first order.
pub fn tags_index(pages: &[PageData]) -> TagsIndex {
    let mut tags = TagsIndex::new();
    for page in pages {
        for tag in &page.tags {
            tags.entry(tag.clone()).or_default().push(TaggedPage {
                url: page.url.clone(),
                title: page.title.clone(),
                date: page.date.clone(),
            });
        }
    }
    tags
}

/// Serialize both index files as `(file name, JSON)` pairs.
pub fn build_index(pages: &[PlannedPage]) -> serde_json::Result<[(&'static str, String); 2]> {
    let pages = pages_index(pages);
    let tags = tags_index(&pages);
    Ok([
        ("pages.json", serde_json::to_string_pretty(&pages)?),
        ("tags.json", serde_json::to_string_pretty(&tags)?),
    ])
}
