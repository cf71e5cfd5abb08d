//! RSS feed generation.
//!
//! One item per dated page, newest first. Undated pages are left out.

use super::PlannedPage;
use crate::{config::SiteConfig, utils::date::to_rfc2822};
use anyhow::{Result, anyhow};
use regex::Regex;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::sync::LazyLock;

/// Build the feed XML for the planned pages.
pub fn build_feed(config: &SiteConfig, pages: &[PlannedPage]) -> Result<String> {
    let base_url = config
        .base
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("[base].url is required for the feed"))?;

    let mut dated: Vec<_> = pages.iter().filter(|p| p.page.date.is_some()).collect();
    dated.sort_by(|a, b| {
        b.page
            .date
            .cmp(&a.page.date)
            .then_with(|| a.page.title.cmp(&b.page.title))
    });

    let items: Vec<_> = dated
        .into_iter()
        .filter_map(|page| page_to_rss_item(page, base_url, config))
        .collect();

    let channel = ChannelBuilder::default()
        .title(&config.base.title)
        .link(base_url)
        .description(&config.base.description)
        .language(config.base.language.clone())
        .generator(concat!("folio ", env!("CARGO_PKG_VERSION")).to_string())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;
    Ok(channel.to_string())
}

/// Absolute URL of a page.
pub fn full_url(base_url: &str, url: &str) -> String {
    format!("{}{url}", base_url.trim_end_matches('/'))
}

/// Convert a planned page to an rss item. Returns None for undated pages.
fn page_to_rss_item(planned: &PlannedPage, base_url: &str, config: &SiteConfig) -> Option<rss::Item> {
    let page = &planned.page;
    let pub_date = to_rfc2822(page.date?);
    let link = full_url(base_url, &planned.destination.url);
    let author = normalize_rss_author(page.author.as_ref(), config);

    Some(
        ItemBuilder::default()
            .title(page.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .description(page.summary.clone())
            .categories(
                page.tags
                    .iter()
                    .map(|tag| rss::CategoryBuilder::default().name(tag.clone()).build())
                    .collect::<Vec<_>>(),
            )
            .pub_date(pub_date)
            .author(author)
            .build(),
    )
}

/// Normalize author field to rss format: "email@example.com (Name)"
///
/// Priority:
/// 1. Page author if already in valid format
/// 2. Site config author if in valid format
/// 3. Combine site config email and author
fn normalize_rss_author(author: Option<&String>, config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    let author = author?;
    if RE_VALID_AUTHOR.is_match(author) {
        return Some(author.clone());
    }

    let site_author = &config.base.author;
    if RE_VALID_AUTHOR.is_match(site_author) {
        return Some(site_author.clone());
    }

    Some(format!("{} ({})", config.base.email, site_author))
}
