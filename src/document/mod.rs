//! Source documents.
//!
//! A [`Document`] is one article: the metadata header, the body text and
//! the fields derived from both. Documents are created by the loader and
//! never modified afterwards.
//!
//! # Identifier
//!
//! The identifier is the source path relative to the content directory,
//! `/`-separated, extension included (`posts/2020-01-20-zero.md`). It is
//! unique because it is a filesystem path.
//!
//! # Derived fields
//!
//! | Field        | Header key                     | Fallback                          |
//! |--------------|--------------------------------|-----------------------------------|
//! | `title`      | `title`                        | slug                              |
//! | `category`   | `category`, first `categories` | none                              |
//! | `tags`       | `tags`                         | empty                             |
//! | `date`       | `date`                         | `YYYY-MM-DD-` file name prefix    |
//! | `slug`       | `slug`                         | file stem without date prefix     |
//! | `layout`     | `layout`                       | none (layout engine default)      |
//! | `asset_path` | `asset_path`                   | none                              |
//! | `draft`      | `draft` (`true`/`yes`)         | false                             |

pub mod header;
pub mod loader;

pub use header::{MetaValue, Metadata};
pub use loader::{collect_sources, load_all};

use crate::{
    error::{DocumentError, HeaderError},
    utils::date::{parse_date, split_date_prefix},
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Header keys that feed a derived field.
const KNOWN_KEYS: &[&str] = &[
    "title", "category", "categories", "tags", "date", "slug", "layout", "asset_path", "summary",
    "author", "draft",
];

/// One loaded article.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub metadata: Metadata,
    /// Raw header text, delimiters and line endings included
    header: String,
    pub body: String,

    pub title: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub date: Option<NaiveDate>,
    pub slug: String,
    pub layout: Option<String>,
    pub asset_path: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub draft: bool,
}

impl Document {
    /// Parse a document from its identifier and full source text.
    pub fn parse(id: impl Into<String>, source: &str) -> Result<Self, DocumentError> {
        let id = id.into();
        let split = header::split(source).map_err(|reason| DocumentError::MalformedHeader {
            id: id.clone(),
            reason,
        })?;
        let (header, body) = source.split_at(split.body_start);
        let metadata = split.metadata;

        let stem = file_stem(&id);
        let (name_date, name_slug) = split_date_prefix(stem);

        let date = match metadata.get_str("date") {
            Some(raw) => Some(parse_date(raw).ok_or_else(|| DocumentError::MalformedHeader {
                id: id.clone(),
                reason: HeaderError::InvalidDate(raw.to_owned()),
            })?),
            None => name_date,
        };

        let slug = metadata.get_str("slug").unwrap_or(name_slug).to_owned();
        let title = metadata.get_str("title").unwrap_or(&slug).to_owned();
        let category = metadata
            .get_str("category")
            .or_else(|| metadata.get_list("categories").first().copied())
            .map(str::to_owned);
        let tags = metadata.get_list("tags").into_iter().map(str::to_owned).collect();
        let draft = metadata
            .get_str("draft")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes"));
        let owned = |key: &str| metadata.get_str(key).map(str::to_owned);

        Ok(Self {
            layout: owned("layout"),
            asset_path: owned("asset_path"),
            summary: owned("summary"),
            author: owned("author"),
            id,
            header: header.to_owned(),
            body: body.to_owned(),
            title,
            category,
            tags,
            date,
            slug,
            draft,
            metadata,
        })
    }

    /// Header keys without a derived field, sorted by key.
    pub fn extra(&self) -> BTreeMap<String, MetaValue> {
        self.metadata
            .iter()
            .filter(|(key, _)| !KNOWN_KEYS.contains(key))
            .map(|(key, value)| (key.to_owned(), value.clone()))
            .collect()
    }

    /// Re-serialize header and body; byte-identical to the loaded source.
    #[allow(dead_code)]
    pub fn to_source(&self) -> String {
        let mut source = String::with_capacity(self.header.len() + self.body.len());
        source.push_str(&self.header);
        source.push_str(&self.body);
        source
    }
}

/// Last path component of an identifier, without extension.
fn file_stem(id: &str) -> &str {
    let name = id.rsplit('/').next().unwrap_or(id);
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: &str = "---\ntitle: \"Zero\"\ncategory: blog\ntags: [perf]\n---\nText[^a]\n\n[^a]: note text\n";

    #[test]
    fn test_parse_derives_fields() {
        let doc = Document::parse("posts/2020-01-20-zero.md", ZERO).unwrap();

        assert_eq!(doc.id, "posts/2020-01-20-zero.md");
        assert_eq!(doc.title, "Zero");
        assert_eq!(doc.category.as_deref(), Some("blog"));
        assert_eq!(doc.tags, vec!["perf"]);
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2020, 1, 20));
        assert_eq!(doc.slug, "zero");
        assert_eq!(doc.layout, None);
        assert!(!doc.draft);
        assert_eq!(doc.body, "Text[^a]\n\n[^a]: note text\n");
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let sources = [
            ZERO,
            "---\r\ntitle: 'CRLF'\r\n---\r\nbody\r\n",
            "---\n# comment\ntags:\n  - a\n  - b\n...\n",
            "---\ntitle: T\n---",
            "---\n\n---\n\n\nbody with trailing spaces   \n\n",
        ];
        for source in sources {
            let doc = Document::parse("x.md", source).unwrap();
            assert_eq!(doc.to_source(), source);
        }
    }

    #[test]
    fn test_header_overrides() {
        let src = "---\ntitle: T\ndate: 2021-03-04\nslug: custom\ncategories: [notes, misc]\nlayout: post\nasset_path: /img/t\ndraft: yes\n---\n";
        let doc = Document::parse("2020-01-20-zero.md", src).unwrap();

        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2021, 3, 4));
        assert_eq!(doc.slug, "custom");
        assert_eq!(doc.category.as_deref(), Some("notes"));
        assert_eq!(doc.layout.as_deref(), Some("post"));
        assert_eq!(doc.asset_path.as_deref(), Some("/img/t"));
        assert!(doc.draft);
    }

    #[test]
    fn test_extra_keys() {
        let src = "---\ntitle: T\nseries: caches\nreviewers: [a, b]\n---\n";
        let doc = Document::parse("x.md", src).unwrap();
        let extra = doc.extra();

        assert_eq!(extra.len(), 2);
        assert_eq!(extra["series"], MetaValue::Scalar("caches".into()));
        assert_eq!(extra["reviewers"], MetaValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_fallbacks_without_header_fields() {
        let doc = Document::parse("about.markdown", "---\n---\nHi\n").unwrap();

        assert_eq!(doc.title, "about");
        assert_eq!(doc.slug, "about");
        assert_eq!(doc.date, None);
        assert_eq!(doc.category, None);
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_invalid_date_is_malformed_header() {
        let err = Document::parse("a.md", "---\ndate: 2020-02-30\n---\n").unwrap_err();
        assert!(matches!(
            err,
            DocumentError::MalformedHeader {
                reason: HeaderError::InvalidDate(_),
                ..
            }
        ));
    }

    #[test]
    fn test_missing_delimiter_is_malformed_header() {
        let err = Document::parse("a.md", "# Just markdown\n").unwrap_err();
        assert_eq!(err.id(), "a.md");
        assert!(matches!(
            err,
            DocumentError::MalformedHeader {
                reason: HeaderError::MissingOpening,
                ..
            }
        ));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("a/b/2020-01-20-zero.md"), "2020-01-20-zero");
        assert_eq!(file_stem("plain"), "plain");
        assert_eq!(file_stem("dir/.hidden"), ".hidden");
        assert_eq!(file_stem("v1.2.md"), "v1.2");
    }
}
