//! Metadata header (front matter) parsing.
//!
//! ```text
//! ---                      <- opening delimiter, first line of the file
//! title: "Zero"            <- scalar, quoted or bare
//! category: blog
//! tags: [perf, "cpu cache"] <- inline list
//! authors:                 <- block list
//!   - alice
//!   - bob
//! ---                      <- closing delimiter (`...` also accepted)
//! body starts here
//! ```
//!
//! The text between the delimiters is YAML. Values must be strings
//! (numbers and booleans are kept as text) or lists of them. Anything
//! else is a [`HeaderError`] and the document is skipped.

use crate::error::HeaderError;
use serde::Serialize;
use serde_yaml::Value;

/// A header value: one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Scalar(String),
    List(Vec<String>),
}

/// Header keys and values, in the order they appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar value of `key`; empty scalars count as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            MetaValue::Scalar(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// List value of `key`. A non-empty scalar is a one-element list.
    pub fn get_list(&self, key: &str) -> Vec<&str> {
        match self.get(key) {
            Some(MetaValue::List(items)) => items.iter().map(String::as_str).collect(),
            Some(MetaValue::Scalar(s)) if !s.is_empty() => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Result of splitting a source file into header and body.
#[derive(Debug)]
pub struct Split {
    pub metadata: Metadata,
    /// Byte offset where the body starts (just past the closing delimiter line)
    pub body_start: usize,
}

/// Split `source` into its metadata header and the offset of the body.
pub fn split(source: &str) -> Result<Split, HeaderError> {
    let mut lines = source.split_inclusive('\n');

    let header_start = match lines.next() {
        Some(first) if strip_eol(first) == "---" => first.len(),
        _ => return Err(HeaderError::MissingOpening),
    };

    let mut offset = header_start;
    for raw in lines {
        if matches!(strip_eol(raw).trim_end(), "---" | "...") {
            return Ok(Split {
                metadata: parse_metadata(&source[header_start..offset])?,
                body_start: offset + raw.len(),
            });
        }
        offset += raw.len();
    }

    Err(HeaderError::MissingClosing)
}

fn strip_eol(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Deserialize the text between the delimiters.
///
/// Duplicate keys are rejected by the YAML mapping itself.
fn parse_metadata(text: &str) -> Result<Metadata, HeaderError> {
    if text.trim().is_empty() {
        return Ok(Metadata::default());
    }
    let mapping = match serde_yaml::from_str::<Value>(text) {
        Ok(Value::Null) => return Ok(Metadata::default()),
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(_) => return Err(HeaderError::NotMapping),
        Err(err) => return Err(HeaderError::Yaml(err.to_string())),
    };

    let mut metadata = Metadata::default();
    for (key, value) in mapping {
        let key = scalar(&key).ok_or(HeaderError::NotMapping)?;
        let value = match value {
            Value::Sequence(items) => items
                .iter()
                .map(scalar)
                .collect::<Option<Vec<_>>>()
                .map(MetaValue::List),
            other => scalar(&other).map(MetaValue::Scalar),
        }
        .ok_or_else(|| HeaderError::UnsupportedValue { key: key.clone() })?;
        metadata.entries.push((key, value));
    }
    Ok(metadata)
}

/// Plain YAML scalars as text; `key:` with no value is an empty string.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: &str) -> MetaValue {
        MetaValue::Scalar(s.to_owned())
    }

    fn list(items: &[&str]) -> MetaValue {
        MetaValue::List(items.iter().map(|s| (*s).to_owned()).collect())
    }

    #[test]
    fn test_split_basic_header() {
        let src = "---\ntitle: \"Zero\"\ncategory: blog\ntags: [perf]\n---\nBody text\n";
        let split = split(src).unwrap();

        assert_eq!(split.metadata.get("title"), Some(&scalar("Zero")));
        assert_eq!(split.metadata.get("category"), Some(&scalar("blog")));
        assert_eq!(split.metadata.get("tags"), Some(&list(&["perf"])));
        assert_eq!(&src[split.body_start..], "Body text\n");
    }

    #[test]
    fn test_split_preserves_key_order() {
        let split = split("---\nb: 1\na: 2\nc: 3\n---\n").unwrap();
        let keys: Vec<_> = split.metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_block_list() {
        let src = "---\ntags:\n  - perf\n  - \"cpu cache\"\nlayout: post\n---\n";
        let split = split(src).unwrap();

        assert_eq!(split.metadata.get("tags"), Some(&list(&["perf", "cpu cache"])));
        assert_eq!(split.metadata.get_str("layout"), Some("post"));
    }

    #[test]
    fn test_inline_list_with_quotes() {
        let split = split("---\ntags: [a, \"b, c\", 'd']\n---\n").unwrap();
        assert_eq!(split.metadata.get("tags"), Some(&list(&["a", "b, c", "d"])));

        let split = super::split("---\ntags: []\n---\n").unwrap();
        assert_eq!(split.metadata.get("tags"), Some(&list(&[])));
    }

    #[test]
    fn test_scalar_forms() {
        let src = "---\na: \"say \\\"hi\\\"\"\nb: 'it''s'\nc: bare value # comment\nd: 'x: y'\n---\n";
        let split = split(src).unwrap();

        assert_eq!(split.metadata.get_str("a"), Some("say \"hi\""));
        assert_eq!(split.metadata.get_str("b"), Some("it's"));
        assert_eq!(split.metadata.get_str("c"), Some("bare value"));
        assert_eq!(split.metadata.get_str("d"), Some("x: y"));
    }

    #[test]
    fn test_non_string_scalars_are_kept_as_text() {
        let split = split("---\ndraft: true\nweight: 3\ndate: 2020-01-20\n---\n").unwrap();

        assert_eq!(split.metadata.get_str("draft"), Some("true"));
        assert_eq!(split.metadata.get_str("weight"), Some("3"));
        assert_eq!(split.metadata.get_str("date"), Some("2020-01-20"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let split = split("---\n# a comment\n\ntitle: T\n\n---\n").unwrap();
        assert_eq!(split.metadata.iter().count(), 1);

        let split = super::split("---\n# only a comment\n---\n").unwrap();
        assert_eq!(split.metadata.iter().count(), 0);
    }

    #[test]
    fn test_crlf_line_endings() {
        let src = "---\r\ntitle: T\r\n---\r\nbody\r\n";
        let split = split(src).unwrap();
        assert_eq!(split.metadata.get_str("title"), Some("T"));
        assert_eq!(&src[split.body_start..], "body\r\n");
    }

    #[test]
    fn test_dots_close_header() {
        let src = "---\ntitle: T\n...\nbody";
        assert_eq!(&src[split(src).unwrap().body_start..], "body");
    }

    #[test]
    fn test_closing_delimiter_at_eof() {
        let src = "---\ntitle: T\n---";
        let split = split(src).unwrap();
        assert_eq!(split.body_start, src.len());
    }

    #[test]
    fn test_get_list_accepts_scalar() {
        let split = split("---\ncategories: blog\nempty:\n---\n").unwrap();
        assert_eq!(split.metadata.get_list("categories"), vec!["blog"]);
        assert!(split.metadata.get_list("empty").is_empty());
        assert_eq!(split.metadata.get_str("empty"), None);
        assert!(split.metadata.contains_key("empty"));
    }

    #[test]
    fn test_missing_opening() {
        assert_eq!(split("title: T\n---\n").unwrap_err(), HeaderError::MissingOpening);
        assert_eq!(split("").unwrap_err(), HeaderError::MissingOpening);
        assert_eq!(split("\n---\ntitle: T\n---\n").unwrap_err(), HeaderError::MissingOpening);
    }

    #[test]
    fn test_missing_closing() {
        assert_eq!(split("---\ntitle: T\nbody\n").unwrap_err(), HeaderError::MissingClosing);
        assert_eq!(split("---\ntitle: T\n").unwrap_err(), HeaderError::MissingClosing);
    }

    #[test]
    fn test_duplicate_key() {
        let err = split("---\ntitle: A\ntags: [x]\ntitle: B\n---\n").unwrap_err();
        match err {
            HeaderError::Yaml(message) => assert!(message.contains("duplicate entry"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_yaml() {
        for src in [
            "---\ntags: [a, b\n---\n",
            "---\ntitle: \"Zero\n---\n",
            "---\ntitle: T\n  nested: x\n---\n",
        ] {
            assert!(matches!(split(src), Err(HeaderError::Yaml(_))), "{src:?}");
        }
    }

    #[test]
    fn test_header_must_be_a_mapping() {
        assert_eq!(split("---\n- orphan\n---\n").unwrap_err(), HeaderError::NotMapping);
        assert_eq!(split("---\njust text\n---\n").unwrap_err(), HeaderError::NotMapping);
    }

    #[test]
    fn test_nested_values_are_rejected() {
        assert_eq!(
            split("---\nauthor:\n  name: A\n---\n").unwrap_err(),
            HeaderError::UnsupportedValue { key: "author".into() }
        );
        assert_eq!(
            split("---\ntags: [[a], b]\n---\n").unwrap_err(),
            HeaderError::UnsupportedValue { key: "tags".into() }
        );
    }
}
