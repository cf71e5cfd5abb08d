//! `[build]` section configuration.
//!
//! Contains build settings including paths, slugs, markdown options, feed, etc.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Enums
// ============================================================================

/// URL slug generation mode for paths and anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Always convert to a lowercase ASCII slug (e.g., "Café au lait" → "cafe-au-lait").
    On,
    /// Only strip characters that are unsafe in paths; keep the rest as-is (default).
    #[default]
    Safe,
    /// No slugification; preserve original text.
    No,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in folio.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "_posts"     # Source directory
/// output = "public"      # Output directory
/// minify = true          # Minify HTML
///
/// [build.markdown]
/// smart_punctuation = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory (Markdown documents).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Named include fragments, looked up by relative file name.
    #[serde(default = "defaults::build::includes")]
    #[educe(Default = defaults::build::includes())]
    pub includes: PathBuf,

    /// Layout templates (`<name>.html`).
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// File extensions treated as documents.
    #[serde(default = "defaults::build::extensions")]
    #[educe(Default = defaults::build::extensions())]
    pub extensions: Vec<String>,

    /// Minify HTML output (removes whitespace).
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Clear output directory before writing.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Publish documents whose header sets `draft: true`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// URL slugification settings.
    #[serde(default)]
    pub slug: SlugConfig,

    /// Markdown rendering options.
    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// RSS feed generation settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// JSON page index settings.
    #[serde(default)]
    pub index: IndexConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.slug]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SlugConfig {
    /// Slugify destination paths
    #[serde(default = "defaults::build::slug::path")]
    #[educe(Default = defaults::build::slug::path())]
    pub path: SlugMode,

    /// Slugify heading anchors
    #[serde(default = "defaults::build::slug::fragment")]
    #[educe(Default = defaults::build::slug::fragment())]
    pub fragment: SlugMode,
}

/// `[build.markdown]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Convert straight quotes and dashes to typographic ones.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub smart_punctuation: bool,

    /// Give every heading an `id` derived from its text.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub heading_anchors: bool,
}

/// `[build.feed]` section - RSS feed generation configuration.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Enable RSS feed generation.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub enable: bool,

    /// Output path for the feed, relative to the output directory.
    #[serde(default = "defaults::build::feed::path")]
    #[educe(Default = defaults::build::feed::path())]
    pub path: PathBuf,
}

/// `[build.index]` section - `pages.json` / `tags.json` generation.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Write the JSON page index.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub enable: bool,

    /// Directory for the index files, relative to the output directory.
    #[serde(default = "defaults::build::index::path")]
    #[educe(Default = defaults::build::index::path())]
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("[base]\ntitle = \"T\"").unwrap();

        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.includes, PathBuf::from("_includes"));
        assert_eq!(config.build.layouts, PathBuf::from("_layouts"));
        assert_eq!(config.build.extensions, vec!["md", "markdown"]);
        assert!(config.build.minify);
        assert!(!config.build.clean);
        assert!(!config.build.drafts);
        assert_eq!(config.build.slug.path, SlugMode::Safe);
        assert_eq!(config.build.slug.fragment, SlugMode::On);
        assert!(config.build.markdown.heading_anchors);
        assert!(!config.build.markdown.smart_punctuation);
        assert!(!config.build.feed.enable);
        assert_eq!(config.build.feed.path, PathBuf::from("feed.xml"));
        assert!(!config.build.index.enable);
    }

    #[test]
    fn test_slug_modes() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build.slug]
            path = "on"
            fragment = "no"
        "#,
        )
        .unwrap();

        assert_eq!(config.build.slug.path, SlugMode::On);
        assert_eq!(config.build.slug.fragment, SlugMode::No);
    }

    #[test]
    fn test_invalid_slug_mode() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [build.slug]
            path = "sometimes"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_build_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [build]
            typst = true
        "#,
        );
        assert!(result.is_err());
    }
}
