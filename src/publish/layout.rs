//! Layout engine.
//!
//! Layouts wrap a rendered page body into a complete HTML document. The
//! shipped [`TemplateDir`] reads `<layouts>/<name>.html` and fills in
//! these placeholders:
//!
//! | Placeholder         | Value                                   |
//! |---------------------|-----------------------------------------|
//! | `{{ content }}`     | rendered body and footnotes (raw HTML)  |
//! | `{{ page.title }}`  | page title (escaped)                    |
//! | `{{ page.date }}`   | `YYYY-MM-DD`, empty when undated        |
//! | `{{ page.url }}`    | page URL (`/blog/2020-01-20-zero/`)     |
//! | `{{ site.title }}`  | `[base].title` (escaped)                |
//! | `{{ site.language }}` | `[base].language`                     |
//! | `{{ site.extra.a.b }}` | `[extra]` value at `a.b` (escaped), empty when absent |

use crate::{config::SiteConfig, render::escape_html};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::{collections::HashMap, fs, path::Path, sync::LazyLock};

/// Layout used for pages that do not name one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Built-in shell for pages whose layout has no template.
const FALLBACK: &str = r#"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ page.title }}</title>
</head>
<body>
<article>
<h1>{{ page.title }}</h1>
{{ content }}
</article>
</body>
</html>
"#;

static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{\s*(content|page\.title|page\.date|page\.url|site\.title|site\.language|site\.extra\.([\w\-]+(?:\.[\w\-]+)*))\s*\}\}",
    )
    .unwrap()
});

/// Per-page values handed to a layout.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub content: &'a str,
    pub title: &'a str,
    pub date: Option<NaiveDate>,
    pub url: &'a str,
}

/// Applies a named layout around a rendered page.
pub trait LayoutEngine: Sync {
    /// Whether a template named `name` exists.
    fn contains(&self, name: &str) -> bool;

    /// Produce the full HTML document for one page.
    fn apply(&self, name: &str, page: &PageContext<'_>) -> String;
}

/// Templates loaded from the layouts directory, keyed by file stem.
#[derive(Debug, Default)]
pub struct TemplateDir {
    templates: HashMap<String, String>,
    site_title: String,
    site_language: String,
    site_extra: HashMap<String, toml::Value>,
}

impl TemplateDir {
    /// Read every `*.html` file directly under `dir`. A missing directory
    /// leaves only the built-in shell.
    pub fn load(dir: &Path, config: &SiteConfig) -> Result<Self> {
        let mut templates = HashMap::new();

        if dir.is_dir() {
            let entries = fs::read_dir(dir)
                .with_context(|| format!("Failed to read layouts dir `{}`", dir.display()))?;
            for entry in entries {
                let path = entry?.path();
                if !path.is_file() || path.extension().is_none_or(|ext| ext != "html") {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let template = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read layout `{}`", path.display()))?;
                templates.insert(name.to_owned(), template);
            }
        }

        Ok(Self {
            templates,
            site_title: config.base.title.clone(),
            site_language: config.base.language.clone(),
            site_extra: config.extra.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// `[extra]` value at a dotted path, as text. Tables and arrays are empty.
    fn extra(&self, path: &str) -> String {
        let mut keys = path.split('.');
        let mut value = keys.next().and_then(|key| self.site_extra.get(key));
        for key in keys {
            value = value.and_then(|v| v.get(key));
        }
        match value {
            Some(toml::Value::String(s)) => escape_html(s),
            Some(toml::Value::Table(_) | toml::Value::Array(_)) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

impl LayoutEngine for TemplateDir {
    fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn apply(&self, name: &str, page: &PageContext<'_>) -> String {
        let template = self.templates.get(name).map_or(FALLBACK, String::as_str);

        // Single pass, so placeholders inside the content stay untouched
        RE_PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "content" => page.content.to_owned(),
                "page.title" => escape_html(page.title),
                "page.date" => page.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                "page.url" => page.url.to_owned(),
                "site.title" => escape_html(&self.site_title),
                "site.language" => self.site_language.clone(),
                _ => caps.get(2).map(|path| self.extra(path.as_str())).unwrap_or_default(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn page<'a>(content: &'a str) -> PageContext<'a> {
        PageContext {
            content,
            title: "Zero <cost>",
            date: NaiveDate::from_ymd_opt(2020, 1, 20),
            url: "/blog/2020-01-20-zero/",
        }
    }

    fn engine(files: &[(&str, &str)]) -> (TempDir, TemplateDir) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let mut config = SiteConfig::from_str(
            r#"
            [base]
            title = "Notes"

            [extra]
            analytics_id = "UA-1 & 2"
            year = 2020
            [extra.social]
            github = "notes"
        "#,
        )
        .unwrap();
        let layouts = TemplateDir::load(dir.path(), &config).unwrap();
        (dir, layouts)
    }

    #[test]
    fn test_template_substitution() {
        let (_dir, layouts) = engine(&[(
            "post.html",
            "<title>{{ page.title }} - {{site.title}}</title><time>{{ page.date }}</time><a href=\"{{ page.url }}\"></a><main>{{ content }}</main><html lang=\"{{ site.language }}\">",
        )]);

        let html = layouts.apply("post", &page("<p>Body {{ page.title }}</p>"));
        assert_eq!(
            html,
            "<title>Zero &lt;cost&gt; - Notes</title><time>2020-01-20</time><a href=\"/blog/2020-01-20-zero/\"></a><main><p>Body {{ page.title }}</p></main><html lang=\"en\">"
        );
    }

    #[test]
    fn test_missing_template_uses_builtin_shell() {
        let (_dir, layouts) = engine(&[("notes.txt", "ignored")]);

        assert_eq!(layouts.len(), 0);
        assert!(!layouts.contains(DEFAULT_LAYOUT));
        let html = layouts.apply(DEFAULT_LAYOUT, &page("<p>x</p>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Zero &lt;cost&gt;</h1>\n<p>x</p>"));
    }

    #[test]
    fn test_default_layout_is_loaded() {
        let (_dir, layouts) = engine(&[("default.html", "[{{ content }}]")]);

        assert!(layouts.contains(DEFAULT_LAYOUT));
        assert_eq!(layouts.apply(DEFAULT_LAYOUT, &page("x")), "[x]");
    }

    #[test]
    fn test_site_extra_values() {
        let (_dir, layouts) = engine(&[(
            "default.html",
            "{{ site.extra.analytics_id }}|{{site.extra.year}}|{{ site.extra.social.github }}|{{ site.extra.social }}|{{ site.extra.nope.deeper }}",
        )]);

        assert_eq!(layouts.apply(DEFAULT_LAYOUT, &page("")), "UA-1 &amp; 2|2020|notes||");
    }
}
