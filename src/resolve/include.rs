//! Include fragments.
//!
//! `{% include name key="value" %}` is replaced by the fragment registered
//! under `name`, with `{{ include.key }}` placeholders filled in from the
//! marker's parameters. Fragment text is inserted as-is: markers inside a
//! fragment are not expanded again.

use super::scan::{FenceTracker, replace_outside_code};
use anyhow::{Context, Result};
use regex::Regex;
use std::{collections::HashMap, fs, path::Path, sync::LazyLock};
use walkdir::WalkDir;

static RE_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*include\s+([^\s%]+)((?:\s+[A-Za-z0-9_-]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*-?%\}"#)
        .unwrap()
});
static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*include\.([A-Za-z0-9_-]+)\s*\}\}").unwrap());

/// Source of named include fragments.
pub trait FragmentRegistry: Sync {
    /// Fragment text registered under `name`.
    fn fragment(&self, name: &str) -> Option<&str>;
}

impl FragmentRegistry for HashMap<String, String> {
    fn fragment(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Fragments loaded from the includes directory, keyed by `/`-separated
/// path relative to that directory (`note.html`, `figures/plot.md`).
#[derive(Debug, Default)]
pub struct IncludeDir {
    fragments: HashMap<String, String>,
}

impl IncludeDir {
    /// Read every file under `dir` once. A missing directory is an empty registry.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut fragments = HashMap::new();
        if !dir.is_dir() {
            return Ok(Self { fragments });
        }

        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let name = crate::document::loader::document_id(dir, path);
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read include `{}`", path.display()))?;
            fragments.insert(name, text);
        }

        Ok(Self { fragments })
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }
}

impl FragmentRegistry for IncludeDir {
    fn fragment(&self, name: &str) -> Option<&str> {
        self.fragments.fragment(name)
    }
}

/// Expand every include marker in `body`.
///
/// On failure returns the names of all fragments that were not found, in
/// order of first appearance.
pub fn expand(body: &str, registry: &dyn FragmentRegistry) -> Result<String, Vec<String>> {
    let mut fences = FenceTracker::default();
    let mut missing: Vec<String> = Vec::new();
    let mut out = String::with_capacity(body.len());

    for line in body.split_inclusive('\n') {
        if fences.process(line) {
            out.push_str(line);
            continue;
        }
        let expanded = replace_outside_code(line, &RE_INCLUDE, |caps| {
            let name = &caps[1];
            match registry.fragment(name) {
                Some(fragment) => substitute(fragment, &caps[2]),
                None => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_owned());
                    }
                    String::new()
                }
            }
        });
        out.push_str(&expanded);
    }

    if missing.is_empty() { Ok(out) } else { Err(missing) }
}

/// Fill `{{ include.key }}` placeholders; unknown keys become empty.
fn substitute(fragment: &str, raw_params: &str) -> String {
    let params: HashMap<&str, &str> = RE_PARAM
        .captures_iter(raw_params)
        .filter_map(|c| {
            let key = c.get(1)?.as_str();
            let value = c.get(2).or_else(|| c.get(3))?.as_str();
            Some((key, value))
        })
        .collect();

    RE_PLACEHOLDER
        .replace_all(fragment, |c: &regex::Captures<'_>| {
            params.get(&c[1]).copied().unwrap_or_default().to_owned()
        })
        .into_owned()
}
