//! Publishing.
//!
//! Publishing happens in two steps:
//!
//! 1. [`Plan`]: compute the destination of every output of the batch
//!    (pages, feed, data index) and look for collisions. Nothing touches
//!    the filesystem.
//! 2. [`commit`]: refuse a plan with collisions, then clean the output
//!    directory if asked and write everything.
//!
//! A batch either commits with zero collisions or aborts with zero writes.
//!
//! # Destinations
//!
//! ```text
//! category: blog, date: 2020-01-20, slug: zero
//!   route  blog/2020-01-20-zero
//!   file   <output>/blog/2020-01-20-zero/index.html
//!   url    /blog/2020-01-20-zero/
//! ```

pub mod feed;
pub mod index;
pub mod layout;

pub use layout::{LayoutEngine, TemplateDir};

use crate::{
    config::SiteConfig,
    error::{Conflict, PublishError},
    render::RenderedPage,
    utils::{minify::minify, slug::slugify},
};
use layout::{DEFAULT_LAYOUT, PageContext};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Where a page is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Route relative to the output directory, no leading or trailing `/`
    pub route: String,
    /// `<output>/<route>/index.html`
    pub file: PathBuf,
    /// `/<route>/`
    pub url: String,
}

impl Destination {
    /// `<route>/index.html`, relative to the output directory.
    pub fn output_path(&self) -> String {
        if self.route.is_empty() {
            "index.html".to_owned()
        } else {
            format!("{}/index.html", self.route)
        }
    }
}

/// Compute the destination of a page.
pub fn destination(page: &RenderedPage, config: &SiteConfig) -> Destination {
    let mode = config.build.slug.path;

    let name = match page.date {
        Some(date) => format!("{}-{}", date.format("%Y-%m-%d"), page.slug),
        None => page.slug.clone(),
    };
    let route = page
        .category
        .iter()
        .map(String::as_str)
        .chain([name.as_str()])
        .map(|component| slugify(component, mode))
        .flat_map(|component| path_components(&component))
        .collect::<Vec<_>>()
        .join("/");

    Destination {
        file: config.build.output.join(&route).join("index.html"),
        url: if route.is_empty() { "/".to_owned() } else { format!("/{route}/") },
        route,
    }
}

/// Split on `/` and `\\`, dropping empty, `.` and `..` components.
///
/// Routes and generated file paths both go through this, so equal
/// strings mean equal files and nothing lands outside the output directory.
fn path_components(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .map(str::trim)
        .filter(|c| !matches!(*c, "" | "." | ".."))
        .map(str::to_owned)
        .collect()
}

/// A page with its destination.
#[derive(Debug, Clone)]
pub struct PlannedPage {
    pub page: RenderedPage,
    pub destination: Destination,
}

/// A generated file (feed, data index) relative to the output directory.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    /// `/`-separated path relative to the output directory
    pub path: String,
    /// What produced it, for conflict reports
    pub source: String,
    pub contents: Vec<u8>,
}

/// Every output of one batch, checked for collisions before anything is written.
#[derive(Debug, Default)]
pub struct Plan {
    pages: Vec<PlannedPage>,
    files: Vec<PlannedFile>,
}

impl Plan {
    /// Compute destinations for all pages, keeping batch order.
    pub fn new(pages: Vec<RenderedPage>, config: &SiteConfig) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| PlannedPage {
                destination: destination(&page, config),
                page,
            })
            .collect();
        Self { pages, files: Vec::new() }
    }

    pub fn pages(&self) -> &[PlannedPage] {
        &self.pages
    }

    pub fn files(&self) -> &[PlannedFile] {
        &self.files
    }

    /// Add a generated file at `path` (relative to the output directory).
    pub fn add_file(&mut self, path: &Path, source: impl Into<String>, contents: impl Into<Vec<u8>>) {
        let path = path_components(&path.to_string_lossy()).join("/");
        self.files.push(PlannedFile {
            path,
            source: source.into(),
            contents: contents.into(),
        });
    }

    /// Every output path claimed by more than one output, sorted by path.
    ///
    /// Paths are relative to the output directory: `<route>/index.html`
    /// for a page, the normalised path for a generated file. A file
    /// claimed where another output needs a directory also conflicts, so
    /// a page routed to `feed.xml` collides with a feed written there.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut claims: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for planned in &self.pages {
            claims
                .entry(planned.destination.output_path())
                .or_default()
                .push(&planned.page.id);
        }
        for file in &self.files {
            claims.entry(file.path.clone()).or_default().push(&file.source);
        }

        // Parents sort before their children
        let mut conflicts: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (path, sources) in &claims {
            if sources.len() > 1 {
                conflicts.entry(path).or_default().extend(sources);
            }
            for (idx, _) in path.match_indices('/') {
                let parent = &path[..idx];
                if let Some(owners) = claims.get(parent) {
                    conflicts
                        .entry(parent)
                        .or_insert_with(|| owners.clone())
                        .extend(sources);
                }
            }
        }

        conflicts
            .into_iter()
            .map(|(destination, sources)| Conflict {
                destination: destination.to_owned(),
                sources: sources.into_iter().map(str::to_owned).collect(),
            })
            .collect()
    }

    /// Fail with [`PublishError::WriteConflict`] if any destination is claimed twice.
    pub fn check(&self) -> Result<(), PublishError> {
        let conflicts = self.conflicts();
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(PublishError::WriteConflict(conflicts))
        }
    }
}

/// Write a checked plan. Returns the number of pages written.
///
/// The collision check runs again first, so a conflicting plan never
/// reaches the filesystem, not even the clean step.
pub fn commit(
    plan: &Plan,
    config: &SiteConfig,
    layouts: &dyn LayoutEngine,
    on_progress: impl Fn() + Sync,
) -> Result<usize, PublishError> {
    plan.check()?;

    let output = &config.build.output;
    if config.build.clean && output.exists() {
        fs::remove_dir_all(output).map_err(|source| PublishError::Write {
            path: output.clone(),
            source,
        })?;
    }

    plan.pages.par_iter().try_for_each(|planned| {
        let page = &planned.page;
        let html = layouts.apply(
            page.layout.as_deref().unwrap_or(DEFAULT_LAYOUT),
            &PageContext {
                content: &page.html,
                title: &page.title,
                date: page.date,
                url: &planned.destination.url,
            },
        );
        let html = minify(html.as_bytes(), config);
        write_file(&planned.destination.file, &html)?;
        on_progress();
        Ok::<_, PublishError>(())
    })?;

    for file in &plan.files {
        write_file(&output.join(&file.path), &file.contents)?;
    }

    Ok(plan.pages.len())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PublishError> {
    let to_error = |source| PublishError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, contents).map_err(to_error)
}
