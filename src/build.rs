//! Batch orchestration.
//!
//! # Architecture
//!
//! ```text
//! publish_site()
//!     │
//!     ├── collect_sources() ──► load_all()         (parallel, per document)
//!     │
//!     ├── drop drafts unless [build].drafts
//!     │
//!     ├── resolve() + render()                    (parallel, per document)
//!     │
//!     ├── Plan::new() + feed + data index         (whole batch)
//!     │
//!     └── Mode::Write ──► commit()                (collision check, clean, writes)
//!         Mode::Check ──► plan.check()            (no writes)
//! ```
//!
//! Per-document failures are collected in the [`BatchReport`] and the rest
//! of the batch keeps going. Batch-level failures (conflicts, I/O while
//! writing) abort the run.

use crate::{
    config::SiteConfig,
    document::{Document, collect_sources, load_all},
    error::DocumentError,
    log,
    logger::ProgressBars,
    publish::{self, LayoutEngine, Plan, TemplateDir, feed, index},
    render::{RenderOptions, RenderedPage, render},
    resolve::{IncludeDir, resolve},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::error::Error as _;

/// Whether the batch is written or only checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Write,
    Check,
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// URLs of published (or, in check mode, publishable) pages
    pub published: Vec<String>,
    /// Documents that were skipped, in batch order
    pub failures: Vec<DocumentError>,
    /// `id: message` lines
    pub warnings: Vec<String>,
    /// Drafts left out of the batch
    pub drafts: usize,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Log failures, then a one-line summary.
    pub fn log_summary(&self, mode: Mode) {
        for failure in &self.failures {
            log!("error"; "{}", error_chain(failure));
        }

        let verb = match mode {
            Mode::Write => "published",
            Mode::Check => "ready to publish",
        };
        let mut summary = format!("{} page(s) {verb}", self.published.len());
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        if !self.warnings.is_empty() {
            summary.push_str(&format!(", {} warning(s)", self.warnings.len()));
        }
        if self.drafts > 0 {
            summary.push_str(&format!(", {} draft(s) skipped", self.drafts));
        }

        let module = if self.failures.is_empty() { "done" } else { "warn" };
        log!(module; "{summary}");
    }
}

/// Error message followed by its sources, `: `-separated.
fn error_chain(err: &DocumentError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Run the whole pipeline over the content directory.
pub fn publish_site(config: &SiteConfig, mode: Mode) -> Result<BatchReport> {
    let content = &config.build.content;
    let mut report = BatchReport::default();

    let sources = collect_sources(content, &config.build.extensions);
    let includes = IncludeDir::load(&config.build.includes)?;
    log!(
        "load";
        "found {} document(s), {} include fragment(s)",
        sources.len(),
        includes.len()
    );

    // ========================================================================
    // Load, resolve and render, one task per document
    // ========================================================================
    let progress = ProgressBars::new(&[("load", sources.len()), ("render", sources.len())]);

    let mut documents: Vec<Document> = Vec::with_capacity(sources.len());
    for result in load_all(content, &sources, || progress.inc(0)) {
        match result {
            Ok(doc) => documents.push(doc),
            Err(err) => report.failures.push(err),
        }
    }

    if !config.build.drafts {
        let before = documents.len();
        documents.retain(|doc| !doc.draft);
        report.drafts = before - documents.len();
    }

    let options = RenderOptions::from_config(config);
    let rendered: Vec<_> = documents
        .into_par_iter()
        .map(|doc| {
            let result = resolve(doc, &includes).map(|resolved| {
                let warnings: Vec<_> = resolved
                    .warnings
                    .iter()
                    .map(|w| format!("{}: {w}", resolved.document.id))
                    .collect();
                (render(&resolved, &options), warnings)
            });
            progress.inc(1);
            result
        })
        .collect();
    progress.finish();

    let mut pages: Vec<RenderedPage> = Vec::with_capacity(rendered.len());
    for result in rendered {
        match result {
            Ok((page, warnings)) => {
                report.warnings.extend(warnings);
                pages.push(page);
            }
            Err(err) => report.failures.push(err),
        }
    }
    report.failures.sort_by(|a, b| a.id().cmp(b.id()));

    // ========================================================================
    // Plan the batch
    // ========================================================================
    let mut plan = Plan::new(pages, config);

    if config.build.feed.enable {
        let xml = feed::build_feed(config, plan.pages()).context("Failed to build feed")?;
        plan.add_file(&config.build.feed.path, "feed", xml);
    }
    if config.build.index.enable {
        let files = index::build_index(plan.pages()).context("Failed to build data index")?;
        for (name, json) in files {
            plan.add_file(&config.build.index.path.join(name), "data index", json);
        }
    }

    let layouts = TemplateDir::load(&config.build.layouts, config)?;
    log!("layout"; "{} template(s)", layouts.len());
    check_layouts(&plan, &layouts, &mut report);

    for warning in &report.warnings {
        log!("warn"; "{warning}");
    }

    // ========================================================================
    // Commit
    // ========================================================================
    match mode {
        Mode::Check => {
            plan.check()?;
            log!("check"; "{} output(s) planned, no conflicts", plan.pages().len() + plan.files().len());
        }
        Mode::Write => {
            let progress = ProgressBars::new(&[("publish", plan.pages().len())]);
            let result = publish::commit(&plan, config, &layouts, || progress.inc(0));
            progress.finish();
            let written = result?;

            for file in plan.files() {
                log!("publish"; "{}", file.path);
            }
            log!("publish"; "{written} page(s) -> {}", config.build.output.display());
        }
    }

    report.published = plan.pages().iter().map(|p| p.destination.url.clone()).collect();
    Ok(report)
}

/// Warn about pages naming a layout that has no template.
fn check_layouts(plan: &Plan, layouts: &dyn LayoutEngine, report: &mut BatchReport) {
    for planned in plan.pages() {
        if let Some(name) = planned.page.layout.as_deref()
            && !layouts.contains(name)
        {
            report.warnings.push(format!(
                "{}: layout `{name}` not found, using the built-in shell",
                planned.page.id
            ));
        }
    }
}
