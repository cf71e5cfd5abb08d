//! Reference resolution.
//!
//! Runs between loading and rendering. Include markers are expanded first,
//! so fragments may carry footnote references of their own; footnotes are
//! resolved on the expanded body.
//!
//! ```text
//! {% include note.md %}   ──► fragment text
//! [^label]: definition    ──► removed, kept in `footnotes`
//! text[^label]            ──► <sup id="fnref:1"><a href="#fn:1" ...>1</a></sup>
//! ```

pub mod footnote;
pub mod include;
mod scan;

pub use footnote::Footnote;
pub use include::{FragmentRegistry, IncludeDir};

use crate::{document::Document, error::DocumentError};

/// A document after reference resolution.
#[derive(Debug)]
pub struct ResolvedDocument {
    pub document: Document,
    /// Body with includes expanded, definitions removed and references linked
    pub body: String,
    /// Ordered by ordinal
    pub footnotes: Vec<Footnote>,
    /// Non-fatal problems found while resolving
    pub warnings: Vec<String>,
}

/// Resolve includes and footnotes of one document.
pub fn resolve(
    document: Document,
    registry: &dyn FragmentRegistry,
) -> Result<ResolvedDocument, DocumentError> {
    let expanded = include::expand(&document.body, registry).map_err(|names| {
        DocumentError::UnresolvedInclude {
            id: document.id.clone(),
            names,
        }
    })?;

    let resolution = footnote::resolve(&expanded).map_err(|labels| {
        DocumentError::UnresolvedFootnote {
            id: document.id.clone(),
            labels,
        }
    })?;

    Ok(ResolvedDocument {
        document,
        body: resolution.body,
        footnotes: resolution.footnotes,
        warnings: resolution.warnings,
    })
}
