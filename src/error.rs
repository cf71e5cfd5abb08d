//! Pipeline error types.
//!
//! | Error                | Stage    | Scope          | Effect                          |
//! |----------------------|----------|----------------|---------------------------------|
//! | `MalformedHeader`    | load     | one document   | document skipped, batch goes on |
//! | `UnresolvedFootnote` | resolve  | one document   | document skipped, batch goes on |
//! | `UnresolvedInclude`  | resolve  | one document   | document skipped, batch goes on |
//! | `Read`               | load     | one document   | document skipped, batch goes on |
//! | `WriteConflict`      | publish  | whole batch    | run aborted before any write    |
//! | `Write`              | publish  | whole batch    | run aborted                     |

use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Why a metadata header could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("missing opening `---` delimiter")]
    MissingOpening,

    #[error("missing closing `---` delimiter")]
    MissingClosing,

    #[error("{0}")]
    Yaml(String),

    #[error("header is not a `key: value` mapping")]
    NotMapping,

    #[error("`{key}` must be a string or a list of strings")]
    UnsupportedValue { key: String },

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// A failure that skips one document and lets the rest of the batch continue.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{id}: malformed header: {reason}")]
    MalformedHeader { id: String, reason: HeaderError },

    #[error("{id}: footnote(s) referenced but never defined: {}", join(.labels))]
    UnresolvedFootnote { id: String, labels: Vec<String> },

    #[error("{id}: include fragment(s) not found: {}", join(.names))]
    UnresolvedInclude { id: String, names: Vec<String> },

    #[error("{id}: cannot read source")]
    Read {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// Identifier of the offending document.
    pub fn id(&self) -> &str {
        match self {
            Self::MalformedHeader { id, .. }
            | Self::UnresolvedFootnote { id, .. }
            | Self::UnresolvedInclude { id, .. }
            | Self::Read { id, .. } => id,
        }
    }
}

/// Two or more outputs of the batch mapped to the same destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Route relative to the output directory
    pub destination: String,
    /// Everything that wanted to be written there, in batch order
    pub sources: Vec<String>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` <- {}", self.destination, join(&self.sources))
    }
}

/// A failure of the whole publish run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("destination conflict, nothing was written: {}", join(.0))]
    WriteConflict(Vec<Conflict>),

    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
