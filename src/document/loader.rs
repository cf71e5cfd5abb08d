//! Document discovery and loading.
//!
//! Loading is the first pipeline stage. Every file is read and parsed
//! independently on the rayon pool; failures are returned per document so
//! the caller can keep the rest of the batch.

use super::Document;
use crate::error::DocumentError;
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect every document source under `dir`, sorted by path.
///
/// Hidden files and directories (leading `.`) are skipped, as are files
/// whose extension is not in `extensions`.
pub fn collect_sources(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        })
        .map(DirEntry::into_path)
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Identifier of a source file: its path relative to `content_dir`, `/`-separated.
pub fn document_id(content_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(content_dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read and parse one document.
pub fn load_document(content_dir: &Path, path: &Path) -> Result<Document, DocumentError> {
    let id = document_id(content_dir, path);
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(source) => return Err(DocumentError::Read { id, source }),
    };
    Document::parse(id, &source)
}

/// Load every path in parallel. Results keep the order of `paths`.
pub fn load_all(
    content_dir: &Path,
    paths: &[PathBuf],
    on_progress: impl Fn() + Sync,
) -> Vec<Result<Document, DocumentError>> {
    paths
        .par_iter()
        .map(|path| {
            let result = load_document(content_dir, path);
            on_progress();
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn exts() -> Vec<String> {
        vec!["md".into(), "markdown".into()]
    }

    #[test]
    fn test_collect_sources_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.md", "");
        write(dir.path(), "a.markdown", "");
        write(dir.path(), "sub/c.MD", "");
        write(dir.path(), "notes.txt", "");
        write(dir.path(), ".hidden.md", "");
        write(dir.path(), ".drafts/d.md", "");
        write(dir.path(), ".DS_Store", "");

        let found: Vec<_> = collect_sources(dir.path(), &exts())
            .iter()
            .map(|p| document_id(dir.path(), p))
            .collect();

        assert_eq!(found, vec!["a.markdown", "b.md", "sub/c.MD"]);
    }

    #[test]
    fn test_document_id_uses_forward_slashes() {
        let root = Path::new("/site/content");
        assert_eq!(
            document_id(root, &root.join("posts").join("2020-01-20-zero.md")),
            "posts/2020-01-20-zero.md"
        );
    }

    #[test]
    fn test_load_all_keeps_going_after_failures() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "good.md", "---\ntitle: Good\n---\nbody\n");
        let bad = write(dir.path(), "bad.md", "---\ntitle: A\ntitle: B\n---\n");
        let missing = dir.path().join("missing.md");
        let count = AtomicUsize::new(0);

        let results = load_all(dir.path(), &[good, bad, missing], || {
            count.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(count.load(Ordering::Relaxed), 3);
        assert_eq!(results[0].as_ref().unwrap().title, "Good");
        assert!(matches!(
            results[1],
            Err(DocumentError::MalformedHeader { .. })
        ));
        assert!(matches!(results[2], Err(DocumentError::Read { .. })));
    }

    #[test]
    fn test_loaded_document_round_trips() {
        let dir = TempDir::new().unwrap();
        let source = "---\ntitle: \"Zero\"\ntags: [perf]\n---\n# Heading\n\nText.\n";
        let path = write(dir.path(), "2020-01-20-zero.md", source);

        let doc = load_document(dir.path(), &path).unwrap();
        assert_eq!(doc.to_source(), fs::read_to_string(&path).unwrap());
    }
}
