//! Footnote definitions and references.

use super::scan::{FenceTracker, replace_outside_code};
use regex::Regex;
use std::{collections::HashMap, sync::LazyLock};

static RE_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}\[\^([^\]\s]+)\]:[ \t]?(.*)$").unwrap());
static RE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^([^\]\s]+)\]").unwrap());

/// A resolved footnote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub label: String,
    /// Definition text, Markdown
    pub text: String,
    /// Position of the first reference, 1-based
    pub ordinal: usize,
    /// How many times the body references it
    pub references: usize,
}

/// Result of footnote resolution on one body.
#[derive(Debug)]
pub struct Resolution {
    pub body: String,
    pub footnotes: Vec<Footnote>,
    pub warnings: Vec<String>,
}

struct Definition {
    label: String,
    lines: Vec<String>,
}

impl Definition {
    fn text(&self) -> String {
        self.lines.join("\n").trim_end().to_owned()
    }
}

/// Remove definitions from `body` and replace references with links.
///
/// References inside kept definitions are linked too, and labels first
/// seen there take the next ordinals. On failure returns every referenced
/// label that has no definition, in order of first reference.
pub fn resolve(body: &str) -> Result<Resolution, Vec<String>> {
    let mut warnings = Vec::new();
    let (stripped, definitions) = extract_definitions(body, &mut warnings);

    let mut linker = Linker::default();
    for def in &definitions {
        if linker.definitions.contains_key(def.label.as_str()) {
            warnings.push(format!(
                "footnote `{}` defined more than once, keeping the first definition",
                def.label
            ));
            continue;
        }
        linker.definitions.insert(&def.label, def);
    }

    let body = linker.link(&stripped);

    // `order` grows while definitions are linked
    let mut texts = Vec::new();
    while texts.len() < linker.order.len() {
        let label = &linker.order[texts.len()].0;
        let text = linker.definitions[label.as_str()].text();
        texts.push(linker.link(&text));
    }

    if !linker.missing.is_empty() {
        return Err(linker.missing);
    }

    let footnotes: Vec<Footnote> = linker
        .order
        .into_iter()
        .zip(texts)
        .enumerate()
        .map(|(idx, ((label, references), text))| Footnote {
            label,
            text,
            ordinal: idx + 1,
            references,
        })
        .collect();

    // Definition order, first definition of each label only
    for def in &definitions {
        let first = linker
            .definitions
            .get(def.label.as_str())
            .is_some_and(|d| std::ptr::eq(*d, def));
        if first && !footnotes.iter().any(|f| f.label == def.label) {
            warnings.push(format!("footnote `{}` is defined but never referenced", def.label));
        }
    }

    Ok(Resolution { body, footnotes, warnings })
}

/// Reference bookkeeping for one document.
#[derive(Default)]
struct Linker<'a> {
    definitions: HashMap<&'a str, &'a Definition>,
    /// Labels in ordinal order, with their reference counts
    order: Vec<(String, usize)>,
    missing: Vec<String>,
}

impl Linker<'_> {
    /// Replace references in `text` outside code.
    fn link(&mut self, text: &str) -> String {
        let mut fences = FenceTracker::default();
        let mut out = String::with_capacity(text.len());

        for line in text.split_inclusive('\n') {
            if fences.process(line) {
                out.push_str(line);
                continue;
            }
            let replaced = replace_outside_code(line, &RE_REFERENCE, |caps| {
                self.reference(&caps[1])
                    .unwrap_or_else(|| caps[0].to_owned())
            });
            out.push_str(&replaced);
        }
        out
    }

    /// Markup for one reference to `label`, or `None` when it has no definition.
    fn reference(&mut self, label: &str) -> Option<String> {
        if !self.definitions.contains_key(label) {
            if !self.missing.iter().any(|m| m == label) {
                self.missing.push(label.to_owned());
            }
            return None;
        }
        let ordinal = match self.order.iter().position(|(l, _)| l == label) {
            Some(idx) => {
                self.order[idx].1 += 1;
                idx + 1
            }
            None => {
                self.order.push((label.to_owned(), 1));
                self.order.len()
            }
        };
        Some(reference_html(ordinal, self.order[ordinal - 1].1 - 1))
    }
}

/// Markup for one reference. `repeat` is 0 for the first reference to a
/// footnote and counts up for later ones.
pub fn reference_html(ordinal: usize, repeat: usize) -> String {
    let id = if repeat == 0 {
        format!("fnref:{ordinal}")
    } else {
        format!("fnref:{ordinal}:{repeat}")
    };
    format!(r##"<sup id="{id}"><a href="#fn:{ordinal}" class="footnote">{ordinal}</a></sup>"##)
}

/// Split definition blocks out of `body`, in order of appearance.
fn extract_definitions(body: &str, warnings: &mut Vec<String>) -> (String, Vec<Definition>) {
    let lines: Vec<&str> = body.split_inclusive('\n').collect();
    let mut fences = FenceTracker::default();
    let mut definitions: Vec<Definition> = Vec::new();
    let mut out = String::with_capacity(body.len());
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        idx += 1;

        if fences.process(line) {
            out.push_str(line);
            continue;
        }
        let Some(caps) = RE_DEFINITION.captures(strip_eol(line)) else {
            out.push_str(line);
            continue;
        };

        let mut def = Definition {
            label: caps[1].to_owned(),
            lines: vec![caps[2].to_owned()],
        };

        // Continuation lines; blank lines only count when followed by one
        while idx < lines.len() {
            let next = strip_eol(lines[idx]);
            if let Some(rest) = continuation(next) {
                def.lines.push(rest.to_owned());
                idx += 1;
            } else if next.trim().is_empty()
                && lines
                    .get(idx + 1)
                    .is_some_and(|l| continuation(strip_eol(l)).is_some())
            {
                def.lines.push(String::new());
                idx += 1;
            } else {
                break;
            }
        }

        if def.text().is_empty() {
            warnings.push(format!("footnote `{}` has an empty definition", def.label));
        }
        definitions.push(def);
    }

    (out, definitions)
}

fn continuation(line: &str) -> Option<&str> {
    line.strip_prefix("    ")
        .or_else(|| line.strip_prefix('\t'))
        .filter(|rest| !rest.trim().is_empty())
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_footnote() {
        let res = resolve("Text[^a]\n\n[^a]: note text\n").unwrap();

        assert_eq!(
            res.body,
            "Text<sup id=\"fnref:1\"><a href=\"#fn:1\" class=\"footnote\">1</a></sup>\n\n"
        );
        assert_eq!(
            res.footnotes,
            vec![Footnote {
                label: "a".into(),
                text: "note text".into(),
                ordinal: 1,
                references: 1,
            }]
        );
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_ordinals_follow_first_reference() {
        let body = "[^z]: last\n[^y]: first\n\nOne[^y] two[^z] again[^y].\n";
        let res = resolve(body).unwrap();

        let ordinals: Vec<_> = res
            .footnotes
            .iter()
            .map(|f| (f.label.as_str(), f.ordinal, f.references))
            .collect();
        assert_eq!(ordinals, vec![("y", 1, 2), ("z", 2, 1)]);
        assert!(res.body.contains(r##"<sup id="fnref:1:1"><a href="#fn:1""##));
        assert!(res.body.contains(r##"<sup id="fnref:2"><a href="#fn:2""##));
    }

    #[test]
    fn test_missing_labels_are_all_reported() {
        let err = resolve("A[^missing] B[^ok] C[^gone] D[^missing]\n\n[^ok]: fine\n").unwrap_err();
        assert_eq!(err, vec!["missing", "gone"]);
    }

    #[test]
    fn test_duplicate_definition_keeps_first() {
        let res = resolve("X[^a]\n\n[^a]: first\n[^a]: second\n").unwrap();

        assert_eq!(res.footnotes[0].text, "first");
        assert_eq!(res.warnings.len(), 1);
        assert!(res.warnings[0].contains("more than once"));
    }

    #[test]
    fn test_unused_definition_is_dropped_with_warning() {
        let res = resolve("No refs.\n\n[^lonely]: unused\n").unwrap();

        assert!(res.footnotes.is_empty());
        assert_eq!(res.body, "No refs.\n\n");
        assert_eq!(
            res.warnings,
            vec!["footnote `lonely` is defined but never referenced"]
        );
    }

    #[test]
    fn test_multi_line_definition() {
        let body = "X[^long]\n\n[^long]: First line\n    second line\n\n    second paragraph\nAfter\n";
        let res = resolve(body).unwrap();

        assert_eq!(
            res.footnotes[0].text,
            "First line\nsecond line\n\nsecond paragraph"
        );
        assert!(res.body.ends_with("\n\nAfter\n"));
    }

    #[test]
    fn test_missing_label_inside_definition() {
        let err = resolve("Text[^a]\n\n[^a]: see [^missing]\n").unwrap_err();
        assert_eq!(err, vec!["missing"]);
    }

    #[test]
    fn test_definition_references_are_linked() {
        let res = resolve("Text[^a]\n\n[^a]: see [^b]\n[^b]: inner\n").unwrap();

        let labels: Vec<_> = res.footnotes.iter().map(|f| (f.label.as_str(), f.ordinal)).collect();
        assert_eq!(labels, vec![("a", 1), ("b", 2)]);
        assert_eq!(
            res.footnotes[0].text,
            "see <sup id=\"fnref:2\"><a href=\"#fn:2\" class=\"footnote\">2</a></sup>"
        );
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_definition_referencing_itself() {
        let res = resolve("X[^a]\n\n[^a]: see also [^a]\n").unwrap();

        assert_eq!(res.footnotes.len(), 1);
        assert_eq!(res.footnotes[0].references, 2);
        assert!(res.footnotes[0].text.contains("id=\"fnref:1:1\""));
    }

    #[test]
    fn test_code_is_literal() {
        let body = "```c\nint a[^x];\n[^x]: not a definition\n```\nInline `arr[^i]` here.\n";
        let res = resolve(body).unwrap();

        assert_eq!(res.body, body);
        assert!(res.footnotes.is_empty());
    }
}
