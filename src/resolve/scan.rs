//! Code-aware line scanning.
//!
//! Markers inside fenced code blocks and inline code spans are literal text.
//! The resolver walks the body line by line, feeding every line to a
//! [`FenceTracker`], and only rewrites the parts of a line that lie outside
//! [`code_spans`].

use regex::{Captures, Regex};
use std::ops::Range;

/// Tracks whether the current line is inside a fenced code block.
#[derive(Debug, Default)]
pub struct FenceTracker {
    fenced: Option<Fence>,
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    fence_char: char,
    fence_len: usize,
}

impl FenceTracker {
    /// Feed the next line. Returns `true` if the line belongs to a code
    /// block, opening and closing fences included.
    pub fn process(&mut self, line: &str) -> bool {
        if let Some(fence) = self.fenced {
            if is_closing_fence(line, fence) {
                self.fenced = None;
            }
            return true;
        }

        if let Some(fence) = detect_fence_start(line) {
            self.fenced = Some(fence);
            return true;
        }

        false
    }
}

fn split_indent(line: &str) -> (usize, &str) {
    let mut width = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => return (width, &line[idx..]),
        }
    }
    (width, "")
}

fn fence_run(rest: &str) -> Option<(char, usize)> {
    let first = rest.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let count = rest.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn detect_fence_start(line: &str) -> Option<Fence> {
    let (indent, rest) = split_indent(line);
    if indent > 3 {
        return None;
    }
    let (fence_char, fence_len) = fence_run(rest)?;

    // A backtick fence's info string may not contain backticks
    if fence_char == '`' && rest[fence_len..].contains('`') {
        return None;
    }

    Some(Fence { fence_char, fence_len })
}

fn is_closing_fence(line: &str, fence: Fence) -> bool {
    let (indent, rest) = split_indent(line);
    if indent > 3 {
        return false;
    }
    let rest = rest.trim_end();
    match fence_run(rest) {
        Some((c, len)) => c == fence.fence_char && len >= fence.fence_len && len == rest.len(),
        None => false,
    }
}

/// Byte ranges of inline code spans in `line`, backticks included.
///
/// A run of N backticks opens a span that is closed by the next run of
/// exactly N backticks. An unmatched run is plain text.
pub fn code_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let run_at = |start: usize| bytes[start..].iter().take_while(|&&b| b == b'`').count();

    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'`' {
            pos += 1;
            continue;
        }
        let open = run_at(pos);
        let mut probe = pos + open;
        let mut close = None;
        while probe < bytes.len() {
            if bytes[probe] == b'`' {
                let len = run_at(probe);
                if len == open {
                    close = Some(probe + len);
                    break;
                }
                probe += len;
            } else {
                probe += 1;
            }
        }
        match close {
            Some(end) => {
                spans.push(pos..end);
                pos = end;
            }
            None => pos += open,
        }
    }
    spans
}

/// Replace every match of `re` in `line` that does not touch an inline code span.
pub fn replace_outside_code(
    line: &str,
    re: &Regex,
    mut replace: impl FnMut(&Captures<'_>) -> String,
) -> String {
    let spans = code_spans(line);
    let mut out = String::with_capacity(line.len());
    let mut last = 0;

    for caps in re.captures_iter(line) {
        let Some(m) = caps.get(0) else { continue };
        if spans.iter().any(|s| s.start < m.end() && m.start() < s.end) {
            continue;
        }
        out.push_str(&line[last..m.start()]);
        out.push_str(&replace(&caps));
        last = m.end();
    }
    out.push_str(&line[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fenced_lines(text: &str) -> Vec<bool> {
        let mut tracker = FenceTracker::default();
        text.lines().map(|l| tracker.process(l)).collect()
    }

    #[test]
    fn test_backtick_fence() {
        let text = "a\n```rust\nlet x = 1;\n```\nb";
        assert_eq!(fenced_lines(text), vec![false, true, true, true, false]);
    }

    #[test]
    fn test_tilde_fence_needs_matching_char_and_length() {
        let text = "~~~~\n```\n~~~\nstill\n~~~~~\nout";
        assert_eq!(
            fenced_lines(text),
            vec![true, true, true, true, true, false]
        );
    }

    #[test]
    fn test_indented_fence_is_not_a_fence() {
        assert_eq!(fenced_lines("    ```\ntext"), vec![false, false]);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        assert_eq!(fenced_lines("```\n[^a]\n"), vec![true, true]);
    }

    #[test]
    fn test_code_spans() {
        let line = "a `b` c ``d ` e`` f `g";
        let spans: Vec<_> = code_spans(line).into_iter().map(|r| &line[r]).collect();
        assert_eq!(spans, vec!["`b`", "``d ` e``"]);
    }

    #[test]
    fn test_replace_outside_code() {
        let re = Regex::new(r"\[\^(\w+)\]").unwrap();
        let out = replace_outside_code("x[^a] `[^b]` y[^c]", &re, |c| format!("<{}>", &c[1]));
        assert_eq!(out, "x<a> `[^b]` y<c>");
    }
}
