//! Delimiter pass: render `$...$` / `$$...$$` / `\(...\)` / `\[...\]`
//! found in text between tags.
//!
//! The scanner walks the fragment tag-by-tag so math inside attributes is
//! never touched, and skips the interiors of code-like elements and of
//! equation spans (those belong to the span pass).

use super::Typesetter;

/// Element names whose text content is never scanned for math.
const IGNORED_TAGS: &[&str] = &["code", "pre", "script", "style", "textarea"];

struct Delimiter {
    open: &'static str,
    close: &'static str,
    display: bool,
}

/// Ordered longest-first so `$$` wins over `$` at the same position.
const DELIMITERS: &[Delimiter] = &[
    Delimiter {
        open: "$$",
        close: "$$",
        display: true,
    },
    Delimiter {
        open: r"\[",
        close: r"\]",
        display: true,
    },
    Delimiter {
        open: r"\(",
        close: r"\)",
        display: false,
    },
    Delimiter {
        open: "$",
        close: "$",
        display: false,
    },
];

pub(crate) fn render_delimited_math(fragment: &str, typesetter: &Typesetter) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut skip_stack: Vec<String> = Vec::new();
    let mut rest = fragment;

    while !rest.is_empty() {
        match rest.find('<') {
            Some(tag_start) => {
                let text = &rest[..tag_start];
                push_text(&mut out, text, &skip_stack, typesetter);

                let tag_end = match rest[tag_start..].find('>') {
                    Some(offset) => tag_start + offset + 1,
                    // Unterminated tag: emit the remainder untouched.
                    None => {
                        out.push_str(&rest[tag_start..]);
                        return out;
                    }
                };
                let tag = &rest[tag_start..tag_end];
                track_skip_state(tag, &mut skip_stack);
                out.push_str(tag);
                rest = &rest[tag_end..];
            }
            None => {
                push_text(&mut out, rest, &skip_stack, typesetter);
                return out;
            }
        }
    }

    out
}

fn push_text(out: &mut String, text: &str, skip_stack: &[String], typesetter: &Typesetter) {
    if text.is_empty() {
        return;
    }
    if skip_stack.is_empty() {
        out.push_str(&render_text(text, typesetter));
    } else {
        out.push_str(text);
    }
}

fn track_skip_state(tag: &str, skip_stack: &mut Vec<String>) {
    let body = tag.trim_start_matches('<').trim_end_matches('>');
    let closing = body.starts_with('/');
    let self_closing = body.ends_with('/') && !closing;
    let name: String = body
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if name.is_empty() || self_closing {
        return;
    }

    if closing {
        if skip_stack.last() == Some(&name) {
            skip_stack.pop();
        }
        return;
    }

    // Equation-span interiors hold raw LaTeX that the span pass owns.
    if IGNORED_TAGS.contains(&name.as_str()) || tag.contains("data-latex") {
        skip_stack.push(name);
    }
}

/// Replace every delimiter-bounded expression in a text run with rendered
/// math. Unclosed delimiters are emitted literally.
fn render_text(text: &str, typesetter: &Typesetter) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some((pos, delim)) = find_opener(rest) {
        let after_open = pos + delim.open.len();
        match find_closer(&rest[after_open..], delim) {
            Some(close_pos) => {
                out.push_str(&rest[..pos]);
                let latex = &rest[after_open..after_open + close_pos];
                out.push_str(&render_expression(latex, delim.display, typesetter));
                rest = &rest[after_open + close_pos + delim.close.len()..];
            }
            None => {
                // No closer: keep the opener as literal text.
                out.push_str(&rest[..after_open]);
                rest = &rest[after_open..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn find_opener(text: &str) -> Option<(usize, &'static Delimiter)> {
    let mut best: Option<(usize, &'static Delimiter)> = None;
    for delim in DELIMITERS {
        if let Some(pos) = find_unescaped(text, delim.open) {
            // Strictly earlier wins; on a tie the longest delimiter (listed
            // first) keeps priority, so `$$` beats `$`.
            if best.map_or(true, |(b, _)| pos < b) {
                best = Some((pos, delim));
            }
        }
    }
    best
}

fn find_closer(text: &str, delim: &Delimiter) -> Option<usize> {
    let pos = find_unescaped(text, delim.close)?;
    // Reject empty math like `$$` produced by adjacent single dollars.
    if pos == 0 && delim.open == delim.close {
        return None;
    }
    Some(pos)
}

/// First occurrence of `needle` not preceded by a backslash (so `\$` stays
/// literal text).
fn find_unescaped(text: &str, needle: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = text[offset..].find(needle) {
        let pos = offset + found;
        let escaped = needle == "$" && text[..pos].ends_with('\\');
        if !escaped {
            return Some(pos);
        }
        offset = pos + needle.len();
    }
    None
}

fn render_expression(latex: &str, display: bool, typesetter: &Typesetter) -> String {
    let latex = decode_entities(latex);
    match typesetter.render(&latex, display) {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!(error = %err, latex = %latex, "equation failed to render");
            typesetter.error_marker(&latex)
        }
    }
}

/// Text runs in an HTML fragment carry entity-encoded characters that the
/// engine expects raw.
fn decode_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
