//! Equation-span pass: render `<span class="tiptap-katex" data-latex="...">`
//! elements produced by the structured editor.
//!
//! The `data-latex` attribute carries percent-encoded LaTeX (so braces and
//! backslashes survive attribute serialization). Each span is decoded and
//! rendered independently; a failing span is flagged visually and its
//! siblings still render.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::Typesetter;

static EQUATION_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span(?P<attrs>[^>]*class="[^"]*tiptap-katex[^"]*"[^>]*)>(?P<inner>.*?)</span>"#)
        .expect("static pattern")
});

static DATA_LATEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-latex="([^"]*)""#).expect("static pattern"));

static CLASS_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"class="([^"]*)""#).expect("static pattern"));

pub(crate) fn render_equation_spans(fragment: &str, typesetter: &Typesetter) -> String {
    let mut rendered = 0usize;
    let mut failed = 0usize;

    let out = EQUATION_SPAN.replace_all(fragment, |caps: &Captures| {
        let attrs = &caps["attrs"];
        let inner = &caps["inner"];

        let Some(encoded) = DATA_LATEX
            .captures(attrs)
            .map(|c| c.get(1).map_or("", |m| m.as_str()).to_string())
        else {
            tracing::warn!("equation span without data-latex attribute");
            return caps[0].to_string();
        };

        match render_one(&encoded, typesetter) {
            Ok(html) => {
                rendered += 1;
                format!("<span{attrs}>{html}</span>")
            }
            Err(err) => {
                failed += 1;
                tracing::warn!(error = %err, encoded = %encoded, "equation span failed to render");
                error_span(attrs, inner)
            }
        }
    });

    if rendered + failed > 0 {
        tracing::debug!(rendered, failed, "equation span pass complete");
    }
    out.into_owned()
}

fn render_one(encoded: &str, typesetter: &Typesetter) -> Result<String, String> {
    let latex = urlencoding::decode(encoded).map_err(|err| format!("bad encoding: {err}"))?;
    typesetter
        .render(&latex, false)
        .map_err(|err| err.to_string())
}

/// Keep the original content but mark the span: error class, background,
/// and a tooltip, mirroring what the editor shows for a broken equation.
fn error_span(attrs: &str, inner: &str) -> String {
    let attrs = CLASS_ATTR.replace(attrs, r#"class="$1 katex-error""#);
    format!(
        r#"<span{attrs} style="background-color:#ffcccc" title="LaTeX rendering failed">{inner}</span>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typesetter() -> Typesetter {
        Typesetter {
            error_color: "#cc0000".into(),
        }
    }

    fn span(latex_encoded: &str) -> String {
        format!(r#"<span class="tiptap-katex" data-latex="{latex_encoded}">eq</span>"#)
    }

    #[test]
    fn test_span_rendered_from_encoded_attribute() {
        // %5Cfrac%7B1%7D%7B2%7D == \frac{1}{2}
        let input = span("%5Cfrac%7B1%7D%7B2%7D");
        let out = render_equation_spans(&input, &typesetter());
        assert!(out.contains("katex"));
        assert!(!out.contains(">eq<"));
    }

    #[test]
    fn test_fault_isolation_across_siblings() {
        // Middle span decodes to invalid UTF-8 and must fail; the others
        // still render.
        let input = format!("{}{}{}", span("x%5E2"), span("%FF"), span("y%5E2"));
        let out = render_equation_spans(&input, &typesetter());

        assert_eq!(out.matches("class=\"katex\"").count(), 2);
        assert!(out.contains("katex-error"));
        assert!(out.contains("background-color:#ffcccc"));
        assert!(out.contains(r#"title="LaTeX rendering failed""#));
        // The broken span keeps its original content.
        assert!(out.contains(">eq<"));
    }

    #[test]
    fn test_span_without_data_latex_untouched() {
        let input = r#"<span class="tiptap-katex">orphan</span>"#;
        assert_eq!(render_equation_spans(input, &typesetter()), input);
    }

    #[test]
    fn test_plain_spans_ignored() {
        let input = r#"<span class="highlight" data-latex="x%5E2">text</span>"#;
        assert_eq!(render_equation_spans(input, &typesetter()), input);
    }

    #[test]
    fn test_extra_attributes_preserved() {
        let input =
            r#"<span id="eq-1" class="inline tiptap-katex" data-latex="x">x</span>"#;
        let out = render_equation_spans(&input, &typesetter());
        assert!(out.contains(r#"id="eq-1""#));
        assert!(out.contains("katex"));
    }
}
