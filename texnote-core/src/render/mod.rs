//! Math rendering inside HTML fragments.
//!
//! Two independent upstream conventions are handled in two passes rather
//! than forcing the backend to normalize them:
//!
//! 1. delimiter-bounded math in text (`$...$`, `$$...$$`, `\(...\)`,
//!    `\[...\]`), the hand-typed convention;
//! 2. equation spans (`<span class="tiptap-katex" data-latex="...">`), the
//!    structured-editor convention, carrying percent-encoded LaTeX in an
//!    attribute.
//!
//! Rendering is best effort as a hard requirement: one malformed equation
//! gets an error marker and never prevents its siblings from rendering.

mod delimiters;
mod spans;

use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to load math engine: {0}")]
    EngineLoad(String),
}

/// Thin wrapper over the KaTeX engine with the fragment's render options.
#[derive(Debug, Clone)]
pub(crate) struct Typesetter {
    error_color: String,
}

impl Typesetter {
    fn new(error_color: String) -> Self {
        Self { error_color }
    }

    /// Render one expression. With `throw_on_error` off the engine already
    /// degrades malformed LaTeX to error-colored markup; a hard `Err` here
    /// means the expression could not be typeset at all.
    pub(crate) fn render(&self, latex: &str, display: bool) -> Result<String, katex::Error> {
        let opts = katex::Opts::builder()
            .display_mode(display)
            .throw_on_error(false)
            .error_color(self.error_color.clone())
            .build()
            .unwrap_or_default();
        katex::render_with_opts(latex, &opts)
    }

    /// Inline error marker for expressions the engine rejected outright.
    pub(crate) fn error_marker(&self, latex: &str) -> String {
        format!(
            r#"<span class="math-error" style="color:{}" title="LaTeX rendering failed">{}</span>"#,
            self.error_color,
            html_escape(latex)
        )
    }
}

/// Renders all math in an HTML fragment, in place.
///
/// `init` must complete before `render` does anything; calling `render`
/// early is a logged no-op, not an error.
pub struct MathRenderer {
    init: OnceCell<()>,
    typesetter: Typesetter,
}

impl MathRenderer {
    pub fn new(error_color: impl Into<String>) -> Self {
        Self {
            init: OnceCell::new(),
            typesetter: Typesetter::new(error_color.into()),
        }
    }

    /// Lazily warm the math engine. Idempotent and concurrency-safe:
    /// callers racing before first completion all await the same underlying
    /// load, and later calls resolve immediately.
    pub async fn init(&self) -> Result<(), RenderError> {
        self.init
            .get_or_try_init(|| async {
                tokio::task::spawn_blocking(|| katex::render("x").map(|_| ()))
                    .await
                    .map_err(|err| RenderError::EngineLoad(err.to_string()))?
                    .map_err(|err| RenderError::EngineLoad(err.to_string()))
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// Render every equation in `fragment` and return the rewritten HTML.
    /// A fragment with no math comes back unchanged.
    pub async fn render(&self, fragment: &str) -> String {
        if !self.is_initialized() {
            tracing::warn!("renderer not initialized, skipping render");
            return fragment.to_string();
        }

        let typesetter = self.typesetter.clone();
        let fragment = fragment.to_string();
        match tokio::task::spawn_blocking(move || render_fragment(&fragment, &typesetter)).await {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::error!(error = %err, "render task failed");
                String::new()
            }
        }
    }
}

fn render_fragment(fragment: &str, typesetter: &Typesetter) -> String {
    let pass_one = delimiters::render_delimited_math(fragment, typesetter);
    spans::render_equation_spans(&pass_one, typesetter)
}

pub(crate) fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typesetter() -> Typesetter {
        Typesetter::new("#cc0000".into())
    }

    #[tokio::test]
    async fn test_init_is_idempotent_under_concurrency() {
        let renderer = MathRenderer::new("#cc0000");
        assert!(!renderer.is_initialized());

        let (a, b, c) = tokio::join!(renderer.init(), renderer.init(), renderer.init());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert!(renderer.is_initialized());

        // Subsequent calls are no-ops that resolve immediately.
        renderer.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_render_before_init_is_a_noop() {
        let renderer = MathRenderer::new("#cc0000");
        let fragment = "<p>$x^2$</p>";
        assert_eq!(renderer.render(fragment).await, fragment);
    }

    #[tokio::test]
    async fn test_render_end_to_end() {
        let renderer = MathRenderer::new("#cc0000");
        renderer.init().await.unwrap();

        let out = renderer.render("<p>Pythagoras: $x^2+y^2=z^2$</p>").await;
        assert!(out.contains("katex"));
        assert!(!out.contains("$x^2"));
    }

    #[tokio::test]
    async fn test_render_without_math_is_unchanged() {
        let renderer = MathRenderer::new("#cc0000");
        renderer.init().await.unwrap();

        let fragment = "<p>plain prose, no equations</p>";
        assert_eq!(renderer.render(fragment).await, fragment);
    }

    #[test]
    fn test_typesetter_contains_malformed_input() {
        let ts = typesetter();
        // With throw_on_error off the engine degrades gracefully; either
        // path must produce output rather than panicking.
        match ts.render(r"\frac{1}{", false) {
            Ok(html) => assert!(!html.is_empty()),
            Err(_) => {
                let marker = ts.error_marker(r"\frac{1}{");
                assert!(marker.contains("math-error"));
            }
        }
    }
}
