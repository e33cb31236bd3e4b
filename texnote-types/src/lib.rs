//! Shared types for texnote
//!
//! This crate provides the value types passed between the conversion
//! orchestrators, the HTTP client, and the editor: rendering formats,
//! conversion requests/results, and Mathpix conversion outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering format negotiated with the conversion backend.
///
/// `Katex` produces markup meant for browser display with KaTeX CSS;
/// `PlainHtml` produces sanitized HTML safe to paste into LMS rich-text
/// editors that cannot run a math library at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Katex,
    PlainHtml,
}

impl Format {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "katex" => Some(Format::Katex),
            "plain_html" | "plain-html" => Some(Format::PlainHtml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Katex => "katex",
            Format::PlainHtml => "plain_html",
        }
    }
}

/// One conversion attempt: source text plus the format it should be
/// rendered in. Immutable; a new value is built per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source_text: String,
    pub format: Format,
}

impl ConversionRequest {
    pub fn new(source_text: impl Into<String>, format: Format) -> Self {
        Self {
            source_text: source_text.into(),
            format,
        }
    }
}

/// Structural statistics reported by the Mathpix conversion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConversionStats {
    pub total_equations: u32,
    pub display_equations: u32,
    pub inline_equations: u32,
    pub sections: u32,
    pub words: u32,
    pub characters: u32,
}

impl ConversionStats {
    /// The backend is expected to uphold `total = display + inline`.
    /// Not enforced on receipt, but checkable.
    pub fn is_consistent(&self) -> bool {
        self.total_equations == self.display_equations + self.inline_equations
    }
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Equations: {} ({} display, {} inline) | Sections: {} | Words: {} | Chars: {}",
            self.total_equations,
            self.display_equations,
            self.inline_equations,
            self.sections,
            self.words,
            self.characters
        )
    }
}

/// Why a Mathpix conversion did not produce HTML.
///
/// Input and busy rejections are expected conditions the UI distinguishes
/// from a broken backend, so they get their own variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathpixError {
    EmptyInput,
    Busy,
    Backend(String),
}

impl fmt::Display for MathpixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathpixError::EmptyInput => write!(f, "Input text is empty"),
            MathpixError::Busy => write!(f, "Conversion already in progress"),
            MathpixError::Backend(msg) => write!(f, "{msg}"),
        }
    }
}

/// Outcome of a whole-document Mathpix conversion.
///
/// Failure is data rather than an error type: callers branch on
/// success/failure uniformly instead of catching exceptions.
#[derive(Debug, Clone, PartialEq)]
pub enum MathpixConversion {
    Success {
        html_fragment: String,
        stats: Option<ConversionStats>,
        conversion_time_ms: u64,
    },
    Failure {
        error: MathpixError,
        conversion_time_ms: u64,
    },
}

impl MathpixConversion {
    pub fn failure(error: MathpixError, conversion_time_ms: u64) -> Self {
        MathpixConversion::Failure {
            error,
            conversion_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MathpixConversion::Success { .. })
    }

    pub fn html_fragment(&self) -> Option<&str> {
        match self {
            MathpixConversion::Success { html_fragment, .. } => Some(html_fragment),
            MathpixConversion::Failure { .. } => None,
        }
    }

    pub fn stats(&self) -> Option<&ConversionStats> {
        match self {
            MathpixConversion::Success { stats, .. } => stats.as_ref(),
            MathpixConversion::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&MathpixError> {
        match self {
            MathpixConversion::Success { .. } => None,
            MathpixConversion::Failure { error, .. } => Some(error),
        }
    }

    pub fn conversion_time_ms(&self) -> u64 {
        match self {
            MathpixConversion::Success {
                conversion_time_ms, ..
            }
            | MathpixConversion::Failure {
                conversion_time_ms, ..
            } => *conversion_time_ms,
        }
    }
}

/// A note as the editor sees it: LaTeX source, the last compiled HTML
/// (if any), and the format that HTML was produced with.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Note {
    #[serde(default)]
    pub id: Option<u64>,

    pub title: String,

    pub latex_content: String,

    #[serde(default)]
    pub html_content: Option<String>,

    #[serde(default)]
    pub format: Format,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_round_trip() {
        assert_eq!(Format::from_str("katex"), Some(Format::Katex));
        assert_eq!(Format::from_str("plain_html"), Some(Format::PlainHtml));
        assert_eq!(Format::from_str("plain-html"), Some(Format::PlainHtml));
        assert_eq!(Format::from_str("pdf"), None);
        assert_eq!(Format::Katex.as_str(), "katex");
        assert_eq!(Format::PlainHtml.as_str(), "plain_html");
    }

    #[test]
    fn test_stats_consistency() {
        let stats = ConversionStats {
            total_equations: 5,
            display_equations: 2,
            inline_equations: 3,
            ..Default::default()
        };
        assert!(stats.is_consistent());

        let broken = ConversionStats {
            total_equations: 4,
            ..stats
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_stats_display_line() {
        let stats = ConversionStats {
            total_equations: 3,
            display_equations: 1,
            inline_equations: 2,
            sections: 4,
            words: 120,
            characters: 800,
        };
        let line = stats.to_string();
        assert!(line.contains("Equations: 3 (1 display, 2 inline)"));
        assert!(line.contains("Sections: 4"));
        assert!(line.contains("Words: 120"));
    }

    #[test]
    fn test_mathpix_error_messages() {
        assert_eq!(MathpixError::EmptyInput.to_string(), "Input text is empty");
        assert_eq!(
            MathpixError::Busy.to_string(),
            "Conversion already in progress"
        );
        assert_eq!(
            MathpixError::Backend("boom".into()).to_string(),
            "boom"
        );
    }

    #[test]
    fn test_mathpix_conversion_accessors() {
        let ok = MathpixConversion::Success {
            html_fragment: "<p>x</p>".into(),
            stats: None,
            conversion_time_ms: 12,
        };
        assert!(ok.is_success());
        assert_eq!(ok.html_fragment(), Some("<p>x</p>"));
        assert_eq!(ok.conversion_time_ms(), 12);

        let failed = MathpixConversion::failure(MathpixError::EmptyInput, 0);
        assert!(!failed.is_success());
        assert_eq!(failed.html_fragment(), None);
        assert_eq!(failed.error(), Some(&MathpixError::EmptyInput));
    }
}
