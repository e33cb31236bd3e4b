//! Whole-document Mathpix conversion.
//!
//! Unlike the live-typing orchestrator this runs on an explicit user action,
//! so there is no debouncing; instead a single-flight guard turns concurrent
//! callers away synchronously. All failures are returned as data
//! ([`MathpixConversion::Failure`]), never as `Err`, so callers branch on a
//! uniform success/failure value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use texnote_types::{MathpixConversion, MathpixError};

use crate::client::ConvertBackend;
use crate::clipboard::{ClipboardGateway, CopyResult};

/// Heuristics for "does this look like LaTeX". UI hinting only; never used
/// to block a conversion.
static LATEX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\$.*?\$",      // inline math
        r"\$\$.*?\$\$",  // display math
        r"\\section",    // sections
        r"\\textbf",     // text formatting
        r"\\frac",       // fractions
        r"\\[a-zA-Z]+",  // any command
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Single-flight converter for Mathpix-exported documents.
///
/// State machine: Idle → Converting → {Succeeded, Failed} → Idle. There is
/// no queue; a second caller during Converting is rejected outright.
pub struct MathpixConverter<B: ConvertBackend> {
    backend: Arc<B>,
    converting: AtomicBool,
    last_conversion: Mutex<Option<MathpixConversion>>,
}

/// Releases the single-flight guard on every exit path.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<B: ConvertBackend> MathpixConverter<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            converting: AtomicBool::new(false),
            last_conversion: Mutex::new(None),
        }
    }

    /// Convert `text` to an LMS-compatible HTML fragment, optionally with
    /// structural statistics.
    pub async fn convert_mathpix(&self, text: &str, include_stats: bool) -> MathpixConversion {
        if text.trim().is_empty() {
            return MathpixConversion::failure(MathpixError::EmptyInput, 0);
        }

        // Single compare-and-swap decides the winner; two callers can never
        // both observe "not converting".
        if self
            .converting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("conversion already in progress, rejecting");
            return MathpixConversion::failure(MathpixError::Busy, 0);
        }
        let _guard = FlightGuard(&self.converting);

        let start = Instant::now();
        tracing::debug!(chars = text.len(), include_stats, "starting Mathpix conversion");

        let elapsed_ms = |start: Instant| start.elapsed().as_millis() as u64;

        match self.backend.convert_mathpix(text, include_stats).await {
            Ok(response) if response.success => {
                let result = MathpixConversion::Success {
                    html_fragment: response.html_fragment,
                    stats: response.stats,
                    conversion_time_ms: response
                        .conversion_time_ms
                        .unwrap_or_else(|| elapsed_ms(start)),
                };
                tracing::debug!(
                    ms = result.conversion_time_ms(),
                    "Mathpix conversion succeeded"
                );
                *self.last_conversion.lock().unwrap() = Some(result.clone());
                result
            }
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| String::from("Unknown error during conversion"));
                tracing::warn!(error = %message, "Mathpix conversion failed");
                MathpixConversion::failure(MathpixError::Backend(message), elapsed_ms(start))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Mathpix conversion transport error");
                MathpixConversion::failure(
                    MathpixError::Backend(format!("Conversion failed: {err}")),
                    elapsed_ms(start),
                )
            }
        }
    }

    /// The most recent successful conversion, if any.
    pub fn last_conversion(&self) -> Option<MathpixConversion> {
        self.last_conversion.lock().unwrap().clone()
    }

    /// Discard the last-conversion memory.
    pub fn clear_cache(&self) {
        self.last_conversion.lock().unwrap().take();
        tracing::debug!("last conversion cleared");
    }

    /// Whether a conversion is in flight right now.
    pub fn is_converting(&self) -> bool {
        self.converting.load(Ordering::SeqCst)
    }

    /// Copy the last converted HTML fragment to the clipboard.
    pub async fn copy_html_fragment(&self, clipboard: &ClipboardGateway) -> CopyResult {
        let fragment = self
            .last_conversion()
            .and_then(|c| c.html_fragment().map(str::to_string));

        match fragment {
            Some(html) if !html.is_empty() => {
                clipboard.copy_html(&html, &html, "HTML Fragment").await
            }
            _ => CopyResult {
                success: false,
                message: String::from("No HTML fragment to copy. Convert first."),
                error: Some(String::from("Empty content")),
            },
        }
    }
}

/// Check whether `text` contains recognizable LaTeX patterns.
pub fn validate_mathpix_text(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    LATEX_PATTERNS.iter().any(|p| p.is_match(text))
}
