//! Debounced, cached conversion orchestration for the live editor.
//!
//! Sits between keystrokes and the backend: coalesces bursts of input into a
//! single network call, remembers the most recent `(text, format)` result so
//! repeated conversions of unchanged input never touch the network, and
//! guarantees an older response can't overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use texnote_types::{ConversionRequest, Format};

use crate::client::{ConvertBackend, ConvertError};

/// Most-recent conversion result. Capacity is deliberately one: the editor
/// only ever re-asks for the text currently on screen.
#[derive(Debug, Clone)]
struct CacheEntry {
    source_text: String,
    format: Format,
    html: String,
}

/// Orchestrates snippet conversion with debouncing and a single-entry cache.
///
/// Superseded policy: of N `convert` calls issued within one debounce
/// window, only the last reaches the network; the others fail fast with
/// [`ConvertError::Superseded`] rather than hanging forever.
pub struct ConversionOrchestrator<B: ConvertBackend> {
    backend: Arc<B>,
    debounce: Duration,
    format: Mutex<Format>,
    cache: Mutex<Option<CacheEntry>>,
    generation: AtomicU64,
}

impl<B: ConvertBackend> ConversionOrchestrator<B> {
    pub fn new(backend: Arc<B>, debounce: Duration) -> Self {
        Self {
            backend,
            debounce,
            format: Mutex::new(Format::default()),
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// The format used when `convert` is called without an explicit one.
    pub fn format(&self) -> Format {
        *self.format.lock().unwrap()
    }

    /// Switch the active format. Clears the cache unconditionally: cached
    /// HTML is only valid for the format it was produced with.
    pub fn set_format(&self, format: Format) {
        *self.format.lock().unwrap() = format;
        self.cache.lock().unwrap().take();
        tracing::debug!(format = format.as_str(), "format changed, cache cleared");
    }

    /// Convert `source_text`, debounced. Resolves from the cache without any
    /// waiting when `(source_text, format)` matches the last result.
    pub async fn convert(
        &self,
        source_text: &str,
        format: Option<Format>,
    ) -> Result<String, ConvertError> {
        let format = format.unwrap_or_else(|| self.format());

        if let Some(html) = self.cached(source_text, format) {
            tracing::debug!(chars = source_text.len(), "cache hit, skipping conversion");
            return Ok(html);
        }

        let generation = self.bump_generation();
        tokio::time::sleep(self.debounce).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("conversion superseded during debounce window");
            return Err(ConvertError::Superseded);
        }

        self.dispatch(source_text, format, generation).await
    }

    /// Convert immediately, bypassing the debounce window. Still supersedes
    /// any pending debounced call: an explicit compile outranks live typing.
    pub async fn convert_instant(
        &self,
        source_text: &str,
        format: Option<Format>,
    ) -> Result<String, ConvertError> {
        let format = format.unwrap_or_else(|| self.format());

        if let Some(html) = self.cached(source_text, format) {
            return Ok(html);
        }

        let generation = self.bump_generation();
        self.dispatch(source_text, format, generation).await
    }

    fn cached(&self, source_text: &str, format: Format) -> Option<String> {
        let cache = self.cache.lock().unwrap();
        cache
            .as_ref()
            .filter(|entry| entry.source_text == source_text && entry.format == format)
            .map(|entry| entry.html.clone())
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn dispatch(
        &self,
        source_text: &str,
        format: Format,
        generation: u64,
    ) -> Result<String, ConvertError> {
        let request = ConversionRequest::new(source_text, format);
        let html = self.backend.convert_latex(&request).await?;

        // Only the newest call may touch shared state; a slower, older
        // response must not clobber a fresher result. Failures above leave
        // the cache untouched: stale-but-valid beats poisoned.
        if self.generation.load(Ordering::SeqCst) == generation {
            *self.format.lock().unwrap() = format;
            *self.cache.lock().unwrap() = Some(CacheEntry {
                source_text: source_text.to_string(),
                format,
                html: html.clone(),
            });
        }

        Ok(html)
    }
}
