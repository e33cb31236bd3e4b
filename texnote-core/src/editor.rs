//! Editing session coordination.
//!
//! Ties the pieces together for one open note: live-typing conversion via
//! the orchestrator, format toggling, preview rendering, clipboard exports,
//! and debounced autosave through a persistence collaborator. Persistence
//! itself is external; only the [`NoteStore`] seam lives here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use texnote_types::{Format, Note};

use crate::client::{ConvertBackend, ConvertError};
use crate::clipboard::{ClipboardGateway, CopyResult};
use crate::orchestrator::ConversionOrchestrator;
use crate::render::MathRenderer;

/// Persistence collaborator. The CRUD note API is out of scope; the editor
/// only needs "save this".
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn save(&self, note: &Note) -> anyhow::Result<()>;
}

/// One editing session over one note.
pub struct EditorSession<B: ConvertBackend> {
    orchestrator: ConversionOrchestrator<B>,
    renderer: Arc<MathRenderer>,
    clipboard: Arc<ClipboardGateway>,
    store: Arc<dyn NoteStore>,
    note: Mutex<Note>,
    autosave_delay: Duration,
    autosave_generation: AtomicU64,
}

impl<B: ConvertBackend + 'static> EditorSession<B> {
    pub fn new(
        orchestrator: ConversionOrchestrator<B>,
        renderer: Arc<MathRenderer>,
        clipboard: Arc<ClipboardGateway>,
        store: Arc<dyn NoteStore>,
        note: Note,
        autosave_delay: Duration,
    ) -> Arc<Self> {
        let format = note.format;
        let session = Arc::new(Self {
            orchestrator,
            renderer,
            clipboard,
            store,
            note: Mutex::new(note),
            autosave_delay,
            autosave_generation: AtomicU64::new(0),
        });
        session.orchestrator.set_format(format);
        session
    }

    pub fn note(&self) -> Note {
        self.note.lock().unwrap().clone()
    }

    pub fn format(&self) -> Format {
        self.orchestrator.format()
    }

    /// Apply a keystroke's worth of new source text. Conversion is
    /// debounced; a superseded call returns [`ConvertError::Superseded`] and
    /// leaves the note's HTML untouched. On success the note is updated and
    /// an autosave is scheduled.
    pub async fn update_text(self: &Arc<Self>, text: &str) -> Result<String, ConvertError> {
        {
            let mut note = self.note.lock().unwrap();
            note.latex_content = text.to_string();
        }

        let html = self.orchestrator.convert(text, None).await?;
        self.apply_html(&html);
        self.schedule_autosave();
        Ok(html)
    }

    /// Toggle the rendering format and re-run the pipeline on the current
    /// text without requiring new input.
    pub async fn set_format(self: &Arc<Self>, format: Format) -> Result<String, ConvertError> {
        self.orchestrator.set_format(format);
        {
            let mut note = self.note.lock().unwrap();
            note.format = format;
        }

        let text = self.note.lock().unwrap().latex_content.clone();
        let html = self.orchestrator.convert_instant(&text, Some(format)).await?;
        self.apply_html(&html);
        self.schedule_autosave();
        Ok(html)
    }

    /// Explicit "compile now": bypasses the debounce window.
    pub async fn compile_now(self: &Arc<Self>) -> Result<String, ConvertError> {
        let text = self.note.lock().unwrap().latex_content.clone();
        let html = self.orchestrator.convert_instant(&text, None).await?;
        self.apply_html(&html);
        self.schedule_autosave();
        Ok(html)
    }

    /// Render math in the current compiled HTML for display.
    pub async fn preview(&self) -> Option<String> {
        let html = self.note.lock().unwrap().html_content.clone()?;
        Some(self.renderer.render(&html).await)
    }

    pub async fn copy_latex(&self) -> CopyResult {
        let text = self.note.lock().unwrap().latex_content.clone();
        self.clipboard.copy_text(&text, "LaTeX").await
    }

    pub async fn copy_html(&self) -> CopyResult {
        let html = self.note.lock().unwrap().html_content.clone();
        match html {
            Some(html) if !html.is_empty() => {
                let plain = html.clone();
                self.clipboard.copy_html(&html, &plain, "HTML").await
            }
            _ => CopyResult {
                success: false,
                message: String::from("Nothing compiled yet"),
                error: Some(String::from("Empty content")),
            },
        }
    }

    fn apply_html(&self, html: &str) {
        let mut note = self.note.lock().unwrap();
        note.html_content = Some(html.to_string());
    }

    /// Debounced autosave: each edit resets the timer; only the newest
    /// scheduled save reaches the store.
    fn schedule_autosave(self: &Arc<Self>) {
        let generation = self.autosave_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(session.autosave_delay).await;
            if session.autosave_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let note = session.note();
            if let Err(err) = session.store.save(&note).await {
                tracing::warn!(error = %err, "autosave failed");
            } else {
                tracing::debug!(title = %note.title, "autosaved note");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MathpixResponse;
    use std::sync::atomic::AtomicUsize;
    use texnote_types::ConversionRequest;

    struct EchoBackend;

    #[async_trait]
    impl ConvertBackend for EchoBackend {
        async fn convert_latex(
            &self,
            request: &ConversionRequest,
        ) -> Result<String, ConvertError> {
            Ok(format!(
                "<p data-format=\"{}\">{}</p>",
                request.format.as_str(),
                request.source_text
            ))
        }

        async fn convert_mathpix(
            &self,
            _text: &str,
            _include_stats: bool,
        ) -> Result<MathpixResponse, ConvertError> {
            unimplemented!("not used by the editor")
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saves: AtomicUsize,
        last: Mutex<Option<Note>>,
    }

    #[async_trait]
    impl NoteStore for RecordingStore {
        async fn save(&self, note: &Note) -> anyhow::Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(note.clone());
            Ok(())
        }
    }

    fn session(store: Arc<RecordingStore>) -> Arc<EditorSession<EchoBackend>> {
        let orchestrator =
            ConversionOrchestrator::new(Arc::new(EchoBackend), Duration::from_millis(800));
        EditorSession::new(
            orchestrator,
            Arc::new(MathRenderer::new("#cc0000")),
            Arc::new(ClipboardGateway::with_tiers(vec![])),
            store,
            Note {
                title: String::from("scratch"),
                latex_content: String::new(),
                ..Note::default()
            },
            Duration::from_millis(2000),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_text_converts_and_autosaves() {
        let store = Arc::new(RecordingStore::default());
        let session = session(store.clone());

        let html = session.update_text("$x$").await.unwrap();
        assert!(html.contains("$x$"));
        assert_eq!(session.note().html_content.as_deref(), Some(html.as_str()));

        // Let the autosave timer fire.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        let saved = store.last.lock().unwrap().clone().unwrap();
        assert_eq!(saved.latex_content, "$x$");
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_coalesces_rapid_edits() {
        let store = Arc::new(RecordingStore::default());
        let session = session(store.clone());

        session.compile_now().await.unwrap();
        session.compile_now().await.unwrap();
        session.compile_now().await.unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_format_toggle_reconverts_same_text() {
        let store = Arc::new(RecordingStore::default());
        let session = session(store.clone());

        session.update_text("$x$").await.unwrap();
        let html = session.set_format(Format::PlainHtml).await.unwrap();

        assert!(html.contains("plain_html"));
        assert_eq!(session.format(), Format::PlainHtml);
        assert_eq!(session.note().format, Format::PlainHtml);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preview_renders_current_html() {
        let store = Arc::new(RecordingStore::default());
        let session = session(store);

        assert!(session.preview().await.is_none());

        let html = session.update_text("$x$").await.unwrap();
        // Renderer is uninitialized here, so preview passes the HTML
        // through unchanged rather than erroring.
        assert_eq!(session.preview().await.as_deref(), Some(html.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_latex_failure_is_data() {
        let store = Arc::new(RecordingStore::default());
        let session = session(store);

        session.update_text("$x$").await.unwrap();
        // No clipboard tiers configured: failure comes back as data.
        let result = session.copy_latex().await;
        assert!(!result.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_html_before_compile_fails_as_data() {
        let store = Arc::new(RecordingStore::default());
        let session = session(store);

        let result = session.copy_html().await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Empty content"));
    }
}
