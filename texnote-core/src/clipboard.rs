//! Clipboard access with tiered fallback.
//!
//! Clipboard reliability varies wildly across platforms and display servers,
//! so failures here are ordinary data, never errors: every copy attempt
//! returns a [`CopyResult`] and callers show inline feedback without any
//! error-handling boilerplate. The gateway tries `arboard` first and falls
//! back to the platform copy utility (`wl-copy`/`xclip`/`pbcopy`).

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};

/// Outcome of one copy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyResult {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

impl CopyResult {
    fn copied(label: &str, chars: usize, as_html: bool) -> Self {
        let suffix = if as_html { " as HTML" } else { "" };
        Self {
            success: true,
            message: format!("{label} copied to clipboard{suffix} ({chars} characters)"),
            error: None,
        }
    }

    fn failed(message: &str, error: impl ToString) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// One way of talking to the system clipboard. Tiers are tried in order;
/// tests substitute fakes.
pub trait ClipboardBackend: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
    fn write_html(&self, html: &str, alt_text: &str) -> Result<()>;
    fn read_text(&self) -> Result<String>;
}

/// Primary tier: the `arboard` native clipboard.
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard.set_text(text).context("clipboard write failed")?;
        Ok(())
    }

    fn write_html(&self, html: &str, alt_text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard
            .set_html(html, Some(alt_text))
            .context("clipboard HTML write failed")?;
        Ok(())
    }

    fn read_text(&self) -> Result<String> {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard.get_text().context("clipboard read failed")
    }
}

/// Fallback tier: pipe through the platform copy utility.
pub struct CommandClipboard;

impl CommandClipboard {
    #[cfg(target_os = "macos")]
    const WRITERS: &'static [&'static [&'static str]] = &[&["pbcopy"]];
    #[cfg(target_os = "macos")]
    const READERS: &'static [&'static [&'static str]] = &[&["pbpaste"]];

    #[cfg(not(target_os = "macos"))]
    const WRITERS: &'static [&'static [&'static str]] =
        &[&["wl-copy"], &["xclip", "-selection", "clipboard"]];
    #[cfg(not(target_os = "macos"))]
    const READERS: &'static [&'static [&'static str]] = &[
        &["wl-paste", "--no-newline"],
        &["xclip", "-selection", "clipboard", "-o"],
    ];

    fn pipe_to(cmd: &[&str], input: &str) -> Result<()> {
        let mut child = Command::new(cmd[0])
            .args(&cmd[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", cmd[0]))?;

        child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("no stdin for {}", cmd[0]))?
            .write_all(input.as_bytes())
            .with_context(|| format!("failed to write to {}", cmd[0]))?;

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("{} exited with {status}", cmd[0]))
        }
    }
}

impl ClipboardBackend for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut last_err = anyhow!("no copy utility available");
        for cmd in Self::WRITERS {
            match Self::pipe_to(cmd, text) {
                Ok(()) => return Ok(()),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }

    fn write_html(&self, html: &str, _alt_text: &str) -> Result<()> {
        // Copy utilities carry plain text only.
        self.write_text(html)
    }

    fn read_text(&self) -> Result<String> {
        let mut last_err = anyhow!("no paste utility available");
        for cmd in Self::READERS {
            match Command::new(cmd[0]).args(&cmd[1..]).output() {
                Ok(output) if output.status.success() => {
                    return String::from_utf8(output.stdout).context("clipboard is not UTF-8");
                }
                Ok(output) => last_err = anyhow!("{} exited with {}", cmd[0], output.status),
                Err(err) => last_err = err.into(),
            }
        }
        Err(last_err)
    }
}

/// Copies text or HTML to the system clipboard, trying each tier in order.
pub struct ClipboardGateway {
    tiers: Vec<Box<dyn ClipboardBackend>>,
}

impl Default for ClipboardGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardGateway {
    pub fn new() -> Self {
        Self {
            tiers: vec![Box::new(SystemClipboard), Box::new(CommandClipboard)],
        }
    }

    pub fn with_tiers(tiers: Vec<Box<dyn ClipboardBackend>>) -> Self {
        Self { tiers }
    }

    /// Copy plain text. `label` names the payload in user-facing messages.
    pub async fn copy_text(&self, text: &str, label: &str) -> CopyResult {
        if text.is_empty() {
            return CopyResult::failed("No text provided", "Empty content");
        }

        let mut last_err = String::from("no clipboard backend configured");
        for tier in &self.tiers {
            match tier.write_text(text) {
                Ok(()) => {
                    tracing::debug!(chars = text.len(), label, "copied text to clipboard");
                    return CopyResult::copied(label, text.len(), false);
                }
                Err(err) => {
                    tracing::warn!(error = %err, label, "clipboard tier failed, trying next");
                    last_err = err.to_string();
                }
            }
        }
        CopyResult::failed("Failed to copy to clipboard", last_err)
    }

    /// Copy HTML with a plain-text fallback payload. As long as either
    /// payload is non-empty, some copy attempt is always made.
    pub async fn copy_html(&self, html: &str, plain_text: &str, label: &str) -> CopyResult {
        if html.is_empty() && plain_text.is_empty() {
            return CopyResult::failed("No content provided", "Empty content");
        }
        if html.is_empty() {
            return self.copy_text(plain_text, label).await;
        }

        for tier in &self.tiers {
            match tier.write_html(html, plain_text) {
                Ok(()) => {
                    tracing::debug!(chars = html.len(), label, "copied HTML to clipboard");
                    return CopyResult::copied(label, html.len(), true);
                }
                Err(err) => {
                    tracing::warn!(error = %err, label, "HTML copy failed, trying next tier");
                }
            }
        }

        // Every HTML tier failed; degrade to plain text.
        self.copy_text(plain_text, label).await
    }

    /// Read the clipboard. `None` on any failure: read permission problems
    /// are expected, not exceptional.
    pub async fn clipboard_content(&self) -> Option<String> {
        for tier in &self.tiers {
            match tier.read_text() {
                Ok(text) => return Some(text),
                Err(err) => tracing::debug!(error = %err, "clipboard read failed"),
            }
        }
        None
    }
}
