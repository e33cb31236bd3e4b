//! # texnote-core
//!
//! Core library for the texnote LaTeX/Mathpix → HTML conversion pipeline.
//!
//! This crate provides the conversion client, the debounced/cached
//! orchestrators, the math renderer, and the clipboard gateway that the CLI
//! and editor surfaces build on.

pub mod client;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod mathpix;
pub mod orchestrator;
pub mod render;

pub use client::{ConvertBackend, ConvertError, HttpConvertClient, MathpixResponse};
pub use clipboard::{ClipboardBackend, ClipboardGateway, CopyResult};
pub use config::{Config, ConfigError};
pub use editor::{EditorSession, NoteStore};
pub use mathpix::{validate_mathpix_text, MathpixConverter};
pub use orchestrator::ConversionOrchestrator;
pub use render::{MathRenderer, RenderError};
