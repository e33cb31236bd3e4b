//! HTTP client for the conversion backend.
//!
//! The backend is a black box that turns LaTeX text into HTML. Two endpoints
//! are consumed: per-snippet conversion (`/notes/convert/`) used by the live
//! editor, and whole-document Mathpix conversion (`/convert/`). Payloads are
//! deserialized into typed DTOs here at the boundary; nothing downstream
//! handles raw JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use texnote_types::{ConversionRequest, ConversionStats};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// A newer conversion request replaced this one before it reached the
    /// network. Callers treat this as "your input was debounced away",
    /// distinct from a backend failure.
    #[error("conversion superseded by newer input")]
    Superseded,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Seam between the orchestrators and the network.
///
/// The production implementation is [`HttpConvertClient`]; tests substitute
/// counting fakes.
#[async_trait]
pub trait ConvertBackend: Send + Sync {
    /// Convert a LaTeX snippet, returning the rendered HTML.
    async fn convert_latex(&self, request: &ConversionRequest) -> Result<String, ConvertError>;

    /// Convert a whole Mathpix document.
    async fn convert_mathpix(
        &self,
        text: &str,
        include_stats: bool,
    ) -> Result<MathpixResponse, ConvertError>;
}

/// Wire response for whole-document Mathpix conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct MathpixResponse {
    pub success: bool,

    #[serde(default)]
    pub html_fragment: String,

    #[serde(default)]
    pub stats: Option<ConversionStats>,

    #[serde(default)]
    pub conversion_time_ms: Option<u64>,

    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
struct ConvertLatexBody<'a> {
    latex_content: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
struct ConvertLatexResponse {
    html_content: String,
}

#[derive(Serialize)]
struct ConvertMathpixBody<'a> {
    mathpix_text: &'a str,
    include_stats: bool,
}

/// reqwest-backed implementation of [`ConvertBackend`].
pub struct HttpConvertClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpConvertClient {
    /// Build a client against `base_url` (e.g. `http://localhost:8000/api`)
    /// with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ConvertBackend for HttpConvertClient {
    async fn convert_latex(&self, request: &ConversionRequest) -> Result<String, ConvertError> {
        let body = ConvertLatexBody {
            latex_content: &request.source_text,
            format: request.format.as_str(),
        };

        tracing::debug!(
            chars = request.source_text.len(),
            format = request.format.as_str(),
            "converting LaTeX snippet"
        );

        let response = self
            .client
            .post(self.url("/notes/convert/"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConvertError::Backend(format!(
                "conversion endpoint returned {}",
                response.status()
            )));
        }

        let parsed: ConvertLatexResponse = response.json().await?;
        Ok(parsed.html_content)
    }

    async fn convert_mathpix(
        &self,
        text: &str,
        include_stats: bool,
    ) -> Result<MathpixResponse, ConvertError> {
        let body = ConvertMathpixBody {
            mathpix_text: text,
            include_stats,
        };

        tracing::debug!(chars = text.len(), include_stats, "converting Mathpix document");

        let response = self
            .client
            .post(self.url("/convert/"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConvertError::Backend(format!(
                "mathpix endpoint returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
