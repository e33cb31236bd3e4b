//! `texnote convert` — snippet conversion through the backend.

use std::path::Path;

use anyhow::{Context, Result};
use texnote_core::{ClipboardGateway, Config, ConvertBackend, HttpConvertClient, MathRenderer};
use texnote_types::{ConversionRequest, Format};

use super::{read_input, write_output};

pub async fn convert(
    config: &Config,
    input: Option<&Path>,
    format: Format,
    render: bool,
    copy: bool,
    output: Option<&Path>,
) -> Result<()> {
    let latex = read_input(input)?;
    let client = HttpConvertClient::new(config.endpoint.as_str(), config.timeout())
        .context("Failed to build HTTP client")?;

    let request = ConversionRequest::new(latex.trim_end(), format);
    let mut html = client
        .convert_latex(&request)
        .await
        .context("Conversion failed")?;

    if render {
        let renderer = MathRenderer::new(config.error_color.as_str());
        renderer.init().await.context("Failed to load math engine")?;
        html = renderer.render(&html).await;
    }

    if copy {
        let clipboard = ClipboardGateway::new();
        let result = clipboard.copy_html(&html, &html, "HTML").await;
        if result.success {
            eprintln!("{}", result.message);
        } else {
            tracing::warn!(error = ?result.error, "clipboard copy failed");
            eprintln!("{}", result.message);
        }
    }

    write_output(output, &html)
}
