//! `texnote mathpix` — whole-document Mathpix conversion.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use texnote_core::{
    validate_mathpix_text, ClipboardGateway, Config, HttpConvertClient, MathpixConverter,
};
use texnote_types::MathpixConversion;

use super::{read_input, write_output};

pub async fn mathpix(
    config: &Config,
    input: Option<&Path>,
    stats: bool,
    copy: bool,
    output: Option<&Path>,
) -> Result<()> {
    let text = read_input(input)?;

    if !validate_mathpix_text(&text) {
        tracing::warn!("input does not look like LaTeX, converting anyway");
    }

    let client = Arc::new(
        HttpConvertClient::new(config.endpoint.as_str(), config.timeout())
            .context("Failed to build HTTP client")?,
    );
    let converter = MathpixConverter::new(client);

    match converter.convert_mathpix(&text, stats).await {
        MathpixConversion::Success {
            html_fragment,
            stats,
            conversion_time_ms,
        } => {
            eprintln!("Converted in {conversion_time_ms} ms");
            if let Some(stats) = stats {
                eprintln!("{stats}");
            }

            if copy {
                let clipboard = ClipboardGateway::new();
                let result = clipboard
                    .copy_html(&html_fragment, &html_fragment, "HTML Fragment")
                    .await;
                eprintln!("{}", result.message);
            }

            write_output(output, &html_fragment)
        }
        MathpixConversion::Failure { error, .. } => Err(anyhow!("Conversion failed: {error}")),
    }
}
