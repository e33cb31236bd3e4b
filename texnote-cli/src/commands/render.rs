//! `texnote render` — local math rendering of an HTML fragment.

use std::path::Path;

use anyhow::{Context, Result};
use texnote_core::{Config, MathRenderer};

use super::{read_input, write_output};

pub async fn render(config: &Config, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let fragment = read_input(input)?;

    let renderer = MathRenderer::new(config.error_color.as_str());
    renderer.init().await.context("Failed to load math engine")?;

    let rendered = renderer.render(&fragment).await;
    write_output(output, &rendered)
}
