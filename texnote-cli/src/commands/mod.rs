//! CLI command implementations.

pub mod convert;
pub mod mathpix;
pub mod render;

pub use convert::convert;
pub use mathpix::mathpix;
pub use render::render;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use texnote_core::Config;

/// Load the config file if present, fall back to defaults otherwise, and
/// apply the `--endpoint` override.
pub fn load_config(path: &Path, endpoint_override: Option<&str>) -> Config {
    let mut config = if path.exists() {
        match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config, using defaults");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(endpoint) = endpoint_override {
        config.endpoint = endpoint.to_string();
    }
    config
}

/// Read input from a file, or stdin when no path is given.
pub fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

/// Write output to a file, or stdout when no path is given.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
