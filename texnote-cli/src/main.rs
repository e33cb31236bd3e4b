//! # texnote CLI
//!
//! Command-line interface for the texnote LaTeX/Mathpix → HTML converter.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use texnote_types::Format;

#[derive(Parser)]
#[command(name = "texnote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "texnote.yml")]
    config: PathBuf,

    /// Override the backend endpoint from the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert LaTeX to HTML via the backend
    Convert {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        /// Rendering format
        #[arg(long, value_enum, default_value_t = FormatArg::Katex)]
        format: FormatArg,

        /// Render math locally into the returned HTML
        #[arg(long)]
        render: bool,

        /// Copy the result to the clipboard
        #[arg(long)]
        copy: bool,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Convert a Mathpix-exported document to an LMS-ready HTML fragment
    Mathpix {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        /// Include structural statistics
        #[arg(long)]
        stats: bool,

        /// Copy the fragment to the clipboard
        #[arg(long)]
        copy: bool,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render math in an HTML fragment locally (no backend)
    Render {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Katex,
    PlainHtml,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Katex => Format::Katex,
            FormatArg::PlainHtml => Format::PlainHtml,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = commands::load_config(&cli.config, cli.endpoint.as_deref());

    match cli.command {
        Commands::Convert {
            input,
            format,
            render,
            copy,
            output,
        } => {
            commands::convert(
                &config,
                input.as_deref(),
                format.into(),
                render,
                copy,
                output.as_deref(),
            )
            .await
        }
        Commands::Mathpix {
            input,
            stats,
            copy,
            output,
        } => commands::mathpix(&config, input.as_deref(), stats, copy, output.as_deref()).await,
        Commands::Render { input, output } => {
            commands::render(&config, input.as_deref(), output.as_deref()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
