use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rte_core::{EditorConfig, EditorContent, content_to_html_with, html_to_content, sanitize};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Convert between editor HTML and content JSON", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor config JSON (camelCase keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize HTML and print its content tree as JSON
    Import {
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Render a content JSON document as canonical HTML
    Export {
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Strip unsafe elements and attributes from HTML
    Sanitize {
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Rewrite HTML (checkbox dialects included) into canonical editor markup
    Normalize {
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let options = config.render_options();

    let output = match cli.command {
        Commands::Import { input } => {
            let html = read_input(input.as_deref())?;
            let content = html_to_content(&sanitize(&html));
            content
                .to_json_pretty()
                .context("failed to serialize content")?
        }
        Commands::Export { input } => {
            let json = read_input(input.as_deref())?;
            let content =
                EditorContent::from_json_str(&json).context("failed to parse content JSON")?;
            content_to_html_with(&content, &options)
        }
        Commands::Sanitize { input } => sanitize(&read_input(input.as_deref())?),
        Commands::Normalize { input } => {
            let html = read_input(input.as_deref())?;
            let content = html_to_content(&sanitize(&html));
            content_to_html_with(&content, &options)
        }
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}").context("failed to write output")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = EditorConfig::from_json_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(?config, "loaded editor config");
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
