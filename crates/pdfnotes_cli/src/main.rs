//! Terminal front-end for the review workflow.
//!
//! # Responsibility
//! - Present one local PDF for extraction and print the review projection.
//! - Run the requested exports one after another into the download directory.

use anyhow::{bail, Context, Result};
use clap::Parser;
use pdfnotes_core::{
    init_logging, ClientConfig, DirectorySink, ExportFormat, ExportOutcome, HttpBackend,
    IngestionOutcome, PresentedFile, ReviewSession, ReviewView,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "pdfnotes",
    version,
    about = "Review and re-export highlights and notes from an annotated PDF"
)]
struct Cli {
    /// Annotated PDF to extract.
    file: PathBuf,

    /// Export format to produce after review (txt, docx, pdf). Repeatable.
    #[arg(short, long = "export", value_name = "FORMAT")]
    exports: Vec<String>,

    /// Backend origin, e.g. http://localhost:8000.
    #[arg(long)]
    api_url: Option<String>,

    /// Directory receiving exported files.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// TOML config file.
    #[arg(long, env = "PDFNOTES_CONFIG")]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, env = "PDFNOTES_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print long notes in full.
    #[arg(long)]
    expand: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Some(log_dir) = &cli.log_dir {
        init_logging(&config.log_level, log_dir)
            .map_err(anyhow::Error::msg)
            .context("failed to initialize logging")?;
    }

    let formats = cli
        .exports
        .iter()
        .map(|value| value.parse::<ExportFormat>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut session: ReviewSession<HttpBackend, DirectorySink> =
        ReviewSession::from_config(&config).context("failed to build backend client")?;

    let file = PresentedFile::from_path(&cli.file)
        .with_context(|| format!("failed to read `{}`", cli.file.display()))?;
    match session.ingestion().select_file(file).await {
        IngestionOutcome::Accepted { .. } => {}
        IngestionOutcome::Rejected(err) => bail!("{} ({err})", err.user_message()),
        IngestionOutcome::Ignored => bail!("another document is still being processed"),
    }
    if let Some(summary) = session.ingestion().accepted_file() {
        println!("{} ({})", summary.name, summary.size_label());
    }

    if cli.expand {
        session.review_mut().set_all_expanded(true);
    }
    print_review(session.review());

    let export = session.export();
    if formats.is_empty() || !export.is_available() {
        return Ok(());
    }
    println!("{}", export.summary_label());
    let mut failures = 0;
    for format in formats {
        match export.export(format).await {
            ExportOutcome::Downloaded { location, .. } => {
                println!("  {} -> {}", format.label(), location.display());
            }
            ExportOutcome::Failed(err) => {
                failures += 1;
                eprintln!("  {}: {}", format.label(), err.user_message());
            }
            ExportOutcome::Ignored | ExportOutcome::Unavailable => {}
        }
    }
    if failures > 0 {
        bail!("{failures} export(s) failed");
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let base = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => ClientConfig::default(),
    };
    let mut config = base.with_env_overrides(|key| std::env::var(key).ok())?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(dir) = &cli.out_dir {
        config.download_dir = dir.clone();
    }
    Ok(config.validate()?)
}

fn print_review(view: &ReviewView) {
    if !view.is_visible() {
        println!("No highlights or notes found.");
        return;
    }
    println!("{}", view.heading());
    for item in view.items() {
        println!();
        println!("[{}]", item.page_label());
        if let Some(quote) = &item.original_text {
            println!("  \"{quote}\"");
        }
        if let Some(note) = item.visible_note() {
            println!("  My Note: {note}");
        }
        if let Some(label) = item.toggle_label() {
            if !item.expanded {
                println!("  ({label}: rerun with --expand)");
            }
        }
    }
    println!();
}
