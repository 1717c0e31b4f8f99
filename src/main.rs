//! # Deck Audit CLI (`deckaudit`)
//!
//! The `deckaudit` binary analyzes a `.pptx` presentation for factual and
//! logical inconsistencies and prints the final report on stdout.
//!
//! ## Usage
//!
//! ```bash
//! deckaudit --config ./deckaudit.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `deckaudit analyze <file>` | Run the full chunked analysis pipeline |
//! | `deckaudit extract <file>` | Print the extracted per-slide content |
//!
//! ## Examples
//!
//! ```bash
//! # Full analysis (requires GEMINI_API_KEY)
//! deckaudit analyze quarterly-review.pptx
//!
//! # Show slide/chunk counts without calling the model
//! deckaudit analyze quarterly-review.pptx --dry-run
//!
//! # Machine-readable progress on stderr
//! deckaudit analyze quarterly-review.pptx --progress json
//!
//! # Inspect what the extractor sees
//! deckaudit extract quarterly-review.pptx
//! ```

mod analyzer;
mod chunk;
mod client;
mod config;
mod extract;
mod models;
mod pipeline;
mod progress;
mod prompts;
mod reconcile;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::client::GeminiClient;
use crate::pipeline::{combine_slides, run_pipeline};
use crate::progress::ProgressMode;

/// Deck Audit — finds factual and logical inconsistencies across the
/// slides of a presentation using a generative model.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; every setting has a default, so the file is optional. The Gemini
/// API key is read from the `GEMINI_API_KEY` environment variable.
#[derive(Parser)]
#[command(
    name = "deckaudit",
    about = "Deck Audit — finds inconsistencies across presentation slides using a generative model",
    version,
    long_about = "Deck Audit extracts the text, tables, and element markers from a .pptx deck, \
    splits the combined content into size-bounded chunks, analyzes each chunk with the Gemini API, \
    and reconciles the per-chunk findings into one final report."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./deckaudit.toml`. Model and analysis settings are read
    /// from this file; a missing file means defaults for everything.
    #[arg(long, global = true, default_value = "./deckaudit.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Analyze a presentation for inconsistencies.
    ///
    /// Extracts slide content, chunks it, issues one model call per chunk,
    /// and reconciles the findings into a final report on stdout. Progress
    /// goes to stderr.
    Analyze {
        /// Path to the `.pptx` file.
        file: PathBuf,

        /// Extract and chunk only — show counts without any model calls.
        #[arg(long)]
        dry_run: bool,

        /// Override the configured maximum chunk size (characters).
        #[arg(long)]
        max_chunk_size: Option<usize>,

        /// Progress output on stderr: defaults to `human` when stderr is a
        /// TTY, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressArg>,
    },

    /// Print the extracted per-slide content.
    ///
    /// Shows each slide's combined text block and element counts exactly as
    /// the analysis pipeline would see them.
    Extract {
        /// Path to the `.pptx` file.
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProgressArg {
    Off,
    Human,
    Json,
}

impl ProgressArg {
    fn mode(self) -> ProgressMode {
        match self {
            ProgressArg::Off => ProgressMode::Off,
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            file,
            dry_run,
            max_chunk_size,
            progress,
        } => {
            let mut analysis = cfg.analysis.clone();
            if let Some(size) = max_chunk_size {
                if size == 0 {
                    anyhow::bail!("--max-chunk-size must be > 0");
                }
                analysis.max_chunk_size = size;
            }

            if dry_run {
                let slides = extract::extract_slides(&file)?;
                let combined = combine_slides(&slides);
                let chunks = chunk::chunk_text(&combined.text, analysis.max_chunk_size);
                println!("analyze {} (dry-run)", file.display());
                println!("  slides: {}", combined.slide_count);
                println!("  combined chars: {}", combined.text.len());
                println!("  chunks: {}", chunks.len());
                return Ok(());
            }

            let mode = progress
                .map(ProgressArg::mode)
                .unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();

            // Credential problems surface here, before the file is opened.
            let client = GeminiClient::new(&cfg, reporter.clone())
                .context("failed to configure model client")?;

            let slides = extract::extract_slides(&file)?;
            let report = run_pipeline(&client, &analysis, &slides, reporter.as_ref()).await?;
            println!("{}", report);
        }
        Commands::Extract { file } => {
            let slides = extract::extract_slides(&file)?;
            for slide in &slides {
                let kinds = slide
                    .content_types
                    .iter()
                    .map(|(kind, count)| format!("{}={}", kind, count))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("--- SLIDE {} ---", slide.slide_number);
                if kinds.is_empty() {
                    println!("(no extractable elements)");
                } else {
                    println!("({} elements: {})", slide.total_elements, kinds);
                }
                if !slide.content.is_empty() {
                    println!("{}", slide.content);
                }
                println!();
            }
            println!("slides: {}", slides.len());
        }
    }

    Ok(())
}
