//! CLI binary for pdfredact.
//!
//! A thin shim over the library crate: maps the two positional paths and
//! a few ambient flags to a `PipelineConfig`, wires up an indicatif
//! progress callback, and reports the summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfredact::{
    run, Accelerator, PipelineConfig, ProgressCallback, RedactionProgressCallback,
    DEFAULT_NER_MODEL,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar across the anonymization batch with a
/// per-document log line as each output file lands.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Extracting");
        bar.set_message("Reading PDF input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl RedactionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_docs: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} docs  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_docs as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Anonymizing");
    }

    fn on_document_start(&self, _doc_num: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, doc_num: usize, total: usize, bytes_written: usize) {
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}",
            green("✓"),
            doc_num,
            total,
            dim(&format!("{bytes_written:>6} bytes")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_docs: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} document(s) anonymized",
            green("✔"),
            bold(&total_docs.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Anonymize one PDF; output lands next to it
  pdfredact report.pdf

  # Anonymize a folder of PDFs into the folder itself
  pdfredact ./contracts/

  # Write the Markdown files somewhere else
  pdfredact ./contracts/ ./anonymized/

  # Force CPU inference with a custom NER model
  pdfredact --accelerator cpu --model dslim/bert-large-NER report.pdf

OUTPUT:
  One UTF-8 Markdown file per input document, named {document}.md, with
  recognized person and organization names replaced by [PERSON] / [ORG].
  Other entity types (locations, dates, ...) are left untouched.

ENVIRONMENT VARIABLES:
  PDFREDACT_MODEL          Override the NER model ID
  PDFREDACT_ACCELERATOR    auto, cuda, metal, or cpu
  PDFIUM_DYNAMIC_LIB_PATH  Directory containing libpdfium

SETUP:
  The NER model (~400 MB) is downloaded from the HuggingFace hub on first
  run and cached under ~/.cache/huggingface/. pdfium must be installed as
  a system library.
"#;

/// Anonymize PDF documents into Markdown with entity-type tags.
#[derive(Parser, Debug)]
#[command(
    name = "pdfredact",
    version,
    about = "Extract PDFs to Markdown and anonymize person/organization names",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to a PDF file or a folder of PDFs.
    input_path: PathBuf,

    /// Existing output folder [default: next to the input].
    output_path: Option<PathBuf>,

    /// NER model ID on the HuggingFace hub.
    #[arg(long, env = "PDFREDACT_MODEL", default_value = DEFAULT_NER_MODEL)]
    model: String,

    /// Inference backend: auto, cuda, metal, cpu.
    #[arg(long, env = "PDFREDACT_ACCELERATOR", value_enum)]
    accelerator: Option<AcceleratorArg>,

    /// Thread-count hint for CPU inference.
    #[arg(long, env = "PDFREDACT_THREADS")]
    threads: Option<usize>,

    /// Disable progress bar.
    #[arg(long, env = "PDFREDACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFREDACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFREDACT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AcceleratorArg {
    Auto,
    Cuda,
    Metal,
    Cpu,
}

impl From<AcceleratorArg> for Accelerator {
    fn from(v: AcceleratorArg) -> Self {
        match v {
            AcceleratorArg::Auto => Accelerator::Auto,
            AcceleratorArg::Cuda => Accelerator::Cuda,
            AcceleratorArg::Metal => Accelerator::Metal,
            AcceleratorArg::Cpu => Accelerator::Cpu,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-document feedback, so library INFO
    // logs are suppressed while it is active.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new_dynamic();
        Some(cb)
    } else {
        None
    };

    let mut builder = PipelineConfig::builder().model_id(&cli.model);
    if let Some(acc) = cli.accelerator {
        builder = builder.accelerator(acc.into());
    }
    if let Some(threads) = cli.threads {
        builder = builder.num_threads(threads);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let summary = run(&cli.input_path, cli.output_path.as_deref(), &config)
        .context("Anonymization failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {} document(s)  →  {}",
            green("✔"),
            summary.documents,
            bold(&summary.output_dir.display().to_string()),
        );
    }

    Ok(())
}
