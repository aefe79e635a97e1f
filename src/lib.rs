//! # pdfredact
//!
//! Extract PDF documents to Markdown and anonymize named entities.
//!
//! Given one PDF or a folder of PDFs, produce one Markdown file per
//! document in which every recognized person and organization name is
//! replaced by its entity-type tag (`[PERSON]`, `[ORG]`) while all other
//! text, whitespace included, is preserved byte for byte.
//!
//! The crate is orchestration around two external capabilities: pdfium
//! does the PDF text extraction, and a pretrained BERT token-classification
//! model (via candle) does the entity recognition. Nothing here parses
//! PDFs or recognizes entities on its own.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF file / folder
//!  │
//!  ├─ 1. Resolve   validate input, pick the output directory
//!  ├─ 2. Extract   per-page text via pdfium → structured Document blocks
//!  ├─ 3. Render    Document → Markdown string
//!  ├─ 4. NER       batch BERT token classification, BIO spans merged
//!  ├─ 5. Redact    PERSON/ORG tokens → [PERSON]/[ORG], whitespace kept
//!  └─ 6. Write     {output_dir}/{name}.md, one file per document
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfredact::{run, PipelineConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let summary = run(Path::new("reports/"), None, &config)?;
//!     println!(
//!         "{} documents anonymized into {}",
//!         summary.documents,
//!         summary.output_dir.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfredact` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `cuda`  | off     | CUDA inference via candle |
//! | `metal` | off     | Apple Metal inference via candle |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfredact = { version = "0.1", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! Strictly fail-fast: a bad input path aborts before extraction, a
//! missing model aborts before any document is processed, a single bad
//! document aborts a whole batch, and a failed write aborts the remaining
//! writes. Files already written stay on disk.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod anonymize;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod ner;
pub mod pdf;
pub mod progress;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use anonymize::{redact_tokens, Anonymizer};
pub use config::{Accelerator, PipelineConfig, PipelineConfigBuilder, DEFAULT_NER_MODEL};
pub use document::{Block, Document};
pub use error::RedactError;
pub use extract::Extractor;
pub use ner::bert::BertNer;
pub use ner::{spans_to_tokens, EntityLabel, EntitySpan, NerPipeline, TaggedToken};
pub use pdf::{ExtractionOptions, PdfBackend, PdfiumBackend};
pub use progress::{NoopProgressCallback, ProgressCallback, RedactionProgressCallback};
pub use run::{resolve_output_dir, run, run_with, RunSummary};
