//! Error types for the pdfredact library.
//!
//! Every error here is fatal to the current run. The pipeline is
//! deliberately fail-fast: a bad input path aborts before any processing,
//! a conversion failure aborts the whole batch, and a write failure aborts
//! the remaining writes (files already written stay on disk; there is no
//! transactional rollback). Nothing is silently swallowed or skipped.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdfredact library.
#[derive(Debug, Error)]
pub enum RedactError {
    // ── Input validation errors ───────────────────────────────────────────
    /// Input path does not exist.
    #[error("Input path not found: '{path}'\nIt must be a PDF file or a folder of PDFs.")]
    InputNotFound { path: PathBuf },

    /// Output path was given but is not an existing directory.
    #[error("Output path is not a directory: '{path}'\nCreate it first, or omit it to write next to the input.")]
    OutputNotADirectory { path: PathBuf },

    /// Input folder contains no entries to convert.
    #[error("Input folder is empty: '{path}'")]
    EmptyFolder { path: PathBuf },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The file is not a PDF. Only the PDF format is accepted; other
    /// formats raise rather than being skipped.
    #[error("Unsupported format for '{path}': only PDF input is accepted")]
    UnsupportedFormat { path: PathBuf },

    /// The file claims to be a PDF but its header says otherwise.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not parse the document.
    #[error("Failed to convert '{path}': {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    /// OCR was requested but this build performs text-layer extraction only.
    #[error("OCR is not available in this build (requested for '{path}')")]
    OcrUnavailable { path: PathBuf },

    // ── Model / pipeline initialization errors ────────────────────────────
    /// The requested accelerator could not be initialised.
    #[error("Accelerator '{accelerator}' is unavailable: {detail}")]
    AcceleratorUnavailable { accelerator: String, detail: String },

    /// Downloading or loading the NER model failed.
    #[error("Failed to load NER model '{model_id}': {detail}\nCheck the model ID and your network connection; weights are cached after the first download.")]
    ModelLoadFailed { model_id: String, detail: String },

    /// The tokenizer shipped with the model could not be built.
    #[error("Failed to load tokenizer for '{model_id}': {detail}")]
    TokenizerFailed { model_id: String, detail: String },

    /// A forward pass through the NER model failed.
    #[error("NER inference failed: {0}")]
    Inference(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write an anonymized Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not list the input folder.
    #[error("Failed to read folder '{path}': {source}")]
    FolderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not open or read an input file that exists.
    #[error("Failed to read input file '{path}': {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_DYNAMIC_LIB_PATH to the directory containing libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
