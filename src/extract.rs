//! Extraction: one PDF or a folder of PDFs into [`Document`]s.
//!
//! The extractor is a thin wrapper around a [`PdfBackend`]: it validates
//! inputs (only the PDF format is accepted; anything else raises rather
//! than being skipped), derives document names, and sequences backend
//! calls. It holds no mutable state beyond the immutable backend
//! configuration established at construction.

use crate::config::PipelineConfig;
use crate::document::Document;
use crate::error::RedactError;
use crate::pdf::{document_name, PdfBackend, PdfiumBackend};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts PDF files into in-memory [`Document`]s through a backend.
pub struct Extractor {
    backend: Box<dyn PdfBackend>,
}

impl Extractor {
    /// Build an extractor with the production pdfium backend, configured
    /// from an explicit [`PipelineConfig`].
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_backend(Box::new(PdfiumBackend::new(config.into())))
    }

    /// Build an extractor around any backend (test doubles included).
    pub fn with_backend(backend: Box<dyn PdfBackend>) -> Self {
        Self { backend }
    }

    /// Extract a single PDF file.
    ///
    /// Returns a one-element list so single-file and batch flows feed the
    /// anonymizer identically. The document's name is the file stem.
    pub fn extract(&self, path: &Path) -> Result<Vec<Document>, RedactError> {
        validate_pdf(path)?;
        debug!("Extracting '{}'", path.display());
        let document = self.backend.convert(path)?;
        Ok(vec![document])
    }

    /// Extract every entry of a folder, fail-fast.
    ///
    /// Entries are taken in sorted file-name order so output order is
    /// stable across runs. A folder with exactly one entry delegates to
    /// [`Extractor::extract`], an intentional branch: a
    /// one-element batch has single-file error granularity. For larger
    /// folders the first conversion failure aborts the whole batch; there
    /// is no partial-skip policy.
    pub fn batch_extract(&self, folder: &Path) -> Result<Vec<Document>, RedactError> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(folder)
            .map_err(|e| RedactError::FolderRead {
                path: folder.to_path_buf(),
                source: e,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        if entries.is_empty() {
            return Err(RedactError::EmptyFolder {
                path: folder.to_path_buf(),
            });
        }

        if entries.len() == 1 {
            return self.extract(&entries[0]);
        }

        info!("Batch extracting {} files from '{}'", entries.len(), folder.display());
        let mut documents = Vec::with_capacity(entries.len());
        for path in &entries {
            documents.extend(self.extract(path)?);
        }
        Ok(documents)
    }
}

/// Accept only PDF files: the extension must be `.pdf` and the header
/// must carry the `%PDF` magic bytes.
fn validate_pdf(path: &Path) -> Result<(), RedactError> {
    let is_pdf_ext = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf_ext || !path.is_file() {
        return Err(RedactError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let mut file = std::fs::File::open(path).map_err(|e| RedactError::InputRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(RedactError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}
