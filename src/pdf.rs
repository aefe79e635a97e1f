//! PDF extraction backend: per-page text via pdfium plus a light layout pass.
//!
//! The backend sits behind the [`PdfBackend`] trait so the
//! [`crate::extract::Extractor`] can be driven by a test double. The
//! production implementation, [`PdfiumBackend`], is a thin wrapper over
//! pdfium: it pulls each page's embedded text layer and classifies
//! blank-line-separated groups into headings, list items, paragraphs, and
//! (optionally) whitespace-aligned tables. All structural heavy lifting
//! stays inside pdfium.
//!
//! A pdfium instance is created per call rather than held across calls;
//! the backend carries only the immutable extraction toggles from
//! [`PipelineConfig`].

use crate::config::PipelineConfig;
use crate::document::{Block, Document};
use crate::error::RedactError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

/// Converts one PDF file into a [`Document`].
pub trait PdfBackend {
    fn convert(&self, path: &Path) -> Result<Document, RedactError>;
}

/// Extraction toggles consumed by [`PdfiumBackend`].
#[derive(Debug, Clone, Copy)]
pub struct ExtractionOptions {
    pub do_ocr: bool,
    pub do_table_structure: bool,
    pub cell_matching: bool,
}

impl From<&PipelineConfig> for ExtractionOptions {
    fn from(c: &PipelineConfig) -> Self {
        Self {
            do_ocr: c.do_ocr,
            do_table_structure: c.do_table_structure,
            cell_matching: c.cell_matching,
        }
    }
}

/// Production backend over the pdfium C++ library.
pub struct PdfiumBackend {
    options: ExtractionOptions,
}

impl PdfiumBackend {
    pub fn new(options: ExtractionOptions) -> Self {
        Self { options }
    }

    fn bind() -> Result<Pdfium, RedactError> {
        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| RedactError::PdfiumBindingFailed(format!("{e:?}")))
    }
}

impl PdfBackend for PdfiumBackend {
    fn convert(&self, path: &Path) -> Result<Document, RedactError> {
        if self.options.do_ocr {
            return Err(RedactError::OcrUnavailable {
                path: path.to_path_buf(),
            });
        }

        let pdfium = Self::bind()?;
        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| RedactError::ConversionFailed {
                    path: path.to_path_buf(),
                    detail: format!("{e:?}"),
                })?;

        let name = document_name(path);
        let mut blocks = Vec::new();

        for (idx, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| RedactError::ConversionFailed {
                    path: path.to_path_buf(),
                    detail: format!("page {}: {:?}", idx + 1, e),
                })?
                .all();

            if text.trim().is_empty() {
                // No text layer; without OCR there is nothing to extract.
                warn!("Page {} of '{}' has no text layer, skipped", idx + 1, name);
                continue;
            }

            blocks.extend(blocks_from_text(&text, &self.options));
        }

        debug!("Extracted {} blocks from '{}'", blocks.len(), name);
        Ok(Document::new(name, blocks))
    }
}

/// Derive the document name from the source file stem.
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•‣▪]|\d{1,3}[.)])\s+(\S.*)$").unwrap());

static CELL_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+| {2,}").unwrap());

/// Classify one page's raw text into blocks.
///
/// Groups are separated by blank lines. Within a group:
/// table rows (≥ 2 whitespace-aligned cells on every line) win over
/// everything when table structure is enabled, then list items, then
/// heading heuristics, then plain paragraphs.
fn blocks_from_text(text: &str, options: &ExtractionOptions) -> Vec<Block> {
    let mut blocks = Vec::new();

    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    for group in lines.split(|l| l.trim().is_empty()) {
        let group: Vec<&str> = group.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
        if group.is_empty() {
            continue;
        }

        if options.do_table_structure && group.len() >= 2 {
            if let Some(rows) = parse_table(&group, options.cell_matching) {
                blocks.push(Block::Table(rows));
                continue;
            }
        }

        if group.iter().all(|l| LIST_ITEM_RE.is_match(l)) {
            for line in &group {
                let item = LIST_ITEM_RE
                    .captures(line)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| line.to_string());
                blocks.push(Block::ListItem(item));
            }
            continue;
        }

        if group.len() == 1 {
            if let Some(level) = heading_level(group[0]) {
                blocks.push(Block::Heading {
                    level,
                    text: group[0].to_string(),
                });
                continue;
            }
        }

        blocks.push(Block::Paragraph(group.join(" ")));
    }

    blocks
}

/// Try to read a line group as a whitespace-aligned table.
///
/// Every line must split into at least two cells, and the group must
/// agree on a column count within ±1; otherwise it is prose with
/// incidental double spaces. With `cell_matching`, ragged rows are padded
/// to the widest row.
fn parse_table(group: &[&str], cell_matching: bool) -> Option<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(group.len());
    for line in group {
        let cells: Vec<String> = CELL_SPLIT_RE
            .split(line)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if cells.len() < 2 {
            return None;
        }
        rows.push(cells);
    }

    let max = rows.iter().map(Vec::len).max()?;
    let min = rows.iter().map(Vec::len).min()?;
    if max - min > 1 {
        return None;
    }

    if cell_matching {
        for row in &mut rows {
            row.resize(max, String::new());
        }
    }
    Some(rows)
}

/// Heading heuristic for an isolated single-line group.
///
/// All-caps lines are top-level headings; short title-case lines without
/// terminal punctuation are second-level.
fn heading_level(line: &str) -> Option<u8> {
    if line.len() > 60 || line.ends_with(['.', ':', ';', ',']) {
        return None;
    }
    let has_letters = line.chars().any(|c| c.is_alphabetic());
    if !has_letters {
        return None;
    }
    if !line.chars().any(|c| c.is_lowercase()) {
        return Some(1);
    }
    let words = line.split_whitespace().count();
    if words <= 8 && line.chars().next().is_some_and(|c| c.is_uppercase()) {
        return Some(2);
    }
    None
}
