//! Anonymization: batch NER over rendered Markdown, redaction, and writes.
//!
//! One pipeline call covers the whole batch; documents are then rewritten
//! and persisted one at a time. A redacted token is replaced by its
//! bracketed entity tag followed by the token's original trailing
//! whitespace, so the output keeps the source's exact whitespace shape.

use crate::document::Document;
use crate::error::RedactError;
use crate::ner::{NerPipeline, TaggedToken};
use crate::progress::ProgressCallback;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Redacts person/organization entities in extracted documents and
/// writes one Markdown file per document.
pub struct Anonymizer;

impl Anonymizer {
    /// Anonymize `documents` and write `{name}.md` files into `output_dir`.
    ///
    /// Preconditions: `output_dir` exists and is a directory, and
    /// `documents` is non-empty; both are validated by the caller before
    /// extraction starts. Existing files of the same name are
    /// overwritten. A failed write aborts the remaining documents;
    /// already-written files stay on disk.
    pub fn anonymize(
        ner: &dyn NerPipeline,
        documents: &[Document],
        output_dir: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), RedactError> {
        let names: Vec<&str> = documents.iter().map(|d| d.name.as_str()).collect();
        let markdown: Vec<String> = documents.iter().map(Document::to_markdown).collect();

        info!("Running NER over {} document(s)", documents.len());
        let token_streams = ner.pipe(&markdown)?;

        if let Some(cb) = progress {
            cb.on_batch_start(documents.len());
        }

        for (i, tokens) in token_streams.iter().enumerate() {
            if let Some(cb) = progress {
                cb.on_document_start(i + 1, documents.len(), names[i]);
            }

            let redacted = redact_tokens(tokens);
            let path = output_dir.join(format!("{}.md", names[i]));
            debug!("Writing anonymized document to '{}'", path.display());

            // Handle scope ends (and the file closes) after each write.
            let mut file = File::create(&path).map_err(|e| RedactError::OutputWrite {
                path: path.clone(),
                source: e,
            })?;
            file.write_all(redacted.as_bytes())
                .map_err(|e| RedactError::OutputWrite {
                    path: path.clone(),
                    source: e,
                })?;

            if let Some(cb) = progress {
                cb.on_document_complete(i + 1, documents.len(), redacted.len());
            }
        }

        if let Some(cb) = progress {
            cb.on_batch_complete(documents.len());
        }
        Ok(())
    }
}

/// Rebuild output text from a token stream, replacing redacted entity
/// tokens with their bracketed tag.
///
/// Tokens labeled PERSON or ORG become `[PERSON]`/`[ORG]` plus their
/// original trailing whitespace; every other token, other entity
/// categories included, is emitted verbatim.
pub fn redact_tokens(tokens: &[TaggedToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token.label {
            Some(label) if label.is_redacted() => {
                out.push('[');
                out.push_str(label.tag());
                out.push(']');
            }
            _ => out.push_str(&token.text),
        }
        out.push_str(&token.whitespace);
    }
    out
}
