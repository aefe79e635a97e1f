//! Top-level orchestration: resolve paths, build pipelines, sequence
//! extraction and anonymization.
//!
//! One run is a straight line: validate input → resolve output directory
//! → build the NER pipeline (fatal before any document is touched) →
//! extract (single file or fail-fast batch) → anonymize → report. Each
//! phase is one blocking call; whatever parallelism the extraction or
//! inference libraries use internally is opaque here.

use crate::anonymize::Anonymizer;
use crate::config::PipelineConfig;
use crate::error::RedactError;
use crate::extract::Extractor;
use crate::ner::bert::BertNer;
use crate::ner::NerPipeline;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of documents extracted and anonymized.
    pub documents: usize,
    /// Directory the Markdown files were written to.
    pub output_dir: PathBuf,
}

/// Resolve the output directory for a run.
///
/// When `output` is omitted the files land next to the input: the input
/// directory itself for folder input, the parent directory for file
/// input. When given, it must be an existing directory, validated here,
/// before extraction begins.
pub fn resolve_output_dir(
    input: &Path,
    output: Option<&Path>,
) -> Result<PathBuf, RedactError> {
    if !input.exists() {
        return Err(RedactError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    match output {
        None => {
            if input.is_dir() {
                Ok(input.to_path_buf())
            } else {
                Ok(input
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."))
                    .to_path_buf())
            }
        }
        Some(out) if out.is_dir() => Ok(out.to_path_buf()),
        Some(out) => Err(RedactError::OutputNotADirectory {
            path: out.to_path_buf(),
        }),
    }
}

/// Run the full pipeline with the production extractor and NER model.
pub fn run(
    input: &Path,
    output: Option<&Path>,
    config: &PipelineConfig,
) -> Result<RunSummary, RedactError> {
    config.apply_thread_hint();
    let output_dir = resolve_output_dir(input, output)?;

    let ner = BertNer::load(&config.model_id, config.accelerator)?;
    let extractor = Extractor::new(config);

    run_with(&extractor, &ner, input, &output_dir, config)
}

/// Run the pipeline with caller-supplied components.
///
/// This is the seam the integration tests drive with backend and
/// pipeline doubles. `output_dir` must already be resolved and valid.
pub fn run_with(
    extractor: &Extractor,
    ner: &dyn NerPipeline,
    input: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<RunSummary, RedactError> {
    let start = Instant::now();

    let documents = if input.is_dir() {
        info!("Parsing the PDF files in folder: {}", input.display());
        extractor.batch_extract(input)?
    } else {
        info!("Parsing the PDF file: {}", input.display());
        extractor.extract(input)?
    };

    info!(
        "Anonymizing {} extracted document(s) from: {}",
        documents.len(),
        input.display()
    );
    Anonymizer::anonymize(
        ner,
        &documents,
        output_dir,
        config.progress_callback.as_ref(),
    )?;

    info!(
        "Parsed and anonymized {} document(s) → '{}' in {}ms",
        documents.len(),
        output_dir.display(),
        start.elapsed().as_millis()
    );

    Ok(RunSummary {
        documents: documents.len(),
        output_dir: output_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_input_is_rejected_before_anything_else() {
        let err = resolve_output_dir(Path::new("/no/such/path"), None).unwrap_err();
        assert!(matches!(err, RedactError::InputNotFound { .. }));
    }

    #[test]
    fn folder_input_defaults_to_itself() {
        let dir = TempDir::new().unwrap();
        let out = resolve_output_dir(dir.path(), None).unwrap();
        assert_eq!(out, dir.path());
    }

    #[test]
    fn file_input_defaults_to_parent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.pdf");
        fs::write(&file, b"%PDF-1.7").unwrap();
        let out = resolve_output_dir(&file, None).unwrap();
        assert_eq!(out, dir.path());
    }

    #[test]
    fn explicit_output_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.pdf");
        let not_a_dir = dir.path().join("out.md");
        fs::write(&file, b"%PDF-1.7").unwrap();
        fs::write(&not_a_dir, "x").unwrap();
        let err = resolve_output_dir(&file, Some(&not_a_dir)).unwrap_err();
        assert!(matches!(err, RedactError::OutputNotADirectory { .. }));
    }

    #[test]
    fn explicit_existing_directory_is_used_as_is() {
        let dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let file = dir.path().join("report.pdf");
        fs::write(&file, b"%PDF-1.7").unwrap();
        let out = resolve_output_dir(&file, Some(out_dir.path())).unwrap();
        assert_eq!(out, out_dir.path());
    }
}
