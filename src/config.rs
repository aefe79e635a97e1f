//! Configuration for the extraction and NER pipelines.
//!
//! Everything is controlled through one [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The config is an explicit, constructed object
//! passed into [`crate::extract::Extractor`] and
//! [`crate::ner::bert::BertNer`] at creation time; there is no hidden
//! process-wide pipeline state, which keeps initialization order obvious
//! and lets tests substitute doubles at the backend seams.

use crate::error::RedactError;
use crate::progress::ProgressCallback;
use candle_core::Device;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default HuggingFace model ID for the NER pipeline.
///
/// A BERT fine-tuned on CoNLL-2003 with the standard BIO tag set
/// (`PER`, `ORG`, `LOC`, `MISC`).
pub const DEFAULT_NER_MODEL: &str = "dslim/bert-base-NER";

/// Hardware execution backend for NER inference.
///
/// Detection prefers CUDA, then Apple Metal, then falls back to an
/// automatic choice (CUDA if a device turns up at runtime, else CPU).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accelerator {
    /// NVIDIA GPU via CUDA (requires the `cuda` cargo feature).
    Cuda,
    /// Apple GPU via Metal (requires the `metal` cargo feature).
    Metal,
    /// Let candle decide: CUDA when available, otherwise CPU. (default)
    #[default]
    Auto,
    /// Force CPU inference.
    Cpu,
}

impl Accelerator {
    /// Pick the best accelerator the current build and host support.
    pub fn detect() -> Self {
        if candle_core::utils::cuda_is_available() {
            Accelerator::Cuda
        } else if candle_core::utils::metal_is_available() {
            Accelerator::Metal
        } else {
            Accelerator::Auto
        }
    }

    /// Materialise the selection as a candle [`Device`].
    ///
    /// Failures here are fatal and surface before any document is
    /// processed.
    pub fn device(&self) -> Result<Device, RedactError> {
        let to_err = |detail: String| RedactError::AcceleratorUnavailable {
            accelerator: format!("{self:?}"),
            detail,
        };
        match self {
            Accelerator::Cuda => Device::new_cuda(0).map_err(|e| to_err(e.to_string())),
            Accelerator::Metal => Device::new_metal(0).map_err(|e| to_err(e.to_string())),
            Accelerator::Auto => Device::cuda_if_available(0).map_err(|e| to_err(e.to_string())),
            Accelerator::Cpu => Ok(Device::Cpu),
        }
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Accelerator::Cuda => "cuda",
            Accelerator::Metal => "metal",
            Accelerator::Auto => "auto",
            Accelerator::Cpu => "cpu",
        };
        f.write_str(s)
    }
}

/// Configuration for a PDF extraction + anonymization run.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfredact::{Accelerator, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .accelerator(Accelerator::Cpu)
///     .model_id("dslim/bert-base-NER")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Execution backend for NER inference. Default: [`Accelerator::detect`].
    pub accelerator: Accelerator,

    /// Thread-count hint for CPU-bound work. Default: available parallelism.
    ///
    /// Applied as the global rayon pool size before the first inference;
    /// candle's CPU kernels pick it up from there.
    pub num_threads: usize,

    /// Run OCR on pages without a text layer. Default: false.
    ///
    /// This build extracts the embedded text layer only; enabling OCR
    /// makes extraction fail with [`RedactError::OcrUnavailable`].
    pub do_ocr: bool,

    /// Detect whitespace-aligned tables in extracted text. Default: true.
    pub do_table_structure: bool,

    /// Pad ragged table rows to a uniform column count. Default: true.
    ///
    /// Only meaningful when `do_table_structure` is on.
    pub cell_matching: bool,

    /// HuggingFace model ID for the NER pipeline. Default: [`DEFAULT_NER_MODEL`].
    pub model_id: String,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            accelerator: Accelerator::detect(),
            num_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            do_ocr: false,
            do_table_structure: true,
            cell_matching: true,
            model_id: DEFAULT_NER_MODEL.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("accelerator", &self.accelerator)
            .field("num_threads", &self.num_threads)
            .field("do_ocr", &self.do_ocr)
            .field("do_table_structure", &self.do_table_structure)
            .field("cell_matching", &self.cell_matching)
            .field("model_id", &self.model_id)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Set the global rayon pool to the configured thread count.
    ///
    /// Idempotent: a pool can only be installed once per process, so a
    /// second call is a no-op.
    pub fn apply_thread_hint(&self) {
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build_global();
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn accelerator(mut self, accelerator: Accelerator) -> Self {
        self.config.accelerator = accelerator;
        self
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = n;
        self
    }

    pub fn do_ocr(mut self, v: bool) -> Self {
        self.config.do_ocr = v;
        self
    }

    pub fn do_table_structure(mut self, v: bool) -> Self {
        self.config.do_table_structure = v;
        self
    }

    pub fn cell_matching(mut self, v: bool) -> Self {
        self.config.cell_matching = v;
        self
    }

    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.config.model_id = id.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, RedactError> {
        let c = &self.config;
        if c.num_threads == 0 {
            return Err(RedactError::InvalidConfig(
                "Thread count must be ≥ 1".into(),
            ));
        }
        if c.model_id.trim().is_empty() {
            return Err(RedactError::InvalidConfig(
                "Model ID must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_extraction_contract() {
        let c = PipelineConfig::default();
        assert!(!c.do_ocr);
        assert!(c.do_table_structure);
        assert!(c.cell_matching);
        assert_eq!(c.model_id, DEFAULT_NER_MODEL);
        assert!(c.num_threads >= 1);
    }

    #[test]
    fn builder_rejects_zero_threads() {
        let err = PipelineConfig::builder().num_threads(0).build();
        assert!(matches!(err, Err(RedactError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_empty_model_id() {
        let err = PipelineConfig::builder().model_id("  ").build();
        assert!(matches!(err, Err(RedactError::InvalidConfig(_))));
    }

    #[test]
    fn cpu_accelerator_always_materialises() {
        let device = Accelerator::Cpu.device().unwrap();
        assert!(device.is_cpu());
    }

    #[test]
    fn detect_returns_something_usable() {
        // Whatever the host offers, the selection must be materialisable
        // unless the matching cargo feature is missing; Auto always works.
        let acc = Accelerator::detect();
        if acc == Accelerator::Auto {
            assert!(acc.device().is_ok());
        }
    }

    #[test]
    fn accelerator_display_is_cli_friendly() {
        assert_eq!(Accelerator::Cuda.to_string(), "cuda");
        assert_eq!(Accelerator::Auto.to_string(), "auto");
    }
}
