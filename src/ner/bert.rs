//! BERT token-classification pipeline using candle.
//!
//! Loads a pretrained transformer NER model (default: a BERT fine-tuned
//! on CoNLL-2003) from the HuggingFace hub: BERT encoder plus a linear
//! classification head over the BIO tag set. Inference runs on the
//! configured accelerator; long inputs are processed through tokenizer
//! truncation overflow in 512-token windows whose offsets all refer to
//! the original string.
//!
//! Only token classification runs here; there are no tagging, parsing,
//! or lemmatization stages to pay for.

use crate::config::Accelerator;
use crate::error::RedactError;
use crate::ner::{EntityLabel, EntitySpan, NerPipeline};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::ApiBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Window size for long inputs, special tokens included.
const MAX_SEQ_LEN: usize = 512;

/// The part of `config.json` the encoder config does not cover.
#[derive(Debug, Deserialize)]
struct LabelConfig {
    id2label: Option<HashMap<String, String>>,
}

/// Pretrained BERT NER pipeline.
pub struct BertNer {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: HashMap<u32, String>,
    device: Device,
}

impl BertNer {
    /// Download (or reuse from cache) and load the model onto the chosen
    /// accelerator. Fatal on any missing artifact; this runs before any
    /// document is processed.
    pub fn load(model_id: &str, accelerator: Accelerator) -> Result<Self, RedactError> {
        let device = accelerator.device()?;
        info!("Loading NER model '{}' on {:?}", model_id, device);

        let model_err = |detail: String| RedactError::ModelLoadFailed {
            model_id: model_id.to_string(),
            detail,
        };

        let api = ApiBuilder::new()
            .with_progress(true)
            .build()
            .map_err(|e| model_err(e.to_string()))?;
        let repo = api.model(model_id.to_string());

        let config_path = repo.get("config.json").map_err(|e| model_err(e.to_string()))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| model_err(e.to_string()))?;
        let weights_path = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(|e| model_err(e.to_string()))?;

        Self::from_files(model_id, &config_path, &tokenizer_path, &weights_path, device)
    }

    /// Load from local files (used directly by offline setups).
    pub fn from_files(
        model_id: &str,
        config_path: &Path,
        tokenizer_path: &Path,
        weights_path: &Path,
        device: Device,
    ) -> Result<Self, RedactError> {
        let model_err = |detail: String| RedactError::ModelLoadFailed {
            model_id: model_id.to_string(),
            detail,
        };

        let config_str = std::fs::read_to_string(config_path)
            .map_err(|e| model_err(format!("read config.json: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| model_err(format!("parse config.json: {e}")))?;
        let id2label = parse_id2label(&config_str)
            .map_err(|e| model_err(format!("parse id2label: {e}")))?;

        let mut tokenizer =
            Tokenizer::from_file(tokenizer_path).map_err(|e| RedactError::TokenizerFailed {
                model_id: model_id.to_string(),
                detail: e.to_string(),
            })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| RedactError::TokenizerFailed {
                model_id: model_id.to_string(),
                detail: e.to_string(),
            })?;

        let vb = load_var_builder(weights_path, &device).map_err(|e| model_err(e))?;

        let model = BertModel::load(vb.pp("bert"), &config)
            .map_err(|e| model_err(format!("load encoder: {e}")))?;
        let classifier = candle_nn::linear(config.hidden_size, id2label.len(), vb.pp("classifier"))
            .map_err(|e| model_err(format!("load classifier head: {e}")))?;

        debug!("NER model ready: {} labels", id2label.len());
        Ok(Self {
            model,
            classifier,
            tokenizer,
            id2label,
            device,
        })
    }

    /// Recognize entities in one text, window by window.
    fn spans_for_text(&self, text: &str) -> Result<Vec<EntitySpan>, RedactError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| RedactError::Inference(format!("tokenize: {e}")))?;

        let mut pieces: Vec<(Range<usize>, String)> = Vec::new();
        let mut windows = vec![&encoding];
        windows.extend(encoding.get_overflowing().iter());

        for window in windows {
            self.classify_window(window, &mut pieces)?;
        }

        Ok(merge_zero_gap_spans(aggregate_spans(&pieces)))
    }

    /// Forward one ≤512-token window and append labeled pieces.
    fn classify_window(
        &self,
        window: &tokenizers::Encoding,
        pieces: &mut Vec<(Range<usize>, String)>,
    ) -> Result<(), RedactError> {
        let ids = window.get_ids();
        if ids.is_empty() {
            return Ok(());
        }
        let infer_err = |e: candle_core::Error| RedactError::Inference(e.to_string());

        let input_ids = Tensor::new(ids, &self.device)
            .map_err(infer_err)?
            .unsqueeze(0)
            .map_err(infer_err)?;
        let token_type_ids = Tensor::zeros((1, ids.len()), DType::U32, &self.device)
            .map_err(infer_err)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, None)
            .map_err(infer_err)?;
        let logits = self.classifier.forward(&hidden).map_err(infer_err)?;
        let predictions = logits
            .argmax(D::Minus1)
            .map_err(infer_err)?
            .squeeze(0)
            .map_err(infer_err)?
            .to_vec1::<u32>()
            .map_err(infer_err)?;

        let offsets = window.get_offsets();
        let special = window.get_special_tokens_mask();

        for (i, pred) in predictions.iter().enumerate() {
            if special.get(i).copied().unwrap_or(1) == 1 {
                continue;
            }
            let (start, end) = offsets[i];
            if start == end {
                continue;
            }
            let label = self
                .id2label
                .get(pred)
                .cloned()
                .unwrap_or_else(|| "O".to_string());
            pieces.push((start..end, label));
        }
        Ok(())
    }
}

impl NerPipeline for BertNer {
    fn entity_spans(&self, texts: &[String]) -> Result<Vec<Vec<EntitySpan>>, RedactError> {
        texts.iter().map(|t| self.spans_for_text(t)).collect()
    }
}

/// Memory-map safetensors, or fall back to the pytorch checkpoint format.
fn load_var_builder(weights_path: &Path, device: &Device) -> Result<VarBuilder<'static>, String> {
    if weights_path.extension().is_some_and(|e| e == "safetensors") {
        // Safety: the weights file is not mutated while mapped.
        unsafe {
            VarBuilder::from_mmaped_safetensors(
                &[PathBuf::from(weights_path)],
                DType::F32,
                device,
            )
            .map_err(|e| format!("load safetensors: {e}"))
        }
    } else {
        VarBuilder::from_pth(weights_path, DType::F32, device)
            .map_err(|e| format!("load pytorch weights: {e}"))
    }
}

/// Parse the `id2label` table out of a raw `config.json` string.
fn parse_id2label(config_str: &str) -> Result<HashMap<u32, String>, String> {
    let labels: LabelConfig = serde_json::from_str(config_str).map_err(|e| e.to_string())?;
    let id2label = labels
        .id2label
        .ok_or_else(|| "config.json has no id2label table".to_string())?;
    id2label
        .into_iter()
        .map(|(k, v)| {
            k.parse::<u32>()
                .map(|id| (id, v))
                .map_err(|e| format!("label id '{k}': {e}"))
        })
        .collect()
}

/// Aggregate per-wordpiece BIO labels into merged entity spans.
///
/// `B-X` always opens a new span; `I-X` (or a bare `X`) extends a span of
/// the same category and otherwise opens one; `O` and unknown labels
/// close the current span. Wordpieces of one word carry contiguous
/// offsets, so extension covers subwords and multi-word entities alike.
fn aggregate_spans(pieces: &[(Range<usize>, String)]) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    let mut current: Option<EntitySpan> = None;

    for (range, label) in pieces {
        let parsed = EntityLabel::from_model_label(label);
        let begins = label.starts_with("B-");

        match parsed {
            None => {
                if let Some(span) = current.take() {
                    spans.push(span);
                }
            }
            Some(entity) => match current {
                Some(ref mut span) if span.label == entity && !begins => {
                    span.end = range.end;
                }
                _ => {
                    if let Some(span) = current.take() {
                        spans.push(span);
                    }
                    current = Some(EntitySpan::new(range.start, range.end, entity));
                }
            },
        }
    }

    if let Some(span) = current {
        spans.push(span);
    }
    spans
}

/// Merge spans that touch exactly (wordpiece splits across windows).
fn merge_zero_gap_spans(spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    let mut merged: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.end == span.start && last.label == span.label => {
                last.end = span.end;
            }
            _ => merged.push(span),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(range: Range<usize>, label: &str) -> (Range<usize>, String) {
        (range, label.to_string())
    }

    #[test]
    fn id2label_parses_numeric_keys() {
        let json = r#"{"hidden_size": 768, "id2label": {"0": "O", "1": "B-PER", "2": "I-PER"}}"#;
        let map = parse_id2label(json).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map[&1], "B-PER");
    }

    #[test]
    fn id2label_missing_is_an_error() {
        assert!(parse_id2label(r#"{"hidden_size": 768}"#).is_err());
    }

    #[test]
    fn bio_run_merges_into_one_span() {
        // "John Smith" as B-PER I-PER over two words
        let spans = aggregate_spans(&[
            piece(0..4, "B-PER"),
            piece(5..10, "I-PER"),
            piece(11..16, "O"),
        ]);
        assert_eq!(spans, vec![EntitySpan::new(0, 10, EntityLabel::Person)]);
    }

    #[test]
    fn wordpiece_continuations_extend_the_span() {
        // "Micro ##soft": subword pieces share the word's label run
        let spans = aggregate_spans(&[piece(0..5, "B-ORG"), piece(5..9, "I-ORG")]);
        assert_eq!(spans, vec![EntitySpan::new(0, 9, EntityLabel::Org)]);
    }

    #[test]
    fn b_tag_starts_a_fresh_span_even_for_same_label() {
        // two consecutive single-word people
        let spans = aggregate_spans(&[piece(0..4, "B-PER"), piece(5..9, "B-PER")]);
        assert_eq!(
            spans,
            vec![
                EntitySpan::new(0, 4, EntityLabel::Person),
                EntitySpan::new(5, 9, EntityLabel::Person),
            ]
        );
    }

    #[test]
    fn label_change_splits_spans() {
        let spans = aggregate_spans(&[piece(0..4, "B-PER"), piece(5..9, "I-ORG")]);
        assert_eq!(
            spans,
            vec![
                EntitySpan::new(0, 4, EntityLabel::Person),
                EntitySpan::new(5, 9, EntityLabel::Org),
            ]
        );
    }

    #[test]
    fn o_gap_closes_the_span() {
        let spans = aggregate_spans(&[
            piece(0..4, "B-ORG"),
            piece(5..8, "O"),
            piece(9..13, "I-ORG"),
        ]);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn zero_gap_spans_merge_across_windows() {
        let spans = merge_zero_gap_spans(vec![
            EntitySpan::new(0, 5, EntityLabel::Org),
            EntitySpan::new(5, 9, EntityLabel::Org),
            EntitySpan::new(12, 15, EntityLabel::Org),
        ]);
        assert_eq!(
            spans,
            vec![
                EntitySpan::new(0, 9, EntityLabel::Org),
                EntitySpan::new(12, 15, EntityLabel::Org),
            ]
        );
    }

    #[test]
    fn unknown_labels_behave_like_o() {
        let spans = aggregate_spans(&[piece(0..4, "B-DATE"), piece(5..9, "B-PER")]);
        assert_eq!(spans, vec![EntitySpan::new(5, 9, EntityLabel::Person)]);
    }
}
