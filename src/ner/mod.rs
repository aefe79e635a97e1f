//! Named-entity recognition: pipeline trait, labels, and span merging.
//!
//! The pipeline contract is batch-oriented: one call takes every rendered
//! Markdown string and returns per-string results in the same order. The
//! heavy model lives behind [`NerPipeline`] so tests can substitute a
//! deterministic double; the production implementation is
//! [`bert::BertNer`].
//!
//! Span merging mirrors a `merge_entities` post-processing stage: the
//! model emits one label per wordpiece, [`bert`] aggregates contiguous
//! BIO tags into [`EntitySpan`]s, and [`spans_to_tokens`] turns each
//! multi-token entity into a single [`TaggedToken`] so downstream
//! redaction replaces whole names, never fragments.

pub mod bert;

use crate::error::RedactError;
use serde::{Deserialize, Serialize};

/// Merged entity category.
///
/// Mapped from the model's BIO tag set (`B-PER`/`I-PER` → `Person`, …).
/// Only `Person` and `Org` are redacted; everything else passes through
/// the anonymizer verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityLabel {
    Person,
    Org,
    Loc,
    Misc,
}

impl EntityLabel {
    /// Parse a model label such as `B-PER`, `I-ORG`, or `O`.
    pub fn from_model_label(label: &str) -> Option<Self> {
        let bare = label
            .strip_prefix("B-")
            .or_else(|| label.strip_prefix("I-"))
            .unwrap_or(label);
        match bare {
            "PER" | "PERSON" => Some(EntityLabel::Person),
            "ORG" => Some(EntityLabel::Org),
            "LOC" | "GPE" => Some(EntityLabel::Loc),
            "MISC" => Some(EntityLabel::Misc),
            _ => None,
        }
    }

    /// The bracketed tag body written to output for redacted labels.
    pub fn tag(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Org => "ORG",
            EntityLabel::Loc => "LOC",
            EntityLabel::Misc => "MISC",
        }
    }

    /// Whether this label is replaced by its tag during anonymization.
    pub fn is_redacted(&self) -> bool {
        matches!(self, EntityLabel::Person | EntityLabel::Org)
    }
}

/// A merged entity occurrence: a byte range into the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, label: EntityLabel) -> Self {
        Self { start, end, label }
    }
}

/// A unit of reconstructed output text.
///
/// Invariant: concatenating `text` followed by `whitespace` over a whole
/// token stream reproduces the source string byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    /// Literal token text (a merged entity is one token).
    pub text: String,
    /// The whitespace that followed the token in the source.
    pub whitespace: String,
    /// Merged entity label, if the token is part of a recognized entity.
    pub label: Option<EntityLabel>,
}

/// Batch NER over rendered Markdown strings.
pub trait NerPipeline {
    /// Recognize entities in each text. Results are order-correspondent
    /// with the input; spans are byte ranges into the matching text.
    fn entity_spans(&self, texts: &[String]) -> Result<Vec<Vec<EntitySpan>>, RedactError>;

    /// Run recognition and convert each text into a token stream with
    /// merged entity spans as single tokens.
    fn pipe(&self, texts: &[String]) -> Result<Vec<Vec<TaggedToken>>, RedactError> {
        let spans = self.entity_spans(texts)?;
        Ok(texts
            .iter()
            .zip(spans.iter())
            .map(|(text, spans)| spans_to_tokens(text, spans))
            .collect())
    }
}

/// Split `text` into a token stream, emitting each entity span as a
/// single token and every unlabeled region as whitespace-delimited
/// tokens.
///
/// Spans that are out of bounds, empty, not on char boundaries, or
/// overlapping an earlier span are dropped rather than corrupting the
/// stream. Trailing whitespace after an entity is captured on the entity
/// token so reconstruction stays exact.
pub fn spans_to_tokens(text: &str, spans: &[EntitySpan]) -> Vec<TaggedToken> {
    let mut sorted: Vec<&EntitySpan> = spans
        .iter()
        .filter(|s| {
            s.start < s.end
                && s.end <= text.len()
                && text.is_char_boundary(s.start)
                && text.is_char_boundary(s.end)
        })
        .collect();
    sorted.sort_by_key(|s| (s.start, s.end));

    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    for span in sorted {
        if span.start < cursor {
            continue; // overlaps the previous span
        }
        push_plain(&mut tokens, &text[cursor..span.start]);

        let tail = &text[span.end..];
        let ws_len = tail.len() - tail.trim_start().len();
        tokens.push(TaggedToken {
            text: text[span.start..span.end].to_string(),
            whitespace: tail[..ws_len].to_string(),
            label: Some(span.label),
        });
        cursor = span.end + ws_len;
    }

    push_plain(&mut tokens, &text[cursor..]);
    tokens
}

/// Tokenize an unlabeled region into (word, trailing-whitespace) pairs.
///
/// Leading whitespace attaches to the previous token when one exists;
/// at the very start of a document it becomes a text-less token instead,
/// preserving the reconstruction invariant.
fn push_plain(tokens: &mut Vec<TaggedToken>, region: &str) {
    let mut rest = region;

    let ws_len = rest.len() - rest.trim_start().len();
    if ws_len > 0 {
        let (ws, tail) = rest.split_at(ws_len);
        match tokens.last_mut() {
            Some(last) => last.whitespace.push_str(ws),
            None => tokens.push(TaggedToken {
                text: String::new(),
                whitespace: ws.to_string(),
                label: None,
            }),
        }
        rest = tail;
    }

    while !rest.is_empty() {
        let word_len = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        let (word, tail) = rest.split_at(word_len);
        let ws_len = tail.len() - tail.trim_start().len();
        let (ws, tail) = tail.split_at(ws_len);
        tokens.push(TaggedToken {
            text: word.to_string(),
            whitespace: ws.to_string(),
            label: None,
        });
        rest = tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(tokens: &[TaggedToken]) -> String {
        tokens
            .iter()
            .map(|t| format!("{}{}", t.text, t.whitespace))
            .collect()
    }

    #[test]
    fn label_parsing_covers_bio_prefixes() {
        assert_eq!(
            EntityLabel::from_model_label("B-PER"),
            Some(EntityLabel::Person)
        );
        assert_eq!(
            EntityLabel::from_model_label("I-ORG"),
            Some(EntityLabel::Org)
        );
        assert_eq!(
            EntityLabel::from_model_label("LOC"),
            Some(EntityLabel::Loc)
        );
        assert_eq!(EntityLabel::from_model_label("O"), None);
        assert_eq!(EntityLabel::from_model_label(""), None);
    }

    #[test]
    fn only_person_and_org_are_redacted() {
        assert!(EntityLabel::Person.is_redacted());
        assert!(EntityLabel::Org.is_redacted());
        assert!(!EntityLabel::Loc.is_redacted());
        assert!(!EntityLabel::Misc.is_redacted());
    }

    #[test]
    fn no_spans_yields_plain_word_stream() {
        let tokens = spans_to_tokens("one two  three", &[]);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "one");
        assert_eq!(tokens[1].whitespace, "  ");
        assert!(tokens.iter().all(|t| t.label.is_none()));
        assert_eq!(reconstruct(&tokens), "one two  three");
    }

    #[test]
    fn entity_span_becomes_single_token() {
        let text = "Report by John Smith today.";
        let spans = [EntitySpan::new(10, 20, EntityLabel::Person)];
        let tokens = spans_to_tokens(text, &spans);
        let entity: Vec<&TaggedToken> = tokens.iter().filter(|t| t.label.is_some()).collect();
        assert_eq!(entity.len(), 1);
        assert_eq!(entity[0].text, "John Smith");
        assert_eq!(entity[0].whitespace, " ");
        assert_eq!(reconstruct(&tokens), text);
    }

    #[test]
    fn adjacent_entities_stay_separate_tokens() {
        let text = "Acme Corp hired Jane Doe";
        let spans = [
            EntitySpan::new(0, 9, EntityLabel::Org),
            EntitySpan::new(16, 24, EntityLabel::Person),
        ];
        let tokens = spans_to_tokens(text, &spans);
        assert_eq!(
            tokens
                .iter()
                .filter(|t| t.label.is_some())
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>(),
            vec!["Acme Corp", "Jane Doe"]
        );
        assert_eq!(reconstruct(&tokens), text);
    }

    #[test]
    fn leading_whitespace_is_preserved() {
        let text = "  indented start";
        let tokens = spans_to_tokens(text, &[]);
        assert_eq!(tokens[0].text, "");
        assert_eq!(tokens[0].whitespace, "  ");
        assert_eq!(reconstruct(&tokens), text);
    }

    #[test]
    fn entity_at_end_of_text() {
        let text = "signed by Ada Lovelace";
        let spans = [EntitySpan::new(10, 22, EntityLabel::Person)];
        let tokens = spans_to_tokens(text, &spans);
        let last = tokens.last().unwrap();
        assert_eq!(last.text, "Ada Lovelace");
        assert_eq!(last.whitespace, "");
        assert_eq!(reconstruct(&tokens), text);
    }

    #[test]
    fn entity_followed_by_punctuation_keeps_empty_whitespace() {
        let text = "at IBM, yesterday";
        let spans = [EntitySpan::new(3, 6, EntityLabel::Org)];
        let tokens = spans_to_tokens(text, &spans);
        let entity = tokens.iter().find(|t| t.label.is_some()).unwrap();
        assert_eq!(entity.text, "IBM");
        assert_eq!(entity.whitespace, "");
        assert_eq!(reconstruct(&tokens), text);
    }

    #[test]
    fn invalid_and_overlapping_spans_are_dropped() {
        let text = "short text";
        let spans = [
            EntitySpan::new(0, 5, EntityLabel::Org),
            EntitySpan::new(3, 8, EntityLabel::Person), // overlaps the first
            EntitySpan::new(50, 60, EntityLabel::Person), // out of bounds
            EntitySpan::new(4, 4, EntityLabel::Person),   // empty
        ];
        let tokens = spans_to_tokens(text, &spans);
        assert_eq!(tokens.iter().filter(|t| t.label.is_some()).count(), 1);
        assert_eq!(reconstruct(&tokens), text);
    }

    #[test]
    fn reconstruction_is_exact_across_newlines_and_tabs() {
        let text = "# Title\n\nBody\twith tabs \n and Jane";
        let spans = [EntitySpan::new(30, 34, EntityLabel::Person)];
        assert_eq!(reconstruct(&spans_to_tokens(text, &spans)), text);
    }
}
