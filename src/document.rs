//! Extracted-document model: a renderable structured content tree.
//!
//! A [`Document`] is what the extraction backend hands to the anonymizer:
//! a name derived from the source filename plus an ordered list of
//! [`Block`]s. It is never mutated after creation and lives only for the
//! duration of one run.

use serde::{Deserialize, Serialize};

/// One structural unit of extracted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// A heading with level 1–6.
    Heading { level: u8, text: String },
    /// A plain paragraph (line breaks already collapsed to spaces).
    Paragraph(String),
    /// A single bullet or numbered list item, marker stripped.
    ListItem(String),
    /// A table as rows of cells. Rows are uniform-width when cell
    /// matching was enabled during extraction.
    Table(Vec<Vec<String>>),
}

/// An extracted PDF document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier derived from the source file stem; the output file is
    /// named `{name}.md`.
    pub name: String,
    /// Content tree in reading order.
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            name: name.into(),
            blocks,
        }
    }

    /// Render the content tree to Markdown.
    ///
    /// Blocks are separated by blank lines; consecutive list items stay
    /// adjacent so they form one Markdown list. Tables render as GFM
    /// pipe tables with the first row treated as the header.
    pub fn to_markdown(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.blocks.len());
        let mut prev_was_list = false;

        for block in &self.blocks {
            let is_list = matches!(block, Block::ListItem(_));
            let rendered = match block {
                Block::Heading { level, text } => {
                    let level = (*level).clamp(1, 6) as usize;
                    format!("{} {}", "#".repeat(level), text)
                }
                Block::Paragraph(text) => text.clone(),
                Block::ListItem(text) => format!("- {}", text),
                Block::Table(rows) => render_table(rows),
            };

            if prev_was_list && is_list {
                // Glue onto the previous list item without a blank line.
                if let Some(last) = parts.last_mut() {
                    last.push('\n');
                    last.push_str(&rendered);
                } else {
                    parts.push(rendered);
                }
            } else {
                parts.push(rendered);
            }
            prev_was_list = is_list;
        }

        let mut md = parts.join("\n\n");
        if !md.is_empty() {
            md.push('\n');
        }
        md
    }
}

fn render_table(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        out.push('|');
        for c in 0..width {
            let cell = row.get(c).map(String::as_str).unwrap_or("");
            out.push(' ');
            out.push_str(cell);
            out.push_str(" |");
        }
        if i + 1 < rows.len() {
            out.push('\n');
        }
        if i == 0 {
            out.push('|');
            for _ in 0..width {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_renders_empty() {
        let doc = Document::new("empty", vec![]);
        assert_eq!(doc.to_markdown(), "");
    }

    #[test]
    fn heading_and_paragraph() {
        let doc = Document::new(
            "report",
            vec![
                Block::Heading {
                    level: 1,
                    text: "Quarterly Report".into(),
                },
                Block::Paragraph("Revenue grew in Q3.".into()),
            ],
        );
        assert_eq!(
            doc.to_markdown(),
            "# Quarterly Report\n\nRevenue grew in Q3.\n"
        );
    }

    #[test]
    fn heading_level_is_clamped() {
        let doc = Document::new(
            "d",
            vec![Block::Heading {
                level: 9,
                text: "Deep".into(),
            }],
        );
        assert!(doc.to_markdown().starts_with("###### Deep"));
    }

    #[test]
    fn consecutive_list_items_form_one_list() {
        let doc = Document::new(
            "list",
            vec![
                Block::ListItem("first".into()),
                Block::ListItem("second".into()),
                Block::Paragraph("after".into()),
            ],
        );
        assert_eq!(doc.to_markdown(), "- first\n- second\n\nafter\n");
    }

    #[test]
    fn table_renders_with_header_separator() {
        let doc = Document::new(
            "t",
            vec![Block::Table(vec![
                vec!["Name".into(), "Role".into()],
                vec!["Ada".into(), "Engineer".into()],
            ])],
        );
        assert_eq!(
            doc.to_markdown(),
            "| Name | Role |\n| --- | --- |\n| Ada | Engineer |\n"
        );
    }

    #[test]
    fn ragged_table_rows_pad_to_widest() {
        let md = render_table(&[
            vec!["a".into(), "b".into(), "c".into()],
            vec!["d".into()],
        ]);
        assert_eq!(md, "| a | b | c |\n| --- | --- | --- |\n| d |  |  |");
    }
}
