//! Rich-text content document.
//!
//! # Responsibility
//! - Carry the editor's block tree as an opaque JSON value.
//! - Provide a canonical serialized snapshot for cheap equality checks.
//! - Derive plain-text and preview projections for the note list.
//!
//! # Invariants
//! - A well-formed document is a JSON array of block objects.
//! - Every block has a non-empty string `type`; `children`, when present, is
//!   an array of blocks.
//! - Snapshots are canonical: object keys serialize in sorted order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PREVIEW_MAX_CHARS: usize = 100;

static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\*_`#>~\-\[\]\(\)!]+"#).expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Structural problem found in a content document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentValidationError {
    /// Top-level value is not an array of blocks.
    NotBlockList,
    /// One block is malformed. `path` is the dotted index path of the block.
    InvalidBlock { path: String, reason: &'static str },
}

impl Display for ContentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotBlockList => write!(f, "content must be a list of blocks"),
            Self::InvalidBlock { path, reason } => write!(f, "block {path}: {reason}"),
        }
    }
}

impl Error for ContentValidationError {}

/// Editor document value (tree of blocks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDoc(Value);

impl Default for ContentDoc {
    fn default() -> Self {
        Self::empty()
    }
}

impl ContentDoc {
    /// Document with a single empty paragraph.
    pub fn empty() -> Self {
        Self(json!([{ "type": "paragraph", "content": [] }]))
    }

    /// Wraps a raw editor value without validating it.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Builds one paragraph per input line.
    pub fn from_plain_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::empty();
        }

        let blocks = text
            .split('\n')
            .map(|line| {
                let inline = if line.is_empty() {
                    Vec::new()
                } else {
                    vec![json!({ "type": "text", "text": line })]
                };
                json!({ "type": "paragraph", "content": inline })
            })
            .collect::<Vec<_>>();
        Self(Value::Array(blocks))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Canonical compact JSON used for change detection.
    pub fn to_snapshot(&self) -> String {
        self.0.to_string()
    }

    /// Concatenated text of all blocks, one line per block.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        if let Value::Array(blocks) = &self.0 {
            for block in blocks {
                collect_block_text(block, &mut lines);
            }
        }
        lines.join("\n")
    }

    /// Sidebar preview: markdown symbols removed, whitespace collapsed,
    /// first 100 chars kept.
    pub fn preview(&self) -> Option<String> {
        derive_preview(&self.plain_text())
    }

    /// Checks the block-tree shape.
    pub fn validate(&self) -> Result<(), ContentValidationError> {
        let Value::Array(blocks) = &self.0 else {
            return Err(ContentValidationError::NotBlockList);
        };
        validate_blocks(blocks, "")
    }
}

/// Derives a one-line preview from plain text.
pub fn derive_preview(text: &str) -> Option<String> {
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(text, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

fn collect_block_text(block: &Value, lines: &mut Vec<String>) {
    let Some(fields) = block.as_object() else {
        return;
    };

    lines.push(inline_text(fields));
    if let Some(Value::Array(children)) = fields.get("children") {
        for child in children {
            collect_block_text(child, lines);
        }
    }
}

fn inline_text(fields: &Map<String, Value>) -> String {
    match fields.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(inlines)) => inlines
            .iter()
            .filter_map(|inline| inline.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

fn validate_blocks(blocks: &[Value], parent: &str) -> Result<(), ContentValidationError> {
    for (index, block) in blocks.iter().enumerate() {
        let path = if parent.is_empty() {
            index.to_string()
        } else {
            format!("{parent}.{index}")
        };

        let Some(fields) = block.as_object() else {
            return Err(ContentValidationError::InvalidBlock {
                path,
                reason: "block must be an object",
            });
        };

        match fields.get("type") {
            Some(Value::String(kind)) if !kind.trim().is_empty() => {}
            _ => {
                return Err(ContentValidationError::InvalidBlock {
                    path,
                    reason: "block type must be a non-empty string",
                })
            }
        }

        match fields.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => validate_blocks(children, &path)?,
            Some(_) => {
                return Err(ContentValidationError::InvalidBlock {
                    path,
                    reason: "children must be a list of blocks",
                })
            }
        }
    }
    Ok(())
}
