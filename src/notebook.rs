//! Notebook parsing and validation.
//!
//! Stage 1 of the conversion pipeline. Reads an `.ipynb` file (nbformat JSON)
//! and produces a typed, immutable [`Notebook`] that the render stage consumes.
//! Validation is eager: every cell is checked here, before any output is
//! emitted, so a malformed document never leaves a half-written post behind.
//!
//! ## Consumed Fields
//!
//! Only the fields the converter actually renders are modeled; everything
//! else in the document (metadata, ids, nbformat version) is ignored:
//!
//! - cell `cell_type` (`"markdown"` | `"code"`), `source`
//! - code cell `execution_count` (display label only) and `outputs`
//! - output `output_type` plus its kind-specific payload: `data` with
//!   `text/plain` or `image/png`, `text`, `traceback`
//!
//! ## Validation
//!
//! The parser enforces these rules:
//! - The document must carry a top-level `cells` array
//! - Every output's `output_type` must be a recognized kind
//! - Every cell must deserialize into the schema above
//!
//! Any violation is fatal and reports the offending cell verbatim so the
//! document can be fixed by hand.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Output kinds the renderer knows how to emit.
///
/// `pyerr` is the nbformat v3 spelling of `error`; both carry a traceback.
const RECOGNIZED_OUTPUT_KINDS: &[&str] =
    &["stream", "execute_result", "display_data", "error", "pyerr"];

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("notebook has no `cells` array")]
    MissingCells,
    #[error("malformed {cell_type} cell: {source}\noffending cell: {cell}")]
    MalformedCell {
        cell_type: String,
        source: serde_json::Error,
        cell: String,
    },
    #[error("unknown output kinds: {}\noffending cell: {}", .kinds.join(", "), .cell)]
    UnknownOutputKinds { kinds: Vec<String>, cell: String },
}

/// A parsed notebook: an ordered sequence of cells, nothing more.
///
/// The document has no identity of its own — the post title is derived
/// from the input filename by the caller.
#[derive(Debug, Clone)]
pub struct Notebook {
    pub cells: Vec<Cell>,
}

/// One unit of the notebook, addressed only by its position.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown {
        source: Text,
    },
    Code {
        source: Text,
        /// Execution order, or `None` for a never-run cell. Display label
        /// only. The key must be present (nbformat always writes it, as
        /// `null` for never-run cells); a cell without it is malformed.
        #[serde(deserialize_with = "nullable_count")]
        execution_count: Option<i64>,
        outputs: Vec<Output>,
    },
}

/// Plain `Option` deserialization, spelled out so serde treats a missing
/// `execution_count` key as an error instead of defaulting to `None`.
fn nullable_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer)
}

/// Captured result of executing a code cell.
///
/// MIME payloads stay as raw [`Value`]s: real notebooks carry payloads the
/// converter never reads (`text/html`, `application/json`, …) and those must
/// not fail the parse. Use [`mime_text`] to extract the one that matters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        text: Text,
    },
    ExecuteResult {
        data: BTreeMap<String, Value>,
    },
    DisplayData {
        data: BTreeMap<String, Value>,
    },
    #[serde(alias = "pyerr")]
    Error {
        /// One line per frame, possibly ANSI-colored.
        traceback: Vec<String>,
    },
}

/// Text stored either as one string or as a list of fragments.
///
/// nbformat permits both shapes for `source` and stream `text`; fragments
/// already carry their own trailing newlines, so joining is plain
/// concatenation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Single(String),
    Fragments(Vec<String>),
}

impl Text {
    /// Concatenate fragments verbatim — no separators added.
    pub fn joined(&self) -> String {
        match self {
            Text::Single(s) => s.clone(),
            Text::Fragments(parts) => parts.concat(),
        }
    }
}

/// Extract a MIME payload as text, joining fragment lists verbatim.
///
/// Returns `None` when the key is absent or the payload is not textual.
pub fn mime_text(data: &BTreeMap<String, Value>, mime: &str) -> Option<String> {
    match data.get(mime)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(parts.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}

/// Read and validate a notebook file.
pub fn parse(path: &Path) -> Result<Notebook, NotebookError> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    from_value(&value)
}

/// Validate an already-parsed JSON document.
pub fn from_value(value: &Value) -> Result<Notebook, NotebookError> {
    let raw_cells = value
        .get("cells")
        .and_then(Value::as_array)
        .ok_or(NotebookError::MissingCells)?;

    let mut cells = Vec::with_capacity(raw_cells.len());
    for raw in raw_cells {
        cells.push(parse_cell(raw)?);
    }
    Ok(Notebook { cells })
}

fn parse_cell(raw: &Value) -> Result<Cell, NotebookError> {
    // Output kinds are checked before deserialization so the error names
    // the kinds rather than surfacing as a generic variant mismatch.
    let unknown = unknown_output_kinds(raw);
    if !unknown.is_empty() {
        return Err(NotebookError::UnknownOutputKinds {
            kinds: unknown,
            cell: pretty(raw),
        });
    }

    serde_json::from_value(raw.clone()).map_err(|source| NotebookError::MalformedCell {
        cell_type: raw
            .get("cell_type")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_string(),
        source,
        cell: pretty(raw),
    })
}

/// Collect declared output kinds outside the recognized set, deduplicated.
fn unknown_output_kinds(raw: &Value) -> Vec<String> {
    let Some(outputs) = raw.get("outputs").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut kinds: Vec<String> = outputs
        .iter()
        .filter_map(|o| o.get("output_type").and_then(Value::as_str))
        .filter(|kind| !RECOGNIZED_OUTPUT_KINDS.contains(kind))
        .map(str::to_string)
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
