//! Type definitions for extraction requests and payloads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Extraction engine run by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// spaCy layout pipeline
    #[default]
    Spacy,

    /// pdfplumber
    Plumber,

    /// Docling
    Docling,
}

impl Tool {
    /// All tools, in display order.
    pub const ALL: [Tool; 3] = [Tool::Spacy, Tool::Plumber, Tool::Docling];

    /// Path segment used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Spacy => "spacy",
            Tool::Plumber => "plumber",
            Tool::Docling => "docling",
        }
    }

    /// Capitalized name for tabs and headings.
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Spacy => "Spacy",
            Tool::Plumber => "Plumber",
            Tool::Docling => "Docling",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tool name.
#[derive(Debug, Clone, Error)]
#[error("Unknown tool '{0}', expected one of: spacy, plumber, docling")]
pub struct ParseToolError(String);

impl FromStr for Tool {
    type Err = ParseToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseToolError(s.to_string()))
    }
}

/// Options captured for a single extraction job.
///
/// A job keeps its own copy, so later form edits never reach a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionConfig {
    /// Extraction engine
    pub tool: Tool,

    /// Ask the backend to post-process its raw output
    pub process_output: bool,

    /// Include tables in the payload
    pub extract_tables: bool,

    /// Include text paragraphs in the payload
    pub extract_text: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tool: Tool::Spacy,
            process_output: true,
            extract_tables: true,
            extract_text: true,
        }
    }
}

/// A named table in an extraction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names
    pub headers: Vec<String>,

    /// Rows of cell values
    pub values: Vec<Vec<String>>,
}

/// Named tables in the order the backend sent them.
pub type Tables = IndexMap<String, Table>;

/// Decoded payload returned by the extraction backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Text paragraphs in document order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,

    /// Tables keyed by name, in backend order
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "tables_serde::deserialize"
    )]
    pub tables: Option<Tables>,
}

impl ExtractionResult {
    pub fn has_text(&self) -> bool {
        self.text.as_ref().is_some_and(|text| !text.is_empty())
    }

    pub fn has_tables(&self) -> bool {
        self.tables.as_ref().is_some_and(|tables| !tables.is_empty())
    }

    /// True when neither text nor tables were extracted.
    pub fn is_empty(&self) -> bool {
        !self.has_text() && !self.has_tables()
    }
}

// Backends either send the table mapping directly or wrap it in a list.
// List entries are merged in order; a repeated name gets a numeric suffix.
mod tables_serde {
    use super::Tables;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Map(Tables),
        List(Vec<Tables>),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Tables>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = Option::<Wire>::deserialize(deserializer)?;
        Ok(wire.map(|wire| match wire {
            Wire::Map(tables) => tables,
            Wire::List(list) => merge(list),
        }))
    }

    fn merge(list: Vec<Tables>) -> Tables {
        let mut merged = Tables::new();
        for (name, table) in list.into_iter().flatten() {
            let mut key = name.clone();
            let mut n = 2;
            while merged.contains_key(&key) {
                key = format!("{name} ({n})");
                n += 1;
            }
            merged.insert(key, table);
        }
        merged
    }
}
