//! Core data models used throughout Deck Audit.
//!
//! These types represent the slide content, chunks, and per-chunk analyses
//! that flow through the extraction and analysis pipeline.

use std::collections::BTreeMap;

/// Kinds of slide elements the extractor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementKind {
    Text,
    Table,
    Chart,
    Image,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Table => "table",
            ElementKind::Chart => "chart",
            ElementKind::Image => "image",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content extracted from a single slide. Immutable input to the pipeline.
#[derive(Debug, Clone)]
pub struct SlideRecord {
    /// 1-based slide number, in presentation order.
    pub slide_number: u32,
    /// Combined text content of the slide (text runs, flattened tables,
    /// chart summaries), ready for analysis.
    pub content: String,
    /// How many elements of each kind the slide contained.
    pub content_types: BTreeMap<ElementKind, usize>,
    /// Total number of extracted elements.
    pub total_elements: usize,
}

/// The model's analysis of one chunk of the combined slide text.
#[derive(Debug, Clone)]
pub struct ChunkReport {
    /// 1-based index of the chunk this report covers.
    pub chunk_index: usize,
    /// Labeled report text: either the model's findings (or its explicit
    /// "no inconsistencies" marker) or a failure placeholder.
    pub text: String,
    /// True when the model call for this chunk exhausted its retries and
    /// `text` is a placeholder rather than a real analysis.
    pub failed: bool,
}

impl ChunkReport {
    /// A real analysis, labeled with its chunk index.
    pub fn analysis(chunk_index: usize, body: &str) -> Self {
        Self {
            chunk_index,
            text: format!("Chunk {} Analysis:\n{}", chunk_index, body),
            failed: false,
        }
    }

    /// Placeholder substituted when the chunk's model call permanently failed.
    pub fn placeholder(chunk_index: usize, error: &anyhow::Error) -> Self {
        Self {
            chunk_index,
            text: format!(
                "Chunk {} Analysis:\n[analysis failed: {:#}]",
                chunk_index, error
            ),
            failed: true,
        }
    }
}
