//! Analysis progress reporting.
//!
//! Reports observable progress during `deckaudit analyze` so users see how
//! the deck was chunked, which chunk is being analyzed, and how model calls
//! are going. Progress is emitted on **stderr** so stdout stays parseable
//! (the final report is printed there).
//!
//! Progress is observational only; no correctness depends on it.

use std::io::Write;

/// A single progress event for an analysis run.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// The combined slide text was split. `chunk_count == 1` is the
    /// "fits in one chunk" fast path.
    Chunked {
        total_chars: usize,
        chunk_count: usize,
        max_size: usize,
    },
    /// Starting analysis of chunk `index` out of `total`.
    AnalyzingChunk { index: usize, total: usize },
    /// Chunk `index` exhausted its retries; a placeholder report was recorded.
    ChunkFailed { index: usize, error: String },
    /// Cross-chunk reconciliation call is starting.
    Reconciling { chunk_count: usize },
    /// A model call attempt is being issued.
    CallAttempt {
        attempt: u32,
        max_attempts: u32,
        prompt_chars: usize,
    },
    /// The model call returned successfully.
    CallSucceeded { attempt: u32 },
    /// One attempt failed (the retry loop may still continue).
    CallFailed { attempt: u32, error: String },
}

/// Reports analysis progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the pipeline and the model client.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "analyze  chunk 2 / 3".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Chunked {
                total_chars,
                chunk_count,
                max_size,
            } => {
                if *chunk_count == 1 {
                    format!(
                        "analyze  content fits in one chunk ({} / {} chars)\n",
                        total_chars, max_size
                    )
                } else {
                    format!(
                        "analyze  split {} chars into {} chunks (max {})\n",
                        total_chars, chunk_count, max_size
                    )
                }
            }
            ProgressEvent::AnalyzingChunk { index, total } => {
                format!("analyze  chunk {} / {}\n", index, total)
            }
            ProgressEvent::ChunkFailed { index, error } => {
                format!("analyze  chunk {} failed: {}\n", index, error)
            }
            ProgressEvent::Reconciling { chunk_count } => {
                format!("analyze  reconciling {} chunk reports\n", chunk_count)
            }
            ProgressEvent::CallAttempt {
                attempt,
                max_attempts,
                prompt_chars,
            } => {
                format!(
                    "model    call attempt {} / {} ({} chars)\n",
                    attempt, max_attempts, prompt_chars
                )
            }
            ProgressEvent::CallSucceeded { attempt } => {
                format!("model    call ok (attempt {})\n", attempt)
            }
            ProgressEvent::CallFailed { attempt, error } => {
                format!("model    attempt {} failed: {}\n", attempt, error)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Chunked {
                total_chars,
                chunk_count,
                max_size,
            } => serde_json::json!({
                "event": "chunked",
                "total_chars": total_chars,
                "chunk_count": chunk_count,
                "max_size": max_size
            }),
            ProgressEvent::AnalyzingChunk { index, total } => serde_json::json!({
                "event": "analyzing_chunk",
                "index": index,
                "total": total
            }),
            ProgressEvent::ChunkFailed { index, error } => serde_json::json!({
                "event": "chunk_failed",
                "index": index,
                "error": error
            }),
            ProgressEvent::Reconciling { chunk_count } => serde_json::json!({
                "event": "reconciling",
                "chunk_count": chunk_count
            }),
            ProgressEvent::CallAttempt {
                attempt,
                max_attempts,
                prompt_chars,
            } => serde_json::json!({
                "event": "call_attempt",
                "attempt": attempt,
                "max_attempts": max_attempts,
                "prompt_chars": prompt_chars
            }),
            ProgressEvent::CallSucceeded { attempt } => serde_json::json!({
                "event": "call_succeeded",
                "attempt": attempt
            }),
            ProgressEvent::CallFailed { attempt, error } => serde_json::json!({
                "event": "call_failed",
                "attempt": attempt,
                "error": error
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller passes it to the pipeline.
    pub fn reporter(&self) -> std::sync::Arc<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => std::sync::Arc::new(NoProgress),
            ProgressMode::Human => std::sync::Arc::new(StderrProgress),
            ProgressMode::Json => std::sync::Arc::new(JsonProgress),
        }
    }
}
