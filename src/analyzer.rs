//! Per-chunk analysis stage.
//!
//! Feeds each chunk through the fixed instruction prompt and the model
//! client, in order, collecting one [`ChunkReport`] per chunk. A chunk whose
//! call exhausts its retry budget yields a labeled placeholder report rather
//! than aborting the run; one bad chunk must not block analysis of the rest.

use crate::client::ModelClient;
use crate::models::ChunkReport;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::prompts;

/// Analyze every chunk in order. Always returns exactly one report per
/// chunk, in input order, regardless of individual failures.
pub async fn analyze_chunks(
    client: &dyn ModelClient,
    chunks: &[String],
    progress: &dyn ProgressReporter,
) -> Vec<ChunkReport> {
    let total = chunks.len();
    let mut reports = Vec::with_capacity(total);

    for (i, chunk) in chunks.iter().enumerate() {
        let index = i + 1;
        progress.report(ProgressEvent::AnalyzingChunk { index, total });

        let prompt = prompts::chunk_prompt(chunk);
        match client.call(&prompt).await {
            Ok(body) => reports.push(ChunkReport::analysis(index, &body)),
            Err(e) => {
                progress.report(ProgressEvent::ChunkFailed {
                    index,
                    error: format!("{:#}", e),
                });
                reports.push(ChunkReport::placeholder(index, &e));
            }
        }
    }

    reports
}
