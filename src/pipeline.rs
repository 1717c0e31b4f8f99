//! Analysis pipeline orchestration.
//!
//! Sequences the four stages — slide concatenation → chunking → per-chunk
//! analysis → reconciliation — threading an explicit record between stages.
//! The records are produced once and never mutated, so a later feature can
//! re-run only reconciliation from cached [`AnalyzedChunks`] without
//! touching the earlier stages.

use anyhow::Result;

use crate::analyzer::analyze_chunks;
use crate::chunk::chunk_text;
use crate::client::ModelClient;
use crate::config::AnalysisConfig;
use crate::models::{ChunkReport, SlideRecord};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::reconcile::reconcile;

/// Output of the concatenation stage: all slide content in one delimited block.
#[derive(Debug, Clone)]
pub struct CombinedText {
    pub text: String,
    pub slide_count: usize,
}

/// Output of the chunking stage.
#[derive(Debug, Clone)]
pub struct ChunkedText {
    pub chunks: Vec<String>,
}

/// Output of the per-chunk analysis stage.
#[derive(Debug, Clone)]
pub struct AnalyzedChunks {
    pub chunk_count: usize,
    pub reports: Vec<ChunkReport>,
}

/// Concatenate slide contents in ascending slide-number order, each slide
/// prefixed by a `--- SLIDE <n> ---` marker.
pub fn combine_slides(slides: &[SlideRecord]) -> CombinedText {
    let mut ordered: Vec<&SlideRecord> = slides.iter().collect();
    ordered.sort_by_key(|s| s.slide_number);

    let mut text = String::new();
    for slide in &ordered {
        text.push_str(&format!(
            "\n--- SLIDE {} ---\n{}\n",
            slide.slide_number, slide.content
        ));
    }

    CombinedText {
        text,
        slide_count: ordered.len(),
    }
}

/// Run the full analysis pipeline over extracted slides and return the
/// final report text.
pub async fn run_pipeline(
    client: &dyn ModelClient,
    analysis: &AnalysisConfig,
    slides: &[SlideRecord],
    progress: &dyn ProgressReporter,
) -> Result<String> {
    let combined = combine_slides(slides);

    let chunked = ChunkedText {
        chunks: chunk_text(&combined.text, analysis.max_chunk_size),
    };
    progress.report(ProgressEvent::Chunked {
        total_chars: combined.text.len(),
        chunk_count: chunked.chunks.len(),
        max_size: analysis.max_chunk_size,
    });

    let analyzed = AnalyzedChunks {
        chunk_count: chunked.chunks.len(),
        reports: analyze_chunks(client, &chunked.chunks, progress).await,
    };

    reconcile(client, analyzed.chunk_count, &analyzed.reports, progress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn slide(n: u32, content: &str) -> SlideRecord {
        SlideRecord {
            slide_number: n,
            content: content.to_string(),
            content_types: BTreeMap::new(),
            total_elements: 1,
        }
    }

    struct RecordingClient {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelClient for RecordingClient {
        async fn call(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Inconsistency: revenue differs between slides 1 and 2.".to_string())
        }
    }

    #[test]
    fn slides_combine_in_ascending_order_with_markers() {
        let slides = vec![slide(2, "Revenue was $3M"), slide(1, "Revenue was $2M")];
        let combined = combine_slides(&slides);

        assert_eq!(combined.slide_count, 2);
        let one = combined.text.find("--- SLIDE 1 ---").unwrap();
        let two = combined.text.find("--- SLIDE 2 ---").unwrap();
        assert!(one < two);
        assert!(combined.text.contains("Revenue was $2M"));
        assert!(combined.text.contains("Revenue was $3M"));
    }

    #[tokio::test]
    async fn small_deck_issues_one_call_and_returns_its_text() {
        // Scenario: both slides fit one chunk, so the analysis call's text
        // comes back verbatim with no reconciliation call.
        let client = RecordingClient::new();
        let analysis = AnalysisConfig::default();
        let slides = vec![slide(1, "Revenue was $2M"), slide(2, "Revenue was $3M")];

        let report = run_pipeline(&client, &analysis, &slides, &NoProgress)
            .await
            .unwrap();

        assert_eq!(client.call_count(), 1);
        assert_eq!(
            report,
            "Inconsistency: revenue differs between slides 1 and 2."
        );
    }

    #[tokio::test]
    async fn large_deck_makes_one_call_per_chunk_plus_reconciliation() {
        // Combined text of 17,000 chars at max_chunk_size 8000 with newlines
        // in every window: 3 chunks, 3 analysis calls, 1 reconciliation call.
        let client = RecordingClient::new();
        let analysis = AnalysisConfig {
            max_chunk_size: 8000,
            ..AnalysisConfig::default()
        };

        let line = "metric line with a figure of $1,000\n";
        let per_slide = line.repeat(80); // 2,880 chars per slide
        let slides: Vec<SlideRecord> = (1..=6).map(|n| slide(n, &per_slide)).collect();

        let combined = combine_slides(&slides);
        assert!(combined.text.len() > 16_000 && combined.text.len() < 18_000);

        let report = run_pipeline(&client, &analysis, &slides, &NoProgress)
            .await
            .unwrap();

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 4);
        // First three calls are chunk analyses, the last is the merge.
        for prompt in &prompts[..3] {
            assert!(prompt.contains("Analyze this presentation content"));
        }
        assert!(prompts[3].contains("cross-chunk inconsistencies"));
        assert!(!report.is_empty());
    }

    #[tokio::test]
    async fn empty_deck_still_produces_a_report_without_reconciliation() {
        let client = RecordingClient::new();
        let analysis = AnalysisConfig::default();

        let report = run_pipeline(&client, &analysis, &[], &NoProgress)
            .await
            .unwrap();

        // Empty combined text is a single (empty) chunk: one analysis call,
        // no merge call.
        assert_eq!(client.call_count(), 1);
        assert!(!report.is_empty());
    }
}
