//! Cross-chunk reconciliation stage.
//!
//! Merges the per-chunk reports into the final report. A single-chunk run
//! skips the model entirely; a multi-chunk run issues exactly one merge
//! call. A failed merge call propagates as a run-level error — concatenated
//! raw reports would misrepresent themselves as a reconciled answer, so
//! there is no fallback.

use anyhow::{Context, Result};

use crate::client::ModelClient;
use crate::models::ChunkReport;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::prompts;

/// Label prefix stripped from the sole report on the single-chunk path.
const SINGLE_CHUNK_LABEL: &str = "Chunk 1 Analysis:\n";

/// Produce the final report text from the per-chunk reports.
pub async fn reconcile(
    client: &dyn ModelClient,
    chunk_count: usize,
    reports: &[ChunkReport],
    progress: &dyn ProgressReporter,
) -> Result<String> {
    if chunk_count == 1 {
        let text = reports
            .first()
            .map(|r| r.text.as_str())
            .unwrap_or_default();
        return Ok(text
            .strip_prefix(SINGLE_CHUNK_LABEL)
            .unwrap_or(text)
            .to_string());
    }

    progress.report(ProgressEvent::Reconciling { chunk_count });

    let all_reports = reports
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = prompts::reconcile_prompt(&all_reports);
    client
        .call(&prompt)
        .await
        .context("cross-chunk reconciliation failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingClient {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl ModelClient for CountingClient {
        async fn call(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("model call failed after 3 attempts");
            }
            Ok("Issues Found: 0 - No significant inconsistencies detected.".to_string())
        }
    }

    #[tokio::test]
    async fn single_chunk_skips_the_model_and_strips_the_label() {
        let client = CountingClient::new(false);
        let reports = vec![ChunkReport::analysis(1, "No inconsistencies found in this chunk.")];

        let result = reconcile(&client, 1, &reports, &NoProgress).await.unwrap();

        assert_eq!(result, "No inconsistencies found in this chunk.");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn multi_chunk_issues_exactly_one_call() {
        let client = CountingClient::new(false);
        let reports = vec![
            ChunkReport::analysis(1, "Revenue stated as $2M."),
            ChunkReport::analysis(2, "Revenue stated as $3M."),
        ];

        let result = reconcile(&client, 2, &reports, &NoProgress).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(result.contains("Issues Found"));
    }

    #[tokio::test]
    async fn merge_prompt_includes_every_labeled_report() {
        struct CapturingClient(std::sync::Mutex<String>);

        #[async_trait]
        impl ModelClient for CapturingClient {
            async fn call(&self, prompt: &str) -> Result<String> {
                *self.0.lock().unwrap() = prompt.to_string();
                Ok("merged".to_string())
            }
        }

        let client = CapturingClient(std::sync::Mutex::new(String::new()));
        let reports = vec![
            ChunkReport::analysis(1, "finding a"),
            ChunkReport::analysis(2, "finding b"),
        ];

        reconcile(&client, 2, &reports, &NoProgress).await.unwrap();

        let prompt = client.0.lock().unwrap();
        assert!(prompt.contains("Chunk 1 Analysis:\nfinding a"));
        assert!(prompt.contains("Chunk 2 Analysis:\nfinding b"));
    }

    #[tokio::test]
    async fn failed_reconciliation_propagates() {
        let client = CountingClient::new(true);
        let reports = vec![
            ChunkReport::analysis(1, "a"),
            ChunkReport::analysis(2, "b"),
        ];

        let err = reconcile(&client, 2, &reports, &NoProgress)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("reconciliation failed"));
    }
}
