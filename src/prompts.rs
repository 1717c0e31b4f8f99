//! Instruction prompts for the two analysis stages.
//!
//! Both stages look for the same four inconsistency categories; the chunk
//! prompt applies them within one chunk of slide text, the reconciliation
//! prompt applies them across the per-chunk reports.

/// Marker line the chunk prompt asks the model to emit for clean chunks.
pub const NO_FINDINGS_MARKER: &str = "No inconsistencies found in this chunk.";

/// Prompt for analyzing a single chunk of combined slide content.
pub fn chunk_prompt(chunk: &str) -> String {
    format!(
        "Analyze this presentation content for inconsistencies:\n\n\
         Look for:\n\
         1) Numerical conflicts (same metric, different values)\n\
         2) Contradictory statements\n\
         3) Timeline mismatches\n\
         4) Mathematical errors\n\n\
         Extract and list ANY inconsistencies you find with specific slide references.\n\
         If no issues in this chunk, respond: '{}'\n\n\
         Content:\n{}",
        NO_FINDINGS_MARKER, chunk
    )
}

/// Prompt for merging the per-chunk reports into one final summary.
pub fn reconcile_prompt(all_reports: &str) -> String {
    format!(
        "Review these individual chunk analyses and identify any cross-chunk inconsistencies:\n\n\
         Focus on:\n\
         1) Same metrics with different values across different chunks/slides\n\
         2) Contradictory facts mentioned in different parts\n\
         3) Timeline conflicts across the presentation\n\
         4) Any patterns of inconsistency\n\n\
         Provide a final summary in this format:\n\
         ANALYSIS RESULTS:\n\
         Issues Found: [number]\n\n\
         Issue 1: [Type]\n\
         - Slides: [numbers]\n\
         - Description: [explanation]\n\
         - Details: [specifics]\n\
         - Severity: [High/Medium/Low]\n\n\
         If no cross-chunk issues: 'Issues Found: 0 - No significant inconsistencies detected.'\n\n\
         Chunk Analyses:\n{}",
        all_reports
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_prompt_embeds_content_after_categories() {
        let p = chunk_prompt("--- SLIDE 1 ---\nRevenue was $2M");
        assert!(p.contains("Numerical conflicts"));
        assert!(p.contains("Timeline mismatches"));
        assert!(p.ends_with("--- SLIDE 1 ---\nRevenue was $2M"));
    }

    #[test]
    fn reconcile_prompt_specifies_summary_layout() {
        let p = reconcile_prompt("Chunk 1 Analysis:\n...");
        assert!(p.contains("ANALYSIS RESULTS:"));
        assert!(p.contains("Issues Found: [number]"));
        assert!(p.ends_with("Chunk 1 Analysis:\n..."));
    }
}
