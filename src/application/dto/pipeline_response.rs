use crate::shared::error::RejectedCandidate;

/// PipelineResponse - Outcome of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResponse {
    /// Where the output document was written
    pub output_location: String,
    /// Components in the canonical document
    pub component_count: usize,
    /// Rows inserted into the analytical sink; `None` when no sink is configured
    pub rows_written: Option<usize>,
    /// Stored objects skipped during a merge, with the reason
    pub rejected_candidates: Vec<RejectedCandidate>,
}
