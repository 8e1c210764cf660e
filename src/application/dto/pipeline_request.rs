use crate::sbom_processing::domain::Dialect;

/// PipelineRequest - Internal request DTO for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Merge stored documents instead of fetching from a provider
    pub merge: bool,
    /// Dialect of the document written to the object store
    pub output_dialect: Dialect,
    /// Object-store prefix for outputs and, in merge mode, inputs
    pub prefix: String,
    /// Explicit output key; derived from the target when absent
    pub output_key: Option<String>,
    /// Glob patterns a stored object must match to be merged
    pub include_patterns: Vec<String>,
    /// Glob patterns that exclude a stored object from the merge
    pub exclude_patterns: Vec<String>,
    /// Explicit destination table; derived from the target when absent
    pub table: Option<String>,
    /// Empty the destination table before inserting
    pub truncate: bool,
}

impl Default for PipelineRequest {
    fn default() -> Self {
        Self {
            merge: false,
            output_dialect: Dialect::CycloneDx,
            prefix: String::new(),
            output_key: None,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            table: None,
            truncate: false,
        }
    }
}
