use std::fmt;

#[derive(Debug)]
pub enum AutofillError {
    /// JSON parsing failed (DOM snapshot, model response, or store file)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed (wire types, store writes)
    JsonSerialize { context: String, source: serde_json::Error },

    /// DOM snapshot had an unexpected shape
    DomStructure(String),

    /// Field opid not present in the detection cache or the document
    FieldNotFound { opid: String, context: String },

    /// Lookup against a detection generation that has been superseded
    StaleGeneration { opid: String, requested: u64, current: u64 },

    /// Model backend call failed (network, provider error, bad schema)
    Backend { provider: String, error: String },

    /// Memory store file IO failed
    Storage { context: String, source: std::io::Error },

    /// Update targeted a memory id that does not exist
    MemoryNotFound { id: String },

    /// Missing required state for an operation
    MissingState(String),
}

impl fmt::Display for AutofillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutofillError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            AutofillError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            AutofillError::DomStructure(msg) => {
                write!(f, "Unexpected DOM snapshot structure: {}", msg)
            }
            AutofillError::FieldNotFound { opid, context } => {
                write!(f, "Field '{}' not found: {}", opid, context)
            }
            AutofillError::StaleGeneration { opid, requested, current } => {
                write!(
                    f,
                    "Stale lookup for '{}': generation {} superseded by {}",
                    opid, requested, current
                )
            }
            AutofillError::Backend { provider, error } => {
                write!(f, "Model backend '{}' failed: {}", provider, error)
            }
            AutofillError::Storage { context, source } => {
                write!(f, "Memory store IO error ({}): {}", context, source)
            }
            AutofillError::MemoryNotFound { id } => {
                write!(f, "No memory with id '{}'", id)
            }
            AutofillError::MissingState(msg) => {
                write!(f, "Missing state: {}", msg)
            }
        }
    }
}

impl std::error::Error for AutofillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AutofillError::JsonParse { source, .. } => Some(source),
            AutofillError::JsonSerialize { source, .. } => Some(source),
            AutofillError::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}
