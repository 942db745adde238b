use thiserror::Error;

/// A collaborator failure, tagged with the source that produced it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source_name}: {message}")]
pub struct SourceError {
    pub source_name: String,
    pub message: String,
}

impl SourceError {
    /// Capture an `anyhow` error with its whole context chain
    pub fn from_anyhow(source_name: impl Into<String>, err: &anyhow::Error) -> Self {
        Self {
            source_name: source_name.into(),
            message: format!("{:#}", err),
        }
    }
}

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Source failed: {0}")]
    Source(#[from] SourceError),

    #[error("All search sources failed: {}", format_failures(.0))]
    AggregateSearch(Vec<SourceError>),
}

fn format_failures(failures: &[SourceError]) -> String {
    if failures.is_empty() {
        return "no sources configured".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
