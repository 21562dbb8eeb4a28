use thiserror::Error;

pub type Result<T> = std::result::Result<T, YomiError>;

#[derive(Debug, Error)]
pub enum YomiError {
    /// A collaborator (analyzer, dictionary, OCR) could not be loaded or reached.
    #[error("{name} is unavailable: {reason}")]
    DependencyUnavailable { name: &'static str, reason: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The analyzer produced units that do not line up with the input text.
    #[error("analyzer output is inconsistent: {0}")]
    Analyzer(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl YomiError {
    pub fn unavailable(name: &'static str, reason: impl ToString) -> Self {
        YomiError::DependencyUnavailable {
            name,
            reason: reason.to_string(),
        }
    }
}
