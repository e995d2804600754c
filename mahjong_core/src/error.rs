use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    /// Tile code or tile list could not be parsed.
    Parse { input: String, message: String },
    /// Malformed situation, rejected at the boundary before scoring starts.
    Precondition { message: String },
    /// Catalog authoring defect (bad claim, unknown pattern name, too many patterns).
    Catalog { message: String },
    /// Engine configuration could not be applied.
    Config { message: String },
}

impl ScoringError {
    pub(crate) fn parse(input: &str, message: &str) -> Self {
        ScoringError::Parse {
            input: input.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        ScoringError::Precondition {
            message: message.into(),
        }
    }

    pub(crate) fn catalog(message: impl Into<String>) -> Self {
        ScoringError::Catalog {
            message: message.into(),
        }
    }
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringError::Parse { input, message } => {
                write!(f, "Parse error on '{}': {}", input, message)
            }
            ScoringError::Precondition { message } => {
                write!(f, "Malformed situation: {}", message)
            }
            ScoringError::Catalog { message } => {
                write!(f, "Pattern catalog error: {}", message)
            }
            ScoringError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for ScoringError {}

pub type ScoringResult<T> = Result<T, ScoringError>;
