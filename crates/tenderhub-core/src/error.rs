use thiserror::Error;

/// Errors raised while parsing or validating domain input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid tender status: {0}")]
    InvalidTenderStatus(String),

    #[error("invalid bid status: {0}")]
    InvalidBidStatus(String),

    #[error("invalid service type: {0}")]
    InvalidServiceType(String),

    #[error("invalid decision: {0}")]
    InvalidDecision(String),

    #[error("invalid author type: {0}")]
    InvalidAuthorType(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("patch contains no fields to change")]
    EmptyPatch,
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        CoreError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = CoreError::InvalidTenderStatus("Open".to_string());
        assert_eq!(err.to_string(), "invalid tender status: Open");

        let err = CoreError::InvalidDecision("Maybe".to_string());
        assert_eq!(err.to_string(), "invalid decision: Maybe");
    }
}
