//! Error Types
//!
//! The three failure kinds of the submission and polling core. Nothing
//! here is fatal to the process; every failure is containable to the
//! operation that produced it.

use std::fmt;

/// A single field-level validation failure, keyed by the field's path
/// within the experiment payload (e.g. `newTraits[2].name`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validation failed for one or more fields; submission is blocked until
/// every listed field is corrected.
#[derive(Clone, Debug, thiserror::Error)]
#[error("experiment payload failed validation ({} field{})", .0.len(), if .0.len() == 1 { "" } else { "s" })]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

/// A generate-endpoint submission failed. No job is registered when any
/// of these occur.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("failed to reach generate endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generate endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generate response did not contain a requestId")]
    MissingRequestId,
}

/// A result query failed in a way that is distinct from "still running":
/// the request never completed, the backend rejected it, or the body was
/// not the expected JSON shape.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to reach query endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("query endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("query response was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_counts_fields() {
        let err = ValidationError(vec![
            FieldError::new("seed", "must be a string"),
            FieldError::new("newTraits[0].name", "must be a string"),
        ]);
        assert!(err.to_string().contains("2 fields"));
    }

    #[test]
    fn test_validation_error_singular() {
        let err = ValidationError(vec![FieldError::new("baseImage.image", "bad data URL")]);
        assert!(err.to_string().contains("1 field)"));
    }

    #[test]
    fn test_submission_error_status_display() {
        let err = SubmissionError::Status {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));
    }
}
