//! Domain error types.
//!
//! Lead validation, store and template operations report failures through
//! [`PipelineError`]. The application layer wraps these in `anyhow` with
//! context about the file or command being processed.

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    // Validation errors
    #[error("Invalid date in {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid monetary value: '{value}' (must be a non-negative number)")]
    InvalidValue { value: String },

    #[error("Invalid lead record '{id}': {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: Box<PipelineError>,
    },

    // Lead store errors
    #[error("Lead already exists: {0}")]
    DuplicateLead(String),

    #[error("Lead not found: {0}")]
    LeadNotFound(String),

    // Template errors
    #[error("Template already exists: {0}")]
    DuplicateTemplate(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),
}

impl PipelineError {
    pub fn invalid_date(field: &str, value: &str) -> Self {
        Self::InvalidDate {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid_value(value: impl ToString) -> Self {
        Self::InvalidValue {
            value: value.to_string(),
        }
    }

    /// Attach the offending lead id to a validation error.
    pub fn in_record(self, id: &str) -> Self {
        Self::InvalidRecord {
            id: id.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PipelineError::invalid_date("next_follow_up", "not-a-date");
        assert_eq!(
            err.to_string(),
            "Invalid date in next_follow_up: 'not-a-date' (expected YYYY-MM-DD)"
        );

        let err = PipelineError::missing_field("email");
        assert_eq!(err.to_string(), "Missing required field: email");

        let err = PipelineError::invalid_value(-5.0);
        assert!(err.to_string().contains("'-5'"));
    }

    #[test]
    fn test_in_record_wraps_source() {
        let err = PipelineError::invalid_value("abc").in_record("LEAD-1");
        assert!(err.to_string().starts_with("Invalid lead record 'LEAD-1'"));
        match err {
            PipelineError::InvalidRecord { id, source } => {
                assert_eq!(id, "LEAD-1");
                assert!(matches!(*source, PipelineError::InvalidValue { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
