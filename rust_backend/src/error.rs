//! Error types for the quality engine.
//!
//! Record-level data-quality failures (malformed calendar dates, unknown pathway
//! codes) are surfaced through [`EngineError`] with structured context so a batch
//! can report which record and which column failed. Missing or malformed clock
//! times never produce an error; they degrade to an excluded duration instead.

use std::fmt;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Structured context for engine errors.
///
/// Provides additional information about where and why an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "parse_encounter", "load_config")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "encounter", "site_row")
    pub entity: Option<String>,
    /// The entity ID if applicable (protocol id or site id)
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the entity ID.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.entity.is_none()
            && self.entity_id.is_none()
            && self.details.is_none()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A calendar date could not be parsed. Not recoverable at record level.
    #[error("Malformed date: {message} {context}")]
    MalformedDate {
        message: String,
        context: ErrorContext,
    },

    /// A record is structurally invalid (unknown pathway code, missing id).
    #[error("Malformed record: {message} {context}")]
    MalformedRecord {
        message: String,
        context: ErrorContext,
    },

    /// Configuration could not be read or failed validation.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },
}

impl EngineError {
    /// Create a malformed-date error with context.
    pub fn malformed_date(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::MalformedDate {
            message: message.into(),
            context,
        }
    }

    /// Create a malformed-record error with context.
    pub fn malformed_record(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::MalformedRecord {
            message: message.into(),
            context,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error with context.
    pub fn configuration_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::MalformedDate { context, .. }
            | Self::MalformedRecord { context, .. }
            | Self::ConfigurationError { context, .. } => context,
        }
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::configuration_with_context(
            format!("Failed to parse config file: {}", err),
            ErrorContext::new("parse_config").with_details("toml"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("parse_encounter")
            .with_entity("encounter")
            .with_entity_id("P-17")
            .with_details("column=HOSPITAL_DATE");
        assert_eq!(
            ctx.to_string(),
            "[operation=parse_encounter, entity=encounter, id=P-17, details=column=HOSPITAL_DATE]"
        );
    }

    #[test]
    fn test_empty_context_renders_nothing() {
        assert_eq!(ErrorContext::default().to_string(), "");
    }

    #[test]
    fn test_error_display_includes_context() {
        let err = EngineError::malformed_date(
            "unparsable date '31/31/2019'",
            ErrorContext::new("parse_encounter").with_entity("encounter"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("Malformed date: unparsable date"));
        assert!(msg.contains("operation=parse_encounter"));
    }

    #[test]
    fn test_toml_error_becomes_configuration_error() {
        let toml_err = toml::from_str::<toml::Value>("policy = ").unwrap_err();
        let err = EngineError::from(toml_err);
        assert!(matches!(err, EngineError::ConfigurationError { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("parse_config"));
        assert!(err.to_string().starts_with("Configuration error: Failed to parse config file"));
    }
}
