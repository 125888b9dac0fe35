//! Error types for txscope-core
//!
//! Two kinds of failure reach this layer: network failures while fetching a
//! page, which are surfaced to the user and retried, and validation failures
//! while reading filter values from a URL, which are recovered locally.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error identifiers, rendered in SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Remote call failed or returned a non-success status
    NetworkError,
    /// A filter value could not be parsed
    ValidationError,
    /// Response body was not the expected shape
    InvalidFormat,
    ConfigError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured form of a `CoreError`, suitable for serializing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    /// Machine-readable extras (offending field, parser message)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// What the user can do about it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_detail(self, detail: serde_json::Value) -> Self {
        Self {
            details: Some(detail),
            ..self
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        for suggestion in &self.suggestions {
            write!(f, " (hint: {})", suggestion)?;
        }
        Ok(())
    }
}

/// How loudly an error is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Debug,
    /// Recovered locally, the user never sees it
    Warning,
    /// Surfaced to the user, retry possible
    Error,
    /// Setup is broken; retrying will not help
    Critical,
}

impl ErrorSeverity {
    /// Log level used when reporting at this severity
    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Debug => log::Level::Debug,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error | ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Main error type for txscope-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{reason}")]
    Network { reason: String },

    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Shorthand for a network failure
    pub fn network(reason: impl Into<String>) -> Self {
        CoreError::Network {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Network { .. } => ErrorCode::NetworkError,
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            CoreError::Config { .. } => ErrorCode::ConfigError,
            CoreError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Warning for recovered errors, Critical for broken setup
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Network { .. } => ErrorSeverity::Error,
            CoreError::Validation { .. } => ErrorSeverity::Warning,
            CoreError::InvalidFormat { .. } => ErrorSeverity::Error,
            CoreError::Config { .. } => ErrorSeverity::Critical,
            CoreError::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Network { .. } | CoreError::InvalidFormat { .. })
    }

    pub fn to_details(&self) -> ErrorDetails {
        let details = ErrorDetails::new(self.code(), self.to_string());
        match self {
            CoreError::Network { .. } => details
                .with_suggestion("check that the transactions endpoint is reachable")
                .with_suggestion("retry to reload the failed page; loaded pages are kept"),
            CoreError::Validation { field, message } => details
                .with_detail(serde_json::json!({ "field": field, "reason": message }))
                .with_suggestion(format!("the '{}' filter was reset to its default", field)),
            CoreError::InvalidFormat { message } => details
                .with_detail(serde_json::json!({ "parser": message }))
                .with_suggestion("the endpoint must return a JSON array of transactions"),
            CoreError::Config { .. } | CoreError::Internal { .. } => details,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Where an error happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// What was being done, e.g. "Next fetch" or "parse URL"
    pub operation: String,
    /// Criteria key, in query-string form
    pub criteria: Option<String>,
    /// Page cursor
    pub cursor: Option<u32>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn with_criteria(self, criteria: impl Into<String>) -> Self {
        Self {
            criteria: Some(criteria.into()),
            ..self
        }
    }

    pub fn with_cursor(self, cursor: u32) -> Self {
        Self {
            cursor: Some(cursor),
            ..self
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.operation)?;
        if let Some(criteria) = &self.criteria {
            write!(f, " for {}", criteria)?;
        }
        if let Some(cursor) = self.cursor {
            write!(f, " (page {})", cursor)?;
        }
        Ok(())
    }
}

/// Sink for errors that are handled rather than propagated
pub trait ErrorLogger: Send + Sync {
    /// An error the user will see
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// An error recovered locally
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Reports through the `log` facade at the error's severity
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let details = error.to_details();
        log::log!(
            target: "txscope::error",
            error.severity().log_level(),
            "{} failed: {}",
            context,
            details
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(target: "txscope::error", "{}: {}", context, message);
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::NetworkError.to_string(), "NETWORK_ERROR");
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_network_error_message_is_the_reason() {
        let error = CoreError::network("Failed to fetch transactions: Bad Gateway");
        assert_eq!(error.to_string(), "Failed to fetch transactions: Bad Gateway");
        assert_eq!(error.code(), ErrorCode::NetworkError);
        assert_eq!(error.severity(), ErrorSeverity::Error);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_validation_error_is_warning() {
        let error = CoreError::Validation {
            field: "dateFrom".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert!(!error.is_retryable());

        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::ValidationError);
        assert!(details.details.is_some());
        assert!(details.suggestions[0].contains("dateFrom"));
    }

    #[test]
    fn test_error_details_display() {
        let details = CoreError::network("timeout").to_details();
        let text = details.to_string();
        assert!(text.starts_with("NETWORK_ERROR: timeout"));
        assert!(text.contains("(hint: retry"));
    }

    #[test]
    fn test_error_details_serialize_camel_case() {
        let details = CoreError::InvalidFormat {
            message: "expected array".to_string(),
        }
        .to_details();
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["code"], "INVALID_FORMAT");
        assert_eq!(json["details"]["parser"], "expected array");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(ErrorSeverity::Warning.log_level(), log::Level::Warn);
        assert_eq!(ErrorSeverity::Critical.log_level(), log::Level::Error);
        assert!(ErrorSeverity::Critical > ErrorSeverity::Warning);
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("fetch_page")
            .with_criteria("status=failed")
            .with_cursor(3);

        assert_eq!(context.criteria.as_deref(), Some("status=failed"));
        assert_eq!(context.to_string(), "fetch_page for status=failed (page 3)");
        assert_eq!(ErrorContext::new("parse URL").to_string(), "parse URL");
    }
}
