//! Error types for Orbit.
//!
//! Expected failures of a package operation (the tool ran and exited non-zero) are not
//! errors: adapters report them as `Ok(false)`. Everything in this module describes a
//! condition outside that contract.

use thiserror::Error;

/// The main error type for Orbit operations.
#[derive(Debug, Error)]
pub enum OrbitError {
    /// The external program could not be found on this system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Command execution failures (spawn errors, broken pipes, etc.)
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// The external program did not finish within the configured limit
    #[error("Command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    /// The invocation was cancelled before the program exited
    #[error("Command cancelled: {0}")]
    Cancelled(String),

    /// Package identifier rejected before any process was spawned
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// A single-package mutation hit an infrastructure fault.
    ///
    /// This is the one fault type the orchestrator raises from `update`, `remove` and
    /// `install`; a clean failure is reported as `Ok(false)` instead.
    #[error("Failed to {action} {package}: {source}")]
    Operation {
        action: &'static str,
        package: String,
        source: Box<OrbitError>,
    },

    /// Configuration-related errors (file parsing, validation, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Backup file problems
    #[error("Backup error: {0}")]
    Backup(String),

    /// File I/O operation failures
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failures
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A type alias for Results that use OrbitError.
pub type Result<T> = std::result::Result<T, OrbitError>;

impl OrbitError {
    /// Creates a new CommandFailed error with context.
    pub fn command_failed<S1, S2>(cmd: S1, details: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        OrbitError::CommandFailed(format!("{}: {}", cmd.into(), details.into()))
    }

    /// Creates a new InvalidPackage error with context.
    pub fn invalid_package<S1, S2>(package: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        OrbitError::InvalidPackage(format!("{}: {}", package.into(), reason.into()))
    }

    /// Wraps an adapter fault into the domain-level operation fault.
    pub fn operation<S: Into<String>>(action: &'static str, package: S, cause: OrbitError) -> Self {
        OrbitError::Operation {
            action,
            package: package.into(),
            source: Box::new(cause),
        }
    }

    /// Returns true if this is the orchestrator's mutation fault.
    pub fn is_operation_fault(&self) -> bool {
        matches!(self, OrbitError::Operation { .. })
    }

    /// Returns true if this error represents a transient failure that might be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrbitError::Timeout { .. } | OrbitError::Io(_) | OrbitError::CommandFailed(_) => true,
            OrbitError::Operation { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns the error category as a string for logging.
    pub fn category(&self) -> &'static str {
        match self {
            OrbitError::ToolNotFound(_) => "tool_not_found",
            OrbitError::CommandFailed(_) => "command_failed",
            OrbitError::Timeout { .. } => "timeout",
            OrbitError::Cancelled(_) => "cancelled",
            OrbitError::InvalidPackage(_) => "invalid_package",
            OrbitError::Operation { .. } => "operation",
            OrbitError::Config(_) => "config",
            OrbitError::Backup(_) => "backup",
            OrbitError::Io(_) => "io",
            OrbitError::Serialization(_) => "serialization",
        }
    }
}

impl From<config::ConfigError> for OrbitError {
    fn from(err: config::ConfigError) -> Self {
        OrbitError::Config(anyhow::Error::from(err))
    }
}

impl From<validator::ValidationErrors> for OrbitError {
    fn from(err: validator::ValidationErrors) -> Self {
        OrbitError::Config(anyhow::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OrbitError::command_failed("flatpak list", "broken pipe");
        assert_eq!(err.category(), "command_failed");
        assert!(!err.is_operation_fault());
    }

    #[test]
    fn test_operation_fault_wraps_cause() {
        let err = OrbitError::operation(
            "update",
            "Firefox",
            OrbitError::ToolNotFound("pkexec".to_string()),
        );
        assert!(err.is_operation_fault());
        assert_eq!(err.category(), "operation");

        let message = err.to_string();
        assert!(message.contains("update Firefox"));
        assert!(message.contains("pkexec"));
    }

    #[test]
    fn test_retryable_errors() {
        let timeout = OrbitError::Timeout {
            command: "snap list".to_string(),
            seconds: 5,
        };
        assert!(timeout.is_retryable());
        assert!(OrbitError::operation("remove", "x", timeout).is_retryable());

        let invalid = OrbitError::invalid_package("-rf", "leading dash");
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = OrbitError::invalid_package("foo bar", "contains whitespace");
        let error_string = format!("{}", err);
        assert!(error_string.contains("foo bar"));
        assert!(error_string.contains("contains whitespace"));
    }
}
