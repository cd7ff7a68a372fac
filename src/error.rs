//! Error types for the routing and task orchestration hub
//!
//! Failures that occur before a task exists propagate as `HubError`; failures
//! after a task exists are recorded as a `failed` state transition with a
//! sanitized human-readable message and never raise past the executor.

use thiserror::Error;

/// Main error type for hub operations
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Unknown agent: {name}")]
    UnknownAgent { name: String },

    #[error("Discovery failed for {url}: {message}")]
    Discovery { url: String, message: String },

    #[error("Unsupported transport '{transport}' declared by agent '{agent}'")]
    TransportUnsupported { agent: String, transport: String },

    #[error("Remote invocation failed: {message}")]
    RemoteInvocation { message: String },

    #[error("Unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    #[error("Invalid task transition: task is already {terminal_state}")]
    InvalidTransition { terminal_state: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("LLM provider error: {message}")]
    LlmError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl HubError {
    /// Create a discovery failure carrying the unreachable agent's URL
    pub fn discovery<S: Into<String>>(url: S, message: S) -> Self {
        Self::Discovery {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a remote invocation error
    pub fn remote_invocation<S: Into<String>>(message: S) -> Self {
        Self::RemoteInvocation {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported_operation<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Create an LLM error
    pub fn llm_error<S: Into<String>>(message: S) -> Self {
        Self::LlmError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Render this error as status-message text safe to attach to a task
    pub fn to_status_text(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Sanitize error messages before they become task status text
pub fn sanitize_error_message(message: &str) -> String {
    // Remove common secret patterns
    let mut sanitized = regex::Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+")
        .unwrap()
        .replace_all(message, "${1}=***")
        .to_string();

    // Remove potential file paths that might contain sensitive info
    sanitized =
        regex::Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
            .unwrap()
            .replace_all(&sanitized, "/***REDACTED***/")
            .to_string();

    // Truncate very long messages - ensure total length is <= 500
    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let max_content_len = 500 - truncate_suffix.len();
        sanitized = format!("{}{}", &sanitized[..max_content_len], truncate_suffix);
    }

    sanitized
}

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;
