//! Error handling for buildpack-notify
//!
//! The run distinguishes two classes of failure:
//! 1. **Fatal** conditions that make the run's result untrustworthy. These are
//!    represented by [`NotifierError`] and propagated up to the binary, which
//!    prints them via [`ErrorContext`] and exits non-zero.
//! 2. **Recoverable** conditions scoped to a single application or recipient.
//!    These never become an `Err`; they are logged where detected and the run
//!    moves on.
//!
//! Library functions that can only fail fatally return
//! `Result<T, NotifierError>`. Orchestration code uses [`anyhow::Result`] with
//! `.context(...)`, and [`user_friendly_error`] recovers the typed error from
//! the chain to attach details and a suggestion.
//!
//! # Examples
//!
//! ```rust,no_run
//! use buildpack_notify::core::{NotifierError, user_friendly_error};
//!
//! let error = NotifierError::StateLoad {
//!     path: "state.json".to_string(),
//!     reason: "No such file or directory".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Fatal errors that abort a notification run.
#[derive(Error, Debug, Clone)]
pub enum NotifierError {
    /// Configuration could not be assembled
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// The input state file could not be read or parsed
    ///
    /// A missing or corrupt state file is fatal: continuing would treat every
    /// buildpack as newly observed and notify every owner on the platform.
    #[error("Unable to read state from {path}: {reason}")]
    StateLoad {
        /// Path of the input state file
        path: String,
        /// Underlying I/O or JSON error
        reason: String,
    },

    /// The output state file could not be written
    #[error("Unable to write state to {path}: {reason}")]
    StateSave {
        /// Path of the output state file
        path: String,
        /// Underlying I/O or serialization error
        reason: String,
    },

    /// A timestamp from the platform or from persisted state is not RFC 3339
    ///
    /// This indicates state corruption or an upstream contract violation and
    /// is never downgraded to a skip.
    #[error("Unable to parse {subject} timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// What the timestamp belongs to (buildpack, droplet, stored record)
        subject: String,
        /// The offending raw value
        value: String,
        /// Parser error
        reason: String,
    },

    /// Authentication against the platform API failed
    #[error("Unable to authenticate with the platform API: {reason}")]
    PlatformAuth {
        /// Underlying error
        reason: String,
    },

    /// A platform API request failed
    #[error("Platform request failed while trying to {operation}: {reason}")]
    PlatformRequest {
        /// The operation being attempted, e.g. "list buildpacks"
        operation: String,
        /// Status code / transport error
        reason: String,
    },

    /// The notification template could not be compiled or rendered
    #[error("Template error: {reason}")]
    Template {
        /// Tera error chain
        reason: String,
    },

    /// The mail transport could not be configured or a message could not be built
    #[error("Mail error: {reason}")]
    Mail {
        /// Underlying lettre error
        reason: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// A [`NotifierError`] with optional user-facing details and suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: NotifierError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no details or suggestion.
    #[must_use]
    pub const fn new(error: NotifierError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] suitable for the CLI.
///
/// Searches the whole `anyhow` chain for a [`NotifierError`] so that context
/// added with `.context(...)` does not hide the typed cause. Errors without a
/// typed cause are reported as [`NotifierError::Other`] with the chain inlined.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(notifier_error) = error.chain().find_map(|e| e.downcast_ref::<NotifierError>()) {
        let context = create_error_context(notifier_error.clone());
        let outer = error.to_string();
        if outer != notifier_error.to_string() && context.details.is_none() {
            return context.with_details(outer);
        }
        return context;
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(NotifierError::Other {
        message,
    })
}

fn create_error_context(error: NotifierError) -> ErrorContext {
    match &error {
        NotifierError::StateLoad { .. } => ErrorContext::new(error)
            .with_suggestion("Check IN_STATE points at a readable JSON file. Seed a new deployment with '{}'")
            .with_details("The state file maps buildpack GUIDs to {\"LastUpdatedAt\": \"<RFC3339>\"}"),

        NotifierError::StateSave { .. } => ErrorContext::new(error)
            .with_suggestion("Check OUT_STATE is writable and its directory exists")
            .with_details("Notifications for this run were already dispatched; the next run will re-evaluate the same buildpacks"),

        NotifierError::InvalidTimestamp { .. } => ErrorContext::new(error)
            .with_suggestion("Inspect the state file and the platform response for the named object")
            .with_details("Timestamps must be RFC 3339. A malformed value indicates state corruption or an API contract change, so the run is aborted rather than guessing"),

        NotifierError::PlatformAuth { .. } => ErrorContext::new(error)
            .with_suggestion("Verify CF_API, CLIENT_ID and CLIENT_SECRET, and that the client has the cloud_controller.admin_read_only scope"),

        NotifierError::PlatformRequest { .. } => ErrorContext::new(error)
            .with_suggestion("Check connectivity to the platform API and retry the run")
            .with_details("Bulk listings and space role lookups are required for a trustworthy result"),

        NotifierError::Mail { .. } => ErrorContext::new(error)
            .with_suggestion("Verify the SMTP_* settings and, if set, that SMTP_CERT contains a PEM certificate"),

        NotifierError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Run with --help to see every setting and its environment variable"),

        NotifierError::Template { .. } | NotifierError::Other { .. } => {
            ErrorContext::new(error)
        }
    }
}
