//! Error taxonomy for tool invocation.
//!
//! Four kinds of failure exist around a tool call, each with its own
//! propagation rule:
//!
//! - [`InputError`]: the payload does not fit the tool's schema. Always
//!   propagates to the caller; no lifecycle events fire.
//! - [`ToolError`]: the handler's own declared failure kind. Subject to the
//!   tool's [`ErrorPolicy`] — converted to an observation only when the
//!   policy says so, otherwise propagated after `on_tool_error`.
//! - Panics: unclassified failures. Reported to the observer, then resumed
//!   unconditionally — never suppressed.
//! - [`RunError`]: what `run` returns when a failure propagates.

use std::fmt;
use std::sync::Arc;

use crate::schema::FieldKind;

/// Observation text substituted when a handled [`ToolError`] carries no
/// message of its own.
pub const DEFAULT_ERROR_OBSERVATION: &str = "Tool execution error";

/// The failure kind a tool handler is allowed to declare.
///
/// Handlers signal domain failures by returning this type; anything else
/// (a panic) is treated as unclassified and is never converted to an
/// observation. The message is optional: a bare error exists so handlers
/// can fail without committing to user-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    message: Option<String>,
}

impl ToolError {
    /// A failure with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A failure without a message. Substitution under
    /// [`ErrorPolicy::FromError`] falls back to
    /// [`DEFAULT_ERROR_OBSERVATION`].
    pub fn bare() -> Self {
        Self { message: None }
    }

    /// The message this error carries, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "tool execution failed"),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<String> for ToolError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ToolError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Payload-shape validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// A field the schema requires was not supplied.
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    /// A field was supplied that the schema does not declare.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
    /// A field value does not match its declared kind.
    #[error("field '{field}' expected {expected}, got {actual}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        actual: String,
    },
    /// Text input was given but the schema declares no fields to bind it to.
    #[error("tool takes no text input: schema declares no fields")]
    TextNotAccepted,
}

/// What to do when a handler returns a [`ToolError`].
///
/// A closed set of tagged variants, fixed per tool at construction time and
/// exhaustively matched at call time. Unrepresentable configurations cannot
/// exist.
#[derive(Clone, Default)]
pub enum ErrorPolicy {
    /// Notify the observer, then return the error to the caller.
    #[default]
    Propagate,
    /// Substitute the error's own message, or
    /// [`DEFAULT_ERROR_OBSERVATION`] when it carries none.
    FromError,
    /// Substitute a fixed message verbatim, regardless of the error.
    FixedMessage(String),
    /// Substitute the return value of a custom handler given the error.
    Custom(Arc<dyn Fn(&ToolError) -> String + Send + Sync>),
}

impl ErrorPolicy {
    /// Convenience constructor for [`ErrorPolicy::Custom`].
    pub fn custom(f: impl Fn(&ToolError) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }
}

impl fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => write!(f, "Propagate"),
            Self::FromError => write!(f, "FromError"),
            Self::FixedMessage(message) => f.debug_tuple("FixedMessage").field(message).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Failure returned by [`ToolRunner::run`](crate::runner::ToolRunner::run).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// The payload failed schema validation. No lifecycle events fired.
    #[error("invalid tool input: {0}")]
    InvalidInput(#[from] InputError),
    /// The handler's declared error, propagated per the tool's policy.
    #[error(transparent)]
    Tool(#[from] ToolError),
}
