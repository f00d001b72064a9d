//! Handler shapes and the per-call execution context.
//!
//! Whether a tool needs the execution context is an explicit
//! registration-time choice between two trait shapes. The runner stores the
//! tagged choice in [`Handler`] and dispatches on it; no signature
//! introspection happens anywhere.

use std::sync::Arc;

use crate::callbacks::RunManager;
use crate::error::ToolError;
use crate::schema::ToolArgs;
use crate::tool::{JsonMap, Observation};
use uuid::Uuid;

/// Per-call execution context handed to context-shaped handlers.
///
/// Carries the run handle (for the run id and nested notifications) and the
/// caller-supplied state for this call. State is threaded per call, never
/// stored on the tool, and its internal structure is deliberately opaque:
/// handlers receive exactly what the caller supplied, unvalidated and
/// unmerged.
pub struct RunContext<'a> {
    manager: &'a RunManager,
    state: Option<&'a [JsonMap]>,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(manager: &'a RunManager, state: Option<&'a [JsonMap]>) -> Self {
        Self { manager, state }
    }

    /// Identifier of this invocation.
    pub fn run_id(&self) -> Uuid {
        self.manager.run_id()
    }

    /// The lifecycle manager for this invocation.
    pub fn manager(&self) -> &RunManager {
        self.manager
    }

    /// Caller-supplied state for this call, if any.
    pub fn state(&self) -> Option<&[JsonMap]> {
        self.state
    }
}

/// A tool handler that does not use the execution context.
pub trait ToolHandler: Send + Sync {
    fn run(&self, args: ToolArgs) -> Result<Observation, ToolError>;
}

impl<F> ToolHandler for F
where
    F: Fn(ToolArgs) -> Result<Observation, ToolError> + Send + Sync,
{
    fn run(&self, args: ToolArgs) -> Result<Observation, ToolError> {
        self(args)
    }
}

/// A tool handler that receives the execution context.
pub trait ContextToolHandler: Send + Sync {
    fn run(&self, args: ToolArgs, ctx: &RunContext<'_>) -> Result<Observation, ToolError>;
}

impl<F> ContextToolHandler for F
where
    F: for<'a> Fn(ToolArgs, &RunContext<'a>) -> Result<Observation, ToolError> + Send + Sync,
{
    fn run(&self, args: ToolArgs, ctx: &RunContext<'_>) -> Result<Observation, ToolError> {
        self(args, ctx)
    }
}

/// The registered handler, tagged by shape.
#[derive(Clone)]
pub enum Handler {
    /// Invoked without context.
    Plain(Arc<dyn ToolHandler>),
    /// Invoked with [`RunContext`].
    WithContext(Arc<dyn ContextToolHandler>),
}

impl Handler {
    pub fn plain(handler: impl ToolHandler + 'static) -> Self {
        Self::Plain(Arc::new(handler))
    }

    pub fn with_context(handler: impl ContextToolHandler + 'static) -> Self {
        Self::WithContext(Arc::new(handler))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => write!(f, "Handler::Plain(..)"),
            Self::WithContext(_) => write!(f, "Handler::WithContext(..)"),
        }
    }
}
