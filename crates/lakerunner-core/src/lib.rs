//! # Lakerunner Core
//!
//! Core invocation machinery for lakerunner tools: the dispatch wrapper
//! that takes a raw payload, validates it, invokes a registered handler,
//! and reports lifecycle events to observers.
//!
//! The building blocks:
//!
//! - [`ToolRunner`]: descriptor + schema + handler + error policy, invoked
//!   through [`ToolRunner::run`].
//! - [`ToolHandler`] / [`ContextToolHandler`]: the two handler shapes,
//!   chosen explicitly at registration time.
//! - [`ToolObserver`]: lifecycle notifications (`on_tool_start`,
//!   `on_tool_end`, `on_tool_error`).
//! - [`ErrorPolicy`]: what happens when a handler returns its declared
//!   [`ToolError`].

pub mod callbacks;
pub mod config;
pub mod error;
pub mod handler;
pub mod runner;
pub mod schema;
pub mod tool;

pub use callbacks::{
    CallbackManager, CallbackSet, FailureKind, RunManager, ToolEndEvent, ToolErrorEvent,
    ToolObserver, ToolStartEvent, TracingObserver,
};
pub use config::{ConfigError, ErrorPolicyConfig, PolicyName, RunnerConfig};
pub use error::{DEFAULT_ERROR_OBSERVATION, ErrorPolicy, InputError, RunError, ToolError};
pub use handler::{ContextToolHandler, Handler, RunContext, ToolHandler};
pub use runner::{BuildError, RunOptions, ToolRunner, ToolRunnerBuilder};
pub use schema::{ArgsSchema, FieldKind, FieldSpec, ToolArgs};
pub use tool::{InvalidToolName, JsonMap, Observation, ToolInput, ToolName, ToolSpec};
