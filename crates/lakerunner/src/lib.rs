//! # Lakerunner
//!
//! Agent tooling for data platforms: tools that let a language-model agent
//! explore a data catalog, execute and validate SQL, and run
//! retrieval-augmented QA — all built on one invocation wrapper with
//! lifecycle callbacks and explicit error policies.
//!
//! ## Core Components
//!
//! - [`ToolRunner`]: the invocation wrapper — parse, notify, invoke,
//!   translate errors per policy
//! - [`ToolObserver`]: lifecycle notifications for every invocation
//! - [`ErrorPolicy`]: what becomes of a handler's declared error
//! - Catalog / SQL / retrieval tools over collaborator traits
//!
//! ## Quick Start
//!
//! ```rust
//! use lakerunner::{ErrorPolicy, Observation, ToolArgs, ToolError, ToolRunner};
//!
//! let shout = ToolRunner::builder("shout", "uppercases its input")
//!     .unwrap()
//!     .handler(|args: ToolArgs| {
//!         let text = args.text().ok_or_else(|| ToolError::new("text input required"))?;
//!         Ok(Observation::from(text.to_uppercase()))
//!     })
//!     .error_policy(ErrorPolicy::FromError)
//!     .build()
//!     .unwrap();
//!
//! let observation = shout.invoke("hello").unwrap();
//! assert_eq!(observation.render(), "HELLO");
//! ```

pub use lakerunner_core::{
    ArgsSchema, BuildError, CallbackManager, CallbackSet, ConfigError, ContextToolHandler,
    DEFAULT_ERROR_OBSERVATION, ErrorPolicy, ErrorPolicyConfig, FailureKind, FieldKind, FieldSpec,
    Handler, InputError, InvalidToolName, JsonMap, Observation, PolicyName, RunContext, RunError,
    RunManager, RunOptions, RunnerConfig, ToolArgs, ToolEndEvent, ToolError, ToolErrorEvent,
    ToolHandler, ToolInput, ToolName, ToolObserver, ToolRunner, ToolRunnerBuilder, ToolSpec,
    ToolStartEvent, TracingObserver,
};

pub use lakerunner_tools::{
    AnswerSynthesizer, CatalogClient, CatalogError, CatalogInfoTool, ColumnInfo, DispatchError,
    Document, InMemoryToolRegistry, ListCatalogTablesTool, QueryResult, RetrievalError,
    RetrievalQaSourcesTool, RetrievalQaTool, Retriever, SqlQueryTool, SqlValidatorTool,
    SqlWarehouse, TableInfo, TableRef, ToolRegistry, WarehouseError,
};

/// Testing utilities (recording observers, mocks, scenario harness).
#[cfg(feature = "testing")]
pub mod testing {
    pub use lakerunner_testing::*;
}
