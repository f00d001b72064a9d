//! Registries route invocations to named tools.

use std::collections::HashMap;
use std::sync::Arc;

use lakerunner_core::{
    Observation, RunError, RunOptions, ToolInput, ToolRunner, ToolSpec,
};

/// Trait for managing and dispatching named tools.
pub trait ToolRegistry {
    /// Dispatch an invocation to the named tool.
    ///
    /// Returns `None` when no tool with that name is registered.
    fn dispatch(
        &self,
        name: &str,
        input: ToolInput,
        opts: RunOptions,
    ) -> Option<Result<Observation, RunError>>;

    /// Dispatch with structured not-found handling.
    fn try_dispatch(
        &self,
        name: &str,
        input: ToolInput,
        opts: RunOptions,
    ) -> Result<Observation, DispatchError> {
        match self.dispatch(name, input, opts) {
            Some(result) => result.map_err(DispatchError::Run),
            None => Err(DispatchError::NotFound {
                name: name.to_string(),
            }),
        }
    }
}

/// Errors raised by [`ToolRegistry::try_dispatch`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("tool '{name}' not found in registry")]
    NotFound { name: String },
    #[error(transparent)]
    Run(#[from] RunError),
}

/// In-memory tool registry for local dispatch.
///
/// Runners are stored by name for O(1) lookup. Registration is
/// builder-style:
///
/// ```rust
/// use lakerunner_core::{Observation, ToolRunner};
/// use lakerunner_tools::{InMemoryToolRegistry, ToolRegistry};
///
/// let echo = ToolRunner::builder("echo", "echoes input")
///     .unwrap()
///     .handler(|args: lakerunner_core::ToolArgs| {
///         Ok(Observation::from(args.text().unwrap_or("")))
///     })
///     .build()
///     .unwrap();
///
/// let registry = InMemoryToolRegistry::new().with_tool(echo);
/// let result = registry
///     .dispatch("echo", "hello".into(), Default::default())
///     .expect("registered");
/// assert_eq!(result.unwrap().render(), "hello");
/// ```
#[derive(Clone, Default)]
pub struct InMemoryToolRegistry {
    tools: HashMap<String, Arc<ToolRunner>>,
}

impl InMemoryToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a runner under its own name, builder style. A later registration
    /// under the same name replaces the earlier one.
    pub fn with_tool(mut self, runner: ToolRunner) -> Self {
        self.register(runner);
        self
    }

    /// Add a runner under its own name.
    pub fn register(&mut self, runner: ToolRunner) {
        self.tools
            .insert(runner.name().to_string(), Arc::new(runner));
    }

    /// Get a runner by name.
    pub fn get(&self, name: &str) -> Option<Arc<ToolRunner>> {
        self.tools.get(name).cloned()
    }

    /// All registered tool names.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Descriptors of all registered tools, for agent-facing listings.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolRegistry for InMemoryToolRegistry {
    fn dispatch(
        &self,
        name: &str,
        input: ToolInput,
        opts: RunOptions,
    ) -> Option<Result<Observation, RunError>> {
        self.tools.get(name).map(|tool| tool.run(input, opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakerunner_core::ToolArgs;

    fn upper_runner() -> ToolRunner {
        ToolRunner::builder("uppercase", "uppercases input")
            .unwrap()
            .handler(|args: ToolArgs| {
                Ok(Observation::from(
                    args.text().unwrap_or("").to_uppercase(),
                ))
            })
            .build()
            .unwrap()
    }

    fn reverse_runner() -> ToolRunner {
        ToolRunner::builder("reverse", "reverses input")
            .unwrap()
            .handler(|args: ToolArgs| {
                Ok(Observation::from(
                    args.text().unwrap_or("").chars().rev().collect::<String>(),
                ))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn registry_dispatches_to_correct_tool() {
        let registry = InMemoryToolRegistry::new()
            .with_tool(upper_runner())
            .with_tool(reverse_runner());

        let upper = registry
            .dispatch("uppercase", "lake".into(), RunOptions::default())
            .unwrap()
            .unwrap();
        let reversed = registry
            .dispatch("reverse", "lake".into(), RunOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(upper.render(), "LAKE");
        assert_eq!(reversed.render(), "ekal");
        assert!(
            registry
                .dispatch("missing", "lake".into(), RunOptions::default())
                .is_none()
        );
    }

    #[test]
    fn try_dispatch_reports_missing_tools() {
        let registry = InMemoryToolRegistry::new().with_tool(upper_runner());
        let err = registry
            .try_dispatch("nonexistent", "x".into(), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn registry_lists_names_and_specs() {
        let registry = InMemoryToolRegistry::new()
            .with_tool(upper_runner())
            .with_tool(reverse_runner());

        let mut names = registry.tool_names();
        names.sort();
        assert_eq!(names, ["reverse", "uppercase"]);
        assert_eq!(registry.specs().len(), 2);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let replacement = ToolRunner::builder("uppercase", "actually lowercases")
            .unwrap()
            .handler(|args: ToolArgs| {
                Ok(Observation::from(
                    args.text().unwrap_or("").to_lowercase(),
                ))
            })
            .build()
            .unwrap();

        let registry = InMemoryToolRegistry::new()
            .with_tool(upper_runner())
            .with_tool(replacement);

        let result = registry
            .dispatch("uppercase", "MiXeD".into(), RunOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(result.render(), "mixed");
    }
}
