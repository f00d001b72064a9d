//! The tool invocation wrapper.
//!
//! [`ToolRunner`] binds a descriptor, an optional schema, a handler, and an
//! error policy into one reusable unit. [`ToolRunner::run`] is the dispatch
//! wrapper: it normalizes the payload, reports lifecycle events, invokes
//! the handler, and translates declared errors into observations when the
//! policy says to.
//!
//! Call sequence:
//!
//! 1. Parse the payload (schema validation). Failures propagate before any
//!    lifecycle event fires.
//! 2. Resolve verbosity and merge observer configuration.
//! 3. Emit `on_tool_start`.
//! 4. Invoke the handler, with or without context per its registered shape.
//! 5. Emit exactly one of `on_tool_end` / `on_tool_error`, then return the
//!    observation or the propagated error.
//!
//! Execution is fully synchronous: the handler runs to completion or
//! fails; there is no cancellation and no timeout at this layer.

use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use crate::callbacks::{CallbackSet, FailureKind};
use crate::config::RunnerConfig;
use crate::error::{DEFAULT_ERROR_OBSERVATION, ErrorPolicy, RunError};
use crate::handler::{ContextToolHandler, Handler, RunContext, ToolHandler};
use crate::schema::{ArgsSchema, ToolArgs};
use crate::tool::{InvalidToolName, JsonMap, Observation, ToolInput, ToolName, ToolSpec};

const DEFAULT_COLOR: &str = "green";
const ERROR_COLOR: &str = "red";

/// Call-time parameters for one invocation.
///
/// Everything here is optional; `RunOptions::default()` runs the tool with
/// its construction-time configuration alone.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Verbosity override. Honored only when the tool itself was not
    /// constructed verbose.
    pub verbose: Option<bool>,
    /// Presentation hint for the start notification. Defaults to green.
    pub start_color: Option<String>,
    /// Presentation hint for the end notification. Defaults to green;
    /// error substitutions report red regardless.
    pub color: Option<String>,
    /// Observers for this call, merged with the tool's own.
    pub callbacks: Option<CallbackSet>,
    /// Tags for this call, appended to the tool's own.
    pub tags: Option<Vec<String>>,
    /// Metadata for this call, overlaid on the tool's own.
    pub metadata: Option<JsonMap>,
    /// Per-call state threaded to context-shaped handlers, opaque to this
    /// layer.
    pub state: Option<Vec<JsonMap>>,
    /// Arbitrary passthrough key/values forwarded to observer events.
    pub extra: JsonMap,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn with_callbacks(mut self, callbacks: CallbackSet) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_state(mut self, state: Vec<JsonMap>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A tool ready to be invoked: descriptor, schema, handler, policy, and
/// reporting configuration.
///
/// Construction-time state is immutable; nothing on the runner changes
/// during or between calls, so one instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    spec: ToolSpec,
    schema: Option<ArgsSchema>,
    handler: Handler,
    error_policy: ErrorPolicy,
    callbacks: CallbackSet,
    verbose: bool,
    tags: Vec<String>,
    metadata: JsonMap,
}

impl ToolRunner {
    /// Start building a runner for the given tool name.
    pub fn builder(
        name: &str,
        description: impl Into<String>,
    ) -> Result<ToolRunnerBuilder, InvalidToolName> {
        Ok(ToolRunnerBuilder::new(ToolName::parse(name)?, description))
    }

    pub fn name(&self) -> &str {
        self.spec.name.as_str()
    }

    pub fn description(&self) -> &str {
        &self.spec.description
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    pub fn return_direct(&self) -> bool {
        self.spec.return_direct
    }

    pub fn schema(&self) -> Option<&ArgsSchema> {
        self.schema.as_ref()
    }

    /// Run the tool with default call options.
    pub fn invoke(&self, input: impl Into<ToolInput>) -> Result<Observation, RunError> {
        self.run(input.into(), RunOptions::default())
    }

    /// Run the tool.
    ///
    /// Returns the handler's observation, or the substitute observation the
    /// error policy produced, or the propagated failure. The observer sees
    /// the stringified observation; the caller gets the original value.
    ///
    /// Handler panics are reported via `on_tool_error` and resumed — a
    /// panic is never converted into an observation.
    pub fn run(&self, input: ToolInput, opts: RunOptions) -> Result<Observation, RunError> {
        let args = match &self.schema {
            Some(schema) => schema.validate(&input)?,
            None => ToolArgs::from_input(&input),
        };

        // Call-time verbosity only raises a quiet tool's verbosity; a tool
        // built verbose stays verbose.
        let verbose = if self.verbose {
            true
        } else {
            opts.verbose.unwrap_or(false)
        };

        let manager = CallbackSet::configure(
            opts.callbacks.as_ref(),
            &self.callbacks,
            verbose,
            opts.tags.as_deref(),
            &self.tags,
            opts.metadata.as_ref(),
            &self.metadata,
        );
        let start_color = opts.start_color.as_deref().unwrap_or(DEFAULT_COLOR);
        let run = manager.on_tool_start(&self.spec, &input.display_text(), Some(start_color), &opts.extra);

        let ctx = RunContext::new(&run, opts.state.as_deref());
        let outcome = catch_unwind(AssertUnwindSafe(|| match &self.handler {
            Handler::Plain(handler) => handler.run(args),
            Handler::WithContext(handler) => handler.run(args, &ctx),
        }));

        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                run.on_tool_error(&panic_message(&panic), FailureKind::Panic, &opts.extra);
                resume_unwind(panic);
            }
        };

        match result {
            Ok(observation) => {
                let color = opts.color.as_deref().unwrap_or(DEFAULT_COLOR);
                run.on_tool_end(&observation.render(), Some(color), &opts.extra);
                Ok(observation)
            }
            Err(error) => {
                let substitute = match &self.error_policy {
                    ErrorPolicy::Propagate => {
                        run.on_tool_error(&error.to_string(), FailureKind::Domain, &opts.extra);
                        return Err(RunError::Tool(error));
                    }
                    ErrorPolicy::FromError => error
                        .message()
                        .unwrap_or(DEFAULT_ERROR_OBSERVATION)
                        .to_string(),
                    ErrorPolicy::FixedMessage(message) => message.clone(),
                    ErrorPolicy::Custom(handler) => handler(&error),
                };
                let observation = Observation::Text(substitute);
                run.on_tool_end(&observation.render(), Some(ERROR_COLOR), &opts.extra);
                Ok(observation)
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool handler panicked".to_string()
    }
}

/// Builder for [`ToolRunner`].
#[derive(Debug)]
pub struct ToolRunnerBuilder {
    spec: ToolSpec,
    schema: Option<ArgsSchema>,
    handler: Option<Handler>,
    error_policy: ErrorPolicy,
    callbacks: CallbackSet,
    verbose: bool,
    tags: Vec<String>,
    metadata: JsonMap,
}

impl ToolRunnerBuilder {
    pub fn new(name: ToolName, description: impl Into<String>) -> Self {
        Self {
            spec: ToolSpec::new(name, description),
            schema: None,
            handler: None,
            error_policy: ErrorPolicy::default(),
            callbacks: CallbackSet::new(),
            verbose: false,
            tags: Vec::new(),
            metadata: JsonMap::new(),
        }
    }

    /// Seed a builder from deserialized construction-time configuration.
    ///
    /// The handler and any custom error policy still have to be supplied in
    /// code.
    pub fn from_config(config: RunnerConfig) -> Result<Self, InvalidToolName> {
        let name = ToolName::parse(&config.name)?;
        let mut builder = Self::new(name, config.description);
        builder.spec.return_direct = config.return_direct;
        builder.verbose = config.verbose;
        builder.tags = config.tags;
        builder.metadata = config.metadata;
        builder.error_policy = config.on_error.into_policy();
        Ok(builder)
    }

    /// Register a handler that does not use the execution context.
    pub fn handler(mut self, handler: impl ToolHandler + 'static) -> Self {
        self.handler = Some(Handler::plain(handler));
        self
    }

    /// Register a handler that receives the execution context.
    pub fn context_handler(mut self, handler: impl ContextToolHandler + 'static) -> Self {
        self.handler = Some(Handler::with_context(handler));
        self
    }

    pub fn schema(mut self, schema: ArgsSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn return_direct(mut self) -> Self {
        self.spec.return_direct = true;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn observer(mut self, observer: std::sync::Arc<dyn crate::callbacks::ToolObserver>) -> Self {
        self.callbacks.push(observer);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn metadata_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<ToolRunner, BuildError> {
        let handler = self.handler.ok_or(BuildError::MissingHandler)?;
        Ok(ToolRunner {
            spec: self.spec,
            schema: self.schema,
            handler,
            error_policy: self.error_policy,
            callbacks: self.callbacks,
            verbose: self.verbose,
            tags: self.tags,
            metadata: self.metadata,
        })
    }
}

/// Errors that can occur when building a [`ToolRunner`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("no handler registered for the tool")]
    MissingHandler,
    #[error("invalid tool name: {0}")]
    InvalidName(#[from] InvalidToolName),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{ToolEndEvent, ToolErrorEvent, ToolObserver, ToolStartEvent};
    use crate::error::ToolError;
    use crate::schema::FieldSpec;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Recorder {
        starts: Mutex<Vec<String>>,
        ends: Mutex<Vec<String>>,
        errors: Mutex<Vec<(String, FailureKind)>>,
    }

    impl ToolObserver for Recorder {
        fn on_tool_start(&self, event: &ToolStartEvent) {
            self.starts.lock().unwrap().push(event.input.clone());
        }

        fn on_tool_end(&self, event: &ToolEndEvent) {
            self.ends.lock().unwrap().push(event.output.clone());
        }

        fn on_tool_error(&self, event: &ToolErrorEvent) {
            self.errors
                .lock()
                .unwrap()
                .push((event.error.clone(), event.kind));
        }
    }

    impl Recorder {
        fn terminal_count(&self) -> usize {
            self.ends.lock().unwrap().len() + self.errors.lock().unwrap().len()
        }
    }

    fn echo_runner(policy: ErrorPolicy, recorder: Arc<Recorder>) -> ToolRunner {
        ToolRunner::builder("echo", "echoes its input")
            .unwrap()
            .handler(|args: ToolArgs| {
                let text = args.text().unwrap_or_default().to_string();
                if let Some(message) = text.strip_prefix("fail:") {
                    return Err(ToolError::new(message.to_string()));
                }
                if text == "fail-bare" {
                    return Err(ToolError::bare());
                }
                Ok(Observation::Text(text))
            })
            .error_policy(policy)
            .observer(recorder)
            .build()
            .unwrap()
    }

    #[test]
    fn success_returns_original_value_and_fires_end_once() {
        let recorder = Arc::new(Recorder::default());
        let runner = echo_runner(ErrorPolicy::Propagate, recorder.clone());

        let observation = runner.invoke("hello").unwrap();
        assert_eq!(observation, Observation::Text("hello".into()));
        assert_eq!(recorder.starts.lock().unwrap().as_slice(), ["hello"]);
        assert_eq!(recorder.terminal_count(), 1);
    }

    #[test]
    fn propagate_returns_domain_error_after_error_event() {
        let recorder = Arc::new(Recorder::default());
        let runner = echo_runner(ErrorPolicy::Propagate, recorder.clone());

        let err = runner.invoke("fail:warehouse offline").unwrap_err();
        assert!(matches!(err, RunError::Tool(_)));
        assert_eq!(err.to_string(), "warehouse offline");
        let errors = recorder.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1, FailureKind::Domain);
        assert_eq!(recorder.ends.lock().unwrap().len(), 0);
    }

    #[test]
    fn from_error_substitutes_message() {
        let recorder = Arc::new(Recorder::default());
        let runner = echo_runner(ErrorPolicy::FromError, recorder.clone());

        let observation = runner.invoke("fail:X").unwrap();
        assert_eq!(observation, Observation::Text("X".into()));
        assert_eq!(recorder.terminal_count(), 1);
        assert_eq!(recorder.ends.lock().unwrap().as_slice(), ["X"]);
    }

    #[test]
    fn from_error_falls_back_when_error_is_bare() {
        let recorder = Arc::new(Recorder::default());
        let runner = echo_runner(ErrorPolicy::FromError, recorder.clone());

        let observation = runner.invoke("fail-bare").unwrap();
        assert_eq!(
            observation,
            Observation::Text(DEFAULT_ERROR_OBSERVATION.into())
        );
    }

    #[test]
    fn fixed_message_ignores_error_content() {
        let recorder = Arc::new(Recorder::default());
        let runner = echo_runner(
            ErrorPolicy::FixedMessage("S".to_string()),
            recorder.clone(),
        );

        let observation = runner.invoke("fail:anything at all").unwrap();
        assert_eq!(observation, Observation::Text("S".into()));
    }

    #[test]
    fn custom_policy_uses_handler_return_value() {
        let recorder = Arc::new(Recorder::default());
        let runner = echo_runner(
            ErrorPolicy::custom(|err| format!("handled: {err}")),
            recorder.clone(),
        );

        let observation = runner.invoke("fail:deep").unwrap();
        assert_eq!(observation, Observation::Text("handled: deep".into()));
    }

    #[test]
    fn substitution_end_event_reports_red() {
        let recorder = Arc::new(Recorder::default());
        let colors = Arc::new(Mutex::new(Vec::new()));

        struct ColorObserver(Arc<Mutex<Vec<Option<String>>>>);
        impl ToolObserver for ColorObserver {
            fn on_tool_end(&self, event: &ToolEndEvent) {
                self.0.lock().unwrap().push(event.color.clone());
            }
        }

        let runner = ToolRunner::builder("fails", "always fails")
            .unwrap()
            .handler(|_: ToolArgs| Err::<Observation, _>(ToolError::new("nope")))
            .error_policy(ErrorPolicy::FromError)
            .observer(recorder)
            .observer(Arc::new(ColorObserver(colors.clone())))
            .build()
            .unwrap();

        runner.invoke("x").unwrap();
        assert_eq!(colors.lock().unwrap().as_slice(), [Some("red".to_string())]);
    }

    #[test]
    fn invalid_input_propagates_without_lifecycle_events() {
        let recorder = Arc::new(Recorder::default());
        let runner = ToolRunner::builder("strict", "schema'd tool")
            .unwrap()
            .schema(crate::schema::ArgsSchema::new().with_field(FieldSpec::text("query")))
            .handler(|_: ToolArgs| Ok(Observation::from("ok")))
            .observer(recorder.clone())
            .build()
            .unwrap();

        let mut bad = JsonMap::new();
        bad.insert("nonsense".into(), json!(1));
        let err = runner.invoke(bad).unwrap_err();
        assert!(matches!(err, RunError::InvalidInput(_)));
        assert!(recorder.starts.lock().unwrap().is_empty());
        assert_eq!(recorder.terminal_count(), 0);
    }

    #[test]
    fn context_handler_sees_state_for_exactly_that_call() {
        let seen = Arc::new(Mutex::new(Vec::<Option<usize>>::new()));
        let seen_in_handler = seen.clone();
        let runner = ToolRunner::builder("stateful", "records state presence")
            .unwrap()
            .context_handler(move |_args: ToolArgs, ctx: &RunContext<'_>| {
                seen_in_handler
                    .lock()
                    .unwrap()
                    .push(ctx.state().map(<[JsonMap]>::len));
                Ok(Observation::from("ok"))
            })
            .build()
            .unwrap();

        let mut step = JsonMap::new();
        step.insert("action".into(), Value::String("lookup".into()));
        runner
            .run(
                ToolInput::text("a"),
                RunOptions::new().with_state(vec![step]),
            )
            .unwrap();
        runner.invoke("b").unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), [Some(1), None]);
    }

    #[test]
    fn plain_handler_is_called_without_context() {
        // Shape is fixed at registration: a plain handler compiles without
        // any context parameter and still runs under options with state.
        let runner = ToolRunner::builder("plain", "no context")
            .unwrap()
            .handler(|args: ToolArgs| Ok(Observation::from(args.text().unwrap_or(""))))
            .build()
            .unwrap();

        let observation = runner
            .run(
                ToolInput::text("payload"),
                RunOptions::new().with_state(vec![JsonMap::new()]),
            )
            .unwrap();
        assert_eq!(observation, Observation::Text("payload".into()));
    }

    #[test]
    fn panic_is_reported_then_resumed() {
        let recorder = Arc::new(Recorder::default());
        let runner = ToolRunner::builder("panics", "always panics")
            .unwrap()
            .handler(|_: ToolArgs| -> Result<Observation, ToolError> { panic!("handler exploded") })
            .error_policy(ErrorPolicy::FromError)
            .observer(recorder.clone())
            .build()
            .unwrap();

        let caught = std::panic::catch_unwind(AssertUnwindSafe(|| runner.invoke("x")));
        assert!(caught.is_err());

        let errors = recorder.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "handler exploded");
        assert_eq!(errors[0].1, FailureKind::Panic);
        assert_eq!(recorder.ends.lock().unwrap().len(), 0);
    }

    #[test]
    fn builder_requires_handler() {
        let result = ToolRunner::builder("empty", "no handler")
            .unwrap()
            .build();
        assert_eq!(result.unwrap_err(), BuildError::MissingHandler);
    }

    #[test]
    fn return_direct_is_carried_on_the_spec() {
        let runner = ToolRunner::builder("direct", "returns directly")
            .unwrap()
            .handler(|_: ToolArgs| Ok(Observation::from("out")))
            .return_direct()
            .build()
            .unwrap();
        assert!(runner.return_direct());
    }
}
