//! Lifecycle observation for tool invocations.
//!
//! An observer sees exactly one `on_tool_start` before the handler runs and
//! exactly one terminal notification (`on_tool_end` or `on_tool_error`)
//! after it, per invocation that reaches the handler. Color hints are
//! presentation-only and carry no semantics.
//!
//! [`CallbackSet::configure`] merges construction-time and call-time
//! observers, tags, and metadata into a [`CallbackManager`] for one call,
//! the way the tool was told to report. Verbose mode attaches
//! [`TracingObserver`], which forwards events to `tracing`.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::tool::{JsonMap, ToolSpec};

/// Event emitted before the handler executes.
#[derive(Debug, Clone)]
pub struct ToolStartEvent {
    pub run_id: Uuid,
    pub name: String,
    pub description: String,
    /// Rendered input payload.
    pub input: String,
    /// Presentation hint, no semantic effect.
    pub color: Option<String>,
    pub tags: Vec<String>,
    pub metadata: JsonMap,
    /// Arbitrary passthrough key/values from the caller.
    pub extra: JsonMap,
}

/// Terminal event for a successful (or substituted) invocation.
#[derive(Debug, Clone)]
pub struct ToolEndEvent {
    pub run_id: Uuid,
    pub name: String,
    /// Stringified observation.
    pub output: String,
    pub color: Option<String>,
    pub extra: JsonMap,
}

/// Which class of failure an error event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The handler's declared error kind.
    Domain,
    /// An unclassified failure (panic); always resumed after reporting.
    Panic,
}

/// Terminal event for a failed invocation.
#[derive(Debug, Clone)]
pub struct ToolErrorEvent {
    pub run_id: Uuid,
    pub name: String,
    /// Rendered failure.
    pub error: String,
    pub kind: FailureKind,
    pub extra: JsonMap,
}

/// Observer of tool lifecycle events.
///
/// All methods default to no-ops so implementations can subscribe to the
/// subset they care about.
pub trait ToolObserver: Send + Sync {
    fn on_tool_start(&self, event: &ToolStartEvent) {
        let _ = event;
    }

    fn on_tool_end(&self, event: &ToolEndEvent) {
        let _ = event;
    }

    fn on_tool_error(&self, event: &ToolErrorEvent) {
        let _ = event;
    }
}

/// Observer that forwards lifecycle events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ToolObserver for TracingObserver {
    fn on_tool_start(&self, event: &ToolStartEvent) {
        info!(
            run_id = %event.run_id,
            tool = %event.name,
            input = %event.input,
            "tool started"
        );
    }

    fn on_tool_end(&self, event: &ToolEndEvent) {
        debug!(
            run_id = %event.run_id,
            tool = %event.name,
            output = %event.output,
            "tool finished"
        );
    }

    fn on_tool_error(&self, event: &ToolErrorEvent) {
        error!(
            run_id = %event.run_id,
            tool = %event.name,
            kind = ?event.kind,
            error = %event.error,
            "tool failed"
        );
    }
}

/// A shareable collection of observers.
#[derive(Clone, Default)]
pub struct CallbackSet {
    observers: Vec<Arc<dyn ToolObserver>>,
}

impl CallbackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer, builder style.
    pub fn with_observer(mut self, observer: Arc<dyn ToolObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn push(&mut self, observer: Arc<dyn ToolObserver>) {
        self.observers.push(observer);
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Merge call-time and construction-time reporting configuration into a
    /// manager for one invocation.
    ///
    /// Observers are the union of both sets; tags and metadata likewise.
    /// When `verbose` is set, a [`TracingObserver`] is attached.
    pub fn configure(
        call: Option<&CallbackSet>,
        inherited: &CallbackSet,
        verbose: bool,
        call_tags: Option<&[String]>,
        inherited_tags: &[String],
        call_metadata: Option<&JsonMap>,
        inherited_metadata: &JsonMap,
    ) -> CallbackManager {
        let mut observers = inherited.observers.clone();
        if let Some(call) = call {
            observers.extend(call.observers.iter().cloned());
        }
        if verbose {
            observers.push(Arc::new(TracingObserver));
        }

        let mut tags = inherited_tags.to_vec();
        if let Some(call_tags) = call_tags {
            tags.extend(call_tags.iter().cloned());
        }

        let mut metadata = inherited_metadata.clone();
        if let Some(call_metadata) = call_metadata {
            for (key, value) in call_metadata {
                metadata.insert(key.clone(), value.clone());
            }
        }

        CallbackManager {
            observers,
            tags,
            metadata,
        }
    }
}

impl std::fmt::Debug for CallbackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Per-call observer configuration produced by [`CallbackSet::configure`].
pub struct CallbackManager {
    observers: Vec<Arc<dyn ToolObserver>>,
    tags: Vec<String>,
    metadata: JsonMap,
}

impl CallbackManager {
    /// Emit the start event and obtain the run handle for the terminal
    /// notification.
    pub fn on_tool_start(
        self,
        spec: &ToolSpec,
        input: &str,
        color: Option<&str>,
        extra: &JsonMap,
    ) -> RunManager {
        let run = RunManager {
            run_id: Uuid::new_v4(),
            name: spec.name.as_str().to_string(),
            observers: self.observers,
        };
        let event = ToolStartEvent {
            run_id: run.run_id,
            name: run.name.clone(),
            description: spec.description.clone(),
            input: input.to_string(),
            color: color.map(str::to_string),
            tags: self.tags,
            metadata: self.metadata,
            extra: extra.clone(),
        };
        for observer in &run.observers {
            observer.on_tool_start(&event);
        }
        run
    }
}

/// Handle for one running invocation.
///
/// Created by [`CallbackManager::on_tool_start`]; used to emit exactly one
/// terminal notification for the call.
pub struct RunManager {
    run_id: Uuid,
    name: String,
    observers: Vec<Arc<dyn ToolObserver>>,
}

impl RunManager {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn tool_name(&self) -> &str {
        &self.name
    }

    /// Emit the end event with the stringified observation.
    pub fn on_tool_end(&self, output: &str, color: Option<&str>, extra: &JsonMap) {
        let event = ToolEndEvent {
            run_id: self.run_id,
            name: self.name.clone(),
            output: output.to_string(),
            color: color.map(str::to_string),
            extra: extra.clone(),
        };
        for observer in &self.observers {
            observer.on_tool_end(&event);
        }
    }

    /// Emit the error event.
    pub fn on_tool_error(&self, error: &str, kind: FailureKind, extra: &JsonMap) {
        let event = ToolErrorEvent {
            run_id: self.run_id,
            name: self.name.clone(),
            error: error.to_string(),
            kind,
            extra: extra.clone(),
        };
        for observer in &self.observers {
            observer.on_tool_error(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolName;
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingObserver {
        starts: Mutex<usize>,
        ends: Mutex<usize>,
        errors: Mutex<usize>,
    }

    impl ToolObserver for CountingObserver {
        fn on_tool_start(&self, _event: &ToolStartEvent) {
            *self.starts.lock().unwrap() += 1;
        }

        fn on_tool_end(&self, _event: &ToolEndEvent) {
            *self.ends.lock().unwrap() += 1;
        }

        fn on_tool_error(&self, _event: &ToolErrorEvent) {
            *self.errors.lock().unwrap() += 1;
        }
    }

    fn spec() -> ToolSpec {
        ToolSpec::new(ToolName::new_unchecked("probe"), "probe tool")
    }

    #[test]
    fn configure_merges_observers_tags_and_metadata() {
        let inherited_obs = Arc::new(CountingObserver::default());
        let call_obs = Arc::new(CountingObserver::default());
        let inherited = CallbackSet::new().with_observer(inherited_obs.clone());
        let call = CallbackSet::new().with_observer(call_obs.clone());

        let mut inherited_meta = JsonMap::new();
        inherited_meta.insert("env".into(), Value::String("prod".into()));
        let mut call_meta = JsonMap::new();
        call_meta.insert("env".into(), Value::String("test".into()));

        let manager = CallbackSet::configure(
            Some(&call),
            &inherited,
            false,
            Some(&["call".to_string()]),
            &["base".to_string()],
            Some(&call_meta),
            &inherited_meta,
        );
        assert_eq!(manager.tags, vec!["base".to_string(), "call".to_string()]);
        assert_eq!(manager.metadata["env"], Value::String("test".into()));

        let run = manager.on_tool_start(&spec(), "input", Some("green"), &JsonMap::new());
        run.on_tool_end("output", None, &JsonMap::new());

        for obs in [&inherited_obs, &call_obs] {
            assert_eq!(*obs.starts.lock().unwrap(), 1);
            assert_eq!(*obs.ends.lock().unwrap(), 1);
            assert_eq!(*obs.errors.lock().unwrap(), 0);
        }
    }

    #[test]
    fn verbose_attaches_tracing_observer() {
        let quiet = CallbackSet::configure(None, &CallbackSet::new(), false, None, &[], None, &JsonMap::new());
        assert!(quiet.observers.is_empty());

        let verbose = CallbackSet::configure(None, &CallbackSet::new(), true, None, &[], None, &JsonMap::new());
        assert_eq!(verbose.observers.len(), 1);
    }

    #[test]
    fn tracing_observer_forwards_lifecycle_events() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let verbose = CallbackSet::configure(None, &CallbackSet::new(), true, None, &[], None, &JsonMap::new());
        let run = verbose.on_tool_start(&spec(), "select 1", Some("green"), &JsonMap::new());
        run.on_tool_end("done", Some("green"), &JsonMap::new());

        let verbose = CallbackSet::configure(None, &CallbackSet::new(), true, None, &[], None, &JsonMap::new());
        let run = verbose.on_tool_start(&spec(), "select nope", Some("green"), &JsonMap::new());
        run.on_tool_error("boom", FailureKind::Domain, &JsonMap::new());
    }

    #[test]
    fn run_ids_are_unique_per_invocation() {
        let configure = || {
            CallbackSet::configure(None, &CallbackSet::new(), false, None, &[], None, &JsonMap::new())
        };
        let first = configure().on_tool_start(&spec(), "a", None, &JsonMap::new());
        let second = configure().on_tool_start(&spec(), "b", None, &JsonMap::new());
        assert_ne!(first.run_id(), second.run_id());
    }
}
