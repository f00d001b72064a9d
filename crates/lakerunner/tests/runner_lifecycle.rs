//! End-to-end tests for the invocation wrapper: lifecycle notifications,
//! error-policy behavior, handler shapes, and state threading.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use lakerunner::{
    DEFAULT_ERROR_OBSERVATION, ErrorPolicy, FailureKind, JsonMap, Observation, RunError,
    RunOptions, ToolArgs, ToolError, ToolInput, ToolRunner,
};
use lakerunner_testing::{MockHandler, RecordingObserver, Scenario, ScenarioHarness};
use serde_json::{Value, json};

fn observed_runner(policy: ErrorPolicy) -> (ToolRunner, RecordingObserver) {
    let observer = RecordingObserver::new();
    let handler = MockHandler::new()
        .with_response("ok", "fine")
        .with_failure("fail", "X")
        .with_bare_failure("fail-bare");
    let runner = ToolRunner::builder("probe", "probe tool")
        .unwrap()
        .handler(handler)
        .error_policy(policy)
        .observer(Arc::new(observer.clone()))
        .build()
        .unwrap();
    (runner, observer)
}

#[test]
fn exactly_one_terminal_event_fires_per_run() {
    let (runner, observer) = observed_runner(ErrorPolicy::FromError);

    runner.invoke("ok").unwrap();
    runner.invoke("fail").unwrap();
    runner.invoke("anything").unwrap();

    observer.assert_one_terminal_per_call(3);
}

#[test]
fn default_policy_propagates_declared_errors_unchanged() {
    let (runner, observer) = observed_runner(ErrorPolicy::Propagate);

    let err = runner.invoke("fail").unwrap_err();
    let RunError::Tool(tool_error) = err else {
        panic!("expected a propagated tool error");
    };
    assert_eq!(tool_error.message(), Some("X"));

    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, FailureKind::Domain);
    assert!(observer.ends().is_empty());
}

#[test]
fn from_error_policy_substitutes_message_or_fallback() {
    let (runner, _observer) = observed_runner(ErrorPolicy::FromError);

    assert_eq!(runner.invoke("fail").unwrap().render(), "X");
    assert_eq!(
        runner.invoke("fail-bare").unwrap().render(),
        DEFAULT_ERROR_OBSERVATION
    );
}

#[test]
fn fixed_message_policy_substitutes_verbatim() {
    let (runner, _observer) = observed_runner(ErrorPolicy::FixedMessage("S".into()));

    assert_eq!(runner.invoke("fail").unwrap().render(), "S");
    assert_eq!(runner.invoke("fail-bare").unwrap().render(), "S");
}

#[test]
fn custom_policy_substitutes_handler_return_value() {
    let policy = ErrorPolicy::custom(|err: &ToolError| format!("custom<{err}>"));
    let (runner, _observer) = observed_runner(policy);

    assert_eq!(runner.invoke("fail").unwrap().render(), "custom<X>");
}

#[test]
fn validation_failure_fires_no_lifecycle_events() {
    let observer = RecordingObserver::new();
    let runner = ToolRunner::builder("strict", "schema'd tool")
        .unwrap()
        .schema(
            lakerunner::ArgsSchema::new()
                .with_field(lakerunner::FieldSpec::text("query")),
        )
        .handler(MockHandler::new())
        .observer(Arc::new(observer.clone()))
        .build()
        .unwrap();

    let mut bad = JsonMap::new();
    bad.insert("wrong_field".into(), json!("value"));
    let err = runner.invoke(ToolInput::args(bad)).unwrap_err();

    assert!(matches!(err, RunError::InvalidInput(_)));
    assert!(observer.events().is_empty());
}

#[test]
fn state_reaches_context_handlers_per_call_only() {
    let seen = Arc::new(Mutex::new(Vec::<Option<Vec<JsonMap>>>::new()));
    let seen_in_handler = seen.clone();
    let runner = ToolRunner::builder("stateful", "sees per-call state")
        .unwrap()
        .context_handler(move |_args: ToolArgs, ctx: &lakerunner::RunContext<'_>| {
            seen_in_handler
                .lock()
                .unwrap()
                .push(ctx.state().map(<[JsonMap]>::to_vec));
            Ok(Observation::from("ok"))
        })
        .build()
        .unwrap();

    let mut step = JsonMap::new();
    step.insert("step".into(), Value::String("searched the catalog".into()));
    runner
        .run(
            ToolInput::text("first"),
            RunOptions::new().with_state(vec![step.clone()]),
        )
        .unwrap();
    runner.invoke("second").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].as_deref(), Some(&[step][..]));
    assert_eq!(seen[1], None);
}

#[test]
fn panics_are_reported_and_resumed_not_substituted() {
    let observer = RecordingObserver::new();
    let runner = ToolRunner::builder("panics", "always panics")
        .unwrap()
        .handler(|_args: ToolArgs| -> Result<Observation, ToolError> {
            panic!("out of memory simulation")
        })
        .error_policy(ErrorPolicy::FixedMessage("never substituted".into()))
        .observer(Arc::new(observer.clone()))
        .build()
        .unwrap();

    let caught = std::panic::catch_unwind(AssertUnwindSafe(|| runner.invoke("x")));
    assert!(caught.is_err());

    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, FailureKind::Panic);
    assert!(observer.ends().is_empty());
}

#[test]
fn observer_end_event_carries_stringified_output_caller_gets_original() {
    let observer = RecordingObserver::new();
    let runner = ToolRunner::builder("structured", "returns JSON")
        .unwrap()
        .handler(|_args: ToolArgs| Ok(Observation::Json(json!({"rows": 2}))))
        .observer(Arc::new(observer.clone()))
        .build()
        .unwrap();

    let observation = runner.invoke("x").unwrap();
    assert_eq!(observation, Observation::Json(json!({"rows": 2})));
    assert_eq!(observer.ends(), [r#"{"rows":2}"#.to_string()]);
}

#[test]
fn scenario_harness_drives_policy_matrix() {
    let handler = MockHandler::new()
        .with_response("ok", "fine")
        .with_failure("fail", "backend gone");
    let runner = ToolRunner::builder("matrix", "policy matrix tool")
        .unwrap()
        .handler(handler)
        .error_policy(ErrorPolicy::Propagate)
        .build()
        .unwrap();

    let harness = ScenarioHarness::new(runner);
    let outcomes = harness.run_all(vec![
        Scenario::expecting("success path", "ok", "fine"),
        Scenario::failing("failure path", "fail", "backend gone"),
        Scenario::containing("default mock response", "unmatched", "Mock response"),
    ]);
    ScenarioHarness::assert_all_passed(&outcomes);
    assert!(outcomes.iter().all(|o| o.terminal_events == 1));
}
