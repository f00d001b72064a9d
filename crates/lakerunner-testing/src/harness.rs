//! Scenario harness for table-driven runner tests.
//!
//! A [`Scenario`] names one invocation and what should come of it. The
//! harness runs scenarios against a [`ToolRunner`], records outcomes with
//! the lifecycle events each one produced, and summarizes the batch.

use std::fmt;
use std::sync::Arc;

use lakerunner_core::{RunError, RunOptions, ToolInput, ToolRunner};

use crate::observers::RecordingObserver;

/// Expected result of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// The run succeeds with exactly this rendered observation.
    Observation(String),
    /// The run succeeds; the rendered observation contains this fragment.
    Contains(String),
    /// The run fails; the error rendering contains this fragment.
    Error(String),
}

/// One named invocation with its expectation.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub input: ToolInput,
    pub expectation: Expectation,
    /// Call options for this scenario; state threading is tested this way.
    pub options: RunOptions,
}

impl Scenario {
    /// Expect an exact rendered observation.
    pub fn expecting(
        name: impl Into<String>,
        input: impl Into<ToolInput>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            expectation: Expectation::Observation(observation.into()),
            options: RunOptions::default(),
        }
    }

    /// Expect the rendered observation to contain a fragment.
    pub fn containing(
        name: impl Into<String>,
        input: impl Into<ToolInput>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            expectation: Expectation::Contains(fragment.into()),
            options: RunOptions::default(),
        }
    }

    /// Expect a propagated failure whose rendering contains a fragment.
    pub fn failing(
        name: impl Into<String>,
        input: impl Into<ToolInput>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            expectation: Expectation::Error(fragment.into()),
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of one executed scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub scenario_name: String,
    pub passed: bool,
    /// What the run actually produced.
    pub actual: Result<String, RunError>,
    /// Terminal lifecycle events seen during the run (should always be 1).
    pub terminal_events: usize,
}

impl ScenarioOutcome {
    pub fn summary(&self) -> String {
        let status = if self.passed { "PASS" } else { "FAIL" };
        match &self.actual {
            Ok(observation) => format!("[{status}] {} -> {observation}", self.scenario_name),
            Err(error) => format!("[{status}] {} !! {error}", self.scenario_name),
        }
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Runs scenarios against one runner.
pub struct ScenarioHarness {
    runner: ToolRunner,
    observer: RecordingObserver,
}

impl ScenarioHarness {
    pub fn new(runner: ToolRunner) -> Self {
        Self {
            runner,
            observer: RecordingObserver::new(),
        }
    }

    /// The recording observer attached to every scenario run.
    pub fn observer(&self) -> &RecordingObserver {
        &self.observer
    }

    /// Run one scenario.
    pub fn run(&self, scenario: Scenario) -> ScenarioOutcome {
        let before = self.observer.terminal_count();
        let mut options = scenario.options;
        let callbacks = options
            .callbacks
            .take()
            .unwrap_or_default()
            .with_observer(Arc::new(self.observer.clone()));
        options.callbacks = Some(callbacks);

        let result = self.runner.run(scenario.input, options);
        let terminal_events = self.observer.terminal_count() - before;

        let actual = result.map(|observation| observation.render());
        let passed = match (&scenario.expectation, &actual) {
            (Expectation::Observation(expected), Ok(observation)) => expected == observation,
            (Expectation::Contains(fragment), Ok(observation)) => observation.contains(fragment),
            (Expectation::Error(fragment), Err(error)) => error.to_string().contains(fragment),
            _ => false,
        };

        ScenarioOutcome {
            scenario_name: scenario.name,
            passed,
            actual,
            terminal_events,
        }
    }

    /// Run a batch of scenarios and collect the outcomes.
    pub fn run_all(&self, scenarios: Vec<Scenario>) -> Vec<ScenarioOutcome> {
        scenarios.into_iter().map(|s| self.run(s)).collect()
    }

    /// Assert that every outcome in a batch passed.
    ///
    /// # Panics
    ///
    /// Panics with the failing summaries when any scenario failed.
    pub fn assert_all_passed(outcomes: &[ScenarioOutcome]) {
        let failures: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(ScenarioOutcome::summary)
            .collect();
        assert!(
            failures.is_empty(),
            "scenarios failed:\n{}",
            failures.join("\n")
        );
    }
}
