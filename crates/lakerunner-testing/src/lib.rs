//! # Lakerunner Testing
//!
//! Testing utilities for lakerunner tools: a recording observer that
//! captures lifecycle events, mock handlers and collaborators with canned
//! responses, and a scenario harness for table-driven runner tests.

pub mod harness;
pub mod mock_tools;
pub mod observers;

pub use harness::{Expectation, Scenario, ScenarioHarness, ScenarioOutcome};
pub use mock_tools::{
    MockCatalogClient, MockHandler, MockRetriever, MockSynthesizer, MockWarehouse,
};
pub use observers::{RecordedEvent, RecordingObserver};
