//! Mock handlers and collaborators with canned, predictable responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lakerunner_core::{Observation, ToolArgs, ToolError, ToolHandler};
use lakerunner_tools::{
    AnswerSynthesizer, CatalogClient, CatalogError, ColumnInfo, Document, QueryResult,
    RetrievalError, Retriever, SqlWarehouse, TableInfo, TableRef, WarehouseError,
};

/// A handler that returns predefined responses based on the input text.
///
/// Tracks call counts and inputs so tests can assert how a runner drove it.
#[derive(Clone, Default)]
pub struct MockHandler {
    responses: HashMap<String, Result<String, Option<String>>>,
    default_response: Option<String>,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to a specific input with a success observation.
    pub fn with_response(mut self, input: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(input.into(), Ok(response.into()));
        self
    }

    /// Respond to a specific input with a declared-domain error.
    pub fn with_failure(mut self, input: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(input.into(), Err(Some(message.into())));
        self
    }

    /// Respond to a specific input with a message-less error.
    pub fn with_bare_failure(mut self, input: impl Into<String>) -> Self {
        self.responses.insert(input.into(), Err(None));
        self
    }

    /// Respond to any unmatched input with this observation.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    /// Number of times the handler has run.
    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    /// Inputs the handler has seen, in order.
    pub fn call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn was_called_with(&self, input: &str) -> bool {
        self.call_history
            .lock()
            .unwrap()
            .iter()
            .any(|seen| seen == input)
    }
}

impl ToolHandler for MockHandler {
    fn run(&self, args: ToolArgs) -> Result<Observation, ToolError> {
        let input = args.text().unwrap_or_default().to_string();
        self.call_history.lock().unwrap().push(input.clone());

        match self.responses.get(&input) {
            Some(Ok(response)) => Ok(Observation::Text(response.clone())),
            Some(Err(Some(message))) => Err(ToolError::new(message.clone())),
            Some(Err(None)) => Err(ToolError::bare()),
            None => match &self.default_response {
                Some(response) => Ok(Observation::Text(response.clone())),
                None => Ok(Observation::Text(format!("Mock response for: {input}"))),
            },
        }
    }
}

/// Catalog client over fixed in-memory tables.
#[derive(Default)]
pub struct MockCatalogClient {
    tables: Vec<TableInfo>,
}

impl MockCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with the given columns as `name TYPE` pairs.
    pub fn with_table(mut self, reference: &str, columns: &[(&str, &str)]) -> Self {
        let reference = TableRef::parse(reference).expect("valid table reference");
        self.tables.push(TableInfo {
            reference,
            columns: columns
                .iter()
                .map(|(name, data_type)| ColumnInfo::new(*name, *data_type))
                .collect(),
            comment: None,
        });
        self
    }
}

impl CatalogClient for MockCatalogClient {
    fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableRef>, CatalogError> {
        let tables: Vec<TableRef> = self
            .tables
            .iter()
            .map(|info| info.reference.clone())
            .filter(|r| r.catalog == catalog && r.schema == schema)
            .collect();
        if tables.is_empty() {
            return Err(CatalogError::SchemaNotFound {
                catalog: catalog.to_string(),
                schema: schema.to_string(),
            });
        }
        Ok(tables)
    }

    fn table_info(&self, table: &TableRef) -> Result<TableInfo, CatalogError> {
        self.tables
            .iter()
            .find(|info| &info.reference == table)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound {
                table: table.to_string(),
            })
    }
}

/// Warehouse returning one canned result for every query.
#[derive(Default)]
pub struct MockWarehouse {
    result: Option<QueryResult>,
    failure: Option<WarehouseError>,
}

impl MockWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query returns these rows.
    pub fn with_result(mut self, result: QueryResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Every query (and plan) fails with this error.
    pub fn with_failure(mut self, failure: WarehouseError) -> Self {
        self.failure = Some(failure);
        self
    }
}

impl SqlWarehouse for MockWarehouse {
    fn execute(&self, _sql: &str) -> Result<QueryResult, WarehouseError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self.result.clone().unwrap_or_else(QueryResult::empty))
    }

    fn plan(&self, _sql: &str) -> Result<String, WarehouseError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok("MockPlan".to_string())
    }
}

/// Retriever returning fixed documents for every query.
#[derive(Default)]
pub struct MockRetriever {
    documents: Vec<Document>,
}

impl MockRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, content: &str, source: Option<&str>) -> Self {
        let mut document = Document::new(content);
        if let Some(source) = source {
            document = document.with_source(source);
        }
        self.documents.push(document);
        self
    }
}

impl Retriever for MockRetriever {
    fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<Document>, RetrievalError> {
        Ok(self.documents.iter().take(top_k).cloned().collect())
    }
}

/// Synthesizer that formats a deterministic answer from what it receives.
#[derive(Default)]
pub struct MockSynthesizer;

impl MockSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl AnswerSynthesizer for MockSynthesizer {
    fn answer(
        &self,
        question: &str,
        documents: &[Document],
        state: Option<&[lakerunner_core::JsonMap]>,
    ) -> Result<String, RetrievalError> {
        let state_len = state.map(<[lakerunner_core::JsonMap]>::len).unwrap_or(0);
        Ok(format!(
            "answer({question}) from {} docs, {state_len} state entries",
            documents.len()
        ))
    }
}
