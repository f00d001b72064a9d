//! SQL execution and validation tools.
//!
//! The warehouse lives behind [`SqlWarehouse`]. The query tool executes and
//! renders rows; the validator runs cheap local guard checks first and only
//! then asks the warehouse for a plan, so obviously broken queries never
//! leave the process.

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use lakerunner_core::{
    ArgsSchema, BuildError, ErrorPolicy, FieldSpec, Observation, ToolArgs, ToolError, ToolHandler,
    ToolRunner,
};

/// Rows returned by a warehouse query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Render rows as the query tool reports them, truncated to `max_rows`.
    pub fn render(&self, max_rows: usize) -> String {
        if self.rows.is_empty() {
            return "(no rows)".to_string();
        }
        let mut out = self.columns.join(" | ");
        for row in self.rows.iter().take(max_rows) {
            let cells = row
                .iter()
                .map(render_cell)
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = write!(out, "\n{cells}");
        }
        if self.rows.len() > max_rows {
            let _ = write!(out, "\n... ({} more rows)", self.rows.len() - max_rows);
        }
        out
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Collaborator interface to the SQL warehouse.
pub trait SqlWarehouse: Send + Sync {
    /// Execute a query and return its rows.
    fn execute(&self, sql: &str) -> Result<QueryResult, WarehouseError>;

    /// Produce an execution plan without running the query.
    fn plan(&self, sql: &str) -> Result<String, WarehouseError>;
}

/// Failures reported by a [`SqlWarehouse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WarehouseError {
    /// The engine rejected the query text.
    #[error("syntax error: {message}")]
    Syntax { message: String },
    /// The query ran and failed.
    #[error("execution failed: {message}")]
    Execution { message: String },
    /// The warehouse could not be reached.
    #[error("warehouse unavailable: {message}")]
    Unavailable { message: String },
}

impl From<WarehouseError> for ToolError {
    fn from(err: WarehouseError) -> Self {
        ToolError::new(err.to_string())
    }
}

/// Default row cap applied to query observations.
pub const DEFAULT_ROW_LIMIT: usize = 10;

/// Executes a SQL query and reports the resulting rows.
///
/// Engine errors surface as observations under the default `FromError`
/// policy, matching how agents iterate on queries: read the error, rewrite,
/// retry.
pub struct SqlQueryTool {
    warehouse: Arc<dyn SqlWarehouse>,
    row_limit: usize,
}

impl SqlQueryTool {
    pub const NAME: &str = "sql_query";

    const DESCRIPTION: &str = "Input is a SQL query, output is the resulting rows. If \
         the query is wrong an error message is returned; rewrite the query and try again. Use \
         sql_validator to check a query before executing it.";

    pub fn new(warehouse: Arc<dyn SqlWarehouse>) -> Self {
        Self {
            warehouse,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }

    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    pub fn into_runner(self) -> Result<ToolRunner, BuildError> {
        Ok(ToolRunner::builder(Self::NAME, Self::DESCRIPTION)?
            .schema(
                ArgsSchema::new()
                    .with_field(FieldSpec::text("query").with_description("SQL to execute"))
                    .with_field(
                        FieldSpec::integer("limit")
                            .optional()
                            .with_description("maximum rows to report"),
                    ),
            )
            .handler(self)
            .error_policy(ErrorPolicy::FromError)
            .build()?)
    }
}

impl ToolHandler for SqlQueryTool {
    fn run(&self, args: ToolArgs) -> Result<Observation, ToolError> {
        let query = args
            .text_or("query")
            .ok_or_else(|| ToolError::new("no query given"))?;
        let limit = args
            .get_i64("limit")
            .map(|n| n.max(0) as usize)
            .unwrap_or(self.row_limit);
        debug!(query, limit, "executing warehouse query");
        let result = self.warehouse.execute(query)?;
        Ok(Observation::Text(result.render(limit)))
    }
}

static STATEMENT_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(select|with|show|describe|desc|explain)\b").expect("valid guard pattern")
});

/// Validates a SQL query without executing it.
///
/// Guard checks run locally: single statement, read-only statement kind,
/// balanced quoting. Queries that pass are sent to the warehouse planner
/// for the authoritative verdict. The observation is always a verdict
/// rendering — an invalid query is a negative verdict, not a tool failure;
/// only an unreachable warehouse raises.
pub struct SqlValidatorTool {
    warehouse: Arc<dyn SqlWarehouse>,
}

impl SqlValidatorTool {
    pub const NAME: &str = "sql_validator";

    const DESCRIPTION: &str = "Input is a SQL query, output is a verdict on whether the \
         query is valid. Always use this before sql_query.";

    pub fn new(warehouse: Arc<dyn SqlWarehouse>) -> Self {
        Self { warehouse }
    }

    pub fn into_runner(self) -> Result<ToolRunner, BuildError> {
        Ok(ToolRunner::builder(Self::NAME, Self::DESCRIPTION)?
            .schema(
                ArgsSchema::new()
                    .with_field(FieldSpec::text("query").with_description("SQL to validate")),
            )
            .handler(self)
            .build()?)
    }

    /// Local structural checks. Returns the reason the query is invalid, if
    /// any.
    fn guard(query: &str) -> Option<String> {
        let trimmed = query.trim().trim_end_matches(';').trim_end();
        if trimmed.is_empty() {
            return Some("query is empty".to_string());
        }
        if trimmed.contains(';') {
            return Some("multiple statements are not allowed".to_string());
        }
        if !STATEMENT_GUARD.is_match(trimmed) {
            return Some("only read-only statements are allowed".to_string());
        }
        if trimmed.matches('\'').count() % 2 != 0 {
            return Some("unbalanced single quotes".to_string());
        }
        if trimmed.matches('"').count() % 2 != 0 {
            return Some("unbalanced double quotes".to_string());
        }
        None
    }
}

impl ToolHandler for SqlValidatorTool {
    fn run(&self, args: ToolArgs) -> Result<Observation, ToolError> {
        let query = args
            .text_or("query")
            .ok_or_else(|| ToolError::new("no query given"))?;
        if let Some(reason) = Self::guard(query) {
            return Ok(Observation::Text(format!("Invalid: {reason}")));
        }
        match self.warehouse.plan(query) {
            Ok(_) => Ok(Observation::Text("Valid".to_string())),
            Err(WarehouseError::Syntax { message }) => {
                Ok(Observation::Text(format!("Invalid: {message}")))
            }
            Err(err) => Err(err.into()),
        }
    }
}
