//! Data-catalog exploration tools.
//!
//! The catalog itself lives behind [`CatalogClient`]; these tools shape its
//! answers into agent-facing observations. Table listing gives the agent
//! the lay of the land, table info gives it the column detail it needs to
//! write queries.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lakerunner_core::{
    ArgsSchema, BuildError, ErrorPolicy, FieldSpec, Observation, ToolArgs, ToolError, ToolHandler,
    ToolRunner,
};

/// Fully qualified reference to a table: `catalog.schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Parse a `catalog.schema.table` reference.
    pub fn parse(reference: &str) -> Result<Self, CatalogError> {
        let trimmed = reference.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        match parts.as_slice() {
            [catalog, schema, table]
                if !catalog.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Ok(Self::new(*catalog, *schema, *table))
            }
            _ => Err(CatalogError::InvalidReference {
                reference: trimmed.to_string(),
            }),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// One column of a catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Schema-level description of a catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub reference: TableRef,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TableInfo {
    /// Render the table description the way the info tool reports it.
    fn render(&self) -> String {
        let mut out = format!("Table: {}", self.reference);
        if let Some(comment) = &self.comment {
            out.push_str(&format!("\nComment: {comment}"));
        }
        out.push_str("\nColumns:");
        for column in &self.columns {
            out.push_str(&format!("\n  {} {}", column.name, column.data_type));
            if let Some(comment) = &column.comment {
                out.push_str(&format!("  -- {comment}"));
            }
        }
        out
    }
}

/// Collaborator interface to the data catalog.
///
/// Implementations talk to the actual catalog service; the tools in this
/// module only shape their answers.
pub trait CatalogClient: Send + Sync {
    /// List the tables available in one catalog schema.
    fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableRef>, CatalogError>;

    /// Fetch the schema description of one table.
    fn table_info(&self, table: &TableRef) -> Result<TableInfo, CatalogError>;
}

/// Failures reported by a [`CatalogClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("table '{table}' not found")]
    TableNotFound { table: String },
    #[error("schema '{catalog}.{schema}' not found")]
    SchemaNotFound { catalog: String, schema: String },
    #[error("'{reference}' is not a valid catalog.schema.table reference")]
    InvalidReference { reference: String },
    #[error("catalog unavailable: {message}")]
    Unavailable { message: String },
}

impl From<CatalogError> for ToolError {
    fn from(err: CatalogError) -> Self {
        ToolError::new(err.to_string())
    }
}

/// Lists the tables of a fixed catalog schema.
///
/// Input is ignored (agents conventionally pass an empty string); the
/// observation is a comma-separated table list.
pub struct ListCatalogTablesTool {
    client: Arc<dyn CatalogClient>,
    catalog: String,
    schema: String,
}

impl ListCatalogTablesTool {
    pub const NAME: &str = "list_catalog_tables";

    const DESCRIPTION: &str = "Input is an empty string, output is a comma-separated \
         list of tables in the configured catalog schema.";

    pub fn new(
        client: Arc<dyn CatalogClient>,
        catalog: impl Into<String>,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            client,
            catalog: catalog.into(),
            schema: schema.into(),
        }
    }

    /// Package the tool as a runner.
    pub fn into_runner(self) -> Result<ToolRunner, BuildError> {
        Ok(ToolRunner::builder(Self::NAME, Self::DESCRIPTION)?
            .handler(self)
            .build()?)
    }
}

impl ToolHandler for ListCatalogTablesTool {
    fn run(&self, _args: ToolArgs) -> Result<Observation, ToolError> {
        let tables = self.client.list_tables(&self.catalog, &self.schema)?;
        let listing = tables
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Observation::Text(listing))
    }
}

/// Describes catalog tables: columns, types, and comments.
///
/// Input is a comma-separated list of fully qualified table names. Lookup
/// failures surface as observations under the default policy so the agent
/// can correct its table names and retry.
pub struct CatalogInfoTool {
    client: Arc<dyn CatalogClient>,
}

impl CatalogInfoTool {
    pub const NAME: &str = "catalog_info";

    const DESCRIPTION: &str = "Input is a comma-separated list of fully qualified table \
         names, output is the schema and comments for those tables. Be sure the tables exist by \
         calling list_catalog_tables first.";

    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        Self { client }
    }

    pub fn into_runner(self) -> Result<ToolRunner, BuildError> {
        Ok(ToolRunner::builder(Self::NAME, Self::DESCRIPTION)?
            .schema(ArgsSchema::new().with_field(
                FieldSpec::text("tables").with_description("comma-separated table references"),
            ))
            .handler(self)
            .error_policy(ErrorPolicy::FromError)
            .build()?)
    }
}

impl ToolHandler for CatalogInfoTool {
    fn run(&self, args: ToolArgs) -> Result<Observation, ToolError> {
        let tables = args
            .text_or("tables")
            .ok_or_else(|| ToolError::new("no table names given"))?;
        let mut sections = Vec::new();
        for reference in tables.split(',').filter(|s| !s.trim().is_empty()) {
            let table = TableRef::parse(reference)?;
            let info = self.client.table_info(&table)?;
            sections.push(info.render());
        }
        if sections.is_empty() {
            return Err(ToolError::new("no table names given"));
        }
        Ok(Observation::Text(sections.join("\n\n")))
    }
}
