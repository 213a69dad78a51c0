//! MCP service implementation using rmcp.
//!
//! This module defines the QueryService struct with the read-oriented
//! database tools exposed via the MCP protocol using the rmcp framework's
//! macros.

use crate::db::DbClient;
use crate::error::DbError;
use crate::models::ExportSummary;
use crate::tools::export::{ExportInput, ExportToolHandler};
use crate::tools::query::{QueryInput, QueryResponse, QueryToolHandler};
use crate::tools::schema::{
    ListDatabasesOutput, ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct QueryService {
    /// Shared database client for all tool calls
    client: Arc<DbClient>,
    /// Per-query timeout applied by the tool handlers
    query_timeout: Duration,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl QueryService {
    pub fn new(client: Arc<DbClient>, query_timeout: Duration) -> Self {
        Self {
            client,
            query_timeout,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl QueryService {
    #[tool(description = "List all database names known to the server, in catalog order.")]
    async fn list_databases(&self) -> Result<Json<ListDatabasesOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.client.clone());
        handler
            .list_databases()
            .await
            .map(Json)
            .map_err(|e: DbError| e.into())
    }

    #[tool(
        description = "List tables in a database with their comments and columns.\nColumns are returned in declaration order; missing comments come back as empty strings.\nUse `like` with SQL LIKE syntax to filter table names."
    )]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<Json<ListTablesOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.client.clone());
        handler
            .list_tables(input)
            .await
            .map(Json)
            .map_err(|e: DbError| e.into())
    }

    #[tool(
        description = "Execute a SELECT query and return column names, rows and row count.\nQuery failures are reported in the response body with status \"error\" and a message, so check the status field before using the rows."
    )]
    async fn run_select_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Json<QueryResponse> {
        let handler = QueryToolHandler::new(self.client.clone(), self.query_timeout);
        Json(handler.run_select_query(input).await)
    }

    #[tool(
        description = "Execute a SELECT query and save the results to a file on the server host.\nFormat must be \"csv\" (RFC 4180 with a header row) or \"json\" (array of objects).\nUnlike run_select_query, failures raise errors instead of returning them as data."
    )]
    async fn save_query_results(
        &self,
        Parameters(input): Parameters<ExportInput>,
    ) -> Result<Json<ExportSummary>, McpError> {
        let handler = ExportToolHandler::new(self.client.clone(), self.query_timeout);
        handler
            .save_query_results(input)
            .await
            .map(Json)
            .map_err(|e: DbError| e.into())
    }
}

#[tool_handler]
impl ServerHandler for QueryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "query-mcp-server".to_owned(),
                title: Some("Query MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-oriented database tools.\n\
                \n\
                ## Workflow\n\
                1. Call `list_databases` to see what the server knows about\n\
                2. Call `list_tables` with a database name to explore its tables and columns\n\
                3. Use `run_select_query` for ad-hoc SELECT statements\n\
                4. Use `save_query_results` to write large result sets to CSV or JSON files\n\
                \n\
                ## Error Handling\n\
                - `run_select_query` never fails the tool call: a bad query returns\n\
                  `{\"status\": \"error\", \"message\": \"Query failed: ...\"}` in the body\n\
                - All other tools raise protocol errors on failure\n\
                \n\
                ## Database-Specific Notes\n\
                - PostgreSQL: the `database` argument of `list_tables` selects the schema\n\
                - SQLite: a connection sees a single database file; comments are always empty"
                    .to_string(),
            ),
        }
    }
}
