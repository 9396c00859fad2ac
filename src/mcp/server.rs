//! MCP Server over stdio
//!
//! Reads JSON-RPC requests line by line from stdin and writes responses
//! to stdout. Diagnostics go to stderr so the protocol stream stays clean.

use crate::client::OdooClient;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::handlers::ToolHandlers;
use super::protocol::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, ResourceReadParams, ResourcesCapability,
    ResourcesListResult, ResourcesReadResult, ServerCapabilities, ServerInfo, ToolCallParams,
    ToolsCapability, ToolsListResult, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use super::resources::ResourceHandlers;
use super::tools::get_tools;

pub struct McpServer {
    handlers: ToolHandlers,
    resources: ResourceHandlers,
}

impl McpServer {
    pub fn new(odoo: Arc<OdooClient>) -> Self {
        Self {
            handlers: ToolHandlers::new(Arc::clone(&odoo)),
            resources: ResourceHandlers::new(odoo),
        }
    }

    pub async fn run(&self) -> io::Result<()> {
        info!("MCP server started, reading from stdin");

        let stdin = io::stdin();
        let stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut out = stdout.lock();
                serde_json::to_writer(&mut out, &response)?;
                out.write_all(b"\n")?;
                out.flush()?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("failed to parse request: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        debug!(method = %request.method, "handling request");

        // Notifications get no response.
        let id = request.id.clone()?;

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => JsonRpcResponse::success(
                Some(id),
                json!(ToolsListResult { tools: get_tools() }),
            ),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            "resources/list" => JsonRpcResponse::success(
                Some(id),
                json!(ResourcesListResult {
                    resources: self.resources.list(),
                }),
            ),
            "resources/read" => self.handle_resource_read(id, request.params).await,
            "ping" => JsonRpcResponse::success(Some(id), json!({})),
            other => JsonRpcResponse::error(
                Some(id),
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: "2024-11-05".into(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
                resources: ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "odoo-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
        };
        JsonRpcResponse::success(Some(id), json!(result))
    }

    async fn handle_tool_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    Some(id),
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
        };

        let result = self.handlers.handle(&params.name, params.arguments).await;
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(e) => JsonRpcResponse::error(Some(id), INTERNAL_ERROR, e.to_string()),
        }
    }

    async fn handle_resource_read(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: ResourceReadParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    Some(id),
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
        };

        let contents = self.resources.read(&params.uri).await;
        JsonRpcResponse::success(
            Some(id),
            json!(ResourcesReadResult {
                contents: vec![contents],
            }),
        )
    }
}
