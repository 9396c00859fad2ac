//! Odoo MCP Server Binary
//!
//! Connects to an Odoo instance and serves MCP over stdio.
//!
//! ## Environment Variables
//!
//! - `ODOO_URL` (required unless a config file exists): Odoo base URL
//! - `ODOO_DB`: database name
//! - `ODOO_USERNAME` / `ODOO_PASSWORD`: credentials
//! - `ODOO_TIMEOUT`: request timeout in seconds (default 30)
//! - `ODOO_VERIFY_SSL`: set to `false` to skip TLS verification
//! - `RUST_LOG`: log filter (default `info`), written to stderr

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use odoo_mcp::mcp::McpServer;
use odoo_mcp::{OdooClient, OdooConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the protocol stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = OdooConfig::load().context("loading Odoo configuration")?;
    info!(url = %config.url, db = %config.db, "connecting to Odoo");

    let client = OdooClient::connect(&config)
        .await
        .context("connecting to Odoo")?;
    info!(uid = client.uid(), "authenticated");

    let server = McpServer::new(Arc::new(client));
    server.run().await.context("running MCP server")?;
    Ok(())
}
