//! MCP (Model Context Protocol) Server Module
//!
//! Exposes Odoo over MCP for agent integration.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        MCP Client                            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ MCP Protocol (JSON-RPC over stdio)
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MCP Server (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Tools:                                                      │
//! │  ├── execute_method          - Arbitrary model method       │
//! │  ├── search_employee         - Employee lookup by name      │
//! │  ├── search_holidays         - Leave calendar by range      │
//! │  ├── search_partner_by_name  - Company partner lookup       │
//! │  ├── create_customer         - New res.partner              │
//! │  ├── create_lead             - New crm.lead opportunity     │
//! │  ├── search_calendar_events  - Own calendar by range        │
//! │  └── create_calendar_event   - New calendar.event           │
//! │  Resources:                                                  │
//! │  └── odoo://{models,model,record,search}/...                │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ XML-RPC over HTTP(S)
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Odoo Server                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! ODOO_URL=https://odoo.example.com ODOO_DB=prod \
//! ODOO_USERNAME=bot ODOO_PASSWORD=... ./target/debug/odoo_mcp
//! ```

pub mod handlers;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use server::McpServer;
