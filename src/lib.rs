//! Resilient XML-RPC client and MCP server for Odoo.
//!
//! The crate is organized in two layers:
//!
//! - A transport / client kernel ([`transport`], [`xmlrpc`], [`client`],
//!   [`domain`]) that speaks XML-RPC to an Odoo instance, follows HTTP
//!   redirects manually, and normalizes search domains before they hit
//!   the wire.
//! - An MCP server ([`mcp`]) exposing that client as tools and resources
//!   over JSON-RPC on stdio.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod mcp;
pub mod transport;
pub mod xmlrpc;

pub use client::OdooClient;
pub use config::OdooConfig;
pub use error::{OdooError, TransportError};
