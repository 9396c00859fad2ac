//! MCP Resources
//!
//! Read-only views over Odoo data addressed by odoo:// URIs.

use crate::client::OdooClient;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::protocol::{Resource, ResourceContents};

pub struct ResourceHandlers {
    odoo: Arc<OdooClient>,
}

impl ResourceHandlers {
    pub fn new(odoo: Arc<OdooClient>) -> Self {
        Self { odoo }
    }

    pub fn list(&self) -> Vec<Resource> {
        vec![
            Resource {
                uri: "odoo://models".into(),
                name: "Available models".into(),
                description: "List of models installed on the Odoo server".into(),
                mime_type: "application/json".into(),
            },
            Resource {
                uri: "odoo://model/{model}".into(),
                name: "Model schema".into(),
                description: "Field definitions for a given model".into(),
                mime_type: "application/json".into(),
            },
            Resource {
                uri: "odoo://record/{model}/{id}".into(),
                name: "Single record".into(),
                description: "One record of a model by ID".into(),
                mime_type: "application/json".into(),
            },
            Resource {
                uri: "odoo://search/{model}/{domain}".into(),
                name: "Search results".into(),
                description: "Records matching a search domain (max 10)".into(),
                mime_type: "application/json".into(),
            },
        ]
    }

    /// Read a resource; errors are reported inside the JSON body so the
    /// RPC layer never has to distinguish outcomes.
    pub async fn read(&self, uri: &str) -> ResourceContents {
        debug!(uri, "reading resource");
        let body = match self.resolve(uri).await {
            Ok(value) => value,
            Err(message) => json!({ "error": message }),
        };
        ResourceContents {
            uri: uri.into(),
            mime_type: "application/json".into(),
            text: serde_json::to_string_pretty(&body).unwrap_or_default(),
        }
    }

    async fn resolve(&self, uri: &str) -> Result<Value, String> {
        let path = uri
            .strip_prefix("odoo://")
            .ok_or_else(|| format!("Unsupported URI scheme: {}", uri))?;
        let mut parts = path.splitn(3, '/');
        let kind = parts.next().unwrap_or_default();

        match (kind, parts.next(), parts.next()) {
            ("models", None, None) => self.read_models().await,
            ("model", Some(model), None) => self.read_model(model).await,
            ("record", Some(model), Some(id)) => {
                let id: i64 = id
                    .parse()
                    .map_err(|_| format!("Invalid record ID: {}", id))?;
                self.read_record(model, id).await
            }
            ("search", Some(model), Some(domain)) => self.read_search(model, domain).await,
            _ => Err(format!("Unknown resource URI: {}", uri)),
        }
    }

    async fn read_models(&self) -> Result<Value, String> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".into(), json!(["model", "name"]));
        kwargs.insert("order".into(), json!("model asc"));
        self.odoo
            .execute_kw(
                "ir.model",
                "search_read",
                vec![json!([])],
                kwargs,
            )
            .await
            .map_err(|e| e.to_string())
    }

    async fn read_model(&self, model: &str) -> Result<Value, String> {
        let mut kwargs = Map::new();
        kwargs.insert(
            "attributes".into(),
            json!(["string", "type", "required", "readonly", "relation"]),
        );
        let fields = self
            .odoo
            .execute_kw(model, "fields_get", Vec::new(), kwargs)
            .await
            .map_err(|e| e.to_string())?;
        Ok(json!({ "model": model, "fields": fields }))
    }

    async fn read_record(&self, model: &str, id: i64) -> Result<Value, String> {
        let records = self
            .odoo
            .read(model, &[id], &[])
            .await
            .map_err(|e| e.to_string())?;
        records
            .as_array()
            .and_then(|a| a.first())
            .cloned()
            .ok_or_else(|| format!("Record {}/{} not found", model, id))
    }

    async fn read_search(&self, model: &str, domain: &str) -> Result<Value, String> {
        let mut kwargs = Map::new();
        kwargs.insert("limit".into(), json!(10));
        self.odoo
            .execute_kw(
                model,
                "search_read",
                vec![Value::String(domain.to_string())],
                kwargs,
            )
            .await
            .map_err(|e| e.to_string())
    }
}
