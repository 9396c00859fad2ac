//! Odoo XML-RPC client.
//!
//! One [`OdooClient`] is one authenticated session: construction performs a
//! single `authenticate` handshake against the common endpoint and caches
//! the numeric uid for the lifetime of the client. Every subsequent call
//! re-supplies the uid and password, per the protocol's stateless design.
//! The uid and password are read-only after construction, so a client can be
//! shared behind an `Arc` and invoked concurrently.

use std::fmt;

use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

use crate::config::OdooConfig;
use crate::domain;
use crate::error::OdooError;
use crate::transport::RedirectTransport;
use crate::xmlrpc::{self, XmlRpcError};

/// Remote methods whose first positional argument is a search domain and is
/// therefore normalized before the call goes out.
const FILTER_METHODS: [&str; 3] = ["search", "search_count", "search_read"];

pub struct OdooClient {
    transport: RedirectTransport,
    common: Url,
    object: Url,
    db: String,
    username: String,
    password: String,
    uid: i64,
}

// The credential must never leak through logs.
impl fmt::Debug for OdooClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdooClient")
            .field("common", &self.common.as_str())
            .field("object", &self.object.as_str())
            .field("db", &self.db)
            .field("username", &self.username)
            .field("uid", &self.uid)
            .finish()
    }
}

impl OdooClient {
    /// Build the endpoints, authenticate once, and return a ready session.
    ///
    /// Authentication failure is fatal: there is no retry and no partial
    /// session. A falsy uid from the server means the credentials were
    /// rejected; a network failure is reported as [`OdooError::ConnectionFailed`];
    /// everything else as [`OdooError::AuthenticationFailed`].
    pub async fn connect(config: &OdooConfig) -> Result<Self, OdooError> {
        let base = config.normalized_url();
        let common = parse_endpoint(&base, "common")?;
        let object = parse_endpoint(&base, "object")?;

        let transport = RedirectTransport::new(config.timeout(), config.verify_ssl)
            .map_err(OdooError::ConnectionFailed)?;

        debug!(url = %base, db = %config.db, username = %config.username, "authenticating");

        let body = xmlrpc::encode_request(
            "authenticate",
            &[
                json!(config.db),
                json!(config.username),
                json!(config.password),
                json!({}),
            ],
        )
        .map_err(|e| OdooError::AuthenticationFailed(e.to_string()))?;

        let raw = transport
            .send(&common, &body)
            .await
            .map_err(OdooError::ConnectionFailed)?;

        let answer = xmlrpc::decode_response(&raw)
            .map_err(|e| OdooError::AuthenticationFailed(e.to_string()))?;

        let uid = match answer {
            // Only a positive uid is a successful login; the protocol uses
            // 0 and false to signal rejection, not "no value".
            Value::Number(n) => match n.as_i64() {
                Some(uid) if uid > 0 => uid,
                _ => return Err(OdooError::InvalidCredentials),
            },
            Value::Bool(_) | Value::Null => return Err(OdooError::InvalidCredentials),
            Value::String(s) if s.is_empty() => return Err(OdooError::InvalidCredentials),
            other => {
                return Err(OdooError::AuthenticationFailed(format!(
                    "unexpected authenticate result: {other}"
                )))
            }
        };

        debug!(uid, "authenticated");

        Ok(Self {
            transport,
            common,
            object,
            db: config.db.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            uid,
        })
    }

    /// The numeric identity obtained at construction.
    pub fn uid(&self) -> i64 {
        self.uid
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Execute `method` on `model` via the object endpoint.
    ///
    /// Forwards `(db, uid, password, model, method, args, kwargs)` in that
    /// fixed order. For the filtering methods the first positional argument
    /// is passed through the domain normalizer first, so the server never
    /// sees a malformed domain.
    pub async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        mut args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, OdooError> {
        if FILTER_METHODS.contains(&method) && !args.is_empty() {
            let normalized = domain::normalize_domain_value(&args[0]);
            debug!(model, method, domain = %normalized, "normalized search domain");
            args[0] = normalized;
        }

        let params = [
            json!(self.db),
            json!(self.uid),
            json!(self.password),
            json!(model),
            json!(method),
            Value::Array(args),
            Value::Object(kwargs),
        ];

        let body =
            xmlrpc::encode_request("execute_kw", &params).map_err(|e| OdooError::Protocol {
                model: model.to_string(),
                method: method.to_string(),
                message: e.to_string(),
            })?;

        debug!(model, method, "executing remote method");

        let raw = self
            .transport
            .send(&self.object, &body)
            .await
            .map_err(|source| OdooError::Call {
                model: model.to_string(),
                method: method.to_string(),
                source,
            })?;

        xmlrpc::decode_response(&raw).map_err(|e| match e {
            XmlRpcError::Fault { code, message } => OdooError::RemoteFault {
                model: model.to_string(),
                method: method.to_string(),
                code,
                message,
            },
            other => OdooError::Protocol {
                model: model.to_string(),
                method: method.to_string(),
                message: other.to_string(),
            },
        })
    }

    /// `search_read` convenience wrapper.
    pub async fn search_read(
        &self,
        model: &str,
        domain: Value,
        fields: &[&str],
        limit: Option<i64>,
    ) -> Result<Value, OdooError> {
        let mut kwargs = Map::new();
        if !fields.is_empty() {
            kwargs.insert("fields".into(), json!(fields));
        }
        if let Some(limit) = limit {
            kwargs.insert("limit".into(), json!(limit));
        }
        self.execute_kw(model, "search_read", vec![domain], kwargs)
            .await
    }

    /// `read` convenience wrapper for a set of record ids.
    pub async fn read(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Value, OdooError> {
        let mut kwargs = Map::new();
        if !fields.is_empty() {
            kwargs.insert("fields".into(), json!(fields));
        }
        self.execute_kw(model, "read", vec![json!(ids)], kwargs)
            .await
    }

    /// `create` convenience wrapper; returns the new record id.
    pub async fn create(&self, model: &str, values: Value) -> Result<i64, OdooError> {
        let created = self
            .execute_kw(model, "create", vec![values], Map::new())
            .await?;
        // Some Odoo versions answer with a one-element list.
        let id = match &created {
            Value::Number(n) => n.as_i64(),
            Value::Array(items) => items.first().and_then(Value::as_i64),
            _ => None,
        };
        id.ok_or_else(|| OdooError::Protocol {
            model: model.to_string(),
            method: "create".to_string(),
            message: format!("unexpected create result: {created}"),
        })
    }
}

fn parse_endpoint(base: &str, suffix: &str) -> Result<Url, OdooError> {
    let raw = format!("{base}/xmlrpc/2/{suffix}");
    let url =
        Url::parse(&raw).map_err(|e| OdooError::Config(format!("invalid Odoo URL {raw:?}: {e}")))?;
    // `http:///path` parses fine but has no host to connect to.
    if url.host_str().map_or(true, str::is_empty) {
        return Err(OdooError::Config(format!("Odoo URL {raw:?} has no host")));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_share_host_and_differ_in_suffix() {
        let common = parse_endpoint("https://odoo.example.com", "common").unwrap();
        let object = parse_endpoint("https://odoo.example.com", "object").unwrap();
        assert_eq!(common.host_str(), object.host_str());
        assert_eq!(common.path(), "/xmlrpc/2/common");
        assert_eq!(object.path(), "/xmlrpc/2/object");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let common = parse_endpoint("https://odoo.example.com/tenant", "common").unwrap();
        assert_eq!(common.path(), "/tenant/xmlrpc/2/common");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            parse_endpoint("http://[", "common"),
            Err(OdooError::Config(_))
        ));
    }

    #[test]
    fn rejects_base_url_without_host() {
        assert!(matches!(
            parse_endpoint("http://", "common"),
            Err(OdooError::Config(_))
        ));
    }
}
