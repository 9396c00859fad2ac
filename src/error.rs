//! Typed error model for the Odoo client stack.
//!
//! Transport-level and session-level failures are kept distinct so callers
//! can tell "the network was unreachable" apart from "the credentials were
//! rejected" without inspecting transport internals.

use thiserror::Error;

/// Failures inside the redirect-aware HTTP transport.
///
/// Nothing in here is retried locally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to reach {url}: {source}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("redirect limit of {limit} exceeded while requesting {url}")]
    TooManyRedirects { url: String, limit: usize },

    #[error("redirect response from {url} carried no location header")]
    MissingLocation { url: String },

    #[error("redirect response from {url} pointed at unparseable target {location:?}")]
    BadRedirectTarget { url: String, location: String },

    #[error("{url} answered HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Top-level error taxonomy for sessions and remote method calls.
#[derive(Debug, Error)]
pub enum OdooError {
    /// Network-layer failure during authentication. Retryable at a higher
    /// level, never retried here.
    #[error("failed to connect to Odoo server: {0}")]
    ConnectionFailed(#[source] TransportError),

    /// The server answered the authenticate call with a falsy uid. Per the
    /// protocol convention a uid of 0 is invalid, not merely "no value".
    #[error("authentication failed: invalid username or password")]
    InvalidCredentials,

    /// Any non-network failure during the authentication exchange.
    #[error("failed to authenticate with Odoo: {0}")]
    AuthenticationFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure while invoking a remote method, tagged with the
    /// triggering model and method for diagnosability.
    #[error("{model}.{method}: {source}")]
    Call {
        model: String,
        method: String,
        #[source]
        source: TransportError,
    },

    /// The server returned a structured application-level fault.
    #[error("{model}.{method}: odoo fault {code}: {message}")]
    RemoteFault {
        model: String,
        method: String,
        code: i32,
        message: String,
    },

    /// The response body was not a well-formed XML-RPC payload.
    #[error("{model}.{method}: {message}")]
    Protocol {
        model: String,
        method: String,
        message: String,
    },
}
