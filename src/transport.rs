//! Redirect-aware HTTP transport for the XML-RPC endpoints.
//!
//! Hosted and reverse-proxied Odoo installs routinely answer the first
//! request with a redirect, sometimes onto a different host or scheme, so
//! automatic redirect handling is disabled and the hop loop is driven here:
//! the original request body is re-posted verbatim against each target until
//! a non-redirect answer arrives or the hop bound is hit.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// Hard ceiling on redirect hops. A deliberate bound against redirect
/// loops, not a tunable.
pub const MAX_REDIRECTS: usize = 5;

/// Stateless XML-RPC POST transport. Holds nothing across calls beyond the
/// configured `reqwest::Client`.
pub struct RedirectTransport {
    http: reqwest::Client,
}

impl RedirectTransport {
    /// Build a transport with one timeout applied uniformly to connect,
    /// send and receive. `verify_tls = false` still encrypts but skips
    /// certificate and hostname checks; callers must opt in explicitly.
    pub fn new(timeout: Duration, verify_tls: bool) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(timeout)
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { http })
    }

    /// POST `body` to `endpoint`, following up to [`MAX_REDIRECTS`] redirect
    /// hops, and return the raw response body.
    pub async fn send(&self, endpoint: &Url, body: &str) -> Result<String, TransportError> {
        let mut target = endpoint.clone();

        for hop in 0..MAX_REDIRECTS {
            debug!(url = %target, hop, "posting XML-RPC request");
            let response = self
                .http
                .post(target.clone())
                .header(CONTENT_TYPE, "text/xml")
                .body(body.to_string())
                .send()
                .await
                .map_err(|source| TransportError::ConnectionFailed {
                    url: target.to_string(),
                    source,
                })?;

            let status = response.status();
            if is_redirect(status) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
                    .ok_or_else(|| TransportError::MissingLocation {
                        url: target.to_string(),
                    })?;

                // Resolve against the current URL so relative targets and
                // cross-host absolute ones both work.
                let next =
                    target
                        .join(&location)
                        .map_err(|_| TransportError::BadRedirectTarget {
                            url: target.to_string(),
                            location: location.clone(),
                        })?;

                debug!(from = %target, to = %next, status = status.as_u16(), "following redirect");
                target = next;
                continue;
            }

            if !status.is_success() {
                return Err(TransportError::UnexpectedStatus {
                    url: target.to_string(),
                    status: status.as_u16(),
                });
            }

            return response
                .text()
                .await
                .map_err(|source| TransportError::ConnectionFailed {
                    url: target.to_string(),
                    source,
                });
        }

        Err(TransportError::TooManyRedirects {
            url: endpoint.to_string(),
            limit: MAX_REDIRECTS,
        })
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_statuses_are_the_five_retryable_ones() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_redirect(StatusCode::from_u16(code).unwrap()));
        }
        for code in [200, 204, 300, 304, 400, 500] {
            assert!(!is_redirect(StatusCode::from_u16(code).unwrap()));
        }
    }
}
