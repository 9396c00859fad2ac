mod helpers;

use std::time::Duration;

use odoo_mcp::error::TransportError;
use odoo_mcp::transport::{RedirectTransport, MAX_REDIRECTS};
use url::Url;

use helpers::{CannedResponse, MockServer};

fn transport() -> RedirectTransport {
    RedirectTransport::new(Duration::from_secs(5), true).expect("build transport")
}

#[tokio::test]
async fn follows_redirect_chain_to_success() {
    let server = MockServer::start(vec![
        CannedResponse::redirect(302, "/hop1"),
        CannedResponse::redirect(301, "/hop2"),
        CannedResponse::ok("final payload"),
    ])
    .await;

    let endpoint = Url::parse(&server.url("/start")).unwrap();
    let body = transport()
        .send(&endpoint, "<request/>")
        .await
        .expect("redirect chain should resolve");

    assert_eq!(body, "final payload");
    let hits = server.hits();
    let paths: Vec<&str> = hits.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["/start", "/hop1", "/hop2"]);
}

#[tokio::test]
async fn request_body_preserved_across_redirects() {
    let server = MockServer::start(vec![
        CannedResponse::redirect(307, "/moved"),
        CannedResponse::ok("ok"),
    ])
    .await;

    let endpoint = Url::parse(&server.url("/orig")).unwrap();
    transport()
        .send(&endpoint, "<methodCall>payload</methodCall>")
        .await
        .expect("redirect should resolve");

    let hits = server.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].1, "<methodCall>payload</methodCall>");
    assert_eq!(hits[1].1, "<methodCall>payload</methodCall>");
}

#[tokio::test]
async fn cross_host_redirect_is_followed() {
    let target = MockServer::start(vec![CannedResponse::ok("from target")]).await;
    let origin =
        MockServer::start(vec![CannedResponse::redirect(308, &target.url("/landed"))]).await;

    let endpoint = Url::parse(&origin.url("/start")).unwrap();
    let body = transport()
        .send(&endpoint, "<r/>")
        .await
        .expect("cross-host redirect should resolve");

    assert_eq!(body, "from target");
    assert_eq!(origin.hits().len(), 1);
    let target_hits = target.hits();
    assert_eq!(target_hits.len(), 1);
    assert_eq!(target_hits[0].0, "/landed");
    assert_eq!(target_hits[0].1, "<r/>");
}

#[tokio::test]
async fn redirect_loop_stops_after_bound() {
    let responses = (0..MAX_REDIRECTS + 2)
        .map(|_| CannedResponse::redirect(302, "/loop"))
        .collect();
    let server = MockServer::start(responses).await;

    let endpoint = Url::parse(&server.url("/loop")).unwrap();
    let err = transport()
        .send(&endpoint, "<r/>")
        .await
        .expect_err("loop should be cut off");

    assert!(matches!(err, TransportError::TooManyRedirects { .. }));
    // The bound counts wire attempts; no extra request follows the last hop.
    assert_eq!(server.hits().len(), MAX_REDIRECTS);
}

#[tokio::test]
async fn redirect_without_location_is_an_error() {
    let server = MockServer::start(vec![CannedResponse::status(302)]).await;

    let endpoint = Url::parse(&server.url("/nowhere")).unwrap();
    let err = transport()
        .send(&endpoint, "<r/>")
        .await
        .expect_err("missing Location must fail");

    assert!(matches!(err, TransportError::MissingLocation { .. }));
    assert_eq!(server.hits().len(), 1);
}

#[tokio::test]
async fn non_redirect_error_status_surfaces() {
    let server = MockServer::start(vec![CannedResponse::status(503)]).await;

    let endpoint = Url::parse(&server.url("/down")).unwrap();
    let err = transport()
        .send(&endpoint, "<r/>")
        .await
        .expect_err("503 must fail");

    match err {
        TransportError::UnexpectedStatus { status, .. } => assert_eq!(status, 503),
        other => panic!("unexpected error: {other:?}"),
    }
}
