//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use soap_endpoint::SoapRouterExt;

use crate::support::{self, envelope, ADD_ACTION, NOTIFY_ACTION, PEER_ACTION};

fn calculator_app() -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .soap_endpoint(support::calculator_endpoint())
}

/// Bind to port 0 and return the actual address.
async fn start_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn add_over_http() {
    let base = start_server(calculator_app()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/calculator"))
        .header("Content-Type", "text/xml; charset=utf-8")
        .header("SOAPAction", ADD_ACTION)
        .body(envelope("<Add><x>2</x><y>3</y></Add>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/xml; charset=utf-8"
    );
    assert_eq!(resp.headers().get("soapaction").unwrap(), "");

    let body = resp.text().await.unwrap();
    assert!(body.contains("<AddResult>5</AddResult>"));
}

#[tokio::test]
async fn other_routes_pass_through() {
    let base = start_server(calculator_app()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn unknown_actions_return_500() {
    let base = start_server(calculator_app()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/calculator"))
        .header("Content-Type", "text/xml")
        .header("SOAPAction", "http://tempuri.org/ICalculator/Nothing")
        .body(envelope("<Nothing/>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert!(resp.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_content_types_return_400() {
    let base = start_server(calculator_app()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/calculator"))
        .header("Content-Type", "application/json")
        .header("SOAPAction", ADD_ACTION)
        .body(envelope("<Add><x>2</x><y>3</y></Add>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn one_way_operations_acknowledge_with_an_empty_response() {
    let base = start_server(calculator_app()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/calculator"))
        .header("Content-Type", "text/xml")
        .header("SOAPAction", NOTIFY_ACTION)
        .body(envelope("<Notify><message>deployed</message></Notify>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("content-type").is_none());
    assert!(resp.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn the_peer_address_reaches_the_service() {
    let base = start_server(calculator_app()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/calculator"))
        .header("Content-Type", "text/xml")
        .header("SOAPAction", PEER_ACTION)
        .body(envelope("<Peer/>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = resp.text().await.unwrap();
    assert!(body.contains("<PeerResult>127.0.0.1:"));
}
