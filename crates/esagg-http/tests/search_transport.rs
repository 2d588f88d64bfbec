//! Transport tests against a loopback HTTP responder.

use std::time::Duration;

use esagg_core::{BackendError, SearchBackend, SearchRequest};
use esagg_http::{EsClient, EsConfig};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Serve one canned response; the received request text is sent back on the channel.
async fn serve_once(status: &'static str, body: String) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = header_end(&buf) {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                if buf.len() >= end + content_length(&head) {
                    break;
                }
            }
        }

        let reply = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });

    (format!("http://{addr}"), rx)
}

fn request() -> SearchRequest {
    SearchRequest::new(
        "logstash-*",
        json!({ "bool": { "must": [{ "query_string": { "query": "*" } }] } }),
        json!({ "aggr": { "date_range": { "field": "@timestamp", "ranges": [] } } }),
    )
}

#[tokio::test]
async fn search_posts_body_and_decodes_response() {
    let body = json!({
        "took": 2,
        "hits": { "total": { "value": 7, "relation": "eq" }, "hits": [] },
        "aggregations": { "aggr": { "buckets": [{ "doc_count": 7, "max_dur": { "value": 20.0 } }] } }
    })
    .to_string();
    let (url, received) = serve_once("200 OK", body).await;

    let client = EsClient::new(EsConfig::new(&url)).unwrap();
    let response = client.search(&request()).await.unwrap();
    assert_eq!(response.total_hits, 7);
    assert_eq!(
        response.aggregations.unwrap()["aggr"]["buckets"][0]["max_dur"]["value"],
        20.0
    );

    let raw = received.await.unwrap();
    assert!(raw.starts_with("POST /logstash-*/_search?ignore_unavailable=true HTTP/1.1"));
    assert!(raw.contains("\"query_string\""));
    assert!(raw.contains("\"size\":0"));
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let (url, _received) = serve_once(
        "404 Not Found",
        json!({ "error": { "type": "index_not_found_exception" }, "status": 404 }).to_string(),
    )
    .await;

    let client = EsClient::new(EsConfig::new(&url)).unwrap();
    let err = client.search(&request()).await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("index_not_found_exception"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let (url, _received) = serve_once("200 OK", "{\"not\": \"a search\"}".to_string()).await;

    let client = EsClient::new(EsConfig::new(&url)).unwrap();
    let err = client.search(&request()).await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn refused_connection_is_connect_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = EsClient::new(EsConfig::new(&format!("http://{addr}"))).unwrap();
    let err = client.search(&request()).await.unwrap_err();
    assert!(matches!(err, BackendError::Connect(_)));
}

#[tokio::test]
async fn stalled_server_hits_deadline() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let config = EsConfig::new(&format!("http://{addr}")).with_timeout(Duration::from_millis(200));
    let client = EsClient::new(config).unwrap();
    let err = client.search(&request()).await.unwrap_err();
    assert_eq!(err, BackendError::Timeout(Duration::from_millis(200)));
}
