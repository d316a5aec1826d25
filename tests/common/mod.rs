//! Local HTTP server standing in for the remote sites being scraped.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

/// Nesting depth of the `/deep` page.
pub const DEEP_NESTING: usize = 5_000;

pub const PAGE: &str = r#"<html><head><title>Hi</title></head><body><h1>A</h1><p>one two three</p><a href="/x">L</a></body></html>"#;

pub struct TestServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route("/page", get(|| async { Html(PAGE) }))
            .route("/hop/:remaining", get(hop))
            .route("/slow", get(slow))
            .route("/big", get(big))
            .route("/chunked", get(chunked))
            .route("/json", get(|| async { Json(serde_json::json!({ "a": 1 })) }))
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, Html("<p>gone</p>")) }),
            )
            .route("/empty", get(|| async { Html("") }))
            .route("/latin1", get(latin1))
            .route("/drip", get(drip))
            .route("/deep", get(deep))
            .layer(middleware::from_fn_with_state(hits.clone(), count_hits));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// An address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

async fn count_hits(
    State(hits): State<Arc<AtomicUsize>>,
    request: Request,
    next: Next,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

/// `/hop/N` redirects N times before serving the page.
async fn hop(Path(remaining): Path<usize>) -> Response {
    if remaining == 0 {
        Html(PAGE).into_response()
    } else {
        Redirect::temporary(&format!("/hop/{}", remaining - 1)).into_response()
    }
}

async fn slow() -> Html<&'static str> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Html("<p>too late</p>")
}

async fn big() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], "a".repeat(64 * 1024))
}

/// Large body without a Content-Length header.
async fn chunked() -> impl IntoResponse {
    let chunks = (0..64).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![b'a'; 1024])));
    (
        [(header::CONTENT_TYPE, "text/html")],
        Body::from_stream(futures::stream::iter(chunks)),
    )
}

async fn latin1() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=iso-8859-1")],
        b"<title>Caf\xe9</title><p>cr\xe8me br\xfbl\xe9e</p>".to_vec(),
    )
}

/// Headers arrive at once, then a small chunk every 200ms for four seconds.
async fn drip() -> impl IntoResponse {
    let chunks = futures::stream::unfold(0, |sent| async move {
        if sent == 20 {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        Some((Ok::<_, std::io::Error>(Bytes::from_static(b"<p>drip</p>")), sent + 1))
    });
    (
        [(header::CONTENT_TYPE, "text/html")],
        Body::from_stream(chunks),
    )
}

/// Small on the wire but expensive to build a tree for.
async fn deep() -> Html<String> {
    Html(format!(
        "{}<p>bottom</p>",
        "<div>".repeat(DEEP_NESTING)
    ))
}
