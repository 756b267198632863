#![allow(dead_code)]

use axum::{
    extract::{OriginalUri, RawQuery},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use pomelox_env::{ApiClient, EnvironmentName, EnvironmentResolver, MemoryStore, Settings};
use serde_json::{json, Value};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;

/// Fake backend; `tag` is echoed by `/whoami` so tests can tell backends apart.
pub fn upstream(tag: &'static str) -> Router {
    Router::new()
        .route("/app/ok", get(|| async { Json(json!({"code": 200, "data": [1, 2, 3]})) }))
        .route("/app/missing", get(|| async { (StatusCode::NOT_FOUND, "no such thing") }))
        .route("/app/text", get(|| async { "definitely not json" }))
        .route("/app/empty", get(|| async { StatusCode::OK }))
        .route(
            "/app/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(json!({"late": true}))
            }),
        )
        .route(
            "/app/delayed",
            get(move || async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({"from": tag}))
            }),
        )
        .route(
            "/raw/*rest",
            get(|OriginalUri(uri): OriginalUri| async move {
                Json(json!({"path": uri.path(), "query": uri.query()}))
            }),
        )
        .route("/whoami", get(move || async move { Json(json!({"from": tag})) }))
        .route(
            "/app/query",
            get(|RawQuery(q): RawQuery| async move { Json(json!({"query": q})) }),
        )
        .route(
            "/app/echo",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let h = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                Json(json!({
                    "accept": h("accept"),
                    "content_type": h("content-type"),
                    "authorization": h("authorization"),
                    "x_custom": h("x-custom"),
                    "body": body,
                }))
            }),
        )
}

pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

/// Address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn settings(dev: SocketAddr, prod: SocketAddr) -> Settings {
    let mut s = Settings::default();
    s.api_url_overrides
        .insert(EnvironmentName::Development, format!("http://{dev}"));
    s.api_url_overrides
        .insert(EnvironmentName::Production, format!("http://{prod}"));
    s
}

pub fn client(settings: &Settings, persisted: Option<&str>) -> ApiClient {
    let store = match persisted {
        Some(name) => MemoryStore::with_value(name),
        None => MemoryStore::default(),
    };
    let resolver = EnvironmentResolver::load(store, settings).expect("resolver");
    ApiClient::new(resolver, settings).expect("client")
}
