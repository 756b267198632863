mod common;

use common::{client, dead_addr, serve, settings, upstream};
use pomelox_env::{ApiError, RequestOptions};
use serde_json::json;
use std::time::{Duration, Instant};

#[tokio::test]
async fn returns_parsed_json_on_success() {
    let addr = serve(upstream("prod")).await;
    let c = client(&settings(addr, addr), None);

    let v = c.get("/app/ok").await.unwrap();
    assert_eq!(v, json!({"code": 200, "data": [1, 2, 3]}));

    let v = c.get("app/query?pageNum=1&pageSize=10").await.unwrap();
    assert_eq!(v["query"], "pageNum=1&pageSize=10");
}

#[tokio::test]
async fn empty_success_body_is_parse_error() {
    let addr = serve(upstream("prod")).await;
    let c = client(&settings(addr, addr), None);
    let err = c.get("/app/empty").await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn not_found_is_http_error() {
    let addr = serve(upstream("prod")).await;
    let c = client(&settings(addr, addr), None);

    let err = c.get("/app/missing").await.unwrap_err();
    match err {
        ApiError::Http { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "no such thing");
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_is_parse_error() {
    let addr = serve(upstream("prod")).await;
    let c = client(&settings(addr, addr), None);
    let err = c.get("/app/text").await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn unresponsive_endpoint_times_out() {
    let addr = serve(upstream("prod")).await;
    let c = client(&settings(addr, addr), None);

    let started = Instant::now();
    let err = c
        .api_call("/app/slow", RequestOptions::get().timeout_ms(50))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ApiError::Timeout { after_ms: 50 }), "got {err:?}");
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
}

#[tokio::test]
async fn default_timeout_comes_from_settings() {
    let addr = serve(upstream("prod")).await;
    let mut s = settings(addr, addr);
    s.http_timeout_ms = 80;
    let err = client(&s, None).get("/app/slow").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { after_ms: 80 }), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let dead = dead_addr().await;
    let c = client(&settings(dead, dead), None);
    let err = c.get("/app/ok").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn post_sends_json_with_default_headers() {
    let addr = serve(upstream("prod")).await;
    let mut s = settings(addr, addr);
    s.bearer_token = Some("secret".into());
    let c = client(&s, None);

    let opts = RequestOptions::post(json!({"activityId": 7})).header("X-Custom", "yes");
    let v = c.api_call("/app/echo", opts).await.unwrap();

    assert_eq!(v["accept"], "application/json");
    assert_eq!(v["content_type"], "application/json");
    assert_eq!(v["authorization"], "Bearer secret");
    assert_eq!(v["x_custom"], "yes");
    assert_eq!(v["body"], json!({"activityId": 7}));
}

#[tokio::test]
async fn requests_follow_environment_switches() {
    let dev = serve(upstream("dev")).await;
    let prod = serve(upstream("prod")).await;
    let c = client(&settings(dev, prod), Some("development"));

    assert_eq!(c.get("/whoami").await.unwrap()["from"], "dev");
    c.resolver.set_environment("production").unwrap();
    assert_eq!(c.get("/whoami").await.unwrap()["from"], "prod");
}

#[tokio::test]
async fn in_flight_request_keeps_its_base_url() {
    let dev = serve(upstream("dev")).await;
    let prod = serve(upstream("prod")).await;
    let c = client(&settings(dev, prod), Some("development"));

    let pending = tokio::spawn({
        let c = c.clone();
        async move { c.get("/app/delayed").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    c.resolver.set_environment("production").unwrap();

    let v = pending.await.unwrap().unwrap();
    assert_eq!(v["from"], "dev");
    assert_eq!(c.get("/whoami").await.unwrap()["from"], "prod");
}

#[tokio::test]
async fn typed_get_deserializes() {
    #[derive(serde::Deserialize)]
    struct Page {
        code: u16,
        data: Vec<u32>,
    }

    let addr = serve(upstream("prod")).await;
    let page: Page = client(&settings(addr, addr), None).get_as("/app/ok").await.unwrap();
    assert_eq!(page.code, 200);
    assert_eq!(page.data, vec![1, 2, 3]);
}
