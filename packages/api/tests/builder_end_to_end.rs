//! Fluent builder against a local axum server

use std::time::Duration;

use axum::Router;
use axum::extract::Path;
use axum::http::HeaderMap;
use axum::routing::get;
use hpipe::{Kind, Pipeline};
use http::{HeaderName, HeaderValue, StatusCode};
use tokio::net::TcpListener;

async fn start_app() -> u16 {
    let app = Router::new()
        .route(
            "/items/:id",
            get(|Path(id): Path<u32>| async move { format!("item-{id}") }),
        )
        .route(
            "/whoami",
            get(|headers: HeaderMap| async move {
                headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("anonymous")
                    .to_string()
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "late"
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

#[tokio::test]
async fn host_port_and_targets() {
    let port = start_app().await;

    let result = Pipeline::get()
        .host("127.0.0.1")
        .port(port)
        .targets((0..30).map(|i| format!("/items/{i}")))
        .max_depth(8)
        .send()
        .await
        .unwrap();

    assert!(result.all_matched());
    assert_eq!(result.stats().rounds, 4);
    assert_eq!(result.get(29).unwrap().response().unwrap().body, "item-29");
}

#[tokio::test]
async fn absolute_urls_set_the_endpoint() {
    let port = start_app().await;
    let urls: Vec<String> = (0..5)
        .map(|i| format!("http://127.0.0.1:{port}/items/{i}"))
        .collect();

    let result = Pipeline::head().urls(&urls).send().await.unwrap();

    assert_eq!(result.matched_count(), 5);
    for (_, response) in result.responses() {
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.is_empty());
    }
}

#[tokio::test]
async fn per_request_headers_override_shared_ones() {
    let port = start_app().await;

    let result = Pipeline::get()
        .host("127.0.0.1")
        .port(port)
        .header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static("shared"),
        )
        .request(
            "/whoami",
            [(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("signed-for-this-object"),
            )],
        )
        .target("/whoami")
        .send()
        .await
        .unwrap();

    let bodies: Vec<_> = result.responses().map(|(_, r)| r.body.clone()).collect();
    assert_eq!(bodies[0], "signed-for-this-object");
    assert_eq!(bodies[1], "shared");
}

#[tokio::test]
async fn deadline_cancels_slow_requests() {
    let port = start_app().await;

    let result = Pipeline::get()
        .host("127.0.0.1")
        .port(port)
        .target("/items/1")
        .target("/slow")
        .deadline(Duration::from_millis(300))
        .send()
        .await
        .unwrap();

    assert!(result.get(0).unwrap().is_matched());
    assert_eq!(result.get(1).unwrap().failure().unwrap().kind, Kind::Canceled);
}

#[tokio::test]
async fn misuse_is_reported_by_send() {
    let mixed = Pipeline::head()
        .urls(["http://a.example/x", "http://b.example/y"])
        .send()
        .await
        .unwrap_err();
    assert!(mixed.is_builder());

    let bad_header = Pipeline::head()
        .host("127.0.0.1")
        .header_str("bad header", "v")
        .target("/x")
        .send()
        .await
        .unwrap_err();
    assert!(bad_header.is_builder());

    let empty = Pipeline::get().host("127.0.0.1").send().await.unwrap_err();
    assert!(empty.is_builder());

    let zero_depth = Pipeline::get()
        .host("127.0.0.1")
        .target("/x")
        .max_depth(0)
        .send()
        .await
        .unwrap_err();
    assert!(zero_depth.is_config());
}

#[tokio::test]
async fn unreachable_host_fails_per_request_not_per_call() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = Pipeline::head()
        .host("127.0.0.1")
        .port(port)
        .targets(["/a", "/b"])
        .backoff(Duration::from_millis(1))
        .send()
        .await
        .unwrap();

    assert_eq!(result.failed_count(), 2);
    assert!(result.failures().all(|(_, f)| f.kind == Kind::Connect));
}
