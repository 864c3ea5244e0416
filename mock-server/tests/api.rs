use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_method_headers_and_body() {
    let resp = app()
        .oneshot(request("PUT", "/echo?x=1", "hello"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.query.as_deref(), Some("x=1"));
    assert_eq!(echo.headers["content-type"], "text/plain");
    assert_eq!(echo.body, "hello");
}

#[tokio::test]
async fn echo_accepts_empty_get() {
    let resp = app()
        .oneshot(Request::builder().uri("/echo").body(String::new()).unwrap())
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert!(echo.body.is_empty());
}

// --- status ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    for code in [201u16, 404, 503] {
        let resp = app()
            .oneshot(request("GET", &format!("/status/{code}"), ""))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), code);
    }
}

#[tokio::test]
async fn status_route_allows_codes_above_599() {
    let resp = app()
        .oneshot(request("POST", "/status/600", ""))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 600);
}

#[tokio::test]
async fn status_route_rejects_out_of_range_code() {
    let resp = app()
        .oneshot(request("GET", "/status/42", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- redirect ---

#[tokio::test]
async fn redirect_points_at_echo() {
    let resp = app()
        .oneshot(request("GET", "/redirect", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "/echo");
    assert!(body_bytes(resp).await.is_empty());
}

// --- slow ---

#[tokio::test]
async fn slow_route_eventually_succeeds() {
    let resp = app()
        .oneshot(request("GET", "/slow/10", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
