use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Order};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed(method: &str, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Email", "seller@example.com")
        .header("X-Api-Key", "key-123")
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    authed(method, uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    authed(method, uri).body(String::new()).unwrap()
}

fn seeded() -> axum::Router {
    app_with(vec![
        Order::new("ORDER1", "shop1", "order_paid"),
        Order::new("ORDER2", "shop2", "order_paid"),
        Order::new("ORDER3", "shop1", "order_shipped"),
    ])
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/orders").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn partial_credentials_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/orders")
                .header("X-User-Email", "seller@example.com")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn serves_over_tcp() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_app(listener, app()));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /orders HTTP/1.1\r\nHost: localhost\r\nX-User-Email: a@b.c\r\nX-Api-Key: k\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200"), "unexpected response: {raw}");
    assert!(raw.contains(r#""total":0"#));
}

// --- list ---

#[tokio::test]
async fn list_orders_empty() {
    let resp = app().oneshot(empty_request("GET", "/orders")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 0);
    assert!(body["orders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_orders_applies_filters() {
    let resp = seeded()
        .oneshot(empty_request(
            "GET",
            "/orders?page=1&per_page=10&filters%5Bsale_system%5D=shop1&filters%5Bstatuses%5D%5B%5D=order_paid",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["orders"][0]["code"], "ORDER1");
}

#[tokio::test]
async fn list_orders_paginates() {
    let resp = seeded()
        .oneshot(empty_request("GET", "/orders?page=2&per_page=2"))
        .await
        .unwrap();

    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 3);
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["code"], "ORDER3");
}

// --- get ---

#[tokio::test]
async fn get_order_not_found() {
    let resp = app()
        .oneshot(empty_request("GET", "/orders/UNKNOWN"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

// --- writes ---

#[tokio::test]
async fn invoice_missing_key_is_rejected() {
    let resp = seeded()
        .oneshot(json_request(
            "POST",
            "/orders/ORDER1/invoice",
            r#"{"status":"order_invoiced"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cancel_unknown_order_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/orders/UNKNOWN/cancel",
            r#"{"status":"order_canceled"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- queue ---

#[tokio::test]
async fn empty_queue_returns_204() {
    let resp = app()
        .oneshot(empty_request("GET", "/queues/orders"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

// --- full order lifecycle ---

#[tokio::test]
async fn order_lifecycle() {
    use tower::Service;

    let mut app = seeded().into_service();

    // queue head is the first seeded order
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/queues/orders"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let queued: Order = body_json(resp).await;
    assert_eq!(queued.code, "ORDER1");

    // invoice
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/orders/ORDER1/invoice",
            r#"{"invoice_key":"KEY1","status":"order_invoiced"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // ship
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/orders/ORDER1/shipments",
            r#"{"status":"order_shipped","shipment":{"code":"ORDER1","items":[],"track":{"code":"BR1","carrier":"Correios","method":"SEDEX","url":""}}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // labels reference the tracking code
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/orders/ORDER1/shipment_labels"))
        .await
        .unwrap();
    let labels: Value = body_json(resp).await;
    assert_eq!(labels["labels"][0]["track_code"], "BR1");

    // deliver
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/orders/ORDER1/delivery",
            r#"{"status":"complete","delivered_date":"2018-01-10"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/orders/ORDER1"))
        .await
        .unwrap();
    let order: Order = body_json(resp).await;
    assert_eq!(order.status, "complete");
    assert_eq!(order.invoices, vec!["KEY1".to_string()]);
    assert_eq!(order.delivered_date.as_deref(), Some("2018-01-10"));

    // dequeue, then the next order is at the head
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/queues/orders/ORDER1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/queues/orders"))
        .await
        .unwrap();
    let queued: Order = body_json(resp).await;
    assert_eq!(queued.code, "ORDER2");

    // dequeue again, now 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/queues/orders/ORDER1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
