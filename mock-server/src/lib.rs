use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub code: String,
    pub channel: String,
    pub status: String,
    #[serde(default)]
    pub invoices: Vec<String>,
    #[serde(default)]
    pub shipments: Vec<Value>,
    #[serde(default)]
    pub delivered_date: Option<String>,
    #[serde(default)]
    pub shipment_exceptions: Vec<Value>,
}

impl Order {
    pub fn new(code: &str, channel: &str, status: &str) -> Self {
        Self {
            code: code.to_string(),
            channel: channel.to_string(),
            status: status.to_string(),
            invoices: Vec::new(),
            shipments: Vec::new(),
            delivered_date: None,
            shipment_exceptions: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
pub struct InvoiceBody {
    pub invoice_key: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
    pub delivered_date: Option<String>,
}

#[derive(Deserialize)]
pub struct ShipmentBody {
    pub status: String,
    pub shipment: Value,
}

#[derive(Deserialize)]
pub struct ShipmentExceptionBody {
    pub status: String,
    pub shipment_exception: Value,
}

#[derive(Default)]
pub struct Store {
    orders: HashMap<String, Order>,
    queue: VecDeque<String>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not_found"})))
}

/// Router with an empty store.
pub fn app() -> Router {
    app_with(Vec::new())
}

/// Router seeded with `orders`; every seeded order is also queued.
pub fn app_with(orders: Vec<Order>) -> Router {
    let mut store = Store::default();
    for order in orders {
        store.queue.push_back(order.code.clone());
        store.orders.insert(order.code.clone(), order);
    }
    let db: Db = Arc::new(RwLock::new(store));

    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{code}", get(get_order))
        .route("/orders/{code}/invoice", post(invoice_order))
        .route("/orders/{code}/cancel", post(cancel_order))
        .route("/orders/{code}/delivery", post(deliver_order))
        .route("/orders/{code}/shipments", post(ship_order))
        .route("/orders/{code}/shipment_labels", get(shipment_labels))
        .route("/orders/{code}/shipment_exception", post(shipment_exception))
        .route("/queues/orders", get(next_queued_order))
        .route("/queues/orders/{code}", delete(dequeue_order))
        .layer(middleware::from_fn(require_credentials))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_app(listener, app()).await
}

pub async fn run_app(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn require_credentials(request: Request, next: Next) -> Response {
    let authorized = ["x-user-email", "x-api-key"].iter().all(|name| {
        request
            .headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.is_empty())
    });

    if authorized {
        return next.run(request).await;
    }
    tracing::warn!(uri = %request.uri(), "Rejected request without credentials");
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response()
}

async fn list_orders(
    State(db): State<Db>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Value> {
    let mut page = 1usize;
    let mut per_page = 30usize;
    let mut sale_system = None;
    let mut statuses = Vec::new();
    for (key, value) in params {
        match key.as_str() {
            "page" => page = value.parse().unwrap_or(1).max(1),
            "per_page" => per_page = value.parse().unwrap_or(30).max(1),
            "filters[sale_system]" => sale_system = Some(value),
            "filters[statuses][]" => statuses.push(value),
            _ => {}
        }
    }

    let store = db.read().await;
    let mut matching: Vec<&Order> = store
        .orders
        .values()
        .filter(|o| sale_system.as_deref().is_none_or(|s| o.channel == s))
        .filter(|o| statuses.is_empty() || statuses.contains(&o.status))
        .collect();
    matching.sort_by(|a, b| a.code.cmp(&b.code));

    let total = matching.len();
    let orders: Vec<&Order> = matching
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    Json(json!({"total": total, "orders": orders}))
}

async fn get_order(State(db): State<Db>, Path(code): Path<String>) -> ApiResult<Json<Order>> {
    let store = db.read().await;
    store.orders.get(&code).cloned().map(Json).ok_or_else(not_found)
}

async fn invoice_order(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<InvoiceBody>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let order = store.orders.get_mut(&code).ok_or_else(not_found)?;
    order.invoices.push(input.invoice_key);
    order.status = input.status;
    Ok(StatusCode::NO_CONTENT)
}

async fn cancel_order(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<StatusBody>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let order = store.orders.get_mut(&code).ok_or_else(not_found)?;
    order.status = input.status;
    Ok(StatusCode::NO_CONTENT)
}

async fn deliver_order(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<StatusBody>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let order = store.orders.get_mut(&code).ok_or_else(not_found)?;
    order.status = input.status;
    order.delivered_date = input.delivered_date;
    Ok(StatusCode::NO_CONTENT)
}

async fn ship_order(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<ShipmentBody>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let order = store.orders.get_mut(&code).ok_or_else(not_found)?;
    order.shipments.push(input.shipment);
    order.status = input.status;
    Ok(StatusCode::CREATED)
}

async fn shipment_labels(State(db): State<Db>, Path(code): Path<String>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let order = store.orders.get(&code).ok_or_else(not_found)?;
    let labels: Vec<Value> = order
        .shipments
        .iter()
        .map(|s| json!({"order": order.code, "track_code": s["track"]["code"]}))
        .collect();
    Ok(Json(json!({"labels": labels})))
}

async fn shipment_exception(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<ShipmentExceptionBody>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let order = store.orders.get_mut(&code).ok_or_else(not_found)?;
    order.shipment_exceptions.push(input.shipment_exception);
    order.status = input.status;
    Ok(StatusCode::NO_CONTENT)
}

async fn next_queued_order(State(db): State<Db>) -> Response {
    let store = db.read().await;
    match store.queue.front().and_then(|code| store.orders.get(code)) {
        Some(order) => Json(order.clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn dequeue_order(State(db): State<Db>, Path(code): Path<String>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let idx = store
        .queue
        .iter()
        .position(|c| *c == code)
        .ok_or_else(not_found)?;
    store.queue.remove(idx);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_serializes_to_json() {
        let order = Order::new("ORDER1", "shop1", "order_paid");
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["code"], "ORDER1");
        assert_eq!(json["channel"], "shop1");
        assert_eq!(json["status"], "order_paid");
        assert_eq!(json["invoices"], json!([]));
    }

    #[test]
    fn order_defaults_optional_collections() {
        let order: Order =
            serde_json::from_str(r#"{"code":"A","channel":"c","status":"order_paid"}"#).unwrap();
        assert!(order.invoices.is_empty());
        assert!(order.delivered_date.is_none());
    }

    #[test]
    fn invoice_body_requires_key() {
        let result: Result<InvoiceBody, _> = serde_json::from_str(r#"{"status":"order_invoiced"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn status_body_date_is_optional() {
        let input: StatusBody = serde_json::from_str(r#"{"status":"complete"}"#).unwrap();
        assert_eq!(input.status, "complete");
        assert!(input.delivered_date.is_none());
    }
}
