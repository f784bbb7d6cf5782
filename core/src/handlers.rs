//! Resource handlers for orders and the order queue.
//!
//! Handlers only build a path and a body and hand them to `Service`.
//! Logging, redaction and error classification all happen in the pipeline.

use serde::Serialize;

use crate::http::HttpMethod;
use crate::options::RequestOptions;
use crate::response::ResponseHandler;
use crate::service::Service;
use crate::transform::{Cancel, Delivery, Invoice, Shipment, ShipmentException, ShipmentItem, Track};

/// Filters and pagination for `OrderHandler::orders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery<'q> {
    pub page: u32,
    pub per_page: u32,
    pub sale_system: Option<&'q str>,
    pub statuses: &'q [&'q str],
}

impl Default for OrderQuery<'_> {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 30,
            sale_system: None,
            statuses: &[],
        }
    }
}

impl OrderQuery<'_> {
    /// Query string without the leading `?`. Bracketed keys stay literal;
    /// values are form-urlencoded.
    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        if let Some(sale_system) = self.sale_system {
            pairs.push(("filters[sale_system]".to_string(), encode(sale_system)));
        }
        for status in self.statuses {
            pairs.push(("filters[statuses][]".to_string(), encode(status)));
        }

        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Serialize `body` and send it through the pipeline.
fn send_json<T: Serialize>(
    service: &mut Service,
    method: HttpMethod,
    path: &str,
    body: &T,
) -> ResponseHandler {
    match serde_json::to_value(body) {
        Ok(body) => service.request(method, path, Some(body), RequestOptions::new(), false),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Failed to build request body");
            ResponseHandler::from_error(e.into())
        }
    }
}

pub struct OrderHandler<'a> {
    service: &'a mut Service,
}

impl<'a> OrderHandler<'a> {
    pub const BASE_PATH: &'static str = "/orders";

    pub fn new(service: &'a mut Service) -> Self {
        Self { service }
    }

    fn path(suffix: &str) -> String {
        format!("{}/{suffix}", Self::BASE_PATH)
    }

    /// Page through orders, optionally filtered by sale system and statuses.
    pub fn orders(&mut self, query: &OrderQuery<'_>) -> ResponseHandler {
        let path = format!("{}?{}", Self::BASE_PATH, query.to_query_string());
        self.service.get(&path)
    }

    pub fn order(&mut self, order_id: &str) -> ResponseHandler {
        self.service.get(&Self::path(order_id))
    }

    pub fn invoice(
        &mut self,
        order_id: &str,
        invoice_key: &str,
        status: Option<&str>,
    ) -> ResponseHandler {
        let body = Invoice::new(invoice_key, status);
        send_json(
            self.service,
            HttpMethod::Post,
            &Self::path(&format!("{order_id}/invoice")),
            &body,
        )
    }

    pub fn cancel(&mut self, order_id: &str, status: Option<&str>) -> ResponseHandler {
        let body = Cancel::new(status);
        send_json(
            self.service,
            HttpMethod::Post,
            &Self::path(&format!("{order_id}/cancel")),
            &body,
        )
    }

    /// Mark an order delivered. `date` is passed through as given.
    pub fn delivery(
        &mut self,
        order_id: &str,
        date: Option<&str>,
        status: Option<&str>,
    ) -> ResponseHandler {
        let body = Delivery::new(date, status);
        send_json(
            self.service,
            HttpMethod::Post,
            &Self::path(&format!("{order_id}/delivery")),
            &body,
        )
    }

    pub fn shipment(
        &mut self,
        order_id: &str,
        items: &[ShipmentItem],
        track: Track,
        status: Option<&str>,
    ) -> ResponseHandler {
        let body = Shipment::new(order_id, items, track, status);
        send_json(
            self.service,
            HttpMethod::Post,
            &Self::path(&format!("{order_id}/shipments")),
            &body,
        )
    }

    pub fn shipment_labels(&mut self, order_id: &str) -> ResponseHandler {
        self.service
            .get(&Self::path(&format!("{order_id}/shipment_labels")))
    }

    pub fn shipment_exception(
        &mut self,
        order_id: &str,
        datetime: &str,
        observation: &str,
        status: Option<&str>,
    ) -> ResponseHandler {
        let body = ShipmentException::new(datetime, observation, status);
        send_json(
            self.service,
            HttpMethod::Post,
            &Self::path(&format!("{order_id}/shipment_exception")),
            &body,
        )
    }
}

/// The integration queue of new and updated orders.
pub struct QueueHandler<'a> {
    service: &'a mut Service,
}

impl<'a> QueueHandler<'a> {
    pub const BASE_PATH: &'static str = "/queues";

    pub fn new(service: &'a mut Service) -> Self {
        Self { service }
    }

    /// Next order waiting in the queue.
    pub fn orders(&mut self) -> ResponseHandler {
        self.service.get(&format!("{}/orders", Self::BASE_PATH))
    }

    /// Acknowledge an order so it leaves the queue.
    pub fn delete(&mut self, order_id: &str) -> ResponseHandler {
        self.service
            .delete(&format!("{}/orders/{order_id}", Self::BASE_PATH))
    }
}
