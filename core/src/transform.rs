//! Wire bodies for order write operations.
//!
//! Each type maps the typed arguments of one `OrderHandler` operation onto
//! the JSON shape the API expects. Omitted statuses fall back to the status
//! the operation implies.

use serde::{Deserialize, Serialize};

pub const STATUS_CANCELLED: &str = "order_canceled";
pub const STATUS_PAID: &str = "order_invoiced";
pub const STATUS_COMPLETE: &str = "complete";
pub const STATUS_SHIPPED: &str = "order_shipped";
pub const STATUS_SHIPMENT_EXCEPTION: &str = "shipment_exception";

fn status_or(status: Option<&str>, default: &str) -> String {
    status.unwrap_or(default).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_key: String,
    pub status: String,
}

impl Invoice {
    pub fn new(invoice_key: &str, status: Option<&str>) -> Self {
        Self {
            invoice_key: invoice_key.to_string(),
            status: status_or(status, STATUS_PAID),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancel {
    pub status: String,
}

impl Cancel {
    pub fn new(status: Option<&str>) -> Self {
        Self {
            status: status_or(status, STATUS_CANCELLED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_date: Option<String>,
}

impl Delivery {
    pub fn new(date: Option<&str>, status: Option<&str>) -> Self {
        Self {
            status: status_or(status, STATUS_COMPLETE),
            delivered_date: date.map(str::to_string),
        }
    }
}

/// One shipped line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub sku: String,
    pub qty: u32,
}

impl ShipmentItem {
    pub fn new(sku: impl Into<String>, qty: u32) -> Self {
        Self {
            sku: sku.into(),
            qty,
        }
    }
}

/// Carrier tracking information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub code: String,
    pub carrier: String,
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub code: String,
    pub items: Vec<ShipmentItem>,
    pub track: Track,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub status: String,
    pub shipment: ShipmentDetails,
}

impl Shipment {
    pub fn new(order_id: &str, items: &[ShipmentItem], track: Track, status: Option<&str>) -> Self {
        Self {
            status: status_or(status, STATUS_SHIPPED),
            shipment: ShipmentDetails {
                code: order_id.to_string(),
                items: items.to_vec(),
                track,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDetails {
    pub occurrence_date: String,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentException {
    pub status: String,
    pub shipment_exception: ExceptionDetails,
}

impl ShipmentException {
    pub fn new(datetime: &str, observation: &str, status: Option<&str>) -> Self {
        Self {
            status: status_or(status, STATUS_SHIPMENT_EXCEPTION),
            shipment_exception: ExceptionDetails {
                occurrence_date: datetime.to_string(),
                observation: observation.to_string(),
            },
        }
    }
}
