//! Typed entity records for the transaction snapshot
//!
//! All records arrive pre-validated for type shape by the external loader;
//! referential integrity across records is checked when the fact model is
//! built. The engine never mutates a record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A customer as seen on an order. `id` is the order-time identifier;
/// `unique_id` identifies the person across orders and is the key for every
/// customer-level analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub unique_id: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: String,
    pub city: String,
    pub state: String,
}

/// A catalog product. The category reference is by native category name and
/// may be absent; products without a resolvable category are excluded from
/// category-keyed aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub category: Option<String>,
    pub weight_g: Option<f64>,
    pub length_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub width_cm: Option<f64>,
}

/// A product category: native name (join key) plus a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "shipped")]
    Shipped,
    #[serde(rename = "canceled")]
    Canceled,
    #[serde(rename = "unavailable")]
    Unavailable,
    #[serde(rename = "invoiced")]
    Invoiced,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "approved")]
    Approved,
}

impl OrderStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

/// An order header. Delivery-date analytics require status = delivered AND a
/// non-null delivered timestamp; a delivered order without one is excluded
/// from those analytics, not repaired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchased_at: NaiveDateTime,
    pub approved_at: Option<NaiveDateTime>,
    pub shipped_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
    pub estimated_delivery_at: NaiveDateTime,
}

/// One line of an order, composite-keyed by (order, line number).
/// Line contribution to revenue is price + freight unless stated otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: String,
    pub line_no: u32,
    pub product_id: String,
    pub seller_id: String,
    pub price: f64,
    pub freight: f64,
}

impl OrderLine {
    /// Full line contribution: unit price plus freight.
    pub fn contribution(&self) -> f64 {
        self.price + self.freight
    }
}

/// A payment against an order. Orders may carry several payments and the sum
/// need not equal the order-line total (deposits, vouchers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub order_id: String,
    pub sequence: u32,
    pub method: String,
    pub installments: u32,
    pub amount: f64,
}

/// A review of an order, score in [1, 5]. Orders without reviews are absent
/// from rating aggregates, never counted as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub order_id: String,
    pub score: u8,
    pub created_at: NaiveDateTime,
    pub answered_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_tags() {
        let status: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
        assert!(status.is_delivered());

        let status: OrderStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert!(!status.is_delivered());

        assert!(serde_json::from_str::<OrderStatus>("\"returned\"").is_err());
    }

    #[test]
    fn test_line_contribution_includes_freight() {
        let line = OrderLine {
            order_id: "o1".to_string(),
            line_no: 1,
            product_id: "p1".to_string(),
            seller_id: "s1".to_string(),
            price: 100.0,
            freight: 10.0,
        };
        assert_eq!(line.contribution(), 110.0);
    }
}
