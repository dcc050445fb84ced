//! Purchasing and receiving models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Purchase order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PurchaseOrderStatus {
    #[default]
    Ordered,
    Partial,
    Received,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Ordered => "Ordered",
            PurchaseOrderStatus::Partial => "Partial",
            PurchaseOrderStatus::Received => "Received",
        }
    }

    /// Whether goods can still be received against the order
    pub fn accepts_receipts(&self) -> bool {
        !matches!(self, PurchaseOrderStatus::Received)
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ordered" => Ok(PurchaseOrderStatus::Ordered),
            "partial" => Ok(PurchaseOrderStatus::Partial),
            "received" => Ok(PurchaseOrderStatus::Received),
            other => Err(format!("unknown purchase order status: {}", other)),
        }
    }
}

/// A purchase order with its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub supplier: String,
    pub expected_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    /// Name of the user who raised the order
    pub created_by: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseOrderItem>,
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Ordered value across all lines
    pub fn total_cost(&self) -> Decimal {
        self.items
            .iter()
            .map(PurchaseOrderItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

/// A single ordered line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit_cost: Decimal,
    /// Inventory item that receipts of this line replenish
    #[serde(default)]
    pub inventory_item_id: Option<Uuid>,
    #[serde(default)]
    pub received_quantity: Decimal,
}

impl PurchaseOrderItem {
    pub fn line_total(&self) -> Decimal {
        self.quantity.saturating_mul(self.unit_cost)
    }

    pub fn outstanding(&self) -> Decimal {
        self.quantity.saturating_sub(self.received_quantity).max(Decimal::ZERO)
    }

    pub fn is_fully_received(&self) -> bool {
        self.received_quantity >= self.quantity
    }
}

/// Status implied by the received quantities of an order's lines.
///
/// An order with no lines, or with nothing received yet, stays `Ordered`.
pub fn status_after_receipt(items: &[PurchaseOrderItem]) -> PurchaseOrderStatus {
    if items.is_empty() {
        return PurchaseOrderStatus::Ordered;
    }
    if items.iter().all(PurchaseOrderItem::is_fully_received) {
        PurchaseOrderStatus::Received
    } else if items.iter().any(|item| item.received_quantity > Decimal::ZERO) {
        PurchaseOrderStatus::Partial
    } else {
        PurchaseOrderStatus::Ordered
    }
}

/// A receiving log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub purchase_order_item_id: Uuid,
    pub item_name: String,
    pub supplier: String,
    pub quantity: Decimal,
    pub received_by: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, received: i64) -> PurchaseOrderItem {
        PurchaseOrderItem {
            id: Uuid::new_v4(),
            name: "Tomatoes".to_string(),
            quantity: Decimal::from(quantity),
            unit_cost: Decimal::from(2),
            inventory_item_id: None,
            received_quantity: Decimal::from(received),
        }
    }

    #[test]
    fn status_progression() {
        assert_eq!(status_after_receipt(&[]), PurchaseOrderStatus::Ordered);
        assert_eq!(
            status_after_receipt(&[line(10, 0), line(5, 0)]),
            PurchaseOrderStatus::Ordered
        );
        assert_eq!(
            status_after_receipt(&[line(10, 4), line(5, 0)]),
            PurchaseOrderStatus::Partial
        );
        assert_eq!(
            status_after_receipt(&[line(10, 10), line(5, 6)]),
            PurchaseOrderStatus::Received
        );
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            PurchaseOrderStatus::Ordered,
            PurchaseOrderStatus::Partial,
            PurchaseOrderStatus::Received,
        ] {
            assert_eq!(status.as_str().parse::<PurchaseOrderStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<PurchaseOrderStatus>().is_err());
    }

    #[test]
    fn outstanding_never_negative() {
        assert_eq!(line(5, 8).outstanding(), Decimal::ZERO);
        assert_eq!(line(5, 2).outstanding(), Decimal::from(3));
        assert_eq!(line(3, 0).line_total(), Decimal::from(6));
    }

    #[test]
    fn huge_lines_saturate() {
        let mut item = line(1, 0);
        item.quantity = Decimal::MAX;
        item.unit_cost = Decimal::MAX;
        assert_eq!(item.line_total(), Decimal::MAX);
    }
}
