//! Purchase orders and receiving
//!
//! Receiving runs in one transaction: line quantities, inventory stock, the
//! receiving log and the order status move together or not at all.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{status_after_receipt, PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, Receipt};

/// Purchasing service
#[derive(Clone)]
pub struct PurchasingService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    supplier: String,
    expected_date: Option<NaiveDate>,
    status: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    purchase_order_id: Uuid,
    name: String,
    quantity: Decimal,
    unit_cost: Decimal,
    inventory_item_id: Option<Uuid>,
    received_quantity: Decimal,
}

impl From<ItemRow> for PurchaseOrderItem {
    fn from(row: ItemRow) -> Self {
        PurchaseOrderItem {
            id: row.id,
            name: row.name,
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            inventory_item_id: row.inventory_item_id,
            received_quantity: row.received_quantity,
        }
    }
}

fn parse_status(order_id: Uuid, raw: &str) -> PurchaseOrderStatus {
    raw.parse().unwrap_or_else(|e| {
        tracing::warn!(%order_id, "{}, treating as ordered", e);
        PurchaseOrderStatus::Ordered
    })
}

/// One line of a new order
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub name: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit_cost: Decimal,
    pub inventory_item_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrderInput {
    #[validate(length(min = 1, message = "Supplier is required"))]
    pub supplier: String,
    pub expected_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "An order needs at least one line"))]
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePurchaseOrderInput {
    #[validate(length(min = 1, message = "Supplier is required"))]
    pub supplier: Option<String>,
    pub expected_date: Option<NaiveDate>,
}

/// Quantity received against one order line
#[derive(Debug, Deserialize)]
pub struct ReceiveLineInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// Receive request; an empty line list receives everything outstanding
#[derive(Debug, Default, Deserialize)]
pub struct ReceiveInput {
    #[serde(default)]
    pub items: Vec<ReceiveLineInput>,
}

/// Result of a receive call
#[derive(Debug, Serialize)]
pub struct ReceiveResult {
    pub order: PurchaseOrder,
    pub receipts: Vec<Receipt>,
}

/// Work out how much of each line to receive. Quantities must be positive
/// and may not exceed what is still outstanding.
pub fn plan_receipt(
    items: &[PurchaseOrderItem],
    request: &[ReceiveLineInput],
) -> AppResult<Vec<(Uuid, Decimal)>> {
    if request.is_empty() {
        return Ok(items
            .iter()
            .filter(|item| item.outstanding() > Decimal::ZERO)
            .map(|item| (item.id, item.outstanding()))
            .collect());
    }

    let mut planned: HashMap<Uuid, Decimal> = HashMap::new();
    for line in request {
        shared::validate_positive(line.quantity).map_err(|m| AppError::validation("quantity", m))?;
        let item = items
            .iter()
            .find(|item| item.id == line.item_id)
            .ok_or_else(|| AppError::NotFound("Purchase order line".to_string()))?;

        let total = planned.entry(item.id).or_default();
        *total = total.saturating_add(line.quantity);
        if *total > item.outstanding() {
            return Err(AppError::validation(
                "quantity",
                format!(
                    "Cannot receive {} of {}: only {} outstanding",
                    total,
                    item.name,
                    item.outstanding()
                ),
            ));
        }
    }

    // Keep request order for the receiving log
    let mut plan = Vec::new();
    for line in request {
        if let Some(quantity) = planned.remove(&line.item_id) {
            plan.push((line.item_id, quantity));
        }
    }
    Ok(plan)
}

impl PurchasingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List orders, newest first, with their lines
    pub async fn list(&self) -> AppResult<Vec<PurchaseOrder>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT po.id, po.supplier, po.expected_date, po.status, u.name AS created_by, po.created_at
            FROM purchase_orders po
            LEFT JOIN users u ON u.id = po.created_by
            ORDER BY po.created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, purchase_order_id, name, quantity, unit_cost, inventory_item_id, received_quantity
            FROM purchase_order_items
            WHERE purchase_order_id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<PurchaseOrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.purchase_order_id).or_default().push(item.into());
        }

        Ok(orders
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                assemble(row, items)
            })
            .collect())
    }

    /// Get an order with its lines
    pub async fn get(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        let mut conn = self.db.acquire().await?;
        load_order(&mut conn, order_id, false).await
    }

    /// Raise a new order
    pub async fn create(&self, user_id: Uuid, input: CreatePurchaseOrderInput) -> AppResult<PurchaseOrder> {
        input.validate()?;

        let lines: Vec<PurchaseOrderItem> = input
            .items
            .iter()
            .map(|line| PurchaseOrderItem {
                id: Uuid::new_v4(),
                name: line.name.trim().to_string(),
                quantity: line.quantity,
                unit_cost: line.unit_cost,
                inventory_item_id: line.inventory_item_id,
                received_quantity: Decimal::ZERO,
            })
            .collect();
        shared::validate_order_lines(&lines).map_err(|m| AppError::validation("items", m))?;

        let mut tx = self.db.begin().await?;

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchase_orders (supplier, expected_date, status, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.supplier.trim())
        .bind(input.expected_date)
        .bind(PurchaseOrderStatus::Ordered.as_str())
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (id, purchase_order_id, name, quantity, unit_cost, inventory_item_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(line.id)
            .bind(order_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_cost)
            .bind(line.inventory_item_id)
            .execute(&mut *tx)
            .await?;
        }

        let order = load_order(&mut tx, order_id, false).await?;
        tx.commit().await?;

        tracing::info!(%order_id, lines = lines.len(), total = %order.total_cost(), "purchase order created");
        Ok(order)
    }

    /// Change supplier or expected date of an order not yet received
    pub async fn update(&self, order_id: Uuid, input: UpdatePurchaseOrderInput) -> AppResult<PurchaseOrder> {
        input.validate()?;

        let mut tx = self.db.begin().await?;
        let order = load_order(&mut tx, order_id, true).await?;
        if !order.status.accepts_receipts() {
            return Err(AppError::InvalidStateTransition(
                "A received purchase order can no longer be edited".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE purchase_orders SET
                supplier = COALESCE($2, supplier),
                expected_date = COALESCE($3, expected_date),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(input.supplier.as_deref().map(str::trim))
        .bind(input.expected_date)
        .execute(&mut *tx)
        .await?;

        let order = load_order(&mut tx, order_id, false).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Delete an order and its lines
    pub async fn delete(&self, order_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }
        Ok(())
    }

    /// Receive goods against an order
    pub async fn receive(&self, order_id: Uuid, user_id: Uuid, input: ReceiveInput) -> AppResult<ReceiveResult> {
        let mut tx = self.db.begin().await?;

        let order = load_order(&mut tx, order_id, true).await?;
        if !order.status.accepts_receipts() {
            return Err(AppError::InvalidStateTransition(format!(
                "Purchase order {} is already fully received",
                order_id
            )));
        }

        let plan = plan_receipt(&order.items, &input.items)?;
        if plan.is_empty() {
            return Err(AppError::InvalidStateTransition(
                "Nothing left to receive on this purchase order".to_string(),
            ));
        }

        let mut receipt_ids = Vec::with_capacity(plan.len());
        for (item_id, quantity) in &plan {
            receipt_ids.push(receive_line(&mut tx, &order, *item_id, *quantity, user_id).await?);
        }

        let mut items = order.items.clone();
        for (item_id, quantity) in &plan {
            if let Some(item) = items.iter_mut().find(|item| item.id == *item_id) {
                item.received_quantity += *quantity;
            }
        }
        let status = status_after_receipt(&items);

        sqlx::query("UPDATE purchase_orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        let order = load_order(&mut tx, order_id, false).await?;
        let receipts = fetch_receipts(&mut tx, Some(receipt_ids.as_slice())).await?;
        tx.commit().await?;

        tracing::info!(%order_id, %status, lines = plan.len(), "goods received");
        Ok(ReceiveResult { order, receipts })
    }

    /// Receiving log, newest first
    pub async fn receiving_log(&self) -> AppResult<Vec<Receipt>> {
        let mut conn = self.db.acquire().await?;
        fetch_receipts(&mut conn, None).await
    }
}

fn assemble(row: OrderRow, items: Vec<PurchaseOrderItem>) -> PurchaseOrder {
    PurchaseOrder {
        status: parse_status(row.id, &row.status),
        id: row.id,
        supplier: row.supplier,
        expected_date: row.expected_date,
        created_by: row.created_by,
        items,
        created_at: row.created_at,
    }
}

async fn load_order(conn: &mut sqlx::PgConnection, order_id: Uuid, lock: bool) -> AppResult<PurchaseOrder> {
    let sql = format!(
        r#"
        SELECT po.id, po.supplier, po.expected_date, po.status, u.name AS created_by, po.created_at
        FROM purchase_orders po
        LEFT JOIN users u ON u.id = po.created_by
        WHERE po.id = $1
        {}
        "#,
        if lock { "FOR UPDATE OF po" } else { "" }
    );

    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT id, purchase_order_id, name, quantity, unit_cost, inventory_item_id, received_quantity
        FROM purchase_order_items
        WHERE purchase_order_id = $1
        ORDER BY name
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assemble(row, items.into_iter().map(PurchaseOrderItem::from).collect()))
}

async fn receive_line(
    tx: &mut Transaction<'_, Postgres>,
    order: &PurchaseOrder,
    item_id: Uuid,
    quantity: Decimal,
    user_id: Uuid,
) -> AppResult<Uuid> {
    sqlx::query("UPDATE purchase_order_items SET received_quantity = received_quantity + $2 WHERE id = $1")
        .bind(item_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

    let inventory_item_id = order
        .items
        .iter()
        .find(|item| item.id == item_id)
        .and_then(|item| item.inventory_item_id);

    match inventory_item_id {
        Some(inventory_id) => {
            let updated = sqlx::query(
                "UPDATE inventory SET quantity = quantity + $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(inventory_id)
            .bind(quantity)
            .execute(&mut **tx)
            .await?;
            if updated.rows_affected() == 0 {
                tracing::warn!(%item_id, %inventory_id, "linked inventory item no longer exists");
            }
        }
        None => tracing::debug!(%item_id, "order line not linked to inventory, stock unchanged"),
    }

    let receipt_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO receiving_log (purchase_order_id, purchase_order_item_id, quantity, received_by)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(order.id)
    .bind(item_id)
    .bind(quantity)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(receipt_id)
}

#[derive(Debug, FromRow)]
struct ReceiptRow {
    id: Uuid,
    purchase_order_id: Uuid,
    purchase_order_item_id: Uuid,
    item_name: String,
    supplier: String,
    quantity: Decimal,
    received_by: Option<String>,
    received_at: DateTime<Utc>,
}

async fn fetch_receipts(conn: &mut sqlx::PgConnection, ids: Option<&[Uuid]>) -> AppResult<Vec<Receipt>> {
    let rows = sqlx::query_as::<_, ReceiptRow>(
        r#"
        SELECT r.id, r.purchase_order_id, r.purchase_order_item_id, poi.name AS item_name,
               po.supplier, r.quantity, u.name AS received_by, r.received_at
        FROM receiving_log r
        JOIN purchase_order_items poi ON poi.id = r.purchase_order_item_id
        JOIN purchase_orders po ON po.id = r.purchase_order_id
        LEFT JOIN users u ON u.id = r.received_by
        WHERE $1::uuid[] IS NULL OR r.id = ANY($1)
        ORDER BY r.received_at DESC, poi.name
        "#,
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Receipt {
            id: row.id,
            purchase_order_id: row.purchase_order_id,
            purchase_order_item_id: row.purchase_order_item_id,
            item_name: row.item_name,
            supplier: row.supplier,
            quantity: row.quantity,
            received_by: row.received_by,
            received_at: row.received_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, received: i64) -> PurchaseOrderItem {
        PurchaseOrderItem {
            id: Uuid::new_v4(),
            name: "Flour".to_string(),
            quantity: Decimal::from(quantity),
            unit_cost: Decimal::ONE,
            inventory_item_id: None,
            received_quantity: Decimal::from(received),
        }
    }

    fn request(item_id: Uuid, quantity: i64) -> ReceiveLineInput {
        ReceiveLineInput {
            item_id,
            quantity: Decimal::from(quantity),
        }
    }

    #[test]
    fn test_empty_request_receives_everything_outstanding() {
        let items = vec![line(10, 4), line(5, 5)];
        let plan = plan_receipt(&items, &[]).unwrap();
        assert_eq!(plan, vec![(items[0].id, Decimal::from(6))]);
    }

    #[test]
    fn test_partial_request() {
        let items = vec![line(10, 0), line(5, 0)];
        let plan = plan_receipt(&items, &[request(items[1].id, 2)]).unwrap();
        assert_eq!(plan, vec![(items[1].id, Decimal::from(2))]);
    }

    #[test]
    fn test_repeated_lines_are_summed_against_outstanding() {
        let items = vec![line(10, 6)];
        let ok = plan_receipt(&items, &[request(items[0].id, 2), request(items[0].id, 2)]).unwrap();
        assert_eq!(ok, vec![(items[0].id, Decimal::from(4))]);

        let err = plan_receipt(&items, &[request(items[0].id, 3), request(items[0].id, 2)]).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_over_receipt_rejected() {
        let items = vec![line(10, 0)];
        assert!(plan_receipt(&items, &[request(items[0].id, 11)]).is_err());
    }

    #[test]
    fn test_huge_repeated_lines_rejected_without_overflow() {
        let items = vec![line(10, 0)];
        let huge = ReceiveLineInput {
            item_id: items[0].id,
            quantity: Decimal::MAX,
        };
        let err = plan_receipt(&items, &[request(items[0].id, 1), huge]).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_non_positive_and_unknown_lines_rejected() {
        let items = vec![line(10, 0)];
        assert!(plan_receipt(&items, &[request(items[0].id, 0)]).is_err());
        let err = plan_receipt(&items, &[request(Uuid::new_v4(), 1)]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
