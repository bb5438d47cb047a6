//! Postgres-backed order store.
//!
//! The checkout commit is one database transaction: order row, line rows,
//! total update, payment row, and the `confirmed` transition all land
//! together or not at all. Uniqueness of order numbers is enforced by a
//! unique index, so two racing checkouts can never both commit the same
//! number.
//!
//! ## Error mapping
//!
//! | SQLx error | PG code | StoreError | Scenario |
//! |------------|---------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | duplicate order number |
//! | Database (other) | any | `Storage` | constraint/storage failure |
//! | RowNotFound / pool / IO | n/a | `Storage` | infrastructure failure |
//!
//! A failed or timed-out transaction is rolled back by Postgres; the caller
//! sees `Storage` and the customer's cart is left intact for a retry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bakeshop_core::{CustomerId, ItemId, Money, OrderId, OrderLineId, PaymentId};
use bakeshop_orders::{NewOrder, Order, OrderLine, OrderStatus, Payment, PaymentStatus};

use super::{OrderReceipt, OrderStore, StoreError, TodayStats};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL,
    order_number TEXT NOT NULL UNIQUE,
    total_amount BIGINT NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    delivery_address TEXT NOT NULL DEFAULT '',
    delivery_phone TEXT NOT NULL DEFAULT '',
    instructions TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS orders_customer_created
    ON orders (customer_id, created_at DESC);

CREATE TABLE IF NOT EXISTS order_lines (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders (id),
    item_id UUID NOT NULL,
    item_name TEXT NOT NULL,
    quantity INT NOT NULL CHECK (quantity >= 1),
    unit_price BIGINT NOT NULL,
    customization TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS order_lines_order ON order_lines (order_id);

CREATE TABLE IF NOT EXISTS payments (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL UNIQUE REFERENCES orders (id),
    amount BIGINT NOT NULL,
    method TEXT NOT NULL,
    status TEXT NOT NULL,
    transaction_ref TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
"#;

/// Postgres-backed order store.
///
/// Thread-safe: all operations go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(
        skip(self, order),
        fields(
            customer_id = %order.customer_id,
            order_number = %order.number,
            line_count = order.lines.len()
        ),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<OrderReceipt, StoreError> {
        let order_id = OrderId::new();
        let total = order.total();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_order.begin", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, customer_id, order_number, total_amount, status,
                 delivery_address, delivery_phone, instructions, created_at, updated_at)
            VALUES ($1, $2, $3, 0, 'pending', $4, $5, $6, $7, $7)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.number.as_str())
        .bind(&order.delivery_address)
        .bind(&order.delivery_phone)
        .bind(&order.instructions)
        .bind(order.placed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_order.insert_order", e))?;

        for line in &order.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                StoreError::Storage(format!(
                    "create_order.insert_line: quantity {} out of range",
                    line.quantity
                ))
            })?;
            sqlx::query(
                r#"
                INSERT INTO order_lines
                    (id, order_id, item_id, item_name, quantity, unit_price, customization)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(OrderLineId::new().as_uuid())
            .bind(order_id.as_uuid())
            .bind(line.item_id.as_uuid())
            .bind(&line.item_name)
            .bind(quantity)
            .bind(line.unit_price.minor())
            .bind(&line.customization)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order.insert_line", e))?;
        }

        sqlx::query("UPDATE orders SET total_amount = $1 WHERE id = $2")
            .bind(total.minor())
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order.write_total", e))?;

        sqlx::query(
            r#"
            INSERT INTO payments
                (id, order_id, amount, method, status, transaction_ref, created_at)
            VALUES ($1, $2, $3, $4, 'completed', $5, $6)
            "#,
        )
        .bind(PaymentId::new().as_uuid())
        .bind(order_id.as_uuid())
        .bind(total.minor())
        .bind(&order.payment_method)
        .bind(Payment::transaction_ref_for(order.placed_at))
        .bind(order.placed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_order.insert_payment", e))?;

        sqlx::query("UPDATE orders SET status = 'confirmed' WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order.confirm", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_order.commit", e))?;

        Ok(OrderReceipt {
            order_id,
            number: order.number,
            total,
        })
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn order(&self, id: OrderId) -> Result<Order, StoreError> {
        let order_row = sqlx::query(
            r#"
            SELECT id, customer_id, order_number, total_amount, status,
                   delivery_address, delivery_phone, instructions, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("order.fetch", e))?
        .ok_or(StoreError::NotFound)?;

        let mut order = order_from_row(&order_row)?;
        order.lines = self.lines_for(id).await?;
        order.payment = self.payment_for(id).await?;
        Ok(order)
    }

    #[instrument(skip(self), fields(customer_id = %customer), err)]
    async fn orders_for_customer(&self, customer: CustomerId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, order_number, total_amount, status,
                   delivery_address, delivery_phone, instructions, created_at, updated_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_customer", e))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let mut order = order_from_row(&row)?;
            order.lines = self.lines_for(order.id).await?;
            order.payment = self.payment_for(order.id).await?;
            orders.push(order);
        }
        Ok(orders)
    }

    #[instrument(skip(self), fields(order_id = %id, %expected, %next), err)]
    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(next.as_str())
        .bind(now)
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_status", e))?;

        if result.rows_affected() == 0 {
            let current = sqlx::query("SELECT status FROM orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_status.recheck", e))?;
            return match current {
                None => Err(StoreError::NotFound),
                Some(row) => {
                    let status: String = row
                        .try_get("status")
                        .map_err(|e| map_sqlx_error("update_status.recheck", e))?;
                    Err(StoreError::Conflict(format!(
                        "order {id} is {status}, expected {expected}"
                    )))
                }
            };
        }

        self.order(id).await
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn recompute_total(&self, id: OrderId, now: DateTime<Utc>) -> Result<Money, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET total_amount = sub.total, updated_at = $2
            FROM (
                SELECT COALESCE(SUM(quantity * unit_price), 0) AS total
                FROM order_lines
                WHERE order_id = $1
            ) AS sub
            WHERE id = $1
            RETURNING total_amount
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("recompute_total", e))?
        .ok_or(StoreError::NotFound)?;

        let total: i64 = row
            .try_get("total_amount")
            .map_err(|e| map_sqlx_error("recompute_total", e))?;
        Ok(Money::from_minor(total))
    }

    #[instrument(skip(self), err)]
    async fn today_stats(&self, now: DateTime<Utc>) -> Result<TodayStats, StoreError> {
        let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let today = sqlx::query(
            r#"
            SELECT COUNT(*) AS orders_today,
                   COALESCE(SUM(total_amount), 0) AS revenue_today
            FROM orders
            WHERE created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("today_stats", e))?;

        let pending = sqlx::query("SELECT COUNT(*) AS pending FROM orders WHERE status = 'pending'")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("today_stats.pending", e))?;

        let orders_today: i64 = today
            .try_get("orders_today")
            .map_err(|e| map_sqlx_error("today_stats", e))?;
        let revenue_today: i64 = today
            .try_get("revenue_today")
            .map_err(|e| map_sqlx_error("today_stats", e))?;
        let pending_orders: i64 = pending
            .try_get("pending")
            .map_err(|e| map_sqlx_error("today_stats", e))?;

        Ok(TodayStats {
            orders_today: orders_today as u64,
            revenue_today: Money::from_minor(revenue_today),
            pending_orders: pending_orders as u64,
        })
    }
}

impl PostgresOrderStore {
    async fn lines_for(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, item_id, item_name, quantity, unit_price, customization
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("lines_for", e))?;

        rows.iter().map(line_from_row).collect()
    }

    async fn payment_for(&self, order_id: OrderId) -> Result<Option<Payment>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, amount, method, status, transaction_ref, created_at
            FROM payments
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("payment_for", e))?;

        row.as_ref().map(payment_from_row).transpose()
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = get(row, "status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::Storage(format!("corrupt status column: {e}")))?;

    Ok(Order {
        id: OrderId::from_uuid(get(row, "id")?),
        customer_id: CustomerId::from_uuid(get(row, "customer_id")?),
        number: get::<String>(row, "order_number")?.into(),
        total: Money::from_minor(get(row, "total_amount")?),
        status,
        delivery_address: get(row, "delivery_address")?,
        delivery_phone: get(row, "delivery_phone")?,
        instructions: get(row, "instructions")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
        lines: Vec::new(),
        payment: None,
    })
}

fn line_from_row(row: &PgRow) -> Result<OrderLine, StoreError> {
    Ok(OrderLine {
        id: OrderLineId::from_uuid(get(row, "id")?),
        order_id: OrderId::from_uuid(get(row, "order_id")?),
        item_id: ItemId::from_uuid(get(row, "item_id")?),
        item_name: get(row, "item_name")?,
        quantity: get::<i32>(row, "quantity")? as u32,
        unit_price: Money::from_minor(get(row, "unit_price")?),
        customization: get(row, "customization")?,
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment, StoreError> {
    let status: String = get(row, "status")?;
    let status = match status.as_str() {
        "pending" => PaymentStatus::Pending,
        "completed" => PaymentStatus::Completed,
        "failed" => PaymentStatus::Failed,
        "refunded" => PaymentStatus::Refunded,
        other => {
            return Err(StoreError::Storage(format!(
                "corrupt payment status column: '{other}'"
            )));
        }
    };

    Ok(Payment {
        id: PaymentId::from_uuid(get(row, "id")?),
        order_id: OrderId::from_uuid(get(row, "order_id")?),
        amount: Money::from_minor(get(row, "amount")?),
        method: get(row, "method")?,
        status,
        transaction_ref: get(row, "transaction_ref")?,
        created_at: get(row, "created_at")?,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Storage(format!("column '{column}': {e}")))
}

fn map_sqlx_error(operation: &str, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Conflict(format!("{operation}: {}", db.message()));
        }
    }
    StoreError::Storage(format!("{operation}: {error}"))
}
