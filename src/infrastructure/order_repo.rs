use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    order_total, CartLine, ListResult, Order, OrderItem, OrderStatus, PaymentMethod,
    ShippingDetails,
};
use crate::domain::ports::OrderRepository;
use crate::domain::status::StatusChange;
use crate::schema::{cart_items, order_items, orders, products};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn to_domain(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
    Ok(Order {
        id: row.id,
        user_id: row.user_id,
        status: row.status.parse()?,
        total_amount: row.total_amount,
        payment_method: row.payment_method.parse()?,
        provider_order_code: row.provider_order_code,
        shipping: ShippingDetails {
            name: row.shipping_name,
            phone: row.shipping_phone,
            address: row.shipping_address,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
        items: items
            .into_iter()
            .map(|item| OrderItem {
                id: item.id,
                product_id: item.product_id,
                product_name: item.product_name,
                quantity: item.quantity,
                price: item.price,
            })
            .collect(),
    })
}

fn with_items(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let items = OrderItemRow::belonging_to(&rows)
        .select(OrderItemRow::as_select())
        .order(order_items::created_at.asc())
        .load(conn)?;

    items
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(items, row)| to_domain(row, items))
        .collect()
}

/// Locks only the user's own cart rows, then reads catalog prices without a
/// lock. A concurrent checkout of the same cart waits on the first query and
/// then finds the rows gone; other users' checkouts of the same products do
/// not wait at all.
fn lock_cart(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<(Uuid, CartLine)>, DomainError> {
    let locked: Vec<Uuid> = cart_items::table
        .filter(cart_items::user_id.eq(user_id))
        .select(cart_items::id)
        .for_update()
        .load(conn)?;
    if locked.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(Uuid, Uuid, String, i32, BigDecimal)> = cart_items::table
        .inner_join(products::table)
        .filter(cart_items::id.eq_any(locked))
        .order(cart_items::created_at.asc())
        .select((
            cart_items::id,
            cart_items::product_id,
            products::name,
            cart_items::quantity,
            products::price,
        ))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(id, product_id, product_name, quantity, unit_price)| {
            (
                id,
                CartLine {
                    product_id,
                    product_name,
                    quantity,
                    unit_price,
                },
            )
        })
        .collect())
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn place_order(
        &self,
        user_id: Uuid,
        shipping: &ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Lock the cart rows and price them against the live catalog.
            let cart = lock_cart(conn, user_id)?;
            if cart.is_empty() {
                return Err(DomainError::EmptyCart);
            }
            let (cart_ids, lines): (Vec<Uuid>, Vec<CartLine>) = cart.into_iter().unzip();

            // 2. Insert the order with its total frozen.
            let order_id = Uuid::new_v4();
            let now = Utc::now();
            let total_amount = order_total(&lines);
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    user_id,
                    status: OrderStatus::Pending.as_str(),
                    total_amount: total_amount.clone(),
                    payment_method: payment_method.as_str(),
                    shipping_name: &shipping.name,
                    shipping_phone: &shipping.phone,
                    shipping_address: &shipping.address,
                    created_at: now,
                    updated_at: now,
                })
                .execute(conn)?;

            // 3. Insert order items at the prices read above.
            let items: Vec<OrderItem> = lines
                .into_iter()
                .map(|line| OrderItem {
                    id: Uuid::new_v4(),
                    product_id: line.product_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect();
            let new_items: Vec<NewOrderItemRow> = items
                .iter()
                .map(|item| NewOrderItemRow {
                    id: item.id,
                    order_id,
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    price: item.price.clone(),
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&new_items)
                .execute(conn)?;

            // 4. Clear exactly the cart rows that were billed.
            diesel::delete(cart_items::table.filter(cart_items::id.eq_any(cart_ids)))
                .execute(conn)?;

            Ok(Order {
                id: order_id,
                user_id,
                status: OrderStatus::Pending,
                total_amount,
                payment_method,
                provider_order_code: None,
                shipping: shipping.clone(),
                created_at: now,
                updated_at: now,
                items,
            })
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };
        Ok(with_items(&mut conn, vec![order])?.pop())
    }

    fn find_by_provider_order_code(&self, code: i64) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::provider_order_code.eq(code))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };
        Ok(with_items(&mut conn, vec![order])?.pop())
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;

        with_items(&mut conn, rows)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: with_items(conn, rows)?,
                total,
            })
        })
    }

    fn update_status(
        &self,
        id: Uuid,
        expected: Option<OrderStatus>,
        status: OrderStatus,
    ) -> Result<Option<StatusChange>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let current: String = orders::table
                .filter(orders::id.eq(id))
                .select(orders::status)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound)?;
            let from: OrderStatus = current.parse()?;
            if expected.is_some_and(|expected| expected != from) {
                return Ok(None);
            }

            let row = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((
                    orders::status.eq(status.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .returning(OrderRow::as_returning())
                .get_result(conn)?;
            let order = with_items(conn, vec![row])?
                .pop()
                .ok_or(DomainError::NotFound)?;
            Ok(Some(StatusChange { from, order }))
        })
    }

    fn assign_provider_order_code(&self, id: Uuid, code: i64) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let affected = diesel::update(orders::table.filter(orders::id.eq(id)))
            .set(orders::provider_order_code.eq(code))
            .execute(&mut conn)?;
        if affected == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}
