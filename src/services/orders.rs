// src/services/orders.rs

//! Order assembly and lifecycle. Conversion of a cart into an order is one
//! transaction: stock is reserved line by line through the inventory ledger,
//! the coupon redemption is counted, the order and its immutable line
//! snapshots are inserted, and the cart is marked converted. Any failure
//! rolls the whole unit back, including decrements already applied.

use chrono::Utc;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Address, Order, OrderItem, OrderStatus, PaymentStatus};
use crate::services::cart::{self, CartOwner};
use crate::services::inventory::{self, StockTarget};

pub(crate) const ORDER_COLUMNS: &str = "id, user_id, order_number, status, payment_status, payment_method, payment_details, \
   subtotal_cents, tax_cents, shipping_cents, discount_cents, total_cents, coupon_code, \
   shipping_address_id, billing_address_id, notes, tracking_number, shipping_carrier, \
   shipped_at, delivered_at, cancelled_at, cancellation_reason, refunded_at, refund_amount_cents, \
   refund_reason, order_date, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, variant_id, name, sku, price_cents, quantity, \
   subtotal_cents, discount_cents, tax_cents, total_cents, attributes";

#[derive(Debug)]
pub struct CheckoutInput {
  pub shipping_address_id: Uuid,
  pub billing_address_id: Option<Uuid>,
  pub payment_method: String,
  pub notes: Option<String>,
}

/// Human-readable order number: prefix + trailing 8 digits of the timestamp
/// + 3 random digits. Collision-resistant, not collision-proof; the unique
/// index on `orders.order_number` is the actual uniqueness guarantee.
pub fn generate_order_number(prefix: &str) -> String {
  let millis = Utc::now().timestamp_millis().to_string();
  let tail = &millis[millis.len().saturating_sub(8)..];
  let suffix = (Uuid::new_v4().as_u128() % 1000) as u16;
  format!("{}{}{:03}", prefix, tail, suffix)
}

// One cart line joined with the catalog fields the order snapshot needs.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLine {
  product_id: Uuid,
  variant_id: Option<Uuid>,
  quantity: i32,
  price_cents: i64,
  subtotal_cents: i64,
  attributes: serde_json::Value,
  product_name: String,
  product_sku: String,
  variant_name: Option<String>,
  variant_sku: Option<String>,
}

impl CheckoutLine {
  fn display_name(&self) -> String {
    match &self.variant_name {
      Some(variant) => format!("{} ({})", self.product_name, variant),
      None => self.product_name.clone(),
    }
  }

  fn sku(&self) -> &str {
    self.variant_sku.as_deref().unwrap_or(&self.product_sku)
  }
}

async fn assert_owned_address(conn: &mut PgConnection, address_id: Uuid, user_id: Uuid, label: &str) -> Result<()> {
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM addresses WHERE id = $1 AND user_id = $2)")
    .bind(address_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
  if !exists {
    return Err(AppError::NotFound(format!("{} address not found", label)));
  }
  Ok(())
}

async fn unused_order_number(conn: &mut PgConnection, prefix: &str) -> Result<String> {
  // A handful of attempts covers the (already unlikely) case of a same-
  // millisecond collision; the unique index backs this up regardless.
  for _ in 0..3 {
    let candidate = generate_order_number(prefix);
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
      .bind(&candidate)
      .fetch_one(&mut *conn)
      .await?;
    if !taken {
      return Ok(candidate);
    }
  }
  Err(AppError::Internal("Could not allocate a unique order number".to_string()))
}

/// Convert the user's active cart into an order. All-or-nothing: either every
/// line's stock is reserved and the order is created, or nothing persists.
pub async fn create_order(
  pool: &PgPool,
  user_id: Uuid,
  input: CheckoutInput,
  order_number_prefix: &str,
) -> Result<(Order, Vec<OrderItem>)> {
  if input.payment_method.trim().is_empty() {
    return Err(AppError::Validation("Payment method is required".to_string()));
  }

  let mut tx = pool.begin().await?;

  assert_owned_address(&mut tx, input.shipping_address_id, user_id, "Shipping").await?;
  let billing_address_id = match input.billing_address_id {
    Some(id) => {
      assert_owned_address(&mut tx, id, user_id, "Billing").await?;
      id
    }
    // Billing falls back to the shipping address when not provided.
    None => input.shipping_address_id,
  };

  let owner = CartOwner::User(user_id);
  let cart = cart::lock_active_cart(&mut tx, &owner)
    .await?
    .ok_or_else(|| AppError::Validation("Cart is empty".to_string()))?;

  let lines = sqlx::query_as::<_, CheckoutLine>(
    "SELECT ci.product_id, ci.variant_id, ci.quantity, ci.price_cents, ci.subtotal_cents, ci.attributes, \
            p.name AS product_name, p.sku AS product_sku, v.name AS variant_name, v.sku AS variant_sku \
     FROM cart_items ci \
     JOIN products p ON p.id = ci.product_id \
     LEFT JOIN product_variants v ON v.id = ci.variant_id \
     WHERE ci.cart_id = $1 \
     ORDER BY ci.added_at",
  )
  .bind(cart.id)
  .fetch_all(&mut *tx)
  .await?;

  if lines.is_empty() {
    return Err(AppError::Validation("Cart is empty".to_string()));
  }

  // Stock may have moved since the items were added; the conditional
  // decrement is the re-check. A failed line aborts the conversion and the
  // rollback undoes the reservations already made.
  for line in &lines {
    let reserved = inventory::reserve(
      &mut tx,
      StockTarget::for_line(line.product_id, line.variant_id),
      line.quantity,
    )
    .await?;
    if !reserved {
      return Err(AppError::Conflict(format!("{} is out of stock", line.display_name())));
    }
  }

  // Coupon redemption counts at conversion, not at cart-apply. The guarded
  // update enforces the global cap; the per-user cap is checked against the
  // customer's existing orders.
  if let Some(code) = &cart.coupon_code {
    let per_user_limit: Option<i32> = sqlx::query_scalar("SELECT usage_limit_per_user FROM coupons WHERE code = $1")
      .bind(code)
      .fetch_optional(&mut *tx)
      .await?
      .flatten();
    if let Some(limit) = per_user_limit {
      let redeemed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1 AND coupon_code = $2")
        .bind(user_id)
        .bind(code)
        .fetch_one(&mut *tx)
        .await?;
      if redeemed >= i64::from(limit) {
        return Err(AppError::Conflict(
          "Coupon usage limit for this customer reached".to_string(),
        ));
      }
    }
    if !crate::services::coupons::redeem_by_code(&mut tx, code).await? {
      return Err(AppError::Conflict(format!("Coupon {} is no longer available", code)));
    }
  }

  let order_number = unused_order_number(&mut tx, order_number_prefix).await?;
  let order = sqlx::query_as::<_, Order>(&format!(
    "INSERT INTO orders (id, user_id, order_number, status, payment_status, payment_method, \
       subtotal_cents, tax_cents, shipping_cents, discount_cents, total_cents, coupon_code, \
       shipping_address_id, billing_address_id, notes) \
     VALUES ($1, $2, $3, 'pending', 'pending', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
     RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(user_id)
  .bind(&order_number)
  .bind(input.payment_method.trim())
  .bind(cart.subtotal_cents)
  .bind(cart.tax_cents)
  .bind(cart.shipping_cents)
  .bind(cart.discount_cents)
  .bind(cart.total_cents)
  .bind(&cart.coupon_code)
  .bind(input.shipping_address_id)
  .bind(billing_address_id)
  .bind(&input.notes)
  .fetch_one(&mut *tx)
  .await?;

  let mut items = Vec::with_capacity(lines.len());
  for line in &lines {
    let item = sqlx::query_as::<_, OrderItem>(&format!(
      "INSERT INTO order_items (id, order_id, product_id, variant_id, name, sku, price_cents, quantity, \
         subtotal_cents, discount_cents, tax_cents, total_cents, attributes) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, $9, $10) \
       RETURNING {}",
      ORDER_ITEM_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(order.id)
    .bind(line.product_id)
    .bind(line.variant_id)
    .bind(line.display_name())
    .bind(line.sku())
    .bind(line.price_cents)
    .bind(line.quantity)
    .bind(line.subtotal_cents)
    .bind(&line.attributes)
    .fetch_one(&mut *tx)
    .await?;
    items.push(item);
  }

  sqlx::query(
    "UPDATE carts SET status = 'converted', converted_order_id = $2, last_activity = now(), updated_at = now() \
     WHERE id = $1",
  )
  .bind(cart.id)
  .bind(order.id)
  .execute(&mut *tx)
  .await?;

  tx.commit().await?;
  tracing::info!(order_id = %order.id, order_number = %order.order_number, user_id = %user_id, "Order created from cart.");
  Ok((order, items))
}

// --- Queries ---------------------------------------------------------------

pub async fn find_order(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>> {
  let order = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
  Ok(order)
}

pub async fn order_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>> {
  let items = sqlx::query_as::<_, OrderItem>(&format!(
    "SELECT {} FROM order_items WHERE order_id = $1",
    ORDER_ITEM_COLUMNS
  ))
  .bind(order_id)
  .fetch_all(pool)
  .await?;
  Ok(items)
}

/// An order with its line snapshots and address references resolved.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub shipping_address: Option<Address>,
  pub billing_address: Option<Address>,
}

async fn find_address(pool: &PgPool, address_id: Uuid) -> Result<Option<Address>> {
  let address = sqlx::query_as::<_, Address>(
    "SELECT id, user_id, line1, line2, city, postal_code, country FROM addresses WHERE id = $1",
  )
  .bind(address_id)
  .fetch_optional(pool)
  .await?;
  Ok(address)
}

/// Fetch an order for its owner or an admin; anyone else gets Forbidden.
pub async fn get_order_for(pool: &PgPool, order_id: Uuid, requester_id: Uuid, is_admin: bool) -> Result<OrderDetail> {
  let order = find_order(pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  if order.user_id != requester_id && !is_admin {
    return Err(AppError::Forbidden("Not authorized to access this order".to_string()));
  }
  let items = order_items(pool, order_id).await?;
  let shipping_address = find_address(pool, order.shipping_address_id).await?;
  let billing_address = find_address(pool, order.billing_address_id).await?;
  Ok(OrderDetail {
    order,
    items,
    shipping_address,
    billing_address,
  })
}

pub async fn list_user_orders(pool: &PgPool, user_id: Uuid, page: i64, limit: i64) -> Result<(i64, Vec<Order>)> {
  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
    .bind(user_id)
    .fetch_one(pool)
    .await?;
  let orders = sqlx::query_as::<_, Order>(&format!(
    "SELECT {} FROM orders WHERE user_id = $1 ORDER BY order_date DESC LIMIT $2 OFFSET $3",
    ORDER_COLUMNS
  ))
  .bind(user_id)
  .bind(limit)
  .bind((page - 1) * limit)
  .fetch_all(pool)
  .await?;
  Ok((count, orders))
}

pub async fn admin_list(
  pool: &PgPool,
  status: Option<OrderStatus>,
  page: i64,
  limit: i64,
) -> Result<(i64, Vec<Order>)> {
  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ($1::order_status_enum IS NULL OR status = $1)")
    .bind(status)
    .fetch_one(pool)
    .await?;
  let orders = sqlx::query_as::<_, Order>(&format!(
    "SELECT {} FROM orders WHERE ($1::order_status_enum IS NULL OR status = $1) \
     ORDER BY order_date DESC LIMIT $2 OFFSET $3",
    ORDER_COLUMNS
  ))
  .bind(status)
  .bind(limit)
  .bind((page - 1) * limit)
  .fetch_all(pool)
  .await?;
  Ok((count, orders))
}

// --- Lifecycle -------------------------------------------------------------

async fn lock_order(conn: &mut PgConnection, order_id: Uuid) -> Result<Order> {
  sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Admin status update, restricted to the forward fulfilment progression.
/// Cancelled/Refunded are not reachable here; the cancellation flow owns
/// those because they also restore stock and reverse payment state.
pub async fn update_status(pool: &PgPool, order_id: Uuid, next: OrderStatus) -> Result<Order> {
  let mut tx = pool.begin().await?;
  let order = lock_order(&mut tx, order_id).await?;

  if !order.status.can_transition_to(next) {
    return Err(AppError::Conflict(format!(
      "Order cannot move from {} to {}",
      order.status, next
    )));
  }

  let updated = sqlx::query_as::<_, Order>(&format!(
    "UPDATE orders SET status = $2, \
       shipped_at = CASE WHEN $2 = 'shipped'::order_status_enum THEN now() ELSE shipped_at END, \
       delivered_at = CASE WHEN $2 = 'delivered'::order_status_enum THEN now() ELSE delivered_at END, \
       updated_at = now() \
     WHERE id = $1 RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(next)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;
  Ok(updated)
}

/// Admin: mark the order delivered, recording the tracking metadata. The
/// shipped timestamp is backfilled when the shipped step was skipped.
pub async fn mark_delivered(
  pool: &PgPool,
  order_id: Uuid,
  tracking_number: Option<String>,
  shipping_carrier: Option<String>,
) -> Result<Order> {
  let mut tx = pool.begin().await?;
  let order = lock_order(&mut tx, order_id).await?;

  if !order.status.can_transition_to(OrderStatus::Delivered) {
    return Err(AppError::Conflict(format!(
      "Order cannot move from {} to delivered",
      order.status
    )));
  }

  let updated = sqlx::query_as::<_, Order>(&format!(
    "UPDATE orders SET status = 'delivered', tracking_number = COALESCE($2, tracking_number), \
       shipping_carrier = COALESCE($3, shipping_carrier), delivered_at = now(), \
       shipped_at = COALESCE(shipped_at, now()), updated_at = now() \
     WHERE id = $1 RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(tracking_number)
  .bind(shipping_carrier)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;
  Ok(updated)
}

/// Cancel an order (owner or admin): record the reason, restore every line's
/// stock through the ledger and, when the order was paid, move the payment
/// state to refunded with the refund metadata. Telling the real payment
/// provider to move money back is the gateway integration's job, not ours.
pub async fn cancel_order(
  pool: &PgPool,
  order_id: Uuid,
  requester_id: Uuid,
  is_admin: bool,
  reason: Option<String>,
) -> Result<Order> {
  let mut tx = pool.begin().await?;
  let order = lock_order(&mut tx, order_id).await?;

  if order.user_id != requester_id && !is_admin {
    return Err(AppError::Forbidden("Not authorized to cancel this order".to_string()));
  }
  if !order.status.is_cancellable() {
    return Err(AppError::Conflict(format!(
      "Order cannot be cancelled because it is already {}",
      order.status
    )));
  }

  sqlx::query(
    "UPDATE orders SET status = 'cancelled', cancellation_reason = $2, cancelled_at = now(), updated_at = now() \
     WHERE id = $1",
  )
  .bind(order_id)
  .bind(&reason)
  .execute(&mut *tx)
  .await?;

  // Return every line's quantity to stock; a create -> cancel cycle nets to
  // zero for the same quantities.
  #[derive(sqlx::FromRow)]
  struct ReleasableLine {
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
  }
  let lines = sqlx::query_as::<_, ReleasableLine>(
    "SELECT product_id, variant_id, quantity FROM order_items WHERE order_id = $1",
  )
  .bind(order_id)
  .fetch_all(&mut *tx)
  .await?;
  for line in &lines {
    inventory::release(
      &mut tx,
      StockTarget::for_line(line.product_id, line.variant_id),
      line.quantity,
    )
    .await?;
  }

  if order.payment_status == PaymentStatus::Paid {
    sqlx::query(
      "UPDATE orders SET payment_status = 'refunded', refunded_at = now(), refund_amount_cents = total_cents, \
         refund_reason = $2, updated_at = now() \
       WHERE id = $1",
    )
    .bind(order_id)
    .bind(&reason)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
      "UPDATE payments SET status = 'refunded', refund_amount_cents = amount_cents, refunded_at = now(), \
         refund_reason = $2 \
       WHERE order_id = $1 AND status = 'completed'",
    )
    .bind(order_id)
    .bind(&reason)
    .execute(&mut *tx)
    .await?;
  }

  let updated = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;

  tx.commit().await?;
  let was_paid = order.payment_status == PaymentStatus::Paid;
  tracing::info!(order_id = %order_id, was_paid, "Order cancelled.");
  Ok(updated)
}

// --- Reporting -------------------------------------------------------------

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
  pub status: OrderStatus,
  pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderStats {
  pub total_orders: i64,
  pub by_status: Vec<StatusCount>,
  pub paid_revenue_cents: i64,
}

/// Simple read-only aggregation for the admin dashboard.
pub async fn stats(pool: &PgPool) -> Result<OrderStats> {
  let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(pool).await?;
  let by_status = sqlx::query_as::<_, StatusCount>("SELECT status, COUNT(*) AS count FROM orders GROUP BY status")
    .fetch_all(pool)
    .await?;
  let paid_revenue_cents: i64 =
    sqlx::query_scalar("SELECT COALESCE(SUM(total_cents), 0) FROM orders WHERE payment_status = 'paid'")
      .fetch_one(pool)
      .await?;
  Ok(OrderStats {
    total_orders,
    by_status,
    paid_revenue_cents,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn order_numbers_carry_prefix_timestamp_and_suffix() {
    let number = generate_order_number("SA");
    assert!(number.starts_with("SA"));
    assert_eq!(number.len(), 2 + 8 + 3);
    assert!(number[2..].chars().all(|c| c.is_ascii_digit()));
  }

  #[test]
  fn order_numbers_vary_across_calls() {
    // The random suffix makes same-millisecond collisions unlikely; the
    // database's unique index catches the rest.
    let numbers: std::collections::HashSet<String> = (0..50).map(|_| generate_order_number("SA")).collect();
    assert!(numbers.len() > 1);
  }
}
