// src/services/cart.rs

//! Cart lifecycle manager. Owns every cart state transition (active ->
//! merged/converted/abandoned) and is the only place cart totals are written:
//! each mutation runs inside a transaction holding a row lock on the cart,
//! recomputes totals through the pricing module and re-validates any attached
//! coupon against the new contents before committing.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, CouponSnapshot, Product, ProductVariant};
use crate::pricing;
use crate::services::coupons::{self, EligibleLine};

/// Who a cart belongs to: a registered user or an anonymous session.
#[derive(Debug, Clone)]
pub enum CartOwner {
  User(Uuid),
  Guest(String),
}

pub(crate) const CART_COLUMNS: &str = "id, user_id, session_id, status, subtotal_cents, tax_cents, shipping_cents, \
   discount_cents, total_cents, coupon_code, coupon_snapshot, converted_order_id, last_activity, \
   created_at, updated_at";

const CART_ITEM_COLUMNS: &str =
  "id, cart_id, product_id, variant_id, quantity, price_cents, subtotal_cents, attributes, added_at, updated_at";

/// A cart refreshed after a mutation, with its computed totals.
#[derive(Debug)]
pub struct UpdatedCart {
  pub cart: Cart,
  pub items: Vec<CartItem>,
  /// True when re-validation detached a previously applied coupon.
  pub coupon_dropped: bool,
}

#[derive(Debug)]
pub struct NewItem {
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub quantity: i32,
  pub attributes: Option<serde_json::Value>,
}

// The join the recompute pass and the coupon validator both read: one row per
// cart line with the owning product's category.
#[derive(Debug, sqlx::FromRow)]
struct LineFacts {
  product_id: Uuid,
  category_id: Option<Uuid>,
  quantity: i32,
  price_cents: i64,
  subtotal_cents: i64,
}

impl LineFacts {
  fn eligible(&self) -> EligibleLine {
    EligibleLine {
      product_id: self.product_id,
      category_id: self.category_id,
      subtotal_cents: self.subtotal_cents,
    }
  }

  fn priced(&self) -> pricing::PricedLine {
    pricing::PricedLine {
      price_cents: self.price_cents,
      quantity: self.quantity,
    }
  }
}

async fn load_line_facts(conn: &mut PgConnection, cart_id: Uuid) -> Result<Vec<LineFacts>> {
  let lines = sqlx::query_as::<_, LineFacts>(
    "SELECT ci.product_id, p.category_id, ci.quantity, ci.price_cents, ci.subtotal_cents \
     FROM cart_items ci JOIN products p ON p.id = ci.product_id \
     WHERE ci.cart_id = $1 \
     ORDER BY ci.added_at",
  )
  .bind(cart_id)
  .fetch_all(conn)
  .await?;
  Ok(lines)
}

/// Lock the owner's active cart for the duration of the transaction, so
/// concurrent mutations of the same cart serialize instead of losing updates.
pub(crate) async fn lock_active_cart(conn: &mut PgConnection, owner: &CartOwner) -> Result<Option<Cart>> {
  let cart = match owner {
    CartOwner::User(user_id) => {
      sqlx::query_as::<_, Cart>(&format!(
        "SELECT {} FROM carts WHERE user_id = $1 AND status = 'active' FOR UPDATE",
        CART_COLUMNS
      ))
      .bind(user_id)
      .fetch_optional(conn)
      .await?
    }
    CartOwner::Guest(session_id) => {
      sqlx::query_as::<_, Cart>(&format!(
        "SELECT {} FROM carts WHERE session_id = $1 AND user_id IS NULL AND status = 'active' FOR UPDATE",
        CART_COLUMNS
      ))
      .bind(session_id)
      .fetch_optional(conn)
      .await?
    }
  };
  Ok(cart)
}

async fn create_cart(conn: &mut PgConnection, owner: &CartOwner) -> Result<Cart> {
  let (user_id, session_id) = match owner {
    CartOwner::User(id) => (Some(*id), None),
    CartOwner::Guest(session) => (None, Some(session.clone())),
  };
  let cart = sqlx::query_as::<_, Cart>(&format!(
    "INSERT INTO carts (id, user_id, session_id) VALUES ($1, $2, $3) RETURNING {}",
    CART_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(user_id)
  .bind(session_id)
  .fetch_one(conn)
  .await?;
  Ok(cart)
}

async fn lock_or_create_active_cart(conn: &mut PgConnection, owner: &CartOwner) -> Result<Cart> {
  match lock_active_cart(conn, owner).await? {
    Some(cart) => Ok(cart),
    // A freshly inserted cart is invisible to other transactions until we
    // commit, so no lock is needed on it.
    None => create_cart(conn, owner).await,
  }
}

async fn fetch_items(conn: &mut PgConnection, cart_id: Uuid) -> Result<Vec<CartItem>> {
  let items = sqlx::query_as::<_, CartItem>(&format!(
    "SELECT {} FROM cart_items WHERE cart_id = $1 ORDER BY added_at",
    CART_ITEM_COLUMNS
  ))
  .bind(cart_id)
  .fetch_all(conn)
  .await?;
  Ok(items)
}

/// Recompute subtotal/discount/total from the current lines, re-validating
/// any attached coupon along the way, and persist the result together with
/// the activity timestamp. Returns whether a coupon was detached.
async fn recompute_and_store(conn: &mut PgConnection, cart: &Cart) -> Result<bool> {
  let facts = load_line_facts(conn, cart.id).await?;
  let eligible: Vec<EligibleLine> = facts.iter().map(LineFacts::eligible).collect();
  let priced: Vec<pricing::PricedLine> = facts.iter().map(LineFacts::priced).collect();

  let snapshot: Option<CouponSnapshot> = cart
    .coupon_snapshot
    .as_ref()
    .and_then(|value| serde_json::from_value(value.clone()).ok());

  let (coupon_code, snapshot_json, discount_cents, coupon_dropped) = match snapshot {
    Some(snapshot) => match coupons::revalidate_snapshot(&snapshot, &eligible, cart.shipping_cents) {
      Some(discount) => (
        cart.coupon_code.clone(),
        cart.coupon_snapshot.clone(),
        discount,
        false,
      ),
      None => {
        tracing::info!(cart_id = %cart.id, code = ?cart.coupon_code, "Coupon no longer qualifies after mutation; detaching.");
        (None, None, 0, true)
      }
    },
    None => (None, None, 0, false),
  };

  let totals = pricing::cart_totals(&priced, cart.tax_cents, cart.shipping_cents, discount_cents);

  sqlx::query(
    "UPDATE carts SET subtotal_cents = $2, discount_cents = $3, total_cents = $4, \
       coupon_code = $5, coupon_snapshot = $6, last_activity = now(), updated_at = now() \
     WHERE id = $1",
  )
  .bind(cart.id)
  .bind(totals.subtotal_cents)
  .bind(totals.discount_cents)
  .bind(totals.total_cents)
  .bind(coupon_code)
  .bind(snapshot_json)
  .execute(conn)
  .await?;

  Ok(coupon_dropped)
}

async fn refreshed(pool: &PgPool, cart_id: Uuid, coupon_dropped: bool) -> Result<UpdatedCart> {
  let cart = sqlx::query_as::<_, Cart>(&format!("SELECT {} FROM carts WHERE id = $1", CART_COLUMNS))
    .bind(cart_id)
    .fetch_one(pool)
    .await?;
  let mut conn = pool.acquire().await?;
  let items = fetch_items(&mut conn, cart_id).await?;
  Ok(UpdatedCart {
    cart,
    items,
    coupon_dropped,
  })
}

/// Get the owner's active cart, creating one on first access.
pub async fn get_or_create(pool: &PgPool, owner: &CartOwner) -> Result<UpdatedCart> {
  let mut tx = pool.begin().await?;
  let cart = lock_or_create_active_cart(&mut tx, owner).await?;
  let cart_id = cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, false).await
}

/// Add a product (or variant) to the cart. An identical (product, variant)
/// line is merged by incrementing its quantity and refreshing the captured
/// unit price; the resulting line quantity must still fit in stock.
pub async fn add_item(pool: &PgPool, owner: &CartOwner, item: NewItem) -> Result<UpdatedCart> {
  if item.quantity < 1 {
    return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
  }

  let mut tx = pool.begin().await?;
  let cart = lock_or_create_active_cart(&mut tx, owner).await?;

  let product = sqlx::query_as::<_, Product>(
    "SELECT id, name, sku, description, category_id, price_cents, stock_quantity, created_at, updated_at \
     FROM products WHERE id = $1",
  )
  .bind(item.product_id)
  .fetch_optional(&mut *tx)
  .await?
  .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

  // The variant overrides price and stock when one was chosen.
  let (display_name, unit_price, available, variant_attributes) = match item.variant_id {
    Some(variant_id) => {
      let variant = sqlx::query_as::<_, ProductVariant>(
        "SELECT id, product_id, name, sku, price_cents, stock_quantity, attributes \
         FROM product_variants WHERE id = $1 AND product_id = $2",
      )
      .bind(variant_id)
      .bind(item.product_id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| AppError::NotFound("Product variant not found".to_string()))?;
      (
        format!("{} ({})", product.name, variant.name),
        variant.price_cents,
        variant.stock_quantity,
        Some(variant.attributes),
      )
    }
    None => (product.name.clone(), product.price_cents, product.stock_quantity, None),
  };

  #[derive(sqlx::FromRow)]
  struct ExistingLine {
    id: Uuid,
    quantity: i32,
  }

  let existing = sqlx::query_as::<_, ExistingLine>(
    "SELECT id, quantity FROM cart_items \
     WHERE cart_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3",
  )
  .bind(cart.id)
  .bind(item.product_id)
  .bind(item.variant_id)
  .fetch_optional(&mut *tx)
  .await?;

  let new_quantity = item.quantity + existing.as_ref().map_or(0, |line| line.quantity);
  if available < new_quantity {
    return Err(AppError::Conflict(format!(
      "Insufficient stock for {}: only {} available",
      display_name, available
    )));
  }

  let attributes = item
    .attributes
    .or(variant_attributes)
    .unwrap_or_else(|| serde_json::json!({}));

  match existing {
    Some(line) => {
      sqlx::query(
        "UPDATE cart_items SET quantity = $2, price_cents = $3, subtotal_cents = $4, updated_at = now() \
         WHERE id = $1",
      )
      .bind(line.id)
      .bind(new_quantity)
      .bind(unit_price)
      .bind(pricing::line_subtotal(unit_price, new_quantity))
      .execute(&mut *tx)
      .await?;
    }
    None => {
      sqlx::query(
        "INSERT INTO cart_items (id, cart_id, product_id, variant_id, quantity, price_cents, subtotal_cents, attributes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
      )
      .bind(Uuid::new_v4())
      .bind(cart.id)
      .bind(item.product_id)
      .bind(item.variant_id)
      .bind(new_quantity)
      .bind(unit_price)
      .bind(pricing::line_subtotal(unit_price, new_quantity))
      .bind(attributes)
      .execute(&mut *tx)
      .await?;
    }
  }

  let coupon_dropped = recompute_and_store(&mut tx, &cart).await?;
  let cart_id = cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, coupon_dropped).await
}

/// Change a line's quantity. Zero is rejected here: callers must remove the
/// line instead.
pub async fn update_item(pool: &PgPool, owner: &CartOwner, item_id: Uuid, quantity: i32) -> Result<UpdatedCart> {
  if quantity < 1 {
    return Err(AppError::Validation(
      "Quantity must be at least 1; remove the item instead.".to_string(),
    ));
  }

  let mut tx = pool.begin().await?;
  let cart = lock_active_cart(&mut tx, owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

  #[derive(sqlx::FromRow)]
  struct LineWithStock {
    price_cents: i64,
    stock_quantity: i32,
    display_name: String,
  }

  let line = sqlx::query_as::<_, LineWithStock>(
    "SELECT ci.price_cents, \
            COALESCE(v.stock_quantity, p.stock_quantity) AS stock_quantity, \
            CASE WHEN v.id IS NULL THEN p.name ELSE p.name || ' (' || v.name || ')' END AS display_name \
     FROM cart_items ci \
     JOIN products p ON p.id = ci.product_id \
     LEFT JOIN product_variants v ON v.id = ci.variant_id \
     WHERE ci.id = $1 AND ci.cart_id = $2",
  )
  .bind(item_id)
  .bind(cart.id)
  .fetch_optional(&mut *tx)
  .await?
  .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

  if line.stock_quantity < quantity {
    return Err(AppError::Conflict(format!(
      "Insufficient stock for {}: only {} available",
      line.display_name, line.stock_quantity
    )));
  }

  sqlx::query("UPDATE cart_items SET quantity = $2, subtotal_cents = $3, updated_at = now() WHERE id = $1")
    .bind(item_id)
    .bind(quantity)
    .bind(pricing::line_subtotal(line.price_cents, quantity))
    .execute(&mut *tx)
    .await?;

  let coupon_dropped = recompute_and_store(&mut tx, &cart).await?;
  let cart_id = cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, coupon_dropped).await
}

pub async fn remove_item(pool: &PgPool, owner: &CartOwner, item_id: Uuid) -> Result<UpdatedCart> {
  let mut tx = pool.begin().await?;
  let cart = lock_active_cart(&mut tx, owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

  let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
    .bind(item_id)
    .bind(cart.id)
    .execute(&mut *tx)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Cart item not found".to_string()));
  }

  let coupon_dropped = recompute_and_store(&mut tx, &cart).await?;
  let cart_id = cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, coupon_dropped).await
}

/// Empty the cart: all lines deleted, coupon detached, every monetary field
/// reset to zero.
pub async fn clear(pool: &PgPool, owner: &CartOwner) -> Result<UpdatedCart> {
  let mut tx = pool.begin().await?;
  let cart = lock_active_cart(&mut tx, owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

  sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
    .bind(cart.id)
    .execute(&mut *tx)
    .await?;
  sqlx::query(
    "UPDATE carts SET subtotal_cents = 0, tax_cents = 0, shipping_cents = 0, discount_cents = 0, \
       total_cents = 0, coupon_code = NULL, coupon_snapshot = NULL, last_activity = now(), updated_at = now() \
     WHERE id = $1",
  )
  .bind(cart.id)
  .execute(&mut *tx)
  .await?;

  let cart_id = cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, false).await
}

/// Validate `code` against the cart contents and, on success, store the
/// coupon snapshot and recomputed discount. On failure the cart is left
/// untouched and the rejection reason is surfaced.
pub async fn apply_coupon(pool: &PgPool, owner: &CartOwner, code: &str) -> Result<UpdatedCart> {
  let coupon = coupons::find_by_code(pool, code)
    .await?
    .ok_or_else(|| AppError::NotFound("Invalid or expired coupon".to_string()))?;
  let user_id = match owner {
    CartOwner::User(id) => Some(*id),
    CartOwner::Guest(_) => None,
  };
  let ctx = coupons::redemption_context(pool, user_id, &coupon.code).await?;

  let mut tx = pool.begin().await?;
  let cart = lock_active_cart(&mut tx, owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

  let facts = load_line_facts(&mut tx, cart.id).await?;
  let eligible: Vec<EligibleLine> = facts.iter().map(LineFacts::eligible).collect();

  let applied = coupons::check_coupon(&coupon, &eligible, cart.shipping_cents, &ctx).map_err(AppError::from)?;

  let priced: Vec<pricing::PricedLine> = facts.iter().map(LineFacts::priced).collect();
  let totals = pricing::cart_totals(&priced, cart.tax_cents, cart.shipping_cents, applied.discount_cents);

  sqlx::query(
    "UPDATE carts SET subtotal_cents = $2, discount_cents = $3, total_cents = $4, \
       coupon_code = $5, coupon_snapshot = $6, last_activity = now(), updated_at = now() \
     WHERE id = $1",
  )
  .bind(cart.id)
  .bind(totals.subtotal_cents)
  .bind(totals.discount_cents)
  .bind(totals.total_cents)
  .bind(&applied.snapshot.code)
  .bind(serde_json::to_value(&applied.snapshot).map_err(|e| AppError::Internal(e.to_string()))?)
  .execute(&mut *tx)
  .await?;

  let cart_id = cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, false).await
}

/// Detach the coupon and recompute totals without it.
pub async fn remove_coupon(pool: &PgPool, owner: &CartOwner) -> Result<UpdatedCart> {
  let mut tx = pool.begin().await?;
  let cart = lock_active_cart(&mut tx, owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

  sqlx::query(
    "UPDATE carts SET coupon_code = NULL, coupon_snapshot = NULL, discount_cents = 0, \
       total_cents = subtotal_cents + tax_cents + shipping_cents, last_activity = now(), updated_at = now() \
     WHERE id = $1",
  )
  .bind(cart.id)
  .execute(&mut *tx)
  .await?;

  let cart_id = cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, false).await
}

/// Fold a guest session's cart into the user's cart after sign-in. Guest
/// lines move over, merging into matching (product, variant) lines, and the
/// emptied guest cart is marked `merged`. Stock is not re-checked here;
/// conversion enforces it.
pub async fn merge_guest_cart(pool: &PgPool, session_id: &str, user_id: Uuid) -> Result<UpdatedCart> {
  let mut tx = pool.begin().await?;

  let guest_owner = CartOwner::Guest(session_id.to_string());
  let user_owner = CartOwner::User(user_id);

  let guest_cart = lock_active_cart(&mut tx, &guest_owner).await?;
  let user_cart = lock_or_create_active_cart(&mut tx, &user_owner).await?;

  if let Some(guest_cart) = guest_cart {
    let guest_items = fetch_items(&mut tx, guest_cart.id).await?;
    for item in guest_items {
      let existing: Option<(Uuid, i32)> = sqlx::query_as(
        "SELECT id, quantity FROM cart_items \
         WHERE cart_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3",
      )
      .bind(user_cart.id)
      .bind(item.product_id)
      .bind(item.variant_id)
      .fetch_optional(&mut *tx)
      .await?;

      match existing {
        Some((line_id, quantity)) => {
          let merged = quantity + item.quantity;
          sqlx::query(
            "UPDATE cart_items SET quantity = $2, subtotal_cents = price_cents * $2, updated_at = now() \
             WHERE id = $1",
          )
          .bind(line_id)
          .bind(merged)
          .execute(&mut *tx)
          .await?;
        }
        None => {
          sqlx::query(
            "INSERT INTO cart_items (id, cart_id, product_id, variant_id, quantity, price_cents, subtotal_cents, attributes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
          )
          .bind(Uuid::new_v4())
          .bind(user_cart.id)
          .bind(item.product_id)
          .bind(item.variant_id)
          .bind(item.quantity)
          .bind(item.price_cents)
          .bind(item.subtotal_cents)
          .bind(&item.attributes)
          .execute(&mut *tx)
          .await?;
        }
      }

      sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(item.id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE carts SET status = 'merged', last_activity = now(), updated_at = now() WHERE id = $1")
      .bind(guest_cart.id)
      .execute(&mut *tx)
      .await?;
    tracing::info!(guest_cart_id = %guest_cart.id, user_cart_id = %user_cart.id, "Merged guest cart into user cart.");
  }

  let coupon_dropped = recompute_and_store(&mut tx, &user_cart).await?;
  let cart_id = user_cart.id;
  tx.commit().await?;
  refreshed(pool, cart_id, coupon_dropped).await
}
