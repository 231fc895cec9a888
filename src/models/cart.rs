// src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid; // Renamed Type to SqlxType to avoid conflict

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "cart_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
  Active,
  Merged,
  Converted,
  Abandoned,
}

/// A pre-purchase container of selected items for one customer or guest
/// session. Monetary fields are recomputed on every mutation; the row is
/// frozen once `status` leaves `Active`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cart {
  pub id: Uuid,
  pub user_id: Option<Uuid>,
  pub session_id: Option<String>,
  pub status: CartStatus,
  pub subtotal_cents: i64,
  pub tax_cents: i64,
  pub shipping_cents: i64,
  pub discount_cents: i64,
  // Always subtotal + tax + shipping - discount; never set independently.
  pub total_cents: i64,
  pub coupon_code: Option<String>,
  pub coupon_snapshot: Option<serde_json::Value>,
  pub converted_order_id: Option<Uuid>,
  pub last_activity: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
