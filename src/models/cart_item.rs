// src/models/cart_item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub quantity: i32,
  // Unit price captured when the line was added; refreshed when the same
  // (product, variant) is added again.
  pub price_cents: i64,
  pub subtotal_cents: i64,
  pub attributes: serde_json::Value,
  pub added_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
