// src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-line snapshot of the purchased product at conversion time. Name, SKU,
/// price and attributes are copied from the live catalog so that historical
/// orders stay stable under later catalog edits.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub name: String,
  pub sku: String,
  pub price_cents: i64,
  pub quantity: i32,
  pub subtotal_cents: i64,
  pub discount_cents: i64,
  pub tax_cents: i64,
  pub total_cents: i64,
  pub attributes: serde_json::Value,
}
