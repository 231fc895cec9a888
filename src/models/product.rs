// src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// Catalog rows are owned by the catalog service; this service reads
// names/prices for snapshots and adjusts stock counts at checkout/cancel.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub sku: String,
  pub description: Option<String>,
  pub category_id: Option<Uuid>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A purchasable configuration of a product (e.g. size/colour) with its own
/// stock and price override.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductVariant {
  pub id: Uuid,
  pub product_id: Uuid,
  pub name: String,
  pub sku: String,
  pub price_cents: i64,
  pub stock_quantity: i32,
  pub attributes: serde_json::Value,
}
