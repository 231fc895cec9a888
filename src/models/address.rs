// src/models/address.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// Addresses are managed elsewhere; checkout only verifies ownership and
// stores the references on the order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Address {
  pub id: Uuid,
  pub user_id: Uuid,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub postal_code: String,
  pub country: String,
}
