// src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_state_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
  Pending,
  Completed,
  Failed,
  Refunded,
  PartiallyRefunded,
}

/// One settlement attempt against an order. `transaction_id` is unique and
/// doubles as the webhook idempotency key.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
  pub id: Uuid,
  pub order_id: Uuid,
  pub user_id: Option<Uuid>,
  pub transaction_id: String,
  pub provider: String,
  pub method: String,
  pub amount_cents: i64,
  pub currency: String,
  pub status: PaymentState,
  pub details: Option<serde_json::Value>,
  pub refund_amount_cents: Option<i64>,
  pub refunded_at: Option<DateTime<Utc>>,
  pub refund_reason: Option<String>,
  pub paid_at: DateTime<Utc>,
}
