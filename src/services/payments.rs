// src/services/payments.rs

//! Payment reconciliation: consumes provider webhook events and moves
//! `Order.payment_status` through its state machine. Reconciliation is
//! idempotent — the unique `transaction_id` is checked under the order's row
//! lock before anything mutates, so a replayed event produces exactly one
//! Payment record and no double transition. Events referencing unknown
//! orders are logged and dropped; they are acknowledged to the provider so
//! it stops retrying.

use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Order, Payment, PaymentStatus};
use crate::services::orders::ORDER_COLUMNS;

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, transaction_id, provider, method, amount_cents, currency, \
   status, details, refund_amount_cents, refunded_at, refund_reason, paid_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventType {
  Succeeded,
  Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMetadata {
  pub order_id: Uuid,
}

/// The provider-agnostic settlement event handed over after the transport
/// layer has verified the request signature.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookEvent {
  pub event_type: WebhookEventType,
  pub transaction_id: String,
  #[serde(default = "default_provider")]
  pub provider: String,
  pub amount_cents: i64,
  #[serde(default = "default_currency")]
  pub currency: String,
  pub metadata: EventMetadata,
  pub failure_message: Option<String>,
}

fn default_provider() -> String {
  "gateway".to_string()
}

fn default_currency() -> String {
  "USD".to_string()
}

/// What reconciliation did with an event. Everything except `Applied` is a
/// deliberate no-op that the caller still acknowledges with 200.
#[derive(Debug)]
pub enum ReconciliationOutcome {
  Applied(Order),
  /// Replay or out-of-order delivery; state already reflects the event.
  Ignored(&'static str),
  UnknownOrder,
}

pub async fn handle_event(pool: &PgPool, event: PaymentWebhookEvent) -> Result<ReconciliationOutcome> {
  match event.event_type {
    WebhookEventType::Succeeded => handle_succeeded(pool, event).await,
    WebhookEventType::Failed => handle_failed(pool, event).await,
  }
}

async fn lock_order(tx: &mut sqlx::PgConnection, order_id: Uuid) -> Result<Option<Order>> {
  let order = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_optional(tx)
    .await?;
  Ok(order)
}

async fn handle_succeeded(pool: &PgPool, event: PaymentWebhookEvent) -> Result<ReconciliationOutcome> {
  let mut tx = pool.begin().await?;

  let order = match lock_order(&mut tx, event.metadata.order_id).await? {
    Some(order) => order,
    None => {
      tracing::warn!(
        order_id = %event.metadata.order_id,
        transaction_id = %event.transaction_id,
        "Payment succeeded event references an unknown order; dropping."
      );
      return Ok(ReconciliationOutcome::UnknownOrder);
    }
  };

  // Idempotency: the transaction id is checked under the order lock, so a
  // concurrent replay serializes behind us and sees the record we insert.
  let seen: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM payments WHERE transaction_id = $1)")
    .bind(&event.transaction_id)
    .fetch_one(&mut *tx)
    .await?;
  if seen {
    tracing::info!(transaction_id = %event.transaction_id, "Duplicate payment succeeded event; ignoring.");
    return Ok(ReconciliationOutcome::Ignored("transaction already recorded"));
  }
  if !order.payment_status.can_become(PaymentStatus::Paid) {
    tracing::info!(
      order_id = %order.id,
      payment_status = ?order.payment_status,
      "Order cannot move to paid from its current payment state; ignoring event."
    );
    return Ok(ReconciliationOutcome::Ignored("payment state already settled"));
  }

  let details = json!({
    "transaction_id": event.transaction_id,
    "provider": event.provider,
    "amount_cents": event.amount_cents,
    "currency": event.currency,
  });

  // Mark paid and advance a still-pending order into fulfilment.
  let updated = sqlx::query_as::<_, Order>(&format!(
    "UPDATE orders SET payment_status = 'paid', payment_details = $2, \
       status = CASE WHEN status = 'pending' THEN 'processing'::order_status_enum ELSE status END, \
       updated_at = now() \
     WHERE id = $1 RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order.id)
  .bind(&details)
  .fetch_one(&mut *tx)
  .await?;

  let payment = sqlx::query_as::<_, Payment>(&format!(
    "INSERT INTO payments (id, order_id, user_id, transaction_id, provider, method, amount_cents, currency, \
       status, details) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed', $9) \
     RETURNING {}",
    PAYMENT_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(order.id)
  .bind(order.user_id)
  .bind(&event.transaction_id)
  .bind(&event.provider)
  .bind(&order.payment_method)
  .bind(event.amount_cents)
  .bind(&event.currency)
  .bind(&details)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;
  tracing::info!(
    order_id = %updated.id,
    payment_id = %payment.id,
    transaction_id = %event.transaction_id,
    "Payment reconciled as paid."
  );
  Ok(ReconciliationOutcome::Applied(updated))
}

async fn handle_failed(pool: &PgPool, event: PaymentWebhookEvent) -> Result<ReconciliationOutcome> {
  let mut tx = pool.begin().await?;

  let order = match lock_order(&mut tx, event.metadata.order_id).await? {
    Some(order) => order,
    None => {
      tracing::warn!(
        order_id = %event.metadata.order_id,
        transaction_id = %event.transaction_id,
        "Payment failed event references an unknown order; dropping."
      );
      return Ok(ReconciliationOutcome::UnknownOrder);
    }
  };

  if !order.payment_status.can_become(PaymentStatus::Failed) {
    // Covers replays (already failed) and out-of-order delivery after a
    // success already reconciled.
    tracing::info!(
      order_id = %order.id,
      payment_status = ?order.payment_status,
      "Ignoring payment failed event for already-settled order."
    );
    return Ok(ReconciliationOutcome::Ignored("payment state already settled"));
  }

  let details = json!({
    "transaction_id": event.transaction_id,
    "provider": event.provider,
    "amount_cents": event.amount_cents,
    "currency": event.currency,
    "failure_message": event.failure_message,
  });

  // Order status is left untouched: a failed settlement attempt does not
  // move fulfilment.
  let updated = sqlx::query_as::<_, Order>(&format!(
    "UPDATE orders SET payment_status = 'failed', payment_details = $2, updated_at = now() \
     WHERE id = $1 RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order.id)
  .bind(&details)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;
  tracing::info!(order_id = %updated.id, reason = ?event.failure_message, "Payment reconciled as failed.");
  Ok(ReconciliationOutcome::Applied(updated))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn succeeded_event_parses_with_metadata_order_id() {
    let payload = r#"{
      "event_type": "succeeded",
      "transaction_id": "pi_3XYZ",
      "provider": "stripe",
      "amount_cents": 20300,
      "currency": "usd",
      "metadata": { "order_id": "8f14e45f-ceea-4f21-ae10-cc891f0a2b6d" }
    }"#;
    let event: PaymentWebhookEvent = serde_json::from_str(payload).unwrap();
    assert_eq!(event.event_type, WebhookEventType::Succeeded);
    assert_eq!(event.transaction_id, "pi_3XYZ");
    assert_eq!(
      event.metadata.order_id,
      Uuid::parse_str("8f14e45f-ceea-4f21-ae10-cc891f0a2b6d").unwrap()
    );
    assert!(event.failure_message.is_none());
  }

  #[test]
  fn failed_event_carries_the_failure_message() {
    let payload = r#"{
      "event_type": "failed",
      "transaction_id": "pi_3ABC",
      "amount_cents": 5000,
      "metadata": { "order_id": "8f14e45f-ceea-4f21-ae10-cc891f0a2b6d" },
      "failure_message": "card_declined"
    }"#;
    let event: PaymentWebhookEvent = serde_json::from_str(payload).unwrap();
    assert_eq!(event.event_type, WebhookEventType::Failed);
    assert_eq!(event.failure_message.as_deref(), Some("card_declined"));
    // Omitted fields fall back to defaults.
    assert_eq!(event.provider, "gateway");
    assert_eq!(event.currency, "USD");
  }

  #[test]
  fn unknown_event_types_are_rejected_at_parse_time() {
    let payload = r#"{
      "event_type": "chargeback",
      "transaction_id": "pi_3ABC",
      "amount_cents": 5000,
      "metadata": { "order_id": "8f14e45f-ceea-4f21-ae10-cc891f0a2b6d" }
    }"#;
    assert!(serde_json::from_str::<PaymentWebhookEvent>(payload).is_err());
  }
}
