// src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid; // Renamed Type to SqlxType to avoid conflict

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
  OnHold,
  Completed,
}

impl OrderStatus {
  // Position in the forward fulfilment progression. OnHold sits beside
  // Processing; Cancelled/Refunded are outside the progression entirely.
  fn rank(self) -> Option<u8> {
    match self {
      OrderStatus::Pending => Some(0),
      OrderStatus::Processing | OrderStatus::OnHold => Some(1),
      OrderStatus::Shipped => Some(2),
      OrderStatus::Delivered => Some(3),
      OrderStatus::Completed => Some(4),
      OrderStatus::Cancelled | OrderStatus::Refunded => None,
    }
  }

  /// Whether an admin status update from `self` to `next` is allowed.
  ///
  /// Fulfilment only moves forward (with OnHold as a sideways parking state
  /// next to Processing). Cancelled and Refunded are never reachable through
  /// a plain status update; they are set by the cancellation/refund flow,
  /// which also restores stock and reverses payment state.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    if self == next {
      return false;
    }
    match (self.rank(), next.rank()) {
      (Some(from), Some(to)) => {
        // OnHold <-> Processing share a rank and may swap; everything else
        // must strictly advance.
        to > from || (from == to && (self == OrderStatus::OnHold || next == OrderStatus::OnHold))
      }
      _ => false,
    }
  }

  /// Cancellation is reachable from any state that is not already terminal
  /// for cancellation purposes.
  pub fn is_cancellable(self) -> bool {
    !matches!(
      self,
      OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
      OrderStatus::OnHold => "on_hold",
      OrderStatus::Completed => "completed",
    }
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Refunded,
}

impl PaymentStatus {
  /// Settlement state machine: pending -> {paid, failed}; paid -> refunded
  /// (only via the cancellation/refund flow). A failed payment may still be
  /// retried by the provider, so failed -> paid stays open.
  pub fn can_become(self, next: PaymentStatus) -> bool {
    matches!(
      (self, next),
      (PaymentStatus::Pending, PaymentStatus::Paid)
        | (PaymentStatus::Pending, PaymentStatus::Failed)
        | (PaymentStatus::Failed, PaymentStatus::Paid)
        | (PaymentStatus::Paid, PaymentStatus::Refunded)
    )
  }
}

/// An immutable record of a completed checkout. Monetary fields are a frozen
/// copy of the cart at conversion time; later coupon or catalog edits never
/// reach existing orders.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub order_number: String,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment_method: String,
  pub payment_details: Option<serde_json::Value>,
  pub subtotal_cents: i64,
  pub tax_cents: i64,
  pub shipping_cents: i64,
  pub discount_cents: i64,
  pub total_cents: i64,
  pub coupon_code: Option<String>,
  pub shipping_address_id: Uuid,
  pub billing_address_id: Uuid,
  pub notes: Option<String>,
  pub tracking_number: Option<String>,
  pub shipping_carrier: Option<String>,
  pub shipped_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub cancellation_reason: Option<String>,
  pub refunded_at: Option<DateTime<Utc>>,
  pub refund_amount_cents: Option<i64>,
  pub refund_reason: Option<String>,
  pub order_date: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fulfilment_only_moves_forward() {
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
    assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
    assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Completed));
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));

    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
    assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Processing));
  }

  #[test]
  fn on_hold_swaps_with_processing() {
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::OnHold));
    assert!(OrderStatus::Processing.can_transition_to(OrderStatus::OnHold));
    assert!(OrderStatus::OnHold.can_transition_to(OrderStatus::Processing));
    assert!(OrderStatus::OnHold.can_transition_to(OrderStatus::Shipped));
  }

  #[test]
  fn cancelled_and_refunded_unreachable_by_status_update() {
    for from in [
      OrderStatus::Pending,
      OrderStatus::Processing,
      OrderStatus::Shipped,
      OrderStatus::OnHold,
    ] {
      assert!(!from.can_transition_to(OrderStatus::Cancelled));
      assert!(!from.can_transition_to(OrderStatus::Refunded));
    }
    assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
    assert!(!OrderStatus::Refunded.can_transition_to(OrderStatus::Pending));
  }

  #[test]
  fn cancellable_states_exclude_terminal_ones() {
    assert!(OrderStatus::Pending.is_cancellable());
    assert!(OrderStatus::Processing.is_cancellable());
    assert!(OrderStatus::Shipped.is_cancellable());
    assert!(OrderStatus::OnHold.is_cancellable());

    assert!(!OrderStatus::Delivered.is_cancellable());
    assert!(!OrderStatus::Cancelled.is_cancellable());
    assert!(!OrderStatus::Refunded.is_cancellable());
  }

  #[test]
  fn payment_status_transitions() {
    assert!(PaymentStatus::Pending.can_become(PaymentStatus::Paid));
    assert!(PaymentStatus::Pending.can_become(PaymentStatus::Failed));
    assert!(PaymentStatus::Failed.can_become(PaymentStatus::Paid));
    assert!(PaymentStatus::Paid.can_become(PaymentStatus::Refunded));

    assert!(!PaymentStatus::Paid.can_become(PaymentStatus::Paid));
    assert!(!PaymentStatus::Paid.can_become(PaymentStatus::Failed));
    assert!(!PaymentStatus::Refunded.can_become(PaymentStatus::Paid));
    assert!(!PaymentStatus::Pending.can_become(PaymentStatus::Refunded));
  }
}
