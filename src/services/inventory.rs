// src/services/inventory.rs

//! Stock reservation ledger. Both operations are single conditional UPDATEs
//! so concurrent checkouts cannot oversell: the decrement only applies when
//! enough stock remains, and the caller aborts (rolling back its transaction,
//! and with it any decrements already applied for the same order) when a line
//! fails. They take a bare connection so they compose with the caller's
//! transaction.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::errors::Result;

/// What a cart line reserves stock against: the variant when one was chosen,
/// otherwise the product itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTarget {
  Product(Uuid),
  Variant(Uuid),
}

impl StockTarget {
  pub fn for_line(product_id: Uuid, variant_id: Option<Uuid>) -> Self {
    match variant_id {
      Some(id) => StockTarget::Variant(id),
      None => StockTarget::Product(product_id),
    }
  }

  fn table(self) -> &'static str {
    match self {
      StockTarget::Product(_) => "products",
      StockTarget::Variant(_) => "product_variants",
    }
  }

  fn id(self) -> Uuid {
    match self {
      StockTarget::Product(id) | StockTarget::Variant(id) => id,
    }
  }
}

/// Atomically decrement stock by `quantity`. Returns `false` when the row is
/// missing or the decrement would drive stock negative; nothing is changed in
/// that case.
pub async fn reserve(conn: &mut PgConnection, target: StockTarget, quantity: i32) -> Result<bool> {
  let result = sqlx::query(&format!(
    "UPDATE {} SET stock_quantity = stock_quantity - $1 WHERE id = $2 AND stock_quantity >= $1",
    target.table()
  ))
  .bind(quantity)
  .bind(target.id())
  .execute(conn)
  .await?;
  Ok(result.rows_affected() == 1)
}

/// Return `quantity` units to stock (cancellation/refund). No upper bound:
/// whether the restored count exceeds some catalog maximum is the catalog's
/// concern, not the ledger's.
pub async fn release(conn: &mut PgConnection, target: StockTarget, quantity: i32) -> Result<()> {
  let result = sqlx::query(&format!(
    "UPDATE {} SET stock_quantity = stock_quantity + $1 WHERE id = $2",
    target.table()
  ))
  .bind(quantity)
  .bind(target.id())
  .execute(conn)
  .await?;
  if result.rows_affected() == 0 {
    // The catalog row was deleted since the order was placed; nothing to
    // restore onto. Logged rather than failing the cancellation.
    tracing::warn!(target = ?target, quantity, "Stock release target no longer exists; skipping restore.");
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lines_reserve_against_the_variant_when_one_was_chosen() {
    let product = Uuid::new_v4();
    let variant = Uuid::new_v4();
    assert_eq!(
      StockTarget::for_line(product, Some(variant)),
      StockTarget::Variant(variant)
    );
    assert_eq!(StockTarget::for_line(product, None), StockTarget::Product(product));
  }
}
