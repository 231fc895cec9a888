// src/pricing.rs

//! Pure cart arithmetic. Everything here is side-effect free and recomputed
//! from scratch on each call, so the lifecycle manager can invoke it after
//! every mutation without ordering concerns.
//!
//! All amounts are integer cents; percentage discounts truncate toward zero.

use crate::models::DiscountType;

/// The inputs the calculator needs from one cart line.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
  pub price_cents: i64,
  pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
  pub subtotal_cents: i64,
  pub discount_cents: i64,
  pub total_cents: i64,
}

/// A discount decision produced by the coupon validator, reduced to the
/// terms the calculator needs.
#[derive(Debug, Clone, Copy)]
pub struct DiscountTerms {
  pub discount_type: DiscountType,
  pub discount_value: i64,
  pub maximum_discount_cents: Option<i64>,
}

pub fn line_subtotal(price_cents: i64, quantity: i32) -> i64 {
  price_cents * i64::from(quantity)
}

pub fn cart_subtotal(lines: &[PricedLine]) -> i64 {
  lines.iter().map(|l| line_subtotal(l.price_cents, l.quantity)).sum()
}

/// Discount amount for `terms` against a discount base.
///
/// `base_cents` is the eligible subtotal (the full cart subtotal unless the
/// coupon restricts it to eligible lines). Percentage and fixed discounts are
/// clamped to `maximum_discount_cents` when set and then to the base, so the
/// resulting total can never go negative. Free-shipping discounts equal the
/// shipping charge and are clamped only by the cap.
pub fn discount_amount(terms: &DiscountTerms, base_cents: i64, shipping_cents: i64) -> i64 {
  let raw = match terms.discount_type {
    DiscountType::Percentage => base_cents * terms.discount_value / 100,
    DiscountType::Fixed => terms.discount_value,
    DiscountType::FreeShipping => shipping_cents,
  };
  let capped = match terms.maximum_discount_cents {
    Some(cap) => raw.min(cap),
    None => raw,
  };
  match terms.discount_type {
    DiscountType::FreeShipping => capped.max(0),
    _ => capped.clamp(0, base_cents),
  }
}

pub fn total_cents(subtotal_cents: i64, tax_cents: i64, shipping_cents: i64, discount_cents: i64) -> i64 {
  subtotal_cents + tax_cents + shipping_cents - discount_cents
}

/// Recompute all cart totals from the lines and an already-decided discount
/// amount (zero when no coupon is attached). The discount is decided
/// separately because its base may be a restricted subset of the lines.
pub fn cart_totals(lines: &[PricedLine], tax_cents: i64, shipping_cents: i64, discount_cents: i64) -> CartTotals {
  let subtotal_cents = cart_subtotal(lines);
  CartTotals {
    subtotal_cents,
    discount_cents,
    total_cents: total_cents(subtotal_cents, tax_cents, shipping_cents, discount_cents),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lines(pairs: &[(i64, i32)]) -> Vec<PricedLine> {
    pairs
      .iter()
      .map(|&(price_cents, quantity)| PricedLine { price_cents, quantity })
      .collect()
  }

  fn percentage(value: i64, cap: Option<i64>) -> DiscountTerms {
    DiscountTerms {
      discount_type: DiscountType::Percentage,
      discount_value: value,
      maximum_discount_cents: cap,
    }
  }

  fn fixed(value: i64, cap: Option<i64>) -> DiscountTerms {
    DiscountTerms {
      discount_type: DiscountType::Fixed,
      discount_value: value,
      maximum_discount_cents: cap,
    }
  }

  #[test]
  fn subtotal_sums_price_times_quantity() {
    let lines = lines(&[(1999, 2), (550, 3)]);
    assert_eq!(cart_subtotal(&lines), 1999 * 2 + 550 * 3);
    assert_eq!(cart_subtotal(&[]), 0);
  }

  #[test]
  fn twenty_percent_off_two_hundred_dollars() {
    // Cart subtotal $200, SAVE20 = 20% off, no cap.
    let lines = lines(&[(10_000, 2)]);
    let discount = discount_amount(&percentage(20, None), cart_subtotal(&lines), 500);
    let totals = cart_totals(&lines, 300, 500, discount);
    assert_eq!(totals.subtotal_cents, 20_000);
    assert_eq!(totals.discount_cents, 4_000);
    assert_eq!(totals.total_cents, 20_000 + 300 + 500 - 4_000);
  }

  #[test]
  fn percentage_discount_clamped_to_cap() {
    let d = discount_amount(&percentage(50, Some(1_000)), 20_000, 0);
    assert_eq!(d, 1_000);
    // Below the cap the raw value wins.
    let d = discount_amount(&percentage(5, Some(1_000)), 20_000, 0);
    assert_eq!(d, 1_000.min(20_000 * 5 / 100));
  }

  #[test]
  fn percentage_never_exceeds_min_of_raw_and_cap() {
    for value in [1, 10, 33, 99] {
      for cap in [1, 500, 10_000] {
        let d = discount_amount(&percentage(value, Some(cap)), 12_345, 0);
        assert!(d <= (12_345 * value / 100).min(cap));
      }
    }
  }

  #[test]
  fn fixed_discount_clamped_to_subtotal() {
    // A $50 coupon on a $30 cart discounts $30, not $50.
    let d = discount_amount(&fixed(5_000, None), 3_000, 0);
    assert_eq!(d, 3_000);
    let totals = cart_totals(&lines(&[(3_000, 1)]), 0, 0, d);
    assert_eq!(totals.total_cents, 0);
  }

  #[test]
  fn fixed_discount_respects_cap() {
    let d = discount_amount(&fixed(5_000, Some(2_000)), 10_000, 0);
    assert_eq!(d, 2_000);
  }

  #[test]
  fn free_shipping_discounts_the_shipping_charge() {
    let d = discount_amount(
      &DiscountTerms {
        discount_type: DiscountType::FreeShipping,
        discount_value: 0,
        maximum_discount_cents: None,
      },
      500,
      1_200,
    );
    assert_eq!(d, 1_200);
    // Shipping may exceed the item subtotal without the total going negative.
    let totals = cart_totals(&lines(&[(500, 1)]), 0, 1_200, d);
    assert_eq!(totals.total_cents, 500);
  }

  #[test]
  fn percentage_division_truncates() {
    // 3% of $1.01 is 3.03 cents; integer math keeps 3.
    let d = discount_amount(&percentage(3, None), 101, 0);
    assert_eq!(d, 3);
  }

  #[test]
  fn totals_identity_holds_for_every_recomputation() {
    let cases = [
      (vec![(1999i64, 2i32), (550, 3)], 120i64, 499i64, Some(percentage(10, None))),
      (vec![(10_000, 1)], 0, 0, Some(fixed(2_500, Some(2_000)))),
      (vec![(75, 4)], 30, 0, None),
      (vec![], 0, 0, None),
    ];
    for (pairs, tax, shipping, terms) in cases {
      let lines = lines(&pairs);
      let discount = terms
        .as_ref()
        .map(|t| discount_amount(t, cart_subtotal(&lines), shipping))
        .unwrap_or(0);
      let totals = cart_totals(&lines, tax, shipping, discount);
      assert_eq!(
        totals.total_cents,
        totals.subtotal_cents + tax + shipping - totals.discount_cents
      );
      // Idempotent: same inputs, same outputs.
      assert_eq!(totals, cart_totals(&lines, tax, shipping, discount));
    }
  }
}
