// src/services/coupons.rs

//! Coupon validation and admin management.
//!
//! The validation core (`check_coupon*`, `eligible_base`, `revalidate_snapshot`)
//! is pure: it takes the coupon row, the cart lines and a redemption context
//! and returns either an applied-discount decision or a typed rejection. The
//! cart lifecycle manager is responsible for calling it again after every
//! mutation; nothing here re-validates on its own.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Coupon, CouponSnapshot, DiscountType};
use crate::pricing::{self, DiscountTerms};

/// What the validator needs to know about one cart line.
#[derive(Debug, Clone, Copy)]
pub struct EligibleLine {
  pub product_id: Uuid,
  pub category_id: Option<Uuid>,
  pub subtotal_cents: i64,
}

/// Customer-side facts gathered before validation.
#[derive(Debug, Clone, Copy)]
pub struct RedemptionContext {
  pub now: DateTime<Utc>,
  /// Orders the customer has placed before (for first-order coupons).
  pub prior_order_count: i64,
  /// Orders the customer has already placed with this coupon code.
  pub redemptions_by_user: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
  #[error("Invalid or expired coupon")]
  InvalidOrExpired,
  #[error("Coupon usage limit reached")]
  UsageLimitReached,
  #[error("Minimum spend of {} required for this coupon", format_cents(.required_cents))]
  MinimumSpendNotMet { required_cents: i64 },
  #[error("Coupon is for first-time customers only")]
  FirstOrderOnly,
  #[error("Coupon usage limit for this customer reached")]
  PerUserLimitReached,
  #[error("Cannot apply coupon to empty cart")]
  EmptyCart,
  #[error("Coupon does not apply to any item in the cart")]
  NoEligibleItems,
}

fn format_cents(cents: &i64) -> String {
  format!("${:.2}", *cents as f64 / 100.0)
}

impl From<CouponRejection> for AppError {
  fn from(rejection: CouponRejection) -> Self {
    match rejection {
      // Applying to an empty cart is a caller mistake, not a conflict with
      // coupon state.
      CouponRejection::EmptyCart => AppError::Validation(rejection.to_string()),
      other => AppError::Conflict(other.to_string()),
    }
  }
}

/// A successful validation: the frozen terms plus the discount computed
/// against the eligible base.
#[derive(Debug, Clone)]
pub struct AppliedCoupon {
  pub snapshot: CouponSnapshot,
  pub eligible_base_cents: i64,
  pub discount_cents: i64,
}

fn in_window(coupon: &Coupon, now: DateTime<Utc>) -> bool {
  now >= coupon.starts_at && coupon.ends_at.map_or(true, |end| now <= end)
}

fn list_allows(allow: &Option<Vec<Uuid>>, deny: &Option<Vec<Uuid>>, id: Option<Uuid>) -> bool {
  if let Some(deny) = deny {
    if id.is_some_and(|id| deny.contains(&id)) {
      return false;
    }
  }
  match allow {
    Some(allow) if !allow.is_empty() => id.is_some_and(|id| allow.contains(&id)),
    _ => true,
  }
}

/// Sum of the lines a snapshot's inclusion/exclusion lists let the discount
/// apply to. The lists restrict the discount base, not whether the coupon can
/// be applied at all.
pub fn eligible_base(snapshot: &CouponSnapshot, lines: &[EligibleLine]) -> i64 {
  lines
    .iter()
    .filter(|line| {
      list_allows(&snapshot.applicable_products, &snapshot.excluded_products, Some(line.product_id))
        && list_allows(&snapshot.applicable_categories, &snapshot.excluded_categories, line.category_id)
    })
    .map(|line| line.subtotal_cents)
    .sum()
}

fn discount_terms(snapshot: &CouponSnapshot) -> DiscountTerms {
  DiscountTerms {
    discount_type: snapshot.discount_type,
    discount_value: snapshot.discount_value,
    maximum_discount_cents: snapshot.maximum_discount_cents,
  }
}

// Checks shared by cart application and the stand-alone pre-checkout
// endpoint. First failing check wins.
fn check_redemption_rules(coupon: &Coupon, subtotal_cents: i64, ctx: &RedemptionContext) -> Result<(), CouponRejection> {
  if !coupon.is_active || !in_window(coupon, ctx.now) {
    return Err(CouponRejection::InvalidOrExpired);
  }
  if let Some(limit) = coupon.usage_limit {
    if coupon.used_count >= limit {
      return Err(CouponRejection::UsageLimitReached);
    }
  }
  if let Some(min) = coupon.minimum_spend_cents {
    if subtotal_cents < min {
      return Err(CouponRejection::MinimumSpendNotMet { required_cents: min });
    }
  }
  if coupon.first_order_only && ctx.prior_order_count > 0 {
    return Err(CouponRejection::FirstOrderOnly);
  }
  if let Some(limit) = coupon.usage_limit_per_user {
    if ctx.redemptions_by_user >= i64::from(limit) {
      return Err(CouponRejection::PerUserLimitReached);
    }
  }
  Ok(())
}

/// Full validation against a cart's lines. Applying to an empty cart is
/// rejected outright; the minimum-spend check runs against the whole cart
/// subtotal while the discount itself is computed on the eligible base.
pub fn check_coupon(
  coupon: &Coupon,
  lines: &[EligibleLine],
  shipping_cents: i64,
  ctx: &RedemptionContext,
) -> Result<AppliedCoupon, CouponRejection> {
  if lines.is_empty() {
    return Err(CouponRejection::EmptyCart);
  }
  let subtotal_cents: i64 = lines.iter().map(|l| l.subtotal_cents).sum();
  check_redemption_rules(coupon, subtotal_cents, ctx)?;

  let snapshot = CouponSnapshot::from_coupon(coupon);
  let base = eligible_base(&snapshot, lines);
  if base == 0 && coupon.discount_type != DiscountType::FreeShipping {
    return Err(CouponRejection::NoEligibleItems);
  }
  let discount_cents = pricing::discount_amount(&discount_terms(&snapshot), base, shipping_cents);
  Ok(AppliedCoupon {
    snapshot,
    eligible_base_cents: base,
    discount_cents,
  })
}

/// Stand-alone pre-checkout check against a bare cart total. Without line
/// detail the inclusion/exclusion lists cannot be evaluated, so the whole
/// total is used as the discount base; the authoritative list-aware result
/// comes from applying the coupon to the cart.
pub fn check_coupon_for_total(
  coupon: &Coupon,
  cart_total_cents: i64,
  ctx: &RedemptionContext,
) -> Result<AppliedCoupon, CouponRejection> {
  check_redemption_rules(coupon, cart_total_cents, ctx)?;
  let snapshot = CouponSnapshot::from_coupon(coupon);
  let discount_cents = pricing::discount_amount(&discount_terms(&snapshot), cart_total_cents, 0);
  Ok(AppliedCoupon {
    snapshot,
    eligible_base_cents: cart_total_cents,
    discount_cents,
  })
}

/// Re-check an already-applied snapshot after a cart mutation. Only the
/// content-dependent rules are re-evaluated (minimum spend, eligible base);
/// window/usage rules were checked at apply time and are enforced again at
/// redemption. Returns the recomputed discount, or `None` when the coupon no
/// longer qualifies and must be detached.
pub fn revalidate_snapshot(snapshot: &CouponSnapshot, lines: &[EligibleLine], shipping_cents: i64) -> Option<i64> {
  if lines.is_empty() {
    return None;
  }
  let subtotal_cents: i64 = lines.iter().map(|l| l.subtotal_cents).sum();
  if let Some(min) = snapshot.minimum_spend_cents {
    if subtotal_cents < min {
      return None;
    }
  }
  let base = eligible_base(snapshot, lines);
  if base == 0 && snapshot.discount_type != DiscountType::FreeShipping {
    return None;
  }
  Some(pricing::discount_amount(&discount_terms(snapshot), base, shipping_cents))
}

// --- Persistence shell -----------------------------------------------------

const COUPON_COLUMNS: &str = "id, code, description, discount_type, discount_value, minimum_spend_cents, \
   maximum_discount_cents, starts_at, ends_at, is_active, usage_limit, usage_limit_per_user, used_count, \
   applicable_products, excluded_products, applicable_categories, excluded_categories, \
   first_order_only, individual_use, created_at, updated_at";

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Coupon>> {
  let coupon = sqlx::query_as::<_, Coupon>(&format!("SELECT {} FROM coupons WHERE code = $1", COUPON_COLUMNS))
    .bind(code)
    .fetch_optional(pool)
    .await?;
  Ok(coupon)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Coupon>> {
  let coupon = sqlx::query_as::<_, Coupon>(&format!("SELECT {} FROM coupons WHERE id = $1", COUPON_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(coupon)
}

/// Gather the customer-side facts `check_coupon` needs.
pub async fn redemption_context(pool: &PgPool, user_id: Option<Uuid>, code: &str) -> Result<RedemptionContext> {
  let (prior_order_count, redemptions_by_user) = match user_id {
    Some(user_id) => {
      let prior: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
      let redeemed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1 AND coupon_code = $2")
        .bind(user_id)
        .bind(code)
        .fetch_one(pool)
        .await?;
      (prior, redeemed)
    }
    // Guest carts have no order history to count against.
    None => (0, 0),
  };
  Ok(RedemptionContext {
    now: Utc::now(),
    prior_order_count,
    redemptions_by_user,
  })
}

/// Count one redemption at order conversion. The WHERE clause enforces the
/// usage cap atomically: zero rows affected means the coupon was exhausted
/// (or deactivated) since it was applied to the cart.
pub async fn redeem_by_code(conn: &mut PgConnection, code: &str) -> Result<bool> {
  let result = sqlx::query(
    "UPDATE coupons SET used_count = used_count + 1, updated_at = now() \
     WHERE code = $1 AND is_active AND (usage_limit IS NULL OR used_count < usage_limit)",
  )
  .bind(code)
  .execute(conn)
  .await?;
  Ok(result.rows_affected() == 1)
}

// --- Admin CRUD ------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CouponInput {
  pub code: String,
  pub description: Option<String>,
  pub discount_type: DiscountType,
  pub discount_value: i64,
  pub minimum_spend_cents: Option<i64>,
  pub maximum_discount_cents: Option<i64>,
  pub starts_at: Option<DateTime<Utc>>,
  pub ends_at: Option<DateTime<Utc>>,
  #[serde(default = "default_true")]
  pub is_active: bool,
  pub usage_limit: Option<i32>,
  pub usage_limit_per_user: Option<i32>,
  pub applicable_products: Option<Vec<Uuid>>,
  pub excluded_products: Option<Vec<Uuid>>,
  pub applicable_categories: Option<Vec<Uuid>>,
  pub excluded_categories: Option<Vec<Uuid>>,
  #[serde(default)]
  pub first_order_only: bool,
  #[serde(default)]
  pub individual_use: bool,
}

fn default_true() -> bool {
  true
}

/// Bounds checks on admin input, shared by create and update.
pub fn validate_input(input: &CouponInput) -> Result<()> {
  if input.code.trim().is_empty() {
    return Err(AppError::Validation("Coupon code is required".to_string()));
  }
  match input.discount_type {
    DiscountType::Percentage => {
      if input.discount_value <= 0 || input.discount_value > 100 {
        return Err(AppError::Validation(
          "Percentage discount must be between 0 and 100".to_string(),
        ));
      }
    }
    DiscountType::Fixed => {
      if input.discount_value <= 0 {
        return Err(AppError::Validation("Fixed discount must be greater than 0".to_string()));
      }
    }
    DiscountType::FreeShipping => {}
  }
  if input.minimum_spend_cents.is_some_and(|v| v < 0) || input.maximum_discount_cents.is_some_and(|v| v < 0) {
    return Err(AppError::Validation("Discount bounds must not be negative".to_string()));
  }
  if let (Some(start), Some(end)) = (input.starts_at, input.ends_at) {
    if end <= start {
      return Err(AppError::Validation("Coupon end date must be after its start date".to_string()));
    }
  }
  Ok(())
}

pub async fn create(pool: &PgPool, input: CouponInput) -> Result<Coupon> {
  validate_input(&input)?;

  if find_by_code(pool, &input.code).await?.is_some() {
    return Err(AppError::Conflict("Coupon code already exists".to_string()));
  }

  let coupon = sqlx::query_as::<_, Coupon>(&format!(
    "INSERT INTO coupons (id, code, description, discount_type, discount_value, minimum_spend_cents, \
       maximum_discount_cents, starts_at, ends_at, is_active, usage_limit, usage_limit_per_user, used_count, \
       applicable_products, excluded_products, applicable_categories, excluded_categories, \
       first_order_only, individual_use) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, $13, $14, $15, $16, $17, $18) \
     RETURNING {}",
    COUPON_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(input.code.trim())
  .bind(&input.description)
  .bind(input.discount_type)
  .bind(input.discount_value)
  .bind(input.minimum_spend_cents)
  .bind(input.maximum_discount_cents)
  .bind(input.starts_at.unwrap_or_else(Utc::now))
  .bind(input.ends_at)
  .bind(input.is_active)
  .bind(input.usage_limit)
  .bind(input.usage_limit_per_user)
  .bind(&input.applicable_products)
  .bind(&input.excluded_products)
  .bind(&input.applicable_categories)
  .bind(&input.excluded_categories)
  .bind(input.first_order_only)
  .bind(input.individual_use)
  .fetch_one(pool)
  .await?;

  Ok(coupon)
}

pub async fn update(pool: &PgPool, id: Uuid, input: CouponInput) -> Result<Coupon> {
  validate_input(&input)?;

  let existing = find_by_id(pool, id)
    .await?
    .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

  if input.code.trim() != existing.code && find_by_code(pool, input.code.trim()).await?.is_some() {
    return Err(AppError::Conflict("Coupon code already exists".to_string()));
  }

  let coupon = sqlx::query_as::<_, Coupon>(&format!(
    "UPDATE coupons SET code = $2, description = $3, discount_type = $4, discount_value = $5, \
       minimum_spend_cents = $6, maximum_discount_cents = $7, starts_at = $8, ends_at = $9, is_active = $10, \
       usage_limit = $11, usage_limit_per_user = $12, applicable_products = $13, excluded_products = $14, \
       applicable_categories = $15, excluded_categories = $16, first_order_only = $17, individual_use = $18, \
       updated_at = now() \
     WHERE id = $1 \
     RETURNING {}",
    COUPON_COLUMNS
  ))
  .bind(id)
  .bind(input.code.trim())
  .bind(&input.description)
  .bind(input.discount_type)
  .bind(input.discount_value)
  .bind(input.minimum_spend_cents)
  .bind(input.maximum_discount_cents)
  .bind(input.starts_at.unwrap_or(existing.starts_at))
  .bind(input.ends_at)
  .bind(input.is_active)
  .bind(input.usage_limit)
  .bind(input.usage_limit_per_user)
  .bind(&input.applicable_products)
  .bind(&input.excluded_products)
  .bind(&input.applicable_categories)
  .bind(&input.excluded_categories)
  .bind(input.first_order_only)
  .bind(input.individual_use)
  .fetch_one(pool)
  .await?;

  Ok(coupon)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<()> {
  let result = sqlx::query("DELETE FROM coupons WHERE id = $1").bind(id).execute(pool).await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Coupon not found".to_string()));
  }
  Ok(())
}

pub async fn list(pool: &PgPool, page: i64, limit: i64) -> Result<(i64, Vec<Coupon>)> {
  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons").fetch_one(pool).await?;
  let coupons = sqlx::query_as::<_, Coupon>(&format!(
    "SELECT {} FROM coupons ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    COUPON_COLUMNS
  ))
  .bind(limit)
  .bind((page - 1) * limit)
  .fetch_all(pool)
  .await?;
  Ok((count, coupons))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn base_coupon() -> Coupon {
    let now = Utc::now();
    Coupon {
      id: Uuid::new_v4(),
      code: "SAVE20".to_string(),
      description: None,
      discount_type: DiscountType::Percentage,
      discount_value: 20,
      minimum_spend_cents: None,
      maximum_discount_cents: None,
      starts_at: now - Duration::days(1),
      ends_at: Some(now + Duration::days(30)),
      is_active: true,
      usage_limit: None,
      usage_limit_per_user: None,
      used_count: 0,
      applicable_products: None,
      excluded_products: None,
      applicable_categories: None,
      excluded_categories: None,
      first_order_only: false,
      individual_use: false,
      created_at: now,
      updated_at: now,
    }
  }

  fn ctx() -> RedemptionContext {
    RedemptionContext {
      now: Utc::now(),
      prior_order_count: 0,
      redemptions_by_user: 0,
    }
  }

  fn line(subtotal_cents: i64) -> EligibleLine {
    EligibleLine {
      product_id: Uuid::new_v4(),
      category_id: None,
      subtotal_cents,
    }
  }

  #[test]
  fn twenty_percent_coupon_on_two_hundred_dollar_cart() {
    let applied = check_coupon(&base_coupon(), &[line(12_000), line(8_000)], 0, &ctx()).unwrap();
    assert_eq!(applied.eligible_base_cents, 20_000);
    assert_eq!(applied.discount_cents, 4_000);
    assert_eq!(applied.snapshot.code, "SAVE20");
  }

  #[test]
  fn empty_cart_is_rejected_first() {
    let err = check_coupon(&base_coupon(), &[], 0, &ctx()).unwrap_err();
    assert_eq!(err, CouponRejection::EmptyCart);
  }

  #[test]
  fn inactive_or_out_of_window_coupons_are_invalid() {
    let mut coupon = base_coupon();
    coupon.is_active = false;
    assert_eq!(
      check_coupon(&coupon, &[line(5_000)], 0, &ctx()).unwrap_err(),
      CouponRejection::InvalidOrExpired
    );

    let mut coupon = base_coupon();
    coupon.starts_at = Utc::now() + Duration::days(1);
    assert_eq!(
      check_coupon(&coupon, &[line(5_000)], 0, &ctx()).unwrap_err(),
      CouponRejection::InvalidOrExpired
    );

    let mut coupon = base_coupon();
    coupon.ends_at = Some(Utc::now() - Duration::hours(1));
    assert_eq!(
      check_coupon(&coupon, &[line(5_000)], 0, &ctx()).unwrap_err(),
      CouponRejection::InvalidOrExpired
    );
  }

  #[test]
  fn open_ended_window_is_valid() {
    let mut coupon = base_coupon();
    coupon.ends_at = None;
    assert!(check_coupon(&coupon, &[line(5_000)], 0, &ctx()).is_ok());
  }

  #[test]
  fn usage_limit_short_circuits_before_minimum_spend() {
    let mut coupon = base_coupon();
    coupon.usage_limit = Some(100);
    coupon.used_count = 100;
    coupon.minimum_spend_cents = Some(1_000_000);
    assert_eq!(
      check_coupon(&coupon, &[line(5_000)], 0, &ctx()).unwrap_err(),
      CouponRejection::UsageLimitReached
    );
  }

  #[test]
  fn minimum_spend_rejection_names_the_amount() {
    // $50 cart against a $100 minimum.
    let mut coupon = base_coupon();
    coupon.minimum_spend_cents = Some(10_000);
    let err = check_coupon(&coupon, &[line(5_000)], 0, &ctx()).unwrap_err();
    assert_eq!(err, CouponRejection::MinimumSpendNotMet { required_cents: 10_000 });
    assert_eq!(err.to_string(), "Minimum spend of $100.00 required for this coupon");
  }

  #[test]
  fn first_order_only_rejects_returning_customers() {
    let mut coupon = base_coupon();
    coupon.first_order_only = true;
    let mut context = ctx();
    context.prior_order_count = 3;
    assert_eq!(
      check_coupon(&coupon, &[line(5_000)], 0, &context).unwrap_err(),
      CouponRejection::FirstOrderOnly
    );
    context.prior_order_count = 0;
    assert!(check_coupon(&coupon, &[line(5_000)], 0, &context).is_ok());
  }

  #[test]
  fn per_user_limit_counts_prior_redemptions() {
    let mut coupon = base_coupon();
    coupon.usage_limit_per_user = Some(1);
    let mut context = ctx();
    context.redemptions_by_user = 1;
    assert_eq!(
      check_coupon(&coupon, &[line(5_000)], 0, &context).unwrap_err(),
      CouponRejection::PerUserLimitReached
    );
  }

  #[test]
  fn product_lists_restrict_the_discount_base() {
    let eligible = Uuid::new_v4();
    let other = Uuid::new_v4();
    let mut coupon = base_coupon();
    coupon.applicable_products = Some(vec![eligible]);

    let lines = [
      EligibleLine {
        product_id: eligible,
        category_id: None,
        subtotal_cents: 6_000,
      },
      EligibleLine {
        product_id: other,
        category_id: None,
        subtotal_cents: 4_000,
      },
    ];
    let applied = check_coupon(&coupon, &lines, 0, &ctx()).unwrap();
    // 20% of the eligible $60, not of the full $100.
    assert_eq!(applied.eligible_base_cents, 6_000);
    assert_eq!(applied.discount_cents, 1_200);
  }

  #[test]
  fn excluded_category_drops_lines_from_the_base() {
    let clearance = Uuid::new_v4();
    let mut coupon = base_coupon();
    coupon.excluded_categories = Some(vec![clearance]);

    let lines = [
      EligibleLine {
        product_id: Uuid::new_v4(),
        category_id: Some(clearance),
        subtotal_cents: 9_000,
      },
      EligibleLine {
        product_id: Uuid::new_v4(),
        category_id: None,
        subtotal_cents: 1_000,
      },
    ];
    let applied = check_coupon(&coupon, &lines, 0, &ctx()).unwrap();
    assert_eq!(applied.eligible_base_cents, 1_000);
  }

  #[test]
  fn no_eligible_items_rejects() {
    let mut coupon = base_coupon();
    coupon.applicable_products = Some(vec![Uuid::new_v4()]);
    assert_eq!(
      check_coupon(&coupon, &[line(5_000)], 0, &ctx()).unwrap_err(),
      CouponRejection::NoEligibleItems
    );
  }

  #[test]
  fn revalidation_drops_coupon_when_minimum_spend_no_longer_met() {
    let mut coupon = base_coupon();
    coupon.minimum_spend_cents = Some(10_000);
    let snapshot = CouponSnapshot::from_coupon(&coupon);

    assert_eq!(revalidate_snapshot(&snapshot, &[line(12_000)], 0), Some(2_400));
    // Items removed: subtotal fell below the minimum.
    assert_eq!(revalidate_snapshot(&snapshot, &[line(4_000)], 0), None);
    assert_eq!(revalidate_snapshot(&snapshot, &[], 0), None);
  }

  #[test]
  fn standalone_check_uses_the_provided_total() {
    let mut coupon = base_coupon();
    coupon.minimum_spend_cents = Some(10_000);
    let err = check_coupon_for_total(&coupon, 5_000, &ctx()).unwrap_err();
    assert!(matches!(err, CouponRejection::MinimumSpendNotMet { .. }));

    let applied = check_coupon_for_total(&coupon, 20_000, &ctx()).unwrap();
    assert_eq!(applied.discount_cents, 4_000);
  }

  #[test]
  fn input_bounds_are_validated() {
    let input = CouponInput {
      code: "TEN".to_string(),
      description: None,
      discount_type: DiscountType::Percentage,
      discount_value: 101,
      minimum_spend_cents: None,
      maximum_discount_cents: None,
      starts_at: None,
      ends_at: None,
      is_active: true,
      usage_limit: None,
      usage_limit_per_user: None,
      applicable_products: None,
      excluded_products: None,
      applicable_categories: None,
      excluded_categories: None,
      first_order_only: false,
      individual_use: false,
    };
    assert!(validate_input(&input).is_err());

    let ok = CouponInput {
      discount_value: 15,
      ..input
    };
    assert!(validate_input(&ok).is_ok());
  }
}
