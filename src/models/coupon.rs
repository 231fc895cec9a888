// src/models/coupon.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "discount_type_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
  Percentage,
  Fixed,
  FreeShipping,
}

/// A named discount policy with eligibility and usage constraints.
///
/// `discount_value` is an integer percent for `Percentage` coupons and an
/// amount in cents for `Fixed`; `FreeShipping` ignores it. `used_count` is
/// incremented at order conversion, never at cart-apply time, and never
/// above `usage_limit`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Coupon {
  pub id: Uuid,
  pub code: String,
  pub description: Option<String>,
  pub discount_type: DiscountType,
  pub discount_value: i64,
  pub minimum_spend_cents: Option<i64>,
  pub maximum_discount_cents: Option<i64>,
  pub starts_at: DateTime<Utc>,
  // None means no upper bound on the activity window.
  pub ends_at: Option<DateTime<Utc>>,
  pub is_active: bool,
  pub usage_limit: Option<i32>,
  pub usage_limit_per_user: Option<i32>,
  pub used_count: i32,
  pub applicable_products: Option<Vec<Uuid>>,
  pub excluded_products: Option<Vec<Uuid>>,
  pub applicable_categories: Option<Vec<Uuid>>,
  pub excluded_categories: Option<Vec<Uuid>>,
  pub first_order_only: bool,
  pub individual_use: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Frozen copy of a coupon's discount terms, stored on the cart when the
/// coupon is applied and on which re-validation after later mutations runs.
/// Later edits to the coupon row do not affect carts holding a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponSnapshot {
  pub coupon_id: Uuid,
  pub code: String,
  pub discount_type: DiscountType,
  pub discount_value: i64,
  pub minimum_spend_cents: Option<i64>,
  pub maximum_discount_cents: Option<i64>,
  pub applicable_products: Option<Vec<Uuid>>,
  pub excluded_products: Option<Vec<Uuid>>,
  pub applicable_categories: Option<Vec<Uuid>>,
  pub excluded_categories: Option<Vec<Uuid>>,
}

impl CouponSnapshot {
  pub fn from_coupon(coupon: &Coupon) -> Self {
    Self {
      coupon_id: coupon.id,
      code: coupon.code.clone(),
      discount_type: coupon.discount_type,
      discount_value: coupon.discount_value,
      minimum_spend_cents: coupon.minimum_spend_cents,
      maximum_discount_cents: coupon.maximum_discount_cents,
      applicable_products: coupon.applicable_products.clone(),
      excluded_products: coupon.excluded_products.clone(),
      applicable_categories: coupon.applicable_categories.clone(),
      excluded_categories: coupon.excluded_categories.clone(),
    }
  }
}
