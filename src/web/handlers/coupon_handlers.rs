// src/web/handlers/coupon_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::coupons::{self, CouponInput};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use crate::web::handlers::order_handlers::Pagination;

// --- Request DTO ---

#[derive(Deserialize, Debug)]
pub struct ValidateCouponPayload {
  pub code: String,
  pub cart_total_cents: i64,
}

// --- Admin CRUD Handlers ---

#[instrument(name = "handler::list_coupons", skip(app_state, admin, query), fields(admin_id = %admin.0.user_id))]
pub async fn list_coupons_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<Pagination>,
) -> Result<HttpResponse, AppError> {
  let (page, limit) = (query.page(), query.limit(20));
  let (count, coupons) = coupons::list(&app_state.db_pool, page, limit).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "count": count,
    "pages": (count + limit - 1) / limit,
    "currentPage": page,
    "coupons": coupons,
  })))
}

#[instrument(name = "handler::get_coupon", skip(app_state, admin), fields(admin_id = %admin.0.user_id, coupon_id = %coupon_id))]
pub async fn get_coupon_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  coupon_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let coupon = coupons::find_by_id(&app_state.db_pool, coupon_id.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "coupon": coupon })))
}

#[instrument(name = "handler::create_coupon", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id, code = %payload.code))]
pub async fn create_coupon_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<CouponInput>,
) -> Result<HttpResponse, AppError> {
  let coupon = coupons::create(&app_state.db_pool, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "message": "Coupon created successfully.",
    "coupon": coupon,
  })))
}

#[instrument(name = "handler::update_coupon", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id, coupon_id = %coupon_id))]
pub async fn update_coupon_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  coupon_id: web::Path<Uuid>,
  payload: web::Json<CouponInput>,
) -> Result<HttpResponse, AppError> {
  let coupon = coupons::update(&app_state.db_pool, coupon_id.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Coupon updated successfully.",
    "coupon": coupon,
  })))
}

#[instrument(name = "handler::delete_coupon", skip(app_state, admin), fields(admin_id = %admin.0.user_id, coupon_id = %coupon_id))]
pub async fn delete_coupon_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  coupon_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  coupons::delete(&app_state.db_pool, coupon_id.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Coupon deleted successfully.",
  })))
}

// --- Customer-facing pre-checkout check ---

/// Stand-alone validation of a coupon against a cart total, usable before
/// checkout. The list-aware authoritative check happens on apply.
#[instrument(name = "handler::validate_coupon", skip(app_state, auth_user, payload), fields(code = %payload.code))]
pub async fn validate_coupon_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ValidateCouponPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.code.trim().is_empty() {
    return Err(AppError::Validation("Coupon code is required".to_string()));
  }

  let coupon = coupons::find_by_code(&app_state.db_pool, payload.code.trim())
    .await?
    .ok_or_else(|| AppError::NotFound("Invalid or expired coupon".to_string()))?;
  let ctx = coupons::redemption_context(&app_state.db_pool, Some(auth_user.user_id), &coupon.code).await?;

  let applied = coupons::check_coupon_for_total(&coupon, payload.cart_total_cents, &ctx).map_err(AppError::from)?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Coupon is valid.",
    "coupon": coupon,
    "discountCents": applied.discount_cents,
  })))
}
