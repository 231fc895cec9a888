// src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart::{self, NewItem, UpdatedCart};
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, Shopper};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct AddItemPayload {
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub quantity: i32,
  pub attributes: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateItemPayload {
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct ApplyCouponPayload {
  pub code: String,
}

#[derive(Deserialize, Debug)]
pub struct MergeCartPayload {
  pub session_id: String,
}

fn cart_response(updated: UpdatedCart, message: &str) -> HttpResponse {
  let message = if updated.coupon_dropped {
    format!("{} Coupon removed: the cart no longer meets its requirements.", message)
  } else {
    message.to_string()
  };
  HttpResponse::Ok().json(json!({
    "success": true,
    "message": message,
    "cart": updated.cart,
    "items": updated.items,
  }))
}

// --- Handler Implementations ---

#[instrument(name = "handler::get_cart", skip(app_state, shopper))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, shopper: Shopper) -> Result<HttpResponse, AppError> {
  let updated = cart::get_or_create(&app_state.db_pool, &shopper.0).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "cart": updated.cart,
    "items": updated.items,
  })))
}

#[instrument(
    name = "handler::add_cart_item",
    skip(app_state, payload, shopper),
    fields(product_id = %payload.product_id, quantity = %payload.quantity)
)]
pub async fn add_item_handler(
  app_state: web::Data<AppState>,
  shopper: Shopper,
  payload: web::Json<AddItemPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let updated = cart::add_item(
    &app_state.db_pool,
    &shopper.0,
    NewItem {
      product_id: payload.product_id,
      variant_id: payload.variant_id,
      quantity: payload.quantity,
      attributes: payload.attributes,
    },
  )
  .await?;
  info!(cart_id = %updated.cart.id, "Item added to cart.");
  Ok(cart_response(updated, "Item added to cart."))
}

#[instrument(
    name = "handler::update_cart_item",
    skip(app_state, payload, shopper),
    fields(item_id = %item_id, quantity = %payload.quantity)
)]
pub async fn update_item_handler(
  app_state: web::Data<AppState>,
  shopper: Shopper,
  item_id: web::Path<Uuid>,
  payload: web::Json<UpdateItemPayload>,
) -> Result<HttpResponse, AppError> {
  let updated = cart::update_item(&app_state.db_pool, &shopper.0, item_id.into_inner(), payload.quantity).await?;
  Ok(cart_response(updated, "Cart item updated."))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, shopper), fields(item_id = %item_id))]
pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  shopper: Shopper,
  item_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let updated = cart::remove_item(&app_state.db_pool, &shopper.0, item_id.into_inner()).await?;
  Ok(cart_response(updated, "Item removed from cart."))
}

#[instrument(name = "handler::clear_cart", skip(app_state, shopper))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, shopper: Shopper) -> Result<HttpResponse, AppError> {
  let updated = cart::clear(&app_state.db_pool, &shopper.0).await?;
  Ok(cart_response(updated, "Cart cleared successfully."))
}

#[instrument(name = "handler::apply_coupon", skip(app_state, payload, shopper), fields(code = %payload.code))]
pub async fn apply_coupon_handler(
  app_state: web::Data<AppState>,
  shopper: Shopper,
  payload: web::Json<ApplyCouponPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.code.trim().is_empty() {
    return Err(AppError::Validation("Coupon code is required".to_string()));
  }
  let updated = cart::apply_coupon(&app_state.db_pool, &shopper.0, payload.code.trim()).await?;
  Ok(cart_response(updated, "Coupon applied successfully."))
}

#[instrument(name = "handler::remove_coupon", skip(app_state, shopper))]
pub async fn remove_coupon_handler(app_state: web::Data<AppState>, shopper: Shopper) -> Result<HttpResponse, AppError> {
  let updated = cart::remove_coupon(&app_state.db_pool, &shopper.0).await?;
  Ok(cart_response(updated, "Coupon removed successfully."))
}

/// Fold the caller's pre-sign-in guest cart into their user cart.
#[instrument(name = "handler::merge_cart", skip(app_state, payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn merge_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<MergeCartPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.session_id.trim().is_empty() {
    return Err(AppError::Validation("Session id is required".to_string()));
  }
  let updated = cart::merge_guest_cart(&app_state.db_pool, payload.session_id.trim(), auth_user.user_id).await?;
  Ok(cart_response(updated, "Cart merged."))
}
