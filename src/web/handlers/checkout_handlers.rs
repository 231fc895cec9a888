// src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::orders::{self, CheckoutInput};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct CheckoutPayload {
  pub shipping_address_id: Uuid,
  pub billing_address_id: Option<Uuid>,
  pub payment_method: String,
  pub notes: Option<String>,
}

// --- Handler Implementation ---

#[instrument(
    name = "handler::start_checkout",
    skip(app_state, payload, auth_user),
    fields(user_id = %auth_user.user_id, payment_method = %payload.payment_method)
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let (order, items) = orders::create_order(
    &app_state.db_pool,
    auth_user.user_id,
    CheckoutInput {
      shipping_address_id: payload.shipping_address_id,
      billing_address_id: payload.billing_address_id,
      payment_method: payload.payment_method,
      notes: payload.notes,
    },
    &app_state.config.order_number_prefix,
  )
  .await?;

  info!(
    "Checkout completed for user {}. Order {} ({}) total {} cents.",
    auth_user.user_id, order.id, order.order_number, order.total_cents
  );

  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "message": "Order created successfully.",
    "order": order,
    "items": items,
  })))
}
