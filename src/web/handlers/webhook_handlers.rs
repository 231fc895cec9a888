// src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::services::payments::{self, PaymentWebhookEvent, ReconciliationOutcome};
use crate::state::AppState;

// --- Handler Implementation ---

/// Inbound payment-provider webhook. The signature check rejects the request
/// (401, so the provider retries) when the shared secret does not match;
/// everything after that is acknowledged with 200 even when the event is
/// dropped, so the provider does not retry events we have chosen to ignore.
#[instrument(
    name = "handler::payment_webhook",
    skip(app_state, req, body),
    fields(payload_bytes = body.len())
)]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  if let Some(secret) = &app_state.config.webhook_secret {
    let signature = req
      .headers()
      .get("x-webhook-signature")
      .and_then(|value| value.to_str().ok());
    if signature != Some(secret.as_str()) {
      warn!("Payment webhook rejected: missing or invalid signature header.");
      return Err(AppError::Auth("Webhook signature verification failed.".to_string()));
    }
  }

  let event: PaymentWebhookEvent = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

  info!(
    transaction_id = %event.transaction_id,
    order_id = %event.metadata.order_id,
    event_type = ?event.event_type,
    "Received payment webhook event."
  );

  match payments::handle_event(&app_state.db_pool, event).await? {
    ReconciliationOutcome::Applied(order) => Ok(HttpResponse::Ok().json(json!({
      "received": true,
      "orderId": order.id,
      "paymentStatus": order.payment_status,
    }))),
    ReconciliationOutcome::Ignored(reason) => {
      Ok(HttpResponse::Ok().json(json!({ "received": true, "status": "ignored", "reason": reason })))
    }
    ReconciliationOutcome::UnknownOrder => {
      // Acknowledged but dropped: retrying will not make the order appear.
      Ok(HttpResponse::Ok().json(json!({ "received": true, "status": "dropped" })))
    }
  }
}
