// src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::services::orders;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct Pagination {
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

impl Pagination {
  pub fn page(&self) -> i64 {
    self.page.unwrap_or(1).max(1)
  }

  pub fn limit(&self, default: i64) -> i64 {
    self.limit.unwrap_or(default).clamp(1, 100)
  }
}

#[derive(Deserialize, Debug)]
pub struct AdminOrderListQuery {
  pub status: Option<OrderStatus>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub status: OrderStatus,
}

#[derive(Deserialize, Debug, Default)]
pub struct DeliverPayload {
  pub tracking_number: Option<String>,
  pub shipping_carrier: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CancelPayload {
  pub reason: Option<String>,
}

fn pages(count: i64, limit: i64) -> i64 {
  (count + limit - 1) / limit
}

// --- Handler Implementations ---

#[instrument(name = "handler::list_my_orders", skip(app_state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_my_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<Pagination>,
) -> Result<HttpResponse, AppError> {
  let (page, limit) = (query.page(), query.limit(10));
  let (count, orders) = orders::list_user_orders(&app_state.db_pool, auth_user.user_id, page, limit).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "count": count,
    "pages": pages(count, limit),
    "currentPage": page,
    "orders": orders,
  })))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id, order_id = %order_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  order_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let detail = orders::get_order_for(
    &app_state.db_pool,
    order_id.into_inner(),
    auth_user.user_id,
    auth_user.is_admin,
  )
  .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "order": detail.order,
    "items": detail.items,
    "shippingAddress": detail.shipping_address,
    "billingAddress": detail.billing_address,
  })))
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user, payload), fields(user_id = %auth_user.user_id, order_id = %order_id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  order_id: web::Path<Uuid>,
  payload: Option<web::Json<CancelPayload>>,
) -> Result<HttpResponse, AppError> {
  let reason = payload.and_then(|p| p.into_inner().reason);
  let order = orders::cancel_order(
    &app_state.db_pool,
    order_id.into_inner(),
    auth_user.user_id,
    auth_user.is_admin,
    reason,
  )
  .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Order cancelled successfully.",
    "order": order,
  })))
}

#[instrument(name = "handler::admin_list_orders", skip(app_state, admin, query), fields(admin_id = %admin.0.user_id))]
pub async fn admin_list_orders_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<AdminOrderListQuery>,
) -> Result<HttpResponse, AppError> {
  let pagination = Pagination {
    page: query.page,
    limit: query.limit,
  };
  let (page, limit) = (pagination.page(), pagination.limit(20));
  let (count, orders) = orders::admin_list(&app_state.db_pool, query.status, page, limit).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "count": count,
    "pages": pages(count, limit),
    "currentPage": page,
    "orders": orders,
  })))
}

#[instrument(name = "handler::update_order_status", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id, order_id = %order_id, status = %payload.status))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  order_id: web::Path<Uuid>,
  payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let order = orders::update_status(&app_state.db_pool, order_id.into_inner(), payload.status).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Order status updated successfully.",
    "order": order,
  })))
}

#[instrument(name = "handler::deliver_order", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id, order_id = %order_id))]
pub async fn deliver_order_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  order_id: web::Path<Uuid>,
  payload: Option<web::Json<DeliverPayload>>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.map(|p| p.into_inner()).unwrap_or_default();
  let order = orders::mark_delivered(
    &app_state.db_pool,
    order_id.into_inner(),
    payload.tracking_number,
    payload.shipping_carrier,
  )
  .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Order marked as delivered.",
    "order": order,
  })))
}

#[instrument(name = "handler::order_stats", skip(app_state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn order_stats_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let stats = orders::stats(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "stats": stats,
  })))
}
