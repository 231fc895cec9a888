// src/web/routes.rs

use actix_web::web;

// Simple health check; a real deployment might also ping the database here.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// This function is called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  use crate::web::handlers::{cart_handlers, checkout_handlers, coupon_handlers, order_handlers, webhook_handlers};

  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Cart Routes
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_item_handler))
          .route("/items/{item_id}", web::put().to(cart_handlers::update_item_handler))
          .route("/items/{item_id}", web::delete().to(cart_handlers::remove_item_handler))
          .route("/coupon", web::post().to(cart_handlers::apply_coupon_handler))
          .route("/coupon", web::delete().to(cart_handlers::remove_coupon_handler))
          .route("/merge", web::post().to(cart_handlers::merge_cart_handler)),
      )
      // Checkout Routes
      .service(web::scope("/checkout").route("", web::post().to(checkout_handlers::start_checkout_handler)))
      // Order Routes (literal segments registered before the {order_id} matcher)
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_my_orders_handler))
          .route("/admin/all", web::get().to(order_handlers::admin_list_orders_handler))
          .route("/admin/stats", web::get().to(order_handlers::order_stats_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{order_id}/status", web::put().to(order_handlers::update_order_status_handler))
          .route("/{order_id}/deliver", web::put().to(order_handlers::deliver_order_handler)),
      )
      // Coupon Routes
      .service(
        web::scope("/coupons")
          .route("/validate", web::post().to(coupon_handlers::validate_coupon_handler))
          .route("", web::get().to(coupon_handlers::list_coupons_handler))
          .route("", web::post().to(coupon_handlers::create_coupon_handler))
          .route("/{coupon_id}", web::get().to(coupon_handlers::get_coupon_handler))
          .route("/{coupon_id}", web::put().to(coupon_handlers::update_coupon_handler))
          .route("/{coupon_id}", web::delete().to(coupon_handlers::delete_coupon_handler)),
      )
      // Webhook Routes
      .service(web::scope("/webhooks").route("/payment", web::post().to(webhook_handlers::payment_webhook_handler))),
  );
}
