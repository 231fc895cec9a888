// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  // Shared secret for payment-webhook signatures. When unset, signature
  // verification is skipped (local development only).
  pub webhook_secret: Option<String>,

  pub order_number_prefix: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;

    let webhook_secret = env::var("PAYMENT_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());
    if webhook_secret.is_none() {
      tracing::warn!("PAYMENT_WEBHOOK_SECRET not set; webhook signature verification is disabled.");
    }

    let order_number_prefix = get_env("ORDER_NUMBER_PREFIX").unwrap_or_else(|_| "SA".to_string());

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      webhook_secret,
      order_number_prefix,
    })
  }
}
