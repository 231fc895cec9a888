// src/web/extractors.rs

//! Identity extractors. Authentication itself lives in an upstream gateway
//! that is out of scope here; this service trusts the identity headers it
//! forwards (`X-User-ID`, `X-User-Role`, `X-Session-ID`).

use actix_web::{FromRequest, HttpRequest};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart::CartOwner;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub is_admin: bool,
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
  req
    .headers()
    .get(name)
    .and_then(|value| value.to_str().ok())
    .map(String::from)
}

fn identify(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let user_id = header(req, "X-User-ID")
    .as_deref()
    .and_then(|raw| Uuid::parse_str(raw).ok());
  match user_id {
    Some(user_id) => {
      let is_admin = header(req, "X-User-Role").as_deref() == Some("admin");
      Ok(AuthenticatedUser { user_id, is_admin })
    }
    None => {
      warn!("AuthenticatedUser extractor: Missing or invalid X-User-ID header.");
      Err(AppError::Auth(
        "User authentication required. Missing or invalid X-User-ID header.".to_string(),
      ))
    }
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    futures_util::future::ready(identify(req))
  }
}

/// An authenticated user whose role header marks them as admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    futures_util::future::ready(identify(req).and_then(|user| {
      if user.is_admin {
        Ok(AdminUser(user))
      } else {
        Err(AppError::Forbidden("Admin access required.".to_string()))
      }
    }))
  }
}

/// Whoever owns the cart being addressed: a signed-in user when the identity
/// header is present, otherwise an anonymous session.
#[derive(Debug, Clone)]
pub struct Shopper(pub CartOwner);

impl FromRequest for Shopper {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let owner = match identify(req) {
      Ok(user) => Ok(CartOwner::User(user.user_id)),
      Err(_) => match header(req, "X-Session-ID").filter(|session| !session.is_empty()) {
        Some(session) => Ok(CartOwner::Guest(session)),
        None => {
          warn!("Shopper extractor: neither X-User-ID nor X-Session-ID present.");
          Err(AppError::Auth(
            "A user identity or session id is required to use the cart.".to_string(),
          ))
        }
      },
    };
    futures_util::future::ready(owner.map(Shopper))
  }
}
