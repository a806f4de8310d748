//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Wall(#[from] libwall_core::Error),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  /// Stable machine-readable discriminant sent alongside the message.
  pub fn kind(&self) -> &'static str {
    match self {
      ApiError::Wall(e) => e.kind(),
      ApiError::BadRequest(_) => "bad_request",
    }
  }

  pub fn status(&self) -> StatusCode {
    use libwall_core::Error as E;
    match self {
      ApiError::Wall(E::WallNotFound(_) | E::CommentNotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::Wall(
        E::InvalidAuthor(_)
        | E::InvalidLocation(_)
        | E::InvalidRange { .. }
        | E::InvalidCount(_),
      )
      | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Wall(E::ConflictExhausted(_)) => StatusCode::CONFLICT,
      ApiError::Wall(E::WallVanished(_) | E::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    let body = json!({ "error": self.to_string(), "kind": self.kind() });
    (status, Json(body)).into_response()
  }
}
