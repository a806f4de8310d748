//! Acting-user extractor.
//!
//! Authentication belongs to the hosting platform, which forwards the
//! authenticated user id in [`USER_HEADER`]. The id is passed explicitly to
//! the core, which performs its own author checks.

use axum::{extract::FromRequestParts, http::request::Parts};
use libwall_core::user::UserId;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-libwall-user";

/// The user on whose behalf the request acts; `None` if the header is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub Option<UserId>);

impl<St> FromRequestParts<St> for ActingUser
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(USER_HEADER) else {
      return Ok(ActingUser(None));
    };

    let id = value
      .to_str()
      .ok()
      .and_then(|s| s.trim().parse::<i64>().ok())
      .ok_or_else(|| ApiError::BadRequest(format!("malformed {USER_HEADER} header")))?;

    Ok(ActingUser(Some(UserId(id))))
  }
}
