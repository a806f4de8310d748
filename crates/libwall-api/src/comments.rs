//! Handlers for comment and reply endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/walls/{id}/comments` | Body: [`AddCommentBody`]; returns the [`CommentDelta`] |
//! | `POST` | `/comments/{id}/replies` | Body: `{"content":"..."}`; returns 201 + reply id |
//!
//! Both require the acting user in the [`USER_HEADER`](crate::actor::USER_HEADER)
//! header.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use libwall_core::{
  WallService,
  comment::{CommentId, ContentFormat, ReplyId, SeqNum},
  export::CommentDelta,
  store::WallStore,
  user::UserDirectory,
  wall::WallId,
};
use serde::{Deserialize, Serialize};

use crate::{actor::ActingUser, error::ApiError};

// ─── Add comment ──────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /walls/{id}/comments`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentBody {
  pub content:        String,
  /// Optional; an absent format takes the wall's `default_format`.
  pub content_format: Option<ContentFormat>,
  /// Highest sequence number the client already displays.
  #[serde(default)]
  pub max_seq_num:    SeqNum,
}

/// `POST /walls/{id}/comments`, body:
/// `{"content":"...","contentFormat":1,"maxSeqNum":3}`
pub async fn add<S>(
  State(service): State<Arc<WallService<S>>>,
  Path(wall_id): Path<i64>,
  ActingUser(author): ActingUser,
  Json(body): Json<AddCommentBody>,
) -> Result<Json<CommentDelta>, ApiError>
where
  S: WallStore + UserDirectory + Send + Sync + 'static,
{
  let delta = service
    .add_comment_and_fetch_delta(
      WallId(wall_id),
      body.content,
      body.content_format,
      author,
      body.max_seq_num,
    )
    .await?;
  Ok(Json(delta))
}

// ─── Add reply ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddReplyBody {
  pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyCreated {
  pub id: ReplyId,
}

/// `POST /comments/{id}/replies`, body: `{"content":"..."}`
pub async fn reply<S>(
  State(service): State<Arc<WallService<S>>>,
  Path(comment_id): Path<i64>,
  ActingUser(author): ActingUser,
  Json(body): Json<AddReplyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WallStore + UserDirectory + Send + Sync + 'static,
{
  let id = service
    .add_reply(CommentId(comment_id), body.content, author)
    .await?;
  Ok((StatusCode::CREATED, Json(ReplyCreated { id })))
}
