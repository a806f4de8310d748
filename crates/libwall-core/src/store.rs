//! The `WallStore` trait and supporting query types.
//!
//! The trait is pure persistence and is implemented by storage backends
//! (e.g. `libwall-store-sqlite`). Business rules live in the directory,
//! allocator and loader modules, which depend on this abstraction only.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  comment::{Comment, CommentId, CommentRecord, CommentRow, ReplyId, ReplyRecord, SeqNum},
  wall::{Location, Wall, WallId},
};

// ─── Insert outcome ──────────────────────────────────────────────────────────

/// Result of an optimistic insert guarded by a uniqueness constraint.
///
/// Failures other than a uniqueness violation are reported through the `Err`
/// arm of the surrounding `Result`, never as `Conflict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert<T> {
  Inserted(T),
  /// Another writer already holds the unique key.
  Conflict,
}

impl<T> Insert<T> {
  pub fn inserted(self) -> Option<T> {
    match self {
      Self::Inserted(v) => Some(v),
      Self::Conflict => None,
    }
  }

  pub fn is_conflict(&self) -> bool { matches!(self, Self::Conflict) }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`WallStore::comment_rows`]. Bounds are inclusive; `None`
/// leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentQuery {
  pub seq_min: Option<SeqNum>,
  pub seq_max: Option<SeqNum>,
  /// Maximum number of distinct comments, not joined rows.
  pub limit:   Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the durable wall store.
///
/// Walls, comments and replies are append-only. The backend must enforce
/// uniqueness of `(context, component, area, item)` for walls and of
/// `(wall, seq_num)` for comments, reporting violations as
/// [`Insert::Conflict`].
pub trait WallStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Walls ─────────────────────────────────────────────────────────────

  /// Find the wall at exactly `location`.
  fn find_wall<'a>(
    &'a self,
    location: &'a Location,
  ) -> impl Future<Output = Result<Option<Wall>, Self::Error>> + Send + 'a;

  fn get_wall(
    &self,
    id: WallId,
  ) -> impl Future<Output = Result<Option<Wall>, Self::Error>> + Send + '_;

  fn insert_wall(
    &self,
    location: Location,
    time_created: DateTime<Utc>,
  ) -> impl Future<Output = Result<Insert<WallId>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Highest sequence number on the wall, `None` if it has no comments.
  fn max_seq_num(
    &self,
    wall_id: WallId,
  ) -> impl Future<Output = Result<Option<SeqNum>, Self::Error>> + Send + '_;

  fn insert_comment(
    &self,
    record: CommentRecord,
  ) -> impl Future<Output = Result<Insert<CommentId>, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  // ── Replies ───────────────────────────────────────────────────────────

  fn insert_reply(
    &self,
    record: ReplyRecord,
  ) -> impl Future<Output = Result<ReplyId, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Comments of `wall_id` left-joined with their replies.
  ///
  /// Rows come newest comment first (descending `seq_num`), and within one
  /// comment oldest reply first. A comment without replies yields one row
  /// with `reply: None`.
  fn comment_rows(
    &self,
    wall_id: WallId,
    query: CommentQuery,
  ) -> impl Future<Output = Result<Vec<CommentRow>, Self::Error>> + Send + '_;
}
