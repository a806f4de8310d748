//! Comment and reply types.
//!
//! Comments are immutable once written. Each carries a per-wall sequence
//! number that clients use as a high-water mark for incremental refresh.
//! Replies hang off a single comment and are ordered by creation time only.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  user::{User, UserId},
  wall::WallId,
};

/// Per-wall comment sequence number; the first comment on a wall gets `1`.
pub type SeqNum = i64;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl fmt::Display for CommentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReplyId(pub i64);

// ─── Format ──────────────────────────────────────────────────────────────────

/// Content-format tag. Opaque to the core; stored and returned verbatim.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContentFormat(pub i64);

impl ContentFormat {
  pub const MOODLE: Self = Self(0);
  pub const HTML: Self = Self(1);
  pub const PLAIN: Self = Self(2);
  pub const MARKDOWN: Self = Self(4);

  /// The formats offered to authors, with their display names.
  pub fn menu() -> [(Self, &'static str); 4] {
    [
      (Self::MOODLE, "Moodle auto-format"),
      (Self::HTML, "HTML format"),
      (Self::PLAIN, "Plain text format"),
      (Self::MARKDOWN, "Markdown format"),
    ]
  }
}

// ─── Persisted rows ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:           CommentId,
  pub wall_id:      WallId,
  pub seq_num:      SeqNum,
  pub content:      String,
  pub format:       ContentFormat,
  pub author:       UserId,
  /// Server-assigned; never changes after creation.
  pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
  pub id:           ReplyId,
  pub comment_id:   CommentId,
  pub content:      String,
  pub author:       UserId,
  pub time_created: DateTime<Utc>,
}

// ─── Store inputs ────────────────────────────────────────────────────────────

/// A comment row ready for insertion; the sequence number is already chosen.
#[derive(Debug, Clone)]
pub struct CommentRecord {
  pub wall_id:      WallId,
  pub seq_num:      SeqNum,
  pub content:      String,
  pub format:       ContentFormat,
  pub author:       UserId,
  pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReplyRecord {
  pub comment_id:   CommentId,
  pub content:      String,
  pub author:       UserId,
  pub time_created: DateTime<Utc>,
}

/// One row of the comment/reply join, as produced by
/// [`crate::store::WallStore::comment_rows`].
#[derive(Debug, Clone)]
pub struct CommentRow {
  pub comment: Comment,
  pub reply:   Option<Reply>,
}

// ─── Loaded read model ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LoadedReply {
  pub reply:  Reply,
  pub author: User,
}

/// A comment with its resolved author and replies, oldest reply first.
#[derive(Debug, Clone)]
pub struct LoadedComment {
  pub comment: Comment,
  pub author:  User,
  pub replies: Vec<LoadedReply>,
}

impl LoadedComment {
  pub fn seq_num(&self) -> SeqNum { self.comment.seq_num }
}
