//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as integer seconds since the Unix epoch; ids and
//! format tags as plain integers.

use chrono::{DateTime, Utc};
use libwall_core::{
  comment::{Comment, CommentId, CommentRow, ContentFormat, Reply, ReplyId},
  user::{User, UserId},
  wall::{Location, Wall, WallId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_ts(dt: DateTime<Utc>) -> i64 { dt.timestamp() }

pub fn decode_ts(secs: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp(secs, 0).ok_or(Error::Timestamp(secs))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns read directly from a `walls` row.
pub struct RawWall {
  pub id:           i64,
  pub context_id:   i64,
  pub component:    String,
  pub area:         String,
  pub item_id:      i64,
  pub time_created: i64,
}

impl RawWall {
  pub const COLUMNS: &'static str =
    "id, context_id, component, area, item_id, time_created";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      context_id:   row.get(1)?,
      component:    row.get(2)?,
      area:         row.get(3)?,
      item_id:      row.get(4)?,
      time_created: row.get(5)?,
    })
  }

  pub fn into_wall(self) -> Result<Wall> {
    Ok(Wall {
      id:           WallId(self.id),
      location:     Location {
        context_id: self.context_id,
        component:  self.component,
        area:       self.area,
        item_id:    self.item_id,
      },
      time_created: decode_ts(self.time_created)?,
    })
  }
}

/// Columns of a `comments` row.
pub struct RawComment {
  pub id:           i64,
  pub wall_id:      i64,
  pub seq_num:      i64,
  pub content:      String,
  pub format:       i64,
  pub user_id:      i64,
  pub time_created: i64,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:           CommentId(self.id),
      wall_id:      WallId(self.wall_id),
      seq_num:      self.seq_num,
      content:      self.content,
      format:       ContentFormat(self.format),
      author:       UserId(self.user_id),
      time_created: decode_ts(self.time_created)?,
    })
  }
}

/// One row of `comments LEFT JOIN replies`; reply columns are all `NULL`
/// for a comment without replies.
pub struct RawCommentRow {
  pub comment:            RawComment,
  pub reply_id:           Option<i64>,
  pub reply_content:      Option<String>,
  pub reply_user_id:      Option<i64>,
  pub reply_time_created: Option<i64>,
}

impl RawCommentRow {
  pub fn into_row(self) -> Result<CommentRow> {
    let comment = self.comment.into_comment()?;

    let reply = match (
      self.reply_id,
      self.reply_content,
      self.reply_user_id,
      self.reply_time_created,
    ) {
      (Some(id), Some(content), Some(user_id), Some(time_created)) => Some(Reply {
        id: ReplyId(id),
        comment_id: comment.id,
        content,
        author: UserId(user_id),
        time_created: decode_ts(time_created)?,
      }),
      _ => None,
    };

    Ok(CommentRow { comment, reply })
  }
}

/// Columns of a `users` row.
pub struct RawUser {
  pub id:          i64,
  pub full_name:   String,
  pub picture_url: Option<String>,
  pub guest:       bool,
}

impl RawUser {
  pub fn into_user(self) -> User {
    User {
      id:          UserId(self.id),
      full_name:   self.full_name,
      picture_url: self.picture_url,
      guest:       self.guest,
    }
  }
}
