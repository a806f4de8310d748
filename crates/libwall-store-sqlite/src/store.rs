//! [`SqliteStore`], the SQLite implementation of [`WallStore`] and
//! [`UserDirectory`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use libwall_core::{
  comment::{Comment, CommentId, CommentRecord, CommentRow, ReplyId, ReplyRecord, SeqNum},
  store::{CommentQuery, Insert, WallStore},
  user::{User, UserDirectory, UserId},
  wall::{Location, Wall, WallId},
};

use crate::{
  Result,
  encode::{RawComment, RawCommentRow, RawUser, RawWall, encode_ts},
  schema::SCHEMA,
};

/// True for violations of a UNIQUE or PRIMARY KEY constraint. Other
/// constraint failures (foreign keys, checks) are real errors.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Map an insert result onto [`Insert`], keeping non-uniqueness failures as
/// errors.
fn insert_outcome<T>(
  result: rusqlite::Result<usize>,
  id: impl FnOnce() -> T,
) -> tokio_rusqlite::Result<Insert<T>> {
  match result {
    Ok(_) => Ok(Insert::Inserted(id())),
    Err(e) if is_unique_violation(&e) => Ok(Insert::Conflict),
    Err(e) => Err(e.into()),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A wall store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!(path = %path.display(), "opened wall store");
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace a user's display record.
  pub async fn upsert_user(&self, user: User) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (id, full_name, picture_url, guest)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (id) DO UPDATE SET
             full_name   = excluded.full_name,
             picture_url = excluded.picture_url,
             guest       = excluded.guest",
          rusqlite::params![user.id.0, user.full_name, user.picture_url, user.guest],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Sequence numbers of a wall in ascending order.
  pub async fn seq_nums(&self, wall_id: WallId) -> Result<Vec<SeqNum>> {
    let seqs = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT seq_num FROM comments WHERE wall_id = ?1 ORDER BY seq_num")?;
        let rows = stmt
          .query_map(rusqlite::params![wall_id.0], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<SeqNum>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(seqs)
  }
}

// ─── WallStore impl ──────────────────────────────────────────────────────────

impl WallStore for SqliteStore {
  type Error = crate::Error;

  // ── Walls ─────────────────────────────────────────────────────────────────

  async fn find_wall(&self, location: &Location) -> Result<Option<Wall>> {
    let loc = location.clone();

    let raw: Option<RawWall> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM walls
                 WHERE context_id = ?1 AND component = ?2 AND area = ?3 AND item_id = ?4",
                RawWall::COLUMNS
              ),
              rusqlite::params![loc.context_id, loc.component, loc.area, loc.item_id],
              RawWall::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawWall::into_wall).transpose()
  }

  async fn get_wall(&self, id: WallId) -> Result<Option<Wall>> {
    let raw: Option<RawWall> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM walls WHERE id = ?1", RawWall::COLUMNS),
              rusqlite::params![id.0],
              RawWall::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawWall::into_wall).transpose()
  }

  async fn insert_wall(
    &self,
    location: Location,
    time_created: DateTime<Utc>,
  ) -> Result<Insert<WallId>> {
    let at = encode_ts(time_created);

    let outcome = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO walls (context_id, component, area, item_id, time_created)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            location.context_id,
            location.component,
            location.area,
            location.item_id,
            at,
          ],
        );
        insert_outcome(result, || WallId(conn.last_insert_rowid()))
      })
      .await?;

    Ok(outcome)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn max_seq_num(&self, wall_id: WallId) -> Result<Option<SeqNum>> {
    let max = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT MAX(seq_num) FROM comments WHERE wall_id = ?1",
          rusqlite::params![wall_id.0],
          |row| row.get::<_, Option<i64>>(0),
        )?)
      })
      .await?;
    Ok(max)
  }

  async fn insert_comment(&self, record: CommentRecord) -> Result<Insert<CommentId>> {
    let at = encode_ts(record.time_created);

    let outcome = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO comments (wall_id, seq_num, content, format, user_id, time_created)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            record.wall_id.0,
            record.seq_num,
            record.content,
            record.format.0,
            record.author.0,
            at,
          ],
        );
        insert_outcome(result, || CommentId(conn.last_insert_rowid()))
      })
      .await?;

    Ok(outcome)
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, wall_id, seq_num, content, format, user_id, time_created
               FROM comments WHERE id = ?1",
              rusqlite::params![id.0],
              |row| {
                Ok(RawComment {
                  id:           row.get(0)?,
                  wall_id:      row.get(1)?,
                  seq_num:      row.get(2)?,
                  content:      row.get(3)?,
                  format:       row.get(4)?,
                  user_id:      row.get(5)?,
                  time_created: row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  // ── Replies ───────────────────────────────────────────────────────────────

  async fn insert_reply(&self, record: ReplyRecord) -> Result<ReplyId> {
    let at = encode_ts(record.time_created);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO replies (comment_id, content, user_id, time_created)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![record.comment_id.0, record.content, record.author.0, at],
        )?;
        Ok(ReplyId(conn.last_insert_rowid()))
      })
      .await?;

    Ok(id)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn comment_rows(&self, wall_id: WallId, query: CommentQuery) -> Result<Vec<CommentRow>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = query
      .limit
      .map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

    let raws: Vec<RawCommentRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             c.id, c.wall_id, c.seq_num, c.content, c.format, c.user_id, c.time_created,
             r.id, r.content, r.user_id, r.time_created
           FROM comments c
           LEFT JOIN replies r ON r.comment_id = c.id
           WHERE c.id IN (
             SELECT id FROM comments
             WHERE wall_id = ?1
               AND (?2 IS NULL OR seq_num >= ?2)
               AND (?3 IS NULL OR seq_num <= ?3)
             ORDER BY seq_num DESC
             LIMIT ?4
           )
           ORDER BY c.seq_num DESC, r.time_created ASC, r.id ASC",
        )?;

        let rows = stmt
          .query_map(
            rusqlite::params![wall_id.0, query.seq_min, query.seq_max, limit],
            |row| {
              Ok(RawCommentRow {
                comment:            RawComment {
                  id:           row.get(0)?,
                  wall_id:      row.get(1)?,
                  seq_num:      row.get(2)?,
                  content:      row.get(3)?,
                  format:       row.get(4)?,
                  user_id:      row.get(5)?,
                  time_created: row.get(6)?,
                },
                reply_id:           row.get(7)?,
                reply_content:      row.get(8)?,
                reply_user_id:      row.get(9)?,
                reply_time_created: row.get(10)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCommentRow::into_row).collect()
  }
}

// ─── UserDirectory impl ──────────────────────────────────────────────────────

impl UserDirectory for SqliteStore {
  type Error = crate::Error;

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, full_name, picture_url, guest FROM users WHERE id = ?1",
              rusqlite::params![id.0],
              |row| {
                Ok(RawUser {
                  id:          row.get(0)?,
                  full_name:   row.get(1)?,
                  picture_url: row.get(2)?,
                  guest:       row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user))
  }
}
