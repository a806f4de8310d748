//! Sequence-number allocation and conflict-safe comment insertion.
//!
//! The next sequence number is computed by a read that races with concurrent
//! writers on the same wall. Instead of locking, the allocator inserts
//! optimistically and lets the store's `(wall, seq_num)` uniqueness
//! constraint arbitrate. A lost race is retried exactly once after a short
//! randomised backoff; a second loss is surfaced as
//! [`Error::ConflictExhausted`].

use std::{future::Future, time::Duration};

use chrono::Utc;
use rand_core::{OsRng, RngCore as _};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  comment::{CommentId, CommentRecord, ContentFormat, SeqNum},
  store::{Insert, WallStore},
  user::{UserDirectory, UserId, require_author},
  wall::WallId,
};

// ─── Sequence source ─────────────────────────────────────────────────────────

/// Strategy computing the next sequence number for a wall.
pub trait SeqSource<S: WallStore>: Send + Sync {
  fn next_seq_num<'a>(
    &'a self,
    store: &'a S,
    wall_id: WallId,
  ) -> impl Future<Output = Result<SeqNum, S::Error>> + Send + 'a;
}

/// `max(seq_num) + 1`, or `1` on an empty wall.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxPlusOne;

impl<S: WallStore> SeqSource<S> for MaxPlusOne {
  async fn next_seq_num<'a>(
    &'a self,
    store: &'a S,
    wall_id: WallId,
  ) -> Result<SeqNum, S::Error> {
    Ok(store.max_seq_num(wall_id).await?.map_or(1, |max| max + 1))
  }
}

// ─── Retry ───────────────────────────────────────────────────────────────────

/// Backoff window slept before the single retry of a conflicting insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub backoff_min: Duration,
  pub backoff_max: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      backoff_min: Duration::from_millis(100),
      backoff_max: Duration::from_millis(500),
    }
  }
}

impl RetryPolicy {
  /// Retry without sleeping.
  pub fn immediate() -> Self {
    Self { backoff_min: Duration::ZERO, backoff_max: Duration::ZERO }
  }

  /// Longest backoff accepted; larger bounds are clamped to it.
  pub const MAX_BACKOFF_MS: u64 = 60_000;

  pub fn from_millis(min: u64, max: u64) -> Self {
    let min = min.min(Self::MAX_BACKOFF_MS);
    let max = max.clamp(min, Self::MAX_BACKOFF_MS);
    Self {
      backoff_min: Duration::from_millis(min),
      backoff_max: Duration::from_millis(max),
    }
  }

  /// A uniformly random delay within the window, at millisecond resolution.
  pub fn jitter(&self) -> Duration {
    let ceiling = u128::from(Self::MAX_BACKOFF_MS);
    let lo = self.backoff_min.as_millis().min(ceiling) as u64;
    let hi = self.backoff_max.as_millis().min(ceiling) as u64;
    if hi <= lo {
      return Duration::from_millis(lo);
    }
    let span = (hi - lo).saturating_add(1);
    Duration::from_millis(lo.saturating_add(OsRng.next_u64() % span))
  }

  async fn backoff(&self) {
    let delay = self.jitter();
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
  }
}

/// Run `attempt`, and if it reports [`Insert::Conflict`], back off and run it
/// exactly once more. Errors are returned as-is without retrying.
pub async fn insert_with_retry<T, F, Fut>(
  policy: &RetryPolicy,
  mut attempt: F,
) -> Result<Insert<T>>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<Insert<T>>>,
{
  if let Insert::Inserted(v) = attempt().await? {
    return Ok(Insert::Inserted(v));
  }
  policy.backoff().await;
  attempt().await
}

// ─── Allocator ───────────────────────────────────────────────────────────────

/// Assigns sequence numbers and inserts comments.
#[derive(Debug, Clone, Default)]
pub struct Allocator<Q = MaxPlusOne> {
  seq:   Q,
  retry: RetryPolicy,
}

impl<Q> Allocator<Q> {
  pub fn new(seq: Q, retry: RetryPolicy) -> Self { Self { seq, retry } }

  /// The sequence number the next comment on `wall_id` would get.
  pub async fn next_seq_num<S>(&self, store: &S, wall_id: WallId) -> Result<SeqNum>
  where
    S: WallStore,
    Q: SeqSource<S>,
  {
    self
      .seq
      .next_seq_num(store, wall_id)
      .await
      .map_err(Error::store)
  }

  /// Validate the author and append a comment to `wall_id`.
  ///
  /// No row is written when the author is rejected.
  pub async fn insert_comment<S, U>(
    &self,
    store: &S,
    users: &U,
    wall_id: WallId,
    content: String,
    format: ContentFormat,
    author: Option<UserId>,
  ) -> Result<CommentId>
  where
    S: WallStore,
    U: UserDirectory,
    Q: SeqSource<S>,
  {
    let author = require_author(users, author).await?;

    let outcome = insert_with_retry(&self.retry, move || {
      let content = content.clone();
      async move {
        let seq_num = self.next_seq_num(store, wall_id).await?;
        let record = CommentRecord {
          wall_id,
          seq_num,
          content,
          format,
          author,
          time_created: Utc::now(),
        };
        let outcome = store.insert_comment(record).await.map_err(Error::store)?;
        if outcome.is_conflict() {
          warn!(%wall_id, seq_num, "sequence number already taken");
        }
        Ok(outcome)
      }
    })
    .await?;

    let id = outcome.inserted().ok_or(Error::ConflictExhausted(wall_id))?;
    debug!(%wall_id, comment_id = %id, %author, "comment inserted");
    Ok(id)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use super::*;

  #[tokio::test]
  async fn first_success_is_not_retried() {
    let calls = Cell::new(0);
    let out = insert_with_retry(&RetryPolicy::immediate(), || {
      calls.set(calls.get() + 1);
      async { Ok(Insert::Inserted(7)) }
    })
    .await
    .unwrap();

    assert_eq!(out, Insert::Inserted(7));
    assert_eq!(calls.get(), 1);
  }

  #[tokio::test]
  async fn conflict_is_retried_exactly_once() {
    let calls = Cell::new(0);
    let out = insert_with_retry(&RetryPolicy::immediate(), || {
      calls.set(calls.get() + 1);
      let n = calls.get();
      async move {
        Ok(if n == 1 { Insert::Conflict } else { Insert::Inserted(n) })
      }
    })
    .await
    .unwrap();

    assert_eq!(out, Insert::Inserted(2));
    assert_eq!(calls.get(), 2);
  }

  #[tokio::test]
  async fn second_conflict_is_returned() {
    let calls = Cell::new(0);
    let out: Insert<i64> = insert_with_retry(&RetryPolicy::immediate(), || {
      calls.set(calls.get() + 1);
      async { Ok(Insert::Conflict) }
    })
    .await
    .unwrap();

    assert!(out.is_conflict());
    assert_eq!(calls.get(), 2);
  }

  #[tokio::test]
  async fn errors_propagate_without_retry() {
    let calls = Cell::new(0);
    let err = insert_with_retry::<i64, _, _>(&RetryPolicy::immediate(), || {
      calls.set(calls.get() + 1);
      async { Err(Error::InvalidCount(0)) }
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::InvalidCount(0)));
    assert_eq!(calls.get(), 1);
  }

  #[test]
  fn jitter_stays_within_window() {
    let policy = RetryPolicy::default();
    for _ in 0..200 {
      let d = policy.jitter();
      assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(500));
    }
    assert_eq!(RetryPolicy::immediate().jitter(), Duration::ZERO);
    assert_eq!(RetryPolicy::from_millis(30, 10).jitter(), Duration::from_millis(30));
  }

  #[test]
  fn oversized_window_is_clamped() {
    let ceiling = Duration::from_millis(RetryPolicy::MAX_BACKOFF_MS);
    let policy = RetryPolicy::from_millis(0, u64::MAX);
    assert_eq!(policy.backoff_max, ceiling);
    for _ in 0..50 {
      assert!(policy.jitter() <= ceiling);
    }

    let pinned = RetryPolicy::from_millis(u64::MAX, u64::MAX);
    assert_eq!(pinned.jitter(), ceiling);
  }

  #[test]
  fn full_width_window_does_not_overflow() {
    let policy = RetryPolicy {
      backoff_min: Duration::ZERO,
      backoff_max: Duration::from_millis(u64::MAX),
    };
    assert!(policy.jitter() <= Duration::from_millis(RetryPolicy::MAX_BACKOFF_MS));
  }
}
