//! Range loader: reads a window of a wall's comments with their replies.
//!
//! Comments are produced newest first (descending sequence number); replies
//! within a comment oldest first, with no defined order among replies created
//! in the same second.

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  comment::{CommentRow, LoadedComment, LoadedReply, SeqNum},
  store::{CommentQuery, WallStore},
  user::{UserCache, UserDirectory},
  wall::WallHandle,
};

/// Bounds for [`WallView::load`]. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadQuery {
  pub seq_min:   Option<SeqNum>,
  pub seq_max:   Option<SeqNum>,
  /// Maximum number of comments (not rows) to return, most recent first.
  pub count_max: Option<i64>,
}

impl LoadQuery {
  pub fn all() -> Self { Self::default() }

  /// Everything a client holding `high_water_mark` has not seen yet.
  pub fn newer_than(high_water_mark: SeqNum) -> Self {
    Self { seq_min: Some(high_water_mark.saturating_add(1)), ..Self::default() }
  }

  pub fn latest(count: i64) -> Self {
    Self { count_max: Some(count), ..Self::default() }
  }

  fn to_store_query(self) -> Result<CommentQuery> {
    if let (Some(min), Some(max)) = (self.seq_min, self.seq_max)
      && max < min
    {
      return Err(Error::InvalidRange { min, max });
    }

    let limit = match self.count_max {
      Some(count) if count < 1 => return Err(Error::InvalidCount(count)),
      Some(count) => Some(usize::try_from(count).unwrap_or(usize::MAX)),
      None => None,
    };

    Ok(CommentQuery { seq_min: self.seq_min, seq_max: self.seq_max, limit })
  }
}

/// A wall together with the comments loaded into it during one request.
///
/// The user cache survives successive loads so that an author appearing on
/// many comments is looked up once per request.
#[derive(Debug)]
pub struct WallView {
  handle:   WallHandle,
  comments: BTreeMap<SeqNum, LoadedComment>,
  users:    UserCache,
}

impl WallView {
  pub fn new(handle: WallHandle) -> Self {
    Self { handle, comments: BTreeMap::new(), users: UserCache::new() }
  }

  pub fn handle(&self) -> &WallHandle { &self.handle }

  /// Replace the loaded comments with those matching `query`.
  ///
  /// Returns the number of comments loaded.
  pub async fn load<S, U>(
    &mut self,
    store: &S,
    users: &U,
    query: LoadQuery,
  ) -> Result<usize>
  where
    S: WallStore,
    U: UserDirectory,
  {
    let store_query = query.to_store_query()?;
    self.comments.clear();

    let rows = store
      .comment_rows(self.handle.id(), store_query)
      .await
      .map_err(Error::store)?;

    for CommentRow { comment, reply } in rows {
      let seq = comment.seq_num;

      if !self.comments.contains_key(&seq) {
        if store_query.limit.is_some_and(|max| self.comments.len() >= max) {
          break;
        }
        let author = self.users.resolve(users, comment.author).await?;
        self
          .comments
          .insert(seq, LoadedComment { comment, author, replies: Vec::new() });
      }

      if let Some(reply) = reply {
        let author = self.users.resolve(users, reply.author).await?;
        if let Some(loaded) = self.comments.get_mut(&seq) {
          loaded.replies.push(LoadedReply { reply, author });
        }
      }
    }

    Ok(self.comments.len())
  }

  /// Loaded comments, newest first.
  pub fn comments(&self) -> impl Iterator<Item = &LoadedComment> {
    self.comments.values().rev()
  }

  pub fn get(&self, seq_num: SeqNum) -> Option<&LoadedComment> {
    self.comments.get(&seq_num)
  }

  pub fn len(&self) -> usize { self.comments.len() }

  pub fn is_empty(&self) -> bool { self.comments.is_empty() }

  pub fn max_seq_num(&self) -> Option<SeqNum> {
    self.comments.keys().next_back().copied()
  }

  pub fn min_seq_num(&self) -> Option<SeqNum> {
    self.comments.keys().next().copied()
  }

  pub fn users(&self) -> &UserCache { &self.users }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inverted_range_is_rejected() {
    let q = LoadQuery { seq_min: Some(5), seq_max: Some(4), count_max: None };
    assert!(matches!(
      q.to_store_query(),
      Err(Error::InvalidRange { min: 5, max: 4 })
    ));
  }

  #[test]
  fn single_point_range_is_allowed() {
    let q = LoadQuery { seq_min: Some(3), seq_max: Some(3), count_max: None };
    let sq = q.to_store_query().unwrap();
    assert_eq!((sq.seq_min, sq.seq_max), (Some(3), Some(3)));
  }

  #[test]
  fn count_below_one_is_rejected() {
    for count in [0, -2] {
      assert!(matches!(
        LoadQuery::latest(count).to_store_query(),
        Err(Error::InvalidCount(c)) if c == count
      ));
    }
    assert_eq!(LoadQuery::latest(2).to_store_query().unwrap().limit, Some(2));
  }

  #[test]
  fn newer_than_starts_after_high_water_mark() {
    assert_eq!(LoadQuery::newer_than(0).seq_min, Some(1));
    assert_eq!(LoadQuery::newer_than(7).seq_min, Some(8));
  }
}
