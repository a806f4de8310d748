//! Author identities and the [`UserDirectory`] collaborator port.
//!
//! Users are not owned by the wall. The core only needs to know whether an id
//! names a durable, non-guest account and, when rendering, what to display.

use std::{collections::HashMap, fmt, future::Future};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Display attributes supplied by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:          UserId,
  pub full_name:   String,
  pub picture_url: Option<String>,
  /// Guest/anonymous-only accounts may read walls but never author.
  #[serde(default)]
  pub guest:       bool,
}

impl User {
  /// Stand-in for an author whose account is no longer in the directory.
  pub fn unknown(id: UserId) -> Self {
    Self {
      id,
      full_name: format!("Unknown user {id}"),
      picture_url: None,
      guest: false,
    }
  }
}

/// Lookup of author display data, implemented by the hosting platform.
pub trait UserDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a user by id. Returns `None` if the id is unknown.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;
}

/// Check that `author` names a durable account allowed to comment.
pub async fn require_author<U>(users: &U, author: Option<UserId>) -> Result<UserId>
where
  U: UserDirectory,
{
  let id = match author {
    Some(id) if id.0 >= 1 => id,
    other => return Err(Error::InvalidAuthor(other)),
  };

  match users.get_user(id).await.map_err(Error::store)? {
    Some(user) if !user.guest => Ok(id),
    _ => Err(Error::InvalidAuthor(Some(id))),
  }
}

// ─── Per-request cache ───────────────────────────────────────────────────────

/// Users already resolved during this request, keyed by id.
#[derive(Debug, Default)]
pub struct UserCache {
  users: HashMap<UserId, User>,
}

impl UserCache {
  pub fn new() -> Self { Self::default() }

  /// Return the cached user, consulting `users` only on a miss. Ids that the
  /// directory no longer knows resolve to [`User::unknown`].
  pub async fn resolve<U>(&mut self, users: &U, id: UserId) -> Result<User>
  where
    U: UserDirectory,
  {
    if let Some(user) = self.users.get(&id) {
      return Ok(user.clone());
    }
    let user = users
      .get_user(id)
      .await
      .map_err(Error::store)?
      .unwrap_or_else(|| User::unknown(id));
    self.users.insert(id, user.clone());
    Ok(user)
  }

  pub fn len(&self) -> usize { self.users.len() }

  pub fn is_empty(&self) -> bool { self.users.is_empty() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  struct CountingDirectory {
    lookups: AtomicUsize,
  }

  impl UserDirectory for CountingDirectory {
    type Error = std::convert::Infallible;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
      self.lookups.fetch_add(1, Ordering::SeqCst);
      Ok(match id.0 {
        1 => Some(User {
          id,
          full_name: "Admin User".into(),
          picture_url: None,
          guest: false,
        }),
        2 => Some(User {
          id,
          full_name: "Guest user".into(),
          picture_url: None,
          guest: true,
        }),
        _ => None,
      })
    }
  }

  fn directory() -> CountingDirectory {
    CountingDirectory { lookups: AtomicUsize::new(0) }
  }

  #[tokio::test]
  async fn regular_user_may_author() {
    let dir = directory();
    assert_eq!(require_author(&dir, Some(UserId(1))).await.unwrap(), UserId(1));
  }

  #[tokio::test]
  async fn missing_non_positive_guest_and_unknown_authors_are_rejected() {
    let dir = directory();
    for author in [None, Some(UserId(0)), Some(UserId(-1)), Some(UserId(2)), Some(UserId(99))] {
      let err = require_author(&dir, author).await.unwrap_err();
      assert!(matches!(err, Error::InvalidAuthor(a) if a == author), "{author:?}");
    }
    // Non-positive and missing ids never reach the directory.
    assert_eq!(dir.lookups.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn cache_hits_skip_the_directory() {
    let dir = directory();
    let mut cache = UserCache::new();
    cache.resolve(&dir, UserId(1)).await.unwrap();
    cache.resolve(&dir, UserId(1)).await.unwrap();
    let gone = cache.resolve(&dir, UserId(42)).await.unwrap();

    assert_eq!(gone, User::unknown(UserId(42)));
    assert_eq!(cache.len(), 2);
    assert_eq!(dir.lookups.load(Ordering::SeqCst), 2);
  }
}
