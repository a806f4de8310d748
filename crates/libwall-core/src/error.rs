//! Error types for `libwall-core`.

use thiserror::Error;

use crate::{
  comment::CommentId,
  user::UserId,
  wall::{Location, WallId},
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("wall not found: {0}")]
  WallNotFound(WallId),

  #[error("comment not found: {0}")]
  CommentNotFound(CommentId),

  /// Missing, non-positive, unknown or guest author.
  #[error("invalid comment author: {0:?}")]
  InvalidAuthor(Option<UserId>),

  #[error("invalid wall location: {0}")]
  InvalidLocation(String),

  #[error("invalid sequence range: min {min} > max {max}")]
  InvalidRange { min: i64, max: i64 },

  #[error("invalid comment count: {0}")]
  InvalidCount(i64),

  /// The sequence-number race persisted through the single allowed retry.
  #[error("sequence number conflict persisted after retry on wall {0}")]
  ConflictExhausted(WallId),

  /// A wall creation lost a race but the winner's row is not visible either.
  #[error("wall at {0} vanished after a creation conflict")]
  WallVanished(Location),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error; used with `map_err` at every port call.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Stable machine-readable name of the error kind.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::WallNotFound(_) | Self::CommentNotFound(_) => "not_found",
      Self::InvalidAuthor(_) => "invalid_author",
      Self::InvalidLocation(_) => "invalid_location",
      Self::InvalidRange { .. } => "invalid_range",
      Self::InvalidCount(_) => "invalid_count",
      Self::ConflictExhausted(_) => "conflict_exhausted",
      Self::WallVanished(_) => "inconsistent",
      Self::Store(_) => "store",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
