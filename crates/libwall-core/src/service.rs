//! [`WallService`]: the wall operations composed over one backend.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::{
  Error, Result,
  allocator::{Allocator, MaxPlusOne, SeqSource},
  comment::{CommentId, ContentFormat, ReplyId, ReplyRecord, SeqNum},
  directory,
  export::{CommentDelta, ExportedWall, Exporter, ExportConfig, WallMark},
  loader::{LoadQuery, WallView},
  store::WallStore,
  user::{UserDirectory, UserId, require_author},
  wall::{Location, Wall, WallHandle, WallId},
};

/// Entry point for callers: resolves walls, adds comments and replies, and
/// loads and exports comment windows.
///
/// The backend `S` provides both persistence and user lookup. Cloning is
/// cheap when `Q` is.
pub struct WallService<S, Q = MaxPlusOne> {
  store:          Arc<S>,
  allocator:      Allocator<Q>,
  exporter:       Exporter,
  default_format: ContentFormat,
}

impl<S, Q: Clone> Clone for WallService<S, Q> {
  fn clone(&self) -> Self {
    Self {
      store:          Arc::clone(&self.store),
      allocator:      self.allocator.clone(),
      exporter:       self.exporter.clone(),
      default_format: self.default_format,
    }
  }
}

impl<S> WallService<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      allocator: Allocator::default(),
      exporter: Exporter::new(ExportConfig::default()),
      default_format: ContentFormat::default(),
    }
  }
}

impl<S, Q> WallService<S, Q> {
  /// Swap the allocator, e.g. to change the sequence strategy or backoff.
  pub fn with_allocator<Q2>(self, allocator: Allocator<Q2>) -> WallService<S, Q2> {
    WallService {
      store: self.store,
      allocator,
      exporter: self.exporter,
      default_format: self.default_format,
    }
  }

  pub fn with_exporter(mut self, exporter: Exporter) -> Self {
    self.exporter = exporter;
    self
  }

  /// Format given to comments whose caller does not name one.
  pub fn with_default_format(mut self, format: ContentFormat) -> Self {
    self.default_format = format;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  fn handle(&self, wall: Wall) -> WallHandle {
    let mut handle = WallHandle::new(wall);
    handle.set_default_format(self.default_format);
    handle
  }
}

impl<S, Q> WallService<S, Q>
where
  S: WallStore + UserDirectory,
  Q: SeqSource<S>,
{
  // ── Directory ─────────────────────────────────────────────────────────

  pub async fn resolve_or_create(&self, location: &Location) -> Result<WallHandle> {
    let wall = directory::resolve_or_create(&*self.store, location).await?;
    Ok(self.handle(wall))
  }

  pub async fn resolve_by_id(&self, id: WallId) -> Result<WallHandle> {
    let wall = directory::resolve_by_id(&*self.store, id).await?;
    Ok(self.handle(wall))
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Append a comment; `format` defaults to the wall's default format.
  pub async fn add_comment(
    &self,
    wall: &WallHandle,
    content: String,
    format: Option<ContentFormat>,
    author: Option<UserId>,
  ) -> Result<CommentId> {
    let format = format.unwrap_or(wall.default_format());
    self
      .allocator
      .insert_comment(&*self.store, &*self.store, wall.id(), content, format, author)
      .await
  }

  /// Attach a reply to an existing comment.
  pub async fn add_reply(
    &self,
    comment_id: CommentId,
    content: String,
    author: Option<UserId>,
  ) -> Result<ReplyId> {
    let author = require_author(&*self.store, author).await?;

    self
      .store
      .get_comment(comment_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CommentNotFound(comment_id))?;

    let id = self
      .store
      .insert_reply(ReplyRecord {
        comment_id,
        content,
        author,
        time_created: Utc::now(),
      })
      .await
      .map_err(Error::store)?;

    debug!(%comment_id, reply_id = id.0, %author, "reply inserted");
    Ok(id)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn load(&self, wall: WallHandle, query: LoadQuery) -> Result<WallView> {
    let mut view = WallView::new(wall);
    view.load(&*self.store, &*self.store, query).await?;
    Ok(view)
  }

  /// Highest sequence number on the whole wall, `0` when it is empty.
  pub async fn max_seq_num(&self, wall_id: WallId) -> Result<SeqNum> {
    Ok(
      self
        .store
        .max_seq_num(wall_id)
        .await
        .map_err(Error::store)?
        .unwrap_or(0),
    )
  }

  pub fn export_wall(&self, view: &WallView) -> ExportedWall {
    self.exporter.export_wall(view, Utc::now())
  }

  // ── Composite ─────────────────────────────────────────────────────────

  /// Add a comment and return everything newer than `client_max_seq_num`,
  /// including the new comment, plus the wall's new high-water mark.
  ///
  /// The mark is taken over the whole wall, so it stays correct when other
  /// writers append between the insert and the load.
  pub async fn add_comment_and_fetch_delta(
    &self,
    wall_id: WallId,
    content: String,
    format: Option<ContentFormat>,
    author: Option<UserId>,
    client_max_seq_num: SeqNum,
  ) -> Result<CommentDelta> {
    let wall = self.resolve_by_id(wall_id).await?;
    self.add_comment(&wall, content, format, author).await?;

    let view = self.load(wall, LoadQuery::newer_than(client_max_seq_num)).await?;
    let max_seq_num = self.max_seq_num(wall_id).await?;

    Ok(CommentDelta {
      wall:     WallMark { id: wall_id, max_seq_num },
      comments: self.exporter.export_comments(&view, Utc::now()),
    })
  }
}
