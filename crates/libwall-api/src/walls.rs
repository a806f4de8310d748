//! Handlers for `/walls` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/walls` | Body: [`LocationBody`]; resolves or lazily creates the wall |
//! | `GET`  | `/walls/{id}` | Optional `seqMin`, `seqMax`, `countMax`; full export |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use libwall_core::{
  WallService,
  comment::{ContentFormat, SeqNum},
  export::ExportedWall,
  loader::LoadQuery,
  store::WallStore,
  user::UserDirectory,
  wall::{Location, WallHandle, WallId},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Resolve ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /walls`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBody {
  pub context_id: i64,
  pub component:  String,
  #[serde(default)]
  pub area:       String,
  #[serde(default)]
  pub item_id:    i64,
}

impl From<LocationBody> for Location {
  fn from(b: LocationBody) -> Self {
    Location::new(b.context_id, b.component)
      .with_area(b.area)
      .with_item(b.item_id)
  }
}

/// A resolved wall as returned by `POST /walls`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallBody {
  pub id:             WallId,
  pub context_id:     i64,
  pub component:      String,
  pub area:           String,
  pub item_id:        i64,
  pub time_created:   DateTime<Utc>,
  pub default_format: ContentFormat,
}

impl From<WallHandle> for WallBody {
  fn from(h: WallHandle) -> Self {
    let default_format = h.default_format();
    let wall = h.wall;
    WallBody {
      id: wall.id,
      context_id: wall.location.context_id,
      component: wall.location.component,
      area: wall.location.area,
      item_id: wall.location.item_id,
      time_created: wall.time_created,
      default_format,
    }
  }
}

/// `POST /walls`, body: `{"contextId":1,"component":"block_foobar"}`
pub async fn resolve<S>(
  State(service): State<Arc<WallService<S>>>,
  Json(body): Json<LocationBody>,
) -> Result<Json<WallBody>, ApiError>
where
  S: WallStore + UserDirectory + Send + Sync + 'static,
{
  let handle = service.resolve_or_create(&Location::from(body)).await?;
  Ok(Json(WallBody::from(handle)))
}

// ─── Export ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
  pub seq_min:   Option<SeqNum>,
  pub seq_max:   Option<SeqNum>,
  /// Keep only the N most recent comments in the window.
  pub count_max: Option<i64>,
}

impl From<ExportParams> for LoadQuery {
  fn from(p: ExportParams) -> Self {
    LoadQuery {
      seq_min:   p.seq_min,
      seq_max:   p.seq_max,
      count_max: p.count_max,
    }
  }
}

/// `GET /walls/{id}[?seqMin=...][&seqMax=...][&countMax=...]`
pub async fn export<S>(
  State(service): State<Arc<WallService<S>>>,
  Path(id): Path<i64>,
  Query(params): Query<ExportParams>,
) -> Result<Json<ExportedWall>, ApiError>
where
  S: WallStore + UserDirectory + Send + Sync + 'static,
{
  let handle = service.resolve_by_id(WallId(id)).await?;
  let view = service.load(handle, LoadQuery::from(params)).await?;
  Ok(Json(service.export_wall(&view)))
}
