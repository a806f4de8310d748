//! The wall: a per-location envelope that comments attach to.
//!
//! A wall holds only identity metadata. It is created lazily the first time
//! its location is resolved and is never updated afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, comment::ContentFormat};

/// Surrogate key of a wall row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WallId(pub i64);

impl fmt::Display for WallId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// What a wall is attached to. At most one wall exists per distinct location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
  pub context_id: i64,
  /// Owning plugin or subsystem, e.g. `"block_foobar"`.
  pub component:  String,
  #[serde(default)]
  pub area:       String,
  #[serde(default)]
  pub item_id:    i64,
}

impl Location {
  pub fn new(context_id: i64, component: impl Into<String>) -> Self {
    Self {
      context_id,
      component: component.into(),
      area: String::new(),
      item_id: 0,
    }
  }

  pub fn with_area(mut self, area: impl Into<String>) -> Self {
    self.area = area.into();
    self
  }

  pub fn with_item(mut self, item_id: i64) -> Self {
    self.item_id = item_id;
    self
  }

  /// Reject locations that cannot name anything.
  pub fn validate(&self) -> Result<()> {
    if self.component.trim().is_empty() {
      return Err(Error::InvalidLocation("empty component".into()));
    }
    Ok(())
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}/{}/{}/{}",
      self.context_id, self.component, self.area, self.item_id
    )
  }
}

/// A persisted wall row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
  pub id:           WallId,
  pub location:     Location,
  pub time_created: DateTime<Utc>,
}

/// A resolved wall plus per-request presentation settings.
#[derive(Debug, Clone)]
pub struct WallHandle {
  pub wall:       Wall,
  default_format: ContentFormat,
}

impl WallHandle {
  pub fn new(wall: Wall) -> Self {
    Self { wall, default_format: ContentFormat::default() }
  }

  pub fn id(&self) -> WallId { self.wall.id }

  pub fn default_format(&self) -> ContentFormat { self.default_format }

  /// Format applied to comments added without an explicit one.
  pub fn set_default_format(&mut self, format: ContentFormat) {
    self.default_format = format;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn location_defaults_to_empty_area_and_item_zero() {
    let loc = Location::new(1, "block_foobar");
    assert_eq!(loc.area, "");
    assert_eq!(loc.item_id, 0);
    assert_eq!(loc.to_string(), "1/block_foobar//0");
  }

  #[test]
  fn empty_component_is_rejected() {
    let err = Location::new(1, "  ").validate().unwrap_err();
    assert_eq!(err.kind(), "invalid_location");
  }

  #[test]
  fn location_body_without_area_deserializes() {
    let loc: Location =
      serde_json::from_str(r#"{"context_id":1,"component":"core"}"#).unwrap();
    assert_eq!(loc, Location::new(1, "core"));
  }
}
