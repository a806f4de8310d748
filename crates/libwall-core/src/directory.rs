//! Wall directory: maps a [`Location`] to its wall, creating it on first use.

use chrono::Utc;
use tracing::debug;

use crate::{
  Error, Result,
  store::{Insert, WallStore},
  wall::{Location, Wall, WallId},
};

/// Return the wall at `location`, creating it if it does not exist yet.
///
/// Concurrent first access is resolved optimistically: a creation that loses
/// the uniqueness race is discarded and the winner's row is read back.
pub async fn resolve_or_create<S>(store: &S, location: &Location) -> Result<Wall>
where
  S: WallStore,
{
  location.validate()?;

  if let Some(wall) = store.find_wall(location).await.map_err(Error::store)? {
    return Ok(wall);
  }

  match store
    .insert_wall(location.clone(), Utc::now())
    .await
    .map_err(Error::store)?
  {
    Insert::Inserted(id) => debug!(wall_id = %id, %location, "created wall"),
    Insert::Conflict => {
      debug!(%location, "wall created concurrently, reading it back")
    }
  }

  store
    .find_wall(location)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::WallVanished(location.clone()))
}

/// Return the wall with the given id.
pub async fn resolve_by_id<S>(store: &S, id: WallId) -> Result<Wall>
where
  S: WallStore,
{
  store
    .get_wall(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::WallNotFound(id))
}
