//! JSON REST API for libwall.
//!
//! Exposes an axum [`Router`] backed by a [`WallService`] over any store that
//! implements both [`WallStore`] and [`UserDirectory`]. Authentication, TLS,
//! and transport concerns are the caller's responsibility; the acting user is
//! taken from the [`actor::USER_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", libwall_api::api_router(service.clone()))
//! ```

pub mod actor;
pub mod comments;
pub mod error;
pub mod walls;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use libwall_core::{WallService, store::WallStore, user::UserDirectory};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<WallService<S>>) -> Router<()>
where
  S: WallStore + UserDirectory + Send + Sync + 'static,
{
  Router::new()
    // Walls
    .route("/walls", post(walls::resolve::<S>))
    .route("/walls/{id}", get(walls::export::<S>))
    // Comments
    .route("/walls/{id}/comments", post(comments::add::<S>))
    .route("/comments/{id}/replies", post(comments::reply::<S>))
    .with_state(service)
}
