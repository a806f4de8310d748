//! Hosting layer for libwall: configuration, service assembly, and the HTTP
//! router served by the `libwall` binary.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use libwall_core::{
  WallService,
  allocator::{Allocator, MaxPlusOne, RetryPolicy},
  comment::ContentFormat,
  export::{ExportConfig, Exporter},
  store::WallStore,
  user::UserDirectory,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `libwall.toml` and
/// `LIBWALL_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// Prefix completed by a user id to link to an author's profile.
  pub profile_url:          String,
  pub default_picture_url:  String,
  pub retry_backoff_min_ms: u64,
  pub retry_backoff_max_ms: u64,
  /// Format tag applied to comments submitted without one.
  pub default_format:       i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let export = ExportConfig::default();
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 8080,
      store_path:           PathBuf::from("libwall.db"),
      profile_url:          export.profile_url,
      default_picture_url:  export.default_picture_url,
      retry_backoff_min_ms: 100,
      retry_backoff_max_ms: 500,
      default_format:       ContentFormat::MOODLE.0,
    }
  }
}

impl ServerConfig {
  /// Layer an optional TOML file under `LIBWALL_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LIBWALL").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::from_millis(self.retry_backoff_min_ms, self.retry_backoff_max_ms)
  }

  pub fn export_config(&self) -> ExportConfig {
    ExportConfig {
      profile_url:         self.profile_url.clone(),
      default_picture_url: self.default_picture_url.clone(),
    }
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  /// Assemble a [`WallService`] over `store` using this configuration.
  pub fn build_service<S>(&self, store: Arc<S>) -> WallService<S> {
    WallService::new(store)
      .with_allocator(Allocator::new(MaxPlusOne, self.retry_policy()))
      .with_exporter(Exporter::new(self.export_config()))
      .with_default_format(ContentFormat(self.default_format))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API nested under `/api`, with request tracing.
pub fn router<S>(service: Arc<WallService<S>>) -> Router
where
  S: WallStore + UserDirectory + Send + Sync + 'static,
{
  Router::new()
    .nest("/api", libwall_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
