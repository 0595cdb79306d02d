//! HTTP server assembly for the Bazaar analytics API.
//!
//! The binary in `main.rs` is a thin shell over [`load_config`] and [`app`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use bazaar_core::source::EventSource;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BAZAAR_*` environment variables. Every field is optional.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  /// Cached timeline responses; `0` disables the cache.
  pub cache_capacity: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           "127.0.0.1".to_owned(),
      port:           8080,
      store_path:     PathBuf::from("bazaar.db"),
      cache_capacity: 256,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Layer the optional TOML file at `path` under the environment.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("BAZAAR").try_parsing(true))
    .build()?
    .try_deserialize()
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

// ─── Router ──────────────────────────────────────────────────────────────────

/// The analytics API over `source`, with request tracing.
pub fn app<S>(source: Arc<S>, config: &ServerConfig) -> Router
where
  S: EventSource + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  bazaar_api::api_router(source, config.cache_capacity)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use bazaar_store_sqlite::SqliteEventStore;
  use tower::ServiceExt as _;

  use super::*;

  fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("bazaar-{name}-{}.toml", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let path = Path::new("/nonexistent/bazaar-config.toml");
    let config = load_config(path).unwrap();
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.address(), "127.0.0.1:8080");
  }

  #[test]
  fn file_overrides_some_fields() {
    let path = temp_config(
      "partial",
      "port = 9191\nstore_path = \"/var/lib/bazaar/events.db\"\n",
    );
    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.port, 9191);
    assert_eq!(config.store_path, PathBuf::from("/var/lib/bazaar/events.db"));
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.cache_capacity, 256);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(
      expand_tilde(Path::new("~/bazaar.db")),
      PathBuf::from(home).join("bazaar.db")
    );
    assert_eq!(
      expand_tilde(Path::new("/srv/bazaar.db")),
      PathBuf::from("/srv/bazaar.db")
    );
  }

  #[tokio::test]
  async fn app_serves_series_catalogue() {
    let store = SqliteEventStore::open_in_memory().await.unwrap();
    let app = app(Arc::new(store), &ServerConfig::default());

    let req = Request::builder()
      .uri("/analytics/series")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 6);
  }
}
