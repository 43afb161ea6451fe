//! Runtime configuration loaded from a remote JSON document.
//!
//! Deployments ship a `config.json` next to the frontend bundle; it is
//! fetched once per process with cache-defeating parameters and shared by
//! every caller. A failed fetch degrades to a minimal fallback instead of
//! an error, so the application always ends up with some usable
//! configuration. Synchronous readers use [`ConfigService::get`] /
//! [`ConfigService::backend_url`], which answer best-effort without
//! blocking on the load.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::future::{FutureExt, Shared};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Environment variable consulted for the fallback backend URL when the
/// config document cannot be loaded.
pub const BACKEND_URL_ENV: &str = "TASKMAN_BACKEND_URL";

/// The parsed runtime configuration document.
///
/// `BACKEND_URL` is the one key every deployment must provide; anything
/// else the deployment ships is kept verbatim and read via
/// [`ConfigService::get`].
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
  /// Base URL of the REST backend.
  #[serde(rename = "BACKEND_URL")]
  pub backend_url: String,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, Value>,
}

impl RuntimeConfig {
  fn fallback(backend_url: String) -> Self {
    Self {
      backend_url,
      extra: serde_json::Map::new(),
    }
  }
}

type SharedLoad = Shared<Pin<Box<dyn Future<Output = RuntimeConfig> + Send>>>;

enum LoadState {
  Unloaded,
  Loading(SharedLoad),
  Loaded(RuntimeConfig),
}

/// `generation` guards the Loading -> Loaded transition: a load started
/// before a `reload` must not clobber the newer result when it settles.
struct LoadSlot {
  generation: u64,
  state: LoadState,
}

struct ConfigInner {
  http: reqwest::Client,
  config_url: String,
  fallback_backend_url: String,
  slot: Mutex<LoadSlot>,
}

/// Loader for the runtime configuration document.
///
/// Lifecycle is `Unloaded -> Loading -> Loaded`. The first [`load`] starts
/// the fetch; concurrent loads while in flight all await the same shared
/// operation, so exactly one request goes out. Settling always reaches
/// `Loaded`: fetch failure, an error status, and a malformed body all
/// resolve to the fallback config rather than an error.
///
/// Construct one per process and hand clones to whoever needs it; clones
/// share the loaded state.
///
/// [`load`]: ConfigService::load
#[derive(Clone)]
pub struct ConfigService {
  inner: Arc<ConfigInner>,
}

impl ConfigService {
  /// `config_url` points at the deployed document, e.g.
  /// `https://tasks.example.com/config.json`. The fallback backend URL is
  /// taken from `TASKMAN_BACKEND_URL` (empty string when unset).
  pub fn new(config_url: impl Into<String>) -> Self {
    let fallback = std::env::var(BACKEND_URL_ENV).unwrap_or_default();
    Self::with_fallback(config_url, fallback)
  }

  /// Like [`ConfigService::new`] with an explicit fallback backend URL.
  /// Tests pass the fallback directly instead of mutating env vars.
  pub fn with_fallback(
    config_url: impl Into<String>,
    fallback_backend_url: impl Into<String>,
  ) -> Self {
    Self {
      inner: Arc::new(ConfigInner {
        http: reqwest::Client::new(),
        config_url: config_url.into(),
        fallback_backend_url: fallback_backend_url.into(),
        slot: Mutex::new(LoadSlot {
          generation: 0,
          state: LoadState::Unloaded,
        }),
      }),
    }
  }

  /// Return the loaded config, joining the in-flight load or starting one.
  ///
  /// Never fails; the worst outcome is the fallback config.
  pub async fn load(&self) -> RuntimeConfig {
    let pending = {
      let mut slot = self.inner.slot.lock().expect("config lock poisoned");
      match &slot.state {
        LoadState::Loaded(config) => return config.clone(),
        LoadState::Loading(pending) => pending.clone(),
        LoadState::Unloaded => {
          let inner = Arc::clone(&self.inner);
          let generation = slot.generation;
          let fetch: Pin<Box<dyn Future<Output = RuntimeConfig> + Send>> =
            Box::pin(async move {
              let config = inner.fetch_or_fallback().await;
              let mut slot = inner.slot.lock().expect("config lock poisoned");
              if slot.generation == generation {
                slot.state = LoadState::Loaded(config.clone());
              }
              config
            });
          let pending = fetch.shared();
          slot.state = LoadState::Loading(pending.clone());
          pending
        }
      }
    };

    pending.await
  }

  /// Discard the cached config and any in-flight load, then load fresh.
  /// Used to pick up configuration changes without a restart.
  pub async fn reload(&self) -> RuntimeConfig {
    {
      let mut slot = self.inner.slot.lock().expect("config lock poisoned");
      slot.generation += 1;
      slot.state = LoadState::Unloaded;
    }
    self.load().await
  }

  /// Best-effort synchronous lookup of a config key.
  ///
  /// Returns `None` while the config is not loaded or when the key is
  /// absent. Never blocks.
  pub fn get(&self, key: &str) -> Option<Value> {
    let slot = self.inner.slot.lock().expect("config lock poisoned");
    match &slot.state {
      LoadState::Loaded(config) => match key {
        "BACKEND_URL" => Some(Value::String(config.backend_url.clone())),
        _ => config.extra.get(key).cloned(),
      },
      _ => None,
    }
  }

  /// [`get`](ConfigService::get) with a default for the unloaded/absent cases.
  pub fn get_or(&self, key: &str, default: Value) -> Value {
    self.get(key).unwrap_or(default)
  }

  /// The backend base URL: the loaded value, or the fallback while the
  /// config is not loaded.
  pub fn backend_url(&self) -> String {
    let slot = self.inner.slot.lock().expect("config lock poisoned");
    match &slot.state {
      LoadState::Loaded(config) => config.backend_url.clone(),
      _ => self.inner.fallback_backend_url.clone(),
    }
  }

  pub fn is_loaded(&self) -> bool {
    let slot = self.inner.slot.lock().expect("config lock poisoned");
    matches!(slot.state, LoadState::Loaded(_))
  }
}

impl ConfigInner {
  /// One fetch attempt with cache-defeating parameters. Every failure mode
  /// collapses into the fallback config; this never returns an error.
  async fn fetch_or_fallback(&self) -> RuntimeConfig {
    let url = format!(
      "{}?t={}",
      self.config_url,
      Utc::now().timestamp_millis()
    );

    let response = self
      .http
      .get(&url)
      .header(CACHE_CONTROL, "no-cache")
      .header(PRAGMA, "no-cache")
      .send()
      .await;

    match response {
      Ok(response) if response.status().is_success() => {
        match response.json::<RuntimeConfig>().await {
          Ok(config) => {
            debug!(backend_url = %config.backend_url, "runtime config loaded");
            config
          }
          Err(error) => {
            warn!(%error, "config document is not valid JSON, using fallback");
            self.fallback()
          }
        }
      }
      Ok(response) => {
        warn!(status = %response.status(), "config fetch answered an error status, using fallback");
        self.fallback()
      }
      Err(error) => {
        warn!(%error, "config fetch failed, using fallback");
        self.fallback()
      }
    }
  }

  fn fallback(&self) -> RuntimeConfig {
    RuntimeConfig::fallback(self.fallback_backend_url.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::extract::RawQuery;
  use axum::routing::get;
  use axum::{Json, Router};
  use std::sync::atomic::{AtomicUsize, Ordering};

  async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn config_router(
    hits: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
  ) -> Router {
    Router::new().route(
      "/config.json",
      get(move |RawQuery(query): RawQuery| {
        let hits = Arc::clone(&hits);
        let queries = Arc::clone(&queries);
        async move {
          hits.fetch_add(1, Ordering::SeqCst);
          queries.lock().unwrap().push(query.unwrap_or_default());
          Json(serde_json::json!({
            "BACKEND_URL": "http://backend:8080",
            "FEATURE_CALENDAR": true
          }))
        }
      }),
    )
  }

  #[tokio::test]
  async fn test_load_uses_cache_busting_query() {
    let hits = Arc::new(AtomicUsize::new(0));
    let queries = Arc::new(Mutex::new(Vec::new()));
    let base = serve(config_router(Arc::clone(&hits), Arc::clone(&queries))).await;

    let service = ConfigService::with_fallback(format!("{base}/config.json"), "");
    let config = service.load().await;

    assert_eq!(config.backend_url, "http://backend:8080");
    let queries = queries.lock().unwrap();
    assert!(queries[0].starts_with("t="));
    assert!(queries[0][2..].chars().all(|c| c.is_ascii_digit()));
  }

  #[tokio::test]
  async fn test_load_fetches_once_and_caches() {
    let hits = Arc::new(AtomicUsize::new(0));
    let queries = Arc::new(Mutex::new(Vec::new()));
    let base = serve(config_router(Arc::clone(&hits), queries)).await;

    let service = ConfigService::with_fallback(format!("{base}/config.json"), "");
    let first = service.load().await;
    let second = service.load().await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(first.backend_url, second.backend_url);
    assert!(service.is_loaded());
  }

  #[tokio::test]
  async fn test_concurrent_loads_share_one_fetch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let queries = Arc::new(Mutex::new(Vec::new()));
    let base = serve(config_router(Arc::clone(&hits), queries)).await;

    let service = ConfigService::with_fallback(format!("{base}/config.json"), "");
    let (a, b, c) = tokio::join!(service.load(), service.load(), service.load());

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(a.backend_url, "http://backend:8080");
    assert_eq!(b.backend_url, a.backend_url);
    assert_eq!(c.backend_url, a.backend_url);
  }

  #[tokio::test]
  async fn test_fetch_failure_falls_back_to_env_default() {
    // Nothing listens here; the connection is refused immediately.
    let service =
      ConfigService::with_fallback("http://127.0.0.1:1/config.json", "http://fallback:8080");
    let config = service.load().await;

    assert_eq!(config.backend_url, "http://fallback:8080");
    assert!(service.is_loaded());
  }

  #[tokio::test]
  async fn test_error_status_falls_back() {
    let router = Router::new().route(
      "/config.json",
      get(|| async { (axum::http::StatusCode::NOT_FOUND, "missing") }),
    );
    let base = serve(router).await;

    let service =
      ConfigService::with_fallback(format!("{base}/config.json"), "http://fallback:8080");
    let config = service.load().await;

    assert_eq!(config.backend_url, "http://fallback:8080");
  }

  #[tokio::test]
  async fn test_fallback_is_empty_without_default() {
    let service = ConfigService::with_fallback("http://127.0.0.1:1/config.json", "");
    let config = service.load().await;

    assert_eq!(config.backend_url, "");
  }

  #[tokio::test]
  async fn test_get_answers_default_before_load_and_value_after() {
    let hits = Arc::new(AtomicUsize::new(0));
    let queries = Arc::new(Mutex::new(Vec::new()));
    let base = serve(config_router(hits, queries)).await;

    let service = ConfigService::with_fallback(format!("{base}/config.json"), "");

    assert_eq!(service.get("FEATURE_CALENDAR"), None);
    assert_eq!(
      service.get_or("FEATURE_CALENDAR", Value::Bool(false)),
      Value::Bool(false)
    );

    service.load().await;

    assert_eq!(service.get("FEATURE_CALENDAR"), Some(Value::Bool(true)));
    assert_eq!(
      service.get("BACKEND_URL"),
      Some(Value::String("http://backend:8080".to_string()))
    );
    assert_eq!(service.get("NOT_A_KEY"), None);
  }

  #[tokio::test]
  async fn test_reload_fetches_again() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_handler = Arc::clone(&hits);
    let router = Router::new().route(
      "/config.json",
      get(move || {
        let hits = Arc::clone(&hits_handler);
        async move {
          let n = hits.fetch_add(1, Ordering::SeqCst);
          Json(serde_json::json!({ "BACKEND_URL": format!("http://server{n}:8080") }))
        }
      }),
    );
    let base = serve(router).await;

    let service = ConfigService::with_fallback(format!("{base}/config.json"), "");
    let first = service.load().await;
    let second = service.reload().await;

    assert_eq!(first.backend_url, "http://server0:8080");
    assert_eq!(second.backend_url, "http://server1:8080");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(service.backend_url(), "http://server1:8080");
  }
}
