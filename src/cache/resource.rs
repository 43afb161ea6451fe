//! A single fetch wrapped as a synchronously readable resource.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::{FutureExt, Shared};

use crate::error::Error;

/// Readiness of a [`Resource`] at the moment [`Resource::read`] is called.
#[derive(Debug, Clone)]
pub enum ResourceState<T> {
  /// The fetch has not settled yet. Not an error; wait and read again,
  /// or use [`Resource::ready`] to be woken on settle.
  Pending,
  /// The fetch resolved. Every read returns the same value.
  Ready(T),
  /// The fetch failed. Every read reports the same error.
  Failed(Arc<Error>),
}

impl<T> ResourceState<T> {
  pub fn is_pending(&self) -> bool {
    matches!(self, ResourceState::Pending)
  }

  pub fn is_ready(&self) -> bool {
    matches!(self, ResourceState::Ready(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, ResourceState::Failed(_))
  }

  pub fn value(&self) -> Option<&T> {
    match self {
      ResourceState::Ready(value) => Some(value),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&Error> {
    match self {
      ResourceState::Failed(error) => Some(error),
      _ => None,
    }
  }
}

/// The fetch future behind a resource. Errors are wrapped in `Arc` so the
/// settled output stays cloneable across readers.
type SharedFetch<T> = Shared<Pin<Box<dyn Future<Output = Result<T, Arc<Error>>> + Send>>>;

/// An asynchronous value with a synchronous readiness check.
///
/// All clones of a resource poll one shared future: the wrapped fetch
/// executes at most once, and every waiter is woken by the same settle.
/// State is one-directional, pending until settled; a resource never goes
/// back to pending. Re-fetching means creating a new resource via
/// [`super::ResourceCache::get_or_create`] after invalidation.
pub struct Resource<T: Clone> {
  fetch: SharedFetch<T>,
}

impl<T: Clone> Clone for Resource<T> {
  fn clone(&self) -> Self {
    Self {
      fetch: self.fetch.clone(),
    }
  }
}

impl<T: Clone + Send + Sync + 'static> Resource<T> {
  /// Wrap a fetch future. The future does not run until polled; the owning
  /// cache spawns a driver so it settles even with no readers.
  pub(crate) fn new<Fut>(fetch: Fut) -> Self
  where
    Fut: Future<Output = crate::error::Result<T>> + Send + 'static,
  {
    let fetch: Pin<Box<dyn Future<Output = Result<T, Arc<Error>>> + Send>> =
      Box::pin(async move { fetch.await.map_err(Arc::new) });

    Self {
      fetch: fetch.shared(),
    }
  }

  /// Non-blocking readiness check.
  pub fn read(&self) -> ResourceState<T> {
    match self.fetch.peek() {
      None => ResourceState::Pending,
      Some(Ok(value)) => ResourceState::Ready(value.clone()),
      Some(Err(error)) => ResourceState::Failed(Arc::clone(error)),
    }
  }

  /// Wait for the fetch to settle and return its outcome.
  pub async fn ready(&self) -> Result<T, Arc<Error>> {
    self.fetch.clone().await
  }
}

impl<T: Clone + Send + Sync + 'static> std::fmt::Debug for Resource<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = match self.fetch.peek() {
      None => "pending",
      Some(Ok(_)) => "ready",
      Some(Err(_)) => "failed",
    };
    f.debug_struct("Resource").field("state", &state).finish()
  }
}
