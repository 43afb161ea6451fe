//! Keyed resource cache for suspense-style data fetching.
//!
//! This module lets a synchronous caller request data backed by an
//! asynchronous fetch without managing future state directly:
//! - A [`Resource`] wraps one fetch as a shared future with a
//!   non-blocking readiness check
//! - A [`ResourceCache`] maps string keys to resources with single-flight
//!   semantics: at most one in-flight fetch per key at any time
//! - Invalidation deletes the entry; the next request re-fetches

mod resource;
mod store;

pub use resource::{Resource, ResourceState};
pub use store::ResourceCache;
