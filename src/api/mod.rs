//! Typed access to the task manager REST backend.
//!
//! [`client::ApiClient`] is the plain transport; [`cached_client::CachedClient`]
//! layers the per-domain resource caches on top. [`auth`] covers the OAuth2
//! redirect/callback contract the backend exposes.

pub mod auth;
mod cached_client;
mod client;
mod types;

pub use cached_client::CachedClient;
pub use client::ApiClient;
pub use types::{
  ActionType, AuthToken, CalendarEvent, Credentials, ListElement, NewUser, RegisterOutcome, Task,
  TaskAction, TaskEvent, TaskList, TaskPriority, TaskState,
};
