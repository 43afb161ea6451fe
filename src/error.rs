//! Error types for the taskman client.

use thiserror::Error;

/// Errors surfaced by the transport and service layers.
///
/// Pending resources are not errors: a not-yet-settled fetch is reported
/// through [`crate::cache::ResourceState::Pending`], never through this type.
#[derive(Error, Debug)]
pub enum Error {
  /// Network-level failure (connect, timeout, body read, decode).
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The backend rejected the credentials at login.
  #[error("login rejected: {0}")]
  Auth(String),

  /// Bearer token missing, invalid, or expired.
  #[error("authentication failed: invalid or expired token")]
  Unauthorized,

  /// Authenticated, but the resource belongs to another user.
  #[error("not allowed to access {0}")]
  Forbidden(String),

  /// The requested entity does not exist.
  #[error("resource not found: {0}")]
  NotFound(String),

  /// Any other non-success HTTP status.
  #[error("unexpected status {status}: {body}")]
  Status { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, Error>;
