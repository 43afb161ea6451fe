//! Wire types for the task manager REST API.
//!
//! Field names follow the backend's JSON (camelCase); the same task/list
//! shapes travel in both directions, with `id` unset on creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
  New,
  InProgress,
  Completed,
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
  Min,
  Medium,
  High,
}

/// Calendar slot attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
}

/// A task as the backend stores and returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub name_of_task: String,
  #[serde(default)]
  pub description_of_task: Option<String>,
  pub state: TaskState,
  pub priority: TaskPriority,
  /// Owner username; assigned by the backend.
  #[serde(default)]
  pub user: Option<String>,
  /// Present when the task shows up on the calendar.
  #[serde(default)]
  pub event_task: Option<TaskEvent>,
}

/// A calendar row from the events endpoint: the event window plus the
/// owning task's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
  #[serde(default)]
  pub id: Option<i64>,
  pub name_of_task: String,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
}

/// Kind of entry in a task's action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
  Comment,
  Update,
}

/// One entry in a task's action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAction {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub action_name: String,
  #[serde(default)]
  pub action_description: Option<String>,
  pub action_type: ActionType,
  #[serde(default)]
  pub user: Option<String>,
  #[serde(default)]
  pub action_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub task_id: Option<i64>,
}

/// A user-owned list of [`ListElement`] sub-items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  /// Display color, e.g. "#aabbcc".
  #[serde(default)]
  pub color: Option<String>,
  #[serde(default)]
  pub user: Option<String>,
}

/// Sub-item of a [`TaskList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListElement {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub completed: bool,
  #[serde(default)]
  pub list_id: Option<i64>,
}

/// Login payload for `/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

/// Registration payload for `/auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub password: String,
  pub name: String,
  pub surname1: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub surname2: Option<String>,
}

/// Validation outcome of a registration attempt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOutcome {
  #[serde(default)]
  pub error_count: u32,
  #[serde(default)]
  pub error_messages: Vec<String>,
}

impl RegisterOutcome {
  pub fn is_success(&self) -> bool {
    self.error_count == 0
  }
}

/// Opaque bearer token issued at login or by the OAuth2 callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for AuthToken {
  /// Tokens are credentials; display a redacted form.
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "AuthToken(…{} chars)", self.0.len())
  }
}
