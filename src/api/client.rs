//! HTTP transport for the task manager REST backend.
//!
//! Thin typed wrappers over `reqwest`: one method per endpoint, JSON in
//! and out, bearer token passed explicitly by the caller. No caching at
//! this layer; see [`super::CachedClient`].

use std::collections::HashMap;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ConfigService;
use crate::error::{Error, Result};

use super::types::{
  AuthToken, CalendarEvent, Credentials, ListElement, NewUser, RegisterOutcome, Task, TaskAction,
  TaskList,
};

/// Client for the task manager REST backend.
#[derive(Clone)]
pub struct ApiClient {
  http: Client,
  base_url: String,
}

impl ApiClient {
  /// Create a client against an explicit backend base URL.
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let http = Client::builder().user_agent("taskman-client").build()?;

    Ok(Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    })
  }

  /// Create a client against the backend URL the config service resolves.
  /// The config service is the canonical base-URL source; its environment
  /// fallback only applies inside the config load itself.
  pub async fn from_config(config: &ConfigService) -> Result<Self> {
    let runtime = config.load().await;
    Self::new(runtime.backend_url)
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  // ==========================================================================
  // Auth
  // ==========================================================================

  /// Exchange credentials for a bearer token.
  ///
  /// The backend answers with a string map: `{"token": …}` on success, a
  /// reason under `"message"` on rejection.
  pub async fn login(&self, credentials: &Credentials) -> Result<AuthToken> {
    let response = self
      .http
      .post(self.url("/auth/login"))
      .json(credentials)
      .send()
      .await?;

    let status = response.status();
    if status.is_success() || status == StatusCode::BAD_REQUEST {
      let body: HashMap<String, String> = response.json().await?;
      return match body.get("token") {
        Some(token) => Ok(AuthToken::new(token.clone())),
        None => Err(Error::Auth(
          body
            .get("message")
            .cloned()
            .unwrap_or_else(|| "invalid username or password".to_string()),
        )),
      };
    }

    Err(Self::status_error(response).await)
  }

  /// Create an account. Validation failures come back in the outcome body,
  /// not as an HTTP error.
  pub async fn register(&self, user: &NewUser) -> Result<RegisterOutcome> {
    let response = self
      .http
      .post(self.url("/auth/register"))
      .json(user)
      .send()
      .await?;

    let response = Self::check_status(response).await?;
    Ok(response.json().await?)
  }

  // ==========================================================================
  // Tasks
  // ==========================================================================

  /// All tasks of the authenticated user.
  pub async fn get_tasks(&self, token: &AuthToken) -> Result<Vec<Task>> {
    self.get_json("/api/tasks/tasks", token).await
  }

  /// A single task by id.
  pub async fn get_task(&self, token: &AuthToken, id: i64) -> Result<Task> {
    self.get_json(&format!("/api/tasks/{id}"), token).await
  }

  /// Create a task; the backend assigns id and owner.
  pub async fn create_task(&self, token: &AuthToken, task: &Task) -> Result<Task> {
    self.post_json("/api/tasks/create", token, task).await
  }

  /// Replace a task's fields.
  pub async fn update_task(&self, token: &AuthToken, id: i64, task: &Task) -> Result<Task> {
    self
      .post_json(&format!("/api/tasks/update/{id}"), token, task)
      .await
  }

  /// Delete a task.
  pub async fn delete_task(&self, token: &AuthToken, id: i64) -> Result<()> {
    self.delete(&format!("/api/tasks/delete/{id}"), token).await
  }

  /// Calendar events derived from tasks with an event window.
  pub async fn get_events(&self, token: &AuthToken) -> Result<Vec<CalendarEvent>> {
    self.get_json("/api/tasks/events/get", token).await
  }

  /// Append an entry to a task's action log.
  pub async fn add_task_action(
    &self,
    token: &AuthToken,
    task_id: i64,
    action: &TaskAction,
  ) -> Result<TaskAction> {
    self
      .post_json(&format!("/api/tasks/{task_id}/actions"), token, action)
      .await
  }

  /// The action log of a task.
  pub async fn get_task_actions(&self, token: &AuthToken, task_id: i64) -> Result<Vec<TaskAction>> {
    self
      .get_json(&format!("/api/tasks/{task_id}/actions"), token)
      .await
  }

  /// Update one action log entry.
  pub async fn update_task_action(
    &self,
    token: &AuthToken,
    task_id: i64,
    action_id: i64,
    action: &TaskAction,
  ) -> Result<TaskAction> {
    let response = self
      .http
      .put(self.url(&format!("/api/tasks/{task_id}/actions/{action_id}")))
      .bearer_auth(token.as_str())
      .json(action)
      .send()
      .await?;

    let response = Self::check_status(response).await?;
    Ok(response.json().await?)
  }

  /// Remove one action log entry.
  pub async fn delete_task_action(
    &self,
    token: &AuthToken,
    task_id: i64,
    action_id: i64,
  ) -> Result<()> {
    self
      .delete(&format!("/api/tasks/{task_id}/actions/{action_id}"), token)
      .await
  }

  // ==========================================================================
  // Lists
  // ==========================================================================

  /// All lists of the authenticated user.
  pub async fn get_lists(&self, token: &AuthToken) -> Result<Vec<TaskList>> {
    self.get_json("/api/lists/lists", token).await
  }

  /// A single list by id.
  pub async fn get_list(&self, token: &AuthToken, id: i64) -> Result<TaskList> {
    self.get_json(&format!("/api/lists/getList/{id}"), token).await
  }

  /// Create a list.
  pub async fn create_list(&self, token: &AuthToken, list: &TaskList) -> Result<TaskList> {
    self.post_json("/api/lists/create", token, list).await
  }

  /// Replace a list's fields.
  pub async fn update_list(&self, token: &AuthToken, id: i64, list: &TaskList) -> Result<TaskList> {
    self
      .post_json(&format!("/api/lists/update/{id}"), token, list)
      .await
  }

  /// Delete a list and its elements.
  pub async fn delete_list(&self, token: &AuthToken, id: i64) -> Result<()> {
    self.delete(&format!("/api/lists/delete/{id}"), token).await
  }

  /// Add a sub-item to a list. The backend answers with a plain message.
  pub async fn add_list_element(
    &self,
    token: &AuthToken,
    list_id: i64,
    element: &ListElement,
  ) -> Result<()> {
    let response = self
      .http
      .post(self.url(&format!("/api/lists/addElement/{list_id}")))
      .bearer_auth(token.as_str())
      .json(element)
      .send()
      .await?;

    Self::check_status(response).await?;
    Ok(())
  }

  /// Update a sub-item.
  pub async fn update_list_element(
    &self,
    token: &AuthToken,
    element_id: i64,
    element: &ListElement,
  ) -> Result<ListElement> {
    self
      .post_json(&format!("/api/lists/updateElement/{element_id}"), token, element)
      .await
  }

  /// Remove a sub-item.
  pub async fn delete_list_element(&self, token: &AuthToken, element_id: i64) -> Result<()> {
    self
      .delete(&format!("/api/lists/deleteElement/{element_id}"), token)
      .await
  }

  // ==========================================================================
  // Request plumbing
  // ==========================================================================

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &AuthToken) -> Result<T> {
    debug!(path, "GET");
    let response = self
      .http
      .get(self.url(path))
      .bearer_auth(token.as_str())
      .send()
      .await?;

    let response = Self::check_status(response).await?;
    Ok(response.json().await?)
  }

  async fn post_json<B, T>(&self, path: &str, token: &AuthToken, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    debug!(path, "POST");
    let response = self
      .http
      .post(self.url(path))
      .bearer_auth(token.as_str())
      .json(body)
      .send()
      .await?;

    let response = Self::check_status(response).await?;
    Ok(response.json().await?)
  }

  /// DELETE where the backend answers with a plain confirmation message.
  async fn delete(&self, path: &str, token: &AuthToken) -> Result<()> {
    debug!(path, "DELETE");
    let response = self
      .http
      .delete(self.url(path))
      .bearer_auth(token.as_str())
      .send()
      .await?;

    Self::check_status(response).await?;
    Ok(())
  }

  async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
      return Ok(response);
    }
    Err(Self::status_error(response).await)
  }

  async fn status_error(response: Response) -> Error {
    let path = response.url().path().to_string();
    match response.status() {
      StatusCode::UNAUTHORIZED => Error::Unauthorized,
      StatusCode::FORBIDDEN => Error::Forbidden(path),
      StatusCode::NOT_FOUND => Error::NotFound(path),
      status => Error::Status {
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
      },
    }
  }
}
