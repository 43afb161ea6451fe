//! Cached facade over [`ApiClient`] for the data the UI reads repeatedly.
//!
//! Whole-collection reads (tasks, lists) go through a [`ResourceCache`]
//! so any number of near-simultaneous readers share one request. Mutations
//! call straight through to the transport and bust the affected cache.

use tracing::debug;

use crate::cache::{Resource, ResourceCache};
use crate::error::Result;

use super::client::ApiClient;
use super::types::{
  AuthToken, CalendarEvent, ListElement, Task, TaskAction, TaskList,
};

/// Cache key for the task collection.
const TASKS_KEY: &str = "tasks";
/// Cache key for the list collection.
const LISTS_KEY: &str = "lists";

/// Task manager client with per-domain resource caches.
///
/// Cloning shares the transport and both caches.
#[derive(Clone)]
pub struct CachedClient {
  inner: ApiClient,
  tasks: ResourceCache<Vec<Task>>,
  lists: ResourceCache<Vec<TaskList>>,
}

impl CachedClient {
  pub fn new(inner: ApiClient) -> Self {
    Self {
      inner,
      tasks: ResourceCache::new(),
      lists: ResourceCache::new(),
    }
  }

  /// The underlying transport, for calls that bypass the caches.
  pub fn api(&self) -> &ApiClient {
    &self.inner
  }

  // ==========================================================================
  // Tasks
  // ==========================================================================

  /// The task collection as a suspending resource.
  ///
  /// A cache miss starts one request; further calls before settlement get
  /// the same resource. A failed fetch invalidates its own entry before
  /// surfacing the error, so the next call retries the network instead of
  /// replaying a cached error forever.
  pub fn get_tasks(&self, token: &AuthToken) -> Resource<Vec<Task>> {
    let inner = self.inner.clone();
    let cache = self.tasks.clone();
    let token = token.clone();

    self.tasks.get_or_create(TASKS_KEY, move || async move {
      match inner.get_tasks(&token).await {
        Ok(tasks) => Ok(tasks),
        Err(error) => {
          cache.invalidate(TASKS_KEY);
          Err(error)
        }
      }
    })
  }

  /// Drop the cached task collection; the next read re-fetches.
  pub fn invalidate_tasks_cache(&self) {
    debug!("invalidating tasks cache");
    self.tasks.invalidate(TASKS_KEY);
  }

  /// Create a task and bust the tasks cache.
  pub async fn create_task(&self, token: &AuthToken, task: &Task) -> Result<Task> {
    let created = self.inner.create_task(token, task).await?;
    self.invalidate_tasks_cache();
    Ok(created)
  }

  /// Update a task and bust the tasks cache.
  pub async fn update_task(&self, token: &AuthToken, id: i64, task: &Task) -> Result<Task> {
    let updated = self.inner.update_task(token, id, task).await?;
    self.invalidate_tasks_cache();
    Ok(updated)
  }

  /// Delete a task and bust the tasks cache.
  pub async fn delete_task(&self, token: &AuthToken, id: i64) -> Result<()> {
    self.inner.delete_task(token, id).await?;
    self.invalidate_tasks_cache();
    Ok(())
  }

  /// Single-task details are always fetched fresh.
  pub async fn get_task(&self, token: &AuthToken, id: i64) -> Result<Task> {
    self.inner.get_task(token, id).await
  }

  /// Calendar events are small and change with every task edit; not cached.
  pub async fn get_events(&self, token: &AuthToken) -> Result<Vec<CalendarEvent>> {
    self.inner.get_events(token).await
  }

  /// Action-log reads and writes pass through; they never affect the
  /// collection caches.
  pub async fn get_task_actions(&self, token: &AuthToken, task_id: i64) -> Result<Vec<TaskAction>> {
    self.inner.get_task_actions(token, task_id).await
  }

  pub async fn add_task_action(
    &self,
    token: &AuthToken,
    task_id: i64,
    action: &TaskAction,
  ) -> Result<TaskAction> {
    self.inner.add_task_action(token, task_id, action).await
  }

  pub async fn update_task_action(
    &self,
    token: &AuthToken,
    task_id: i64,
    action_id: i64,
    action: &TaskAction,
  ) -> Result<TaskAction> {
    self
      .inner
      .update_task_action(token, task_id, action_id, action)
      .await
  }

  pub async fn delete_task_action(
    &self,
    token: &AuthToken,
    task_id: i64,
    action_id: i64,
  ) -> Result<()> {
    self.inner.delete_task_action(token, task_id, action_id).await
  }

  // ==========================================================================
  // Lists
  // ==========================================================================

  /// The list collection as a suspending resource; contract as
  /// [`CachedClient::get_tasks`].
  pub fn get_lists(&self, token: &AuthToken) -> Resource<Vec<TaskList>> {
    let inner = self.inner.clone();
    let cache = self.lists.clone();
    let token = token.clone();

    self.lists.get_or_create(LISTS_KEY, move || async move {
      match inner.get_lists(&token).await {
        Ok(lists) => Ok(lists),
        Err(error) => {
          cache.invalidate(LISTS_KEY);
          Err(error)
        }
      }
    })
  }

  /// Drop the cached list collection; the next read re-fetches.
  pub fn invalidate_lists_cache(&self) {
    debug!("invalidating lists cache");
    self.lists.invalidate(LISTS_KEY);
  }

  /// List details (with elements) are always fetched fresh.
  pub async fn get_list(&self, token: &AuthToken, id: i64) -> Result<TaskList> {
    self.inner.get_list(token, id).await
  }

  /// Create a list and bust the lists cache.
  pub async fn create_list(&self, token: &AuthToken, list: &TaskList) -> Result<TaskList> {
    let created = self.inner.create_list(token, list).await?;
    self.invalidate_lists_cache();
    Ok(created)
  }

  /// Update a list and bust the lists cache.
  pub async fn update_list(&self, token: &AuthToken, id: i64, list: &TaskList) -> Result<TaskList> {
    let updated = self.inner.update_list(token, id, list).await?;
    self.invalidate_lists_cache();
    Ok(updated)
  }

  /// Delete a list and bust the lists cache.
  pub async fn delete_list(&self, token: &AuthToken, id: i64) -> Result<()> {
    self.inner.delete_list(token, id).await?;
    self.invalidate_lists_cache();
    Ok(())
  }

  /// Element mutations change what a cached list view shows; each busts
  /// the lists cache on success.
  pub async fn add_list_element(
    &self,
    token: &AuthToken,
    list_id: i64,
    element: &ListElement,
  ) -> Result<()> {
    self.inner.add_list_element(token, list_id, element).await?;
    self.invalidate_lists_cache();
    Ok(())
  }

  pub async fn update_list_element(
    &self,
    token: &AuthToken,
    element_id: i64,
    element: &ListElement,
  ) -> Result<ListElement> {
    let updated = self.inner.update_list_element(token, element_id, element).await?;
    self.invalidate_lists_cache();
    Ok(updated)
  }

  pub async fn delete_list_element(&self, token: &AuthToken, element_id: i64) -> Result<()> {
    self.inner.delete_list_element(token, element_id).await?;
    self.invalidate_lists_cache();
    Ok(())
  }
}
